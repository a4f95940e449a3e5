use chrono::Utc;
use domain::EpochSeconds;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of receipt timestamps for inbound chats.
pub trait Clock: Send + Sync {
    fn now(&self) -> EpochSeconds;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochSeconds {
        Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(at: EpochSeconds) -> Self {
        Self(AtomicI64::new(at))
    }

    pub fn set(&self, at: EpochSeconds) {
        self.0.store(at, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> EpochSeconds {
        self.0.load(Ordering::SeqCst)
    }
}
