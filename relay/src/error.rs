//! Error types for the session path of the relay.
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<domain::error::Error>,
    pub error_kind: RelayErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum RelayErrorKind {
    /// The chat could not be written to the store. Nothing was broadcast.
    Persist,
    /// The message router is gone; the connection cannot relay anything else.
    QueueClosed,
}

impl Error {
    pub(crate) fn persist(source: domain::error::Error) -> Self {
        Error {
            source: Some(source),
            error_kind: RelayErrorKind::Persist,
        }
    }

    pub(crate) fn queue_closed() -> Self {
        Error {
            source: None,
            error_kind: RelayErrorKind::QueueClosed,
        }
    }

    /// Whether the connection loop has to stop after this error.
    pub fn is_fatal(&self) -> bool {
        self.error_kind == RelayErrorKind::QueueClosed
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Relay Error: {:?}: {source}", self.error_kind),
            None => write!(f, "Relay Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_a_closed_queue_is_fatal() {
        assert!(Error::queue_closed().is_fatal());

        let persist = Error::persist(domain::error::Error::unknown_participant("bob"));
        assert!(!persist.is_fatal());
        assert!(persist.source().is_some());
    }
}
