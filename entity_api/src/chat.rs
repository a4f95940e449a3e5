//! Durable chat persistence and the participant-pair/time-range query.
//!
//! Every persisted chat receives a store-assigned id of the form
//! `chat#<13-digit epoch millis>-<6-digit sequence>`. Ids sort lexicographically
//! in creation order, and the sequence keeps chats written within the same
//! millisecond from colliding.

use super::error::Error;
use chrono::Utc;
use entity::chats::{ActiveModel, Column, Entity, Model};
use entity::EpochSeconds;
use log::*;
use sea_orm::sea_query::Index;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityName, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Name of the secondary index over `(from_user, to_user, created_at)`.
pub const CHAT_INDEX: &str = "idx_chats_participants_created_at";

const ID_PREFIX: &str = "chat#";
const MAX_SEQUENCE: u32 = 999_999;

/// A chat accepted from a live connection, not yet persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewChat {
    pub from: String,
    pub to: String,
    pub message: String,
    pub created_at: EpochSeconds,
}

/// Inclusive `createdAt` bounds for a history query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    pub from: EpochSeconds,
    pub to: EpochSeconds,
}

impl TimeRange {
    /// The unbounded range, `[-inf, +inf]`.
    pub fn all() -> Self {
        Self {
            from: EpochSeconds::MIN,
            to: EpochSeconds::MAX,
        }
    }

    /// Parses bounds the way clients send them: integers, `-inf`, `+inf` or `inf`.
    pub fn parse(from: &str, to: &str) -> Result<Self, Error> {
        Ok(Self {
            from: parse_bound(from)?,
            to: parse_bound(to)?,
        })
    }
}

fn parse_bound(raw: &str) -> Result<EpochSeconds, Error> {
    match raw.trim() {
        "+inf" | "inf" => Ok(EpochSeconds::MAX),
        "-inf" => Ok(EpochSeconds::MIN),
        other => other.parse::<EpochSeconds>().map_err(|_| {
            warn!("Rejecting unparsable time bound: {raw:?}");
            Error::invalid_query_term()
        }),
    }
}

/// Hands out strictly increasing chat ids.
///
/// The millisecond component follows the wall clock but never moves backwards;
/// the sequence resets whenever the millisecond advances. If the sequence runs
/// out within one millisecond, the generator borrows the next millisecond.
#[derive(Debug, Default)]
pub struct ChatIdGenerator {
    last: Mutex<Option<(i64, u32)>>,
}

impl ChatIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> String {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&self, now_millis: i64) -> String {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let (millis, sequence) = match *last {
            Some((last_millis, _)) if now_millis > last_millis => (now_millis, 0),
            Some((last_millis, last_sequence)) if last_sequence < MAX_SEQUENCE => {
                (last_millis, last_sequence + 1)
            }
            Some((last_millis, _)) => (last_millis + 1, 0),
            None => (now_millis, 0),
        };

        *last = Some((millis, sequence));
        format_id(millis, sequence)
    }

    /// Ensures every id handed out afterwards sorts after `id`.
    pub fn resume_after(&self, id: &str) {
        let Some(parsed) = parse_id(id) else {
            warn!("Ignoring chat id with unexpected format: {id}");
            return;
        };

        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.map_or(true, |current| parsed > current) {
            *last = Some(parsed);
        }
    }
}

fn format_id(millis: i64, sequence: u32) -> String {
    format!("{ID_PREFIX}{millis:013}-{sequence:06}")
}

fn parse_id(id: &str) -> Option<(i64, u32)> {
    let (millis, sequence) = id.strip_prefix(ID_PREFIX)?.split_once('-')?;
    Some((millis.parse().ok()?, sequence.parse().ok()?))
}

/// Owns chat persistence and the secondary index used by history queries.
pub struct ChatStore {
    db: Arc<DatabaseConnection>,
    ids: ChatIdGenerator,
    index_ready: OnceCell<()>,
}

impl ChatStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            ids: ChatIdGenerator::new(),
            index_ready: OnceCell::new(),
        }
    }

    /// Builds a store ready for writes: the index exists and new ids sort after
    /// every chat already persisted.
    pub async fn init(db: Arc<DatabaseConnection>) -> Result<Self, Error> {
        let store = Self::new(db);
        store.ensure_index().await?;

        if let Some(latest) = Entity::find()
            .order_by_desc(Column::Id)
            .one(store.db())
            .await?
        {
            debug!("Resuming chat ids after {}", latest.id);
            store.ids.resume_after(&latest.id);
        }

        Ok(store)
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Creates the participant/time index if it is missing. Safe to call repeatedly.
    pub async fn ensure_index(&self) -> Result<(), Error> {
        ensure_index(self.db()).await?;
        // A later put need not re-issue the statement.
        let _ = self.index_ready.set(());
        Ok(())
    }

    /// Persists `chat` under a freshly generated id and returns the stored record.
    pub async fn put(&self, chat: NewChat) -> Result<Model, Error> {
        self.index_ready
            .get_or_try_init(|| ensure_index(self.db()))
            .await?;

        let model = Model {
            id: self.ids.next_id(),
            from_user: chat.from,
            to_user: chat.to,
            message: chat.message,
            created_at: chat.created_at,
        };

        let active_model = ActiveModel {
            id: Set(model.id.clone()),
            from_user: Set(model.from_user.clone()),
            to_user: Set(model.to_user.clone()),
            message: Set(model.message.clone()),
            created_at: Set(model.created_at),
        };

        Entity::insert(active_model)
            .exec_without_returning(self.db())
            .await?;

        debug!(
            "Persisted chat {} from {} to {}",
            model.id, model.from_user, model.to_user
        );

        Ok(model)
    }

    /// Every chat between `participant_a` and `participant_b`, in either direction,
    /// created within `range`, newest first.
    pub async fn query(
        &self,
        participant_a: &str,
        participant_b: &str,
        range: TimeRange,
    ) -> Result<Vec<Model>, Error> {
        find_between(self.db(), participant_a, participant_b, range).await
    }
}

pub async fn ensure_index(db: &impl ConnectionTrait) -> Result<(), Error> {
    let statement = Index::create()
        .if_not_exists()
        .name(CHAT_INDEX)
        .table(Entity.table_ref())
        .col(Column::FromUser)
        .col(Column::ToUser)
        .col(Column::CreatedAt)
        .to_owned();

    let backend = db.get_database_backend();
    db.execute(backend.build(&statement)).await?;

    Ok(())
}

async fn find_between(
    db: &impl ConnectionTrait,
    participant_a: &str,
    participant_b: &str,
    range: TimeRange,
) -> Result<Vec<Model>, Error> {
    let participants = Condition::any()
        .add(
            Condition::all()
                .add(Column::FromUser.eq(participant_a))
                .add(Column::ToUser.eq(participant_b)),
        )
        .add(
            Condition::all()
                .add(Column::FromUser.eq(participant_b))
                .add(Column::ToUser.eq(participant_a)),
        );

    let chats = Entity::find()
        .filter(participants)
        .filter(Column::CreatedAt.between(range.from, range.to))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .all(db)
        .await?;

    Ok(chats)
}
