//! Chat history, the read side of the chat store.

use crate::chats::Model;
use crate::error::Error;
use crate::user::ensure_known;
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

pub use entity_api::chat::{ChatStore, NewChat, TimeRange};

/// Default lower bound of a history query.
pub const DEFAULT_FROM_TS: &str = "0";
/// Default upper bound of a history query.
pub const DEFAULT_TO_TS: &str = "+inf";

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatHistory {
    pub messages: Vec<Model>,
    pub count: usize,
}

/// Chats exchanged between `user_a` and `user_b` in either direction with
/// `createdAt` in `[from_ts, to_ts]`, newest first.
pub async fn history(
    store: &ChatStore,
    user_a: &str,
    user_b: &str,
    from_ts: &str,
    to_ts: &str,
) -> Result<ChatHistory, Error> {
    ensure_known(store.db(), &[user_a, user_b]).await?;

    let range = TimeRange::parse(from_ts, to_ts)?;
    let messages = store.query(user_a, user_b, range).await?;

    debug!(
        "Found {} chats between {user_a} and {user_b} in [{from_ts}, {to_ts}]",
        messages.len()
    );

    Ok(ChatHistory {
        count: messages.len(),
        messages,
    })
}
