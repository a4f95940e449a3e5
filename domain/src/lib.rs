//! Read surface and identity checks layered over `entity_api`.
//!
//! Consumers of `domain` (`relay`, `web`) reach the chat store, contact ranker
//! and entity models through these re-exports instead of depending on
//! `entity_api` directly.
pub use entity_api::{chats, contacts, users, EpochSeconds, UserId};

pub mod chat;
pub mod contact;
pub mod error;
pub mod user;
