pub mod chats;
pub mod contacts;
pub mod users;

/// Identities are the usernames clients bind their connections to.
pub type UserId = String;

/// Seconds since the Unix epoch, the unit of every stored timestamp.
pub type EpochSeconds = i64;
