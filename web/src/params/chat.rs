use domain::chat::{DEFAULT_FROM_TS, DEFAULT_TO_TS};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// One participant of the conversation
    pub u1: String,
    /// The other participant of the conversation
    pub u2: String,
    /// Lower bound on `createdAt`, inclusive: epoch seconds or `-inf`, defaults to 0
    #[serde(rename = "from-ts", default = "default_from_ts")]
    pub from_ts: String,
    /// Upper bound on `createdAt`, inclusive: epoch seconds or `+inf`, the default
    #[serde(rename = "to-ts", default = "default_to_ts")]
    pub to_ts: String,
}

fn default_from_ts() -> String {
    DEFAULT_FROM_TS.to_string()
}

fn default_to_ts() -> String {
    DEFAULT_TO_TS.to_string()
}
