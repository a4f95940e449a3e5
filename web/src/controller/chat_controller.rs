use crate::controller::ApiResponse;
use crate::params::chat::HistoryParams;
use crate::{AppState, Error};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::chat as ChatApi;
use log::*;

/// GET the chats exchanged between two users, newest first
#[utoipa::path(
    get,
    path = "/chat-history",
    params(HistoryParams),
    responses(
        (status = 200, description = "Successfully retrieved the chat history", body = ChatApi::ChatHistory),
        (status = 404, description = "One of the participants is unknown"),
        (status = 422, description = "The time range could not be parsed"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET chat history with params: {params:?}");

    let history = ChatApi::history(
        app_state.relay.store(),
        &params.u1,
        &params.u2,
        &params.from_ts,
        &params.to_ts,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), history)))
}
