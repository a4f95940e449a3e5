use crate::controller::ApiResponse;
use crate::params::contact::ContactListParams;
use crate::{AppState, Error};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::contact as ContactApi;
use log::*;

/// GET a user's contacts, most recently contacted first
#[utoipa::path(
    get,
    path = "/contact-list",
    params(ContactListParams),
    responses(
        (status = 200, description = "Successfully retrieved the contact list", body = ContactApi::ContactList),
        (status = 404, description = "The user is unknown"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn index(
    State(app_state): State<AppState>,
    Query(params): Query<ContactListParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET contact list of {}", params.username);

    let contacts = ContactApi::contacts(app_state.db_conn_ref(), &params.username).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), contacts)))
}
