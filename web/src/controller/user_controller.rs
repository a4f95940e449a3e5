use crate::controller::ApiResponse;
use crate::params::user::VerifyContactParams;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::user as UserApi;
use log::*;

/// POST check that a username belongs to a known user before chatting with them
#[utoipa::path(
    post,
    path = "/verify-contact",
    request_body = VerifyContactParams,
    responses(
        (status = 200, description = "The user exists"),
        (status = 404, description = "The user is unknown"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn verify_contact(
    State(app_state): State<AppState>,
    Json(params): Json<VerifyContactParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("Verifying contact {}", params.username);

    UserApi::verify_contact(app_state.db_conn_ref(), &params.username).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), params.username)))
}
