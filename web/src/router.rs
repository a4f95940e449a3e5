use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

use crate::controller::{
    chat_controller, contact_controller, health_check_controller, user_controller,
    websocket_controller,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Krowka Relay API"
        ),
        paths(
            chat_controller::index,
            contact_controller::index,
            health_check_controller::health_check,
            user_controller::verify_contact,
            websocket_controller::connect,
        ),
        components(
            schemas(
                domain::chats::Model,
                domain::chat::ChatHistory,
                domain::contact::ContactEntry,
                domain::contact::ContactList,
                crate::params::user::VerifyContactParams,
            )
        ),
        tags(
            (name = "krowka", description = "Krowka real-time chat relay")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(chat_routes(app_state.clone()))
        .merge(contact_routes(app_state.clone()))
        .merge(health_routes())
        .merge(user_routes(app_state.clone()))
        .merge(websocket_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn chat_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/chat-history", get(chat_controller::index))
        .with_state(app_state)
}

fn contact_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/contact-list", get(contact_controller::index))
        .with_state(app_state)
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/verify-contact", post(user_controller::verify_contact))
        .with_state(app_state)
}

fn websocket_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket_controller::connect))
        .with_state(app_state)
}
