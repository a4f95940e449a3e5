//! HTTP and WebSocket surface of the relay.

use axum::http::{header, HeaderValue, Method};
use log::*;
use relay::Relay;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod params;
pub mod router;

pub use error::{Error, Result};

/// State shared by every handler: infrastructure from `service` plus the live relay.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub relay: Relay,
}

impl AppState {
    pub fn new(service_state: service::AppState, relay: Relay) -> Self {
        Self {
            service_state,
            relay,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.service_state.db_conn_ref()
    }

    pub fn config(&self) -> &service::config::Config {
        &self.service_state.config
    }
}

/// Serves the API and the relay WebSocket until the listener fails.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let listen_addr = app_state.config().listen_address();
    info!("Server starting... listening for connections on http://{listen_addr}");

    let cors_layer = cors_layer(&app_state.config().allowed_origins);
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;

    axum::serve(listener, router::define_routes(app_state).layer(cors_layer)).await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn cors_allows_only_configured_origins() {
        let app = Router::new()
            .route("/health", get(|| async { "healthy" }))
            .layer(cors_layer(&[
                "http://localhost:3000".to_string(),
                "not a header\n".to_string(),
            ]));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
