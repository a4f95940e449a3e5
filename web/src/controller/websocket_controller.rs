use crate::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use log::*;
use relay::connection::ConnectionId;
use relay::Relay;

/// GET upgrade to a relay WebSocket connection
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "Switched to the WebSocket protocol"),
        (status = 400, description = "Not a WebSocket upgrade request")
    )
)]
pub async fn connect(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_socket(socket, app_state.relay))
}

async fn relay_socket(socket: WebSocket, relay: Relay) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (mut session, mut rx) = relay.open_session();
    let connection_id = session.connection_id();
    debug!("WebSocket connection {connection_id} opened");

    // Ends once the registry drops the connection's sender or the socket fails.
    let mut writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    loop {
        tokio::select! {
            _ = &mut writer => break,
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(message)) => {
                    let Some(text) = frame_text(&message, connection_id) else {
                        continue;
                    };
                    if let Err(e) = session.handle_text(text).await {
                        if e.is_fatal() {
                            error!("Closing connection {connection_id}: {e}");
                            break;
                        }
                        warn!("Chat on connection {connection_id} was not relayed: {e}");
                    }
                }
                Some(Err(e)) => {
                    debug!("WebSocket connection {connection_id} failed: {e}");
                    break;
                }
            }
        }
    }

    // Unregisters the connection, which lets the writer drain and close the socket.
    drop(session);
    debug!("WebSocket connection {connection_id} closed");
}

/// The protocol text carried by a data frame. Binary frames count when they hold UTF-8;
/// control frames carry none.
fn frame_text(message: &Message, connection_id: ConnectionId) -> Option<&str> {
    match message {
        Message::Text(text) => Some(text.as_str()),
        Message::Binary(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Discarding non UTF-8 binary frame on {connection_id}: {e}");
                None
            }
        },
        _ => None,
    }
}
