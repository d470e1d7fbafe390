//! Per-connection handler: decode actions, route them, stream events back.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that drains the connection's event channel. Room
//! actors push events into that channel; the writer encodes and sends
//! them in order.

use std::sync::Arc;

use metaphora_protocol::{ClientAction, Codec, ConnectionId, ErrorEvent, ServerEvent};
use metaphora_room::PlayerSender;
use metaphora_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::MetaphoraError;
use crate::server::ServerState;

/// Drop guard that marks the connection offline when the handler exits.
///
/// Cleanup also runs if the handler panics. `Drop` is synchronous, so the
/// async disconnect is spawned as a fire-and-forget task.
struct ConnectionGuard<C: Codec> {
    conn_id: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.lock().await.disconnect(conn_id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), MetaphoraError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (sender, receiver) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(Arc::clone(&conn), Arc::clone(&state), receiver));
    let _guard = ConnectionGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                info!(%conn_id, "connection closed");
                break;
            }
            Err(e) => {
                debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let action: ClientAction = match state.codec.decode(&data) {
            Ok(action) => action,
            Err(e) => {
                debug!(%conn_id, error = %e, "undecodable frame dropped");
                continue;
            }
        };

        if let Err(err) = route_action(&state, conn_id, action, &sender).await {
            report(&sender, conn_id, &err);
        }
    }

    writer.abort();
    // _guard drops here → disconnect fires.
    Ok(())
}

/// Sends a join to the manager and everything else to the caller's room.
async fn route_action<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    action: ClientAction,
    sender: &PlayerSender,
) -> Result<(), MetaphoraError> {
    match action {
        ClientAction::Join(request) => {
            let (room_id, player_id) = state
                .rooms
                .lock()
                .await
                .join(conn_id, request, sender.clone())
                .await?;
            info!(%conn_id, %room_id, %player_id, "connection joined room");
        }
        action => {
            // Lock only to look up the room; the send may wait on backpressure.
            let handle = state.rooms.lock().await.route(conn_id)?;
            handle.send_action(conn_id, action).await?;
        }
    }
    Ok(())
}

/// Reports coded rejections to the client and logs the rest.
fn report(sender: &PlayerSender, conn_id: ConnectionId, err: &MetaphoraError) {
    match err.code() {
        Some(code) => {
            debug!(%conn_id, ?code, error = %err, "request rejected");
            let _ = sender.send(ServerEvent::Error(ErrorEvent {
                code,
                message: err.to_string(),
            }));
        }
        None => debug!(%conn_id, error = %err, "request ignored"),
    }
}

/// Encodes and sends queued events until the channel or socket closes.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut receiver: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let conn_id = conn.id();
    while let Some(event) = receiver.recv().await {
        let bytes = match state.codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            debug!(%conn_id, error = %e, "send failed, writer stopping");
            break;
        }
    }
}
