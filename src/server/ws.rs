//! WebSocket endpoint: commands in, snapshot + event stream out.
//!
//! Every connection gets the full snapshot first, then live envelopes in
//! seq order. A subscriber that falls behind the broadcast ring is told to
//! resync instead of silently missing events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::Extension;
use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use super::commands::ClientCommand;
use super::dto::SessionSnapshot;
use super::events::{CommandReply, EventEnvelope};
use super::routes::ServerContext;

const LOG_TARGET: &str = "andar_bahar::server::ws";

/// Frames that originate on this side of the socket rather than from the
/// broadcast stream.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LocalFrame {
    Snapshot {
        #[serde(flatten)]
        snapshot: SessionSnapshot,
    },
    /// The client lagged past the broadcast ring; it must refetch the
    /// snapshot and resume from `last_seq`.
    ResyncRequired {
        last_seq: u64,
        skipped: u64,
    },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Extension(ctx): Extension<Arc<ServerContext>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx))
}

async fn handle_socket(socket: WebSocket, ctx: Arc<ServerContext>) {
    let (mut sink, mut stream) = socket.split();
    // Subscribe before snapshotting so no event between the two is lost;
    // the client drops envelopes with seq <= snapshot.seq.
    let mut events = ctx.session.subscribe();
    let snapshot = ctx.session.snapshot();
    if send_json(
        &mut sink,
        &LocalFrame::Snapshot { snapshot },
    )
    .await
    .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = match serde_json::from_str::<ClientCommand>(&text) {
                        Ok(command) => ctx.session.execute(command).await,
                        Err(err) => CommandReply::CommandRejected {
                            code: "malformed_command",
                            reason: err.to_string(),
                        },
                    };
                    if send_json(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Pings are answered by axum; binary frames are ignored.
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(target: LOG_TARGET, %err, "websocket receive error");
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(envelope) => {
                    if send_json(&mut sink, &envelope).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: LOG_TARGET, skipped, "subscriber lagged, requesting resync");
                    let frame = LocalFrame::ResyncRequired {
                        last_seq: ctx.session.snapshot().seq,
                        skipped,
                    };
                    if send_json(&mut sink, &frame).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

async fn send_json<T: Serialize>(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    payload: &T,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(payload).map_err(axum::Error::new)?;
    sink.send(Message::Text(text.into())).await
}
