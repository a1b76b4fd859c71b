//! WebSocket bridge between a running engine and the relay hub.
//!
//! Connects to the hub as an ordinary peer, forwards every telemetry frame
//! the engine produces, and hands relayed command frames back to the
//! engine. The engine keeps running across reconnects so the farm state
//! survives a dropped connection.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use farmlink_core::protocol::Frame;

/// Reconnection delay after a WebSocket failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

enum SessionEnd {
    Disconnected,
    Stopped,
}

/// Run the bridge until `cancel` fires or the engine stops producing
/// telemetry.
pub async fn run(
    ws_url: &str,
    mut telemetry: mpsc::UnboundedReceiver<Frame>,
    commands: mpsc::UnboundedSender<Frame>,
    cancel: CancellationToken,
) {
    loop {
        tracing::info!(url = %ws_url, "Connecting to relay hub");

        match connect_async(ws_url).await {
            Ok((ws_stream, _response)) => {
                tracing::info!("WebSocket connected");
                match run_session(ws_stream, &mut telemetry, &commands, &cancel).await {
                    SessionEnd::Stopped => return,
                    SessionEnd::Disconnected => {
                        tracing::warn!("WebSocket session ended, reconnecting");
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "WebSocket connection failed");
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
        }

        discard_stale(&mut telemetry);
    }
}

/// Drop snapshots produced while disconnected; the next tick sends a fresh
/// one.
fn discard_stale(telemetry: &mut mpsc::UnboundedReceiver<Frame>) {
    let mut dropped = 0usize;
    while telemetry.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::debug!(dropped, "Discarded telemetry buffered while offline");
    }
}

/// Drive a single WebSocket session.
async fn run_session(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    telemetry: &mut mpsc::UnboundedReceiver<Frame>,
    commands: &mpsc::UnboundedSender<Frame>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Stopped;
            }
            frame = telemetry.recv() => {
                let Some(frame) = frame else {
                    tracing::info!("Engine stopped, closing WebSocket");
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Stopped;
                };
                if let Err(e) = sink.send(Message::Text(frame.encode())).await {
                    tracing::error!(error = %e, "Failed to send telemetry");
                    return SessionEnd::Disconnected;
                }
            }
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_incoming(&text, commands),
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                        // Handled automatically by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        tracing::info!(?frame, "Hub closed WebSocket");
                        return SessionEnd::Disconnected;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "WebSocket receive error");
                        return SessionEnd::Disconnected;
                    }
                    None => {
                        tracing::info!("WebSocket stream exhausted");
                        return SessionEnd::Disconnected;
                    }
                }
            }
        }
    }
}

/// Decode a relayed frame and pass it to the engine.
fn handle_incoming(text: &str, commands: &mpsc::UnboundedSender<Frame>) {
    match Frame::decode(text) {
        Ok(frame) => {
            tracing::debug!(event = %frame.event, "Relayed frame received");
            let _ = commands.send(frame);
        }
        Err(e) => {
            tracing::warn!(error = %e, raw = %text, "Malformed frame from hub");
        }
    }
}
