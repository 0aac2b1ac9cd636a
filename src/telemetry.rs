use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::accept_async;
use tungstenite::Message;
use tracing::{info, error, warn, debug};

use crate::report::DiagnosticReport;

/// Envelope pushed to UI clients.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryPacket<'a> {
    pub msg_type: &'static str,   // "REPORT"
    pub timestamp: i64,           // ms since epoch
    pub symbol: &'a str,
    pub report: &'a DiagnosticReport,
}

/// Broadcasts each diagnostic report to connected WebSocket clients.
pub struct TelemetryServer {
    tx: broadcast::Sender<String>,
}

impl TelemetryServer {
    /// Starts the listener task when enabled. Must be called inside a tokio runtime.
    pub fn new(enabled: bool, port: u16) -> Self {
        // Bounded ring: slow clients drop old reports instead of blocking the run.
        let (tx, _rx) = broadcast::channel(64);

        if enabled {
            let tx_clone = tx.clone();
            tokio::spawn(async move {
                let addr = format!("127.0.0.1:{}", port);
                match TcpListener::bind(&addr).await {
                    Ok(listener) => {
                        info!("📡 [Telemetry] Server running on ws://{}", addr);
                        while let Ok((stream, peer)) = listener.accept().await {
                            debug!(%peer, "telemetry client connected");
                            let tx_inner = tx_clone.clone();
                            tokio::spawn(async move {
                                handle_connection(stream, tx_inner).await;
                            });
                        }
                    }
                    Err(e) => {
                        error!("❌ [Telemetry] Failed to bind port {}: {}", port, e);
                    }
                }
            });
        } else {
            info!("📡 [Telemetry] Disabled by config.");
        }

        Self { tx }
    }

    /// A server that never listens; `publish` becomes a no-op.
    pub fn disabled() -> Self {
        let (tx, _rx) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Serializes only when someone is listening.
    pub fn publish(&self, report: &DiagnosticReport) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        let packet = TelemetryPacket {
            msg_type: "REPORT",
            timestamp: report.generated_at.timestamp_millis(),
            symbol: &report.symbol,
            report,
        };
        match serde_json::to_string(&packet) {
            Ok(msg) => {
                // Err only means every receiver has gone away.
                let _ = self.tx.send(msg);
            }
            Err(e) => warn!("Failed to serialize telemetry packet: {}", e),
        }
    }
}

async fn handle_connection(stream: tokio::net::TcpStream, tx: broadcast::Sender<String>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut ws_sender, _ws_receiver) = ws_stream.split();
    let mut rx = tx.subscribe();

    loop {
        match rx.recv().await {
            Ok(msg) => {
                if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                debug!(skipped, "telemetry client lagging, dropped reports");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                break;
            }
        }
    }
}
