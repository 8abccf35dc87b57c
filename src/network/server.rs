//! WebSocket Game Server
//!
//! Async accept loop plus one task pair per connection: a writer
//! draining the subscriber channel, and a reader parsing player
//! actions. The engine never sees a socket: each connection is just a
//! subscriber channel and a stream of commands to it.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::game::bets::CashoutOutcome;
use crate::game::engine::EngineHandle;
use crate::network::protocol::{ClientMessage, ServerMessage};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Path WebSocket upgrades are accepted on.
    pub ws_path: String,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".parse().unwrap(),
            ws_path: "/game".to_string(),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// The WebSocket server.
pub struct GameServer {
    config: ServerConfig,
    engine: EngineHandle,
    connections: Arc<AtomicUsize>,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new server fronting the given engine.
    pub fn new(config: ServerConfig, engine: EngineHandle) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            engine,
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Run the accept loop until shutdown.
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(
            "Game server v{} listening on {}{}",
            self.config.version, self.config.bind_addr, self.config.ws_path
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connections.load(Ordering::SeqCst) >= self.config.max_connections {
                                warn!(%addr, "Connection limit reached, rejecting");
                                continue;
                            }

                            info!(%addr, "New connection");
                            self.connections.fetch_add(1, Ordering::SeqCst);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let engine = self.engine.clone();
        let connections = self.connections.clone();
        let ws_path = self.config.ws_path.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            // Only the game endpoint upgrades; anything else is a 404.
            let path_check = move |req: &Request, response: Response| {
                if req.uri().path() == ws_path {
                    Ok(response)
                } else {
                    let mut resp = ErrorResponse::new(Some("not found".to_string()));
                    *resp.status_mut() = StatusCode::NOT_FOUND;
                    Err(resp)
                }
            };

            let ws_stream = match accept_hdr_async(stream, path_check).await {
                Ok(ws) => ws,
                Err(e) => {
                    debug!(%addr, "WebSocket handshake failed: {}", e);
                    connections.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            // Register as a subscriber; the engine pushes the initial
            // snapshot through this channel right away.
            let subscriber_id = match engine.subscribe(msg_tx.clone()).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(%addr, "Engine rejected subscriber: {}", e);
                    connections.fetch_sub(1, Ordering::SeqCst);
                    return;
                }
            };

            // Writer task: everything the engine fans out, plus replies.
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Reader loop: parse player actions, forward to the engine.
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        // Malformed frames are dropped, not fatal
                                        debug!(%addr, "Invalid message: {}", e);
                                        continue;
                                    }
                                };
                                handle_client_message(&engine, client_msg, &msg_tx).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!(%addr, "Client disconnected");
                                break;
                            }
                            Some(Err(e)) => {
                                debug!(%addr, "WebSocket error: {}", e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup
            sender_task.abort();
            let _ = engine.unsubscribe(subscriber_id).await;
            connections.fetch_sub(1, Ordering::SeqCst);
            info!(%addr, "Client cleaned up");
        });
    }

    /// Signal every connection task and the accept loop to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Route one parsed action to the engine and queue the reply.
///
/// An engine that has shut down mid-request degrades to a rejection;
/// the round is gone, so the action cannot have succeeded.
async fn handle_client_message(
    engine: &EngineHandle,
    msg: ClientMessage,
    reply: &mpsc::Sender<ServerMessage>,
) {
    match msg {
        ClientMessage::PlaceBet {
            player_id,
            amount,
            auto_cashout,
        } => {
            let success = engine
                .place_bet(&player_id, amount, auto_cashout)
                .await
                .unwrap_or(false);
            let _ = reply.send(ServerMessage::BetPlaced { success }).await;
        }
        ClientMessage::Cashout { player_id } => {
            let outcome = engine
                .cash_out(&player_id)
                .await
                .unwrap_or_else(|_| CashoutOutcome::rejected());
            let _ = reply.send(ServerMessage::cashout_result(outcome)).await;
        }
    }
}
