//! Server bootstrap and the per-connection accept loop.
//!
//! Ties together every layer: transport (bytes) → protocol (codec,
//! validation) → dispatcher (routing) → registry/game (state).

use std::sync::Arc;

use doodle_game::{GameRng, StaticPhraseSource, ThreadRng};
use doodle_protocol::{Codec, ErrorMessage, JsonCodec, Message, Operation, Payload, Topic, TopicType};
use doodle_registry::Registry;
use doodle_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::config::Config;
use crate::dispatcher;
use crate::error::DoodleError;

/// A running doodle server: bound transport plus the shared registry
/// every connection handler routes through.
pub struct Server {
    transport: WebSocketTransport,
    registry: Arc<Mutex<Registry>>,
    handshake_path_prefix: String,
}

impl Server {
    /// Validates `config`, loads phrase dictionaries, and binds the
    /// transport. Fails fatally (spec §4.1) if a dictionary is missing or
    /// empty.
    pub async fn bind(config: Config) -> Result<Self, DoodleError> {
        config.validate()?;

        let rng: Arc<dyn GameRng> = Arc::new(ThreadRng);
        let phrase_source = Arc::new(StaticPhraseSource::load_from_dir(
            &config.phrase_dictionaries_path,
            rng.clone(),
        )?);
        let registry = Arc::new(Mutex::new(Registry::new(
            config.game_rules(),
            phrase_source,
            rng,
        )));

        let transport = WebSocketTransport::bind(&config.bind_address).await?;

        Ok(Self {
            transport,
            registry,
            handshake_path_prefix: config.handshake_path_prefix,
        })
    }

    /// Returns the address actually bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop: one task per connection, for as long as the
    /// process lives.
    pub async fn run(mut self) -> Result<(), DoodleError> {
        tracing::info!("doodle server running");
        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let registry = Arc::clone(&self.registry);
                    let prefix = self.handshake_path_prefix.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, registry, prefix).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Handles one connection end-to-end (spec §4.5): extracts the username
/// from the handshake path, registers it, then alternates reading and
/// dispatching frames until the transport closes, at which point the user
/// leaves its current game (if any) and is removed from the registry.
async fn handle_connection(
    conn: WebSocketConnection,
    registry: Arc<Mutex<Registry>>,
    handshake_path_prefix: String,
) -> Result<(), DoodleError> {
    let codec = JsonCodec;

    let Some(username) = dispatcher::parse_username(conn.path(), &handshake_path_prefix) else {
        conn.close().await.ok();
        return Ok(());
    };
    let username = username.to_string();

    let (sink, mut outbound) = mpsc::unbounded_channel::<Message>();
    if let Err(e) = registry.lock().await.connect(username.clone(), sink) {
        // UserAlreadyExists aborts the handshake and closes the connection
        // (spec §7) — there's no registered sink to route through yet, so
        // write the error directly to the raw connection.
        let msg = error_envelope(&username, e.exception_name(), &e.to_string());
        if let Ok(bytes) = codec.encode(&msg) {
            let _ = conn.send(&bytes).await;
        }
        conn.close().await.ok();
        return Ok(());
    }
    tracing::info!(%username, "user connected");

    let conn = Arc::new(conn);
    let writer_conn = Arc::clone(&conn);
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            match codec.encode(&msg) {
                Ok(bytes) => {
                    if writer_conn.send(&bytes).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "failed to encode outbound message"),
            }
        }
    });

    let mut current_game_id: Option<String> = None;
    loop {
        let bytes = match conn.recv().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(%username, error = %e, "connection read failed");
                break;
            }
        };

        let msg: Message = match codec.decode(&bytes) {
            Ok(msg) => msg,
            Err(e) => {
                let err: DoodleError = e.into();
                dispatcher::route_error(&registry, &username, current_game_id.as_deref(), &err).await;
                continue;
            }
        };

        if let Some(gid) = &msg.game_id {
            current_game_id = Some(gid.clone());
        }

        if let Err(e) = msg.validate() {
            let err: DoodleError = e.into();
            dispatcher::route_error(&registry, &username, current_game_id.as_deref(), &err).await;
            continue;
        }

        if let Err(e) = dispatcher::route_message(&registry, &username, msg).await {
            dispatcher::route_error(&registry, &username, current_game_id.as_deref(), &e).await;
        }
    }

    writer.abort();

    if let Some(game_id) = current_game_id {
        registry.lock().await.leave_game(&username, &game_id).await.ok();
    }
    registry.lock().await.disconnect(&username).await;
    tracing::info!(%username, "user disconnected");

    Ok(())
}

fn error_envelope(username: &str, exception: &str, value: &str) -> Message {
    Message::new(Topic::new(TopicType::Error, Operation::Broadcast), username).with_value(Payload::Error(
        ErrorMessage {
            exception: exception.to_string(),
            value: value.to_string(),
            error_id: Uuid::new_v4().to_string(),
        },
    ))
}
