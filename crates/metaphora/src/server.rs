//! `MetaphoraServer` builder and server loop.
//!
//! This is the entry point for running a Metaphora server. It ties
//! together all the layers: transport → protocol → room actors.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use metaphora_game::DeckPolicy;
use metaphora_protocol::{Codec, JsonCodec, RulesetKind};
use metaphora_room::{RoomManager, close_idle};
use metaphora_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::handler::handle_connection;
use crate::{MetaphoraError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// The manager only holds room handles and the connection index; room
/// state itself lives in the room actors.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Metaphora server.
///
/// # Example
///
/// ```rust,ignore
/// use metaphora::prelude::*;
///
/// let server = MetaphoraServer::builder()
///     .bind("0.0.0.0:3000")
///     .ruleset(RulesetKind::Strict)
///     .build()
///     .await?;
/// server.run().await
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetaphoraServerBuilder {
    config: ServerConfig,
}

impl MetaphoraServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. with [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Rule variant for every room this server creates.
    pub fn ruleset(mut self, ruleset: RulesetKind) -> Self {
        self.config.room.ruleset = ruleset;
        self
    }

    pub fn deck_policy(mut self, policy: DeckPolicy) -> Self {
        self.config.room.deck_policy = policy;
        self
    }

    pub fn idle_room_ttl(mut self, ttl: Duration) -> Self {
        self.config.room.idle_room_ttl = ttl;
        self
    }

    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.config.room.reap_interval = interval;
        self
    }

    /// Makes every room's shuffles and draws reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.room.seed = Some(seed);
        self
    }

    /// Binds the listener. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<MetaphoraServer<JsonCodec>, MetaphoraError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let reap_interval = self.config.room.reap_interval;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.config.room)),
            codec: JsonCodec,
        });

        Ok(MetaphoraServer {
            transport,
            state,
            reap_interval,
        })
    }
}

/// A bound Metaphora server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct MetaphoraServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    reap_interval: Duration,
}

impl MetaphoraServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> MetaphoraServerBuilder {
        MetaphoraServerBuilder::new()
    }
}

impl<C: Codec> MetaphoraServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, MetaphoraError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs until Ctrl-C, then shuts every room down.
    pub async fn run(self) -> Result<(), MetaphoraError> {
        self.run_until(ctrl_c()).await
    }

    /// Accepts connections and sweeps idle rooms until `shutdown`
    /// completes, then stops every room actor.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), MetaphoraError> {
        info!(addr = ?self.transport.local_addr().ok(), "Metaphora server running");

        let mut reaper = tokio::time::interval(self.reap_interval);
        reaper.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        reaper.tick().await;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                },
                _ = reaper.tick() => {
                    tokio::spawn(reap_idle_rooms(Arc::clone(&self.state)));
                }
                () = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        self.state.rooms.lock().await.shutdown_all().await;
        info!("Metaphora server stopped");
        Ok(())
    }
}

/// Closes idle rooms without holding the manager lock while rooms answer.
async fn reap_idle_rooms<C: Codec>(state: Arc<ServerState<C>>) {
    let handles = state.rooms.lock().await.handles();
    let stopped = close_idle(handles).await;
    if stopped.is_empty() {
        return;
    }
    let reaped = state.rooms.lock().await.evict(&stopped);
    if !reaped.is_empty() {
        info!(count = reaped.len(), "reaped idle rooms");
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
