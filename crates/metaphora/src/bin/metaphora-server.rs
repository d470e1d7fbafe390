//! Runs a Metaphora server configured from the environment.
//!
//! `RUST_LOG` controls log output (default `info`); see
//! [`ServerConfig::from_env`] for the other variables.

use metaphora::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), MetaphoraError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind_addr,
        ruleset = %config.room.ruleset,
        deck_policy = ?config.room.deck_policy,
        "starting"
    );

    let server = MetaphoraServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await
}
