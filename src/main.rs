//! chain_gateway - Transaction Construction & Broadcast Gateway
//!
//! Builds, signs, and broadcasts funds-transfer transactions:
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌───────────┐
//! │  Config  │───▶│  Resolve  │───▶│   Sign   │───▶│ Broadcast │
//! │  (YAML)  │    │ (history) │    │(in-proc) │    │  (core)   │
//! └──────────┘    └───────────┘    └──────────┘    └───────────┘
//! ```
//!
//! Key material stays in-process for the lifetime of one request; every
//! remote effect goes through the core service client.

use std::sync::Arc;

use chain_gateway::config::AppConfig;
use chain_gateway::gateway::{self, AppState};
use chain_gateway::logging::init_logging;
use chain_gateway::upstream::HttpCoreClient;
use tracing::info;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _guard = init_logging(&config);

    info!(env = %env, network = ?config.network, "Starting chain gateway");

    let core = HttpCoreClient::new(&config.core)
        .map_err(|e| anyhow::anyhow!("core client init failed: {}", e))?;
    let state = AppState::new(Arc::new(core), config.network);

    gateway::run_server(&config.gateway.host, config.gateway.port, state).await
}
