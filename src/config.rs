use serde::{Deserialize, Serialize};
use std::fs;

/// Active chain network. Selected at process start, fixed for the lifetime
/// of the process.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    /// Base58Check version byte for P2PKH addresses.
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6f,
        }
    }

    /// Expected WIF prefix byte for signing keys.
    pub fn wif_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x80,
            Network::Testnet => 0xef,
        }
    }

    /// Passphrase mixed into account-chain envelopes so signatures are not
    /// replayable across networks.
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Mainnet => "chain-gateway mainnet",
            Network::Testnet => "chain-gateway testnet",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    pub gateway: GatewayConfig,
    pub network: Network,
    #[serde(default)]
    pub core: CoreConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream core service (history, UTXO checks, ledger, broadcast).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CoreConfig {
    pub base_url: String,
    /// Deadline propagated to every outbound call.
    pub timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7300".to_string(),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "gateway.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: true,
            gateway: GatewayConfig {
                host: "0.0.0.0".to_string(),
                port: 7200,
            },
            network: Network::Testnet,
            core: CoreConfig::default(),
        }
    }
}
