use ::config::{network, ConfigError, NetworkConfig, NetworkConfigBuilder};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use tracing::info;

/// Top-level dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Public RPC endpoint used for reads
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Deployed token contract
    #[serde(default = "default_token_address")]
    pub token_address: Address,

    /// Wallet JSON-RPC endpoint; without it there is no wallet
    #[serde(default)]
    pub wallet_url: Option<String>,

    /// Target chain id, Hardhat's when absent
    #[serde(default)]
    pub chain_id: Option<u64>,

    /// How often the wallet watcher polls, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_rpc_url() -> String {
    network::HARDHAT_RPC_URL.to_string()
}

const fn default_token_address() -> Address {
    network::HARDHAT_FIRST_DEPLOYMENT
}

const fn default_poll_interval_secs() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            token_address: default_token_address(),
            wallet_url: None,
            chain_id: None,
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Reject settings that parse but cannot be run.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.poll_interval_secs == 0 {
            eyre::bail!("poll_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Like [`Config::from_file`], but a missing file yields the local Hardhat defaults.
    pub fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using local Hardhat defaults");
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Target network described by this configuration.
    pub fn network_config(&self) -> Result<NetworkConfig, ConfigError> {
        let mut builder = NetworkConfigBuilder::hardhat()
            .rpc_url(&self.rpc_url)
            .token(self.token_address);
        if let Some(chain_id) = self.chain_id {
            builder = builder.chain_id(chain_id);
        }
        builder.build()
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());

        let network = config.network_config().unwrap();
        assert_eq!(network.chain_id, 31337);
        assert_eq!(network.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_full_file() {
        let config: Config = toml::from_str(
            r#"
            rpc_url = "http://10.0.0.2:8545"
            token_address = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
            wallet_url = "http://127.0.0.1:9545"
            chain_id = 1337
            poll_interval_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.wallet_url.as_deref(), Some("http://127.0.0.1:9545"));
        let network = config.network_config().unwrap();
        assert_eq!(network.chain_id, 1337);
        assert_eq!(network.token, address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"));
        assert_eq!(network.chain_name, "Hardhat Localhost");
    }

    #[test]
    fn test_invalid_network() {
        let config = Config {
            rpc_url: "127.0.0.1:8545".to_string(),
            ..Config::default()
        };
        assert!(config.network_config().is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config: Config = toml::from_str("poll_interval_secs = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));

        let path = std::env::temp_dir().join(format!("dashboard-zero-poll-{}.toml", std::process::id()));
        std::fs::write(&path, "poll_interval_secs = 0\n").unwrap();
        let loaded = Config::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(loaded.is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load("does/not/exist/dashboard.toml").unwrap();
        assert_eq!(config, Config::default());
    }
}
