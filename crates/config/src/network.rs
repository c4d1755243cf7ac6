//! Network configuration for the dashboard.
//!
//! Describes the single chain the dashboard is allowed to operate on and the
//! metadata handed to a wallet when that chain has to be added.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hardhat's default chain id.
pub const HARDHAT_CHAIN_ID: u64 = 31337;

/// Hardhat's default JSON-RPC endpoint.
pub const HARDHAT_RPC_URL: &str = "http://127.0.0.1:8545";

/// First contract address deployed by the first account of a fresh Hardhat node.
pub const HARDHAT_FIRST_DEPLOYMENT: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A chain id of zero is never valid
    #[error("Invalid chain id: {0}")]
    InvalidChainId(u64),

    /// The RPC endpoint is not an http(s) url
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),
}

/// Native currency description used by `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    /// Hardhat's ETH.
    pub fn hardhat_eth() -> Self {
        Self {
            name: "Hardhat ETH".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Target network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Chain ID the wallet must be switched to
    pub chain_id: u64,
    /// Display name shown by the wallet when the chain is added
    pub chain_name: String,
    /// Public RPC endpoint used for read-only calls
    pub rpc_url: String,
    /// Native currency of the chain
    pub native_currency: NativeCurrency,
    /// Deployed token contract
    pub token: Address,
}

impl NetworkConfig {
    /// Local Hardhat node configuration.
    pub fn hardhat_localhost() -> Self {
        Self {
            chain_id: HARDHAT_CHAIN_ID,
            chain_name: "Hardhat Localhost".to_string(),
            rpc_url: HARDHAT_RPC_URL.to_string(),
            native_currency: NativeCurrency::hardhat_eth(),
            token: HARDHAT_FIRST_DEPLOYMENT,
        }
    }

    /// Chain id as the `0x`-prefixed hex quantity wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Parameters for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.chain_id_hex(),
            chain_name: self.chain_name.clone(),
            rpc_urls: vec![self.rpc_url.clone()],
            native_currency: self.native_currency.clone(),
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::InvalidChainId(self.chain_id));
        }
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(ConfigError::InvalidRpcUrl(self.rpc_url.clone()));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::hardhat_localhost()
    }
}

/// Body of a `wallet_addEthereumChain` request, serialized in EIP-3085 casing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

/// Builder for custom network configurations.
#[derive(Debug, Clone)]
pub struct NetworkConfigBuilder {
    config: NetworkConfig,
}

impl NetworkConfigBuilder {
    /// Start with Hardhat defaults.
    pub fn hardhat() -> Self {
        Self {
            config: NetworkConfig::hardhat_localhost(),
        }
    }

    /// Override the chain id.
    pub const fn chain_id(mut self, chain_id: u64) -> Self {
        self.config.chain_id = chain_id;
        self
    }

    /// Override the chain display name.
    pub fn chain_name(mut self, name: impl Into<String>) -> Self {
        self.config.chain_name = name.into();
        self
    }

    /// Override the public RPC endpoint.
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.config.rpc_url = url.into();
        self
    }

    /// Override the token contract address.
    pub const fn token(mut self, address: Address) -> Self {
        self.config.token = address;
        self
    }

    /// Build and validate the network configuration.
    pub fn build(self) -> Result<NetworkConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardhat_config() {
        let config = NetworkConfig::hardhat_localhost();
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.rpc_url, "http://127.0.0.1:8545");
        assert_eq!(config.chain_id_hex(), "0x7a69");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_add_chain_params_casing() {
        let params = NetworkConfig::hardhat_localhost().add_chain_params();
        let json = serde_json::to_value(&params).unwrap();

        assert_eq!(json["chainId"], "0x7a69");
        assert_eq!(json["chainName"], "Hardhat Localhost");
        assert_eq!(json["rpcUrls"][0], "http://127.0.0.1:8545");
        assert_eq!(json["nativeCurrency"]["symbol"], "ETH");
        assert_eq!(json["nativeCurrency"]["decimals"], 18);
    }

    #[test]
    fn test_custom_config_builder() {
        let token = address!("1111111111111111111111111111111111111111");

        let config = NetworkConfigBuilder::hardhat()
            .rpc_url("http://localhost:9545")
            .token(token)
            .build()
            .unwrap();

        assert_eq!(config.token, token);
        assert_eq!(config.rpc_url, "http://localhost:9545");
        assert_eq!(config.chain_id, HARDHAT_CHAIN_ID);
    }

    #[test]
    fn test_builder_rejects_invalid() {
        let err = NetworkConfigBuilder::hardhat().chain_id(0).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidChainId(0));

        let err = NetworkConfigBuilder::hardhat().rpc_url("ws://x").build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidRpcUrl("ws://x".to_string()));
    }
}
