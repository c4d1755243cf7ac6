//! Configuration types for the token dashboard.
//!
//! This crate provides:
//! - The target network identity (chain id, public RPC endpoint, add-chain metadata)
//! - The deployed token address
//! - Overrides through a builder

pub mod network;

pub use network::{
    AddChainParams, ConfigError, NativeCurrency, NetworkConfig, NetworkConfigBuilder,
};
