//! Chain access for the token dashboard.
//!
//! - [`Wallet`]: EIP-1193 style wallet provider, with [`RpcWallet`] as the
//!   JSON-RPC implementation
//! - [`TokenContract`] / [`TokenFactory`]: read-only and signing token handles
//! - [`ChainClient`]: connection, network enforcement, session caching and
//!   wallet event normalization

mod chain;
mod error;
mod rpc_wallet;
pub mod session;
mod token;
mod wallet;

#[cfg(test)]
pub(crate) mod test_utils;

pub use chain::ChainClient;
pub use error::{ChainError, WalletError};
pub use rpc_wallet::RpcWallet;
pub use token::{
    AlloyToken, AlloyTokenFactory, TokenCall, TokenContract, TokenFactory, TokenMetadata,
    TxOutcome,
};
pub use wallet::{parse_quantity, Wallet, WalletEvent};

use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),
}

/// Convenience function to create an ethereum rpc provider from url.
pub async fn create_provider(rpc_url: &str) -> Result<DynProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url).erased();

    Ok(provider)
}

/// Token handle factory reading through `rpc_url` and signing through `wallet_url`.
///
/// Without a wallet endpoint, signing handles go through the public endpoint;
/// the chain client refuses to build them anyway.
pub async fn create_token_factory(
    token: alloy_primitives::Address,
    rpc_url: &str,
    wallet_url: Option<&str>,
) -> Result<AlloyTokenFactory, ClientError> {
    let public = create_provider(rpc_url).await?;
    let wallet = match wallet_url {
        Some(url) => create_provider(url).await?,
        None => public.clone(),
    };
    Ok(AlloyTokenFactory::new(token, public, wallet))
}
