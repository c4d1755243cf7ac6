//! Wallet provider abstraction.
//!
//! A wallet exposes an EIP-1193 style request/response surface plus a stream of
//! `accountsChanged` / `chainChanged` events. The typed helpers on [`Wallet`]
//! cover every method the dashboard uses.

use crate::WalletError;
use alloy_primitives::Address;
use config::AddChainParams;
use serde_json::{json, Value};
use std::future::Future;
use tokio::sync::broadcast;

/// Events pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// `accountsChanged`; empty when the wallet disconnected every account
    AccountsChanged(Vec<Address>),
    /// `chainChanged`
    ChainChanged(u64),
}

/// A wallet provider.
pub trait Wallet: Send + Sync + 'static {
    /// Send a raw request to the wallet.
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, WalletError>> + Send;

    /// Subscribe to wallet events.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;

    /// `eth_chainId`
    fn chain_id(&self) -> impl Future<Output = Result<u64, WalletError>> + Send {
        async move {
            let value = self.request("eth_chainId", json!([])).await?;
            parse_quantity(&value)
        }
    }

    /// `eth_requestAccounts`; may prompt the user.
    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, WalletError>> + Send {
        async move {
            let value = self.request("eth_requestAccounts", json!([])).await?;
            parse_accounts(value)
        }
    }

    /// `eth_accounts`; never prompts.
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>, WalletError>> + Send {
        async move {
            let value = self.request("eth_accounts", json!([])).await?;
            parse_accounts(value)
        }
    }

    /// `wallet_switchEthereumChain`
    fn switch_chain(&self, chain_id: u64) -> impl Future<Output = Result<(), WalletError>> + Send {
        async move {
            let params = json!([{ "chainId": format!("{chain_id:#x}") }]);
            self.request("wallet_switchEthereumChain", params).await?;
            Ok(())
        }
    }

    /// `wallet_addEthereumChain`
    fn add_chain(
        &self,
        params: AddChainParams,
    ) -> impl Future<Output = Result<(), WalletError>> + Send {
        async move {
            let params = serde_json::to_value(params)
                .map_err(|e| WalletError::internal(e.to_string()))?;
            self.request("wallet_addEthereumChain", Value::Array(vec![params]))
                .await?;
            Ok(())
        }
    }

    /// `wallet_requestPermissions` for `eth_accounts`, forcing an account picker.
    fn request_permissions(&self) -> impl Future<Output = Result<(), WalletError>> + Send {
        async move {
            let params = json!([{ "eth_accounts": {} }]);
            self.request("wallet_requestPermissions", params).await?;
            Ok(())
        }
    }
}

/// Parse a JSON-RPC quantity (`"0x7a69"`) or a plain number.
pub fn parse_quantity(value: &Value) -> Result<u64, WalletError> {
    match value {
        Value::String(s) => {
            let digits = s.strip_prefix("0x").unwrap_or(s);
            u64::from_str_radix(digits, 16)
                .map_err(|e| WalletError::internal(format!("invalid quantity {s}: {e}")))
        }
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| WalletError::internal(format!("invalid quantity {n}"))),
        other => Err(WalletError::internal(format!("invalid quantity {other}"))),
    }
}

fn parse_accounts(value: Value) -> Result<Vec<Address>, WalletError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| WalletError::internal(format!("invalid accounts: {e}")))
}
