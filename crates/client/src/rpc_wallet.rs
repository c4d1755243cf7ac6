//! Wallet provider reached over JSON-RPC.
//!
//! The wallet endpoint (a wallet bridge, or a development node with unlocked
//! accounts) answers the EIP-1193 request methods over HTTP. HTTP cannot push
//! notifications, so [`RpcWallet::watch`] polls `eth_accounts` and `eth_chainId`
//! and turns observed changes into [`WalletEvent`]s.

use crate::{Wallet, WalletError, WalletEvent};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// A wallet that forwards requests to a JSON-RPC endpoint.
///
/// # Example
///
/// ```ignore
/// let wallet = RpcWallet::new("http://127.0.0.1:8545");
/// let accounts = wallet.request_accounts().await?;
/// let _watcher = wallet.watch(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct RpcWallet {
    client: reqwest::Client,
    url: String,
    events: broadcast::Sender<WalletEvent>,
    next_id: Arc<AtomicU64>,
}

impl RpcWallet {
    /// Creates a new wallet client for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Creates a new wallet client with a custom HTTP client.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            url: url.into(),
            events,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Returns the wallet endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Push an event to every subscriber, as a wallet bridge would.
    pub fn emit(&self, event: WalletEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }

    /// Poll the endpoint every `every` and emit account and chain changes.
    ///
    /// The first successful poll only records a baseline.
    pub fn watch(&self, every: Duration) -> JoinHandle<()> {
        let wallet = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            let mut observed = Observed::default();

            loop {
                ticker.tick().await;

                match wallet.accounts().await {
                    Ok(accounts) => {
                        if let Some(event) = observed.accounts(accounts) {
                            info!(?event, "Wallet accounts changed");
                            wallet.emit(event);
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to poll wallet accounts"),
                }

                match wallet.chain_id().await {
                    Ok(chain_id) => {
                        if let Some(event) = observed.chain(chain_id) {
                            info!(chain_id, "Wallet chain changed");
                            wallet.emit(event);
                        }
                    }
                    Err(e) => warn!(error = %e, "Failed to poll wallet chain id"),
                }
            }
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        debug!(method, url = %self.url, "Wallet request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| WalletError::internal(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(WalletError::internal(format!(
                "wallet endpoint returned {status}: {body}"
            )));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::internal(e.to_string()))?;

        match rpc_response.error {
            Some(error) => Err(error),
            // `null` results (e.g. wallet_switchEthereumChain) deserialize as None.
            None => Ok(rpc_response.result.unwrap_or(Value::Null)),
        }
    }
}

impl Wallet for RpcWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.call(method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// Last polled wallet state.
#[derive(Debug, Default)]
struct Observed {
    accounts: Option<Vec<Address>>,
    chain_id: Option<u64>,
}

impl Observed {
    /// Record `accounts`; an event when they differ from a previous poll.
    fn accounts(&mut self, accounts: Vec<Address>) -> Option<WalletEvent> {
        let changed = self.accounts.as_ref().is_some_and(|prev| *prev != accounts);
        let event = changed.then(|| WalletEvent::AccountsChanged(accounts.clone()));
        self.accounts = Some(accounts);
        event
    }

    /// Record `chain_id`; an event when it differs from a previous poll.
    fn chain(&mut self, chain_id: u64) -> Option<WalletEvent> {
        let changed = self.chain_id.is_some_and(|prev| prev != chain_id);
        self.chain_id = Some(chain_id);
        changed.then_some(WalletEvent::ChainChanged(chain_id))
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<WalletError>,
}
