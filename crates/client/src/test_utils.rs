//! In-memory wallet and token doubles for unit tests.

use crate::{
    ChainError, TokenCall, TokenContract, TokenFactory, TxOutcome, Wallet, WalletError,
    WalletEvent,
};
use alloy_primitives::{Address, TxHash, U256};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

#[derive(Default)]
struct WalletState {
    chain_id: u64,
    accounts: Vec<Address>,
    knows_target: bool,
    reject_switch: bool,
    reject_accounts: bool,
    added_chain: Option<Value>,
    calls: Vec<String>,
}

/// Scripted wallet. Clones share state.
#[derive(Clone)]
pub struct MockWallet {
    state: Arc<Mutex<WalletState>>,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    pub fn new(chain_id: u64, accounts: Vec<Address>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            state: Arc::new(Mutex::new(WalletState {
                chain_id,
                accounts,
                knows_target: true,
                ..Default::default()
            })),
            events,
        }
    }

    pub fn without_target_chain(self) -> Self {
        self.state.lock().unwrap().knows_target = false;
        self
    }

    pub fn reject_switch(self) -> Self {
        self.set_reject_switch(true);
        self
    }

    pub fn reject_accounts(self) -> Self {
        self.state.lock().unwrap().reject_accounts = true;
        self
    }

    pub fn set_reject_switch(&self, reject: bool) {
        self.state.lock().unwrap().reject_switch = reject;
    }

    pub fn select(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn set_chain(&self, chain_id: u64) {
        self.state.lock().unwrap().chain_id = chain_id;
    }

    pub fn current_chain(&self) -> u64 {
        self.state.lock().unwrap().chain_id
    }

    pub fn added_chain(&self) -> Option<Value> {
        self.state.lock().unwrap().added_chain.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn push(&self, event: WalletEvent) {
        self.events.send(event).unwrap();
    }
}

impl Wallet for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());

        match method {
            "eth_chainId" => Ok(json!(format!("{:#x}", state.chain_id))),
            "eth_accounts" => Ok(json!(state.accounts)),
            "eth_requestAccounts" | "wallet_requestPermissions" if state.reject_accounts => {
                Err(WalletError::new(WalletError::USER_REJECTED, "User rejected the request."))
            }
            "eth_requestAccounts" => Ok(json!(state.accounts)),
            "wallet_requestPermissions" => Ok(json!([{ "parentCapability": "eth_accounts" }])),
            "wallet_switchEthereumChain" => {
                if state.reject_switch {
                    return Err(WalletError::new(WalletError::USER_REJECTED, "User rejected the request."));
                }
                if !state.knows_target {
                    return Err(WalletError::new(WalletError::UNRECOGNIZED_CHAIN, "Unrecognized chain ID"));
                }
                state.chain_id = crate::wallet::parse_quantity(&params[0]["chainId"])?;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                state.chain_id = crate::wallet::parse_quantity(&params[0]["chainId"])?;
                state.knows_target = true;
                state.added_chain = Some(params[0].clone());
                Ok(Value::Null)
            }
            other => Err(WalletError::new(-32601, format!("method {other} not supported"))),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// Token handle that only records who it signs for.
#[derive(Clone, Debug)]
pub struct MockToken {
    pub signer: Option<Address>,
}

impl TokenContract for MockToken {
    fn address(&self) -> Address {
        Address::ZERO
    }

    fn signer(&self) -> Option<Address> {
        self.signer
    }

    async fn name(&self) -> Result<String, ChainError> {
        Ok("LiteToken".into())
    }

    async fn symbol(&self) -> Result<String, ChainError> {
        Ok("LTK".into())
    }

    async fn decimals(&self) -> Result<u8, ChainError> {
        Ok(18)
    }

    async fn total_supply(&self) -> Result<U256, ChainError> {
        Ok(U256::ZERO)
    }

    async fn cap(&self) -> Result<U256, ChainError> {
        Ok(U256::MAX)
    }

    async fn owner(&self) -> Result<Address, ChainError> {
        Ok(Address::ZERO)
    }

    async fn balance_of(&self, _holder: Address) -> Result<U256, ChainError> {
        Ok(U256::ZERO)
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256, ChainError> {
        Ok(U256::ZERO)
    }

    async fn send(&self, _call: TokenCall) -> Result<TxHash, ChainError> {
        Ok(TxHash::ZERO)
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<TxOutcome, ChainError> {
        Ok(TxOutcome {
            tx_hash,
            block_number: Some(1),
            gas_used: 21_000,
        })
    }
}

pub struct MockFactory;

impl TokenFactory for MockFactory {
    type Token = MockToken;

    fn read_only(&self) -> MockToken {
        MockToken { signer: None }
    }

    fn signing(&self, signer: Address) -> MockToken {
        MockToken {
            signer: Some(signer),
        }
    }
}
