//! Token contract handles.
//!
//! [`TokenContract`] is the seam between the dashboard and the deployed token:
//! reads return raw base-unit integers, writes are split into [`TokenContract::send`]
//! and [`TokenContract::confirm`] so callers always broadcast before they wait.

use crate::ChainError;
use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider};
use binding::token::ERC20Lite::{self, ERC20LiteInstance};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info};

/// Snapshot of the token's read-only state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub cap: U256,
    pub owner: Address,
}

/// A state-changing token call. Amounts are in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCall {
    Approve { spender: Address, amount: U256 },
    Transfer { to: Address, amount: U256 },
    TransferFrom { from: Address, to: Address, amount: U256 },
    Mint { to: Address, amount: U256 },
    Burn { amount: U256 },
}

impl TokenCall {
    /// ABI function name.
    pub const fn function(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Transfer { .. } => "transfer",
            Self::TransferFrom { .. } => "transferFrom",
            Self::Mint { .. } => "mint",
            Self::Burn { .. } => "burn",
        }
    }
}

/// Result of a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: u64,
}

/// Handle to the deployed token, either read-only or bound to a signer.
pub trait TokenContract: Clone + Send + Sync + 'static {
    fn address(&self) -> Address;

    /// Account transactions are sent from, `None` for read-only handles.
    fn signer(&self) -> Option<Address>;

    fn name(&self) -> impl Future<Output = Result<String, ChainError>> + Send;
    fn symbol(&self) -> impl Future<Output = Result<String, ChainError>> + Send;
    fn decimals(&self) -> impl Future<Output = Result<u8, ChainError>> + Send;
    fn total_supply(&self) -> impl Future<Output = Result<U256, ChainError>> + Send;
    fn cap(&self) -> impl Future<Output = Result<U256, ChainError>> + Send;
    fn owner(&self) -> impl Future<Output = Result<Address, ChainError>> + Send;
    fn balance_of(&self, holder: Address)
        -> impl Future<Output = Result<U256, ChainError>> + Send;
    fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Broadcast `call` and return its hash without waiting for inclusion.
    fn send(&self, call: TokenCall) -> impl Future<Output = Result<TxHash, ChainError>> + Send;

    /// Wait for `tx_hash` to be mined. A reverted receipt is an error.
    fn confirm(&self, tx_hash: TxHash)
        -> impl Future<Output = Result<TxOutcome, ChainError>> + Send;

    /// Fetch every metadata field, one call at a time.
    fn metadata(&self) -> impl Future<Output = Result<TokenMetadata, ChainError>> + Send {
        async move {
            Ok(TokenMetadata {
                name: self.name().await?,
                symbol: self.symbol().await?,
                decimals: self.decimals().await?,
                total_supply: self.total_supply().await?,
                cap: self.cap().await?,
                owner: self.owner().await?,
            })
        }
    }
}

/// Builds token handles for the two ways the dashboard talks to the chain.
pub trait TokenFactory: Send + Sync + 'static {
    type Token: TokenContract;

    /// Handle bound to the public RPC endpoint, independent of any wallet.
    fn read_only(&self) -> Self::Token;

    /// Handle that sends transactions from `signer` through the wallet.
    fn signing(&self, signer: Address) -> Self::Token;
}

/// Token handle backed by an alloy provider.
#[derive(Clone)]
pub struct AlloyToken {
    contract: ERC20LiteInstance<DynProvider>,
    signer: Option<Address>,
}

impl AlloyToken {
    pub fn new(token: Address, provider: DynProvider, signer: Option<Address>) -> Self {
        Self {
            contract: ERC20Lite::new(token, provider),
            signer,
        }
    }
}

impl TokenContract for AlloyToken {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    fn signer(&self) -> Option<Address> {
        self.signer
    }

    async fn name(&self) -> Result<String, ChainError> {
        Ok(self.contract.name().call().await?)
    }

    async fn symbol(&self) -> Result<String, ChainError> {
        Ok(self.contract.symbol().call().await?)
    }

    async fn decimals(&self) -> Result<u8, ChainError> {
        Ok(self.contract.decimals().call().await?)
    }

    async fn total_supply(&self) -> Result<U256, ChainError> {
        Ok(self.contract.totalSupply().call().await?)
    }

    async fn cap(&self) -> Result<U256, ChainError> {
        Ok(self.contract.cap().call().await?)
    }

    async fn owner(&self) -> Result<Address, ChainError> {
        Ok(self.contract.owner().call().await?)
    }

    async fn balance_of(&self, holder: Address) -> Result<U256, ChainError> {
        debug!(token = %self.address(), %holder, "Querying balance");
        Ok(self.contract.balanceOf(holder).call().await?)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ChainError> {
        debug!(token = %self.address(), %owner, %spender, "Querying allowance");
        Ok(self.contract.allowance(owner, spender).call().await?)
    }

    async fn send(&self, call: TokenCall) -> Result<TxHash, ChainError> {
        let Some(from) = self.signer else {
            return Err(ChainError::WalletUnavailable);
        };

        debug!(function = call.function(), %from, "Sending token transaction");

        let pending = match call {
            TokenCall::Approve { spender, amount } => {
                self.contract.approve(spender, amount).from(from).send().await?
            }
            TokenCall::Transfer { to, amount } => {
                self.contract.transfer(to, amount).from(from).send().await?
            }
            TokenCall::TransferFrom {
                from: owner,
                to,
                amount,
            } => {
                self.contract
                    .transferFrom(owner, to, amount)
                    .from(from)
                    .send()
                    .await?
            }
            TokenCall::Mint { to, amount } => {
                self.contract.mint(to, amount).from(from).send().await?
            }
            TokenCall::Burn { amount } => self.contract.burn(amount).from(from).send().await?,
        };

        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx_hash: TxHash) -> Result<TxOutcome, ChainError> {
        let root = self.contract.provider().root().clone();
        let receipt = PendingTransactionBuilder::new(root, tx_hash)
            .get_receipt()
            .await
            .map_err(|e| ChainError::Unknown(e.to_string()))?;

        if !ReceiptResponse::status(&receipt) {
            return Err(ChainError::ContractRevert(format!(
                "transaction {tx_hash} reverted"
            )));
        }

        let outcome = TxOutcome {
            tx_hash: ReceiptResponse::transaction_hash(&receipt),
            block_number: ReceiptResponse::block_number(&receipt),
            gas_used: ReceiptResponse::gas_used(&receipt),
        };

        info!(
            tx_hash = %outcome.tx_hash,
            block_number = outcome.block_number,
            gas_used = outcome.gas_used,
            "Transaction confirmed."
        );

        Ok(outcome)
    }
}

/// [`TokenFactory`] over two alloy providers: the public endpoint for reads and
/// the wallet endpoint for signed writes.
#[derive(Clone)]
pub struct AlloyTokenFactory {
    token: Address,
    public: DynProvider,
    wallet: DynProvider,
}

impl AlloyTokenFactory {
    pub const fn new(token: Address, public: DynProvider, wallet: DynProvider) -> Self {
        Self {
            token,
            public,
            wallet,
        }
    }
}

impl TokenFactory for AlloyTokenFactory {
    type Token = AlloyToken;

    fn read_only(&self) -> AlloyToken {
        AlloyToken::new(self.token, self.public.clone(), None)
    }

    fn signing(&self, signer: Address) -> AlloyToken {
        AlloyToken::new(self.token, self.wallet.clone(), Some(signer))
    }
}
