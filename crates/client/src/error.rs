use serde::Deserialize;
use thiserror::Error;

/// Error reported by a wallet provider, shaped like an EIP-1193 provider error.
#[derive(Error, Debug, Clone, PartialEq, Eq, Deserialize)]
#[error("wallet error {code}: {message}")]
pub struct WalletError {
    pub code: i64,
    pub message: String,
}

impl WalletError {
    /// The user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// The requested chain has not been added to the wallet.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;
    /// JSON-RPC internal error, used for transport and decoding failures.
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Self::INTERNAL, message)
    }

    pub const fn is_user_rejected(&self) -> bool {
        self.code == Self::USER_REJECTED
    }

    pub const fn is_unrecognized_chain(&self) -> bool {
        self.code == Self::UNRECOGNIZED_CHAIN
    }
}

/// Failures of chain and wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// No wallet provider is configured
    #[error("Wallet not detected")]
    WalletUnavailable,

    /// The wallet is on another chain and could not be switched
    #[error("Wrong network: {0}")]
    NetworkMismatch(String),

    /// The user declined the connection prompt or no account was returned
    #[error("Account access rejected")]
    AccountAccessDenied,

    /// The node or wallet refused the contract call; carries the raw reason
    #[error("{0}")]
    ContractRevert(String),

    /// Anything else, with the raw message
    #[error("{0}")]
    Unknown(String),
}

impl ChainError {
    /// Raw message carried by the error, for substring classification.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<WalletError> for ChainError {
    fn from(err: WalletError) -> Self {
        Self::Unknown(err.message)
    }
}

impl From<alloy_contract::Error> for ChainError {
    fn from(err: alloy_contract::Error) -> Self {
        // Error responses carry the revert reason; anything else is transport or decoding.
        if let alloy_contract::Error::TransportError(ref transport) = err {
            if let Some(payload) = transport.as_error_resp() {
                return Self::ContractRevert(payload.message.to_string());
            }
        }
        Self::Unknown(err.to_string())
    }
}
