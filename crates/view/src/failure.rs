use client::ChainError;
use thiserror::Error;

/// Why a submission or lookup ended without a result. The `Display` text is
/// the user-facing notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Malformed input, caught before any network call
    #[error("{0}")]
    Validation(String),

    /// The connected account may not perform the action
    #[error("{0}")]
    Authorization(String),

    #[error("Wallet not detected")]
    WalletUnavailable,

    #[error("Wrong network: {0}")]
    NetworkMismatch(String),

    #[error("Account access rejected")]
    AccountAccessDenied,

    /// Revert mentioning an insufficient balance; carries the raw reason
    #[error("Insufficient balance")]
    InsufficientBalance(String),

    /// Revert mentioning the allowance; carries the raw reason
    #[error("Allowance too low")]
    AllowanceTooLow(String),

    /// The user cancelled in the wallet
    #[error("Transaction rejected")]
    UserRejected,

    /// Any other revert, with the raw reason
    #[error("{0}")]
    Revert(String),

    #[error("{0}")]
    Unknown(String),
}

impl Failure {
    pub const NOT_OWNER: &'static str = "Not owner";

    /// Stable label for logs and metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Authorization(_) => "authorization",
            Self::WalletUnavailable => "wallet_unavailable",
            Self::NetworkMismatch(_) => "network_mismatch",
            Self::AccountAccessDenied => "account_access_denied",
            Self::InsufficientBalance(_) => "insufficient_balance",
            Self::AllowanceTooLow(_) => "allowance_too_low",
            Self::UserRejected => "user_rejected",
            Self::Revert(_) => "contract_revert",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether the chain rejected the call itself.
    pub const fn is_contract_revert(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance(_) | Self::AllowanceTooLow(_) | Self::Revert(_)
        )
    }

    /// Classify a raw failure message by the substrings wallets and nodes use.
    ///
    /// `fallback` builds the failure when nothing matches. "allowance" is
    /// checked before "insufficient" so "insufficient allowance" reads as an
    /// allowance problem.
    fn classify(message: String, fallback: fn(String) -> Self) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("user rejected") || lower.contains("user denied") {
            Self::UserRejected
        } else if lower.contains("not owner") {
            Self::Authorization(Self::NOT_OWNER.to_string())
        } else if lower.contains("allowance") {
            Self::AllowanceTooLow(message)
        } else if lower.contains("insufficient") {
            Self::InsufficientBalance(message)
        } else {
            fallback(message)
        }
    }
}

impl From<ChainError> for Failure {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::WalletUnavailable => Self::WalletUnavailable,
            ChainError::NetworkMismatch(message) => Self::NetworkMismatch(message),
            ChainError::AccountAccessDenied => Self::AccountAccessDenied,
            ChainError::ContractRevert(message) => Self::classify(message, Self::Revert),
            ChainError::Unknown(message) => Self::classify(message, Self::Unknown),
        }
    }
}
