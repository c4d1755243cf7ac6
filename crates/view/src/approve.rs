use crate::{conclude, input, prepare, send_and_confirm, transition, Failure, Form, Phase};
use alloy_primitives::Address;
use client::{ChainClient, TokenCall, TokenContract, TokenFactory, TxOutcome, Wallet};
use std::sync::Arc;
use tracing::warn;

const NAME: &str = "approve";

/// Approve a spender, and look up existing allowances.
pub struct Approve<W: Wallet, F: TokenFactory> {
    client: Arc<ChainClient<W, F>>,
    pub spender: String,
    pub amount: String,
    phase: Phase,
    /// Allowance lookup form
    pub lookup_owner: String,
    pub lookup_spender: String,
    checking: bool,
    allowance: Option<String>,
}

impl<W: Wallet, F: TokenFactory> Approve<W, F> {
    pub fn new(client: Arc<ChainClient<W, F>>) -> Self {
        Self {
            client,
            spender: String::new(),
            amount: String::new(),
            phase: Phase::Idle,
            lookup_owner: String::new(),
            lookup_spender: String::new(),
            checking: false,
            allowance: None,
        }
    }

    pub fn with_input(mut self, spender: impl Into<String>, amount: impl Into<String>) -> Self {
        self.spender = spender.into();
        self.amount = amount.into();
        self
    }

    pub fn with_lookup(mut self, owner: impl Into<String>, spender: impl Into<String>) -> Self {
        self.lookup_owner = owner.into();
        self.lookup_spender = spender.into();
        self
    }

    pub const fn is_checking(&self) -> bool {
        self.checking
    }

    /// Last allowance looked up, formatted with live decimals.
    pub fn allowance(&self) -> Option<&str> {
        self.allowance.as_deref()
    }

    /// Read `allowance(owner, spender)` through the public endpoint.
    pub async fn check_allowance(&mut self) -> Result<String, Failure> {
        const MESSAGE: &str = "Provide valid owner and spender addresses";
        let owner = input::require_address(&self.lookup_owner, MESSAGE)?;
        let spender = input::require_address(&self.lookup_spender, MESSAGE)?;

        self.checking = true;
        let result = async {
            let token = self.client.read_only_contract();
            let allowance = token.allowance(owner, spender).await?;
            let decimals = token.decimals().await?;
            input::format_amount(allowance, decimals)
        }
        .await;
        self.checking = false;

        match result {
            Ok(formatted) => {
                self.allowance = Some(formatted.clone());
                Ok(formatted)
            }
            Err(failure) => {
                warn!(%owner, %spender, %failure, "Allowance lookup failed");
                Err(Failure::Unknown("Unable to fetch allowance".to_string()))
            }
        }
    }
}

fn check(spender: &str, amount: &str) -> Result<Address, Failure> {
    let spender = input::require_address(spender, "Spender must be a valid address")?;
    input::require_amount(amount)?;
    Ok(spender)
}

impl<W: Wallet, F: TokenFactory> Form for Approve<W, F> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn validate(&self) -> Result<(), Failure> {
        check(&self.spender, &self.amount).map(|_| ())
    }

    async fn submit(&mut self) -> Result<TxOutcome, Failure> {
        transition(NAME, &mut self.phase, Phase::Validating);
        let spender = match check(&self.spender, &self.amount) {
            Ok(spender) => spender,
            Err(failure) => {
                transition(NAME, &mut self.phase, Phase::Idle);
                return Err(failure);
            }
        };

        transition(NAME, &mut self.phase, Phase::Submitting);
        let result = async {
            let (_, token) = prepare(&self.client).await?;
            send_and_confirm(&token, &self.amount, |amount| TokenCall::Approve {
                spender,
                amount,
            })
            .await
        }
        .await;

        let result = conclude(NAME, &mut self.phase, self.client.bus(), result);
        if result.is_ok() {
            self.clear();
        }
        result
    }

    fn clear(&mut self) {
        self.spender.clear();
        self.amount.clear();
    }

    fn description(&self) -> String {
        format!("Approve {} to spend {} tokens", self.spender, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check() {
        let spender = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
        assert!(check(spender, "0.25").is_ok());
        assert_eq!(
            check("spender", "1").unwrap_err().to_string(),
            "Spender must be a valid address"
        );
        assert!(check(spender, "zero").is_err());
    }
}
