use crate::{conclude, input, prepare, send_and_confirm, transition, Failure, Form, Phase};
use alloy_primitives::Address;
use client::{ChainClient, TokenCall, TokenFactory, TxOutcome, Wallet};
use std::sync::Arc;

const NAME: &str = "transfer_from";

/// Move tokens out of an account that approved the connected account.
pub struct TransferFrom<W: Wallet, F: TokenFactory> {
    client: Arc<ChainClient<W, F>>,
    pub from: String,
    pub to: String,
    pub amount: String,
    phase: Phase,
}

impl<W: Wallet, F: TokenFactory> TransferFrom<W, F> {
    pub fn new(client: Arc<ChainClient<W, F>>) -> Self {
        Self {
            client,
            from: String::new(),
            to: String::new(),
            amount: String::new(),
            phase: Phase::Idle,
        }
    }

    pub fn with_input(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        self.from = from.into();
        self.to = to.into();
        self.amount = amount.into();
        self
    }
}

fn check(from: &str, to: &str, amount: &str) -> Result<(Address, Address), Failure> {
    const MESSAGE: &str = "From and To must be valid addresses";
    let from = input::require_address(from, MESSAGE)?;
    let to = input::require_address(to, MESSAGE)?;
    input::require_amount(amount)?;
    Ok((from, to))
}

impl<W: Wallet, F: TokenFactory> Form for TransferFrom<W, F> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn validate(&self) -> Result<(), Failure> {
        check(&self.from, &self.to, &self.amount).map(|_| ())
    }

    async fn submit(&mut self) -> Result<TxOutcome, Failure> {
        transition(NAME, &mut self.phase, Phase::Validating);
        let (from, to) = match check(&self.from, &self.to, &self.amount) {
            Ok(parties) => parties,
            Err(failure) => {
                transition(NAME, &mut self.phase, Phase::Idle);
                return Err(failure);
            }
        };

        transition(NAME, &mut self.phase, Phase::Submitting);
        let result = async {
            let (_, token) = prepare(&self.client).await?;
            send_and_confirm(&token, &self.amount, |amount| TokenCall::TransferFrom {
                from,
                to,
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
        self.from.clear();
        self.to.clear();
        self.amount.clear();
    }

    fn description(&self) -> String {
        format!(
            "Transfer {} tokens from {} to {}",
            self.amount, self.from, self.to
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_requires_both_addresses() {
        let a = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
        let b = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";
        assert!(check(a, b, "1").is_ok());
        assert!(check(a, "bob", "1").is_err());
        assert!(check("", b, "1").is_err());
        assert!(check(a, b, "0").is_err());
    }
}
