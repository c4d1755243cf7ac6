use crate::{conclude, input, prepare, send_and_confirm, transition, Failure, Form, Phase};
use alloy_primitives::Address;
use client::{ChainClient, TokenCall, TokenFactory, TxOutcome, Wallet};
use std::sync::Arc;

const NAME: &str = "transfer";

/// Send tokens from the connected account.
pub struct Transfer<W: Wallet, F: TokenFactory> {
    client: Arc<ChainClient<W, F>>,
    pub to: String,
    pub amount: String,
    phase: Phase,
}

impl<W: Wallet, F: TokenFactory> Transfer<W, F> {
    pub fn new(client: Arc<ChainClient<W, F>>) -> Self {
        Self {
            client,
            to: String::new(),
            amount: String::new(),
            phase: Phase::Idle,
        }
    }

    /// Fill the form.
    pub fn with_input(mut self, to: impl Into<String>, amount: impl Into<String>) -> Self {
        self.to = to.into();
        self.amount = amount.into();
        self
    }
}

fn check(to: &str, amount: &str) -> Result<Address, Failure> {
    let to = input::require_address(to, "Enter a valid recipient address")?;
    input::require_amount(amount)?;
    Ok(to)
}

impl<W: Wallet, F: TokenFactory> Form for Transfer<W, F> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn validate(&self) -> Result<(), Failure> {
        check(&self.to, &self.amount).map(|_| ())
    }

    async fn submit(&mut self) -> Result<TxOutcome, Failure> {
        transition(NAME, &mut self.phase, Phase::Validating);
        let to = match check(&self.to, &self.amount) {
            Ok(to) => to,
            Err(failure) => {
                transition(NAME, &mut self.phase, Phase::Idle);
                return Err(failure);
            }
        };

        transition(NAME, &mut self.phase, Phase::Submitting);
        let result = async {
            let (_, token) = prepare(&self.client).await?;
            send_and_confirm(&token, &self.amount, |amount| TokenCall::Transfer { to, amount }).await
        }
        .await;

        let result = conclude(NAME, &mut self.phase, self.client.bus(), result);
        if result.is_ok() {
            self.clear();
        }
        result
    }

    fn clear(&mut self) {
        self.to.clear();
        self.amount.clear();
    }

    fn description(&self) -> String {
        format!("Transfer {} tokens to {}", self.amount, self.to)
    }
}
