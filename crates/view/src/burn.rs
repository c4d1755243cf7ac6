use crate::{conclude, input, prepare, send_and_confirm, transition, Failure, Form, Phase};
use client::{ChainClient, TokenCall, TokenFactory, TxOutcome, Wallet};
use std::sync::Arc;

const NAME: &str = "burn";

/// Destroy tokens held by the connected account.
pub struct Burn<W: Wallet, F: TokenFactory> {
    client: Arc<ChainClient<W, F>>,
    pub amount: String,
    phase: Phase,
}

impl<W: Wallet, F: TokenFactory> Burn<W, F> {
    pub fn new(client: Arc<ChainClient<W, F>>) -> Self {
        Self {
            client,
            amount: String::new(),
            phase: Phase::Idle,
        }
    }

    pub fn with_input(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }
}

impl<W: Wallet, F: TokenFactory> Form for Burn<W, F> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn validate(&self) -> Result<(), Failure> {
        input::require_amount(&self.amount)
    }

    async fn submit(&mut self) -> Result<TxOutcome, Failure> {
        transition(NAME, &mut self.phase, Phase::Validating);
        if let Err(failure) = self.validate() {
            transition(NAME, &mut self.phase, Phase::Idle);
            return Err(failure);
        }

        transition(NAME, &mut self.phase, Phase::Submitting);
        let result = async {
            let (_, token) = prepare(&self.client).await?;
            send_and_confirm(&token, &self.amount, |amount| TokenCall::Burn { amount }).await
        }
        .await;

        let result = conclude(NAME, &mut self.phase, self.client.bus(), result);
        if result.is_ok() {
            self.clear();
        }
        result
    }

    fn clear(&mut self) {
        self.amount.clear();
    }

    fn description(&self) -> String {
        format!("Burn {} tokens", self.amount)
    }
}
