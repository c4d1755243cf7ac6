use crate::{conclude, input, prepare, send_and_confirm, transition, Failure, Form, Phase};
use alloy_primitives::Address;
use client::{ChainClient, TokenCall, TokenContract, TokenFactory, TxOutcome, Wallet};
use std::sync::Arc;
use tracing::{debug, warn};

const NAME: &str = "mint";

/// Mint new tokens. Only the contract owner may submit.
pub struct Mint<W: Wallet, F: TokenFactory> {
    client: Arc<ChainClient<W, F>>,
    pub recipient: String,
    pub amount: String,
    owner: Option<Address>,
    phase: Phase,
}

impl<W: Wallet, F: TokenFactory> Mint<W, F> {
    pub fn new(client: Arc<ChainClient<W, F>>) -> Self {
        Self {
            client,
            recipient: String::new(),
            amount: String::new(),
            owner: None,
            phase: Phase::Idle,
        }
    }

    pub fn with_input(mut self, recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        self.recipient = recipient.into();
        self.amount = amount.into();
        self
    }

    /// Contract owner, once loaded.
    pub const fn owner(&self) -> Option<Address> {
        self.owner
    }

    /// Read the owner through the public endpoint.
    pub async fn load_owner(&mut self) -> Result<Address, Failure> {
        let owner = self
            .client
            .read_only_contract()
            .owner()
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to load owner"))?;
        debug!(%owner, "Loaded token owner");
        self.owner = Some(owner);
        Ok(owner)
    }

    async fn authorized_submit(&mut self, recipient: Address) -> Result<TxOutcome, Failure> {
        let owner = match self.owner {
            Some(owner) => owner,
            None => self.load_owner().await?,
        };

        let (signer, token) = prepare(&self.client).await?;
        if signer != owner {
            warn!(%signer, %owner, "Mint refused: connected account is not the owner");
            return Err(Failure::Authorization(Failure::NOT_OWNER.to_string()));
        }

        send_and_confirm(&token, &self.amount, |amount| TokenCall::Mint {
            to: recipient,
            amount,
        })
        .await
    }
}

fn check(recipient: &str, amount: &str) -> Result<Address, Failure> {
    let recipient = input::require_address(recipient, "Recipient must be a valid address")?;
    input::require_amount(amount)?;
    Ok(recipient)
}

impl<W: Wallet, F: TokenFactory> Form for Mint<W, F> {
    fn name(&self) -> &'static str {
        NAME
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn validate(&self) -> Result<(), Failure> {
        check(&self.recipient, &self.amount).map(|_| ())
    }

    async fn submit(&mut self) -> Result<TxOutcome, Failure> {
        transition(NAME, &mut self.phase, Phase::Validating);
        let recipient = match check(&self.recipient, &self.amount) {
            Ok(recipient) => recipient,
            Err(failure) => {
                transition(NAME, &mut self.phase, Phase::Idle);
                return Err(failure);
            }
        };

        transition(NAME, &mut self.phase, Phase::Submitting);
        let result = self.authorized_submit(recipient).await;

        let result = conclude(NAME, &mut self.phase, self.client.bus(), result);
        if result.is_ok() {
            self.clear();
        }
        result
    }

    fn clear(&mut self) {
        self.recipient.clear();
        self.amount.clear();
    }

    fn description(&self) -> String {
        format!("Mint {} tokens to {}", self.amount, self.recipient)
    }
}
