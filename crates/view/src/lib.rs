//! View controllers for the token dashboard.
//!
//! Every form follows the same cycle:
//! `Idle -> Validating -> Submitting -> (Success | Failed) -> Idle`.
//! Validation is local and synchronous. Submission connects the wallet, takes
//! a fresh signing handle, reads live `decimals()`, converts the amount,
//! broadcasts one transaction and waits for it. Success publishes
//! `TxComplete` and clears the form; failure keeps the input for a retry.

pub mod approve;
pub mod burn;
mod failure;
pub mod home;
pub mod input;
pub mod mint;
pub mod transfer;
pub mod transfer_from;

pub use approve::Approve;
pub use burn::Burn;
pub use failure::Failure;
pub use home::{BalanceView, Home};
pub use mint::Mint;
pub use transfer::Transfer;
pub use transfer_from::TransferFrom;

use alloy_primitives::{Address, U256};
use client::{ChainClient, TokenCall, TokenContract, TokenFactory, TxOutcome, Wallet};
use events::EventBus;
use std::future::Future;
use tracing::{debug, info, warn};

/// Where a form is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Success,
    Failed,
}

/// A user-submittable form.
pub trait Form: Send {
    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    fn phase(&self) -> Phase;

    /// Local checks. Never touches the network.
    fn validate(&self) -> Result<(), Failure>;

    /// Run one submission to completion.
    ///
    /// Returns to [`Phase::Idle`] whatever the outcome.
    fn submit(&mut self) -> impl Future<Output = Result<TxOutcome, Failure>> + Send;

    /// Reset every input field.
    fn clear(&mut self);

    /// Get a human-readable description of what submitting would do.
    fn description(&self) -> String;
}

/// Move `phase` to `next`.
pub(crate) fn transition(form: &'static str, phase: &mut Phase, next: Phase) {
    debug!(form, from = ?*phase, to = ?next, "Form transition");
    *phase = next;
}

/// Connect and take a signing handle for the wallet's current account.
pub(crate) async fn prepare<W, F>(
    client: &ChainClient<W, F>,
) -> Result<(Address, F::Token), Failure>
where
    W: Wallet,
    F: TokenFactory,
{
    client.connect().await?;
    let token = client.writable_contract().await?;
    let signer = token.signer().ok_or(Failure::WalletUnavailable)?;
    Ok((signer, token))
}

/// Convert `amount` with live decimals, broadcast the call and wait for it.
pub(crate) async fn send_and_confirm<T, C>(
    token: &T,
    amount: &str,
    call: C,
) -> Result<TxOutcome, Failure>
where
    T: TokenContract,
    C: FnOnce(U256) -> TokenCall + Send,
{
    let decimals = token.decimals().await?;
    let amount = input::parse_amount(amount, decimals)?;
    let call = call(amount);

    let tx_hash = token.send(call).await?;
    info!(function = call.function(), %tx_hash, "Transaction submitted");

    Ok(token.confirm(tx_hash).await?)
}

/// Finish a submission: publish on success, log on failure, return to idle.
pub(crate) fn conclude(
    form: &'static str,
    phase: &mut Phase,
    bus: &EventBus,
    result: Result<TxOutcome, Failure>,
) -> Result<TxOutcome, Failure> {
    match &result {
        Ok(outcome) => {
            transition(form, phase, Phase::Success);
            info!(form, tx_hash = %outcome.tx_hash, "Submission confirmed");
            bus.publish_tx_complete();
        }
        Err(failure) => {
            transition(form, phase, Phase::Failed);
            warn!(form, kind = failure.kind(), %failure, "Submission failed");
        }
    }
    transition(form, phase, Phase::Idle);
    result
}
