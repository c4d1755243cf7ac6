//! Terminal front-end for the token dashboard.
//!
//! The binary only parses flags and wires things up; everything it runs lives
//! here so the integration tests can drive it with in-memory doubles.

pub mod config;
pub mod metrics;

use crate::metrics::Metrics;
use client::{ChainClient, TokenContract, TokenFactory, TxOutcome, Wallet, WalletEvent};
use std::{future::Future, sync::Arc, time::Instant};
use tokio::{
    sync::{broadcast, broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{info, warn};
use view::{input, Failure, Form, Home};

/// Submit `form` once and record the outcome.
pub async fn submit<T: Form>(form: &mut T, metrics: &Metrics) -> Result<TxOutcome, Failure> {
    info!(form = form.name(), "{}", form.description());

    let start = Instant::now();
    let result = form.submit().await;
    metrics.record_submission(form.name(), &result, start.elapsed());

    result
}

/// One-line summary of a confirmed transaction.
pub fn describe_outcome(outcome: &TxOutcome) -> String {
    match outcome.block_number {
        Some(block) => format!(
            "Confirmed {} in block {block} (gas used {})",
            outcome.tx_hash, outcome.gas_used
        ),
        None => format!("Confirmed {} (gas used {})", outcome.tx_hash, outcome.gas_used),
    }
}

/// Balance of `holder`, formatted with live decimals and the token symbol.
pub async fn balance<W, F>(client: &Arc<ChainClient<W, F>>, holder: &str) -> Result<String, Failure>
where
    W: Wallet,
    F: TokenFactory,
{
    let holder = input::require_address(holder, "Enter a valid address")?;
    let home = Home::new(Arc::clone(client));
    let (_, display) = home.balance_of(holder).await?;
    let symbol = client.read_only_contract().symbol().await?;
    Ok(format!("{display} {symbol}"))
}

/// Count wallet events until the stream closes.
pub fn record_wallet_events(
    mut events: broadcast::Receiver<WalletEvent>,
    metrics: Metrics,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => metrics.record_wallet_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed wallet events"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Keep Home current until `shutdown` resolves.
///
/// Every notification refreshes Home; every chain change remounts it from
/// scratch. `render` is called after the initial mount and after each update.
pub async fn watch<W, F, R>(
    home: &mut Home<W, F>,
    mut resets: watch::Receiver<u64>,
    metrics: &Metrics,
    mut render: R,
    shutdown: impl Future<Output = ()>,
) where
    W: Wallet,
    F: TokenFactory,
    R: FnMut(&Home<W, F>),
{
    tokio::pin!(shutdown);

    home.mount().await;
    metrics.record_refresh();
    render(home);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            changed = resets.changed() => {
                if changed.is_err() {
                    warn!("Chain client is gone, stopping");
                    break;
                }
                let generation = *resets.borrow_and_update();
                info!(generation, "Chain changed, remounting");
                home.remount().await;
            }
            notification = home.next() => {
                let Some(notification) = notification else {
                    break;
                };
                info!(?notification, "Refreshed after notification");
            }
        }
        metrics.record_refresh();
        render(home);
    }
}
