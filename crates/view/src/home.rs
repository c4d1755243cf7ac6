//! The Home view: token metadata, the connected account and its balance.
//!
//! Home never submits transactions. It reads on [`Home::mount`] and again
//! after every `TxComplete` or `AccountChanged` notification. Bus handlers run
//! synchronously on the publisher's stack, so they only forward notifications
//! into an inbox that the owner drains with [`Home::sync`] or awaits with
//! [`Home::next`].

use crate::{input, Failure};
use alloy_primitives::{Address, U256};
use client::{ChainClient, TokenContract, TokenFactory, TokenMetadata, Wallet};
use events::{Notification, Subscription, Topic};
use std::{fmt, sync::Arc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Balance line of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BalanceView {
    #[default]
    Disconnected,
    Loaded {
        raw: U256,
        display: String,
    },
    /// The read failed; carries the failure text
    Unavailable(String),
}

pub struct Home<W: Wallet, F: TokenFactory> {
    client: Arc<ChainClient<W, F>>,
    metadata: Option<TokenMetadata>,
    account: Option<Address>,
    balance: BalanceView,
    connecting: bool,
    inbox: mpsc::UnboundedReceiver<Notification>,
    subscriptions: Vec<Subscription>,
}

impl<W: Wallet, F: TokenFactory> Home<W, F> {
    /// Create the view and subscribe it to the client's bus. Nothing is read
    /// until [`Home::mount`].
    pub fn new(client: Arc<ChainClient<W, F>>) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();

        let subscriptions = [Topic::TxComplete, Topic::AccountChanged]
            .into_iter()
            .map(|topic| {
                let tx = tx.clone();
                client.bus().subscribe(topic, move |notification| {
                    // The receiver only goes away together with the view.
                    let _ = tx.send(notification.clone());
                })
            })
            .collect();

        Self {
            client,
            metadata: None,
            account: None,
            balance: BalanceView::Disconnected,
            connecting: false,
            inbox,
            subscriptions,
        }
    }

    pub const fn metadata(&self) -> Option<&TokenMetadata> {
        self.metadata.as_ref()
    }

    pub const fn account(&self) -> Option<Address> {
        self.account
    }

    pub const fn balance(&self) -> &BalanceView {
        &self.balance
    }

    pub const fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    pub const fn is_connecting(&self) -> bool {
        self.connecting
    }

    /// Initial load: pick up an already authorized account without
    /// prompting, then read everything.
    pub async fn mount(&mut self) {
        self.account = match self.client.active_account().await {
            Ok(account) => account,
            Err(e) => {
                warn!(error = %e, "Could not read the wallet's accounts");
                None
            }
        };
        self.refresh().await;
    }

    /// Discard everything derived from the chain and mount again.
    pub async fn remount(&mut self) {
        info!("Remounting home view");
        self.metadata = None;
        self.account = None;
        self.balance = BalanceView::Disconnected;
        // Anything queued belongs to the previous chain.
        while self.inbox.try_recv().is_ok() {}
        self.mount().await;
    }

    /// Re-read metadata and, when connected, the account balance.
    pub async fn refresh(&mut self) {
        match self.client.read_only_contract().metadata().await {
            Ok(metadata) => self.metadata = Some(metadata),
            Err(e) => warn!(error = %e, "Failed to load token metadata"),
        }

        self.balance = match self.account {
            None => BalanceView::Disconnected,
            Some(account) => match self.balance_of(account).await {
                Ok((raw, display)) => BalanceView::Loaded { raw, display },
                Err(failure) => {
                    warn!(%account, %failure, "Failed to load balance");
                    BalanceView::Unavailable(failure.to_string())
                }
            },
        };
        debug!(account = ?self.account, balance = ?self.balance, "Home refreshed");
    }

    /// Apply one notification and refresh.
    pub async fn handle(&mut self, notification: Notification) {
        self.apply(&notification);
        self.refresh().await;
    }

    fn apply(&mut self, notification: &Notification) {
        if let Notification::AccountChanged(account) = notification {
            self.account = *account;
        }
    }

    /// Apply every queued notification, refreshing once if there were any.
    /// Returns how many were applied.
    pub async fn sync(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(notification) = self.inbox.try_recv() {
            self.apply(&notification);
            applied += 1;
        }
        if applied > 0 {
            self.refresh().await;
        }
        applied
    }

    /// Wait for the next notification, apply it and refresh.
    pub async fn next(&mut self) -> Option<Notification> {
        let notification = self.inbox.recv().await?;
        self.handle(notification.clone()).await;
        Some(notification)
    }

    /// The connect button.
    pub async fn connect(&mut self) -> Result<Address, Failure> {
        self.connecting = true;
        let result = self.client.connect().await;
        self.connecting = false;

        let (account, _) = result?;
        self.account = Some(account);
        self.refresh().await;
        Ok(account)
    }

    /// Let the user pick another wallet account.
    pub async fn switch_wallet(&mut self) -> Result<Address, Failure> {
        let account = self.client.switch_account().await?;
        self.account = Some(account);
        self.refresh().await;
        Ok(account)
    }

    /// Any holder's balance, raw and formatted with live decimals.
    pub async fn balance_of(&self, holder: Address) -> Result<(U256, String), Failure> {
        let token = self.client.read_only_contract();
        let decimals = token.decimals().await?;
        let raw = token.balance_of(holder).await?;
        let display = input::format_amount(raw, decimals)?;
        Ok((raw, display))
    }
}

impl<W: Wallet, F: TokenFactory> Drop for Home<W, F> {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

fn amount(value: U256, decimals: u8) -> String {
    input::format_amount(value, decimals).unwrap_or_else(|_| value.to_string())
}

impl<W: Wallet, F: TokenFactory> fmt::Display for Home<W, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match &self.metadata {
            Some(metadata) => {
                writeln!(f, "Token:        {} ({})", metadata.name, metadata.symbol)?;
                writeln!(f, "Address:      {}", self.client.network().token)?;
                writeln!(f, "Decimals:     {}", metadata.decimals)?;
                writeln!(
                    f,
                    "Total supply: {}",
                    amount(metadata.total_supply, metadata.decimals)
                )?;
                writeln!(f, "Cap:          {}", amount(metadata.cap, metadata.decimals))?;
                writeln!(f, "Owner:        {}", metadata.owner)?;
                metadata.symbol.as_str()
            }
            None => {
                writeln!(f, "Token:        unavailable")?;
                ""
            }
        };

        match self.account {
            Some(account) => writeln!(f, "Account:      {account}")?,
            None if self.connecting => writeln!(f, "Account:      connecting...")?,
            None => writeln!(f, "Account:      not connected")?,
        }

        match &self.balance {
            BalanceView::Disconnected => Ok(()),
            BalanceView::Loaded { display, .. } => writeln!(f, "Balance:      {display} {symbol}"),
            BalanceView::Unavailable(reason) => writeln!(f, "Balance:      unavailable ({reason})"),
        }
    }
}
