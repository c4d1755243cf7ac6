//! The chain client: wallet connection, network enforcement, contract handles
//! and normalization of wallet events onto the [`EventBus`].

use crate::{
    session::{Session, SessionCache},
    ChainError, TokenFactory, Wallet, WalletError, WalletEvent,
};
use alloy_primitives::Address;
use config::NetworkConfig;
use events::EventBus;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::{
    runtime::Handle,
    sync::{broadcast, broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Mediates every contract read and write.
///
/// Wallet events are consumed by a listener task attached when the client is
/// built and aborted when it is dropped. The listener only holds a weak
/// reference, so dropping the last [`Arc`] tears everything down.
pub struct ChainClient<W: Wallet, F: TokenFactory> {
    network: NetworkConfig,
    wallet: Option<Arc<W>>,
    factory: F,
    bus: EventBus,
    session: SessionCache<F::Token>,
    resets: watch::Sender<u64>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<W: Wallet, F: TokenFactory> ChainClient<W, F> {
    /// Build a client. `wallet` is `None` when no wallet is available.
    ///
    /// When called inside a Tokio runtime and a wallet is present, a listener
    /// for the wallet's event stream is attached.
    pub fn new(network: NetworkConfig, wallet: Option<W>, factory: F, bus: EventBus) -> Arc<Self> {
        let wallet = wallet.map(Arc::new);
        let (resets, _) = watch::channel(0);

        let client = Arc::new(Self {
            network,
            wallet,
            factory,
            bus,
            session: SessionCache::default(),
            resets,
            listener: Mutex::new(None),
        });

        // The listener must only ever see a fully built client.
        if let Some(wallet) = client.wallet.as_deref() {
            let listener = Self::attach(Arc::downgrade(&client), wallet.subscribe());
            *client.listener.lock().unwrap_or_else(PoisonError::into_inner) = listener;
        }
        client
    }

    fn attach(client: Weak<Self>, mut events: broadcast::Receiver<WalletEvent>) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, wallet events will not be handled");
            return None;
        };

        Some(runtime.spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed wallet events");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };

                // Gone means dropped, and dropping aborts this task anyway.
                let Some(client) = client.upgrade() else {
                    break;
                };
                client.handle_wallet_event(event).await;
            }
        }))
    }

    /// Stop listening to wallet events.
    pub fn detach(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            listener.abort();
        }
    }

    pub const fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub const fn has_wallet(&self) -> bool {
        self.wallet.is_some()
    }

    /// Account of the cached session, if any.
    pub fn session_account(&self) -> Option<Address> {
        self.session.account()
    }

    /// Receiver bumped every time the wallet changes chain. Holders must
    /// discard every piece of chain state they derived and start over.
    pub fn resets(&self) -> watch::Receiver<u64> {
        self.resets.subscribe()
    }

    fn wallet(&self) -> Result<&W, ChainError> {
        self.wallet.as_deref().ok_or(ChainError::WalletUnavailable)
    }

    /// Connect the wallet: enforce the target network, request account access,
    /// cache the session and publish the account.
    pub async fn connect(&self) -> Result<(Address, F::Token), ChainError> {
        let wallet = self.wallet()?;

        self.ensure_network(wallet).await?;

        let accounts = wallet.request_accounts().await.map_err(|e| {
            if e.is_user_rejected() {
                ChainError::AccountAccessDenied
            } else {
                ChainError::from(e)
            }
        })?;
        let Some(account) = accounts.first().copied() else {
            return Err(self.disconnected());
        };

        let contract = self.factory.signing(account);
        self.session.store(Session {
            account,
            chain_id: self.network.chain_id,
            contract: contract.clone(),
        });

        info!(%account, "Wallet connected");
        self.bus.publish_account_changed(Some(account));

        Ok((account, contract))
    }

    /// Contract handle bound to the public RPC endpoint.
    pub fn read_only_contract(&self) -> F::Token {
        self.factory.read_only()
    }

    /// Contract handle signing with the wallet's current selection.
    ///
    /// The signer is always re-read from the wallet rather than taken from the
    /// cached session. If it differs from the session, the session is replaced
    /// and the new account published before the handle is returned.
    pub async fn writable_contract(&self) -> Result<F::Token, ChainError> {
        let wallet = self.wallet()?;

        let Some(signer) = wallet.accounts().await?.first().copied() else {
            return Err(self.disconnected());
        };

        let contract = self.factory.signing(signer);

        if self.session.account() != Some(signer) {
            debug!(%signer, "Wallet selection differs from cached session");
            self.session.invalidate();
            self.session.store(Session {
                account: signer,
                chain_id: self.network.chain_id,
                contract: contract.clone(),
            });
            self.bus.publish_account_changed(Some(signer));
        }

        Ok(contract)
    }

    /// The wallet reports no accounts: drop the session, announce the
    /// disconnect if there was one, and deny access.
    fn disconnected(&self) -> ChainError {
        if self.session.invalidate() {
            info!("Wallet reports no accounts, session dropped");
            self.bus.publish_account_changed(None);
        }
        ChainError::AccountAccessDenied
    }

    /// The connected account without prompting: the cached session's, or the
    /// first account the wallet has already authorized.
    pub async fn active_account(&self) -> Result<Option<Address>, ChainError> {
        if let Some(account) = self.session.account() {
            return Ok(Some(account));
        }
        let Some(wallet) = self.wallet.as_deref() else {
            return Ok(None);
        };
        Ok(wallet.accounts().await?.first().copied())
    }

    /// Let the user pick another account, then rebuild the session for it.
    pub async fn switch_account(&self) -> Result<Address, ChainError> {
        let wallet = self.wallet()?;

        let denied = |e: WalletError| {
            if e.is_user_rejected() {
                ChainError::AccountAccessDenied
            } else {
                ChainError::from(e)
            }
        };

        wallet.request_permissions().await.map_err(denied)?;
        let account = wallet
            .request_accounts()
            .await
            .map_err(denied)?
            .first()
            .copied()
            .ok_or(ChainError::AccountAccessDenied)?;

        self.session.invalidate();
        self.session.store(Session {
            account,
            chain_id: self.network.chain_id,
            contract: self.factory.signing(account),
        });

        info!(%account, "Wallet switched");
        self.bus.publish_account_changed(Some(account));

        Ok(account)
    }

    /// Make sure the wallet is on the target chain, switching (or adding and
    /// switching) when it is not.
    async fn ensure_network(&self, wallet: &W) -> Result<(), ChainError> {
        let current = wallet.chain_id().await?;
        let target = self.network.chain_id;
        if current == target {
            return Ok(());
        }

        info!(current, target, "Requesting network switch");

        match wallet.switch_chain(target).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                info!(target, chain_name = %self.network.chain_name, "Adding network to wallet");
                wallet
                    .add_chain(self.network.add_chain_params())
                    .await
                    .map_err(|e| ChainError::NetworkMismatch(e.message))
            }
            Err(e) => Err(ChainError::NetworkMismatch(e.message)),
        }
    }

    /// Apply a wallet event.
    ///
    /// Account changes invalidate the session and publish the new account.
    /// Chain changes try to move back to the target chain, then invalidate
    /// the session and signal a reset whatever the outcome.
    pub async fn handle_wallet_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let account = accounts.first().copied();
                info!(?account, "Wallet account changed");
                self.session.invalidate();
                self.bus.publish_account_changed(account);
            }
            WalletEvent::ChainChanged(chain_id) => {
                info!(chain_id, "Wallet chain changed");
                if chain_id != self.network.chain_id {
                    if let Some(wallet) = self.wallet.as_deref() {
                        if let Err(e) = self.ensure_network(wallet).await {
                            warn!(error = %e, "Could not switch back to the target network");
                        }
                    }
                }
                self.session.invalidate();
                self.resets.send_modify(|generation| *generation += 1);
            }
        }
    }
}

impl<W: Wallet, F: TokenFactory> Drop for ChainClient<W, F> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockFactory, MockWallet};
    use alloy_primitives::address;
    use events::{Notification, Topic};
    use std::sync::Mutex as StdMutex;

    const ALICE: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const BOB: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn published(bus: &EventBus) -> Arc<StdMutex<Vec<Notification>>> {
        let log = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let _sub = bus.subscribe(Topic::AccountChanged, move |n| sink.lock().unwrap().push(n.clone()));
        log
    }

    fn client(wallet: Option<MockWallet>) -> Arc<ChainClient<MockWallet, MockFactory>> {
        ChainClient::new(
            NetworkConfig::hardhat_localhost(),
            wallet,
            MockFactory,
            EventBus::new(),
        )
    }

    #[tokio::test]
    async fn test_connect_requires_wallet() {
        let client = client(None);
        assert_eq!(client.connect().await.unwrap_err(), ChainError::WalletUnavailable);
        assert_eq!(client.writable_contract().await.unwrap_err(), ChainError::WalletUnavailable);
        assert_eq!(client.active_account().await.unwrap(), None);
        // Reads never depend on the wallet.
        assert_eq!(client.read_only_contract().signer, None);
    }

    #[tokio::test]
    async fn test_connect_on_target_chain() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        let log = published(client.bus());

        let (account, contract) = client.connect().await.unwrap();

        assert_eq!(account, ALICE);
        assert_eq!(contract.signer, Some(ALICE));
        assert_eq!(client.session_account(), Some(ALICE));
        assert_eq!(*log.lock().unwrap(), vec![Notification::AccountChanged(Some(ALICE))]);
        assert_eq!(wallet.calls(), vec!["eth_chainId", "eth_requestAccounts"]);
    }

    #[tokio::test]
    async fn test_connect_switches_before_requesting_accounts() {
        let wallet = MockWallet::new(1, vec![ALICE]);
        let client = client(Some(wallet.clone()));

        client.connect().await.unwrap();

        assert_eq!(
            wallet.calls(),
            vec!["eth_chainId", "wallet_switchEthereumChain", "eth_requestAccounts"]
        );
        assert_eq!(wallet.current_chain(), 31337);
    }

    #[tokio::test]
    async fn test_connect_adds_unknown_chain() {
        let wallet = MockWallet::new(1, vec![ALICE]).without_target_chain();
        let client = client(Some(wallet.clone()));

        client.connect().await.unwrap();

        assert_eq!(
            wallet.calls(),
            vec![
                "eth_chainId",
                "wallet_switchEthereumChain",
                "wallet_addEthereumChain",
                "eth_requestAccounts"
            ]
        );
        let params = wallet.added_chain().unwrap();
        assert_eq!(params["chainId"], "0x7a69");
        assert_eq!(params["chainName"], "Hardhat Localhost");
        assert_eq!(params["nativeCurrency"]["symbol"], "ETH");
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
    }

    #[tokio::test]
    async fn test_connect_switch_rejected() {
        let wallet = MockWallet::new(1, vec![ALICE]).reject_switch();
        let client = client(Some(wallet));

        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, ChainError::NetworkMismatch(_)));
        assert_eq!(client.session_account(), None);
    }

    #[tokio::test]
    async fn test_connect_access_denied() {
        let client = client(Some(MockWallet::new(31337, vec![ALICE]).reject_accounts()));
        assert_eq!(client.connect().await.unwrap_err(), ChainError::AccountAccessDenied);

        let client = self::client(Some(MockWallet::new(31337, vec![])));
        assert_eq!(client.connect().await.unwrap_err(), ChainError::AccountAccessDenied);
    }

    #[tokio::test]
    async fn test_writable_contract_follows_wallet_selection() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        client.connect().await.unwrap();
        let log = published(client.bus());

        // The wallet moved to another account without an event reaching us yet.
        wallet.select(vec![BOB]);
        let contract = client.writable_contract().await.unwrap();

        assert_eq!(contract.signer, Some(BOB));
        assert_eq!(client.session_account(), Some(BOB));
        assert_eq!(*log.lock().unwrap(), vec![Notification::AccountChanged(Some(BOB))]);
    }

    #[tokio::test]
    async fn test_writable_contract_drops_session_when_wallet_empties() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        client.connect().await.unwrap();
        let log = published(client.bus());

        wallet.select(vec![]);
        assert_eq!(client.writable_contract().await.unwrap_err(), ChainError::AccountAccessDenied);

        assert_eq!(client.session_account(), None);
        assert_eq!(client.active_account().await.unwrap(), None);
        assert_eq!(*log.lock().unwrap(), vec![Notification::AccountChanged(None)]);

        // Nothing left to announce the second time.
        assert_eq!(client.writable_contract().await.unwrap_err(), ChainError::AccountAccessDenied);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_with_no_accounts_drops_session() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        client.connect().await.unwrap();
        let log = published(client.bus());

        wallet.select(vec![]);
        assert_eq!(client.connect().await.unwrap_err(), ChainError::AccountAccessDenied);

        assert_eq!(client.session_account(), None);
        assert_eq!(*log.lock().unwrap(), vec![Notification::AccountChanged(None)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_listener_attached_on_multi_thread_runtime() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        client.connect().await.unwrap();
        let mut resets = client.resets();

        wallet.push(WalletEvent::ChainChanged(31337));

        tokio::time::timeout(std::time::Duration::from_secs(1), resets.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.session_account(), None);

        // The listener keeps going after the first event.
        client.connect().await.unwrap();
        wallet.push(WalletEvent::ChainChanged(31337));
        tokio::time::timeout(std::time::Duration::from_secs(1), resets.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*resets.borrow(), 2);
    }

    #[tokio::test]
    async fn test_active_account_without_prompt() {
        let wallet = MockWallet::new(31337, vec![BOB]);
        let client = client(Some(wallet.clone()));

        assert_eq!(client.active_account().await.unwrap(), Some(BOB));
        assert_eq!(wallet.calls(), vec!["eth_accounts"]);
    }

    #[tokio::test]
    async fn test_accounts_changed_to_empty_disconnects() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet));
        client.connect().await.unwrap();
        let log = published(client.bus());

        client.handle_wallet_event(WalletEvent::AccountsChanged(vec![])).await;

        assert_eq!(client.session_account(), None);
        assert_eq!(*log.lock().unwrap(), vec![Notification::AccountChanged(None)]);
    }

    #[tokio::test]
    async fn test_chain_changed_resets_even_when_switch_fails() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        client.connect().await.unwrap();
        let mut resets = client.resets();

        wallet.set_chain(5);
        wallet.set_reject_switch(true);
        client.handle_wallet_event(WalletEvent::ChainChanged(5)).await;

        assert_eq!(client.session_account(), None);
        assert!(resets.has_changed().unwrap());
        assert_eq!(*resets.borrow_and_update(), 1);
        assert!(wallet.calls().contains(&"wallet_switchEthereumChain".to_string()));
    }

    #[tokio::test]
    async fn test_listener_handles_pushed_events() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        client.connect().await.unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _sub = client.bus().subscribe(Topic::AccountChanged, move |n| {
            let _ = tx.send(n.clone());
        });

        wallet.push(WalletEvent::AccountsChanged(vec![BOB]));

        let notification = tokio::time::timeout(std::time::Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notification, Notification::AccountChanged(Some(BOB)));
        assert_eq!(client.session_account(), None);
    }

    #[tokio::test]
    async fn test_switch_account() {
        let wallet = MockWallet::new(31337, vec![ALICE]);
        let client = client(Some(wallet.clone()));
        client.connect().await.unwrap();

        wallet.select(vec![BOB]);
        assert_eq!(client.switch_account().await.unwrap(), BOB);
        assert_eq!(client.session_account(), Some(BOB));
        assert!(wallet.calls().contains(&"wallet_requestPermissions".to_string()));
    }
}
