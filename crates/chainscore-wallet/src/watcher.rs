//! Background polling of the wallet's exposed account and active chain.
//!
//! Injected wallets push `accountsChanged`/`chainChanged`; over plain JSON-RPC we poll and
//! publish the differences on a broadcast channel.

use std::sync::Arc;
use std::time::Duration;

use chainscore_core::Address;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use crate::provider::WalletProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// First exposed account, `None` once the wallet disconnects.
    AccountsChanged(Option<Address>),
    ChainChanged(u64),
}

/// Keeps the watcher running. Dropping every clone stops it.
#[derive(Clone)]
pub struct WalletWatcherHandle {
    cancel: Arc<watch::Sender<bool>>,
    events: broadcast::Sender<WalletEvent>,
}

impl WalletWatcherHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    pub fn shutdown(&self) {
        let _ = self.cancel.send(true);
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    account: Option<Option<Address>>,
    chain: Option<u64>,
}

pub fn spawn_wallet_watcher<P>(provider: Arc<P>, interval: Duration) -> WalletWatcherHandle
where
    P: WalletProvider + ?Sized + 'static,
{
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (events_tx, _) = broadcast::channel(16);
    let events = events_tx.clone();

    tokio::spawn(async move {
        run_watcher(provider, interval, events_tx, cancel_rx).await;
    });

    WalletWatcherHandle {
        cancel: Arc::new(cancel_tx),
        events,
    }
}

fn interval_ms(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}

async fn run_watcher<P>(
    provider: Arc<P>,
    interval: Duration,
    events: broadcast::Sender<WalletEvent>,
    mut cancel_rx: watch::Receiver<bool>,
) where
    P: WalletProvider + ?Sized,
{
    info!(interval_ms = interval_ms(interval), "starting wallet watcher");
    let mut seen = Snapshot::default();
    // Baseline: the state at startup is not a change.
    observe(provider.as_ref(), &mut seen, None).await;

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                observe(provider.as_ref(), &mut seen, Some(&events)).await;
            }
            res = cancel_rx.changed() => {
                if res.is_err() || *cancel_rx.borrow() {
                    info!("wallet watcher shutting down");
                    break;
                }
            }
        }
    }
}

async fn observe<P>(
    provider: &P,
    seen: &mut Snapshot,
    events: Option<&broadcast::Sender<WalletEvent>>,
) where
    P: WalletProvider + ?Sized,
{
    match provider.accounts().await {
        Ok(accounts) => {
            let current = accounts.first().copied();
            if seen.account != Some(current) {
                if let (Some(tx), Some(_)) = (events, seen.account) {
                    let _ = tx.send(WalletEvent::AccountsChanged(current));
                }
                seen.account = Some(current);
            }
        }
        Err(e) => debug!(error = %e, "accounts poll failed"),
    }

    match provider.chain_id().await {
        Ok(chain) => {
            if seen.chain != Some(chain) {
                if let (Some(tx), Some(_)) = (events, seen.chain) {
                    let _ = tx.send(WalletEvent::ChainChanged(chain));
                }
                seen.chain = Some(chain);
            }
        }
        Err(e) => debug!(error = %e, "chain poll failed"),
    }
}
