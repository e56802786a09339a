//! Wallet side of a score query.
//!
//! The wallet is an external collaborator: it holds keys, shows the confirmation prompt and
//! may be declined by the user. This crate models it at its request boundary.
//!
//! - [`provider::WalletProvider`]: accounts, chain switching, transactions, signing, balance.
//! - [`rpc_provider::RpcWalletProvider`]: that surface over an EIP-1193 style JSON-RPC endpoint.
//! - [`authorizer::WalletAuthorizer`]: the single operation the engine needs, obtaining an
//!   authorization artifact, with [`authorizer::ProviderAuthorizer`] adapting any provider.
//! - [`watcher`]: account/chain change notifications.
//! - [`mock::MockWallet`]: scripted provider for tests.
#![forbid(unsafe_code)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

pub mod authorizer;
pub mod error;
pub mod mock;
pub mod provider;
pub mod rpc_provider;
pub mod units;
pub mod watcher;

pub use authorizer::{AuthorizationRequest, ProviderAuthorizer, WalletAuthorizer};
pub use error::WalletError;
pub use provider::{connect, ensure_chain, ChainConfig, TransactionRequest, WalletConnection, WalletProvider};
pub use rpc_provider::RpcWalletProvider;
pub use watcher::{spawn_wallet_watcher, WalletEvent, WalletWatcherHandle};
