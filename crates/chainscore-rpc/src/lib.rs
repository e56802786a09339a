//! Remote side of a score query.
//!
//! - [`transport`]: JSON-RPC 2.0 over HTTP with bounded retries for transient failures.
//! - [`ledger`]: the [`LedgerClient`] contract (submit, poll, read) with an HTTP adapter
//!   and a deterministic in-memory mock.
//! - [`decode`]: defensive parsing of untyped contract payloads.
#![forbid(unsafe_code)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

pub mod decode;
pub mod ledger;
pub mod transport;

pub use ledger::{LedgerClient, LedgerError, LedgerStats, ReceiptStatus, RequestHandle};
pub use transport::{JsonRpcTransport, RpcConfig, RpcError};
