//! Remote ledger contract.
//!
//! Stateless request/response operations against the scoring contract. Implementations
//! perform network I/O only and never hold query state; the engine owns that.
//!
//! Transports are adapters implementing [`LedgerClient`]:
//! - [`http_client::HttpLedgerClient`]: JSON-RPC against a live node.
//! - [`mock_client::MockLedgerClient`]: scripted, in-memory, for tests and offline runs.

pub mod http_client;
pub mod mock_client;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chainscore_core::{Address, AuthorizationArtifact, ErrorKind, ScoreRecord};
use serde::{Deserialize, Serialize};

use crate::transport::RpcError;

/// Identifier of a submitted computation (transaction hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestHandle(pub String);

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single receipt poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Pending,
    Finalized,
    Rejected,
}

/// Contract counters exposed by the stats view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_queries: u64,
    pub unique_addresses: u64,
    pub fee_collected: u128,
    pub query_fee: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("rpc unavailable: {0}")]
    RpcUnavailable(String),
    #[error("remote rejected: {0}")]
    RemoteRejected(String),
    #[error("decode failure: {0}")]
    Decode(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Config(_) => ErrorKind::ConfigurationError,
            LedgerError::RpcUnavailable(_) => ErrorKind::RpcUnavailable,
            LedgerError::RemoteRejected(_) => ErrorKind::RemoteRejected,
            LedgerError::Decode(_) => ErrorKind::DecodeFailure,
        }
    }
}

impl From<RpcError> for LedgerError {
    fn from(err: RpcError) -> Self {
        if err.is_protocol_error() || err.is_server_error() {
            return LedgerError::RpcUnavailable(err.to_string());
        }
        match err {
            RpcError::Config(msg) => LedgerError::Config(msg),
            RpcError::Decode(msg) => LedgerError::Decode(msg),
            RpcError::Network(_) | RpcError::HttpStatus { .. } => {
                LedgerError::RpcUnavailable(err.to_string())
            }
            RpcError::Remote { .. } => LedgerError::RemoteRejected(err.to_string()),
        }
    }
}

/// Operations the engine needs from the scoring contract.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Starts a remote score computation for `target` on behalf of `signer`.
    async fn submit_computation(
        &self,
        target: &Address,
        signer: &Address,
        authorization: &AuthorizationArtifact,
    ) -> Result<RequestHandle, LedgerError>;

    /// One receipt lookup. Never waits.
    async fn poll_receipt(&self, handle: &RequestHandle) -> Result<ReceiptStatus, LedgerError>;

    /// Most recently computed authoritative record, `None` when the contract has none.
    async fn fetch_last_score(&self) -> Result<Option<ScoreRecord>, LedgerError>;

    /// Cached record for `address`; free, no authorization.
    async fn fetch_cached_score(&self, address: &Address)
        -> Result<Option<ScoreRecord>, LedgerError>;
}

#[async_trait]
impl<T> LedgerClient for Arc<T>
where
    T: LedgerClient + ?Sized,
{
    async fn submit_computation(
        &self,
        target: &Address,
        signer: &Address,
        authorization: &AuthorizationArtifact,
    ) -> Result<RequestHandle, LedgerError> {
        (**self).submit_computation(target, signer, authorization).await
    }

    async fn poll_receipt(&self, handle: &RequestHandle) -> Result<ReceiptStatus, LedgerError> {
        (**self).poll_receipt(handle).await
    }

    async fn fetch_last_score(&self) -> Result<Option<ScoreRecord>, LedgerError> {
        (**self).fetch_last_score().await
    }

    async fn fetch_cached_score(
        &self,
        address: &Address,
    ) -> Result<Option<ScoreRecord>, LedgerError> {
        (**self).fetch_cached_score(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_errors_map_onto_the_taxonomy() {
        let cases = [
            (RpcError::Network("refused".into()), ErrorKind::RpcUnavailable),
            (
                RpcError::HttpStatus {
                    status: 502,
                    body: String::new(),
                },
                ErrorKind::RpcUnavailable,
            ),
            (RpcError::Decode("eof".into()), ErrorKind::DecodeFailure),
            (RpcError::Config("no url".into()), ErrorKind::ConfigurationError),
            (
                RpcError::Remote {
                    code: -32601,
                    message: "method not found".into(),
                    data: None,
                },
                ErrorKind::RpcUnavailable,
            ),
            (
                RpcError::Remote {
                    code: -32603,
                    message: "internal error".into(),
                    data: None,
                },
                ErrorKind::RpcUnavailable,
            ),
            (
                RpcError::Remote {
                    code: -32000,
                    message: "server busy".into(),
                    data: None,
                },
                ErrorKind::RpcUnavailable,
            ),
            (
                RpcError::Remote {
                    code: -32099,
                    message: "upstream timeout".into(),
                    data: None,
                },
                ErrorKind::RpcUnavailable,
            ),
            (
                RpcError::Remote {
                    code: 3,
                    message: "execution reverted".into(),
                    data: None,
                },
                ErrorKind::RemoteRejected,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(LedgerError::from(err).kind(), kind);
        }
    }
}
