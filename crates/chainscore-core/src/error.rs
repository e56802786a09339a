use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed failure taxonomy surfaced to callers.
///
/// Produced where the failure happens; never inferred from message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InvalidAddress,
    ConfigurationError,
    UserRejected,
    AuthorizationError,
    InsufficientBalance,
    RpcUnavailable,
    RemoteRejected,
    DecodeFailure,
    /// Polling budget exhausted. Recovered by fallback, never a terminal query failure.
    Timeout,
    /// Read path found no record.
    NotFound,
}

impl ErrorKind {
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::InvalidAddress => "invalid_address",
            ErrorKind::ConfigurationError => "configuration_error",
            ErrorKind::UserRejected => "user_rejected",
            ErrorKind::AuthorizationError => "authorization_error",
            ErrorKind::InsufficientBalance => "insufficient_balance",
            ErrorKind::RpcUnavailable => "rpc_unavailable",
            ErrorKind::RemoteRejected => "remote_rejected",
            ErrorKind::DecodeFailure => "decode_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NotFound => "not_found",
        }
    }

    /// Short, stable message for display.
    pub const fn user_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "Enter an address to query and connect a wallet first.",
            ErrorKind::InvalidAddress => "Invalid address format.",
            ErrorKind::ConfigurationError => "Contract not configured.",
            ErrorKind::UserRejected => "Request rejected in wallet.",
            ErrorKind::AuthorizationError => "Payment failed.",
            ErrorKind::InsufficientBalance => "Insufficient balance for the query fee.",
            ErrorKind::RpcUnavailable => "Scoring network unavailable.",
            ErrorKind::RemoteRejected => "Score request rejected by the contract.",
            ErrorKind::DecodeFailure => "Unreadable response from the scoring contract.",
            ErrorKind::Timeout => "Scoring timed out.",
            ErrorKind::NotFound => "No cached score available.",
        }
    }

    /// Whether a failure of this kind during submission or polling degrades to the
    /// synthesized score instead of ending the query.
    pub const fn recovers_with_fallback(self) -> bool {
        matches!(
            self,
            ErrorKind::RpcUnavailable | ErrorKind::DecodeFailure | ErrorKind::Timeout
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
