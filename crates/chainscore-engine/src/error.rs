use chainscore_core::{AddressError, ErrorKind};
use chainscore_rpc::LedgerError;
use chainscore_wallet::WalletError;

/// Why a query did not produce a score.
///
/// Transport, decode and timeout problems during submission or polling never show up
/// here: they resolve through the synthesized score.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("scoring contract address is not configured")]
    NotConfigured,
    #[error("wallet authorization failed: {0}")]
    Authorization(#[from] WalletError),
    #[error("insufficient balance: have {balance}, fee is {fee}")]
    InsufficientBalance { balance: u128, fee: u128 },
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("no cached score")]
    NotFound,
    /// Abandoned by `reset()` or superseded by a newer query.
    #[error("query cancelled")]
    Cancelled,
}

impl QueryError {
    /// `None` for [`QueryError::Cancelled`], which is not a failure of the query itself.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            QueryError::InvalidInput(_) => Some(ErrorKind::InvalidInput),
            QueryError::InvalidAddress(_) => Some(ErrorKind::InvalidAddress),
            QueryError::NotConfigured => Some(ErrorKind::ConfigurationError),
            QueryError::Authorization(e) => Some(e.kind()),
            QueryError::InsufficientBalance { .. } => Some(ErrorKind::InsufficientBalance),
            QueryError::Ledger(e) => Some(e.kind()),
            QueryError::NotFound => Some(ErrorKind::NotFound),
            QueryError::Cancelled => None,
        }
    }

    /// Stable text for display.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            Some(kind) => kind.user_message(),
            None => "Query cancelled.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_errors_keep_their_kind() {
        assert_eq!(
            QueryError::from(WalletError::UserRejected).kind(),
            Some(ErrorKind::UserRejected)
        );
        assert_eq!(
            QueryError::from(WalletError::NoAccounts).kind(),
            Some(ErrorKind::AuthorizationError)
        );
    }

    #[test]
    fn cancellation_has_no_kind() {
        assert_eq!(QueryError::Cancelled.kind(), None);
        assert_eq!(QueryError::Cancelled.user_message(), "Query cancelled.");
    }
}
