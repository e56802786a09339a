use chainscore_core::ErrorKind;
use chainscore_rpc::RpcError;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3326: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("user rejected the request")]
    UserRejected,
    #[error("chain {0} is not known to the wallet")]
    UnknownChain(u64),
    #[error("wallet exposes no accounts")]
    NoAccounts,
    #[error("wallet returned no transaction hash")]
    EmptyHandle,
    #[error("wallet rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("wallet unavailable: {0}")]
    Unavailable(String),
    #[error("wallet decode error: {0}")]
    Decode(String),
}

impl WalletError {
    /// Declining is the only wallet failure distinct from a generic authorization error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::UserRejected => ErrorKind::UserRejected,
            _ => ErrorKind::AuthorizationError,
        }
    }
}

impl From<RpcError> for WalletError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Remote { code, .. } if code == USER_REJECTED_CODE => WalletError::UserRejected,
            RpcError::Remote { code, message, .. } => WalletError::Rpc { code, message },
            RpcError::Decode(msg) => WalletError::Decode(msg),
            RpcError::Config(_) | RpcError::Network(_) | RpcError::HttpStatus { .. } => {
                WalletError::Unavailable(err.to_string())
            }
        }
    }
}
