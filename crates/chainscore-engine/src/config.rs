use std::time::Duration;

use chainscore_core::{Address, AuthorizationKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Scoring contract; queries fail with `ConfigurationError` while unset.
    pub contract: Option<Address>,
    pub authorization: AuthorizationKind,
    /// Query fee in the smallest currency unit.
    pub fee: u128,
    /// Compare the signer's balance against `fee` before prompting.
    pub check_balance: bool,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl EngineConfig {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
    pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

    pub fn new(contract: Address) -> Self {
        Self {
            contract: Some(contract),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contract: None,
            authorization: AuthorizationKind::Transaction,
            fee: 0,
            check_balance: false,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_poll_attempts: Self::DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}
