use std::sync::Arc;

use async_trait::async_trait;
use chainscore_core::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::WalletError;

/// Network the wallet must be on before a query can be authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    #[serde(default)]
    pub explorer: Option<String>,
    #[serde(default = "default_currency_name")]
    pub currency_name: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_currency_decimals")]
    pub currency_decimals: u8,
}

fn default_currency_name() -> String {
    "GEN".to_string()
}

fn default_currency_symbol() -> String {
    "GEN".to_string()
}

fn default_currency_decimals() -> u8 {
    18
}

impl ChainConfig {
    /// Local GenLayer Studio network.
    pub fn studio() -> Self {
        Self {
            name: "GenLayer Studio".to_string(),
            chain_id: 61999,
            rpc_url: "https://studio.genlayer.com/api".to_string(),
            explorer: Some("https://explorer-studio.genlayer.com".to_string()),
            currency_name: default_currency_name(),
            currency_symbol: default_currency_symbol(),
            currency_decimals: default_currency_decimals(),
        }
    }

    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// `wallet_addEthereumChain` parameter object.
    pub fn add_chain_params(&self) -> Value {
        let explorers: Vec<&str> = self.explorer.as_deref().into_iter().collect();
        serde_json::json!({
            "chainId": self.chain_id_hex(),
            "chainName": self.name,
            "nativeCurrency": {
                "name": self.currency_name,
                "symbol": self.currency_symbol,
                "decimals": self.currency_decimals,
            },
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": explorers,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    /// Value in the smallest currency unit.
    pub value: u128,
    pub data: String,
}

impl TransactionRequest {
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "from": self.from.to_canonical(),
            "to": self.to.to_canonical(),
            "value": format!("0x{:x}", self.value),
            "data": self.data,
        })
    }
}

/// Request surface of an injected wallet.
///
/// Every prompting call (`request_accounts`, `switch_chain`, `add_chain`,
/// `send_transaction`, `sign`) may fail with [`WalletError::UserRejected`].
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Asks the user to expose accounts. Prompts.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Accounts already exposed. Never prompts.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    async fn chain_id(&self) -> Result<u64, WalletError>;

    /// Fails with [`WalletError::UnknownChain`] when the wallet has never seen `chain_id`.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), WalletError>;

    /// Returns the transaction hash.
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, WalletError>;

    /// Personal-message signature by `signer` over `message`.
    async fn sign(&self, signer: &Address, message: &str) -> Result<String, WalletError>;

    /// `None` while the transaction is unknown or pending.
    async fn transaction_receipt(&self, hash: &str) -> Result<Option<Value>, WalletError>;

    async fn balance(&self, address: &Address) -> Result<u128, WalletError>;
}

#[async_trait]
impl<T> WalletProvider for Arc<T>
where
    T: WalletProvider + ?Sized,
{
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        (**self).request_accounts().await
    }

    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        (**self).accounts().await
    }

    async fn chain_id(&self) -> Result<u64, WalletError> {
        (**self).chain_id().await
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        (**self).switch_chain(chain_id).await
    }

    async fn add_chain(&self, chain: &ChainConfig) -> Result<(), WalletError> {
        (**self).add_chain(chain).await
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<String, WalletError> {
        (**self).send_transaction(tx).await
    }

    async fn sign(&self, signer: &Address, message: &str) -> Result<String, WalletError> {
        (**self).sign(signer, message).await
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<Option<Value>, WalletError> {
        (**self).transaction_receipt(hash).await
    }

    async fn balance(&self, address: &Address) -> Result<u128, WalletError> {
        (**self).balance(address).await
    }
}

/// Switches the wallet to `chain`, registering it first if the wallet has never seen it.
/// Adding a chain also selects it, so no second switch is issued.
pub async fn ensure_chain<P>(provider: &P, chain: &ChainConfig) -> Result<(), WalletError>
where
    P: WalletProvider + ?Sized,
{
    match provider.switch_chain(chain.chain_id).await {
        Ok(()) => Ok(()),
        Err(WalletError::UnknownChain(_)) => {
            info!(chain_id = chain.chain_id, name = %chain.name, "adding chain to wallet");
            provider.add_chain(chain).await
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub address: Address,
    pub chain_id: u64,
    pub on_expected_chain: bool,
    /// Zero when the balance lookup failed.
    pub balance: u128,
}

/// Requests accounts, moves the wallet onto `chain` and reads the first account's balance.
pub async fn connect<P>(provider: &P, chain: &ChainConfig) -> Result<WalletConnection, WalletError>
where
    P: WalletProvider + ?Sized,
{
    let accounts = provider.request_accounts().await?;
    let address = *accounts.first().ok_or(WalletError::NoAccounts)?;
    ensure_chain(provider, chain).await?;
    let chain_id = provider.chain_id().await?;
    let balance = match provider.balance(&address).await {
        Ok(b) => b,
        Err(e) => {
            warn!(%address, error = %e, "balance lookup failed");
            0
        }
    };
    info!(%address, chain_id, "wallet connected");
    Ok(WalletConnection {
        address,
        chain_id,
        on_expected_chain: chain_id == chain.chain_id,
        balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockWallet;

    fn account() -> Address {
        Address::from_bytes([0x11; 20])
    }

    #[tokio::test]
    async fn ensure_chain_adds_unknown_chain() {
        let wallet = MockWallet::new().with_chain(1).with_known_chains(vec![1]);
        ensure_chain(&wallet, &ChainConfig::studio()).await.unwrap();
        assert_eq!(wallet.chain_id().await.unwrap(), 61999);
        assert_eq!(wallet.added_chains(), vec![61999]);
    }

    #[tokio::test]
    async fn ensure_chain_switches_known_chain_without_adding() {
        let wallet = MockWallet::new().with_chain(1).with_known_chains(vec![1, 61999]);
        ensure_chain(&wallet, &ChainConfig::studio()).await.unwrap();
        assert_eq!(wallet.chain_id().await.unwrap(), 61999);
        assert!(wallet.added_chains().is_empty());
    }

    #[tokio::test]
    async fn connect_reports_account_chain_and_balance() {
        let wallet = MockWallet::new()
            .with_accounts(vec![account()])
            .with_balance(5_000_000_000_000_000_000);
        let conn = connect(&wallet, &ChainConfig::studio()).await.unwrap();
        assert_eq!(conn.address, account());
        assert!(conn.on_expected_chain);
        assert_eq!(conn.balance, 5_000_000_000_000_000_000);
    }

    #[tokio::test]
    async fn connect_without_accounts_fails() {
        let wallet = MockWallet::new().with_accounts(vec![]);
        let err = connect(&wallet, &ChainConfig::studio()).await.unwrap_err();
        assert_eq!(err, WalletError::NoAccounts);
    }

    #[test]
    fn add_chain_params_use_hex_chain_id() {
        let params = ChainConfig::studio().add_chain_params();
        assert_eq!(params["chainId"], "0xf22f");
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
        assert_eq!(params["rpcUrls"][0], "https://studio.genlayer.com/api");
    }
}
