use anyhow::{anyhow, Context, Result};
use chainscore_core::{Address, AuthorizationKind};
use chainscore_engine::EngineConfig;
use chainscore_rpc::ledger::http_client::{LedgerMethods, LedgerRpcConfig};
use chainscore_rpc::RpcConfig;
use chainscore_wallet::ChainConfig;
use serde::{Deserialize, Deserializer};
use std::env;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "ChainConfig::studio")]
    pub network: ChainConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub rpc_url: String,
    /// Empty means not deployed yet.
    #[serde(default)]
    pub contract_address: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_max")]
    pub retry_max: u32,
    #[serde(flatten)]
    pub methods: LedgerMethods,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Falls back to `network.rpc_url` when empty.
    #[serde(default)]
    pub rpc_url: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Smallest currency unit. Accepts an integer or a decimal string for amounts past i64.
    #[serde(deserialize_with = "de_amount")]
    pub fee: u128,
    pub check_balance: bool,
    pub authorization: AuthorizationKind,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            fee: 0,
            check_balance: false,
            authorization: AuthorizationKind::Transaction,
            poll_interval_ms: 2_000,
            max_poll_attempts: 30,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Int(u64),
    Text(String),
}

fn de_amount<'de, D>(d: D) -> std::result::Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    match Amount::deserialize(d)? {
        Amount::Int(v) => Ok(u128::from(v)),
        Amount::Text(s) => s.trim().parse::<u128>().map_err(serde::de::Error::custom),
    }
}

fn default_timeout_ms() -> u64 {
    RpcConfig::DEFAULT_TIMEOUT_MS
}

fn default_retry_max() -> u32 {
    RpcConfig::DEFAULT_RETRY_MAX
}

impl AppConfig {
    pub fn from_toml(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading config file: {}", path.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("failed parsing config toml")?;

        // Env overrides (explicit) first.
        override_from_env(&mut cfg.ledger.rpc_url, "CHAINSCORE_RPC_URL");
        override_from_env(&mut cfg.wallet.rpc_url, "CHAINSCORE_WALLET_RPC_URL");
        override_from_env(&mut cfg.ledger.contract_address, "CHAINSCORE_CONTRACT");

        // Resolve env:VAR references.
        cfg.network.rpc_url = resolve_env_ref(&cfg.network.rpc_url)?;
        cfg.ledger.rpc_url = resolve_env_ref(&cfg.ledger.rpc_url)?;
        cfg.ledger.contract_address = resolve_env_ref(&cfg.ledger.contract_address)?;
        cfg.wallet.rpc_url = resolve_env_ref(&cfg.wallet.rpc_url)?;

        if cfg.wallet.rpc_url.trim().is_empty() {
            cfg.wallet.rpc_url = cfg.network.rpc_url.clone();
        }

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.ledger.rpc_url.trim().is_empty() {
            return Err(anyhow!("ledger.rpc_url must not be empty"));
        }
        if self.query.poll_interval_ms == 0 {
            return Err(anyhow!("query.poll_interval_ms must be > 0"));
        }
        if self.query.max_poll_attempts == 0 {
            return Err(anyhow!("query.max_poll_attempts must be > 0"));
        }
        self.contract()?;
        Ok(())
    }

    /// Scoring contract, `None` while `ledger.contract_address` is empty.
    pub fn contract(&self) -> Result<Option<Address>> {
        let raw = self.ledger.contract_address.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        Address::parse(raw)
            .map(Some)
            .with_context(|| format!("ledger.contract_address is not an address: {raw}"))
    }

    pub fn ledger_rpc_config(&self) -> Result<LedgerRpcConfig> {
        Ok(LedgerRpcConfig {
            rpc: RpcConfig {
                url: self.ledger.rpc_url.clone(),
                timeout_ms: self.ledger.timeout_ms,
                retry_max: self.ledger.retry_max,
            },
            contract: self.contract()?,
            methods: self.ledger.methods.clone(),
        })
    }

    /// Wallet prompts wait on a human, so no retries.
    pub fn wallet_rpc_config(&self) -> RpcConfig {
        RpcConfig {
            url: self.wallet.rpc_url.clone(),
            timeout_ms: self.wallet.timeout_ms.unwrap_or(120_000),
            retry_max: 1,
        }
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        Ok(EngineConfig {
            contract: self.contract()?,
            authorization: self.query.authorization,
            fee: self.query.fee,
            check_balance: self.query.check_balance,
            poll_interval: Duration::from_millis(self.query.poll_interval_ms),
            max_poll_attempts: self.query.max_poll_attempts,
        })
    }
}

fn override_from_env(field: &mut String, var: &str) {
    if let Ok(v) = env::var(var) {
        if !v.trim().is_empty() {
            *field = v;
        }
    }
}

pub fn resolve_env_ref(value: &str) -> Result<String> {
    const PREFIX: &str = "env:";
    if let Some(var) = value.strip_prefix(PREFIX) {
        let var = var.trim();
        if var.is_empty() {
            return Err(anyhow!("invalid env ref: {value}"));
        }
        return env::var(var).with_context(|| format!("missing env var {var} for {value}"));
    }
    Ok(value.to_string())
}
