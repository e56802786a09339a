use anyhow::{anyhow, Context, Result};
use chainscore_cli::config::AppConfig;
use chainscore_core::{synthesize, Address};
use chainscore_engine::{Provenance, QueryError, ResolvedScore, ScoreAcquisitionEngine};
use chainscore_rpc::ledger::http_client::HttpLedgerClient;
use chainscore_wallet::units::format_units;
use chainscore_wallet::{connect, ProviderAuthorizer, RpcWalletProvider};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "configs/studio.toml";

#[derive(Parser, Debug)]
#[command(name = "chainscore", version, about = "Wallet reputation scores from the ChainScore contract")]
struct Args {
    #[command(subcommand)]
    command: Cli,
}

#[derive(Subcommand, Debug)]
enum Cli {
    /// Authorize and run a score query; falls back to the synthesized score when the
    /// contract cannot confirm in time.
    Query {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        #[arg(long)]
        target: String,
        /// Signing account. Defaults to the wallet's first account.
        #[arg(long)]
        signer: Option<String>,
    },
    /// Free read of the contract's cached score.
    Cached {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        #[arg(long)]
        target: String,
    },
    /// Offline deterministic placeholder score.
    Synth {
        #[arg(long)]
        target: String,
    },
    /// Contract query fee and usage counters.
    Stats {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Cli::Query {
            config,
            target,
            signer,
        } => run_query(config, target, signer).await,
        Cli::Cached { config, target } => run_cached(config, target).await,
        Cli::Synth { target } => run_synth(&target),
        Cli::Stats { config } => run_stats(config).await,
    }
}

async fn run_query(config_path: PathBuf, target: String, signer: Option<String>) -> Result<()> {
    let cfg = AppConfig::from_toml(&config_path)?;
    info!(
        ledger_rpc_url = %cfg.ledger.rpc_url,
        wallet_rpc_url = %cfg.wallet.rpc_url,
        contract = %cfg.ledger.contract_address,
        "starting score query"
    );

    let ledger = HttpLedgerClient::new(cfg.ledger_rpc_config()?)?;
    let wallet = RpcWalletProvider::new(cfg.wallet_rpc_config())?;

    let signer = match signer {
        Some(s) => s,
        None => {
            let conn = connect(&wallet, &cfg.network)
                .await
                .map_err(|e| anyhow!("{} ({e})", e.kind().user_message()))?;
            if !conn.on_expected_chain {
                warn!(chain_id = conn.chain_id, expected = cfg.network.chain_id, "wallet is on another chain");
            }
            info!(
                address = %conn.address,
                balance = %format_units(conn.balance, u32::from(cfg.network.currency_decimals), 4),
                symbol = %cfg.network.currency_symbol,
                "wallet connected"
            );
            conn.address.to_canonical()
        }
    };

    let engine = ScoreAcquisitionEngine::new(
        ledger,
        ProviderAuthorizer::new(wallet),
        cfg.engine_config()?,
    );

    let outcome = tokio::select! {
        out = engine.query_score(&target, Some(&signer)) => out,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted; abandoning query");
            engine.reset();
            Err(QueryError::Cancelled)
        }
    };

    let resolved = outcome.map_err(failure)?;
    if resolved.provenance == Provenance::Fallback {
        let issue = engine.session().remote_issue;
        warn!(issue = ?issue, "showing synthesized score");
    }
    print_json(&resolved)
}

async fn run_cached(config_path: PathBuf, target: String) -> Result<()> {
    let cfg = AppConfig::from_toml(&config_path)?;
    let ledger = HttpLedgerClient::new(cfg.ledger_rpc_config()?)?;
    let wallet = RpcWalletProvider::new(cfg.wallet_rpc_config())?;
    let engine = ScoreAcquisitionEngine::new(
        ledger,
        ProviderAuthorizer::new(wallet),
        cfg.engine_config()?,
    );

    let record = engine.get_cached_score(&target).await.map_err(failure)?;
    print_json(&record)
}

fn run_synth(target: &str) -> Result<()> {
    let address = Address::parse(target.trim())
        .map_err(|e| anyhow!("{} ({e})", QueryError::from(e.clone()).user_message()))?;
    print_json(&ResolvedScore {
        provenance: Provenance::Fallback,
        record: synthesize(&address),
    })
}

async fn run_stats(config_path: PathBuf) -> Result<()> {
    let cfg = AppConfig::from_toml(&config_path)?;
    let ledger = HttpLedgerClient::new(cfg.ledger_rpc_config()?)?;

    let fee = ledger.query_fee().await.context("query fee read failed")?;
    let stats = ledger.stats().await.context("stats read failed")?;
    let decimals = u32::from(cfg.network.currency_decimals);
    print_json(&json!({
        "query_fee": fee.to_string(),
        "query_fee_display": format!("{} {}", format_units(fee, decimals, 4), cfg.network.currency_symbol),
        "total_queries": stats.total_queries,
        "unique_addresses": stats.unique_addresses,
        "fee_collected": stats.fee_collected.to_string(),
        "fee_collected_display": format!(
            "{} {}",
            format_units(stats.fee_collected, decimals, 4),
            cfg.network.currency_symbol
        ),
    }))
}

fn failure(err: QueryError) -> anyhow::Error {
    anyhow!("{} ({err})", err.user_message())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
