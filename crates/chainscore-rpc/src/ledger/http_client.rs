//! JSON-RPC adapter for the scoring contract.
//!
//! Writes go through `call_method` as `[contract, function, args, null, signer, authorization]`,
//! reads as `[contract, function, args, true, null]`. Receipt lookups use `receipt_method`
//! with `[handle]`. All method and function names come from [`LedgerMethods`].

use async_trait::async_trait;
use chainscore_core::{Address, AuthorizationArtifact, ScoreRecord};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{LedgerClient, LedgerError, LedgerStats, ReceiptStatus, RequestHandle};
use crate::decode;
use crate::transport::{JsonRpcTransport, RpcConfig};

/// RPC method and contract function names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerMethods {
    pub call_method: String,
    pub receipt_method: String,
    pub submit_function: String,
    pub last_score_function: String,
    pub cached_score_function: String,
    pub query_fee_function: String,
    pub stats_function: String,
}

impl Default for LedgerMethods {
    fn default() -> Self {
        Self {
            call_method: "call_contract_function".to_string(),
            receipt_method: "eth_getTransactionReceipt".to_string(),
            submit_function: "calculate_score".to_string(),
            last_score_function: "get_last_score".to_string(),
            cached_score_function: "get_cached_score".to_string(),
            query_fee_function: "get_query_fee".to_string(),
            stats_function: "get_stats".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerRpcConfig {
    pub rpc: RpcConfig,
    /// `None` leaves the client usable for nothing but reporting the misconfiguration.
    pub contract: Option<Address>,
    pub methods: LedgerMethods,
}

pub struct HttpLedgerClient {
    contract: Option<Address>,
    methods: LedgerMethods,
    transport: JsonRpcTransport,
}

impl HttpLedgerClient {
    pub fn new(cfg: LedgerRpcConfig) -> Result<Self, LedgerError> {
        let transport = JsonRpcTransport::new(cfg.rpc)?;
        Ok(Self {
            contract: cfg.contract,
            methods: cfg.methods,
            transport,
        })
    }

    pub fn contract(&self) -> Option<&Address> {
        self.contract.as_ref()
    }

    fn require_contract(&self) -> Result<Address, LedgerError> {
        self.contract
            .ok_or_else(|| LedgerError::Config("contract address is not configured".to_string()))
    }

    async fn read(&self, function: &str, args: Value) -> Result<Value, LedgerError> {
        let contract = self.require_contract()?;
        let params = json!([contract, function, args, true, Value::Null]);
        Ok(self.transport.call(&self.methods.call_method, params).await?)
    }

    /// Reads a score view; error markers and empty payloads are both "no record".
    async fn read_score(
        &self,
        function: &str,
        args: Value,
    ) -> Result<Option<ScoreRecord>, LedgerError> {
        let Some(map) = decode::payload_object(self.read(function, args).await?)? else {
            return Ok(None);
        };
        if let Some(marker) = decode::error_marker(&map) {
            debug!(function, marker = %marker, "contract reported no record");
            return Ok(None);
        }
        decode::score_record(&map).map(Some)
    }

    /// Current per-query fee in the smallest currency unit.
    pub async fn query_fee(&self) -> Result<u128, LedgerError> {
        let value = self.read(&self.methods.query_fee_function, json!([])).await?;
        decode::quantity(&value)
    }

    pub async fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let map = decode::payload_object(self.read(&self.methods.stats_function, json!([])).await?)?
            .ok_or_else(|| LedgerError::Decode("stats view returned nothing".to_string()))?;
        let field = |key: &str| map.get(key).map(decode::quantity).transpose();
        Ok(LedgerStats {
            total_queries: u64::try_from(field("total_queries")?.unwrap_or(0))
                .map_err(|e| LedgerError::Decode(e.to_string()))?,
            unique_addresses: u64::try_from(field("unique_addresses")?.unwrap_or(0))
                .map_err(|e| LedgerError::Decode(e.to_string()))?,
            fee_collected: field("fee_collected")?.unwrap_or(0),
            query_fee: field("query_fee")?.unwrap_or(0),
        })
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn submit_computation(
        &self,
        target: &Address,
        signer: &Address,
        authorization: &AuthorizationArtifact,
    ) -> Result<RequestHandle, LedgerError> {
        let contract = self.require_contract()?;
        let params = json!([
            contract,
            self.methods.submit_function,
            [target],
            Value::Null,
            signer,
            authorization,
        ]);
        let value = self.transport.call(&self.methods.call_method, params).await?;
        let handle = decode::request_handle(&value)?;
        info!(target = %target, handle = %handle.0, "score computation submitted");
        Ok(handle)
    }

    async fn poll_receipt(&self, handle: &RequestHandle) -> Result<ReceiptStatus, LedgerError> {
        let value = self
            .transport
            .call(&self.methods.receipt_method, json!([handle.0]))
            .await?;
        let status = decode::receipt_status(&value)?;
        debug!(handle = %handle.0, status = ?status, "receipt polled");
        Ok(status)
    }

    async fn fetch_last_score(&self) -> Result<Option<ScoreRecord>, LedgerError> {
        self.read_score(&self.methods.last_score_function, json!([]))
            .await
    }

    async fn fetch_cached_score(
        &self,
        address: &Address,
    ) -> Result<Option<ScoreRecord>, LedgerError> {
        self.read_score(&self.methods.cached_score_function, json!([address]))
            .await
    }
}
