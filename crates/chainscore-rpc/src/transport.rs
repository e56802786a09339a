//! JSON-RPC 2.0 transport.
//!
//! Requests are `{jsonrpc, id, method, params}`; responses carry `result` or `error`.
//! Only transient failures are retried: timeouts, connect errors and HTTP 5xx. A JSON-RPC
//! error object is an answer, not a transport failure, and is returned immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub retry_max: u32,
}

impl RpcConfig {
    pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
    pub const DEFAULT_RETRY_MAX: u32 = 3;

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: Self::DEFAULT_TIMEOUT_MS,
            retry_max: Self::DEFAULT_RETRY_MAX,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("config error: {0}")]
    Config(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {status} body={body}")]
    HttpStatus { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("rpc error {code}: {message}")]
    Remote {
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

impl RpcError {
    /// Standard JSON-RPC protocol errors (parse, invalid request, unknown method,
    /// invalid params, internal). These mean the endpoint could not serve the call at all.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, RpcError::Remote { code, .. } if (-32700..=-32600).contains(code))
    }

    /// Implementation-defined server errors (-32099..=-32000): busy, overloaded, upstream
    /// failures. The request was never judged, only not served.
    pub fn is_server_error(&self) -> bool {
        matches!(self, RpcError::Remote { code, .. } if (-32099..=-32000).contains(code))
    }
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

pub struct JsonRpcTransport {
    cfg: RpcConfig,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn new(cfg: RpcConfig) -> Result<Self, RpcError> {
        if cfg.url.trim().is_empty() {
            return Err(RpcError::Config("rpc url is empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| RpcError::Config(format!("failed to build http client: {e}")))?;
        Ok(Self {
            cfg,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.cfg.url
    }

    /// Performs one JSON-RPC call. A missing or `null` result is returned as `Value::Null`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params: &params,
        };

        let attempts = self.cfg.retry_max.max(1);
        for attempt in 1..=attempts {
            debug!(method, id, attempt, "sending rpc request");
            let resp = match self.client.post(&self.cfg.url).json(&request).send().await {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(method, attempt, error = %err, "rpc request error");
                    if attempt == attempts || !is_retryable(&err) {
                        return Err(map_reqwest_error(err));
                    }
                    backoff(method, attempt).await;
                    continue;
                }
            };

            match Self::map_response(method, resp).await {
                Ok(value) => return Ok(value),
                Err(RpcError::HttpStatus { status, body }) if status >= 500 && attempt < attempts => {
                    warn!(method, attempt, status, body = %body, "server error, retrying");
                    backoff(method, attempt).await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(RpcError::Config(
            "retry loop exhausted unexpectedly".to_string(),
        ))
    }

    async fn map_response(method: &str, resp: reqwest::Response) -> Result<Value, RpcError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| RpcError::Network(format!("{e}")))?;
        if !status.is_success() {
            warn!(method, status = status.as_u16(), body = %body, "non-success status");
            return Err(RpcError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: JsonRpcResponse =
            serde_json::from_str(&body).map_err(|e| RpcError::Decode(format!("{e}")))?;
        if let Some(err) = parsed.error {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }
        debug!(method, "rpc response decoded");
        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

fn map_reqwest_error(err: reqwest::Error) -> RpcError {
    if err.is_body() || err.is_decode() {
        return RpcError::Decode(err.to_string());
    }
    RpcError::Network(err.to_string())
}

async fn backoff(method: &str, attempt: u32) {
    let delay_ms = backoff_delay_ms(attempt);
    warn!(method, attempt, delay_ms, "retrying after backoff");
    sleep(Duration::from_millis(delay_ms)).await;
}

fn backoff_delay_ms(attempt: u32) -> u64 {
    // Exponential, capped at 2s, no jitter.
    let exp = attempt.saturating_sub(1);
    let base = 100u64.saturating_mul(2u64.saturating_pow(exp));
    base.min(2_000)
}
