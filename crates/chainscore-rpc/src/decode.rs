//! Defensive decoding of contract payloads.
//!
//! Contract reads come back untyped: an object, a JSON document encoded as a string
//! (sometimes inside a fenced block), an `{"error": ...}` object, or nothing at all.
//! Nothing here panics; every malformed shape becomes [`LedgerError::Decode`].

use chainscore_core::{Address, Dimension, Dimensions, Grade, ScoreRecord, SybilRisk};
use serde_json::{Map, Value};
use tracing::warn;

use crate::ledger::{LedgerError, ReceiptStatus, RequestHandle};

/// Normalizes a read result into a JSON object, or `None` when the payload is empty.
pub fn payload_object(value: Value) -> Result<Option<Map<String, Value>>, LedgerError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) => Ok(Some(map)),
        Value::String(s) => {
            let text = strip_fences(&s);
            if text.is_empty() {
                return Ok(None);
            }
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Ok(Some(map)),
                Ok(Value::Null) => Ok(None),
                Ok(other) => Err(LedgerError::Decode(format!(
                    "expected object payload, got {}",
                    type_name(&other)
                ))),
                Err(e) => Err(LedgerError::Decode(format!("payload is not json: {e}"))),
            }
        }
        other => Err(LedgerError::Decode(format!(
            "expected object payload, got {}",
            type_name(&other)
        ))),
    }
}

/// The `error` marker a contract puts in place of a result, if any.
pub fn error_marker(map: &Map<String, Value>) -> Option<String> {
    match map.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

/// Validates and normalizes a score object.
///
/// `address` is mandatory. Dimensions may be nested under `dimensions` or flattened.
/// A missing total is derived from the dimensions, grade and risk always come from the
/// total, and out-of-range numbers are clamped.
pub fn score_record(map: &Map<String, Value>) -> Result<ScoreRecord, LedgerError> {
    let address = match map.get("address") {
        Some(Value::String(s)) => Address::parse(s.trim())
            .map_err(|e| LedgerError::Decode(format!("invalid address in record: {e}")))?,
        Some(_) => return Err(LedgerError::Decode("address is not a string".to_string())),
        None => return Err(LedgerError::Decode("record has no address".to_string())),
    };

    let source = match map.get("dimensions") {
        Some(Value::Object(nested)) => nested,
        _ => map,
    };
    let mut dimensions = Dimensions::default();
    for d in Dimension::ALL {
        if let Some(v) = source.get(d.key()).and_then(score_value) {
            dimensions.set(d, v);
        }
    }

    let total_score = map
        .get("total_score")
        .and_then(score_value)
        .unwrap_or_else(|| dimensions.weighted_total());
    // Grade and risk are buckets of the total; a disagreeing payload loses.
    let grade = Grade::from_score(total_score);
    if let Some(claimed) = map.get("grade").and_then(Value::as_str) {
        if Grade::parse(claimed) != Some(grade) {
            warn!(
                %address,
                total_score,
                claimed,
                derived = grade.as_str(),
                "grade does not match total score"
            );
        }
    }
    let sybil_risk = SybilRisk::from_score(total_score);
    if let Some(claimed) = map.get("sybil_risk").and_then(Value::as_str) {
        if SybilRisk::parse(claimed) != Some(sybil_risk) {
            warn!(
                %address,
                total_score,
                claimed,
                derived = sybil_risk.as_str(),
                "sybil risk does not match total score"
            );
        }
    }
    let summary = map
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| grade.summary().to_string());

    Ok(ScoreRecord {
        address,
        total_score,
        grade,
        dimensions,
        sybil_risk,
        summary,
        highlights: string_list(map.get("highlights")),
        concerns: string_list(map.get("concerns")),
        timestamp: map
            .get("timestamp")
            .and_then(|v| quantity(v).ok())
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0),
        fee_paid: map.get("fee_paid").and_then(|v| quantity(v).ok()).unwrap_or(0),
    })
}

const PAYMENT_REFUSED: &str = "insufficient_payment";

/// Extracts a submission handle: a bare hash string, or an object carrying one.
pub fn request_handle(value: &Value) -> Result<RequestHandle, LedgerError> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.starts_with('{') {
                let parsed: Value = serde_json::from_str(s)
                    .map_err(|e| LedgerError::Decode(format!("handle payload is not json: {e}")))?;
                return request_handle(&parsed);
            }
            if s.is_empty() {
                return Err(LedgerError::Decode("empty submission handle".to_string()));
            }
            Ok(RequestHandle(s.to_string()))
        }
        Value::Object(map) => {
            if let Some(marker) = error_marker(map) {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let detail = format!("{marker} {message}").trim().to_string();
                // Only a payment refusal is the contract declining; other markers report
                // that its own data path failed.
                if marker.to_ascii_lowercase().contains(PAYMENT_REFUSED) {
                    return Err(LedgerError::RemoteRejected(detail));
                }
                return Err(LedgerError::RpcUnavailable(detail));
            }
            ["hash", "tx_hash", "transaction_hash", "txHash"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| RequestHandle(s.to_string()))
                .ok_or_else(|| LedgerError::Decode("submission result has no hash".to_string()))
        }
        Value::Null => Err(LedgerError::Decode("submission returned no result".to_string())),
        other => Err(LedgerError::Decode(format!(
            "unexpected submission result: {}",
            type_name(other)
        ))),
    }
}

/// Maps a receipt/transaction lookup to a status. `null` means not yet known.
pub fn receipt_status(value: &Value) -> Result<ReceiptStatus, LedgerError> {
    let map = match value {
        Value::Null => return Ok(ReceiptStatus::Pending),
        Value::Object(map) => map,
        other => {
            return Err(LedgerError::Decode(format!(
                "unexpected receipt: {}",
                type_name(other)
            )))
        }
    };
    match map.get("status") {
        None | Some(Value::Null) => Ok(ReceiptStatus::Pending),
        Some(Value::String(s)) => Ok(status_word(s)),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(1) => Ok(ReceiptStatus::Finalized),
            Some(0) => Ok(ReceiptStatus::Rejected),
            _ => Err(LedgerError::Decode(format!("unknown numeric status {n}"))),
        },
        Some(other) => Err(LedgerError::Decode(format!(
            "unexpected status: {}",
            type_name(other)
        ))),
    }
}

fn status_word(s: &str) -> ReceiptStatus {
    match s.trim().to_ascii_uppercase().as_str() {
        "0X1" | "1" | "FINALIZED" | "ACCEPTED" | "SUCCESS" => ReceiptStatus::Finalized,
        "0X0" | "0" | "CANCELED" | "CANCELLED" | "UNDETERMINED" | "LEADER_TIMEOUT"
        | "REJECTED" | "FAILED" | "FAILURE" => ReceiptStatus::Rejected,
        _ => ReceiptStatus::Pending,
    }
}

/// Non-negative integer from a JSON number, decimal string, or `0x` hex string.
pub fn quantity(value: &Value) -> Result<u128, LedgerError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| LedgerError::Decode(format!("not a non-negative integer: {n}"))),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some("") => Ok(0),
                Some(hex) => u128::from_str_radix(hex, 16),
                None => s.parse::<u128>(),
            };
            parsed.map_err(|e| LedgerError::Decode(format!("bad quantity {s:?}: {e}")))
        }
        other => Err(LedgerError::Decode(format!(
            "expected quantity, got {}",
            type_name(other)
        ))),
    }
}

/// A 0..=100 score from a number (integer or float) or numeric string, clamped.
fn score_value(v: &Value) -> Option<u8> {
    let n: i64 = match v {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => return n.as_f64().filter(|f| f.is_finite()).map(float_score),
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u8::try_from(n.clamp(0, 100)).ok()
}

/// Nearest whole score for a finite float, clamped to 0..=100.
fn float_score(f: f64) -> u8 {
    let f = f.round();
    (0u8..=100).find(|v| f64::from(*v) >= f).unwrap_or(100)
}

fn string_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Strips a fenced code block (optionally tagged `json`) around a payload.
fn strip_fences(s: &str) -> &str {
    let s = s.trim();
    if !s.contains("```") {
        return s;
    }
    let inner = s.split("```").nth(1).unwrap_or_default();
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
