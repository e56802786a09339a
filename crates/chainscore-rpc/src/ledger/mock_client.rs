//! Scripted in-memory ledger for tests and offline runs.
//!
//! Defaults: submissions succeed with a handle derived from the target, every poll reports
//! `Finalized`, and no last score is available. Each behavior can be overridden.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chainscore_core::{Address, AuthorizationArtifact, ScoreRecord};

use super::{LedgerClient, LedgerError, ReceiptStatus, RequestHandle};

#[derive(Debug)]
pub struct MockLedgerClient {
    submit: Mutex<Option<Result<RequestHandle, LedgerError>>>,
    receipts: Mutex<VecDeque<Result<ReceiptStatus, LedgerError>>>,
    receipt_default: Mutex<Result<ReceiptStatus, LedgerError>>,
    poll_delay: Mutex<Duration>,
    last_score: Mutex<Result<Option<ScoreRecord>, LedgerError>>,
    cached: Mutex<HashMap<Address, ScoreRecord>>,
    last_authorization: Mutex<Option<AuthorizationArtifact>>,
    submit_calls: AtomicU32,
    poll_calls: AtomicU32,
    last_score_reads: AtomicU32,
    cached_reads: AtomicU32,
}

impl Default for MockLedgerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedgerClient {
    pub fn new() -> Self {
        Self {
            submit: Mutex::new(None),
            receipts: Mutex::new(VecDeque::new()),
            receipt_default: Mutex::new(Ok(ReceiptStatus::Finalized)),
            poll_delay: Mutex::new(Duration::ZERO),
            last_score: Mutex::new(Ok(None)),
            cached: Mutex::new(HashMap::new()),
            last_authorization: Mutex::new(None),
            submit_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
            last_score_reads: AtomicU32::new(0),
            cached_reads: AtomicU32::new(0),
        }
    }

    /// Fixed outcome for every submission.
    pub fn with_submit(self, outcome: Result<RequestHandle, LedgerError>) -> Self {
        *self.submit.lock().expect("mutex poisoned") = Some(outcome);
        self
    }

    /// Poll outcomes served in order; afterwards `receipt_default` repeats.
    pub fn with_receipts(self, outcomes: Vec<Result<ReceiptStatus, LedgerError>>) -> Self {
        *self.receipts.lock().expect("mutex poisoned") = outcomes.into();
        self
    }

    pub fn with_receipt_default(self, outcome: Result<ReceiptStatus, LedgerError>) -> Self {
        *self.receipt_default.lock().expect("mutex poisoned") = outcome;
        self
    }

    /// Simulated latency of each poll.
    pub fn with_poll_delay(self, delay: Duration) -> Self {
        *self.poll_delay.lock().expect("mutex poisoned") = delay;
        self
    }

    pub fn with_last_score(self, outcome: Result<Option<ScoreRecord>, LedgerError>) -> Self {
        *self.last_score.lock().expect("mutex poisoned") = outcome;
        self
    }

    pub fn with_cached(self, record: ScoreRecord) -> Self {
        self.cached
            .lock()
            .expect("mutex poisoned")
            .insert(record.address, record);
        self
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub fn last_score_reads(&self) -> u32 {
        self.last_score_reads.load(Ordering::SeqCst)
    }

    pub fn cached_reads(&self) -> u32 {
        self.cached_reads.load(Ordering::SeqCst)
    }

    pub fn last_authorization(&self) -> Option<AuthorizationArtifact> {
        self.last_authorization.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    async fn submit_computation(
        &self,
        target: &Address,
        _signer: &Address,
        authorization: &AuthorizationArtifact,
    ) -> Result<RequestHandle, LedgerError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_authorization.lock().expect("mutex poisoned") = Some(authorization.clone());
        match self.submit.lock().expect("mutex poisoned").clone() {
            Some(outcome) => outcome,
            None => Ok(RequestHandle(format!("mock:{target}"))),
        }
    }

    async fn poll_receipt(&self, _handle: &RequestHandle) -> Result<ReceiptStatus, LedgerError> {
        let delay = *self.poll_delay.lock().expect("mutex poisoned");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.receipts.lock().expect("mutex poisoned").pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => self.receipt_default.lock().expect("mutex poisoned").clone(),
        }
    }

    async fn fetch_last_score(&self) -> Result<Option<ScoreRecord>, LedgerError> {
        self.last_score_reads.fetch_add(1, Ordering::SeqCst);
        self.last_score.lock().expect("mutex poisoned").clone()
    }

    async fn fetch_cached_score(
        &self,
        address: &Address,
    ) -> Result<Option<ScoreRecord>, LedgerError> {
        self.cached_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.cached.lock().expect("mutex poisoned").get(address).cloned())
    }
}
