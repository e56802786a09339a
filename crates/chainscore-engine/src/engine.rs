use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chainscore_core::{synthesize, Address, ErrorKind, ScoreRecord};
use chainscore_rpc::{LedgerClient, LedgerError, ReceiptStatus, RequestHandle};
use chainscore_wallet::{AuthorizationRequest, WalletAuthorizer};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::QueryError;
use crate::session::{Provenance, QuerySession, QueryStatus, ResolvedScore};

/// What the remote path produced once polling stopped.
enum RemoteOutcome {
    Resolved(ScoreRecord),
    /// Unconfirmed; the kind is kept as the session's `remote_issue`.
    Unconfirmed(ErrorKind),
}

/// Orchestrates one score query at a time.
///
/// Every mutation of the session is tagged with the generation that started the query.
/// `query_score` and `reset` advance the generation, so an abandoned query observes the
/// change at its next suspend point and returns [`QueryError::Cancelled`] without touching
/// the session. Share the engine through an `Arc` to reset from another task.
pub struct ScoreAcquisitionEngine<L, W> {
    ledger: L,
    authorizer: W,
    config: EngineConfig,
    session: Mutex<QuerySession>,
    generation: watch::Sender<u64>,
}

impl<L, W> ScoreAcquisitionEngine<L, W>
where
    L: LedgerClient,
    W: WalletAuthorizer,
{
    pub fn new(ledger: L, authorizer: W, config: EngineConfig) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            ledger,
            authorizer,
            config,
            session: Mutex::new(QuerySession::default()),
            generation,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn authorizer(&self) -> &W {
        &self.authorizer
    }

    pub fn status(&self) -> QueryStatus {
        self.lock().status
    }

    /// Snapshot of the active session.
    pub fn session(&self) -> QuerySession {
        self.lock().clone()
    }

    /// Abandons any in-flight query and returns to `Idle`. Safe at any time.
    pub fn reset(&self) {
        let mut session = self.lock();
        self.generation.send_modify(|g| *g = g.wrapping_add(1));
        *session = QuerySession::default();
        debug!(generation = *self.generation.borrow(), "query session reset");
    }

    /// Runs a full query for `target`, authorized by `signer`.
    ///
    /// Supersedes any query still in flight on this engine. Prompts the wallet at most once.
    pub async fn query_score(
        &self,
        target: &str,
        signer: Option<&str>,
    ) -> Result<ResolvedScore, QueryError> {
        let ticket = self.begin();
        match self.run(ticket, target, signer).await {
            Ok(resolved) => Ok(resolved),
            Err(QueryError::Cancelled) => {
                debug!(generation = ticket, "query abandoned");
                Err(QueryError::Cancelled)
            }
            Err(err) => {
                let kind = err.kind().unwrap_or(ErrorKind::InvalidInput);
                self.apply(ticket, |s| {
                    s.status = QueryStatus::Failed(kind);
                    s.error = Some(kind);
                    s.result = None;
                })?;
                warn!(generation = ticket, kind = kind.code(), error = %err, "query failed");
                Err(err)
            }
        }
    }

    /// Free read of the contract's cached record for `target`. Leaves the session alone.
    pub async fn get_cached_score(&self, target: &str) -> Result<ScoreRecord, QueryError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(QueryError::InvalidInput("target address is empty"));
        }
        let address = Address::parse(target)?;
        if self.config.contract.is_none() {
            return Err(QueryError::NotConfigured);
        }
        match self.ledger.fetch_cached_score(&address).await? {
            Some(record) => Ok(record),
            None => Err(QueryError::NotFound),
        }
    }

    async fn run(
        &self,
        ticket: u64,
        target: &str,
        signer: Option<&str>,
    ) -> Result<ResolvedScore, QueryError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(QueryError::InvalidInput("target address is empty"));
        }
        let signer = match signer.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => return Err(QueryError::InvalidInput("no wallet connected")),
        };
        let target = Address::parse(target)?;
        let signer = Address::parse(signer)
            .map_err(|_| QueryError::InvalidInput("signer is not a valid address"))?;
        let contract = self.config.contract.ok_or(QueryError::NotConfigured)?;

        self.apply(ticket, |s| {
            s.status = QueryStatus::Authorizing;
            s.target = Some(target);
            s.signer = Some(signer);
        })?;
        info!(%target, %signer, generation = ticket, "score query started");

        if self.config.check_balance {
            let balance = self.guard(ticket, self.authorizer.balance(&signer)).await??;
            if balance < self.config.fee {
                return Err(QueryError::InsufficientBalance {
                    balance,
                    fee: self.config.fee,
                });
            }
        }

        let request = AuthorizationRequest {
            kind: self.config.authorization,
            signer,
            contract,
            target,
            fee: self.config.fee,
        };
        let artifact = self.guard(ticket, self.authorizer.authorize(&request)).await??;
        self.apply(ticket, |s| {
            s.authorization = Some(artifact.clone());
            s.status = QueryStatus::Submitting;
        })?;
        debug!(generation = ticket, kind = ?artifact.kind(), "authorization obtained");

        let submitted = self
            .guard(
                ticket,
                self.ledger.submit_computation(&target, &signer, &artifact),
            )
            .await?;
        let handle = match submitted {
            Ok(handle) => handle,
            Err(e) if e.kind().recovers_with_fallback() => {
                warn!(%target, operation = "submit", error = %e, "submission failed");
                return self.fall_back(ticket, &target, e.kind());
            }
            Err(e) => return Err(e.into()),
        };
        self.apply(ticket, |s| {
            s.request_handle = Some(handle.clone());
            s.status = QueryStatus::Polling;
        })?;
        debug!(generation = ticket, %handle, "submitted, polling receipt");

        match self.poll(ticket, &handle, &target).await? {
            RemoteOutcome::Resolved(record) => {
                self.finish(ticket, record, Provenance::Remote, None)
            }
            RemoteOutcome::Unconfirmed(issue) => self.fall_back(ticket, &target, issue),
        }
    }

    async fn poll(
        &self,
        ticket: u64,
        handle: &RequestHandle,
        target: &Address,
    ) -> Result<RemoteOutcome, QueryError> {
        for attempt in 1..=self.config.max_poll_attempts {
            self.guard(ticket, tokio::time::sleep(self.config.poll_interval))
                .await?;
            let receipt = self.guard(ticket, self.ledger.poll_receipt(handle)).await?;
            self.apply(ticket, |s| s.poll_attempts = attempt)?;

            match receipt {
                Ok(ReceiptStatus::Pending) => {
                    debug!(%handle, attempt, "receipt pending");
                }
                Ok(ReceiptStatus::Finalized) => {
                    debug!(%handle, attempt, "receipt finalized");
                    return self.read_back(ticket, target).await;
                }
                Ok(ReceiptStatus::Rejected) => {
                    return Err(QueryError::Ledger(LedgerError::RemoteRejected(format!(
                        "request {handle} was rejected"
                    ))));
                }
                Err(e) => {
                    warn!(%handle, attempt, operation = "poll", error = %e, "receipt poll failed");
                    return Ok(RemoteOutcome::Unconfirmed(e.kind()));
                }
            }
        }
        warn!(
            %handle,
            attempts = self.config.max_poll_attempts,
            "polling budget exhausted"
        );
        Ok(RemoteOutcome::Unconfirmed(ErrorKind::Timeout))
    }

    async fn read_back(&self, ticket: u64, target: &Address) -> Result<RemoteOutcome, QueryError> {
        let outcome = match self.guard(ticket, self.ledger.fetch_last_score()).await? {
            Ok(Some(record)) if record.address == *target => RemoteOutcome::Resolved(record),
            Ok(Some(record)) => {
                warn!(%target, found = %record.address, "last score belongs to another address");
                RemoteOutcome::Unconfirmed(ErrorKind::DecodeFailure)
            }
            Ok(None) => {
                warn!(%target, "finalized but no score recorded");
                RemoteOutcome::Unconfirmed(ErrorKind::NotFound)
            }
            Err(e) => {
                warn!(%target, operation = "read", error = %e, "last score read failed");
                RemoteOutcome::Unconfirmed(e.kind())
            }
        };
        Ok(outcome)
    }

    fn fall_back(
        &self,
        ticket: u64,
        target: &Address,
        issue: ErrorKind,
    ) -> Result<ResolvedScore, QueryError> {
        warn!(%target, issue = issue.code(), "remote score unconfirmed, using synthesized score");
        self.finish(ticket, synthesize(target), Provenance::Fallback, Some(issue))
    }

    fn finish(
        &self,
        ticket: u64,
        record: ScoreRecord,
        provenance: Provenance,
        issue: Option<ErrorKind>,
    ) -> Result<ResolvedScore, QueryError> {
        self.apply(ticket, |s| {
            s.status = QueryStatus::Resolved(provenance);
            s.remote_issue = issue;
            s.result = Some(record.clone());
        })?;
        info!(
            target = %record.address,
            total_score = record.total_score,
            grade = record.grade.as_str(),
            ?provenance,
            "score resolved"
        );
        Ok(ResolvedScore { provenance, record })
    }

    /// Starts a new session and returns its generation.
    fn begin(&self) -> u64 {
        let mut session = self.lock();
        let mut ticket = 0;
        self.generation.send_modify(|g| {
            *g = g.wrapping_add(1);
            ticket = *g;
        });
        *session = QuerySession::default();
        ticket
    }

    /// Applies `f` to the session only while `ticket` is still the current generation.
    fn apply<F>(&self, ticket: u64, f: F) -> Result<(), QueryError>
    where
        F: FnOnce(&mut QuerySession),
    {
        let mut session = self.lock();
        if *self.generation.borrow() != ticket {
            return Err(QueryError::Cancelled);
        }
        f(&mut session);
        Ok(())
    }

    /// Awaits `fut` unless the generation moves past `ticket` first.
    async fn guard<F>(&self, ticket: u64, fut: F) -> Result<F::Output, QueryError>
    where
        F: Future,
    {
        let mut current = self.generation.subscribe();
        tokio::select! {
            biased;
            _ = current.wait_for(|g| *g != ticket) => Err(QueryError::Cancelled),
            out = fut => Ok(out),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QuerySession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
