use chainscore_core::{Address, AuthorizationArtifact, ErrorKind, ScoreRecord};
use chainscore_rpc::RequestHandle;
use serde::Serialize;

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Read back from the scoring contract.
    Remote,
    /// Synthesized locally after the remote path could not be confirmed.
    Fallback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum QueryStatus {
    #[default]
    Idle,
    Authorizing,
    Submitting,
    Polling,
    Resolved(Provenance),
    Failed(ErrorKind),
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryStatus::Resolved(_) | QueryStatus::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryStatus::Idle => "idle",
            QueryStatus::Authorizing => "authorizing",
            QueryStatus::Submitting => "submitting",
            QueryStatus::Polling => "polling",
            QueryStatus::Resolved(_) => "resolved",
            QueryStatus::Failed(_) => "failed",
        }
    }
}

/// State of the single active query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuerySession {
    pub status: QueryStatus,
    pub target: Option<Address>,
    pub signer: Option<Address>,
    pub authorization: Option<AuthorizationArtifact>,
    pub request_handle: Option<RequestHandle>,
    pub poll_attempts: u32,
    /// Terminal failure.
    pub error: Option<ErrorKind>,
    /// Remote failure recovered by fallback, kept for diagnostics.
    pub remote_issue: Option<ErrorKind>,
    pub result: Option<ScoreRecord>,
}

/// A score handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedScore {
    pub provenance: Provenance,
    pub record: ScoreRecord,
}
