use serde::{Deserialize, Serialize};

/// How the wallet proves consent for a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationKind {
    /// Value transfer to the contract carrying the query fee.
    #[default]
    Transaction,
    /// Signed consent message, no value moved.
    Signature,
}

/// Proof of consent returned by the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AuthorizationArtifact {
    /// Transaction hash.
    Transaction(String),
    /// Hex signature.
    Signature(String),
}

impl AuthorizationArtifact {
    pub fn kind(&self) -> AuthorizationKind {
        match self {
            AuthorizationArtifact::Transaction(_) => AuthorizationKind::Transaction,
            AuthorizationArtifact::Signature(_) => AuthorizationKind::Signature,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            AuthorizationArtifact::Transaction(v) | AuthorizationArtifact::Signature(v) => v,
        }
    }
}
