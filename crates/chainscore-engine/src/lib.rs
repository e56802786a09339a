//! Score acquisition engine.
//!
//! Turns a user-supplied address into either an authoritative score read back from the
//! scoring contract or, when the remote path cannot be confirmed, the deterministic
//! synthesized score. One [`QuerySession`] is active per engine; a newer query or
//! [`ScoreAcquisitionEngine::reset`] abandons the previous one, and nothing an abandoned
//! query awaits can mutate the session afterwards.
#![forbid(unsafe_code)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use config::EngineConfig;
pub use engine::ScoreAcquisitionEngine;
pub use error::QueryError;
pub use session::{Provenance, QuerySession, QueryStatus, ResolvedScore};
