//! ChainScore domain core.
//!
//! Pure types shared by the ledger client, the wallet layer and the acquisition engine:
//! - [`Address`]: canonical 20-byte account address.
//! - [`ScoreRecord`]: the five-dimension reputation record returned by a query.
//! - [`synth`]: the deterministic placeholder score used when the remote path is unavailable.
//! - [`ErrorKind`]: the closed failure taxonomy surfaced to callers.
//!
//! Nothing in this crate performs I/O. Scores and weights are integers; no floats.
#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]
#![deny(clippy::cast_precision_loss)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_possible_wrap)]
#![deny(clippy::cast_sign_loss)]

pub mod address;
pub mod authorization;
pub mod error;
pub mod score;
pub mod synth;

pub use address::{Address, AddressError};
pub use authorization::{AuthorizationArtifact, AuthorizationKind};
pub use error::ErrorKind;
pub use score::{Dimension, Dimensions, Grade, ScoreRecord, SybilRisk};
pub use synth::{synthesize, synthesize_at};

/// Seconds since the Unix epoch, saturating to 0 if the clock is before it.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
