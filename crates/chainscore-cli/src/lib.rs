//! Library half of the `chainscore` binary: configuration loading and the mapping from
//! the file format onto the typed configs of the ledger client, wallet and engine.

pub mod config;

pub use config::AppConfig;
