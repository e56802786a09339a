//! Score records.
//!
//! A record carries five dimension scores in [0,100] combined with fixed integer weights
//! (percent, summing to exactly 100) into `total_score`, plus a grade and a sybil-risk class
//! bucketed from the total.

use crate::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scoring dimensions in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    AssetHealth,
    TxActivity,
    DefiEngagement,
    AccountMaturity,
    Governance,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::AssetHealth,
        Dimension::TxActivity,
        Dimension::DefiEngagement,
        Dimension::AccountMaturity,
        Dimension::Governance,
    ];

    /// Weight in percent. The five weights sum to 100.
    pub const fn weight_percent(self) -> u32 {
        match self {
            Dimension::AssetHealth => 25,
            Dimension::TxActivity => 20,
            Dimension::DefiEngagement => 25,
            Dimension::AccountMaturity => 15,
            Dimension::Governance => 15,
        }
    }

    /// Wire key.
    pub const fn key(self) -> &'static str {
        match self {
            Dimension::AssetHealth => "asset_health",
            Dimension::TxActivity => "tx_activity",
            Dimension::DefiEngagement => "defi_engagement",
            Dimension::AccountMaturity => "account_maturity",
            Dimension::Governance => "governance",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Dimension::AssetHealth => "asset health",
            Dimension::TxActivity => "transaction activity",
            Dimension::DefiEngagement => "DeFi engagement",
            Dimension::AccountMaturity => "account maturity",
            Dimension::Governance => "governance participation",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub asset_health: u8,
    pub tx_activity: u8,
    pub defi_engagement: u8,
    pub account_maturity: u8,
    pub governance: u8,
}

impl Dimensions {
    pub fn get(&self, d: Dimension) -> u8 {
        match d {
            Dimension::AssetHealth => self.asset_health,
            Dimension::TxActivity => self.tx_activity,
            Dimension::DefiEngagement => self.defi_engagement,
            Dimension::AccountMaturity => self.account_maturity,
            Dimension::Governance => self.governance,
        }
    }

    /// Sets a dimension, clamping to 100.
    pub fn set(&mut self, d: Dimension, value: u8) {
        let value = value.min(100);
        match d {
            Dimension::AssetHealth => self.asset_health = value,
            Dimension::TxActivity => self.tx_activity = value,
            Dimension::DefiEngagement => self.defi_engagement = value,
            Dimension::AccountMaturity => self.account_maturity = value,
            Dimension::Governance => self.governance = value,
        }
    }

    /// `round(Σ dimension * weight)`, half rounding up.
    pub fn weighted_total(&self) -> u8 {
        let sum: u32 = Dimension::ALL
            .iter()
            .map(|d| u32::from(self.get(*d).min(100)) * d.weight_percent())
            .sum();
        // sum <= 100 * 100, so the quotient fits in u8.
        u8::try_from((sum + 50) / 100).unwrap_or(100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(total_score: u8) -> Self {
        match total_score {
            80.. => Grade::A,
            65..=79 => Grade::B,
            50..=64 => Grade::C,
            35..=49 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" | "a" => Some(Grade::A),
            "B" | "b" => Some(Grade::B),
            "C" | "c" => Some(Grade::C),
            "D" | "d" => Some(Grade::D),
            "F" | "f" => Some(Grade::F),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    /// Fixed one-line summary per grade.
    pub const fn summary(self) -> &'static str {
        match self {
            Grade::A => "Highly active wallet with strong on-chain history.",
            Grade::B => "Active wallet with good transaction history.",
            Grade::C => "Moderate activity with room for improvement.",
            Grade::D => "Limited on-chain activity detected.",
            Grade::F => "Minimal on-chain presence.",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SybilRisk {
    Low,
    Medium,
    High,
}

impl SybilRisk {
    /// Bucketed from the total score alone; account maturity does not gate `Low`.
    pub fn from_score(total_score: u8) -> Self {
        match total_score {
            60.. => SybilRisk::Low,
            40..=59 => SybilRisk::Medium,
            _ => SybilRisk::High,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(SybilRisk::Low),
            "medium" => Some(SybilRisk::Medium),
            "high" => Some(SybilRisk::High),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SybilRisk::Low => "low",
            SybilRisk::Medium => "medium",
            SybilRisk::High => "high",
        }
    }
}

impl fmt::Display for SybilRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a score query. Immutable once handed to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub address: Address,
    pub total_score: u8,
    pub grade: Grade,
    pub dimensions: Dimensions,
    pub sybil_risk: SybilRisk,
    pub summary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    /// Seconds since epoch at record creation.
    pub timestamp: u64,
    /// Smallest currency unit; 0 for a free query.
    #[serde(default)]
    pub fee_paid: u128,
}
