//! Deterministic placeholder scores.
//!
//! The record is a pure function of the address (and the caller-supplied timestamp):
//! the same address always yields the same dimensions, total, grade, risk and text.

use crate::{unix_now, Address, Dimension, Dimensions, Grade, ScoreRecord, SybilRisk};

/// Threshold at or above which a dimension is listed as a highlight.
const HIGHLIGHT_AT: u8 = 75;
/// Threshold below which a dimension is listed as a concern.
const CONCERN_BELOW: u8 = 40;

/// Synthesizes a record stamped with the current time.
pub fn synthesize(address: &Address) -> ScoreRecord {
    synthesize_at(address, unix_now())
}

/// Pure core of [`synthesize`].
pub fn synthesize_at(address: &Address, timestamp: u64) -> ScoreRecord {
    let seed = seed_of(address);

    let mut dimensions = Dimensions::default();
    for d in Dimension::ALL {
        dimensions.set(d, draw(seed, d));
    }

    let total_score = dimensions.weighted_total();
    let grade = Grade::from_score(total_score);

    let highlights = Dimension::ALL
        .iter()
        .filter(|d| dimensions.get(**d) >= HIGHLIGHT_AT)
        .map(|d| format!("Strong {}", d.label()))
        .collect();
    let concerns = Dimension::ALL
        .iter()
        .filter(|d| dimensions.get(**d) < CONCERN_BELOW)
        .map(|d| format!("Limited {}", d.label()))
        .collect();

    ScoreRecord {
        address: *address,
        total_score,
        grade,
        dimensions,
        sybil_risk: SybilRisk::from_score(total_score),
        summary: grade.summary().to_string(),
        highlights,
        concerns,
        timestamp,
        fee_paid: 0,
    }
}

/// First 8 hex digits of the canonical address as a base-16 integer.
pub fn seed_of(address: &Address) -> u32 {
    let b = address.as_bytes();
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

/// Inclusive draw range per dimension.
pub const fn draw_range(d: Dimension) -> (u8, u8) {
    match d {
        Dimension::AssetHealth => (35, 92),
        Dimension::TxActivity => (30, 88),
        Dimension::DefiEngagement => (25, 85),
        Dimension::AccountMaturity => (40, 90),
        Dimension::Governance => (15, 75),
    }
}

const fn offset(d: Dimension) -> u64 {
    match d {
        Dimension::AssetHealth => 1,
        Dimension::TxActivity => 2,
        Dimension::DefiEngagement => 3,
        Dimension::AccountMaturity => 4,
        Dimension::Governance => 5,
    }
}

fn draw(seed: u32, d: Dimension) -> u8 {
    let (min, max) = draw_range(d);
    let span = u64::from(max - min) + 1;
    let v = u64::from(min) + splitmix64(u64::from(seed) + offset(d)) % span;
    u8::try_from(v.min(u64::from(max))).unwrap_or(max)
}

/// SplitMix64 finalizer.
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_addresses() -> Vec<Address> {
        (0u32..512)
            .map(|i| {
                let mut bytes = [0u8; 20];
                let mixed = splitmix64(u64::from(i));
                bytes[..8].copy_from_slice(&mixed.to_be_bytes());
                bytes[19] = i.to_le_bytes()[0];
                Address::from_bytes(bytes)
            })
            .collect()
    }

    #[test]
    fn same_address_same_record() {
        for a in sample_addresses() {
            assert_eq!(synthesize_at(&a, 42), synthesize_at(&a, 42));
        }
    }

    #[test]
    fn wall_clock_synthesis_differs_only_in_timestamp() {
        let a = Address::parse("0xC2Dd389015255B31c58F47bd421b1510bbD15860").unwrap();
        let live = synthesize(&a);
        let pinned = synthesize_at(&a, live.timestamp);
        assert_eq!(live, pinned);
    }

    #[test]
    fn case_of_input_does_not_matter() {
        let upper = Address::parse("0xABCDEF0123456789ABCDEF0123456789ABCDEF01").unwrap();
        let lower = Address::parse("0xabcdef0123456789abcdef0123456789abcdef01").unwrap();
        assert_eq!(synthesize_at(&upper, 7), synthesize_at(&lower, 7));
    }

    #[test]
    fn total_matches_weighted_dimensions_and_ranges_hold() {
        for a in sample_addresses() {
            let r = synthesize_at(&a, 0);
            let weighted: u32 = Dimension::ALL
                .iter()
                .map(|d| u32::from(r.dimensions.get(*d)) * d.weight_percent())
                .sum();
            assert_eq!(u32::from(r.total_score), (weighted + 50) / 100);
            for d in Dimension::ALL {
                let (min, max) = draw_range(d);
                let v = r.dimensions.get(d);
                assert!((min..=max).contains(&v), "{d:?}={v} for {a}");
                assert!(v <= 100);
            }
            assert_eq!(r.grade, Grade::from_score(r.total_score));
            assert_eq!(r.sybil_risk, SybilRisk::from_score(r.total_score));
            assert_eq!(r.summary, r.grade.summary());
            assert_eq!(r.fee_paid, 0);
        }
    }

    #[test]
    fn seed_is_the_leading_eight_hex_digits() {
        let a = Address::parse("0xdeadbeef00000000000000000000000000000000").unwrap();
        assert_eq!(seed_of(&a), 0xdead_beef);
    }

    #[test]
    fn only_the_seed_prefix_drives_the_score() {
        let a = Address::parse("0x1234567800000000000000000000000000000001").unwrap();
        let b = Address::parse("0x12345678ffffffffffffffffffffffffffffffff").unwrap();
        let ra = synthesize_at(&a, 0);
        let rb = synthesize_at(&b, 0);
        assert_eq!(ra.dimensions, rb.dimensions);
        assert_ne!(ra.address, rb.address);
    }

    #[test]
    fn highlights_and_concerns_follow_thresholds() {
        for a in sample_addresses() {
            let r = synthesize_at(&a, 0);
            let strong = Dimension::ALL
                .iter()
                .filter(|d| r.dimensions.get(**d) >= HIGHLIGHT_AT)
                .count();
            let weak = Dimension::ALL
                .iter()
                .filter(|d| r.dimensions.get(**d) < CONCERN_BELOW)
                .count();
            assert_eq!(r.highlights.len(), strong);
            assert_eq!(r.concerns.len(), weak);
        }
    }

    #[test]
    fn draws_spread_across_the_range() {
        let values: std::collections::BTreeSet<u8> = sample_addresses()
            .iter()
            .map(|a| synthesize_at(a, 0).dimensions.asset_health)
            .collect();
        assert!(values.len() > 30, "only {} distinct values", values.len());
    }
}
