//! Tests for the LCG family
//!
//! Known-answer sequences plus reversal and seek consistency across the
//! catalog variants.

use proptest::prelude::*;
use seedsleuth_core::prng::{LcgGenerator, Limit, Prng, PrngError};

fn limit(value: u64) -> Limit {
    Limit::new(value).unwrap()
}

fn catalog() -> Vec<LcgGenerator> {
    vec![
        LcgGenerator::msvcrt(),
        LcgGenerator::msvcrt_mul(),
        LcgGenerator::bsd_libc(),
        LcgGenerator::bsd_libc_old(),
        LcgGenerator::vbscript(),
        LcgGenerator::java(),
    ]
}

// ============================================================================
// Known Answers
// ============================================================================

#[test]
fn test_msvcrt_seed_one() {
    let mut rng = LcgGenerator::msvcrt();
    rng.seed(1).unwrap();
    let values: Vec<u64> = (0..5).map(|_| rng.next()).collect();
    assert_eq!(values, vec![41, 18467, 6334, 26500, 19169]);
}

#[test]
fn test_minimal_standard_seed_one() {
    let mut rng = LcgGenerator::bsd_libc();
    rng.seed(1).unwrap();
    let values: Vec<u64> = (0..3).map(|_| rng.next()).collect();
    assert_eq!(values, vec![16807, 282475249, 1622650073]);
}

#[test]
fn test_ansi_sample_seed_one() {
    let mut rng = LcgGenerator::bsd_libc_old();
    rng.seed(1).unwrap();
    let values: Vec<u64> = (0..3).map(|_| rng.next()).collect();
    assert_eq!(values, vec![1103527590, 377401575, 662824084]);
}

#[test]
fn test_vbscript_raw_states() {
    let mut rng = LcgGenerator::vbscript();
    rng.seed(1).unwrap();
    let values: Vec<u64> = (0..3).map(|_| rng.next()).collect();
    assert_eq!(values, vec![12640960, 8124035, 4294458]);
}

#[test]
fn test_java_matches_java_util_random() {
    // new Random(42).nextInt() == -1170105035
    let mut rng = LcgGenerator::java();
    rng.seed(42).unwrap();
    assert_eq!(rng.next(), 3124862261);

    // new Random(42).nextInt(10) == 0
    rng.seed(42).unwrap();
    assert_eq!(rng.next_bounded(limit(10)), 0);
}

#[test]
fn test_seed_range_enforced() {
    let mut rng = LcgGenerator::bsd_libc();
    assert!(matches!(rng.seed(0), Err(PrngError::InvalidArgument(_))));
    assert!(rng.seed(0x7FFF_FFFF).is_err());
    assert!(rng.seed(0x7FFF_FFFE).is_ok());

    let mut rng = LcgGenerator::vbscript();
    assert!(rng.seed(1 << 24).is_err());
    assert!(rng.seek_seed_ahead(1 << 24, 1).is_err());
}

// ============================================================================
// Reversal And Seeking
// ============================================================================

#[test]
fn test_seek_one_equals_next() {
    for mut rng in catalog() {
        rng.seed(rng.minimum_seed() + 12345).unwrap();
        let mut jumped = rng.clone();
        rng.next();
        jumped.seek_ahead(1).unwrap();
        assert_eq!(jumped.state(), rng.state(), "{}", rng.name());
    }
}

const SEED_OFFSETS: [u64; 4] = [1, 99, 31_337, 1_000_003];

#[test]
fn test_previous_walks_back_ten_thousand_steps() {
    for offset in SEED_OFFSETS {
        for mut rng in catalog() {
            rng.seed(rng.minimum_seed() + offset).unwrap();
            let start = rng.state();
            let forward: Vec<u64> = (0..10_000).map(|_| rng.next()).collect();
            for expected in forward.iter().rev() {
                assert_eq!(rng.previous().unwrap(), *expected, "{} +{}", rng.name(), offset);
            }
            assert_eq!(rng.state(), start, "{} +{}", rng.name(), offset);
        }
    }
}

#[test]
fn test_java_previous_bounded_through_rejections() {
    // just above 2^30 about half of all draws are rejected and redrawn
    let bound = limit((1 << 30) + 1);
    for seed in [7, 42, 1_001_472, 0xDEAD_BEEF] {
        let mut rng = LcgGenerator::java();
        rng.seed(seed).unwrap();
        rng.next_bounded(bound);
        let start = rng.state();
        let values: Vec<u64> = (0..10_000).map(|_| rng.next_bounded(bound)).collect();
        for expected in values.iter().rev() {
            assert_eq!(rng.previous_bounded(bound).unwrap(), *expected, "seed {seed}");
        }
        assert_eq!(rng.state(), start, "seed {seed}");
    }
}

#[test]
fn test_seek_seed_matches_stepping() {
    let rng = LcgGenerator::msvcrt();
    let mut stepped = LcgGenerator::msvcrt();
    stepped.seed(1).unwrap();
    for _ in 0..5 {
        stepped.next();
    }
    let seed = rng.seek_seed_ahead(1, 5).unwrap();
    assert_eq!(seed, stepped.state());
    assert_eq!(rng.seek_seed_back(seed, 5).unwrap(), 1);
}

#[test]
fn test_java_seek_seed_keeps_scramble() {
    let rng = LcgGenerator::java();
    let ahead = rng.seek_seed_ahead(42, 3).unwrap();

    let mut direct = LcgGenerator::java();
    direct.seed(42).unwrap();
    for _ in 0..3 {
        direct.next();
    }
    let expected: Vec<u64> = (0..4).map(|_| direct.next()).collect();

    let mut reseeded = LcgGenerator::java();
    reseeded.seed(ahead).unwrap();
    let actual: Vec<u64> = (0..4).map(|_| reseeded.next()).collect();
    assert_eq!(actual, expected);
    assert_eq!(rng.seek_seed_back(ahead, 3).unwrap(), 42);
}

#[test]
fn test_bounded_previous_returns_same_values() {
    let bound = limit(62);
    for mut rng in catalog() {
        rng.seed(rng.minimum_seed() + 7).unwrap();
        // leave an accepted Java draw behind the starting point
        rng.next_bounded(bound);
        let values: Vec<u64> = (0..200).map(|_| rng.next_bounded(bound)).collect();
        for expected in values.iter().rev() {
            assert_eq!(rng.previous_bounded(bound).unwrap(), *expected, "{}", rng.name());
        }
    }
}

proptest! {
    #[test]
    fn prop_seek_ahead_then_back_is_identity(
        seed in 0u64..0x7FFF_FFFE,
        offset in any::<u64>(),
    ) {
        for mut rng in catalog() {
            let seed = rng.minimum_seed() + seed % (rng.maximum_seed() - rng.minimum_seed());
            rng.seed(seed).unwrap();
            let start = rng.state();
            rng.seek_ahead(offset).unwrap();
            rng.seek_back(offset).unwrap();
            prop_assert_eq!(rng.state(), start);
        }
    }

    #[test]
    fn prop_seek_matches_stepping(seed in 0u64..0x7FFF_FFFF, steps in 0u64..300) {
        let mut stepped = LcgGenerator::msvcrt();
        stepped.seed(seed).unwrap();
        let mut jumped = stepped.clone();
        for _ in 0..steps {
            stepped.next();
        }
        jumped.seek_ahead(steps).unwrap();
        prop_assert_eq!(jumped.state(), stepped.state());
    }

    #[test]
    fn prop_bounded_output_in_range(seed in 0u64..0x7FFF_FFFF, bound in 1u64..1000) {
        for mut rng in catalog() {
            let seed = rng.minimum_seed() + seed % (rng.maximum_seed() - rng.minimum_seed());
            rng.seed(seed).unwrap();
            for _ in 0..20 {
                prop_assert!(rng.next_bounded(limit(bound)) < bound);
            }
        }
    }
}
