mod common;

use churnwatch_core::{
    error::ChurnError,
    risk::RiskLabel,
    scorer::{assess, assess_batch, AgeBounds, HeuristicSource, HeuristicWeights, ProbabilitySource},
};
use common::customer;

fn noiseless() -> HeuristicSource {
    HeuristicSource {
        weights: HeuristicWeights { noise_std: 0.0, ..HeuristicWeights::default() },
        ..HeuristicSource::default()
    }
}

/// Without noise the formula is exact: youngest active 4-product customer
/// sits at the base rate, the oldest inactive single-product one saturates.
#[test]
fn formula_matches_hand_computation() {
    let batch = [customer(20, true, 4), customer(60, false, 1), customer(40, true, 2)];
    let p = noiseless().probabilities(&batch).unwrap();

    assert!((p[0] - 0.2).abs() < 1e-12, "p0={}", p[0]);
    assert_eq!(p[1], 1.0, "0.2 + 0.5 + 0.2 + 0.3 clamps to 1");
    // 0.2 + 0.5 * 0.5 + 0 + 0.2
    assert!((p[2] - 0.65).abs() < 1e-12, "p2={}", p[2]);
}

#[test]
fn output_is_always_clamped() {
    let wild = HeuristicSource {
        weights: HeuristicWeights { noise_std: 5.0, ..HeuristicWeights::default() },
        ..HeuristicSource::default()
    };
    let batch: Vec<_> = (0..500)
        .map(|i| customer(18 + (i % 83), i % 2 == 0, 1 + (i % 4)))
        .collect();

    for p in wild.probabilities(&batch).unwrap() {
        assert!((0.0..=1.0).contains(&p), "p={p} escaped [0, 1]");
    }
}

/// A batch of one has no age spread; the age factor falls back to 0.
#[test]
fn single_record_batch_has_defined_age_factor() {
    let p = noiseless().probabilities(&[customer(70, true, 4)]).unwrap();
    assert_eq!(p.len(), 1);
    assert!(p[0].is_finite());
    assert!((p[0] - 0.2).abs() < 1e-12);

    let a = assess(&customer(70, false, 1), &ProbabilitySource::Heuristic(noiseless())).unwrap();
    // 0.2 + 0 + 0.2 + 0.3
    assert!((a.probability - 0.7).abs() < 1e-12);
}

#[test]
fn empty_batch_is_degenerate() {
    match assess_batch(&[], &ProbabilitySource::Heuristic(HeuristicSource::default())) {
        Err(ChurnError::DegenerateBatch { size }) => assert_eq!(size, 0),
        other => panic!("expected DegenerateBatch, got {other:?}"),
    }
}

#[test]
fn same_seed_same_batch_is_bit_identical() {
    let batch: Vec<_> = (0..200).map(|i| customer(18 + (i % 70), i % 3 != 0, 1 + (i % 4))).collect();
    let source = HeuristicSource::default();

    let a = source.probabilities(&batch).unwrap();
    let b = source.probabilities(&batch).unwrap();
    let bits_a: Vec<u64> = a.iter().map(|p| p.to_bits()).collect();
    let bits_b: Vec<u64> = b.iter().map(|p| p.to_bits()).collect();
    assert_eq!(bits_a, bits_b);

    let other = source.with_seed(43).probabilities(&batch).unwrap();
    assert_ne!(a, other, "a different seed should move the noise");
}

#[test]
fn fixed_bounds_normalize_against_dataset_range() {
    let source = noiseless().with_bounds(AgeBounds::Fixed { min: 18, max: 92 });
    // Same record, alone or with company, scores the same under fixed bounds.
    let alone = source.probabilities(&[customer(55, true, 4)]).unwrap();
    let crowd = source
        .probabilities(&[customer(55, true, 4), customer(18, true, 4), customer(92, true, 4)])
        .unwrap();
    assert_eq!(alone[0], crowd[0]);
    assert!((crowd[1] - 0.2).abs() < 1e-12);
    assert!((crowd[2] - 0.7).abs() < 1e-12);

    // Ages outside the fixed range clamp the age factor.
    let outside = source.probabilities(&[customer(100, true, 4)]).unwrap();
    assert!((outside[0] - 0.7).abs() < 1e-12);
}

#[test]
fn inverted_fixed_bounds_are_invalid() {
    let source = noiseless().with_bounds(AgeBounds::Fixed { min: 60, max: 60 });
    assert!(matches!(
        source.probabilities(&[customer(40, true, 1)]),
        Err(ChurnError::InvalidInput { .. })
    ));
}

#[test]
fn batch_assessment_labels_each_probability() {
    let batch = [customer(20, true, 4), customer(60, false, 1)];
    let out = assess_batch(&batch, &ProbabilitySource::Heuristic(noiseless())).unwrap();
    assert_eq!(out[0].label, RiskLabel::Low);
    assert_eq!(out[1].label, RiskLabel::High);
}
