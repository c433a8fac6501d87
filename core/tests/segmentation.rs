mod common;

use churnwatch_core::{
    dataset::Dataset,
    error::ChurnError,
    risk::RiskLabel,
    scorer::{AgeBounds, HeuristicSource},
    segmentation::{age_bounds_for, segment, SegmentationOptions, HIGH_RISK_TABLE_ROWS},
};
use common::{synthetic_csv, write_temp};

fn load(name: &str, n: u64) -> Dataset {
    let path = write_temp(name, "csv", &synthetic_csv(n));
    let d = Dataset::load(&path).expect("synthetic dataset loads");
    let _ = std::fs::remove_file(path);
    d
}

#[test]
fn segment_counts_sum_to_sample() {
    let d = load("seg-sum", 600);
    let report = segment(&d, &SegmentationOptions { sample_size: 400, ..Default::default() }).unwrap();

    assert_eq!(report.sample_size, 400);
    assert_eq!(report.seed, 42);
    let total: usize = report.segments.iter().map(|s| s.count).sum();
    assert_eq!(total, 400);
    let share: f64 = report.segments.iter().map(|s| s.share).sum();
    assert!((share - 100.0).abs() < 1e-9);

    let labels: Vec<RiskLabel> = report.segments.iter().map(|s| s.label).collect();
    assert_eq!(labels, RiskLabel::ALL);
}

#[test]
fn same_seed_same_report() {
    let d = load("seg-det", 500);
    let options = SegmentationOptions { sample_size: 250, ..Default::default() };
    let a = segment(&d, &options).unwrap();
    let b = segment(&d, &options).unwrap();
    assert_eq!(a, b);
}

#[test]
fn high_risk_table_is_capped_and_consistent() {
    let d = load("seg-high", 1000);
    let report = segment(&d, &SegmentationOptions { sample_size: 1000, ..Default::default() }).unwrap();

    let high = report.count(RiskLabel::High);
    assert!(high > 0, "synthetic population should produce some high-risk customers");
    assert_eq!(report.high_risk_customers.len(), high.min(HIGH_RISK_TABLE_ROWS));
    for row in &report.high_risk_customers {
        assert!(row.churn_probability >= 0.7, "p={}", row.churn_probability);
    }

    let profile = report.high_risk.as_ref().expect("profile present when segment is non-empty");
    assert_eq!(profile.count, high);
    assert!(profile.avg_age >= 18.0 && profile.avg_age <= 100.0);
    assert!((0.0..=100.0).contains(&profile.actual_churn_rate));
}

#[test]
fn oversized_sample_uses_whole_dataset() {
    let d = load("seg-oversize", 50);
    let report = segment(&d, &SegmentationOptions::default()).unwrap();
    assert_eq!(report.sample_size, 50);
}

#[test]
fn empty_dataset_is_degenerate() {
    let d = Dataset::from_entries(Vec::new());
    assert!(matches!(
        segment(&d, &SegmentationOptions::default()),
        Err(ChurnError::DegenerateBatch { .. })
    ));
}

#[test]
fn dataset_bounds_only_when_requested_and_spread() {
    let d = load("seg-bounds", 100);
    assert_eq!(age_bounds_for(&d, false), AgeBounds::Batch);
    assert_eq!(age_bounds_for(&d, true), AgeBounds::Fixed { min: 18, max: 92 });
    assert_eq!(age_bounds_for(&Dataset::from_entries(Vec::new()), true), AgeBounds::Batch);

    let fixed = SegmentationOptions {
        sample_size: 60,
        heuristic:   HeuristicSource::default().with_bounds(age_bounds_for(&d, true)),
    };
    let report = segment(&d, &fixed).unwrap();
    assert_eq!(report.segments.iter().map(|s| s.count).sum::<usize>(), 60);
}
