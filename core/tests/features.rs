mod common;

use churnwatch_core::{
    customer::{clv_proxy, engagement_score, FeatureRow, FEATURE_NAMES},
    error::ChurnError,
};
use common::customer;

#[test]
fn engagement_score_examples() {
    assert_eq!(engagement_score(true, true, 4), 1.75);
    assert_eq!(engagement_score(false, false, 1), 0.25);
    assert_eq!(engagement_score(true, false, 2), 1.0);
}

#[test]
fn clv_proxy_example() {
    assert!((clv_proxy(75_000.0, 5) - 37.5).abs() < 1e-9);
    assert_eq!(clv_proxy(75_000.0, 0), 0.0);
}

/// Numeric columns are emitted in training order, flags as 0/1.
#[test]
fn feature_row_follows_training_order() {
    let mut r = customer(35, true, 2);
    r.has_credit_card = false;
    r.geography = "Spain".into();
    r.gender = "Female".into();

    let row = FeatureRow::assemble(&r).unwrap();
    assert_eq!(
        row.numeric,
        [650.0, 35.0, 5.0, 75_000.0, 2.0, 0.0, 1.0, 100_000.0, 1.0, 75_000.0 * 5.0 * 0.0001]
    );
    assert_eq!(row.categorical_value("Geography"), Some("Spain"));
    assert_eq!(row.categorical_value("Gender"), Some("Female"));

    assert_eq!(FEATURE_NAMES.len(), 12);
    for name in &FEATURE_NAMES[..10] {
        assert!(row.numeric_value(name).is_some(), "missing {name}");
    }
    assert_eq!(row.numeric_value("Surname"), None);
}

#[test]
fn out_of_domain_fields_are_rejected() {
    let cases = [
        ("CreditScore", { let mut r = customer(35, true, 1); r.credit_score = 200; r }),
        ("Age",         { let mut r = customer(35, true, 1); r.age = 17; r }),
        ("Tenure",      { let mut r = customer(35, true, 1); r.tenure = 11; r }),
        ("NumOfProducts", { let mut r = customer(35, true, 1); r.num_products = 5; r }),
        ("Balance",     { let mut r = customer(35, true, 1); r.balance = -1.0; r }),
        ("EstimatedSalary", { let mut r = customer(35, true, 1); r.estimated_salary = f64::NAN; r }),
        ("Geography",   { let mut r = customer(35, true, 1); r.geography = String::new(); r }),
    ];

    for (field, record) in cases {
        match FeatureRow::assemble(&record) {
            Err(ChurnError::InvalidInput { field: f, .. }) => assert_eq!(f, field),
            other => panic!("expected InvalidInput for {field}, got {other:?}"),
        }
    }
}
