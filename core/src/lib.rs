//! churnwatch-core: churn risk scoring, segmentation and dashboard queries.

pub mod config;
pub mod customer;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod impact;
pub mod model;
pub mod risk;
pub mod rng;
pub mod scorer;
pub mod segmentation;
pub mod types;
