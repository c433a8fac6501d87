//! Shared primitive types used across the crate.

/// Bank-assigned customer identifier, as it appears in the dataset.
pub type CustomerId = u64;

/// A churn probability in [0.0, 1.0].
pub type Probability = f64;

/// Seed for the demo segmentation view. Changing it changes every
/// simulated segment, so treat it as part of the output contract.
pub const DEFAULT_SEED: u64 = 42;
