use crate::domain::types::{FeatureVector, RawFeatures};

/// Number of covariates per feature row.
pub const FEATURE_COUNT: usize = 6;

/// Ordered list of feature names.
/// This order MUST match the column order of the `features_daily` table.
/// Any change here is a breaking change for the stored feature history.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "ret_d1",
    "ret_5d",
    "vol_20d",
    "articles_1d",
    "articles_3d",
    "surprise_pct",
];

/// Replaces missing values with 0.0.
pub fn fill_missing(raw: &RawFeatures) -> FeatureVector {
    let mut dense = [0.0; FEATURE_COUNT];
    for (slot, value) in dense.iter_mut().zip(raw.iter()) {
        *slot = value.unwrap_or(0.0);
    }
    dense
}

/// Position of a feature in the registry.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}
