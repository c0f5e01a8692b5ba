//! Time-respecting train/test split selection.
//!
//! Candidate training fractions are tried from largest to smallest and the
//! first prefix that contains both label classes wins. Rows are never
//! shuffled: the training set is always a chronological prefix.

/// Candidate training fractions, largest first.
pub const TRAIN_FRACTIONS: [f64; 7] = [0.90, 0.85, 0.80, 0.75, 0.70, 0.65, 0.60];

/// An accepted split: rows `[0, train_len)` train, the rest are held out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSplit {
    pub fraction: f64,
    pub train_len: usize,
}

pub fn has_both_classes(labels: &[bool]) -> bool {
    labels.iter().any(|l| *l) && labels.iter().any(|l| !*l)
}

/// Training prefix length for `fraction` of `row_count` rows (at least 1).
pub fn train_size(fraction: f64, row_count: usize) -> usize {
    ((fraction * row_count as f64).floor() as usize).max(1)
}

/// First candidate fraction whose training prefix holds both classes.
///
/// `labels` must be in chronological order.
pub fn select_time_split(labels: &[bool]) -> Option<TimeSplit> {
    TRAIN_FRACTIONS.iter().find_map(|&fraction| {
        let train_len = train_size(fraction, labels.len()).min(labels.len());
        has_both_classes(&labels[..train_len]).then_some(TimeSplit {
            fraction,
            train_len,
        })
    })
}
