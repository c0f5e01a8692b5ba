//! Held-out evaluation metrics.

use super::classifier::predicted_label;

/// Area under the ROC curve of `scores` against `labels`.
///
/// Computed as the Mann-Whitney U statistic with average ranks for tied
/// scores. `None` when either class is absent or the inputs are misaligned.
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Option<f64> {
    if labels.len() != scores.len() || labels.is_empty() {
        return None;
    }
    let n_pos = labels.iter().filter(|l| **l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    // 1-based ranks, ties share their average rank
    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let average = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = average;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = labels
        .iter()
        .zip(ranks.iter())
        .filter(|(l, _)| **l)
        .map(|(_, r)| r)
        .sum();
    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    let u = rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg))
}

/// Share of rows whose thresholded probability matches the label.
pub fn accuracy(labels: &[bool], probabilities: &[f64]) -> Option<f64> {
    if labels.len() != probabilities.len() || labels.is_empty() {
        return None;
    }
    let correct = labels
        .iter()
        .zip(probabilities.iter())
        .filter(|(label, p)| (predicted_label(**p) == 1) == **label)
        .count();
    Some(correct as f64 / labels.len() as f64)
}
