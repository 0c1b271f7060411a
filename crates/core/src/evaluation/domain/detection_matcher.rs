use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::shared::constants::DEFAULT_IOU_MIN;
use crate::shared::region::Region;

/// A predicted box and the detector's confidence in it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredRegion {
    pub region: Region,
    pub score: f64,
}

impl ScoredRegion {
    pub fn new(region: Region, score: f64) -> Self {
        Self { region, score }
    }
}

/// Detection outcome counts for one image or a whole dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    pub true_positives: usize,
    pub false_negatives: usize,
    pub false_positives: usize,
}

impl MatchCounts {
    /// `TP / (TP + FP)`, or `None` when nothing was predicted.
    pub fn precision(&self) -> Option<f64> {
        ratio(
            self.true_positives,
            self.true_positives + self.false_positives,
        )
    }

    /// `TP / (TP + FN)`, or `None` when there is no ground truth.
    pub fn recall(&self) -> Option<f64> {
        ratio(
            self.true_positives,
            self.true_positives + self.false_negatives,
        )
    }
}

impl AddAssign for MatchCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.true_positives += rhs.true_positives;
        self.false_negatives += rhs.false_negatives;
        self.false_positives += rhs.false_positives;
    }
}

impl std::iter::Sum for MatchCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, c| {
            acc += c;
            acc
        })
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

/// Greedy one-to-one assignment of predictions to ground-truth boxes.
///
/// Ground-truth boxes are visited in input order. Each takes the remaining
/// prediction with the highest IoU at or above `iou_min` (first one wins on
/// ties), and that prediction leaves the pool. This is deliberately not an
/// optimal bipartite matching: results depend on ground-truth order.
#[derive(Clone, Copy, Debug)]
pub struct DetectionMatcher {
    iou_min: f64,
}

impl DetectionMatcher {
    pub fn new(iou_min: f64) -> Self {
        Self { iou_min }
    }

    /// Counts TP/FN/FP for predictions scoring strictly above `threshold`.
    pub fn match_image(
        &self,
        truths: &[Region],
        predictions: &[ScoredRegion],
        threshold: f64,
    ) -> MatchCounts {
        let survivors: Vec<&Region> = predictions
            .iter()
            .filter(|p| p.score > threshold)
            .map(|p| &p.region)
            .collect();
        let mut taken = vec![false; survivors.len()];
        let mut counts = MatchCounts::default();

        for truth in truths {
            let mut best: Option<(usize, f64)> = None;
            for (i, candidate) in survivors.iter().enumerate() {
                if taken[i] {
                    continue;
                }
                let iou = candidate.iou(truth);
                if iou >= self.iou_min && best.map_or(true, |(_, best_iou)| iou > best_iou) {
                    best = Some((i, iou));
                }
            }
            match best {
                Some((i, _)) => {
                    taken[i] = true;
                    counts.true_positives += 1;
                }
                None => counts.false_negatives += 1,
            }
        }

        counts.false_positives = taken.iter().filter(|t| !**t).count();
        counts
    }
}

impl Default for DetectionMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_IOU_MIN)
    }
}
