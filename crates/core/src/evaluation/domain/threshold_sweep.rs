use serde::{Deserialize, Serialize};

use crate::evaluation::domain::detection_matcher::{DetectionMatcher, MatchCounts};
use crate::evaluation::domain::paired_dataset::{EvaluationError, PairedImage};

/// Precision and recall at one score threshold.
///
/// A ratio whose denominator is zero is `None` (JSON `null`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub threshold: f64,
}

impl MetricPoint {
    fn from_counts(threshold: f64, counts: MatchCounts) -> Self {
        Self {
            precision: counts.precision(),
            recall: counts.recall(),
            threshold,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepMode {
    /// Evaluate every threshold.
    Naive,
    /// Skip thresholds below the lowest prediction score and reuse the
    /// first evaluated result for them.
    Optimized,
}

/// Traces a precision/recall curve over thresholds `k / N`, `k = 0..N`.
///
/// Counts are summed over the whole dataset before computing the ratios.
/// Both modes return the same points in ascending threshold order.
pub struct ThresholdSweep {
    matcher: DetectionMatcher,
    threshold_count: usize,
}

impl ThresholdSweep {
    pub fn new(matcher: DetectionMatcher, threshold_count: usize) -> Result<Self, EvaluationError> {
        if threshold_count == 0 {
            return Err(EvaluationError::ZeroThresholdCount);
        }
        Ok(Self {
            matcher,
            threshold_count,
        })
    }

    pub fn threshold_count(&self) -> usize {
        self.threshold_count
    }

    pub fn threshold(&self, k: usize) -> f64 {
        k as f64 / self.threshold_count as f64
    }

    pub fn run(&self, images: &[PairedImage], mode: SweepMode) -> Vec<MetricPoint> {
        let first = match mode {
            SweepMode::Naive => 0,
            SweepMode::Optimized => self.first_informative_index(min_score(images)),
        };

        let evaluated: Vec<MetricPoint> = (first..self.threshold_count)
            .map(|k| {
                let threshold = self.threshold(k);
                let counts = self.counts_at(images, threshold);
                log::debug!("threshold {threshold:.3}: {counts:?}");
                MetricPoint::from_counts(threshold, counts)
            })
            .collect();

        if first == 0 {
            return evaluated;
        }
        log::debug!("Skipped {first} threshold(s) below the lowest score");

        // Below `first` no prediction is filtered, so the counts match `first`.
        let lowest = evaluated[0];
        let mut points: Vec<MetricPoint> = (0..first)
            .map(|k| MetricPoint {
                threshold: self.threshold(k),
                ..lowest
            })
            .collect();
        points.extend(evaluated);
        points
    }

    /// Dataset-wide counts at a single threshold.
    pub fn counts_at(&self, images: &[PairedImage], threshold: f64) -> MatchCounts {
        images
            .iter()
            .map(|img| {
                self.matcher
                    .match_image(&img.truths, &img.predictions, threshold)
            })
            .sum()
    }

    /// Index of the first threshold that has to be evaluated.
    ///
    /// Every threshold `k / N` with `k <= floor(min_score * N) - 1` lies
    /// strictly below the lowest score, so none of them filters anything
    /// out. The returned index is the last of those, or 0.
    pub fn first_informative_index(&self, min_score: Option<f64>) -> usize {
        let Some(score) = min_score else {
            return 0;
        };
        let k = (score * self.threshold_count as f64).floor() - 1.0;
        if k.is_nan() || k <= 0.0 {
            return 0;
        }
        (k as usize).min(self.threshold_count - 1)
    }
}

fn min_score(images: &[PairedImage]) -> Option<f64> {
    images
        .iter()
        .filter_map(PairedImage::min_score)
        .reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::domain::detection_matcher::ScoredRegion;
    use crate::shared::region::Region;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn region(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Region {
        Region::new(xmin, xmax, ymin, ymax)
    }

    fn image(truths: Vec<Region>, predictions: Vec<(Region, f64)>) -> PairedImage {
        PairedImage {
            location: "img.jpg".to_string(),
            truths,
            predictions: predictions
                .into_iter()
                .map(|(r, s)| ScoredRegion::new(r, s))
                .collect(),
        }
    }

    fn sweep(n: usize) -> ThresholdSweep {
        ThresholdSweep::new(DetectionMatcher::default(), n).unwrap()
    }

    /// Three images mixing hits, misses, and spurious predictions.
    fn dataset(lowest_score: f64) -> Vec<PairedImage> {
        let unit = region(0.0, 1.0, 0.0, 1.0);
        let other = region(2.0, 3.0, 2.0, 3.0);
        vec![
            image(
                vec![unit, other],
                vec![(unit, 0.92), (other, 0.55), (region(5.0, 6.0, 5.0, 6.0), 0.71)],
            ),
            image(vec![unit], vec![(region(0.05, 1.0, 0.0, 1.0), lowest_score)]),
            image(
                vec![other],
                vec![(region(8.0, 9.0, 8.0, 9.0), 0.38), (other, 0.64)],
            ),
        ]
    }

    #[test]
    fn test_zero_threshold_count_is_rejected() {
        assert!(matches!(
            ThresholdSweep::new(DetectionMatcher::default(), 0),
            Err(EvaluationError::ZeroThresholdCount)
        ));
    }

    #[test]
    fn test_naive_thresholds_ascending() {
        let points = sweep(4).run(&dataset(0.3), SweepMode::Naive);
        let thresholds: Vec<f64> = points.iter().map(|p| p.threshold).collect();
        assert_eq!(thresholds, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_naive_values() {
        let points = sweep(2).run(&dataset(0.3), SweepMode::Naive);
        // t=0: TP 4, FN 0, FP 2
        assert_relative_eq!(points[0].precision.unwrap(), 4.0 / 6.0);
        assert_relative_eq!(points[0].recall.unwrap(), 1.0);
        // t=0.5: survivors 0.92, 0.55, 0.71, 0.64 -> TP 3, FN 1, FP 1
        assert_relative_eq!(points[1].precision.unwrap(), 3.0 / 4.0);
        assert_relative_eq!(points[1].recall.unwrap(), 3.0 / 4.0);
    }

    #[rstest]
    fn test_modes_agree(
        #[values(1, 2, 3, 7, 10, 20, 33, 100)] n: usize,
        #[values(0.01, 0.1, 0.3, 0.5, 0.55)] lowest_score: f64,
    ) {
        let images = dataset(lowest_score);
        let s = sweep(n);
        let naive = s.run(&images, SweepMode::Naive);
        let optimized = s.run(&images, SweepMode::Optimized);
        assert_eq!(naive.len(), n);
        assert_eq!(naive, optimized);
    }

    #[rstest]
    #[case::exact_multiple(0.3, 10)]
    #[case::score_one(1.0, 4)]
    #[case::all_high(0.95, 10)]
    fn test_modes_agree_at_score_boundaries(#[case] score: f64, #[case] n: usize) {
        let unit = region(0.0, 1.0, 0.0, 1.0);
        let images = vec![image(vec![unit], vec![(unit, score)])];
        let s = sweep(n);
        assert_eq!(
            s.run(&images, SweepMode::Naive),
            s.run(&images, SweepMode::Optimized)
        );
    }

    #[test]
    fn test_recall_non_increasing() {
        let points = sweep(50).run(&dataset(0.3), SweepMode::Optimized);
        for pair in points.windows(2) {
            assert!(pair[1].recall.unwrap() <= pair[0].recall.unwrap());
        }
    }

    #[test]
    fn test_no_predictions_gives_undefined_precision() {
        let images = vec![image(vec![region(0.0, 1.0, 0.0, 1.0)], vec![])];
        let points = sweep(3).run(&images, SweepMode::Optimized);
        assert_eq!(points.len(), 3);
        for p in points {
            assert_eq!(p.precision, None);
            assert_eq!(p.recall, Some(0.0));
        }
    }

    #[test]
    fn test_no_ground_truth_gives_undefined_recall() {
        let images = vec![image(vec![], vec![(region(0.0, 1.0, 0.0, 1.0), 0.8)])];
        let points = sweep(2).run(&images, SweepMode::Naive);
        assert_eq!(points[0].recall, None);
        assert_eq!(points[0].precision, Some(0.0));
    }

    #[test]
    fn test_empty_dataset() {
        let points = sweep(5).run(&[], SweepMode::Optimized);
        assert_eq!(points.len(), 5);
        assert!(points.iter().all(|p| p.precision.is_none() && p.recall.is_none()));
    }

    #[rstest]
    #[case::none(None, 10, 0)]
    #[case::tiny(Some(0.05), 10, 0)]
    #[case::just_above_first_step(Some(0.15), 10, 0)]
    #[case::mid(Some(0.57), 10, 4)]
    #[case::exact_step(Some(0.3), 10, 2)]
    #[case::top(Some(1.0), 10, 9)]
    #[case::above_one(Some(3.0), 10, 9)]
    #[case::single_bucket(Some(0.9), 1, 0)]
    fn test_first_informative_index(
        #[case] score: Option<f64>,
        #[case] n: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(sweep(n).first_informative_index(score), expected);
    }

    #[test]
    fn test_metric_point_serializes_undefined_as_null() {
        let p = MetricPoint {
            precision: None,
            recall: Some(0.5),
            threshold: 0.1,
        };
        let json = serde_json::to_value(p).unwrap();
        assert!(json["precision"].is_null());
        assert_eq!(json["recall"], 0.5);
    }
}
