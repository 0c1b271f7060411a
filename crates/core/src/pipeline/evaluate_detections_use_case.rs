use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::evaluation::domain::detection_matcher::{DetectionMatcher, MatchCounts};
use crate::evaluation::domain::paired_dataset::{pair_datasets, EvaluationError, PairedImage};
use crate::evaluation::domain::threshold_sweep::{MetricPoint, SweepMode, ThresholdSweep};
use crate::io::domain::annotation_renderer::AnnotationRenderer;
use crate::io::domain::annotation_store::AnnotationStore;
use crate::shared::constants::{DEFAULT_IOU_MIN, DEFAULT_REPORT_THRESHOLD, DEFAULT_THRESHOLD_COUNT};

pub const TRUTH_RENDER_SUFFIX: &str = "truth";
pub const PREDICTION_RENDER_SUFFIX: &str = "prediction";

/// Which sweep implementation produces the curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvaluationMode {
    Naive,
    Optimized,
    /// Runs both, logs their durations, and fails if the curves differ.
    Compare,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluationSettings {
    pub iou_min: f64,
    pub threshold_count: usize,
    /// Score threshold for the per-image counts.
    pub report_threshold: f64,
    pub mode: EvaluationMode,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            iou_min: DEFAULT_IOU_MIN,
            threshold_count: DEFAULT_THRESHOLD_COUNT,
            report_threshold: DEFAULT_REPORT_THRESHOLD,
            mode: EvaluationMode::Optimized,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageReport {
    pub location: String,
    #[serde(flatten)]
    pub counts: MatchCounts,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub report_threshold: f64,
    pub images: Vec<ImageReport>,
    pub curve: Vec<MetricPoint>,
}

/// Evaluation pipeline: load both datasets → (render) → pair → per-image
/// counts → precision/recall sweep.
pub struct EvaluateDetectionsUseCase {
    store: Box<dyn AnnotationStore>,
    renderer: Option<Box<dyn AnnotationRenderer>>,
    settings: EvaluationSettings,
}

impl EvaluateDetectionsUseCase {
    pub fn new(
        store: Box<dyn AnnotationStore>,
        renderer: Option<Box<dyn AnnotationRenderer>>,
        settings: EvaluationSettings,
    ) -> Self {
        Self {
            store,
            renderer,
            settings,
        }
    }

    pub fn execute(
        &self,
        ground_truth_path: &Path,
        predictions_path: &Path,
    ) -> Result<EvaluationReport, Box<dyn std::error::Error>> {
        let ground_truth = self.store.load(ground_truth_path)?;
        let predictions = self.store.load(predictions_path)?;

        if let Some(renderer) = &self.renderer {
            renderer.render(&ground_truth, TRUTH_RENDER_SUFFIX)?;
            renderer.render(&predictions, PREDICTION_RENDER_SUFFIX)?;
        }

        let images = pair_datasets(&ground_truth, &predictions)?;
        let matcher = DetectionMatcher::new(self.settings.iou_min);
        let sweep = ThresholdSweep::new(matcher, self.settings.threshold_count)?;

        let reports = self.image_reports(&matcher, &images);
        let curve = self.curve(&sweep, &images)?;

        Ok(EvaluationReport {
            report_threshold: self.settings.report_threshold,
            images: reports,
            curve,
        })
    }

    fn image_reports(&self, matcher: &DetectionMatcher, images: &[PairedImage]) -> Vec<ImageReport> {
        images
            .iter()
            .map(|img| {
                let counts = matcher.match_image(
                    &img.truths,
                    &img.predictions,
                    self.settings.report_threshold,
                );
                log::info!(
                    "{}: TP={} FN={} FP={}",
                    img.location,
                    counts.true_positives,
                    counts.false_negatives,
                    counts.false_positives
                );
                ImageReport {
                    location: img.location.clone(),
                    counts,
                }
            })
            .collect()
    }

    fn curve(
        &self,
        sweep: &ThresholdSweep,
        images: &[PairedImage],
    ) -> Result<Vec<MetricPoint>, EvaluationError> {
        match self.settings.mode {
            EvaluationMode::Naive => Ok(timed(sweep, images, SweepMode::Naive)),
            EvaluationMode::Optimized => Ok(timed(sweep, images, SweepMode::Optimized)),
            EvaluationMode::Compare => {
                let naive = timed(sweep, images, SweepMode::Naive);
                let optimized = timed(sweep, images, SweepMode::Optimized);
                if let Some((expected, _)) = naive
                    .iter()
                    .zip(&optimized)
                    .find(|(a, b)| a != b)
                {
                    return Err(EvaluationError::CurveMismatch {
                        threshold: expected.threshold,
                    });
                }
                Ok(optimized)
            }
        }
    }
}

fn timed(sweep: &ThresholdSweep, images: &[PairedImage], mode: SweepMode) -> Vec<MetricPoint> {
    let start = Instant::now();
    let points = sweep.run(images, mode);
    log::info!(
        "{mode:?} sweep over {} threshold(s) computed in {:.2}ms",
        sweep.threshold_count(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    points
}
