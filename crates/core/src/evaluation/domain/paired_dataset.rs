use thiserror::Error;

use crate::evaluation::domain::detection_matcher::ScoredRegion;
use crate::shared::annotation::{Annotation, AnnotationDocument, ImageRecord};
use crate::shared::region::Region;

#[derive(Error, Debug, PartialEq)]
pub enum EvaluationError {
    #[error("dataset length mismatch: {ground_truth} ground-truth images vs {predictions} prediction images")]
    DatasetLengthMismatch {
        ground_truth: usize,
        predictions: usize,
    },
    #[error("prediction {index} of {location} has no score")]
    MissingScore { location: String, index: usize },
    #[error("annotation {index} of {location} has no usable box: {reason}")]
    InvalidRegion {
        location: String,
        index: usize,
        reason: String,
    },
    #[error("threshold count must be at least 1")]
    ZeroThresholdCount,
    #[error("naive and optimized sweeps disagree at threshold {threshold}")]
    CurveMismatch { threshold: f64 },
}

/// Ground truth and predictions of one image, ready for matching.
#[derive(Clone, Debug, PartialEq)]
pub struct PairedImage {
    pub location: String,
    pub truths: Vec<Region>,
    pub predictions: Vec<ScoredRegion>,
}

impl PairedImage {
    pub fn min_score(&self) -> Option<f64> {
        self.predictions.iter().map(|p| p.score).reduce(f64::min)
    }
}

/// Zips ground truth with predictions by position.
///
/// Images are not matched by location; both documents must list the same
/// images in the same order.
pub fn pair_datasets(
    ground_truth: &AnnotationDocument,
    predictions: &AnnotationDocument,
) -> Result<Vec<PairedImage>, EvaluationError> {
    if ground_truth.images.len() != predictions.images.len() {
        return Err(EvaluationError::DatasetLengthMismatch {
            ground_truth: ground_truth.images.len(),
            predictions: predictions.images.len(),
        });
    }

    ground_truth
        .images
        .iter()
        .zip(&predictions.images)
        .map(|(truth, predicted)| -> Result<PairedImage, EvaluationError> {
            Ok(PairedImage {
                location: truth.location.clone(),
                truths: truth
                    .annotated_regions
                    .iter()
                    .enumerate()
                    .map(|(index, a)| box_of(truth, index, a))
                    .collect::<Result<_, _>>()?,
                predictions: scored_regions(predicted)?,
            })
        })
        .collect()
}

fn scored_regions(image: &ImageRecord) -> Result<Vec<ScoredRegion>, EvaluationError> {
    image
        .annotated_regions
        .iter()
        .enumerate()
        .map(|(index, a)| {
            let score = a.score.ok_or_else(|| EvaluationError::MissingScore {
                location: image.location.clone(),
                index,
            })?;
            Ok(ScoredRegion::new(box_of(image, index, a)?, score))
        })
        .collect()
}

/// Every annotation takes part in matching, whatever its tag or region
/// type, so each one must carry box coordinates.
fn box_of(
    image: &ImageRecord,
    index: usize,
    a: &Annotation,
) -> Result<Region, EvaluationError> {
    a.bounding_box()
        .map(|r| r.normalized())
        .map_err(|e| EvaluationError::InvalidRegion {
            location: image.location.clone(),
            index,
            reason: e.to_string(),
        })
}
