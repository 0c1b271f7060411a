use thiserror::Error;

use crate::grouping::domain::axle_grouper::AxleGrouper;
use crate::shared::annotation::{Annotation, AnnotationDocument, ImageRecord, RegionError};
use crate::shared::constants::{GROUPED_AXLES_TAG, SINGLE_AXLE_TAG};
use crate::shared::region::Region;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("single_axle annotation {index} of {location}: {source}")]
    InvalidAxle {
        location: String,
        index: usize,
        #[source]
        source: RegionError,
    },
}

/// Rewrites the single-axle annotations of every image into axle-tree areas.
///
/// Annotations tagged exactly `["single_axle"]` are replaced by the
/// grouper's output: one `single_axle` box per isolated axle, then one
/// `grouped_axles` box per cluster. Every other annotation keeps its
/// position and content, whatever its region shape; only the single-axle
/// regions are read as boxes.
pub struct AxleTreeMerger {
    grouper: AxleGrouper,
}

impl AxleTreeMerger {
    pub fn new(grouper: AxleGrouper) -> Self {
        Self { grouper }
    }

    pub fn merge(
        &self,
        mut document: AnnotationDocument,
    ) -> Result<AnnotationDocument, MergeError> {
        for image in &mut document.images {
            self.merge_image(image)?;
        }
        Ok(document)
    }

    fn merge_image(&self, image: &mut ImageRecord) -> Result<(), MergeError> {
        let mut boxes: Vec<Region> = Vec::new();
        let mut others: Vec<Annotation> = Vec::new();
        for (index, annotation) in std::mem::take(&mut image.annotated_regions)
            .into_iter()
            .enumerate()
        {
            if !annotation.has_only_tag(SINGLE_AXLE_TAG) {
                others.push(annotation);
                continue;
            }
            let region = annotation
                .bounding_box()
                .map_err(|source| MergeError::InvalidAxle {
                    location: image.location.clone(),
                    index,
                    source,
                })?;
            boxes.push(region);
        }

        let groups = self.grouper.group(&boxes);
        log::debug!(
            "{}: {} single axle(s) -> {} single, {} grouped",
            image.location,
            boxes.len(),
            groups.single_axle.len(),
            groups.grouped_axles.len()
        );

        image.annotated_regions = others;
        image.annotated_regions.extend(
            groups
                .single_axle
                .into_iter()
                .map(|r| Annotation::tagged_box(SINGLE_AXLE_TAG, r)),
        );
        image.annotated_regions.extend(
            groups
                .grouped_axles
                .into_iter()
                .map(|r| Annotation::tagged_box(GROUPED_AXLES_TAG, r)),
        );
        Ok(())
    }
}

impl Default for AxleTreeMerger {
    fn default() -> Self {
        Self::new(AxleGrouper::new())
    }
}
