use std::path::Path;

use crate::grouping::domain::axle_tree_merger::AxleTreeMerger;
use crate::io::domain::annotation_renderer::AnnotationRenderer;
use crate::io::domain::annotation_store::AnnotationStore;
use crate::shared::annotation::AnnotationDocument;

pub const INPUT_RENDER_SUFFIX: &str = "default";
pub const OUTPUT_RENDER_SUFFIX: &str = "merged";

/// Axle-tree pipeline: load → (render) → merge → save → (render).
pub struct MergeAxleTreesUseCase {
    store: Box<dyn AnnotationStore>,
    renderer: Option<Box<dyn AnnotationRenderer>>,
    merger: AxleTreeMerger,
}

impl MergeAxleTreesUseCase {
    pub fn new(
        store: Box<dyn AnnotationStore>,
        renderer: Option<Box<dyn AnnotationRenderer>>,
        merger: AxleTreeMerger,
    ) -> Self {
        Self {
            store,
            renderer,
            merger,
        }
    }

    /// Merges the annotations at `input`, writes them to `output`, and
    /// returns the merged document.
    pub fn execute(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<AnnotationDocument, Box<dyn std::error::Error>> {
        let document = self.store.load(input)?;
        if let Some(renderer) = &self.renderer {
            renderer.render(&document, INPUT_RENDER_SUFFIX)?;
        }

        let merged = self.merger.merge(document)?;
        self.store.save(&merged, output)?;

        if let Some(renderer) = &self.renderer {
            renderer.render(&merged, OUTPUT_RENDER_SUFFIX)?;
        }
        Ok(merged)
    }
}
