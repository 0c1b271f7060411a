use std::path::PathBuf;

use crate::shared::annotation::AnnotationDocument;

/// Draws a document's boxes onto copies of the images it references.
pub trait AnnotationRenderer: Send {
    /// Renders every image record and returns the paths written, in order.
    ///
    /// `suffix` distinguishes the rendered copy from the original file.
    fn render(
        &self,
        document: &AnnotationDocument,
        suffix: &str,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>;
}
