use std::path::Path;

use crate::shared::annotation::AnnotationDocument;

/// Loads and saves annotation documents.
pub trait AnnotationStore: Send {
    fn load(&self, path: &Path) -> Result<AnnotationDocument, Box<dyn std::error::Error>>;

    fn save(
        &self,
        document: &AnnotationDocument,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
