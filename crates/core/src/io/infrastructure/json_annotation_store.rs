use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::io::domain::annotation_store::AnnotationStore;
use crate::shared::annotation::AnnotationDocument;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path} as an annotation document: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialize annotation document: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("serialized annotation document is not UTF-8: {0}")]
    Utf8(#[source] std::string::FromUtf8Error),
}

/// Reads and writes annotation documents as JSON files.
pub struct JsonAnnotationStore;

impl JsonAnnotationStore {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<AnnotationDocument, DocumentError> {
        let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| DocumentError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, document: &AnnotationDocument, path: &Path) -> Result<(), DocumentError> {
        let json = serde_json::to_string(document).map_err(DocumentError::Serialize)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| DocumentError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, json).map_err(|source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for JsonAnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore for JsonAnnotationStore {
    fn load(&self, path: &Path) -> Result<AnnotationDocument, Box<dyn std::error::Error>> {
        let document = self.read(path)?;
        log::info!(
            "Loaded {} image record(s) from {}",
            document.images.len(),
            path.display()
        );
        Ok(document)
    }

    fn save(
        &self,
        document: &AnnotationDocument,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.write(document, path)?;
        log::info!("Saved annotations to {}", path.display());
        Ok(())
    }
}

/// Four-space indented rendering with keys sorted, for reading a document
/// on a terminal.
pub fn to_pretty_json(document: &AnnotationDocument) -> Result<String, DocumentError> {
    let value = serde_json::to_value(document).map_err(DocumentError::Serialize)?;
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .map_err(DocumentError::Serialize)?;
    String::from_utf8(buffer).map_err(DocumentError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::annotation::{Annotation, ImageRecord};
    use crate::shared::region::Region;

    fn sample() -> AnnotationDocument {
        AnnotationDocument::new(vec![ImageRecord::new(
            "img/0001.jpg",
            vec![Annotation::tagged_box("car", Region::new(0.1, 0.2, 0.3, 0.4)).with_score(0.8)],
        )])
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("annotations.json");
        let store = JsonAnnotationStore::new();
        store.write(&sample(), &path).unwrap();
        assert_eq!(store.read(&path).unwrap(), sample());
    }

    #[test]
    fn test_trait_load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let store: Box<dyn AnnotationStore> = Box::new(JsonAnnotationStore::new());
        store.save(&sample(), &path).unwrap();
        assert_eq!(store.load(&path).unwrap().images.len(), 1);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = JsonAnnotationStore::new()
            .read(Path::new("/nonexistent/annotations.json"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/annotations.json"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"images\": [").unwrap();
        let err = JsonAnnotationStore::new().read(&path).unwrap_err();
        assert!(matches!(err, DocumentError::Parse { .. }));
    }

    #[test]
    fn test_pretty_json_sorts_keys() {
        let pretty = to_pretty_json(&sample()).unwrap();
        assert!(pretty.contains('\n'));
        let region_type = pretty.find("\"region_type\"").unwrap();
        let score = pretty.find("\"score\"").unwrap();
        let tags = pretty.find("\"tags\"").unwrap();
        assert!(region_type < score && score < tags);
    }

    #[test]
    fn test_pretty_json_indents_four_spaces() {
        let pretty = to_pretty_json(&sample()).unwrap();
        assert!(pretty.starts_with("{\n    \"images\": [\n        {"));
        assert!(!pretty.contains("\n  \"images\""));
        let parsed: AnnotationDocument = serde_json::from_str(&pretty).unwrap();
        assert_eq!(parsed, sample());
    }
}
