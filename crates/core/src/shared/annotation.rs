use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::shared::constants::BOX_REGION_TYPE;
use crate::shared::region::Region;

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("annotation has no region")]
    Missing,
    #[error("region is not a box with xmin/xmax/ymin/ymax: {0}")]
    Malformed(#[source] serde_json::Error),
}

/// One labelled region of an image. Predictions additionally carry a score.
///
/// Only the keys this crate acts on are typed, and all of them are
/// optional: the region stays raw JSON until a box is asked for, so
/// polygons, untagged entries and unknown keys (kept in `extra`) pass
/// through a load/save cycle unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    /// A `Box` annotation with a single tag.
    pub fn tagged_box(tag: &str, region: Region) -> Self {
        Self {
            tags: Some(vec![tag.to_string()]),
            region_type: Some(BOX_REGION_TYPE.to_string()),
            region: Some(region.to_json()),
            score: None,
            extra: Map::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Semantic category, taken from the first tag.
    pub fn category(&self) -> Option<&str> {
        self.tags.as_deref()?.first().map(String::as_str)
    }

    pub fn is_box(&self) -> bool {
        self.region_type.as_deref() == Some(BOX_REGION_TYPE)
    }

    /// True when the tags are exactly `[tag]`.
    pub fn has_only_tag(&self, tag: &str) -> bool {
        matches!(self.tags.as_deref(), Some([only]) if only == tag)
    }

    /// Parses the region as an axis-aligned box.
    pub fn bounding_box(&self) -> Result<Region, RegionError> {
        let raw = self.region.as_ref().ok_or(RegionError::Missing)?;
        Region::deserialize(raw).map_err(RegionError::Malformed)
    }
}

/// An image file and the annotations drawn on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub location: String,
    #[serde(default)]
    pub annotated_regions: Vec<Annotation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageRecord {
    pub fn new(location: impl Into<String>, annotated_regions: Vec<Annotation>) -> Self {
        Self {
            location: location.into(),
            annotated_regions,
            extra: Map::new(),
        }
    }
}

/// Top-level annotation file: an ordered list of image records.
///
/// Ground-truth and prediction documents are paired by position.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDocument {
    pub images: Vec<ImageRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnnotationDocument {
    pub fn new(images: Vec<ImageRecord>) -> Self {
        Self {
            images,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DOCUMENT: &str = r#"{
        "images": [{
            "location": "img/0001.jpg",
            "camera": "north",
            "annotated_regions": [
                {"tags": ["single_axle"], "region_type": "Box",
                 "region": {"xmin": 0.1, "xmax": 0.2, "ymin": 0.3, "ymax": "0.4"}},
                {"tags": ["car", "blue"], "region_type": "Box", "score": 0.75,
                 "region": {"xmin": 0, "xmax": 1, "ymin": 0, "ymax": 1},
                 "reviewer": "kim"},
                {"tags": ["other"], "region_type": "Polygon",
                 "region": {"points": [[0.1, 0.1], [0.2, 0.1], [0.15, 0.3]]}},
                {"region_type": "Box", "comment": "unlabelled"}
            ]
        }]
    }"#;

    fn parsed() -> AnnotationDocument {
        serde_json::from_str(DOCUMENT).unwrap()
    }

    #[test]
    fn test_parse_document() {
        let doc = parsed();
        assert_eq!(doc.images.len(), 1);
        let img = &doc.images[0];
        assert_eq!(img.location, "img/0001.jpg");
        assert_eq!(img.annotated_regions.len(), 4);
        assert_eq!(img.annotated_regions[0].category(), Some("single_axle"));
        assert_relative_eq!(img.annotated_regions[0].bounding_box().unwrap().ymax, 0.4);
        assert_eq!(img.annotated_regions[1].score, Some(0.75));
    }

    #[test]
    fn test_polygon_and_untagged_annotations_parse() {
        let doc = parsed();
        let polygon = &doc.images[0].annotated_regions[2];
        assert!(!polygon.is_box());
        assert!(matches!(
            polygon.bounding_box(),
            Err(RegionError::Malformed(_))
        ));

        let untagged = &doc.images[0].annotated_regions[3];
        assert_eq!(untagged.category(), None);
        assert!(!untagged.has_only_tag("single_axle"));
        assert!(matches!(untagged.bounding_box(), Err(RegionError::Missing)));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let original: Value = serde_json::from_str(DOCUMENT).unwrap();
        let json = serde_json::to_value(parsed()).unwrap();
        assert_eq!(json["images"][0]["camera"], "north");
        assert_eq!(json["images"][0]["annotated_regions"][1]["reviewer"], "kim");
        assert!(json["images"][0]["annotated_regions"][0].get("score").is_none());
        assert_eq!(
            json["images"][0]["annotated_regions"][2],
            original["images"][0]["annotated_regions"][2]
        );
        assert_eq!(
            json["images"][0]["annotated_regions"][3],
            original["images"][0]["annotated_regions"][3]
        );
    }

    #[test]
    fn test_has_only_tag() {
        let doc = parsed();
        let regions = &doc.images[0].annotated_regions;
        assert!(regions[0].has_only_tag("single_axle"));
        assert!(!regions[1].has_only_tag("car"));
    }

    #[test]
    fn test_tagged_box_round_trips_region() {
        let region = Region::new(0.2, 0.3, 0.4, 0.5);
        let annotation = Annotation::tagged_box("car", region);
        assert!(annotation.is_box());
        assert_eq!(annotation.bounding_box().unwrap(), region);
    }

    #[test]
    fn test_missing_images_key_is_rejected() {
        assert!(serde_json::from_str::<AnnotationDocument>(r#"{"pictures": []}"#).is_err());
    }
}
