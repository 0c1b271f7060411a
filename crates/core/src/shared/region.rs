use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Axis-aligned box stored as `xmin, xmax, ymin, ymax`.
///
/// Coordinates are either normalized to `[0, 1]` or absolute pixels,
/// depending on the caller. Geometry methods assume a normalized region
/// (`xmin <= xmax`, `ymin <= ymax`); call [`Region::normalized`] on
/// untrusted input first.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(deserialize_with = "coordinate")]
    pub xmin: f64,
    #[serde(deserialize_with = "coordinate")]
    pub xmax: f64,
    #[serde(deserialize_with = "coordinate")]
    pub ymin: f64,
    #[serde(deserialize_with = "coordinate")]
    pub ymax: f64,
}

impl Region {
    pub fn new(xmin: f64, xmax: f64, ymin: f64, ymax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// Reorders each axis so that min <= max.
    pub fn normalized(&self) -> Self {
        Self {
            xmin: self.xmin.min(self.xmax),
            xmax: self.xmin.max(self.xmax),
            ymin: self.ymin.min(self.ymax),
            ymax: self.ymin.max(self.ymax),
        }
    }

    pub fn width(&self) -> f64 {
        (self.xmax - self.xmin).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.ymax - self.ymin).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when the projections intersect on both axes. Touching edges
    /// count as overlapping.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.xmin <= other.xmax
            && other.xmin <= self.xmax
            && self.ymin <= other.ymax
            && other.ymin <= self.ymax
    }

    /// Smallest region containing both inputs.
    pub fn union(&self, other: &Region) -> Region {
        Region {
            xmin: self.xmin.min(other.xmin),
            xmax: self.xmax.max(other.xmax),
            ymin: self.ymin.min(other.ymin),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// Shared area of both regions, or `None` when they do not overlap.
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Region {
            xmin: self.xmin.max(other.xmin),
            xmax: self.xmax.min(other.xmax),
            ymin: self.ymin.max(other.ymin),
            ymax: self.ymax.min(other.ymax),
        })
    }

    /// Intersection over union.
    ///
    /// Returns 0.0 when the union has no area (two degenerate boxes), so
    /// callers never divide by zero.
    pub fn iou(&self, other: &Region) -> f64 {
        let inter = self.intersection(other).map_or(0.0, |r| r.area());
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }

    /// Scales normalized coordinates to pixel space.
    pub fn denormalize(&self, width: u32, height: u32) -> Region {
        let (w, h) = (width as f64, height as f64);
        Region {
            xmin: self.xmin * w,
            xmax: self.xmax * w,
            ymin: self.ymin * h,
            ymax: self.ymax * h,
        }
    }

    /// The `region` object of a `Box` annotation.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("xmin".to_string(), Value::from(self.xmin));
        map.insert("xmax".to_string(), Value::from(self.xmax));
        map.insert("ymin".to_string(), Value::from(self.ymin));
        map.insert("ymax".to_string(), Value::from(self.ymax));
        Value::Object(map)
    }
}

/// Accepts a coordinate written either as a JSON number or a numeric string.
fn coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}
