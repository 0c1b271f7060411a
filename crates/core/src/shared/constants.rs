pub const SINGLE_AXLE_TAG: &str = "single_axle";
pub const GROUPED_AXLES_TAG: &str = "grouped_axles";

/// The only region shape the tooling understands.
pub const BOX_REGION_TYPE: &str = "Box";

/// Minimum IoU for a prediction to be accepted as a match.
pub const DEFAULT_IOU_MIN: f64 = 0.5;

/// Number of score thresholds sampled over `[0, 1)`.
pub const DEFAULT_THRESHOLD_COUNT: usize = 10;

/// Score threshold used for the per-image TP/FN/FP report.
pub const DEFAULT_REPORT_THRESHOLD: f64 = 0.2;

pub const ANNOTATED_SUFFIX_MARKER: &str = "_annotated_";

/// Outline width in pixels when drawing boxes.
pub const OUTLINE_WIDTH: u32 = 2;

/// Built-in category colors (RGB).
pub const DEFAULT_PALETTE: &[(&str, [u8; 3])] = &[
    (SINGLE_AXLE_TAG, [0, 128, 0]),
    (GROUPED_AXLES_TAG, [128, 0, 128]),
    ("car", [255, 0, 0]),
    ("other", [128, 128, 128]),
];
