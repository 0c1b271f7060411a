use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use thiserror::Error;

use crate::io::domain::annotation_renderer::AnnotationRenderer;
use crate::io::infrastructure::palette::Palette;
use crate::shared::annotation::{AnnotationDocument, ImageRecord, RegionError};
use crate::shared::constants::{ANNOTATED_SUFFIX_MARKER, OUTLINE_WIDTH};
use crate::shared::region::Region;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("could not open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not save image {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no color defined for category '{category}' in {location}")]
    UnknownCategory { category: String, location: String },
    #[error("annotation without tags in {location}")]
    Untagged { location: String },
    #[error("unreadable box in {location}: {source}")]
    InvalidRegion {
        location: String,
        #[source]
        source: RegionError,
    },
}

/// Draws box outlines with the `image` and `imageproc` crates.
///
/// Region coordinates are treated as normalized and scaled by the image
/// size. The rendered copy is written next to the original as
/// `<stem>_annotated_<suffix>.<ext>`.
pub struct ImageAnnotationRenderer {
    palette: Palette,
    outline_width: u32,
}

impl ImageAnnotationRenderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            outline_width: OUTLINE_WIDTH,
        }
    }

    pub fn with_outline_width(mut self, width: u32) -> Self {
        self.outline_width = width.max(1);
        self
    }

    fn render_image(&self, record: &ImageRecord, suffix: &str) -> Result<PathBuf, RenderError> {
        let source = Path::new(&record.location);
        let mut canvas = image::open(source)
            .map_err(|e| RenderError::Open {
                path: source.to_path_buf(),
                source: e,
            })?
            .to_rgb8();
        let (width, height) = canvas.dimensions();

        for annotation in &record.annotated_regions {
            if !annotation.is_box() {
                log::warn!(
                    "Skipping '{}' region in {}",
                    annotation.region_type.as_deref().unwrap_or("untyped"),
                    record.location
                );
                continue;
            }
            let category = annotation.category().ok_or_else(|| RenderError::Untagged {
                location: record.location.clone(),
            })?;
            let color =
                self.palette
                    .color(category)
                    .ok_or_else(|| RenderError::UnknownCategory {
                        category: category.to_string(),
                        location: record.location.clone(),
                    })?;
            let region = annotation
                .bounding_box()
                .map_err(|source| RenderError::InvalidRegion {
                    location: record.location.clone(),
                    source,
                })?;
            let pixels = region.denormalize(width, height).normalized();
            draw_outline(&mut canvas, &pixels, color, self.outline_width);
        }

        let target = annotated_path(source, suffix);
        canvas.save(&target).map_err(|e| RenderError::Save {
            path: target.clone(),
            source: e,
        })?;
        log::debug!("Rendered {}", target.display());
        Ok(target)
    }
}

impl Default for ImageAnnotationRenderer {
    fn default() -> Self {
        Self::new(Palette::builtin())
    }
}

impl AnnotationRenderer for ImageAnnotationRenderer {
    fn render(
        &self,
        document: &AnnotationDocument,
        suffix: &str,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let mut written = Vec::with_capacity(document.images.len());
        for record in &document.images {
            written.push(self.render_image(record, suffix)?);
        }
        log::info!("Rendered {} annotated image(s) ({suffix})", written.len());
        Ok(written)
    }
}

/// `dir/name.jpg` → `dir/name_annotated_<suffix>.jpg`.
pub fn annotated_path(source: &Path, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = source
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "jpg".to_string());
    source.with_file_name(format!(
        "{stem}{ANNOTATED_SUFFIX_MARKER}{suffix}.{extension}"
    ))
}

/// Strokes `width` nested rectangles inward from the box edge.
fn draw_outline(canvas: &mut RgbImage, pixels: &Region, color: Rgb<u8>, width: u32) {
    let left = pixels.xmin.round() as i32;
    let top = pixels.ymin.round() as i32;
    let right = pixels.xmax.round() as i32;
    let bottom = pixels.ymax.round() as i32;

    for i in 0..width as i32 {
        let w = right - left + 1 - 2 * i;
        let h = bottom - top + 1 - 2 * i;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(left + i, top + i).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
