pub mod image_annotation_renderer;
pub mod json_annotation_store;
pub mod palette;
