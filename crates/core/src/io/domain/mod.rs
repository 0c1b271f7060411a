pub mod annotation_renderer;
pub mod annotation_store;
