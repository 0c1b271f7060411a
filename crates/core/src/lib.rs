//! Axle-tree grouping and detection evaluation for image annotation data.
//!
//! - [`grouping`] fuses overlapping single-axle boxes into grouped-axle boxes.
//! - [`evaluation`] matches predictions to ground truth by IoU and traces
//!   precision/recall over score thresholds.
//! - [`io`] loads/saves annotation documents and renders them onto images.
//! - [`pipeline`] wires these together for the command line.

pub mod evaluation;
pub mod grouping;
pub mod io;
pub mod pipeline;
pub mod shared;
