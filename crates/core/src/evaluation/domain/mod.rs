pub mod detection_matcher;
pub mod paired_dataset;
pub mod threshold_sweep;
