pub mod evaluate_detections_use_case;
pub mod merge_axle_trees_use_case;
