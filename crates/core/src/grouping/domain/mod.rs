pub mod axle_grouper;
pub mod axle_tree_merger;
