pub mod annotation;
pub mod constants;
pub mod region;
pub mod union_find;
