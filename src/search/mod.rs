pub mod keywords;
pub mod scoring;
pub mod vector;
