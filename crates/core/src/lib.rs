#![forbid(unsafe_code)]

pub mod model;
pub mod progress;
pub mod resume;

pub use progress::{CategoryProgress, OverallProgress, ProgressAggregator};
pub use resume::ResumeResolver;
