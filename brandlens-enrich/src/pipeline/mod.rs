//! Task pipeline orchestration

mod runner;

pub use runner::{PipelineRunner, PipelineSettings};
