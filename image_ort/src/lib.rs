pub mod config;
pub mod pipeline;
pub mod summary;

pub use config::PipelineConfig;
pub use pipeline::Pipeline;
pub use summary::RunSummary;
