// Pipeline configuration

pub mod loader;
pub mod merger;

// Re-export main types
pub use loader::{PipelineConfig, CONFIG_ENV_VAR, MAX_DEBUG_LEVEL};
pub use merger::PipelineOptions;
