// Clippy allows for reasonable defaults
// These suppress warnings where the suggested change doesn't improve readability
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer
#![allow(clippy::field_reassign_with_default)] // Builder pattern is clearer
#![allow(clippy::unnecessary_map_or)] // map_or can be clearer than alternatives
#![allow(clippy::redundant_closure)] // |x| f(x) can be clearer than f
#![allow(clippy::unwrap_or_default)] // unwrap_or_else(Default::default) can be clearer

// Module declarations
pub mod agents;
pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod templates;
mod utils;

pub use agents::{
    AgentSession, BatchOptions, ClassifyOptions, ContextAction, ContextOptions, ContextOutcome,
    ExtractOptions, GuardRules, StepOptions,
};
pub use config::{PipelineConfig, PipelineOptions};
pub use error::{AgentError, AgentResult};
pub use models::*;
