// Agent pipeline: provider invocation, step orchestration and session state

pub mod batch;
pub mod cache;
pub mod classify;
pub mod clock;
pub mod context;
pub mod debug_log;
pub mod executor;
pub mod guard;
pub mod history;
pub mod invoker;
pub mod path_resolver;
pub mod prompt_builder;
pub mod providers;
pub mod rate_limiter;
pub mod session;

// Re-export for convenience
pub use batch::{render_item_template, BatchOptions};
pub use cache::{cache_key, ResponseCache};
pub use classify::{ClassifyOptions, ExtractOptions};
pub use clock::{Clock, ManualClock, TokioClock};
pub use context::{ContextAction, ContextOptions, ContextOutcome, ContextStore};
pub use executor::{backoff_delay, StepOptions};
pub use guard::{guard, GuardFailMode, GuardRules, GuardType};
pub use invoker::{CliInvoker, InvocationRequest, ProviderInvoker};
pub use providers::{get_provider, ProviderPlugin};
pub use session::AgentSession;
// Note: CliPathResolver is used internally by providers, not re-exported
