use agent_pipeline::agents::guard::guard;
use agent_pipeline::config::CONFIG_ENV_VAR;
use agent_pipeline::{
    AgentSession, ErrorMode, GuardRules, OutputFormat, PipelineConfig, PipelineOptions, ProviderKind,
    StepOptions,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Agent Pipeline - run AI provider steps with retries, caching and fallback
#[derive(Parser, Debug)]
#[command(name = "agent-pipeline")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pipeline config file (TOML)
    #[arg(long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    /// Pipeline debug level (0-3)
    #[arg(long, global = true, default_value = "0")]
    debug: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a single step and print the parsed result as JSON
    Run {
        /// Provider CLI to use (claude or codex)
        #[arg(long, default_value = "claude")]
        provider: ProviderKind,

        /// Step name recorded in the history
        #[arg(long, default_value = "step")]
        step: String,

        #[arg(long)]
        question: String,

        /// Expected output format (TEXT, JSON, NUMBER, ...)
        #[arg(long, default_value = "TEXT")]
        format: OutputFormat,

        #[arg(long)]
        retries: Option<u32>,

        #[arg(long)]
        model: Option<String>,

        /// File passed to the provider (repeatable)
        #[arg(long = "attachment")]
        attachments: Vec<String>,

        /// Provider to try once retries are exhausted
        #[arg(long)]
        fallback: Option<ProviderKind>,

        /// What to do once retries are exhausted (throw, skip or fallback)
        #[arg(long)]
        on_error: Option<ErrorMode>,

        /// Append pipeline debug messages to this file
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Print a placeholder instead of calling the provider
        #[arg(long)]
        dry_run: bool,

        /// Also print the cost report
        #[arg(long)]
        cost: bool,
    },

    /// Validate a JSON value against JSON guard rules
    Guard {
        /// Value to check, as JSON
        #[arg(long)]
        value: String,

        /// Rules, as JSON (e.g. '{"type":"number","max":100}')
        #[arg(long)]
        rules: String,
    },
}

/// Pipeline debug lines go through `log::debug!`, so any level above 0 needs `debug`
fn default_filter(debug: u8) -> &'static str {
    match debug {
        0 => "warn",
        _ => "debug",
    }
}

fn init_logging(debug: u8) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter(debug)))
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<PipelineConfig> {
    let config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => match PipelineConfig::global_path() {
            Some(global) => PipelineConfig::load_or_default(&global)?,
            None => PipelineConfig::default(),
        },
    };
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Command::Run {
            provider,
            step,
            question,
            format,
            retries,
            model,
            attachments,
            fallback,
            on_error,
            log_file,
            dry_run,
            cost,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let session = AgentSession::new().with_config(config);
            if cli.debug > 0 {
                session.debug(cli.debug);
            }
            if let Some(ref path) = log_file {
                session.log(path);
            }
            session.pipeline(PipelineOptions {
                fallback,
                on_error,
                dry_run: dry_run.then_some(true),
                ..Default::default()
            });

            let options = StepOptions {
                question,
                expected_output: format,
                attachments,
                model,
                retries,
                ..Default::default()
            };

            let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            let value = rt.block_on(session.run_step(provider, &step, options))?;

            println!("{}", serde_json::to_string_pretty(&value)?);
            if cost {
                println!("{}", serde_json::to_string_pretty(&session.cost())?);
            }
        }
        Command::Guard { value, rules } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("--value is not valid JSON")?;
            let rules: GuardRules =
                serde_json::from_str(&rules).context("--rules is not valid guard rules JSON")?;

            let checked = guard(value, &rules)?;
            println!("{}", serde_json::to_string_pretty(&checked)?);
        }
    }

    Ok(())
}
