//! Credential Router
//!
//! Loads credentials from an auth directory and runs selections against
//! them, printing one JSON line per pick.

use anyhow::{Context, Result};
use clap::Parser;
use credential_router::{
    auth::{AuthRegistry, PickOptions},
    config::{Environment, Settings},
    logging::{init_tracing, LogFormat},
    synthesizer::{FileSynthesizer, SynthesisContext},
};
use serde_json::json;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Credential Router
///
/// Picks upstream credentials using the configured routing strategy.
#[derive(Parser, Debug)]
#[command(name = "credential-router")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Provider to pick for (e.g. gemini-cli, claude, codex)
    #[arg(short, long)]
    provider: String,

    /// Model to pick for; per-model cooldowns apply to this ID
    #[arg(short, long, default_value = "")]
    model: String,

    /// Number of picks to run
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    /// Credential directory (overrides AUTH_DIR env var)
    #[arg(long)]
    auth_dir: Option<PathBuf>,

    /// Routing strategy: weighted, round-robin, fill-first (overrides ROUTING_STRATEGY env var)
    #[arg(short, long)]
    strategy: Option<String>,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL env var)
    #[arg(long)]
    log_level: Option<String>,

    /// Environment: dev, staging, prod (overrides ENVIRONMENT env var)
    #[arg(short, long)]
    env: Option<Environment>,

    /// Human-readable logs (default outside staging and production)
    #[arg(long, conflicts_with = "json")]
    pretty: bool,

    /// JSON logs (default in staging and production)
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level)
    let mut settings = Settings::load()?;

    // Override settings with CLI arguments
    if let Some(auth_dir) = args.auth_dir {
        settings.auth_dir = Some(auth_dir);
    }
    if let Some(strategy) = args.strategy {
        settings.routing_strategy = strategy;
    }
    if let Some(log_level) = args.log_level {
        settings.log_level = log_level;
    }
    if let Some(env) = args.env {
        settings.environment = env;
    }
    settings.validate()?;

    let format = if args.pretty {
        LogFormat::Pretty
    } else if args.json {
        LogFormat::Json
    } else {
        settings.log_format()
    };
    init_tracing(&settings.log_level, format)?;

    let auth_dir = settings
        .auth_dir
        .clone()
        .context("No auth directory configured (set AUTH_DIR or pass --auth-dir)")?;

    let strategy = settings.routing_strategy();
    let auths = FileSynthesizer::new().synthesize(&SynthesisContext::new(&auth_dir));
    let registry = AuthRegistry::new(auths, strategy);

    let stats = registry.stats();
    tracing::info!(
        app_name = %settings.app_name,
        version = %settings.app_version,
        environment = %settings.environment,
        auth_dir = %auth_dir.display(),
        strategy = %stats.strategy,
        credentials = stats.total,
        disabled = stats.disabled,
        virtuals = stats.virtual_count,
        providers = stats.providers,
        "Credential registry loaded"
    );

    let cancel = CancellationToken::new();
    let options = PickOptions::default();
    for _ in 0..args.count {
        match registry.pick(&cancel, &args.provider, &args.model, &options) {
            Ok(auth) => {
                let line = json!({
                    "id": auth.id,
                    "provider": auth.provider,
                    "label": auth.label,
                    "priority": auth.priority(),
                    "weight": auth.weight(),
                });
                println!("{}", line);
            }
            Err(err) => {
                let line = json!({
                    "error": err.code(),
                    "message": err.to_string(),
                    "retry_after": err.retry_after(),
                });
                println!("{}", line);
                return Err(err).context("Credential selection failed");
            }
        }
    }

    Ok(())
}
