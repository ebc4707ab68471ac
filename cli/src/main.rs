use std::sync::Arc;

use clap::Parser;
use plancraft_cli::{app, commands::cli};
use plancraft_core::api::{AppConfig, AppContext, CliError, LoggingConfig};
use plancraft_core::config;
use plancraft_plugins::services::PluginServicesFactory;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let cfg = load_config(args.config.as_deref())?;
    init_tracing(&cfg.logging).map_err(CliError::Command)?;
    tracing::debug!(command = ?args.command, "starting plancraft");

    let ctx = AppContext::new(cfg, Some(Arc::new(PluginServicesFactory)));
    dispatch(args.command, &ctx).await
}

fn load_config(path: Option<&str>) -> Result<AppConfig, CliError> {
    let loaded = match path {
        Some(p) => config::expand_path(p).and_then(|p| {
            let mut cfg = config::load_from_path(&p)?;
            config::apply_env_overrides(&mut cfg)?;
            Ok(cfg)
        }),
        None => config::load_default(),
    };
    loaded.map_err(|e| CliError::Config(format!("{e:#}")))
}

async fn dispatch(cmd: cli::Commands, ctx: &AppContext) -> Result<i32, CliError> {
    match cmd {
        cli::Commands::Run(run_args) => app::run_plan(&run_args, ctx).await,
        cli::Commands::Resume(resume_args) => app::resume_plan(&resume_args, ctx).await,
        cli::Commands::Route(route_args) => {
            println!("{}", app::route(&route_args));
            Ok(0)
        }
        cli::Commands::Classify(classify_args) => {
            println!("{}", app::classify(&classify_args, ctx.cfg()));
            Ok(0)
        }
        cli::Commands::Graph(graph_args) => {
            println!("{}", app::graph(&graph_args)?);
            Ok(0)
        }
        cli::Commands::Cache(cache_args) => {
            println!("{}", app::cache(&cache_args, ctx.cfg()).await?);
            Ok(0)
        }
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => config::expand_path(d).map_err(|e| e.to_string())?,
            None => std::env::temp_dir().join("plancraft"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("plancraft.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging enabled but both console and file output are off".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
