//! Vista - Binary entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{IsTerminal, Write, stdout};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vista_web::{AppState, Config, DEFAULT_PREVIEW_BYTES, ViewOptions, inspect, render_view, serve};

/// Vista - Playwright-style test report viewer
#[derive(Parser, Debug)]
#[command(name = "vista", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve a report over HTTP
    Serve(ServeArgs),

    /// Print the rendered view of a report
    Inspect(InspectArgs),
}

/// Arguments for the serve subcommand
#[derive(Parser, Debug)]
struct ServeArgs {
    /// Report bundle JSON file (serves the summary page when omitted)
    #[arg(long, env = "VISTA_REPORT")]
    report: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "VISTA_PORT", default_value = "9323")]
    port: u16,

    /// Directory of static files served for unknown paths
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Maximum bytes read for an attachment preview
    #[arg(long, default_value_t = DEFAULT_PREVIEW_BYTES)]
    preview_bytes: usize,

    /// Open the viewer in the default browser
    #[arg(long)]
    open: bool,
}

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Use colors when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn should_use_colors(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout().is_terminal(),
        }
    }
}

/// Arguments for the inspect subcommand
#[derive(Parser, Debug)]
struct InspectArgs {
    /// Report bundle JSON file
    #[arg(long, env = "VISTA_REPORT")]
    report: PathBuf,

    /// Result (retry) to show; defaults to the bundle's run
    #[arg(long)]
    run: Option<usize>,

    /// Anchor to reveal, e.g. `attachment-0` or `step-0.1`
    #[arg(long)]
    anchor: Option<String>,

    /// Expand every step
    #[arg(long)]
    expand_all: bool,

    /// Only show failed steps
    #[arg(long)]
    errors_only: bool,

    /// Print the view as JSON
    #[arg(long)]
    json: bool,

    /// Maximum bytes read for an attachment preview
    #[arg(long, default_value_t = DEFAULT_PREVIEW_BYTES)]
    preview_bytes: usize,

    /// Color output mode
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vista_web=info,vista_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Inspect(args) => run_inspect(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = Config {
        port: args.port,
        static_dir: args.static_dir,
        report_path: args.report,
        preview_max_bytes: args.preview_bytes,
    };

    let url = format!("http://localhost:{}", config.port);
    tracing::info!("Starting Vista on {}", url);

    if args.open {
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            if let Err(e) = open::that(&url) {
                tracing::warn!("Failed to open browser: {}", e);
            }
        });
    }

    serve(config).await.context("server failed")
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let config = Config {
        report_path: Some(args.report.clone()),
        preview_max_bytes: args.preview_bytes,
        ..Config::default()
    };
    let state = AppState::load(&config)
        .with_context(|| format!("Failed to load report {}", args.report.display()))?;

    let options = ViewOptions {
        run: args.run,
        anchor: args.anchor,
        errors_only: args.errors_only,
        expand_all: args.expand_all,
    };
    let view = render_view(&state, &options).await?;

    let mut out = stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &view)?;
        writeln!(out)?;
    } else {
        let use_colors = args.color.should_use_colors();
        colored::control::set_override(use_colors);
        inspect::write_view(&mut out, &view, use_colors)?;
    }
    Ok(())
}
