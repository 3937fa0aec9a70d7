mod doctor_commands;
mod serve;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    wabridge_config::WabridgeConfig,
};

#[derive(Parser)]
#[command(name = "wabridge", about = "wabridge: WhatsApp to webhook relay", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./wabridge.toml and ~/.config/wabridge/).
    #[arg(long, global = true, env = "WABRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value and `PORT`).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the bridge (default when no subcommand is provided).
    Serve,
    /// Validate the configuration and check the sidecar and relay settings.
    Doctor,
}

/// Initialise tracing: `RUST_LOG` wins over `--log-level`.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// File (explicit or discovered), then legacy env vars, then CLI flags.
fn resolve_config(cli: &Cli) -> anyhow::Result<WabridgeConfig> {
    let config = match cli.config.as_deref() {
        Some(path) => wabridge_config::load_config(path)?,
        None => wabridge_config::discover_and_load(),
    };
    let mut config = wabridge_config::apply_env_overrides(config);
    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "wabridge starting");

    match &cli.command {
        None | Some(Commands::Serve) => serve::run(resolve_config(&cli)?).await,
        Some(Commands::Doctor) => {
            doctor_commands::handle_doctor(cli.config.as_deref(), resolve_config(&cli)?).await
        },
    }
}
