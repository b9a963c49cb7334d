use mimalloc::MiMalloc;
use clap::Parser;
use std::process::ExitCode;
use tender::BootstrapError;
use tender::config::{Cli, Config};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let cfg = Config::load(&cli);
    let loglevel = cfg
        .as_ref()
        .map(|c| c.loglevel.clone())
        .unwrap_or_else(|_| "info".to_string());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(loglevel));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let cfg = match cfg {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %BootstrapError::from(e), "fatal");
            return ExitCode::FAILURE;
        }
    };

    info!(
        database_url = %cfg.database_url,
        addr = %cfg.listen_addr(),
        loglevel = %cfg.loglevel,
        connect_max_attempts = cfg.connect_max_attempts,
        connect_backoff_secs = cfg.connect_backoff_secs
    );

    match tender::bootstrap::run(&cfg).await {
        Ok(()) => {
            info!("shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}
