use clap::Parser;
use satark::cli::Cli;
use satark::commands::{self, AppContext};
use satark::services::config::load_config;
use satark::services::session::SessionStore;
use satark::services::storage::FileStorage;
use std::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config()?.with_api_override(cli.api.as_deref());
    let store = SessionStore::initialize(Box::new(FileStorage::from_env()?));
    let ctx = AppContext {
        json: cli.json,
        config,
        store,
    };
    commands::run(&cli, &ctx).await
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(cli));
    // a blocked stdin read cannot be cancelled; do not wait on it
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}
