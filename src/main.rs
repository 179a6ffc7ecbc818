use anyhow::Result;
use budget_tracker::cli::Cli;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);
    debug!("Log level set to {}", cli.log_level);
    cli.run().await
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence over `--log-level`.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => {
            // Library and binary targets log under different names
            let library = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!(
                "{}={},{}={}",
                library,
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
