use clap::Parser;
use tracing_subscriber::EnvFilter;

use nuclei_mcp::cli::{self, Cli};
use nuclei_mcp::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    init_tracing(config.log_json);

    cli::run(cli.command(), config).await
}

/// Logs go to stderr; stdout belongs to the stdio transport and `scan` output.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nuclei_mcp=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
