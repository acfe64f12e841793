use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod cli;
mod listener;
mod lsp;
mod session;
mod utils;

use cli::args::Cli;
use cli::output::Printer;
use session::SessionConfig;

/// Environment variable holding a tracing filter, e.g. `lsp_probe=trace`.
const LOG_ENV: &str = "LSP_PROBE_LOG";

fn init_logging(verbose: bool) {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) => EnvFilter::new(directives),
        Err(_) if verbose => EnvFilter::new("lsp_probe=debug"),
        Err(_) => return,
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_normalized();
    init_logging(cli.verbose);

    let config = SessionConfig::from_cli(&cli)?;
    session::run(&config, Printer::detect()).await
}
