use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use confsync::cli::{self, Cli};

fn main() {
    // Logs go to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string())),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    if let Err(err) = cli::run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
