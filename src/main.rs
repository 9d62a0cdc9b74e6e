use clap::Parser;
use collabify::cli::commands::Cli;
use collabify::cli::handlers;
use tracing_subscriber::{EnvFilter, prelude::*};

fn init_tracing() {
    // RUST_LOG=debug shows backend requests; stdout stays reserved for output
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(env_filter),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
