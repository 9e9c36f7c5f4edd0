// src/main.rs

mod cli;

use clap::Parser;
use cli::Args;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    if let Err(e) = cli::run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(if e.is_user_facing() { 2 } else { 1 });
    }
}
