mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::{ConfigArgs, ServeArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the EC2 Query API
    Serve(ServeArgs),
    /// Print the resolved configuration
    Config(ConfigArgs),
}

/// `RUST_LOG` as given, or `info` when it is unset or does not parse.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();

    use Commands::*;
    match cli.command {
        Serve(args) => args.main().await,
        Config(args) => args.main(),
    }
}
