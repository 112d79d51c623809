//! smlgate CLI - request-serving gateway for compiled script artifacts.

mod check;
mod colors;
mod map;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "smlgate")]
#[command(about = "Script-execution gateway for compiled web projects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Path to the JSON configuration file
        config: PathBuf,

        /// Host address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Print the compiled-artifact path for a request path
    Map {
        /// Request path (e.g. /guide/intro.sml)
        path: String,

        /// Document root of the project
        #[arg(long)]
        root: PathBuf,

        /// Project identifier
        #[arg(long)]
        project: String,

        /// Route .sml sources to their extended-typing artifact variants
        #[arg(long)]
        extended_typing: bool,
    },

    /// Verify a deployment is ready to serve
    Check {
        /// Path to the JSON configuration file
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { config, host, port } => serve::execute(&config, host, port).await?,

        Commands::Map {
            path,
            root,
            project,
            extended_typing,
        } => map::execute(&path, &root, &project, extended_typing)?,

        Commands::Check { config } => check::execute(&config)?,
    }

    Ok(())
}
