//! Serve command implementation.

use std::path::Path;

use smlgate_server::{ServerConfig, ServerFileConfig};

use crate::colors;

/// Start the gateway server from a configuration file.
pub async fn execute(config_path: &Path, host: String, port: u16) -> anyhow::Result<()> {
    let file = ServerFileConfig::load(config_path)?;

    println!(
        "\n{}smlgate{} - Script Gateway",
        colors::BOLD,
        colors::RESET
    );
    println!("{}", "─".repeat(50));
    println!(
        "{}  ◆ Project:{} {}",
        colors::CYAN,
        colors::RESET,
        file.gateway.project_id
    );
    println!(
        "{}  ◆ Document root:{} {}",
        colors::CYAN,
        colors::RESET,
        file.gateway.document_root.display()
    );
    println!(
        "{}  ◆ Server:{} http://{}:{}",
        colors::CYAN,
        colors::RESET,
        host,
        port
    );
    if !file.jobs.is_empty() {
        println!(
            "{}  ◆ Scheduled jobs:{} {}",
            colors::CYAN,
            colors::RESET,
            file.jobs.len()
        );
    }
    println!("{}", "─".repeat(50));
    println!("{}Press Ctrl+C to stop{}", colors::DIM, colors::RESET);
    println!();

    let config = ServerConfig { host, port };
    smlgate_server::serve(config, file.gateway, file.jobs).await?;

    Ok(())
}
