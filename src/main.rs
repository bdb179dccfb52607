use std::io::{self, Read};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "aipic-rust",
    version,
    about = "MCP server that finds image placeholders and fills them with generated images"
)]
struct Cli {
    /// Image API key (overrides AIPIC_API_KEY / MODELSCOPE_API_KEY)
    #[arg(short = 'k', long = "key")]
    key: Option<String>,

    /// Image model id
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// Image generation endpoint
    #[arg(long = "base-url")]
    base_url: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging (stderr)
    #[arg(long = "verbose")]
    verbose: bool,

    /// Serve the tools over HTTP on this address instead of stdio
    #[arg(long = "server")]
    server: Option<String>,

    /// Analyze stdin once and print the placeholders as JSON
    #[arg(long = "analyze", value_parser = ["webpage", "article"])]
    analyze: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    aipic_rust::logging::init(cli.verbose)?;

    if let Some(mode) = cli.analyze.as_deref() {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        println!("{}", aipic_rust::analyze_to_json(mode, &input)?);
        return Ok(());
    }

    let service = aipic_rust::build_service(aipic_rust::Config {
        key: cli.key,
        model: cli.model,
        base_url: cli.base_url,
        settings_path: cli.read_settings,
    })?;
    let service = Arc::new(service);

    match cli.server {
        Some(addr) => aipic_rust::server::run_server(service, addr).await,
        None => aipic_rust::mcp::run_mcp(service).await,
    }
}
