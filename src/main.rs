use clap::Parser;
use tracing::info;
use tracing::Level;
use video_parser::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the JSON results
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    info!("Starting video-parser v{}", env!("CARGO_PKG_VERSION"));

    cli.run().await?;

    Ok(())
}
