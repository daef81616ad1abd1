use clap::Parser;
use proxyform::cli::Cli;
use proxyform::commands;
use proxyform::config::Settings;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries command output
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;
    debug!("Using schema directory {}", settings.schemas.dir.display());

    let output = commands::run(&cli, &settings).await?;
    println!("{}", output);

    Ok(())
}
