use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use toggl_invoice::{
    cli::Opts, envfile, Config, InvoiceService, PdfRenderer, TimeWindow, TogglClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();

    if opts.gen_envfile {
        let dir = std::env::current_dir().context("Failed to read current directory")?;
        envfile::generate(&dir).context("Failed to write environment file")?;
        return Ok(());
    }

    let window = TimeWindow::resolve(opts.offset, opts.delta)?;
    let config = Config::load_from(opts.config.as_deref()).context("Failed to load configuration")?;

    let client = TogglClient::new(config.toggl_api_token.clone(), &config.toggl_api_url)?;
    let service = InvoiceService::new(client, PdfRenderer, config)?;

    let path = service.process_invoice(&window).await?;
    info!("Done: {}", path.display());

    Ok(())
}
