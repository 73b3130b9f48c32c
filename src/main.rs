mod aggregate;
mod backend;
mod build;
mod circle_ci;
mod config;
mod error;
mod jenkins;
mod rendering;
mod transport;
mod travis;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::{
    config::{env_replacer, load_config},
    transport::HttpTransport,
};

static CONFIG_FILE: &str = ".buildboard.json";

fn config_path() -> anyhow::Result<std::path::PathBuf> {
    if let Some(path) = std::env::args().nth(1) {
        return Ok(path.into());
    }
    let mut path = std::env::home_dir().context("no home directory")?;
    path.push(CONFIG_FILE);
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let path = config_path()?;
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let settings = load_config(&content, env_replacer)?;
    tracing::info!(backend = settings.mode.display_name(), "fetching builds");

    let transport = HttpTransport::new();
    let builds = backend::run(&settings, &transport).await?;
    rendering::render_rows(&builds);
    Ok(())
}
