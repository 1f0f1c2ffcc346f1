use anyhow::{Context, Result};
use crypto_reader::{LoadRequest, Loader, provider};
use log::info;

const DEFAULT_CONFIG_PATH: &str = "crypto-reader.toml";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let provider = provider::install_default();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    info!("Reading load request from {}", config_path);

    let request = LoadRequest::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    let credential = Loader::new()
        .with_provider(provider)
        .load(&request)
        .await
        .context("Failed to load credential")?;

    println!(
        "{}: {} certificate(s), {} CA certificate(s)",
        request.cert_path.display(),
        credential.cert_chain().len(),
        credential.ca_certs().len()
    );

    Ok(())
}
