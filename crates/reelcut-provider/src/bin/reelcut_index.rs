//! Find or create the provider index that submitted videos are added to.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use reelcut_provider::{CreateIndexRequest, ProviderClient, ProviderConfig};

#[derive(Debug, Parser)]
#[command(name = "reelcut-index", about = "Bootstrap the provider index")]
struct Args {
    /// Name used when a new index is created
    #[arg(long, default_value = "advertising-video-analysis")]
    name: String,

    /// Create a new index even if one already exists
    #[arg(long)]
    create: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _ = rustls::crypto::ring::default_provider().install_default();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let client = ProviderClient::new(ProviderConfig::from_env()?)?;

    if !args.create {
        let indexes = client.list_indexes().await?;
        if let Some(existing) = indexes.first() {
            println!(
                "Using existing index {} ({})",
                existing.id,
                existing.index_name.as_deref().unwrap_or("unnamed")
            );
            println!("PROVIDER_INDEX_ID={}", existing.id);
            return Ok(());
        }
    }

    let id = client
        .create_index(&CreateIndexRequest::advertising(&args.name))
        .await?;
    println!("Created index {}", args.name);
    println!("PROVIDER_INDEX_ID={}", id);
    Ok(())
}
