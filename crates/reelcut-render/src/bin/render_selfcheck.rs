use std::path::Path;

use reelcut_media::check_ffmpeg;
use reelcut_render::RenderConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = RenderConfig::from_env();

    println!(
        "render-selfcheck: starting with data_dir={}",
        config.data_dir.display()
    );
    ensure_writable(&config.sources_dir()).await?;
    ensure_writable(&config.jobs_dir()).await?;
    let ffmpeg = check_ffmpeg().map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("render-selfcheck: ffmpeg at {}", ffmpeg.display());
    ensure_any_env_present(&["PROVIDER_API_KEY", "TL_API_KEY"])?;

    println!("render-selfcheck: ok");
    Ok(())
}

async fn ensure_writable(dir: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let probe = dir.join(".selfcheck");
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_any_env_present(vars: &[&str]) -> anyhow::Result<()> {
    if vars.iter().any(|var| std::env::var(var).is_ok()) {
        return Ok(());
    }
    Err(anyhow::anyhow!(
        "missing required env var (one of {})",
        vars.join(", ")
    ))
}
