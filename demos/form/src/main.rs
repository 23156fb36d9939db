use anyhow::Result;
use lantern::Config;

#[tokio::main]
async fn main() -> Result<()> {
    lantern::logging::init();
    let config = Config::load()?;
    let addr = config.addr()?;
    tracing::info!(upload_path = %config.upload_path.display(), "Running on http://{}/", addr);
    form_demo::app(config)?.listen(addr).await?;
    Ok(())
}
