use anyhow::Result;
use lantern::Config;

#[tokio::main]
async fn main() -> Result<()> {
    lantern::logging::init();
    let config = Config::load()?;
    let addr = config.addr()?;
    tracing::info!("Running on http://{}/", addr);
    template_demo::app(&config.secret_key)?.listen(addr).await?;
    Ok(())
}
