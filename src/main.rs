use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    titanfolio::run().await?;
    Ok(())
}
