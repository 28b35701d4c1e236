use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracewalk_cli::cli::app::run().await
}
