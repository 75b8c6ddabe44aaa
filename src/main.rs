use clap::Parser;
use std::sync::Arc;
use threadtally::{task, BotConfig, RedditClient};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = BotConfig::parse();
    config.validate()?;
    info!(
        targets = config.posts.0.len(),
        mode = %config.mode,
        once = config.once,
        "starting threadtally"
    );

    let client = Arc::new(RedditClient::new(&config)?);
    if config.once {
        // One-shot runs have no later tick to recover on, so errors exit.
        task::run_once(client.as_ref(), &config).await?;
    } else {
        task::run_all(client, Arc::new(config)).await;
    }
    Ok(())
}
