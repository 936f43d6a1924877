//! Runs a game of bots on a generated island and prints the result.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod settings;
mod table;

use settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    info!(
        "Starting a game with {} bots on an island of radius {}",
        settings.players, settings.map_radius
    );

    let summary = table::play(settings).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
