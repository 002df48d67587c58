use anyhow::Result;
use tracing::info;

use fitai::{config, gateway, planner};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitai=info".parse()?)
        )
        .init();

    info!("Starting FitAI v{}", env!("CARGO_PKG_VERSION"));

    let cfg = config::load()?;
    info!("Configuration loaded");

    if cfg.planner.enabled {
        tokio::try_join!(
            gateway::serve(cfg.clone()),
            planner::serve(cfg.clone()),
        )?;
    } else {
        info!("Planner service disabled");
        gateway::serve(cfg).await?;
    }

    Ok(())
}
