use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use orgshift::cancel::{install_ctrl_c_handler, CancelFlag};
use orgshift::cli;
use orgshift::client::Client;
use orgshift::github_provider::GithubProvider;
use orgshift::phases::MigrationContext;
use orgshift::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("orgshift=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let config = cli::run().context("invalid configuration")?;
    tracing::debug!(?config, "Resolved configuration");

    let client = Client::new(
        &config.token,
        &config.api_url,
        config.retry.clone(),
        config.concurrency,
    )
    .context("could not create API client")?;
    let provider = Arc::new(GithubProvider::new(client));

    let cancel = CancelFlag::new();
    install_ctrl_c_handler(cancel.clone());

    let ctx = MigrationContext::new(provider, &config, cancel);
    let sources: Vec<_> = ctx.sources.iter().map(|s| s.as_str()).collect();
    tracing::info!(
        "Migrating {} into {}",
        sources.join(", "),
        ctx.target
    );

    let report = Pipeline::standard(!config.skip_decommission)
        .run(&ctx)
        .await;
    report.log_summary();

    Ok(())
}
