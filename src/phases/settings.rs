use async_trait::async_trait;
use futures::FutureExt;

use super::{run_items, ItemOp, MigrationContext};
use crate::catalog::BranchProtectionPolicy;
use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::pipeline::Stage;

pub const UPDATE_SETTINGS: &str = "update settings for";

/// Normalizes every repository currently owned by the target: topics are
/// overwritten when a topic list is configured, and the standard protection
/// policy is applied to the default branch.
pub async fn run(ctx: &MigrationContext, ledger: &mut PhaseLedger) -> Result<(), ApiError> {
    let repos = ctx.provider.list_repositories(&ctx.target).await?;

    let items: Vec<ItemOp<'_>> = repos
        .iter()
        .map(|repo| {
            let op = async move {
                if !ctx.topics.is_empty() {
                    ctx.provider
                        .replace_topics(&ctx.target, &repo.name, &ctx.topics)
                        .await?;
                }

                let policy = BranchProtectionPolicy::standard(&repo.default_branch);
                ctx.provider
                    .protect_branch(&ctx.target, &repo.name, &policy)
                    .await
            }
            .boxed();
            (repo.name.clone(), op)
        })
        .collect();

    run_items(ctx, ledger, &ctx.target, UPDATE_SETTINGS, items).await;
    Ok(())
}

pub struct SettingsStage;

#[async_trait]
impl Stage for SettingsStage {
    fn phase(&self) -> Phase {
        Phase::Settings
    }

    async fn run(
        &self,
        ctx: &MigrationContext,
        _previous: Option<&PhaseLedger>,
        ledger: &mut PhaseLedger,
    ) -> Result<(), ApiError> {
        run(ctx, ledger).await
    }
}
