use async_trait::async_trait;
use futures::FutureExt;

use super::{run_items, ItemOp, MigrationContext};
use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::pipeline::Stage;

pub const CREATE_ORG_HOOK: &str = "create organization webhook";
pub const CREATE_REPO_HOOK: &str = "create repository webhook";

/// Copies organization hooks and per-repository hooks to the target.
///
/// Nothing is compared against hooks already on the target, so running the
/// phase twice creates every hook twice.
pub async fn run(ctx: &MigrationContext, ledger: &mut PhaseLedger) -> Result<(), ApiError> {
    for account in &ctx.sources {
        let org_hooks = ctx.provider.list_org_webhooks(account).await?;
        let items: Vec<ItemOp<'_>> = org_hooks
            .iter()
            .map(|hook| {
                let op = async move { ctx.provider.create_org_webhook(&ctx.target, hook).await }
                    .boxed();
                (hook.name.clone(), op)
            })
            .collect();
        run_items(ctx, ledger, account, CREATE_ORG_HOOK, items).await;

        let repos = ctx.provider.list_repositories(account).await?;
        for repo in &repos {
            let hooks = ctx.provider.list_repo_webhooks(account, &repo.name).await?;
            let items: Vec<ItemOp<'_>> = hooks
                .iter()
                .map(|hook| {
                    let op = async move {
                        ctx.provider
                            .create_repo_webhook(&ctx.target, &repo.name, hook)
                            .await
                    }
                    .boxed();
                    (format!("{} in {}", hook.name, repo.name), op)
                })
                .collect();
            run_items(ctx, ledger, account, CREATE_REPO_HOOK, items).await;
        }
    }

    Ok(())
}

pub struct WebhooksStage;

#[async_trait]
impl Stage for WebhooksStage {
    fn phase(&self) -> Phase {
        Phase::Webhooks
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
