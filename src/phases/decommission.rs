use async_trait::async_trait;
use futures::FutureExt;

use super::{run_items, ItemOp, MigrationContext};
use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::pipeline::Stage;

pub const REMOVE_MEMBER: &str = "remove member";
pub const ARCHIVE: &str = "archive repository";

/// Empties and archives each source account. Irreversible; runs regardless of
/// what verification reported.
pub async fn run(ctx: &MigrationContext, ledger: &mut PhaseLedger) -> Result<(), ApiError> {
    for account in &ctx.sources {
        let members = ctx.provider.list_members(account).await?;
        let items: Vec<ItemOp<'_>> = members
            .iter()
            .map(|member| {
                let op = async move {
                    ctx.provider
                        .remove_member(account, &member.username)
                        .await
                }
                .boxed();
                (format!("{} from {}", member.username, account), op)
            })
            .collect();
        run_items(ctx, ledger, account, REMOVE_MEMBER, items).await;

        let repos = ctx.provider.list_repositories(account).await?;
        let items: Vec<ItemOp<'_>> = repos
            .iter()
            .map(|repo| {
                let op = async move { ctx.provider.archive_repository(account, &repo.name).await }
                    .boxed();
                (repo.full_name(), op)
            })
            .collect();
        run_items(ctx, ledger, account, ARCHIVE, items).await;

        if ctx.cancel.is_cancelled() {
            return Ok(());
        }
        tracing::info!(
            account = %account,
            "Organization {account} is ready for deletion. Please proceed manually if desired."
        );
    }

    Ok(())
}

pub struct DecommissionStage;

#[async_trait]
impl Stage for DecommissionStage {
    fn phase(&self) -> Phase {
        Phase::Decommission
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
