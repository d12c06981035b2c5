use async_trait::async_trait;
use futures::FutureExt;

use super::{run_items, ItemOp, MigrationContext};
use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::pipeline::Stage;

pub const TRANSFER: &str = "transfer repository";

/// Hands every source repository over to the target account. Already
/// transferred repositories are not rolled back when a later one fails.
pub async fn run(ctx: &MigrationContext, ledger: &mut PhaseLedger) -> Result<(), ApiError> {
    for account in &ctx.sources {
        let repos = ctx.provider.list_repositories(account).await?;

        let items: Vec<ItemOp<'_>> = repos
            .iter()
            .map(|repo| {
                let op = async move {
                    ctx.provider
                        .transfer_repository(account, &repo.name, &ctx.target)
                        .await
                }
                .boxed();
                (repo.full_name(), op)
            })
            .collect();

        run_items(ctx, ledger, account, TRANSFER, items).await;
    }

    Ok(())
}

pub struct TransferStage;

#[async_trait]
impl Stage for TransferStage {
    fn phase(&self) -> Phase {
        Phase::Transfer
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
