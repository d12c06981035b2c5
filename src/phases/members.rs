use std::collections::BTreeSet;

use async_trait::async_trait;
use futures::FutureExt;

use super::{run_items, ItemOp, MigrationContext};
use crate::catalog::{Account, MemberRole};
use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::pipeline::Stage;
use crate::provider::Provider;

pub const INVITE: &str = "invite";

/// Usernames across all sources, each once. Source roles are dropped: every
/// invitee joins the target as a plain member.
pub async fn collect_invitees(
    provider: &dyn Provider,
    sources: &[Account],
) -> Result<BTreeSet<String>, ApiError> {
    let mut usernames = BTreeSet::new();
    for account in sources {
        for membership in provider.list_members(account).await? {
            usernames.insert(membership.username);
        }
    }
    Ok(usernames)
}

pub async fn run(ctx: &MigrationContext, ledger: &mut PhaseLedger) -> Result<(), ApiError> {
    let usernames = collect_invitees(ctx.provider.as_ref(), &ctx.sources).await?;
    tracing::info!("Inviting {} unique members to {}", usernames.len(), ctx.target);

    let items: Vec<ItemOp<'_>> = usernames
        .iter()
        .map(|username| {
            let op = async move {
                ctx.provider
                    .set_membership(&ctx.target, username, MemberRole::Member)
                    .await
            }
            .boxed();
            (username.clone(), op)
        })
        .collect();

    run_items(ctx, ledger, &ctx.target, INVITE, items).await;
    Ok(())
}

pub struct MembersStage;

#[async_trait]
impl Stage for MembersStage {
    fn phase(&self) -> Phase {
        Phase::Members
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
