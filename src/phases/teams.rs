use async_trait::async_trait;
use futures::FutureExt;

use super::{run_items, ItemOp, MigrationContext};
use crate::catalog::{Account, MemberRole, Permission, Team};
use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::pipeline::Stage;

pub const CREATE_TEAM: &str = "create team";
pub const LIST_TEAM_MEMBERS: &str = "list members of team";
pub const LIST_TEAM_REPOSITORIES: &str = "list repositories of team";
pub const ADD_TEAM_MEMBER: &str = "add team member";
pub const GRANT_ACCESS: &str = "grant team access";

/// Recreates each source team on the target, then copies its members and
/// repository permissions. A team whose creation fails (for instance because
/// the name is taken on the target) is skipped entirely.
pub async fn run(ctx: &MigrationContext, ledger: &mut PhaseLedger) -> Result<(), ApiError> {
    for account in &ctx.sources {
        let teams = ctx.provider.list_teams(account).await?;

        for team in &teams {
            if ctx.cancel.is_cancelled() {
                ledger.skip(account, CREATE_TEAM, team.name.clone());
                continue;
            }

            let created = ctx.provider.create_team(&ctx.target, team).await;
            let created = match ledger.record(account, CREATE_TEAM, team.name.clone(), created) {
                Some(created) => created,
                None => continue,
            };

            migrate_members(ctx, ledger, account, team, &created).await;
            migrate_permissions(ctx, ledger, account, team, &created).await;
        }
    }

    Ok(())
}

async fn migrate_members(
    ctx: &MigrationContext,
    ledger: &mut PhaseLedger,
    account: &Account,
    source: &Team,
    created: &Team,
) {
    let members = ctx.provider.list_team_members(account, source).await;
    let members = match ledger.record(account, LIST_TEAM_MEMBERS, source.name.clone(), members) {
        Some(members) => members,
        None => return,
    };

    let items: Vec<ItemOp<'_>> = members
        .iter()
        .map(|member| {
            let op = async move {
                ctx.provider
                    .add_team_member(
                        &ctx.target,
                        &created.slug,
                        &member.username,
                        MemberRole::Member,
                    )
                    .await
            }
            .boxed();
            (format!("{} to {}", member.username, created.name), op)
        })
        .collect();

    run_items(ctx, ledger, account, ADD_TEAM_MEMBER, items).await;
}

async fn migrate_permissions(
    ctx: &MigrationContext,
    ledger: &mut PhaseLedger,
    account: &Account,
    source: &Team,
    created: &Team,
) {
    let repos = ctx.provider.list_team_repositories(account, source).await;
    let repos = match ledger.record(account, LIST_TEAM_REPOSITORIES, source.name.clone(), repos) {
        Some(repos) => repos,
        None => return,
    };

    let items: Vec<ItemOp<'_>> = repos
        .iter()
        .map(|repo| {
            let permission = repo
                .permissions
                .as_ref()
                .map(Permission::from_flags)
                .unwrap_or(Permission::Pull);
            let op = async move {
                ctx.provider
                    .grant_team_repository(&ctx.target, &created.slug, &repo.name, permission)
                    .await
            }
            .boxed();
            (
                format!("{} on {} ({})", created.name, repo.name, permission),
                op,
            )
        })
        .collect();

    run_items(ctx, ledger, account, GRANT_ACCESS, items).await;
}

pub struct TeamsStage;

#[async_trait]
impl Stage for TeamsStage {
    fn phase(&self) -> Phase {
        Phase::Teams
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
