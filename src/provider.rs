use async_trait::async_trait;

use crate::catalog::{
    Account, BranchProtectionPolicy, MemberRole, Membership, Permission, Repository, Team,
    Webhook,
};
use crate::error::ApiError;

/// The hosting platform as seen by the migration phases.
///
/// List operations return every item across all pages. Write operations
/// return as soon as the platform accepts the change.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn list_repositories(&self, account: &Account) -> Result<Vec<Repository>, ApiError>;

    async fn list_teams(&self, account: &Account) -> Result<Vec<Team>, ApiError>;

    async fn list_team_members(
        &self,
        account: &Account,
        team: &Team,
    ) -> Result<Vec<Membership>, ApiError>;

    /// Repositories the team can access, with `permissions` populated.
    async fn list_team_repositories(
        &self,
        account: &Account,
        team: &Team,
    ) -> Result<Vec<Repository>, ApiError>;

    async fn list_members(&self, account: &Account) -> Result<Vec<Membership>, ApiError>;

    async fn list_org_webhooks(&self, account: &Account) -> Result<Vec<Webhook>, ApiError>;

    async fn list_repo_webhooks(
        &self,
        account: &Account,
        repository: &str,
    ) -> Result<Vec<Webhook>, ApiError>;

    async fn transfer_repository(
        &self,
        account: &Account,
        repository: &str,
        new_owner: &Account,
    ) -> Result<(), ApiError>;

    /// Creates `team` under `account`, returning the team as created (the
    /// slug may differ from the source's).
    async fn create_team(&self, account: &Account, team: &Team) -> Result<Team, ApiError>;

    async fn add_team_member(
        &self,
        account: &Account,
        team_slug: &str,
        username: &str,
        role: MemberRole,
    ) -> Result<(), ApiError>;

    async fn grant_team_repository(
        &self,
        account: &Account,
        team_slug: &str,
        repository: &str,
        permission: Permission,
    ) -> Result<(), ApiError>;

    async fn set_membership(
        &self,
        account: &Account,
        username: &str,
        role: MemberRole,
    ) -> Result<(), ApiError>;

    async fn create_org_webhook(&self, account: &Account, hook: &Webhook) -> Result<(), ApiError>;

    async fn create_repo_webhook(
        &self,
        account: &Account,
        repository: &str,
        hook: &Webhook,
    ) -> Result<(), ApiError>;

    async fn replace_topics(
        &self,
        account: &Account,
        repository: &str,
        topics: &[String],
    ) -> Result<(), ApiError>;

    async fn protect_branch(
        &self,
        account: &Account,
        repository: &str,
        policy: &BranchProtectionPolicy,
    ) -> Result<(), ApiError>;

    async fn remove_member(&self, account: &Account, username: &str) -> Result<(), ApiError>;

    async fn archive_repository(&self, account: &Account, repository: &str)
        -> Result<(), ApiError>;
}
