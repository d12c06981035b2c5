use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{
    Account, BranchProtectionPolicy, MemberRole, Membership, Permission, RepoPermissions,
    Repository, Team, TeamPrivacy, Webhook, WebhookScope,
};
use crate::client::{ApiRequest, Client};
use crate::error::ApiError;
use crate::provider::Provider;

const PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct OwnerJson {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoJson {
    name: String,
    owner: OwnerJson,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    permissions: Option<RepoPermissions>,
}

impl From<RepoJson> for Repository {
    fn from(repo: RepoJson) -> Self {
        Repository {
            name: repo.name,
            owner: Account::new(repo.owner.login),
            default_branch: repo.default_branch.unwrap_or_else(|| "main".to_string()),
            archived: repo.archived,
            permissions: repo.permissions,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TeamJson {
    name: String,
    slug: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    privacy: Option<TeamPrivacy>,
}

impl From<TeamJson> for Team {
    fn from(team: TeamJson) -> Self {
        Team {
            name: team.name,
            slug: team.slug,
            description: team.description,
            privacy: team.privacy.unwrap_or(TeamPrivacy::Secret),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserJson {
    login: String,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct HookJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    config: serde_json::Value,
    #[serde(default)]
    events: Vec<String>,
    #[serde(default = "default_active")]
    active: bool,
}

impl HookJson {
    fn into_webhook(self, scope: WebhookScope) -> Webhook {
        Webhook {
            scope,
            name: self.name.unwrap_or_else(|| "web".to_string()),
            config: self.config,
            events: self.events,
            active: self.active,
        }
    }
}

/// Branch names may contain `/` or `#`, so they are percent-encoded.
fn protection_route(account: &Account, repository: &str, branch: &str) -> String {
    format!(
        "repos/{account}/{repository}/branches/{}/protection",
        urlencoding::encode(branch)
    )
}

fn protection_body(policy: &BranchProtectionPolicy) -> serde_json::Value {
    json!({
        "required_status_checks": policy.required_status_checks,
        "enforce_admins": policy.enforce_admins,
        "required_pull_request_reviews": policy.required_reviews,
        "restrictions": policy.restrictions,
    })
}

fn membership(account: &Account, user: UserJson) -> Membership {
    Membership {
        account: account.clone(),
        username: user.login,
        role: MemberRole::Member,
    }
}

/// [`Provider`] backed by the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubProvider {
    client: Client,
}

impl GithubProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.client.call(&request).await.map(|_| ())
    }
}

#[async_trait]
impl Provider for GithubProvider {
    async fn list_repositories(&self, account: &Account) -> Result<Vec<Repository>, ApiError> {
        let route = format!("orgs/{account}/repos?type=all&per_page={PER_PAGE}&page=1");
        let repos: Vec<RepoJson> = self.client.list_all(route).await?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    async fn list_teams(&self, account: &Account) -> Result<Vec<Team>, ApiError> {
        let route = format!("orgs/{account}/teams?per_page={PER_PAGE}&page=1");
        let teams: Vec<TeamJson> = self.client.list_all(route).await?;
        Ok(teams.into_iter().map(Team::from).collect())
    }

    async fn list_team_members(
        &self,
        account: &Account,
        team: &Team,
    ) -> Result<Vec<Membership>, ApiError> {
        let route = format!(
            "orgs/{account}/teams/{}/members?per_page={PER_PAGE}&page=1",
            team.slug
        );
        let users: Vec<UserJson> = self.client.list_all(route).await?;
        Ok(users.into_iter().map(|u| membership(account, u)).collect())
    }

    async fn list_team_repositories(
        &self,
        account: &Account,
        team: &Team,
    ) -> Result<Vec<Repository>, ApiError> {
        let route = format!(
            "orgs/{account}/teams/{}/repos?per_page={PER_PAGE}&page=1",
            team.slug
        );
        let repos: Vec<RepoJson> = self.client.list_all(route).await?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    async fn list_members(&self, account: &Account) -> Result<Vec<Membership>, ApiError> {
        let route = format!("orgs/{account}/members?per_page={PER_PAGE}&page=1");
        let users: Vec<UserJson> = self.client.list_all(route).await?;
        Ok(users.into_iter().map(|u| membership(account, u)).collect())
    }

    async fn list_org_webhooks(&self, account: &Account) -> Result<Vec<Webhook>, ApiError> {
        let route = format!("orgs/{account}/hooks?per_page={PER_PAGE}&page=1");
        let hooks: Vec<HookJson> = self.client.list_all(route).await?;
        Ok(hooks
            .into_iter()
            .map(|h| h.into_webhook(WebhookScope::Organization))
            .collect())
    }

    async fn list_repo_webhooks(
        &self,
        account: &Account,
        repository: &str,
    ) -> Result<Vec<Webhook>, ApiError> {
        let route = format!("repos/{account}/{repository}/hooks?per_page={PER_PAGE}&page=1");
        let hooks: Vec<HookJson> = self.client.list_all(route).await?;
        Ok(hooks
            .into_iter()
            .map(|h| h.into_webhook(WebhookScope::Repository(repository.to_string())))
            .collect())
    }

    async fn transfer_repository(
        &self,
        account: &Account,
        repository: &str,
        new_owner: &Account,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::post(
            format!("repos/{account}/{repository}/transfer"),
            json!({ "new_owner": new_owner }),
        ))
        .await
    }

    async fn create_team(&self, account: &Account, team: &Team) -> Result<Team, ApiError> {
        let response = self
            .client
            .call(&ApiRequest::post(
                format!("orgs/{account}/teams"),
                json!({
                    "name": team.name,
                    "description": team.description,
                    "privacy": team.privacy,
                }),
            ))
            .await?;

        let created: TeamJson = serde_json::from_value(response.body)
            .map_err(|e| ApiError::decode(e.to_string()))?;
        Ok(created.into())
    }

    async fn add_team_member(
        &self,
        account: &Account,
        team_slug: &str,
        username: &str,
        role: MemberRole,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::put(
            format!("orgs/{account}/teams/{team_slug}/memberships/{username}"),
            json!({ "role": role }),
        ))
        .await
    }

    async fn grant_team_repository(
        &self,
        account: &Account,
        team_slug: &str,
        repository: &str,
        permission: Permission,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::put(
            format!("orgs/{account}/teams/{team_slug}/repos/{account}/{repository}"),
            json!({ "permission": permission }),
        ))
        .await
    }

    async fn set_membership(
        &self,
        account: &Account,
        username: &str,
        role: MemberRole,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::put(
            format!("orgs/{account}/memberships/{username}"),
            json!({ "role": role }),
        ))
        .await
    }

    async fn create_org_webhook(&self, account: &Account, hook: &Webhook) -> Result<(), ApiError> {
        self.send(ApiRequest::post(
            format!("orgs/{account}/hooks"),
            json!({
                "name": hook.name,
                "config": hook.config,
                "events": hook.events,
                "active": hook.active,
            }),
        ))
        .await
    }

    async fn create_repo_webhook(
        &self,
        account: &Account,
        repository: &str,
        hook: &Webhook,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::post(
            format!("repos/{account}/{repository}/hooks"),
            json!({
                "config": hook.config,
                "events": hook.events,
                "active": hook.active,
            }),
        ))
        .await
    }

    async fn replace_topics(
        &self,
        account: &Account,
        repository: &str,
        topics: &[String],
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::put(
            format!("repos/{account}/{repository}/topics"),
            json!({ "names": topics }),
        ))
        .await
    }

    async fn protect_branch(
        &self,
        account: &Account,
        repository: &str,
        policy: &BranchProtectionPolicy,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::put(
            protection_route(account, repository, &policy.branch),
            protection_body(policy),
        ))
        .await
    }

    async fn remove_member(&self, account: &Account, username: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(format!(
            "orgs/{account}/members/{username}"
        )))
        .await
    }

    async fn archive_repository(
        &self,
        account: &Account,
        repository: &str,
    ) -> Result<(), ApiError> {
        self.send(ApiRequest::patch(
            format!("repos/{account}/{repository}"),
            json!({ "archived": true }),
        ))
        .await
    }
}
