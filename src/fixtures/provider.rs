//! In-memory platform used by the phase and pipeline tests.
//!
//! Every call is logged as `operation:key` and any key registered with
//! [`FakeProvider::fail_on`] fails with a server error. Keys name the source
//! organization for reads, transfers and decommission writes; writes that
//! only ever hit the target leave it out:
//!
//! - `list_repositories:{org}`, `list_teams:{org}`, `list_members:{org}`,
//!   `list_org_webhooks:{org}`, `list_team_members:{org}/{slug}`,
//!   `list_team_repositories:{org}/{slug}`, `list_repo_webhooks:{org}/{repo}`
//! - `transfer:{org}/{repo}`, `remove_member:{org}/{user}`, `archive:{org}/{repo}`
//! - `create_team:{name}`, `add_team_member:{slug}/{user}`, `grant:{slug}/{repo}`,
//!   `set_membership:{user}`, `create_org_webhook:{events}`,
//!   `create_repo_webhook:{repo}/{events}`, `replace_topics:{repo}`,
//!   `protect_branch:{repo}/{branch}`

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;

use crate::cancel::CancelFlag;
use crate::catalog::{
    Account, BranchProtectionPolicy, MemberRole, Membership, Permission, RepoPermissions,
    Repository, Team, TeamPrivacy, Webhook, WebhookScope,
};
use crate::error::ApiError;
use crate::phases::MigrationContext;
use crate::provider::Provider;

/// One organization's state.
#[derive(Debug, Clone, Default)]
pub struct FakeOrg {
    pub repositories: Vec<Repository>,
    pub teams: Vec<Team>,
    pub members: Vec<String>,
    /// Usernames keyed by team slug.
    pub team_members: HashMap<String, Vec<String>>,
    /// Repository names and access flags keyed by team slug.
    pub team_repositories: HashMap<String, Vec<(String, RepoPermissions)>>,
    pub webhooks: Vec<Webhook>,
    pub repo_webhooks: HashMap<String, Vec<Webhook>>,
    pub topics: HashMap<String, Vec<String>>,
    pub protections: HashMap<String, BranchProtectionPolicy>,
    /// `(team slug, repository, permission)` in grant order.
    pub team_grants: Vec<(String, String, Permission)>,
    pub invitations: Vec<String>,
}

fn hook(scope: WebhookScope, name: &str, events: &[&str]) -> Webhook {
    Webhook {
        scope,
        name: name.to_string(),
        config: json!({
            "url": format!("https://hooks.example.com/{}", events.join("-")),
            "content_type": "json",
        }),
        events: events.iter().map(|e| e.to_string()).collect(),
        active: true,
    }
}

impl FakeOrg {
    pub fn new() -> Self {
        Self::default()
    }

    /// The owner is filled in when the organization is registered.
    pub fn repo(mut self, name: &str, default_branch: &str) -> Self {
        self.repositories.push(Repository {
            name: name.to_string(),
            owner: Account::new(""),
            default_branch: default_branch.to_string(),
            archived: false,
            permissions: None,
        });
        self
    }

    /// Adds a closed team whose slug equals its name. `repos` lists
    /// `(repository, admin, push)`; pull access is always granted.
    pub fn team(mut self, name: &str, members: &[&str], repos: &[(&str, bool, bool)]) -> Self {
        self.teams.push(Team {
            name: name.to_string(),
            slug: name.to_string(),
            description: None,
            privacy: TeamPrivacy::Closed,
        });
        self.team_members.insert(
            name.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self.team_repositories.insert(
            name.to_string(),
            repos
                .iter()
                .map(|(repo, admin, push)| {
                    let flags = RepoPermissions {
                        admin: *admin,
                        push: *push,
                        pull: true,
                    };
                    (repo.to_string(), flags)
                })
                .collect(),
        );
        self
    }

    pub fn member(mut self, username: &str) -> Self {
        self.members.push(username.to_string());
        self
    }

    pub fn org_hook(mut self, name: &str, events: &[&str]) -> Self {
        self.webhooks
            .push(hook(WebhookScope::Organization, name, events));
        self
    }

    pub fn repo_hook(mut self, repo: &str, events: &[&str]) -> Self {
        self.repo_webhooks
            .entry(repo.to_string())
            .or_default()
            .push(hook(WebhookScope::Repository(repo.to_string()), "web", events));
        self
    }

    pub fn topics(mut self, repo: &str, topics: &[&str]) -> Self {
        self.topics.insert(
            repo.to_string(),
            topics.iter().map(|t| t.to_string()).collect(),
        );
        self
    }
}

#[derive(Debug, Default)]
struct State {
    orgs: BTreeMap<String, FakeOrg>,
    failures: HashSet<String>,
    calls: Vec<String>,
}

/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    state: Arc<Mutex<State>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(self, name: &str, mut org: FakeOrg) -> Self {
        for repo in &mut org.repositories {
            repo.owner = Account::new(name);
        }
        self.state().orgs.insert(name.to_string(), org);
        self
    }

    pub fn fail_on(self, key: &str) -> Self {
        self.state().failures.insert(key.to_string());
        self
    }

    /// Snapshot of one organization; empty when it was never registered.
    pub fn org(&self, name: &str) -> FakeOrg {
        self.state().orgs.get(name).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn calls_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Logs the call and fails if its key was registered.
    fn enter(&self, call: String) -> Result<MutexGuard<'_, State>, ApiError> {
        let mut state = self.state();
        let failing = state.failures.contains(&call);
        state.calls.push(call.clone());
        if failing {
            return Err(ApiError::Server {
                status: 500,
                message: format!("scripted failure for {call}"),
            });
        }
        Ok(state)
    }
}

impl State {
    fn org(&self, account: &Account) -> Option<&FakeOrg> {
        self.orgs.get(account.as_str())
    }

    fn org_mut(&mut self, account: &Account) -> &mut FakeOrg {
        self.orgs.entry(account.as_str().to_string()).or_default()
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn list_repositories(&self, account: &Account) -> Result<Vec<Repository>, ApiError> {
        let state = self.enter(format!("list_repositories:{account}"))?;
        Ok(state
            .org(account)
            .map(|org| org.repositories.clone())
            .unwrap_or_default())
    }

    async fn list_teams(&self, account: &Account) -> Result<Vec<Team>, ApiError> {
        let state = self.enter(format!("list_teams:{account}"))?;
        Ok(state
            .org(account)
            .map(|org| org.teams.clone())
            .unwrap_or_default())
    }

    async fn list_team_members(
        &self,
        account: &Account,
        team: &Team,
    ) -> Result<Vec<Membership>, ApiError> {
        let state = self.enter(format!("list_team_members:{account}/{}", team.slug))?;
        let usernames = state
            .org(account)
            .and_then(|org| org.team_members.get(&team.slug).cloned())
            .unwrap_or_default();
        Ok(usernames
            .into_iter()
            .map(|username| Membership {
                account: account.clone(),
                username,
                role: MemberRole::Member,
            })
            .collect())
    }

    async fn list_team_repositories(
        &self,
        account: &Account,
        team: &Team,
    ) -> Result<Vec<Repository>, ApiError> {
        let state = self.enter(format!("list_team_repositories:{account}/{}", team.slug))?;
        let repos = state
            .org(account)
            .and_then(|org| org.team_repositories.get(&team.slug).cloned())
            .unwrap_or_default();
        Ok(repos
            .into_iter()
            .map(|(name, flags)| Repository {
                name,
                owner: account.clone(),
                default_branch: "main".to_string(),
                archived: false,
                permissions: Some(flags),
            })
            .collect())
    }

    async fn list_members(&self, account: &Account) -> Result<Vec<Membership>, ApiError> {
        let state = self.enter(format!("list_members:{account}"))?;
        let usernames = state
            .org(account)
            .map(|org| org.members.clone())
            .unwrap_or_default();
        Ok(usernames
            .into_iter()
            .map(|username| Membership {
                account: account.clone(),
                username,
                role: MemberRole::Member,
            })
            .collect())
    }

    async fn list_org_webhooks(&self, account: &Account) -> Result<Vec<Webhook>, ApiError> {
        let state = self.enter(format!("list_org_webhooks:{account}"))?;
        Ok(state
            .org(account)
            .map(|org| org.webhooks.clone())
            .unwrap_or_default())
    }

    async fn list_repo_webhooks(
        &self,
        account: &Account,
        repository: &str,
    ) -> Result<Vec<Webhook>, ApiError> {
        let state = self.enter(format!("list_repo_webhooks:{account}/{repository}"))?;
        Ok(state
            .org(account)
            .and_then(|org| org.repo_webhooks.get(repository).cloned())
            .unwrap_or_default())
    }

    async fn transfer_repository(
        &self,
        account: &Account,
        repository: &str,
        new_owner: &Account,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!("transfer:{account}/{repository}"))?;

        let source = state.org_mut(account);
        let position = source
            .repositories
            .iter()
            .position(|r| r.name == repository)
            .ok_or_else(|| ApiError::NotFound {
                message: format!("{account}/{repository}"),
            })?;
        let mut repo = source.repositories.remove(position);
        let hooks = source.repo_webhooks.remove(repository);

        repo.owner = new_owner.clone();
        let target = state.org_mut(new_owner);
        target.repositories.push(repo);
        if let Some(hooks) = hooks {
            target.repo_webhooks.insert(repository.to_string(), hooks);
        }
        Ok(())
    }

    async fn create_team(&self, account: &Account, team: &Team) -> Result<Team, ApiError> {
        let mut state = self.enter(format!("create_team:{}", team.name))?;
        let org = state.org_mut(account);
        if org.teams.iter().any(|t| t.name == team.name) {
            return Err(ApiError::Conflict {
                message: "Name must be unique for this org".to_string(),
            });
        }

        let created = Team {
            slug: team.name.to_lowercase().replace(' ', "-"),
            ..team.clone()
        };
        org.teams.push(created.clone());
        Ok(created)
    }

    async fn add_team_member(
        &self,
        account: &Account,
        team_slug: &str,
        username: &str,
        _role: MemberRole,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!("add_team_member:{team_slug}/{username}"))?;
        state
            .org_mut(account)
            .team_members
            .entry(team_slug.to_string())
            .or_default()
            .push(username.to_string());
        Ok(())
    }

    async fn grant_team_repository(
        &self,
        account: &Account,
        team_slug: &str,
        repository: &str,
        permission: Permission,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!("grant:{team_slug}/{repository}"))?;
        state.org_mut(account).team_grants.push((
            team_slug.to_string(),
            repository.to_string(),
            permission,
        ));
        Ok(())
    }

    async fn set_membership(
        &self,
        account: &Account,
        username: &str,
        _role: MemberRole,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!("set_membership:{username}"))?;
        state
            .org_mut(account)
            .invitations
            .push(username.to_string());
        Ok(())
    }

    async fn create_org_webhook(&self, account: &Account, hook: &Webhook) -> Result<(), ApiError> {
        let mut state = self.enter(format!("create_org_webhook:{}", hook.events.join(",")))?;
        state.org_mut(account).webhooks.push(Webhook {
            scope: WebhookScope::Organization,
            ..hook.clone()
        });
        Ok(())
    }

    async fn create_repo_webhook(
        &self,
        account: &Account,
        repository: &str,
        hook: &Webhook,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!(
            "create_repo_webhook:{repository}/{}",
            hook.events.join(",")
        ))?;
        state
            .org_mut(account)
            .repo_webhooks
            .entry(repository.to_string())
            .or_default()
            .push(Webhook {
                scope: WebhookScope::Repository(repository.to_string()),
                ..hook.clone()
            });
        Ok(())
    }

    async fn replace_topics(
        &self,
        account: &Account,
        repository: &str,
        topics: &[String],
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!("replace_topics:{repository}"))?;
        state
            .org_mut(account)
            .topics
            .insert(repository.to_string(), topics.to_vec());
        Ok(())
    }

    async fn protect_branch(
        &self,
        account: &Account,
        repository: &str,
        policy: &BranchProtectionPolicy,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!("protect_branch:{repository}/{}", policy.branch))?;
        state
            .org_mut(account)
            .protections
            .insert(repository.to_string(), policy.clone());
        Ok(())
    }

    async fn remove_member(&self, account: &Account, username: &str) -> Result<(), ApiError> {
        let mut state = self.enter(format!("remove_member:{account}/{username}"))?;
        state.org_mut(account).members.retain(|m| m != username);
        Ok(())
    }

    async fn archive_repository(
        &self,
        account: &Account,
        repository: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.enter(format!("archive:{account}/{repository}"))?;
        let repo = state
            .org_mut(account)
            .repositories
            .iter_mut()
            .find(|r| r.name == repository)
            .ok_or_else(|| ApiError::NotFound {
                message: format!("{account}/{repository}"),
            })?;
        repo.archived = true;
        Ok(())
    }
}

/// A sequential, uncancelled context over `provider` with no topics.
pub fn context(provider: FakeProvider, sources: &[&str], target: &str) -> MigrationContext {
    MigrationContext {
        provider: Arc::new(provider),
        sources: sources.iter().map(|s| Account::new(*s)).collect(),
        target: Account::new(target),
        topics: Vec::new(),
        concurrency: 1,
        cancel: CancelFlag::new(),
    }
}
