//! In-memory shapes of the resources the migration moves around.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An organization on the hosting platform.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Permission flags the platform reports for a repository seen through a team.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// Permission tier granted to a team on a repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Pull,
    Push,
    Admin,
}

impl Permission {
    /// Highest tier the flags report, admin > push > pull.
    pub fn from_flags(flags: &RepoPermissions) -> Self {
        if flags.admin {
            Permission::Admin
        } else if flags.push {
            Permission::Push
        } else {
            Permission::Pull
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Pull => "pull",
            Permission::Push => "push",
            Permission::Admin => "admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    pub owner: Account,
    pub default_branch: String,
    pub archived: bool,
    /// Only present when the repository was listed through a team.
    pub permissions: Option<RepoPermissions>,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamPrivacy {
    Secret,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub privacy: TeamPrivacy,
}

/// Role of a user inside an organization or a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Maintainer,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Maintainer => "maintainer",
            MemberRole::Admin => "admin",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    pub account: Account,
    pub username: String,
    pub role: MemberRole,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookScope {
    Organization,
    Repository(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Webhook {
    pub scope: WebhookScope,
    pub name: String,
    pub config: serde_json::Value,
    pub events: Vec<String>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequirements {
    pub dismiss_stale_reviews: bool,
    pub require_code_owner_reviews: bool,
    pub required_approving_review_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheckRequirements {
    pub strict: bool,
    pub contexts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRestrictions {
    pub users: Vec<String>,
    pub teams: Vec<String>,
}

/// Branch protection applied to every migrated repository's default branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BranchProtectionPolicy {
    pub branch: String,
    pub enforce_admins: bool,
    pub required_reviews: Option<ReviewRequirements>,
    pub required_status_checks: Option<StatusCheckRequirements>,
    pub restrictions: Option<PushRestrictions>,
}

impl BranchProtectionPolicy {
    /// The uniform policy: admins included, two approving code-owner reviews,
    /// stale reviews dismissed, no status checks and no push restrictions.
    pub fn standard(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            enforce_admins: true,
            required_reviews: Some(ReviewRequirements {
                dismiss_stale_reviews: true,
                require_code_owner_reviews: true,
                required_approving_review_count: 2,
            }),
            required_status_checks: None,
            restrictions: None,
        }
    }
}
