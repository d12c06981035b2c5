use std::collections::BTreeSet;

use async_trait::async_trait;

use super::MigrationContext;
use crate::catalog::Account;
use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::pipeline::Stage;
use crate::provider::Provider;

/// Names expected on the target but not found there.
///
/// Only names are compared: a team present on both sides with different
/// members still counts as present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub missing_repositories: BTreeSet<String>,
    pub missing_teams: BTreeSet<String>,
}

impl VerificationReport {
    pub fn is_complete(&self) -> bool {
        self.missing_repositories.is_empty() && self.missing_teams.is_empty()
    }
}

fn missing(expected: BTreeSet<String>, actual: &BTreeSet<String>) -> BTreeSet<String> {
    expected.into_iter().filter(|n| !actual.contains(n)).collect()
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

pub async fn verify(
    provider: &dyn Provider,
    sources: &[Account],
    target: &Account,
) -> Result<VerificationReport, ApiError> {
    let mut expected_repos = BTreeSet::new();
    let mut expected_teams = BTreeSet::new();
    for account in sources {
        for repo in provider.list_repositories(account).await? {
            expected_repos.insert(repo.name);
        }
    }
    for account in sources {
        for team in provider.list_teams(account).await? {
            expected_teams.insert(team.name);
        }
    }

    let actual_repos: BTreeSet<String> = provider
        .list_repositories(target)
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    let actual_teams: BTreeSet<String> = provider
        .list_teams(target)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();

    Ok(VerificationReport {
        missing_repositories: missing(expected_repos, &actual_repos),
        missing_teams: missing(expected_teams, &actual_teams),
    })
}

/// Read-only; a non-empty report is logged as a warning and never fails the
/// run.
pub async fn run(ctx: &MigrationContext, ledger: &mut PhaseLedger) -> Result<(), ApiError> {
    let report = verify(ctx.provider.as_ref(), &ctx.sources, &ctx.target).await?;

    if report.missing_repositories.is_empty() {
        tracing::info!("All repositories are present.");
    } else {
        tracing::warn!("Missing repositories: {}", join(&report.missing_repositories));
    }

    if report.missing_teams.is_empty() {
        tracing::info!("All teams are present.");
    } else {
        tracing::warn!("Missing teams: {}", join(&report.missing_teams));
    }

    ledger.verification = Some(report);
    Ok(())
}

pub struct VerifyStage;

#[async_trait]
impl Stage for VerifyStage {
    fn phase(&self) -> Phase {
        Phase::Verify
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
