//! Per-phase record of item outcomes.

use std::fmt;

use crate::catalog::Account;
use crate::error::ApiError;
use crate::phases::verify::VerificationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Transfer,
    Teams,
    Members,
    Webhooks,
    Settings,
    Verify,
    Decommission,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Transfer => "transfer",
            Phase::Teams => "teams",
            Phase::Members => "members",
            Phase::Webhooks => "webhooks",
            Phase::Settings => "settings",
            Phase::Verify => "verify",
            Phase::Decommission => "decommission",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub account: Account,
    pub action: &'static str,
    pub item: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub account: Account,
    pub action: &'static str,
    pub item: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseLedger {
    pub phase: Phase,
    pub completed: Vec<ItemRecord>,
    pub failures: Vec<ItemFailure>,
    /// Items not attempted because the run was cancelled.
    pub skipped: Vec<ItemRecord>,
    /// Set when an error escaped the item boundaries and ended the phase early.
    pub aborted: Option<String>,
    pub verification: Option<VerificationReport>,
}

impl PhaseLedger {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            completed: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            aborted: None,
            verification: None,
        }
    }

    /// Records the outcome of one item and logs it. Returns the success value
    /// so callers can chain dependent work.
    pub fn record<T>(
        &mut self,
        account: &Account,
        action: &'static str,
        item: impl Into<String>,
        result: Result<T, ApiError>,
    ) -> Option<T> {
        let item = item.into();
        match result {
            Ok(value) => {
                tracing::info!(phase = %self.phase, account = %account, "{action} {item}: done");
                self.completed.push(ItemRecord {
                    account: account.clone(),
                    action,
                    item,
                });
                Some(value)
            }
            Err(err) => {
                tracing::error!(
                    phase = %self.phase,
                    account = %account,
                    "Failed to {action} {item}: {err}"
                );
                self.failures.push(ItemFailure {
                    account: account.clone(),
                    action,
                    item,
                    error: err.to_string(),
                });
                None
            }
        }
    }

    pub fn skip(&mut self, account: &Account, action: &'static str, item: impl Into<String>) {
        let item = item.into();
        tracing::warn!(phase = %self.phase, account = %account, "Skipped {action} {item}: cancelled");
        self.skipped.push(ItemRecord {
            account: account.clone(),
            action,
            item,
        });
    }

    pub fn abort(&mut self, reason: impl fmt::Display) {
        let reason = reason.to_string();
        tracing::error!(phase = %self.phase, "Phase {} stopped early: {reason}", self.phase);
        self.aborted = Some(reason);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }

    pub fn count(&self, action: &str) -> usize {
        self.completed.iter().filter(|r| r.action == action).count()
    }
}
