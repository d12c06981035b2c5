//! Ordered execution of the migration stages.
//!
//! Every stage receives the previous stage's ledger but never gates on it: a
//! failed or aborted phase is recorded and the next phase starts anyway.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::ledger::{Phase, PhaseLedger};
use crate::phases::decommission::DecommissionStage;
use crate::phases::members::MembersStage;
use crate::phases::settings::SettingsStage;
use crate::phases::teams::TeamsStage;
use crate::phases::transfer::TransferStage;
use crate::phases::verify::{VerificationReport, VerifyStage};
use crate::phases::webhooks::WebhooksStage;
use crate::phases::MigrationContext;

#[async_trait]
pub trait Stage: Send + Sync {
    fn phase(&self) -> Phase;

    /// Item failures go into `ledger`; an `Err` marks the phase as aborted.
    async fn run(
        &self,
        ctx: &MigrationContext,
        previous: Option<&PhaseLedger>,
        ledger: &mut PhaseLedger,
    ) -> Result<(), ApiError>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Transfer, teams, members, webhooks, settings, verify and, unless
    /// left out, decommission.
    pub fn standard(include_decommission: bool) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = vec![
            Box::new(TransferStage),
            Box::new(TeamsStage),
            Box::new(MembersStage),
            Box::new(WebhooksStage),
            Box::new(SettingsStage),
            Box::new(VerifyStage),
        ];
        if include_decommission {
            stages.push(Box::new(DecommissionStage));
        }
        Self::new(stages)
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.stages.iter().map(|s| s.phase()).collect()
    }

    pub async fn run(&self, ctx: &MigrationContext) -> MigrationReport {
        let mut ledgers: Vec<PhaseLedger> = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let phase = stage.phase();
            let mut ledger = PhaseLedger::new(phase);

            if ctx.cancel.is_cancelled() {
                ledger.abort("cancelled before start");
                ledgers.push(ledger);
                continue;
            }

            tracing::info!(phase = %phase, "Starting phase {phase}");
            if let Err(err) = stage.run(ctx, ledgers.last(), &mut ledger).await {
                ledger.abort(err);
            }
            tracing::info!(
                phase = %phase,
                completed = ledger.completed.len(),
                failed = ledger.failures.len(),
                skipped = ledger.skipped.len(),
                "Finished phase {phase}"
            );

            ledgers.push(ledger);
        }

        MigrationReport { ledgers }
    }
}

#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub ledgers: Vec<PhaseLedger>,
}

impl MigrationReport {
    pub fn ledger(&self, phase: Phase) -> Option<&PhaseLedger> {
        self.ledgers.iter().find(|l| l.phase == phase)
    }

    pub fn total_failures(&self) -> usize {
        self.ledgers.iter().map(|l| l.failures.len()).sum()
    }

    pub fn verification(&self) -> Option<&VerificationReport> {
        self.ledger(Phase::Verify)
            .and_then(|l| l.verification.as_ref())
    }

    /// Logs one summary line per phase followed by every recorded failure.
    pub fn log_summary(&self) {
        for ledger in &self.ledgers {
            match &ledger.aborted {
                Some(reason) => tracing::warn!(
                    "{}: {} completed, {} failed, {} skipped, stopped early: {}",
                    ledger.phase,
                    ledger.completed.len(),
                    ledger.failures.len(),
                    ledger.skipped.len(),
                    reason
                ),
                None => tracing::info!(
                    "{}: {} completed, {} failed, {} skipped",
                    ledger.phase,
                    ledger.completed.len(),
                    ledger.failures.len(),
                    ledger.skipped.len()
                ),
            }
        }

        for ledger in &self.ledgers {
            for failure in &ledger.failures {
                tracing::warn!(
                    "[{}] {}: {} {}: {}",
                    ledger.phase,
                    failure.account,
                    failure.action,
                    failure.item,
                    failure.error
                );
            }
        }

        tracing::info!(
            "Migration finished with {} item failures",
            self.total_failures()
        );
    }
}
