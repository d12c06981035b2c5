//! The migration phases. Each phase re-reads its inputs from the provider,
//! so a failed phase never hands stale state to the next one.

pub mod decommission;
pub mod members;
pub mod settings;
pub mod teams;
pub mod transfer;
pub mod verify;
pub mod webhooks;

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};

use crate::cancel::CancelFlag;
use crate::catalog::Account;
use crate::cli::MigrationConfig;
use crate::error::ApiError;
use crate::ledger::PhaseLedger;
use crate::provider::Provider;

/// Everything a phase needs; built once per run.
#[derive(Clone)]
pub struct MigrationContext {
    pub provider: Arc<dyn Provider>,
    pub sources: Vec<Account>,
    pub target: Account,
    /// Empty means topics are left untouched.
    pub topics: Vec<String>,
    /// Per-item operations allowed in flight within one batch.
    pub concurrency: usize,
    pub cancel: CancelFlag,
}

impl MigrationContext {
    pub fn new(provider: Arc<dyn Provider>, config: &MigrationConfig, cancel: CancelFlag) -> Self {
        Self {
            provider,
            sources: config.sources.clone(),
            target: config.target.clone(),
            topics: config.topics.clone(),
            concurrency: config.concurrency,
            cancel,
        }
    }
}

pub(crate) type ItemOp<'a> = (String, BoxFuture<'a, Result<(), ApiError>>);

/// Runs a batch of independent item operations, recording each outcome.
///
/// Results are recorded in input order. An item that fails never affects its
/// siblings; once cancellation is requested the remaining items are skipped.
pub(crate) async fn run_items<'a>(
    ctx: &MigrationContext,
    ledger: &mut PhaseLedger,
    account: &Account,
    action: &'static str,
    items: Vec<ItemOp<'a>>,
) {
    // Built up front so no closure ends up in the stream's type; the stage
    // futures must stay `Send`.
    let pending: Vec<_> = items
        .into_iter()
        .map(|(item, op)| {
            let cancel = ctx.cancel.clone();
            async move {
                if cancel.is_cancelled() {
                    (item, None)
                } else {
                    (item, Some(op.await))
                }
            }
        })
        .collect();
    let mut outcomes = stream::iter(pending).buffered(ctx.concurrency.max(1));

    while let Some((item, outcome)) = outcomes.next().await {
        match outcome {
            Some(result) => {
                ledger.record(account, action, item, result);
            }
            None => ledger.skip(account, action, item),
        }
    }
}
