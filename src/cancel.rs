use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation shared by the pipeline and its phases.
///
/// Checked between phases and before each item; in-flight requests are
/// allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    requested: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.requested.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// First Ctrl+C requests cancellation, the second exits with status 130.
pub fn install_ctrl_c_handler(flag: CancelFlag) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::warn!("Could not install Ctrl+C handler");
            return;
        }

        tracing::warn!("Shutdown requested, finishing in-flight requests. Press Ctrl+C again to force quit");
        flag.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}
