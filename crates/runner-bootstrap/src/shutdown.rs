// Signal handling and the at-most-once deregistration performed on shutdown.

use runner_common::host_context::{HostContext, ShutdownReason};
use runner_common::tracing::Tracing;
use runner_sdk::TraceWriter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::agent::RunnerAgent;

/// Turn Ctrl-C and (on Unix) SIGTERM into `HostContext::shutdown_runner`.
///
/// Must be called from within a Tokio runtime.
pub fn install_signal_handlers(context: &Arc<HostContext>) {
    let ctx = context.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, initiating graceful shutdown");
                ctx.shutdown_runner(ShutdownReason::UserCancelled);
            }
            Err(e) => tracing::warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let ctx = context.clone();
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::spawn(async move {
                    if sigterm.recv().await.is_some() {
                        tracing::info!("SIGTERM received, initiating graceful shutdown");
                        ctx.shutdown_runner(ShutdownReason::OperatingSystemShutdown);
                    }
                });
            }
            Err(e) => tracing::warn!("Failed to listen for SIGTERM: {}", e),
        }
    }
}

/// Best-effort removal of the runner registration, performed at most once.
///
/// Uses the personal access token, not the registration token. Failures are
/// logged and swallowed.
pub struct Deregistration {
    agent: Arc<dyn RunnerAgent>,
    pat: String,
    runner_name: String,
    attempted: AtomicBool,
    trace: Tracing,
}

impl Deregistration {
    pub fn new(
        context: &HostContext,
        agent: Arc<dyn RunnerAgent>,
        pat: impl Into<String>,
        runner_name: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            pat: pat.into(),
            runner_name: runner_name.into(),
            attempted: AtomicBool::new(false),
            trace: context.get_trace("Deregistration"),
        }
    }

    /// Attempt removal. Returns `false` without doing anything if an attempt
    /// was already made.
    pub async fn run(&self) -> bool {
        if self.attempted.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.trace
            .info(&format!("Removing runner '{}'", self.runner_name));

        // The shutdown token is already cancelled; removal gets its own.
        match self.agent.remove(&self.pat, CancellationToken::new()).await {
            Ok(()) => self
                .trace
                .info(&format!("Runner '{}' removed", self.runner_name)),
            Err(e) => self.trace.warning(&format!(
                "Failed to remove runner '{}': {}",
                self.runner_name, e
            )),
        }
        true
    }
}
