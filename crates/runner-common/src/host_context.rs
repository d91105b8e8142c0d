// Process-wide context: secret masking, trace sources and shutdown coordination.

use crate::constants;
use crate::secret_masker::SecretMasker;
use crate::tracing::{TraceManager, TraceSetting, Tracing};

use runner_sdk::StringUtil;
use std::env;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

/// The reason the bootstrap is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl-C / SIGINT.
    UserCancelled,
    /// SIGTERM, typically the job scheduler enforcing its timeout.
    OperatingSystemShutdown,
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::UserCancelled => write!(f, "UserCancelled"),
            ShutdownReason::OperatingSystemShutdown => write!(f, "OperatingSystemShutdown"),
        }
    }
}

/// Shared application context.
///
/// Owns the secret masker every trace source reads from and the single
/// cancellation token that signal handlers trip.
pub struct HostContext {
    secret_masker: Arc<SecretMasker>,
    trace_manager: TraceManager,
    shutdown_token: CancellationToken,
    shutdown_reason: OnceLock<ShutdownReason>,
}

impl HostContext {
    /// Create a context whose trace setting honours `RUNNER_PRINT_LOG_TO_STDOUT`.
    pub fn new() -> Arc<Self> {
        let print_to_stdout = env::var(constants::variables::PRINT_LOG_TO_STDOUT)
            .ok()
            .and_then(|v| StringUtil::convert_to_bool(&v))
            .unwrap_or(false);

        Self::with_setting(TraceSetting {
            print_to_stdout,
            ..TraceSetting::default()
        })
    }

    pub fn with_setting(setting: TraceSetting) -> Arc<Self> {
        let secret_masker = Arc::new(SecretMasker::new());
        let trace_manager = TraceManager::with_setting(secret_masker.clone(), setting);

        Arc::new(Self {
            secret_masker,
            trace_manager,
            shutdown_token: CancellationToken::new(),
            shutdown_reason: OnceLock::new(),
        })
    }

    /// Get a named trace source.
    pub fn get_trace(&self, name: &str) -> Tracing {
        self.trace_manager.get(name)
    }

    /// Register a value that must never appear in log output.
    pub fn add_secret(&self, secret: &str) {
        self.secret_masker.add_value(secret);
    }

    pub fn secret_masker(&self) -> &Arc<SecretMasker> {
        &self.secret_masker
    }

    /// Token cancelled once shutdown has been requested.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Request shutdown. The first reason wins; later calls only re-cancel.
    pub fn shutdown_runner(&self, reason: ShutdownReason) {
        if self.shutdown_reason.set(reason).is_ok() {
            tracing::info!("Shutdown requested: {}", reason);
        }
        self.shutdown_token.cancel();
    }

    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        self.shutdown_reason.get().copied()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }
}
