//! In-memory stand-ins for the GitHub API, the runner agent and trace output.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use runner_sdk::TraceWriter;

use crate::agent::{AgentAction, AgentError, ConfigureParams, RunnerAgent};
use crate::error::BootstrapError;
use crate::registration::{ApiResponse, RegistrationTokenClient};

/// How [`FakeAgent::run`] behaves.
#[derive(Debug, Clone, Copy)]
pub enum RunBehavior {
    /// Return this exit code immediately.
    Exit(i32),
    /// Block until cancelled, then report cancellation.
    UntilCancelled,
}

/// Records every call and never touches a real process.
pub struct FakeAgent {
    configure_failure: Option<i32>,
    remove_failure: Option<i32>,
    run_behavior: RunBehavior,
    configured: Mutex<Vec<ConfigureParams>>,
    runs: AtomicUsize,
    removals: Mutex<Vec<String>>,
    run_started: Notify,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self {
            configure_failure: None,
            remove_failure: None,
            run_behavior: RunBehavior::Exit(0),
            configured: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
            removals: Mutex::new(Vec::new()),
            run_started: Notify::new(),
        }
    }

    pub fn with_run(mut self, behavior: RunBehavior) -> Self {
        self.run_behavior = behavior;
        self
    }

    pub fn failing_configure(mut self, code: i32) -> Self {
        self.configure_failure = Some(code);
        self
    }

    pub fn failing_remove(mut self, code: i32) -> Self {
        self.remove_failure = Some(code);
        self
    }

    pub fn configured(&self) -> Vec<ConfigureParams> {
        self.configured.lock().clone()
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// PATs passed to `remove`, in call order.
    pub fn removals(&self) -> Vec<String> {
        self.removals.lock().clone()
    }

    /// Resolves once `run` has been entered.
    pub async fn wait_for_run(&self) {
        self.run_started.notified().await;
    }
}

impl Default for FakeAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RunnerAgent for FakeAgent {
    async fn configure(
        &self,
        params: &ConfigureParams,
        _cancel: CancellationToken,
    ) -> Result<(), AgentError> {
        self.configured.lock().push(params.clone());
        match self.configure_failure {
            Some(code) => Err(AgentError::ExitCode {
                action: AgentAction::Configure,
                code,
            }),
            None => Ok(()),
        }
    }

    async fn run(&self, cancel: CancellationToken) -> Result<i32, AgentError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.run_started.notify_one();
        match self.run_behavior {
            RunBehavior::Exit(code) => Ok(code),
            RunBehavior::UntilCancelled => {
                cancel.cancelled().await;
                Err(AgentError::Cancelled {
                    action: AgentAction::Run,
                })
            }
        }
    }

    async fn remove(&self, pat: &str, _cancel: CancellationToken) -> Result<(), AgentError> {
        self.removals.lock().push(pat.to_string());
        match self.remove_failure {
            Some(code) => Err(AgentError::ExitCode {
                action: AgentAction::Remove,
                code,
            }),
            None => Ok(()),
        }
    }
}

/// Answers every token request with the same canned response, or never answers.
pub struct StaticTokenClient {
    response: Option<ApiResponse>,
    calls: Mutex<Vec<(String, String)>>,
    requested: Notify,
}

impl StaticTokenClient {
    pub fn responding(status: u16, body: impl Into<String>) -> Self {
        Self {
            response: Some(ApiResponse {
                status,
                body: body.into(),
            }),
            calls: Mutex::new(Vec::new()),
            requested: Notify::new(),
        }
    }

    /// A client whose requests stay in flight forever.
    pub fn hanging() -> Self {
        Self {
            response: None,
            calls: Mutex::new(Vec::new()),
            requested: Notify::new(),
        }
    }

    /// `(endpoint, pat)` for each request made.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub async fn wait_for_request(&self) {
        self.requested.notified().await;
    }
}

#[async_trait]
impl RegistrationTokenClient for StaticTokenClient {
    async fn request_registration_token(
        &self,
        endpoint: &str,
        pat: &str,
    ) -> Result<ApiResponse, BootstrapError> {
        self.calls
            .lock()
            .push((endpoint.to_string(), pat.to_string()));
        self.requested.notify_one();
        match &self.response {
            Some(response) => Ok(response.clone()),
            None => std::future::pending().await,
        }
    }
}

/// Keeps every trace line in memory, tagged with whether it was an error.
#[derive(Default)]
pub struct CollectingTraceWriter {
    lines: Mutex<Vec<(bool, String)>>,
}

impl CollectingTraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if an error line contains `needle`.
    pub fn error_contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .iter()
            .any(|(is_error, line)| *is_error && line.contains(needle))
    }
}

impl TraceWriter for CollectingTraceWriter {
    fn info(&self, message: &str) {
        self.lines.lock().push((false, message.to_string()));
    }

    fn verbose(&self, message: &str) {
        self.info(message);
    }

    fn error(&self, message: &str) {
        self.lines.lock().push((true, message.to_string()));
    }
}
