// The runner agent capability and its implementation over the bundled scripts.

use async_trait::async_trait;
use runner_common::constants::{agent, return_code};
use runner_common::host_context::HostContext;
use runner_common::tracing::Tracing;
use runner_sdk::process_invoker::{OutputStream, ProcessCancelledError};
use runner_sdk::{ProcessInvoker, TraceWriter};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Which agent operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentAction {
    Configure,
    Run,
    Remove,
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentAction::Configure => write!(f, "configure"),
            AgentAction::Run => write!(f, "run"),
            AgentAction::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("runner agent {action} exited with code {code}")]
    ExitCode { action: AgentAction, code: i32 },

    /// The script could not be started. `code` follows the shell's
    /// 127 (not found) / 126 (not executable) convention.
    #[error("failed to launch runner agent {action}: {message}")]
    Launch {
        action: AgentAction,
        code: i32,
        message: String,
    },

    #[error("runner agent {action} was cancelled")]
    Cancelled { action: AgentAction },
}

impl AgentError {
    /// The agent's own exit code where there is one.
    pub fn exit_code(&self) -> i32 {
        match self {
            AgentError::ExitCode { code, .. } => *code,
            AgentError::Launch { code, .. } => *code,
            AgentError::Cancelled { .. } => return_code::SUCCESS,
        }
    }
}

/// Arguments for an unattended `configure`.
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigureParams {
    /// Repository or organization URL the runner attaches to.
    pub url: String,
    /// Short-lived registration token.
    pub token: String,
    pub name: String,
    pub labels: String,
    pub runner_group: String,
    pub work_directory: String,
    pub ephemeral: bool,
    pub disable_update: bool,
}

impl fmt::Debug for ConfigureParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigureParams")
            .field("url", &self.url)
            .field("token", &"***")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("runner_group", &self.runner_group)
            .field("work_directory", &self.work_directory)
            .field("ephemeral", &self.ephemeral)
            .field("disable_update", &self.disable_update)
            .finish()
    }
}

impl ConfigureParams {
    /// Command-line arguments for the agent's configuration script.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--unattended".into(),
            "--url".into(),
            self.url.clone(),
            "--token".into(),
            self.token.clone(),
            "--name".into(),
            self.name.clone(),
            "--labels".into(),
            self.labels.clone(),
            "--runnergroup".into(),
            self.runner_group.clone(),
            "--work".into(),
            self.work_directory.clone(),
            "--replace".into(),
        ];
        if self.ephemeral {
            args.push("--ephemeral".into());
        }
        if self.disable_update {
            args.push("--disableupdate".into());
        }
        args
    }
}

/// The external runner agent, reduced to the three operations the bootstrap uses.
#[async_trait]
pub trait RunnerAgent: Send + Sync {
    /// Register the agent with GitHub, unattended.
    async fn configure(
        &self,
        params: &ConfigureParams,
        cancel: CancellationToken,
    ) -> Result<(), AgentError>;

    /// Run the agent until it exits; returns its exit code.
    async fn run(&self, cancel: CancellationToken) -> Result<i32, AgentError>;

    /// Deregister the agent using the personal access token.
    async fn remove(&self, pat: &str, cancel: CancellationToken) -> Result<(), AgentError>;
}

/// Drives `config.sh` / `run.sh` from the agent directory.
pub struct ScriptAgent {
    agent_directory: PathBuf,
    trace: Tracing,
    output_trace: Tracing,
}

impl ScriptAgent {
    pub fn new(context: &Arc<HostContext>, agent_directory: PathBuf) -> Self {
        Self {
            agent_directory,
            trace: context.get_trace("RunnerAgent"),
            output_trace: context.get_trace("RunnerAgentOutput"),
        }
    }

    async fn invoke(
        &self,
        action: AgentAction,
        script: &str,
        arguments: &[String],
        cancel: CancellationToken,
    ) -> Result<i32, AgentError> {
        let mut invoker = ProcessInvoker::new(Arc::new(self.trace.clone()) as Arc<dyn TraceWriter>);
        let forwarder = invoker.take_output_receiver().map(|mut rx| {
            let output = self.output_trace.clone();
            tokio::spawn(async move {
                while let Some(line) = rx.recv().await {
                    match line.stream {
                        OutputStream::Stdout => output.info(&line.data),
                        OutputStream::Stderr => output.warning(&line.data),
                    }
                }
            })
        });

        let script_path = self.agent_directory.join(script);
        let result = invoker
            .execute(
                &self.agent_directory,
                &script_path.to_string_lossy(),
                arguments,
                cancel,
            )
            .await;

        drop(invoker);
        if let Some(task) = forwarder {
            let _ = task.await;
        }

        result.map_err(|err| {
            if err.downcast_ref::<ProcessCancelledError>().is_some() {
                AgentError::Cancelled { action }
            } else {
                AgentError::Launch {
                    action,
                    code: launch_exit_code(&err),
                    message: format!("{err:#}"),
                }
            }
        })
    }

    fn check_exit(action: AgentAction, code: i32) -> Result<(), AgentError> {
        if code == 0 {
            Ok(())
        } else {
            Err(AgentError::ExitCode { action, code })
        }
    }
}

fn launch_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<std::io::Error>().map(|e| e.kind()) {
        Some(std::io::ErrorKind::NotFound) => return_code::AGENT_NOT_FOUND,
        _ => return_code::AGENT_NOT_EXECUTABLE,
    }
}

#[async_trait]
impl RunnerAgent for ScriptAgent {
    async fn configure(
        &self,
        params: &ConfigureParams,
        cancel: CancellationToken,
    ) -> Result<(), AgentError> {
        self.trace.info(&format!(
            "Configuring runner '{}' for {}",
            params.name, params.url
        ));
        let code = self
            .invoke(
                AgentAction::Configure,
                agent::CONFIG_SCRIPT,
                &params.to_args(),
                cancel,
            )
            .await?;
        Self::check_exit(AgentAction::Configure, code)
    }

    async fn run(&self, cancel: CancellationToken) -> Result<i32, AgentError> {
        self.trace.info("Starting runner agent");
        self.invoke(AgentAction::Run, agent::RUN_SCRIPT, &[], cancel)
            .await
    }

    async fn remove(&self, pat: &str, cancel: CancellationToken) -> Result<(), AgentError> {
        let args = vec![
            agent::REMOVE_COMMAND.to_string(),
            "--token".to_string(),
            pat.to_string(),
        ];
        let code = self
            .invoke(AgentAction::Remove, agent::CONFIG_SCRIPT, &args, cancel)
            .await?;
        Self::check_exit(AgentAction::Remove, code)
    }
}
