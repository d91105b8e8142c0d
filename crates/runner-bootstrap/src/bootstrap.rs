// The bootstrap pipeline: token exchange, configure, run, and cleanup on shutdown.

use runner_common::constants::return_code;
use runner_common::host_context::HostContext;
use runner_sdk::TraceWriter;
use std::sync::Arc;

use crate::agent::{ConfigureParams, RunnerAgent};
use crate::error::BootstrapError;
use crate::registration::{parse_registration_token, RegistrationTokenClient};
use crate::scope::{registration_token_endpoint, RegistrationScope};
use crate::settings::RunnerConfig;
use crate::shutdown::Deregistration;

pub struct Bootstrap {
    config: RunnerConfig,
    context: Arc<HostContext>,
    client: Arc<dyn RegistrationTokenClient>,
    agent: Arc<dyn RunnerAgent>,
    trace: Arc<dyn TraceWriter>,
}

impl Bootstrap {
    pub fn new(
        config: RunnerConfig,
        context: Arc<HostContext>,
        client: Arc<dyn RegistrationTokenClient>,
        agent: Arc<dyn RunnerAgent>,
    ) -> Self {
        context.add_secret(&config.token);
        let trace: Arc<dyn TraceWriter> = Arc::new(context.get_trace("Bootstrap"));
        Self {
            config,
            context,
            client,
            agent,
            trace,
        }
    }

    /// Send pipeline diagnostics to `trace` instead of the context's
    /// `Bootstrap` source.
    pub fn with_trace(mut self, trace: Arc<dyn TraceWriter>) -> Self {
        self.trace = trace;
        self
    }

    /// Run the whole pipeline and return the process exit code.
    ///
    /// Once the context's shutdown token fires, in-flight work is abandoned,
    /// the runner is removed (at most once) and the result is always success.
    pub async fn execute(&self) -> i32 {
        let deregistration = Deregistration::new(
            &self.context,
            self.agent.clone(),
            self.config.token.clone(),
            self.config.runner_name.clone(),
        );

        let result = self.register_and_run().await;

        if self.context.is_shutdown_requested() {
            if let Some(reason) = self.context.shutdown_reason() {
                self.trace
                    .info(&format!("Shutting down ({reason}), cleaning up runner"));
            }
            deregistration.run().await;
            return return_code::SUCCESS;
        }

        match result {
            Ok(code) => {
                self.trace
                    .info(&format!("Runner agent exited with code {code}"));
                code
            }
            Err(err) => {
                self.report(&err);
                err.exit_code()
            }
        }
    }

    async fn register_and_run(&self) -> Result<i32, BootstrapError> {
        let shutdown = self.context.shutdown_token();
        let scope = self.config.scope();
        let runner_url = scope.runner_url(&self.config.base_url);
        let endpoint = registration_token_endpoint(&self.config.base_url, &scope);

        self.trace.info(&format!(
            "Registering runner '{}' at {} scope: {}",
            self.config.runner_name,
            scope.kind(),
            runner_url
        ));
        self.trace
            .verbose(&format!("Requesting registration token from {endpoint}"));

        let response = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(return_code::SUCCESS),
            response = self.client.request_registration_token(&endpoint, &self.config.token) => response?,
        };

        let token = parse_registration_token(&response.body).ok_or_else(|| {
            BootstrapError::RegistrationToken {
                endpoint: endpoint.clone(),
                status: response.status,
                body: response.body.clone(),
            }
        })?;
        self.context.add_secret(&token);
        self.trace.info("Obtained registration token");

        let params = ConfigureParams {
            url: runner_url,
            token,
            name: self.config.runner_name.clone(),
            labels: self.config.labels.clone(),
            runner_group: self.config.runner_group.clone(),
            work_directory: self.config.work_directory.clone(),
            ephemeral: self.config.ephemeral,
            disable_update: self.config.disable_update,
        };
        self.agent.configure(&params, shutdown.clone()).await?;

        if shutdown.is_cancelled() {
            return Ok(return_code::SUCCESS);
        }

        Ok(self.agent.run(shutdown).await?)
    }

    fn report(&self, err: &BootstrapError) {
        self.trace.error_err(err);
        if let BootstrapError::RegistrationToken { body, .. } = err {
            self.trace.error(&format!("Response: {body}"));
            self.trace
                .error(&pat_scope_checklist(&self.config.scope()));
        }
    }
}

/// Guidance printed when GitHub refuses to issue a token.
pub fn pat_scope_checklist(scope: &RegistrationScope) -> String {
    format!(
        "Check that GITHUB_TOKEN is valid, has not expired, and has the '{}' scope for {} registration",
        scope.required_pat_scope(),
        scope.kind()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CollectingTraceWriter, FakeAgent, RunBehavior, StaticTokenClient};
    use runner_common::host_context::ShutdownReason;
    use runner_common::tracing::TraceSetting;

    fn config(repository: Option<&str>) -> RunnerConfig {
        let repository = repository.map(str::to_string);
        RunnerConfig::from_lookup(move |name| match name {
            "GITHUB_OWNER" => Some("octo".into()),
            "GITHUB_TOKEN" => Some("ghp_pat".into()),
            "GITHUB_REPOSITORY" => repository.clone(),
            "RUNNER_NAME" => Some("aca-1".into()),
            _ => None,
        })
        .unwrap()
    }

    fn bootstrap(
        repository: Option<&str>,
        client: Arc<StaticTokenClient>,
        agent: Arc<FakeAgent>,
    ) -> (Bootstrap, Arc<HostContext>) {
        let context = HostContext::with_setting(TraceSetting::default());
        let bootstrap = Bootstrap::new(config(repository), context.clone(), client, agent);
        (bootstrap, context)
    }

    #[tokio::test]
    async fn missing_token_exits_4_without_configuring() {
        for body in [r#"{"token":null}"#, r#"{"token":""}"#] {
            let client = Arc::new(StaticTokenClient::responding(200, body));
            let agent = Arc::new(FakeAgent::new());
            let trace = Arc::new(CollectingTraceWriter::new());
            let (bootstrap, _) = bootstrap(Some("hello"), client, agent.clone());
            let bootstrap = bootstrap.with_trace(trace.clone());

            assert_eq!(bootstrap.execute().await, 4);
            assert!(agent.configured().is_empty());
            assert_eq!(agent.runs(), 0);
            assert!(agent.removals().is_empty());

            assert!(trace.error_contains(&format!("Response: {body}")), "{body}");
            assert!(trace.error_contains("'repo' scope for repository registration"));
        }
    }

    #[tokio::test]
    async fn organization_token_failure_names_admin_org_scope() {
        let client = Arc::new(StaticTokenClient::responding(
            401,
            r#"{"message":"Bad credentials"}"#,
        ));
        let trace = Arc::new(CollectingTraceWriter::new());
        let (bootstrap, _) = bootstrap(None, client, Arc::new(FakeAgent::new()));
        let bootstrap = bootstrap.with_trace(trace.clone());

        assert_eq!(bootstrap.execute().await, 4);
        assert!(trace.error_contains("(HTTP 401)"));
        assert!(trace.error_contains(r#"Response: {"message":"Bad credentials"}"#));
        assert!(trace.error_contains("'admin:org' scope for organization registration"));
    }

    #[tokio::test]
    async fn token_and_scope_url_reach_configure() {
        let client = Arc::new(StaticTokenClient::responding(201, r#"{"token":"abc123"}"#));
        let agent = Arc::new(FakeAgent::new());
        let (bootstrap, _) = bootstrap(Some("hello"), client.clone(), agent.clone());

        assert_eq!(bootstrap.execute().await, 0);

        assert_eq!(
            client.calls(),
            vec![(
                "https://api.github.com/repos/octo/hello/actions/runners/registration-token"
                    .to_string(),
                "ghp_pat".to_string()
            )]
        );
        let configured = agent.configured();
        assert_eq!(configured.len(), 1);
        assert_eq!(configured[0].token, "abc123");
        assert_eq!(configured[0].url, "https://github.com/octo/hello");
        assert_eq!(configured[0].name, "aca-1");
        assert_eq!(agent.runs(), 1);
    }

    #[tokio::test]
    async fn organization_scope_uses_orgs_endpoint() {
        let client = Arc::new(StaticTokenClient::responding(201, r#"{"token":"abc123"}"#));
        let agent = Arc::new(FakeAgent::new());
        let (bootstrap, _) = bootstrap(None, client.clone(), agent.clone());

        bootstrap.execute().await;

        assert_eq!(
            client.calls()[0].0,
            "https://api.github.com/orgs/octo/actions/runners/registration-token"
        );
        assert_eq!(agent.configured()[0].url, "https://github.com/octo");
    }

    #[tokio::test]
    async fn run_exit_code_is_propagated() {
        let client = Arc::new(StaticTokenClient::responding(201, r#"{"token":"abc123"}"#));
        let agent = Arc::new(FakeAgent::new().with_run(RunBehavior::Exit(3)));
        let (bootstrap, _) = bootstrap(Some("hello"), client, agent);

        assert_eq!(bootstrap.execute().await, 3);
    }

    #[tokio::test]
    async fn configure_failure_skips_run() {
        let client = Arc::new(StaticTokenClient::responding(201, r#"{"token":"abc123"}"#));
        let agent = Arc::new(FakeAgent::new().failing_configure(2));
        let (bootstrap, _) = bootstrap(Some("hello"), client, agent.clone());

        assert_eq!(bootstrap.execute().await, 2);
        assert_eq!(agent.runs(), 0);
    }

    #[tokio::test]
    async fn registration_token_is_masked_after_exchange() {
        let client = Arc::new(StaticTokenClient::responding(201, r#"{"token":"abc123"}"#));
        let agent = Arc::new(FakeAgent::new());
        let (bootstrap, context) = bootstrap(Some("hello"), client, agent);

        bootstrap.execute().await;

        let masked = context.secret_masker().mask_secrets("abc123 ghp_pat");
        assert!(!masked.contains("abc123"));
        assert!(!masked.contains("ghp_pat"));
    }

    #[tokio::test]
    async fn interrupt_during_run_removes_runner_once() {
        let client = Arc::new(StaticTokenClient::responding(201, r#"{"token":"abc123"}"#));
        let agent = Arc::new(FakeAgent::new().with_run(RunBehavior::UntilCancelled));
        let (bootstrap, context) = bootstrap(Some("hello"), client, agent.clone());

        let task = tokio::spawn(async move { bootstrap.execute().await });
        agent.wait_for_run().await;
        context.shutdown_runner(ShutdownReason::OperatingSystemShutdown);

        assert_eq!(task.await.unwrap(), 0);
        assert_eq!(agent.removals(), vec!["ghp_pat".to_string()]);
    }

    #[tokio::test]
    async fn failed_removal_still_exits_0() {
        let client = Arc::new(StaticTokenClient::responding(201, r#"{"token":"abc123"}"#));
        let agent = Arc::new(
            FakeAgent::new()
                .with_run(RunBehavior::UntilCancelled)
                .failing_remove(1),
        );
        let (bootstrap, context) = bootstrap(Some("hello"), client, agent.clone());

        let task = tokio::spawn(async move { bootstrap.execute().await });
        agent.wait_for_run().await;
        context.shutdown_runner(ShutdownReason::UserCancelled);

        assert_eq!(task.await.unwrap(), 0);
        assert_eq!(agent.removals().len(), 1);
    }

    #[tokio::test]
    async fn interrupt_during_token_exchange_skips_configure() {
        let client = Arc::new(StaticTokenClient::hanging());
        let agent = Arc::new(FakeAgent::new());
        let (bootstrap, context) = bootstrap(Some("hello"), client.clone(), agent.clone());

        let task = tokio::spawn(async move { bootstrap.execute().await });
        client.wait_for_request().await;
        context.shutdown_runner(ShutdownReason::UserCancelled);

        assert_eq!(task.await.unwrap(), 0);
        assert!(agent.configured().is_empty());
        assert_eq!(agent.runs(), 0);
        assert_eq!(agent.removals(), vec!["ghp_pat".to_string()]);
    }

    #[test]
    fn checklist_names_required_scope() {
        let org = RegistrationScope::new("octo", None);
        assert!(pat_scope_checklist(&org).contains("admin:org"));
        let repo = RegistrationScope::new("octo", Some("hello"));
        assert!(pat_scope_checklist(&repo).contains("'repo'"));
    }
}
