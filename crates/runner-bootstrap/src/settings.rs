// RunnerConfig: the immutable configuration record read from the environment.

use runner_common::constants::{defaults, variables};
use runner_sdk::{StringUtil, UrlUtil};
use std::fmt;
use std::path::PathBuf;

use crate::error::BootstrapError;
use crate::scope::RegistrationScope;

/// Everything the bootstrap needs, read once at start-up.
///
/// | Field | Variable | Default |
/// |---|---|---|
/// | `owner` | `GITHUB_OWNER` | required |
/// | `token` | `GITHUB_TOKEN` | required |
/// | `base_url` | `GITHUB_URL` | `https://github.com` |
/// | `repository` | `GITHUB_REPOSITORY` | organization scope |
/// | `runner_name` | `RUNNER_NAME` | host name |
/// | `labels` | `RUNNER_LABELS` | `container-apps` |
/// | `runner_group` | `RUNNER_GROUP` | `default` |
/// | `work_directory` | `RUNNER_WORKDIR` | `_work` |
/// | `ephemeral` | `RUNNER_EPHEMERAL` | `true` |
/// | `disable_update` | `RUNNER_DISABLE_UPDATE` | `false` |
/// | `agent_directory` | `RUNNER_HOME` | current directory |
#[derive(Clone)]
pub struct RunnerConfig {
    pub owner: String,
    /// Personal access token. Never printed by `Debug`.
    pub token: String,
    pub base_url: String,
    pub repository: Option<String>,
    pub runner_name: String,
    /// Comma-separated, passed to the agent untouched.
    pub labels: String,
    pub runner_group: String,
    pub work_directory: String,
    pub ephemeral: bool,
    pub disable_update: bool,
    /// Directory holding the agent's `config.sh` and `run.sh`.
    pub agent_directory: PathBuf,
}

impl RunnerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, BootstrapError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Required variables are checked before
    /// anything else is resolved.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BootstrapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| StringUtil::non_empty(lookup(name));

        let owner = get(variables::GITHUB_OWNER)
            .ok_or(BootstrapError::MissingVariable(variables::GITHUB_OWNER))?;
        let token = get(variables::GITHUB_TOKEN)
            .ok_or(BootstrapError::MissingVariable(variables::GITHUB_TOKEN))?;

        let base_url = UrlUtil::normalize_base_url(
            &get(variables::GITHUB_URL).unwrap_or_else(|| defaults::GITHUB_URL.to_string()),
        );

        let runner_name = get(variables::RUNNER_NAME).unwrap_or_else(default_runner_name);

        let ephemeral = parse_bool(
            variables::RUNNER_EPHEMERAL,
            get(variables::RUNNER_EPHEMERAL),
            defaults::RUNNER_EPHEMERAL,
        )?;
        let disable_update = parse_bool(
            variables::RUNNER_DISABLE_UPDATE,
            get(variables::RUNNER_DISABLE_UPDATE),
            defaults::RUNNER_DISABLE_UPDATE,
        )?;

        let agent_directory = get(variables::RUNNER_HOME)
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            owner,
            token,
            base_url,
            repository: get(variables::GITHUB_REPOSITORY),
            runner_name,
            labels: get(variables::RUNNER_LABELS)
                .unwrap_or_else(|| defaults::RUNNER_LABELS.to_string()),
            runner_group: get(variables::RUNNER_GROUP)
                .unwrap_or_else(|| defaults::RUNNER_GROUP.to_string()),
            work_directory: get(variables::RUNNER_WORKDIR)
                .unwrap_or_else(|| defaults::RUNNER_WORKDIR.to_string()),
            ephemeral,
            disable_update,
            agent_directory,
        })
    }

    pub fn scope(&self) -> RegistrationScope {
        RegistrationScope::new(&self.owner, self.repository.as_deref())
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("owner", &self.owner)
            .field("token", &"***")
            .field("base_url", &self.base_url)
            .field("repository", &self.repository)
            .field("runner_name", &self.runner_name)
            .field("labels", &self.labels)
            .field("runner_group", &self.runner_group)
            .field("work_directory", &self.work_directory)
            .field("ephemeral", &self.ephemeral)
            .field("disable_update", &self.disable_update)
            .field("agent_directory", &self.agent_directory)
            .finish()
    }
}

fn default_runner_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| defaults::RUNNER_NAME.to_string())
}

fn parse_bool(
    name: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, BootstrapError> {
    match value {
        None => Ok(default),
        Some(v) => StringUtil::convert_to_bool(&v).ok_or(BootstrapError::InvalidVariable {
            name,
            value: v,
            expected: "expected true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn minimal_environment_uses_defaults() {
        let config =
            RunnerConfig::from_lookup(lookup(&[("GITHUB_OWNER", "octo"), ("GITHUB_TOKEN", "ghp_x")]))
                .unwrap();

        assert_eq!(config.owner, "octo");
        assert_eq!(config.token, "ghp_x");
        assert_eq!(config.base_url, "https://github.com");
        assert_eq!(config.repository, None);
        assert_eq!(config.labels, "container-apps");
        assert_eq!(config.runner_group, "default");
        assert_eq!(config.work_directory, "_work");
        assert!(config.ephemeral);
        assert!(!config.disable_update);
        assert!(!config.runner_name.is_empty());
        assert_eq!(config.scope(), RegistrationScope::new("octo", None));
    }

    #[test]
    fn runner_name_defaults_to_host_name() {
        let config =
            RunnerConfig::from_lookup(lookup(&[("GITHUB_OWNER", "octo"), ("GITHUB_TOKEN", "t")]))
                .unwrap();
        let expected = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "runner".to_string());
        assert_eq!(config.runner_name, expected);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("GITHUB_OWNER", "octo"),
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_URL", "https://ghe.example.com/"),
            ("GITHUB_REPOSITORY", "infra"),
            ("RUNNER_NAME", "aca-1"),
            ("RUNNER_LABELS", "linux,x64,gpu"),
            ("RUNNER_GROUP", "azure"),
            ("RUNNER_WORKDIR", "/tmp/work"),
            ("RUNNER_EPHEMERAL", "false"),
            ("RUNNER_DISABLE_UPDATE", "1"),
            ("RUNNER_HOME", "/home/runner"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://ghe.example.com");
        assert_eq!(config.repository.as_deref(), Some("infra"));
        assert_eq!(config.runner_name, "aca-1");
        assert_eq!(config.labels, "linux,x64,gpu");
        assert_eq!(config.runner_group, "azure");
        assert_eq!(config.work_directory, "/tmp/work");
        assert!(!config.ephemeral);
        assert!(config.disable_update);
        assert_eq!(config.agent_directory, PathBuf::from("/home/runner"));
    }

    #[test]
    fn public_host_with_trailing_slash_uses_public_api() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("GITHUB_OWNER", "octo"),
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_URL", "https://github.com/"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://github.com");
        assert_eq!(
            crate::scope::registration_token_endpoint(&config.base_url, &config.scope()),
            "https://api.github.com/orgs/octo/actions/runners/registration-token"
        );
    }

    #[test]
    fn missing_owner_is_reported_first() {
        let err = RunnerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingVariable("GITHUB_OWNER")));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn missing_or_empty_token_is_rejected() {
        for env in [
            vec![("GITHUB_OWNER", "octo")],
            vec![("GITHUB_OWNER", "octo"), ("GITHUB_TOKEN", "")],
        ] {
            let err = RunnerConfig::from_lookup(lookup(&env)).unwrap_err();
            assert!(matches!(err, BootstrapError::MissingVariable("GITHUB_TOKEN")));
        }
    }

    #[test]
    fn empty_repository_selects_organization() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("GITHUB_OWNER", "octo"),
            ("GITHUB_TOKEN", "t"),
            ("GITHUB_REPOSITORY", ""),
        ]))
        .unwrap();
        assert_eq!(config.repository, None);
        assert_eq!(config.scope().api_path(), "orgs/octo");
    }

    #[test]
    fn invalid_boolean_is_a_configuration_error() {
        let err = RunnerConfig::from_lookup(lookup(&[
            ("GITHUB_OWNER", "octo"),
            ("GITHUB_TOKEN", "t"),
            ("RUNNER_EPHEMERAL", "sometimes"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::InvalidVariable { name: "RUNNER_EPHEMERAL", .. }
        ));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn debug_output_hides_token() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("GITHUB_OWNER", "octo"),
            ("GITHUB_TOKEN", "ghp_supersecret"),
        ]))
        .unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("ghp_supersecret"));
        assert!(printed.contains("octo"));
    }
}
