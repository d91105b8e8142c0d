// Error taxonomy for the bootstrap and its mapping onto process exit codes.

use runner_common::constants::return_code;

use crate::agent::AgentError;

/// Everything that can stop the bootstrap before the runner agent exits.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// A required environment variable is unset or empty.
    #[error("{0} environment variable must be set")]
    MissingVariable(&'static str),

    /// An optional environment variable holds a value that cannot be parsed.
    #[error("{name} has invalid value '{value}': {expected}")]
    InvalidVariable {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// GitHub answered, but without a usable registration token.
    #[error("failed to obtain a registration token from {endpoint} (HTTP {status})")]
    RegistrationToken {
        endpoint: String,
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// The token request never produced a response.
    #[error("registration token request to {endpoint} failed")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BootstrapError {
    /// Process exit code for this failure.
    ///
    /// Agent failures surface the agent's own exit code unchanged.
    pub fn exit_code(&self) -> i32 {
        match self {
            BootstrapError::MissingVariable(_) | BootstrapError::InvalidVariable { .. } => {
                return_code::CONFIGURATION_ERROR
            }
            BootstrapError::RegistrationToken { .. } | BootstrapError::Http { .. } => {
                return_code::REGISTRATION_TOKEN_ERROR
            }
            BootstrapError::Agent(err) => err.exit_code(),
            BootstrapError::Internal(_) => return_code::CONFIGURATION_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentAction;

    #[test]
    fn configuration_errors_exit_1() {
        assert_eq!(BootstrapError::MissingVariable("GITHUB_OWNER").exit_code(), 1);
        let invalid = BootstrapError::InvalidVariable {
            name: "RUNNER_EPHEMERAL",
            value: "maybe".into(),
            expected: "true or false",
        };
        assert_eq!(invalid.exit_code(), 1);
    }

    #[test]
    fn token_errors_exit_4() {
        let err = BootstrapError::RegistrationToken {
            endpoint: "https://api.github.com/orgs/octo/actions/runners/registration-token".into(),
            status: 200,
            body: r#"{"token":null}"#.into(),
        };
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn agent_errors_keep_agent_exit_code() {
        let err = BootstrapError::from(AgentError::ExitCode {
            action: AgentAction::Configure,
            code: 3,
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn missing_variable_message_names_variable() {
        let err = BootstrapError::MissingVariable("GITHUB_TOKEN");
        assert_eq!(err.to_string(), "GITHUB_TOKEN environment variable must be set");
    }
}
