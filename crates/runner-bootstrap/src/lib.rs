// runner-bootstrap: turns a container start into one registered, running,
// and finally removed self-hosted GitHub Actions runner.

pub mod agent;
pub mod bootstrap;
pub mod error;
pub mod registration;
pub mod scope;
pub mod settings;
pub mod shutdown;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use agent::{AgentAction, AgentError, ConfigureParams, RunnerAgent, ScriptAgent};
pub use bootstrap::Bootstrap;
pub use error::BootstrapError;
pub use registration::{ApiResponse, GitHubClient, RegistrationTokenClient};
pub use scope::RegistrationScope;
pub use settings::RunnerConfig;
