// Repository vs organization scope and the GitHub URLs derived from it.

use runner_sdk::UrlUtil;

/// Where the runner is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationScope {
    Repository { owner: String, repo: String },
    Organization { owner: String },
}

impl RegistrationScope {
    /// Repository scope when `repository` is non-empty, organization scope otherwise.
    pub fn new(owner: &str, repository: Option<&str>) -> Self {
        match repository.filter(|r| !r.is_empty()) {
            Some(repo) => RegistrationScope::Repository {
                owner: owner.to_string(),
                repo: repo.to_string(),
            },
            None => RegistrationScope::Organization {
                owner: owner.to_string(),
            },
        }
    }

    /// REST path segment: `repos/{owner}/{repo}` or `orgs/{owner}`.
    pub fn api_path(&self) -> String {
        match self {
            RegistrationScope::Repository { owner, repo } => format!("repos/{owner}/{repo}"),
            RegistrationScope::Organization { owner } => format!("orgs/{owner}"),
        }
    }

    /// URL handed to the runner agent: `{base}/{owner}/{repo}` or `{base}/{owner}`.
    pub fn runner_url(&self, base_url: &str) -> String {
        match self {
            RegistrationScope::Repository { owner, repo } => format!("{base_url}/{owner}/{repo}"),
            RegistrationScope::Organization { owner } => format!("{base_url}/{owner}"),
        }
    }

    /// PAT scope GitHub requires to mint a registration token for this scope.
    pub fn required_pat_scope(&self) -> &'static str {
        match self {
            RegistrationScope::Repository { .. } => "repo",
            RegistrationScope::Organization { .. } => "admin:org",
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RegistrationScope::Repository { .. } => "repository",
            RegistrationScope::Organization { .. } => "organization",
        }
    }
}

/// `POST` target that exchanges a PAT for a registration token.
pub fn registration_token_endpoint(base_url: &str, scope: &RegistrationScope) -> String {
    format!(
        "{}/{}/actions/runners/registration-token",
        UrlUtil::api_root(base_url),
        scope.api_path()
    )
}
