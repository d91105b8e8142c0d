// Environment names, defaults and process exit codes for the runner bootstrap.

use std::fmt;

// ---------------------------------------------------------------------------
// Platform detection (compile-time)
// ---------------------------------------------------------------------------

/// Operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsPlatform {
    Linux,
    MacOS,
    Windows,
}

impl fmt::Display for OsPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsPlatform::Linux => write!(f, "Linux"),
            OsPlatform::MacOS => write!(f, "macOS"),
            OsPlatform::Windows => write!(f, "Windows"),
        }
    }
}

#[cfg(target_os = "macos")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::MacOS;
#[cfg(target_os = "windows")]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::Windows;
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const CURRENT_PLATFORM: OsPlatform = OsPlatform::Linux;

// ---------------------------------------------------------------------------
// Environment variables
// ---------------------------------------------------------------------------

/// Variables read once at start-up to build the runner configuration.
pub mod variables {
    pub const GITHUB_OWNER: &str = "GITHUB_OWNER";
    pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
    pub const GITHUB_URL: &str = "GITHUB_URL";
    pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
    pub const RUNNER_NAME: &str = "RUNNER_NAME";
    pub const RUNNER_LABELS: &str = "RUNNER_LABELS";
    pub const RUNNER_GROUP: &str = "RUNNER_GROUP";
    pub const RUNNER_WORKDIR: &str = "RUNNER_WORKDIR";
    pub const RUNNER_EPHEMERAL: &str = "RUNNER_EPHEMERAL";
    pub const RUNNER_HOME: &str = "RUNNER_HOME";
    pub const RUNNER_DISABLE_UPDATE: &str = "RUNNER_DISABLE_UPDATE";

    /// `json` selects the JSON log formatter.
    pub const RUNNER_LOG_FORMAT: &str = "RUNNER_LOG_FORMAT";
    /// Also print trace lines to stdout.
    pub const PRINT_LOG_TO_STDOUT: &str = "RUNNER_PRINT_LOG_TO_STDOUT";
    /// Disable TLS certificate validation for the GitHub API client.
    pub const TLS_NO_VERIFY: &str = "GITHUB_ACTIONS_RUNNER_TLS_NO_VERIFY";
}

/// Defaults applied when an optional variable is unset or empty.
pub mod defaults {
    pub const GITHUB_URL: &str = runner_sdk::url_util::PUBLIC_GITHUB_URL;
    pub const RUNNER_LABELS: &str = "container-apps";
    pub const RUNNER_GROUP: &str = "default";
    pub const RUNNER_WORKDIR: &str = "_work";
    pub const RUNNER_EPHEMERAL: bool = true;
    pub const RUNNER_DISABLE_UPDATE: bool = false;
    /// Used when the host name cannot be read.
    pub const RUNNER_NAME: &str = "runner";
}

// ---------------------------------------------------------------------------
// Runner agent
// ---------------------------------------------------------------------------

/// Scripts shipped with the runner agent package, relative to its directory.
pub mod agent {
    #[cfg(windows)]
    pub const CONFIG_SCRIPT: &str = "config.cmd";
    #[cfg(not(windows))]
    pub const CONFIG_SCRIPT: &str = "config.sh";

    #[cfg(windows)]
    pub const RUN_SCRIPT: &str = "run.cmd";
    #[cfg(not(windows))]
    pub const RUN_SCRIPT: &str = "run.sh";

    pub const REMOVE_COMMAND: &str = "remove";
}

// ---------------------------------------------------------------------------
// Process exit codes
// ---------------------------------------------------------------------------

pub mod return_code {
    /// Normal completion or user/orchestrator initiated shutdown.
    pub const SUCCESS: i32 = 0;
    /// A required configuration value is missing or malformed.
    pub const CONFIGURATION_ERROR: i32 = 1;
    /// GitHub did not hand out a usable registration token.
    pub const REGISTRATION_TOKEN_ERROR: i32 = 4;
    /// The agent script could not be executed (shell convention).
    pub const AGENT_NOT_EXECUTABLE: i32 = 126;
    /// The agent script does not exist (shell convention).
    pub const AGENT_NOT_FOUND: i32 = 127;
}
