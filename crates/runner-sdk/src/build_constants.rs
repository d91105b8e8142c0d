//! Build constants baked in at compile time.

/// Source control information.
pub struct Source;

impl Source {
    /// Set via the `BOOTSTRAP_COMMIT_HASH` env var at compile time, or "N/A".
    pub const COMMIT_HASH: &'static str = match option_env!("BOOTSTRAP_COMMIT_HASH") {
        Some(h) => h,
        None => "N/A",
    };
}

/// Package metadata.
#[derive(Debug, Clone)]
pub struct RunnerPackage;

impl RunnerPackage {
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub const PACKAGE_NAME: &'static str = "start-runner";

    /// `User-Agent` sent with GitHub API requests.
    pub fn user_agent() -> String {
        format!("{}/{}", Self::PACKAGE_NAME, Self::VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!RunnerPackage::VERSION.is_empty());
    }

    #[test]
    fn commit_hash_has_default() {
        assert!(!Source::COMMIT_HASH.is_empty());
    }

    #[test]
    fn user_agent_carries_name_and_version() {
        let ua = RunnerPackage::user_agent();
        assert!(ua.starts_with("start-runner/"));
        assert!(ua.ends_with(RunnerPackage::VERSION));
    }
}
