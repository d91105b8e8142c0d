// Thread-safe store of secret values that scrubs them from log output.

use parking_lot::RwLock;
use std::sync::Arc;

/// Replacement text used when a secret is found.
const MASK: &str = "***";

/// Replaces every registered secret value in a string with `***`.
///
/// Clones share the same secret set, so a token registered after a trace
/// source was created is still masked by that source.
#[derive(Debug, Clone, Default)]
pub struct SecretMasker {
    inner: Arc<RwLock<Vec<String>>>,
}

impl SecretMasker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret. Empty or whitespace-only values are ignored.
    pub fn add_value(&self, secret: &str) {
        let trimmed = secret.trim();
        if trimmed.is_empty() {
            return;
        }

        let mut secrets = self.inner.write();
        if !secrets.iter().any(|s| s == trimmed) {
            secrets.push(trimmed.to_string());
            // Longest first so a secret containing another is masked whole.
            secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        }
    }

    pub fn mask_secrets(&self, input: &str) -> String {
        let secrets = self.inner.read();

        let mut result = input.to_string();
        for secret in secrets.iter() {
            if result.contains(secret.as_str()) {
                result = result.replace(secret.as_str(), MASK);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_registered_token() {
        let masker = SecretMasker::new();
        masker.add_value("ghp_abc123");
        assert_eq!(
            masker.mask_secrets("Authorization: token ghp_abc123"),
            "Authorization: token ***"
        );
    }

    #[test]
    fn masks_multiple_secrets() {
        let masker = SecretMasker::new();
        masker.add_value("pat-value");
        masker.add_value("AABBCC");
        assert_eq!(
            masker.mask_secrets("--token AABBCC remove pat-value"),
            "--token *** remove ***"
        );
    }

    #[test]
    fn longer_secret_wins_over_substring() {
        let masker = SecretMasker::new();
        masker.add_value("abc");
        masker.add_value("abcdef");
        assert_eq!(masker.mask_secrets("x abcdef y"), "x *** y");
    }

    #[test]
    fn blank_and_duplicate_values_ignored() {
        let masker = SecretMasker::new();
        masker.add_value("");
        masker.add_value("   ");
        masker.add_value("tok");
        masker.add_value("tok");
        assert_eq!(masker.mask_secrets("a tok b"), "a *** b");
        assert_eq!(masker.mask_secrets("nothing here"), "nothing here");
    }

    #[test]
    fn clones_share_secrets() {
        let masker = SecretMasker::new();
        let clone = masker.clone();
        masker.add_value("later-token");
        assert_eq!(clone.mask_secrets("later-token"), "***");
    }
}
