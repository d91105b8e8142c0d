use reqwest::header::HeaderMap;

/// Base URL of the public GitHub host.
pub const PUBLIC_GITHUB_URL: &str = "https://github.com";

/// REST API root for the public GitHub host.
pub const PUBLIC_GITHUB_API_URL: &str = "https://api.github.com";

/// GitHub URL helpers.
pub struct UrlUtil;

impl UrlUtil {
    /// Strip surrounding whitespace and trailing `/` from a configured base URL.
    pub fn normalize_base_url(raw: &str) -> String {
        raw.trim().trim_end_matches('/').to_string()
    }

    /// `true` only for the exact public GitHub base URL. Every other value,
    /// including `github.com` subdomains, is treated as GitHub Enterprise.
    pub fn is_public_github(base_url: &str) -> bool {
        base_url == PUBLIC_GITHUB_URL
    }

    /// REST API root for `base_url`: `https://api.github.com` for the public
    /// host, `{base_url}/api/v3` for GitHub Enterprise.
    pub fn api_root(base_url: &str) -> String {
        if Self::is_public_github(base_url) {
            PUBLIC_GITHUB_API_URL.to_string()
        } else {
            format!("{base_url}/api/v3")
        }
    }

    /// Extract the `x-github-request-id` header value from an HTTP response's headers.
    pub fn get_github_request_id(headers: &HeaderMap) -> Option<String> {
        headers
            .get("x-github-request-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
}
