use std::path::PathBuf;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACCOUNT_FILE: &str = ".voe_account";

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// File holding the signed-in account id.
    pub account_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            account_file: PathBuf::from(DEFAULT_ACCOUNT_FILE),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `VOE_API_URL`              | `http://localhost:8000` |
    /// | `VOE_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `VOE_ACCOUNT_FILE`         | `.voe_account`          |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = lookup("VOE_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let request_timeout_secs = match lookup("VOE_REQUEST_TIMEOUT_SECS") {
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        default = DEFAULT_REQUEST_TIMEOUT_SECS,
                        "VOE_REQUEST_TIMEOUT_SECS must be a positive integer, using default",
                    );
                    DEFAULT_REQUEST_TIMEOUT_SECS
                }
            },
        };

        let account_file = lookup("VOE_ACCOUNT_FILE")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ACCOUNT_FILE));

        Self {
            api_url,
            request_timeout_secs,
            account_file,
        }
    }
}
