use std::{env, path::PathBuf, time::Duration};

use tracing::warn;

use crate::error::{RemixError, Result};

pub const TOKEN_VAR: &str = "REPLICATE_API_TOKEN";
pub const BASE_URL_VAR: &str = "REPLICATE_API_BASE_URL";
pub const STAGING_DIR_VAR: &str = "PHANTOM_TRAX_STAGING_DIR";
pub const POLL_INTERVAL_VAR: &str = "PHANTOM_TRAX_POLL_INTERVAL_MS";
pub const REQUEST_TIMEOUT_VAR: &str = "PHANTOM_TRAX_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Bounds for a configured poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;
pub const MAX_POLL_INTERVAL_MS: u64 = 2_000;

/// What was found in the credential variable, for the startup diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenDiagnostic {
    Missing,
    Present { len: usize },
    /// Usable after cleanup, but the raw value had stray quotes or whitespace.
    Cleaned { len: usize, issues: Vec<&'static str> },
}

impl TokenDiagnostic {
    pub fn is_missing(&self) -> bool {
        matches!(self, TokenDiagnostic::Missing)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_token: Option<String>,
    pub token_diagnostic: TokenDiagnostic,
    pub api_base_url: String,
    pub staging_dir: Option<PathBuf>,
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let (api_token, token_diagnostic) = clean_token(lookup(TOKEN_VAR));

        let api_base_url = lookup(BASE_URL_VAR)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let staging_dir = lookup(STAGING_DIR_VAR)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let poll_interval = match lookup(POLL_INTERVAL_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => {
                    let clamped = ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
                    if clamped != ms {
                        warn!(
                            "{POLL_INTERVAL_VAR}={ms} outside {MIN_POLL_INTERVAL_MS}..={MAX_POLL_INTERVAL_MS} ms, using {clamped}"
                        );
                    }
                    Duration::from_millis(clamped)
                }
                Err(_) => {
                    warn!("ignoring invalid {POLL_INTERVAL_VAR}={raw:?}");
                    DEFAULT_POLL_INTERVAL
                }
            },
            None => DEFAULT_POLL_INTERVAL,
        };

        let request_timeout = lookup(REQUEST_TIMEOUT_VAR).and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    warn!("ignoring invalid {REQUEST_TIMEOUT_VAR}={raw:?}");
                    None
                }
            }
        });

        Self {
            api_token,
            token_diagnostic,
            api_base_url,
            staging_dir,
            poll_interval,
            request_timeout,
        }
    }

    /// The API token, or the error that must stop any generation action.
    pub fn require_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or(RemixError::MissingCredential)
    }
}

fn clean_token(raw: Option<String>) -> (Option<String>, TokenDiagnostic) {
    let Some(raw) = raw else {
        return (None, TokenDiagnostic::Missing);
    };

    let mut issues = Vec::new();
    let trimmed = raw.trim();
    if trimmed.len() != raw.len() {
        issues.push("surrounding whitespace");
    }
    let unquoted = trimmed.trim_matches(|c| c == '"' || c == '\'');
    if unquoted.len() != trimmed.len() {
        issues.push("surrounding quotes");
    }

    let token = unquoted.trim();
    if token.is_empty() {
        return (None, TokenDiagnostic::Missing);
    }

    let len = token.len();
    let diag = if issues.is_empty() {
        TokenDiagnostic::Present { len }
    } else {
        TokenDiagnostic::Cleaned { len, issues }
    };
    (Some(token.to_string()), diag)
}
