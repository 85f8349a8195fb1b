//! Defines the environment variables to use.

use crate::{error::ReleaseError, static_lazy_lock};

use std::{env, time::Duration};

use reqwest::Url;
use tracing::warn;

/// The public GitHub REST API, used when `GITHUB_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// The request timeout used when `GITHUB_HTTP_TIMEOUT` is not set.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Parses an environment variable from [`String`] to something else, wrapping any error in [`anyhow::Error`].
#[macro_export]
macro_rules! parse_env {
    ($key:expr => |$var:ident| $expr:expr) => {
        std::env::var($key)
            .map_err(|e| anyhow::anyhow!(e))
            .and_then(|$var| $expr)
    };
    ($key:expr => |$var:ident| $expr:expr; anyhow) => {
        parse_env!($key => |$var| $expr.map_err(|e| anyhow::anyhow!(e)))
    };
}

static_lazy_lock! {
    /// The GitHub token. Empty values count as unset.
    pub GITHUB_TOKEN: Option<String> = env::var("GITHUB_TOKEN").ok().filter(|token| !token.is_empty());
}

static_lazy_lock! {
    /// The base URL of the GitHub REST API, without a trailing slash.
    pub GITHUB_API_URL: String = match parse_env!("GITHUB_API_URL" => |s| Url::parse(&s); anyhow) {
        Ok(url) => url.as_str().trim_end_matches('/').to_owned(),
        Err(err) => {
            if env::var_os("GITHUB_API_URL").is_some() {
                warn!("ignoring GITHUB_API_URL: {err}");
            }
            DEFAULT_API_URL.to_owned()
        }
    };
}

static_lazy_lock! {
    /// The timeout applied to every GitHub API request.
    pub HTTP_TIMEOUT: Duration = Duration::from_secs(
        parse_env!("GITHUB_HTTP_TIMEOUT" => |s| s.parse::<u64>(); anyhow)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
    );
}

/// Returns the GitHub token from the environment.
///
/// # Errors
///
/// Returns [`ReleaseError::ConfigMissing`] if `GITHUB_TOKEN` is unset or empty.
pub fn github_token() -> Result<&'static str, ReleaseError> {
    require_token(GITHUB_TOKEN.as_deref())
}

fn require_token(token: Option<&str>) -> Result<&str, ReleaseError> {
    token
        .filter(|token| !token.is_empty())
        .ok_or(ReleaseError::ConfigMissing {
            what: "GITHUB_TOKEN environment variable",
        })
}
