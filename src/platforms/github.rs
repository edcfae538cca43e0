use std::env;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{
    release_outcome, ConflictRule, HttpTransport, Platform, ReleaseContext, ReleaseOutcome,
    UreqTransport,
};
use crate::errors::{ReleaseError, Result};

/// Public GitHub REST API.
const DEFAULT_API_URL: &str = "https://api.github.com";

/// GitHub answers 422 with an `already_exists` validation error when the
/// tag already has a release.
const CONFLICT: ConflictRule = ConflictRule {
    status: 422,
    pattern: "already_exists",
};

static OWNER_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[@/])github\.com[:/]([^/]+)/([^/]+?)(?:\.git)?/?$")
        .expect("owner/repo regex")
});

/// GitHub releases via the REST API.
pub struct GitHub<T: HttpTransport = UreqTransport> {
    transport: T,
    api_url: String,
}

impl GitHub<UreqTransport> {
    /// Create a client for github.com, or for the instance named by
    /// `GITHUB_API_URL` (set by GitHub Actions on Enterprise Server).
    #[must_use]
    pub fn from_env() -> Self {
        let api_url = env::var("GITHUB_API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::with_transport(UreqTransport, api_url)
    }
}

impl<T: HttpTransport> GitHub<T> {
    pub fn with_transport(transport: T, api_url: impl Into<String>) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
        }
    }
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    tag_name: &'a str,
    target_commitish: &'a str,
    name: &'a str,
    body: &'a str,
    generate_release_notes: bool,
}

impl<T: HttpTransport> Platform for GitHub<T> {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    fn default_token_var(&self) -> &'static str {
        "GITHUB_TOKEN"
    }

    fn tag_and_release(&self, ctx: &ReleaseContext<'_>) -> Result<ReleaseOutcome> {
        let (owner, repo) = owner_and_repo(ctx.remote_url)?;
        let url = format!(
            "{}/repos/{owner}/{repo}/releases",
            self.api_url.trim_end_matches('/')
        );
        tracing::debug!(%url, "posting GitHub release");

        let request = ctx.request;
        let body = serde_json::to_value(CreateRelease {
            tag_name: &request.tag_name,
            target_commitish: &request.reference,
            name: &request.title,
            body: &request.description,
            generate_release_notes: true,
        })
        .map_err(|e| ReleaseError::Platform {
            platform: self.name(),
            status: None,
            message: format!("cannot encode request: {e}"),
        })?;
        let headers = [
            ("Authorization", format!("Bearer {}", ctx.token)),
            ("Accept", "application/vnd.github+json".to_string()),
            ("X-GitHub-Api-Version", "2022-11-28".to_string()),
        ];

        let reply = self
            .transport
            .post_json(&url, &headers, &body)
            .map_err(|message| ReleaseError::Platform {
                platform: self.name(),
                status: None,
                message,
            })?;
        release_outcome(self.name(), &CONFLICT, &reply, request)
    }
}

/// Extract `(owner, repo)` from an HTTPS or SSH github.com remote URL.
///
/// Credentials embedded in HTTPS URLs are ignored.
///
/// # Errors
///
/// Returns [`ReleaseError::UnparsableRemote`] for anything that is not a
/// github.com repository URL.
pub fn owner_and_repo(remote_url: &str) -> Result<(String, String)> {
    let caps = OWNER_REPO_RE
        .captures(remote_url.trim())
        .ok_or_else(|| ReleaseError::UnparsableRemote {
            url: remote_url.to_string(),
        })?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}
