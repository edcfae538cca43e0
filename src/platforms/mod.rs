//! Tag-and-release on GitHub or GitLab.
//!
//! Both platforms implement [`Platform`]. They talk HTTP through the
//! [`HttpTransport`] seam: [`UreqTransport`] in production, a recording fake
//! in tests.

pub mod github;
pub mod gitlab;

use std::env;
use std::path::Path;

use serde_json::Value;

use crate::config::load_flavor;
use crate::errors::{ReleaseError, Result};
use crate::git::SourceControl;
use crate::manifest::PackageManifest;
use crate::models::Flavor;

pub use github::GitHub;
pub use gitlab::GitLab;

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Synchronous JSON POST. Non-2xx statuses are replies, not errors; only
/// transport failures (DNS, TLS, connection) are `Err`.
pub trait HttpTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> std::result::Result<HttpReply, String>;
}

/// [`HttpTransport`] backed by `ureq`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UreqTransport;

impl HttpTransport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, String)],
        body: &Value,
    ) -> std::result::Result<HttpReply, String> {
        let mut request = ureq::post(url)
            .config()
            .http_status_as_error(false)
            .build()
            .header("User-Agent", &user_agent())
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let mut response = request.send_json(body).map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| format!("cannot read response body: {e}"))?;
        Ok(HttpReply { status, body })
    }
}

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// How a platform says "this release already exists".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictRule {
    pub status: u16,
    pub pattern: &'static str,
}

/// `true` if the reply is the platform's "already exists" conflict.
#[must_use]
pub fn is_already_released(rule: &ConflictRule, reply: &HttpReply) -> bool {
    reply.status == rule.status && reply.body.contains(rule.pattern)
}

/// Turn a release-creation reply into an outcome.
///
/// 2xx is [`ReleaseOutcome::Created`]; a reply matching `rule` is
/// [`ReleaseOutcome::AlreadyExists`], so re-running a release job succeeds;
/// anything else is a [`ReleaseError::Platform`] carrying the response body.
pub fn release_outcome(
    platform: &'static str,
    rule: &ConflictRule,
    reply: &HttpReply,
    request: &ReleaseRequest,
) -> Result<ReleaseOutcome> {
    if reply.is_success() {
        tracing::info!(platform, tag = %request.tag_name, "release created");
        return Ok(ReleaseOutcome::Created);
    }
    if is_already_released(rule, reply) {
        tracing::info!(platform, tag = %request.tag_name, "release already exists; nothing to do");
        return Ok(ReleaseOutcome::AlreadyExists);
    }
    Err(ReleaseError::Platform {
        platform,
        status: Some(reply.status),
        message: reply.body.trim().to_string(),
    })
}

/// What a release call achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Created,
    AlreadyExists,
}

/// Platform-neutral description of the tag and release to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// `{version}-{flavor}`
    pub tag_name: String,
    /// `{package} {version}-{flavor}`
    pub title: String,
    pub description: String,
    /// Branch the tag is created from.
    pub reference: String,
}

impl ReleaseRequest {
    #[must_use]
    pub fn for_flavor(package_name: &str, flavor: &Flavor, reference: &str) -> Self {
        let tag_name = flavor.tag_name();
        let title = format!("{package_name} {tag_name}");
        Self {
            tag_name,
            description: title.clone(),
            title,
            reference: reference.to_string(),
        }
    }
}

/// Everything a platform needs to publish one flavor.
#[derive(Debug, Clone)]
pub struct ReleaseContext<'a> {
    pub request: &'a ReleaseRequest,
    /// URL of the `origin` remote, used to address the platform API.
    pub remote_url: &'a str,
    pub token: &'a str,
}

/// A release platform: derives its API address from the remote URL and
/// creates the tag and release.
pub trait Platform {
    /// Display name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Environment variable holding the API token unless overridden.
    fn default_token_var(&self) -> &'static str;

    fn tag_and_release(&self, ctx: &ReleaseContext<'_>) -> Result<ReleaseOutcome>;
}

/// Read a required environment variable.
///
/// # Errors
///
/// Returns [`ReleaseError::MissingCredential`] if it is unset or empty.
pub fn verify_env_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ReleaseError::MissingCredential {
            var: name.to_string(),
        }),
    }
}

/// Resolve `flavor_name` from `<dir>/releaser.yaml` and release it.
///
/// The token is checked before anything else is read, so a missing
/// credential fails fast without touching the network.
pub fn load_and_tag(
    dir: &Path,
    flavor_name: &str,
    token_var: &str,
    platform: &dyn Platform,
    scm: &dyn SourceControl,
) -> Result<ReleaseOutcome> {
    let token = verify_env_var(token_var)?;
    let flavor = load_flavor(dir, flavor_name)?;
    let package = PackageManifest::load(dir)?;
    let package_name = package.name()?;
    let remote_url = scm.remote_url()?;
    let branch = scm.head_branch()?;

    let request = ReleaseRequest::for_flavor(package_name, &flavor, &branch);
    tracing::info!(platform = platform.name(), tag = %request.tag_name, "creating release");
    platform.tag_and_release(&ReleaseContext {
        request: &request,
        remote_url: &remote_url,
        token: &token,
    })
}
