use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{
    release_outcome, verify_env_var, ConflictRule, HttpTransport, Platform, ReleaseContext,
    ReleaseOutcome, UreqTransport,
};
use crate::errors::{ReleaseError, Result};

const PUBLIC_HOST: &str = "gitlab.com";
const PUBLIC_API_URL: &str = "https://gitlab.com/api/v4";

/// Project id variable GitLab CI sets for every job.
const PROJECT_ID_VAR: &str = "CI_PROJECT_ID";

const CONFLICT: ConflictRule = ConflictRule {
    status: 409,
    pattern: "Release already exists",
};

/// `scheme://[user[:pass]@]host[:port]/...`
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.-]*)://(?:[^@/]*@)?(?P<host>[^/:@]+)(?::(?P<port>\d+))?(?:/|$)")
        .expect("url regex")
});

/// `user@host:path`
static SCP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@/\s]+@(?P<host>[^:/\s]+):\S").expect("scp regex"));

/// GitLab releases via the v4 REST API.
pub struct GitLab<T: HttpTransport = UreqTransport> {
    transport: T,
    project_id_var: String,
}

impl GitLab<UreqTransport> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(UreqTransport)
    }
}

impl Default for GitLab<UreqTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: HttpTransport> GitLab<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            project_id_var: PROJECT_ID_VAR.to_string(),
        }
    }

    /// Read the project id from a variable other than `CI_PROJECT_ID`.
    #[must_use]
    pub fn project_id_var(mut self, name: impl Into<String>) -> Self {
        self.project_id_var = name.into();
        self
    }
}

#[derive(Serialize)]
struct CreateRelease<'a> {
    name: &'a str,
    tag_name: &'a str,
    description: &'a str,
    #[serde(rename = "ref")]
    reference: &'a str,
}

impl<T: HttpTransport> Platform for GitLab<T> {
    fn name(&self) -> &'static str {
        "GitLab"
    }

    fn default_token_var(&self) -> &'static str {
        "GITLAB_RELEASE_TOKEN"
    }

    fn tag_and_release(&self, ctx: &ReleaseContext<'_>) -> Result<ReleaseOutcome> {
        let base_url = api_base_url(ctx.remote_url)?;
        let project_id = verify_env_var(&self.project_id_var)?;
        let url = format!(
            "{base_url}/projects/{}/releases",
            project_id.replace('/', "%2F")
        );
        tracing::debug!(%url, "posting GitLab release");

        let request = ctx.request;
        let body = serde_json::to_value(CreateRelease {
            name: &request.title,
            tag_name: &request.tag_name,
            description: &request.description,
            reference: &request.reference,
        })
        .map_err(|e| ReleaseError::Platform {
            platform: self.name(),
            status: None,
            message: format!("cannot encode request: {e}"),
        })?;
        let headers = [("PRIVATE-TOKEN", ctx.token.to_string())];

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

/// Derive the v4 API base URL from a repository remote URL.
///
/// Remotes on gitlab.com use the public API. For self-hosted instances the
/// host comes from an HTTPS-style URL (credentials stripped, port kept) or an
/// SCP-style `user@host:path` remote.
///
/// # Errors
///
/// Returns [`ReleaseError::UnparsableRemote`] if the URL matches neither form.
pub fn api_base_url(remote_url: &str) -> Result<String> {
    let remote = remote_url.trim();
    if let Some(caps) = URL_RE.captures(remote) {
        let host = &caps["host"];
        if host.eq_ignore_ascii_case(PUBLIC_HOST) {
            return Ok(PUBLIC_API_URL.to_string());
        }
        let scheme = caps["scheme"].to_ascii_lowercase();
        return Ok(match caps.name("port") {
            Some(port) if scheme == "http" || scheme == "https" => {
                format!("https://{host}:{}/api/v4", port.as_str())
            }
            _ => format!("https://{host}/api/v4"),
        });
    }
    if let Some(caps) = SCP_RE.captures(remote) {
        let host = &caps["host"];
        if host.eq_ignore_ascii_case(PUBLIC_HOST) {
            return Ok(PUBLIC_API_URL.to_string());
        }
        return Ok(format!("https://{host}/api/v4"));
    }
    Err(ReleaseError::UnparsableRemote {
        url: remote_url.to_string(),
    })
}
