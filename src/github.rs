//! The GitHub REST API, as far as the release pipeline needs it.
//!
//! The pipeline only talks to [`ReleaseHost`]. [`GitHubClient`] is the implementation backed by
//! `reqwest`.

use std::{fmt, future::Future, io, path::Path, time::Duration};

use chrono::{DateTime, Utc};
use futures::TryStreamExt as _;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, header, redirect};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt as _;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{debug, info};

use crate::{
    env::{GITHUB_API_URL, HTTP_TIMEOUT},
    workflow::{
        WorkflowRun, WorkflowRuns,
        artifact::{Artifact, Artifacts},
    },
};

const USER_AGENT: &str = concat!("geode-publish/", env!("CARGO_PKG_VERSION"));

/// How many artifacts to ask for. Only the first page is read.
const ARTIFACTS_PER_PAGE: u8 = 100;

/// A failure talking to the hosting service.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or its response could not be read.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("{url} returned {status}: {message}")]
    Status {
        /// The requested URL.
        url: String,
        /// The status of the response.
        status: StatusCode,
        /// The `message` of GitHub's error body, or the canonical reason of the status.
        message: String,
    },

    /// A local file could not be written or read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The artifact archive endpoint did not redirect to a download location.
    #[error("no download location in response")]
    MissingLocation,

    /// The artifact is past its retention period or was deleted.
    #[error("artifact expired or removed")]
    Gone,

    /// The downloaded archive does not match the digest GitHub reported.
    #[error("broken artifact: expected sha256 {expected}, got {actual}")]
    DigestMismatch {
        /// The hex digest GitHub reported.
        expected: String,
        /// The hex digest of the downloaded bytes.
        actual: String,
    },
}

/// An annotated tag object to create.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewTag {
    /// The tag name.
    pub tag: String,
    /// The tag message.
    pub message: String,
    /// The commit the tag points at.
    pub object: String,
    /// The type of [`Self::object`], always `commit`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Who created the tag, and when.
    pub tagger: Tagger,
}

impl NewTag {
    /// A tag pointing at `commit`.
    pub fn for_commit(tag: String, message: String, commit: String, tagger: Tagger) -> Self {
        Self {
            tag,
            message,
            object: commit,
            kind: "commit",
            tagger,
        }
    }
}

/// The identity recorded on a tag object.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Tagger {
    /// The tagger name.
    pub name: String,
    /// The tagger email.
    pub email: String,
    /// When the tag was created.
    pub date: DateTime<Utc>,
}

/// A release as returned by GitHub REST API.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// The release id.
    pub id: u64,
    /// A URI template such as `https://uploads.github.com/repos/o/r/releases/1/assets{?name,label}`.
    pub upload_url: String,
    /// The release page.
    pub html_url: Option<String>,
}

impl Release {
    /// The upload endpoint without its URI template suffix.
    pub fn upload_endpoint(&self) -> &str {
        self.upload_url
            .split_once('{')
            .map_or(self.upload_url.as_str(), |(endpoint, _)| endpoint)
    }
}

/// The operations the release pipeline needs from a hosting service, scoped to one repository.
pub trait ReleaseHost: Sync {
    /// Lists completed runs of `workflow_file` on `branch`, newest first.
    fn list_completed_runs(
        &self,
        workflow_file: &str,
        branch: &str,
    ) -> impl Future<Output = Result<Vec<WorkflowRun>, ApiError>> + Send;

    /// Lists the artifacts of the repository, regardless of run.
    fn list_artifacts(&self) -> impl Future<Output = Result<Vec<Artifact>, ApiError>> + Send;

    /// Obtains a short-lived URL to download the archive of an artifact.
    fn artifact_download_url(
        &self,
        artifact_id: u64,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Downloads `url` into the file at `dest`, returning the number of bytes written.
    fn download(
        &self,
        url: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<u64, ApiError>> + Send;

    /// Resolves the commit `branch` points at.
    fn branch_head(&self, branch: &str) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Creates a tag object, returning its sha.
    fn create_tag(&self, tag: &NewTag) -> impl Future<Output = Result<String, ApiError>> + Send;

    /// Creates a reference such as `refs/tags/1.0.0` pointing at `sha`.
    fn create_ref(
        &self,
        reference: &str,
        sha: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Publishes a release for an existing tag.
    fn create_release(
        &self,
        tag_name: &str,
        title: &str,
    ) -> impl Future<Output = Result<Release, ApiError>> + Send;

    /// Uploads the file at `source` as a release asset named `name`.
    fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        source: &Path,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// A [`ReleaseHost`] backed by GitHub REST API.
#[derive(Clone)]
pub struct GitHubClient {
    api: Client,
    downloads: Client,
    base_url: String,
    owner: String,
    repo: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Debug, Serialize)]
struct NewRef<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
    sha: &'a str,
}

#[derive(Debug, Serialize)]
struct NewRelease<'a> {
    tag_name: &'a str,
    name: &'a str,
}

impl GitHubClient {
    /// Creates a client for `owner/repo` against the API at [`GITHUB_API_URL`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] if the HTTP clients cannot be built.
    pub fn new(owner: &str, repo: &str, token: &str) -> Result<Self, ApiError> {
        Self::with_base_url(&GITHUB_API_URL, owner, repo, token)
    }

    /// Creates a client for `owner/repo` against the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Request`] if the HTTP clients cannot be built.
    pub fn with_base_url(
        base_url: &str,
        owner: &str,
        repo: &str,
        token: &str,
    ) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, owner, repo, token, *HTTP_TIMEOUT)
    }

    fn with_timeout(
        base_url: &str,
        owner: &str,
        repo: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        // The artifact endpoint answers with a redirect whose location is the download URL.
        let api = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()?;
        // Download locations are pre-signed and must not see the token. Archives can be large, so
        // only a stalled connection is cut off.
        let downloads = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;

        Ok(Self {
            api,
            downloads,
            base_url: base_url.trim_end_matches('/').to_owned(),
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            token: token.to_owned(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{path}",
            self.base_url, self.owner, self.repo
        )
    }

    /// Builds a request for GitHub REST API.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.api
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .bearer_auth(&self.token)
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Passes successful responses through and turns the rest into [`ApiError::Status`].
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_owned(),
    };
    Err(ApiError::Status {
        url,
        status,
        message,
    })
}

impl ReleaseHost for GitHubClient {
    async fn list_completed_runs(
        &self,
        workflow_file: &str,
        branch: &str,
    ) -> Result<Vec<WorkflowRun>, ApiError> {
        let url = self.repo_url(&format!("actions/workflows/{workflow_file}/runs"));
        debug!("fetching completed runs from {url}…");

        let response = self
            .request(Method::GET, &url)
            .query(&[("status", "completed"), ("branch", branch)])
            .send()
            .await?;
        let runs: WorkflowRuns = ensure_success(response).await?.json().await?;
        debug!("{} completed runs in total", runs.total_count);
        info!("fetched {} completed runs from {url}", runs.workflow_runs.len());

        Ok(runs.workflow_runs)
    }

    async fn list_artifacts(&self) -> Result<Vec<Artifact>, ApiError> {
        let url = self.repo_url("actions/artifacts");
        debug!("fetching artifacts from {url}…");

        let response = self
            .request(Method::GET, &url)
            .query(&[("per_page", ARTIFACTS_PER_PAGE)])
            .send()
            .await?;
        let artifacts: Artifacts = ensure_success(response).await?.json().await?;
        debug!("{} artifacts in total", artifacts.total_count);
        match artifacts.artifacts.len() {
            1 => info!("fetched 1 artifact from {url}"),
            count => info!("fetched {count} artifacts from {url}"),
        }

        Ok(artifacts.artifacts)
    }

    async fn artifact_download_url(&self, artifact_id: u64) -> Result<String, ApiError> {
        let url = self.repo_url(&format!("actions/artifacts/{artifact_id}/zip"));
        debug!("requesting download from {url}…");

        let response = self.request(Method::GET, &url).send().await?;
        match response.status() {
            StatusCode::GONE => Err(ApiError::Gone),
            status if status.is_redirection() => response
                .headers()
                .get(header::LOCATION)
                .and_then(|location| location.to_str().ok())
                .map(str::to_owned)
                .ok_or(ApiError::MissingLocation),
            _ => {
                ensure_success(response).await?;
                Err(ApiError::MissingLocation)
            }
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, ApiError> {
        let response = ensure_success(self.downloads.get(url).send().await?).await?;

        let reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
        let mut reader = std::pin::pin!(reader);
        let mut file = tokio::fs::File::create(dest).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;

        Ok(written)
    }

    async fn branch_head(&self, branch: &str) -> Result<String, ApiError> {
        let url = self.repo_url(&format!("git/ref/heads/{branch}"));
        debug!("fetching ref from {url}…");

        let response = self.request(Method::GET, &url).send().await?;
        let git_ref: GitRef = ensure_success(response).await?.json().await?;

        Ok(git_ref.object.sha)
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<String, ApiError> {
        let url = self.repo_url("git/tags");
        debug!("creating tag object {} at {url}…", tag.tag);

        let response = self.request(Method::POST, &url).json(tag).send().await?;
        let object: GitObject = ensure_success(response).await?.json().await?;

        Ok(object.sha)
    }

    async fn create_ref(&self, reference: &str, sha: &str) -> Result<(), ApiError> {
        let url = self.repo_url("git/refs");
        debug!("creating {reference} at {url}…");

        let response = self
            .request(Method::POST, &url)
            .json(&NewRef { reference, sha })
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }

    async fn create_release(&self, tag_name: &str, title: &str) -> Result<Release, ApiError> {
        let url = self.repo_url("releases");
        debug!("creating release {title} at {url}…");

        let response = self
            .request(Method::POST, &url)
            .json(&NewRelease {
                tag_name,
                name: title,
            })
            .send()
            .await?;

        Ok(ensure_success(response).await?.json().await?)
    }

    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        source: &Path,
    ) -> Result<(), ApiError> {
        let url = release.upload_endpoint();
        let file = tokio::fs::File::open(source).await?;
        let length = file.metadata().await?.len();
        debug!("uploading {length} bytes as {name} to {url}…");

        let response = self
            .request(Method::POST, url)
            .query(&[("name", name)])
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, length)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(())
    }
}
