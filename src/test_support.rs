//! Builders and fakes shared by the unit tests.

use std::{
    collections::HashMap,
    io::{Cursor, Write as _},
    path::{Path, PathBuf},
    sync::Mutex,
};

use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use crate::{
    github::{ApiError, NewTag, Release, ReleaseHost},
    workflow::{
        WorkflowRun,
        artifact::{Artifact, ArtifactWorkflowRun},
    },
};

fn options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
}

/// Writes a zip archive in memory, entries in call order.
pub struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    pub fn file(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.writer.start_file(name, options()).unwrap();
        self.writer.write_all(content.as_ref()).unwrap();
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.writer.add_directory(name, options()).unwrap();
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.writer.finish().unwrap().into_inner()
    }
}

pub fn run(id: u64) -> WorkflowRun {
    WorkflowRun {
        id,
        head_sha: format!("sha-{id}"),
        head_branch: Some("main".to_owned()),
        status: Some("completed".to_owned()),
        created_at: None,
    }
}

pub fn artifact(id: u64, name: &str, run_id: Option<u64>) -> Artifact {
    Artifact {
        id,
        name: name.to_owned(),
        size_in_bytes: 0,
        archive_download_url: format!("https://api.github.test/artifacts/{id}/zip"),
        expired: false,
        created_at: None,
        expires_at: None,
        digest: None,
        workflow_run: run_id.map(|id| ArtifactWorkflowRun {
            id,
            repository_id: None,
            head_repository_id: None,
            head_branch: None,
            head_sha: None,
        }),
    }
}

/// Where the fake hands out downloads of `artifact_id`.
pub fn download_url(artifact_id: u64) -> String {
    format!("https://blob.test/artifacts/{artifact_id}")
}

/// A [`ReleaseHost`] serving canned data and recording every call.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub runs: Vec<WorkflowRun>,
    pub artifacts: Vec<Artifact>,
    /// Archive bytes by artifact id.
    pub archives: HashMap<u64, Vec<u8>>,
    pub head_sha: String,
    pub fail_runs: bool,
    pub fail_artifacts: bool,
    pub gone: bool,
    pub fail_head: bool,
    pub fail_tag: bool,
    pub fail_ref: bool,
    pub fail_release: bool,
    pub fail_upload: bool,

    pub calls: Mutex<Vec<&'static str>>,
    pub tags: Mutex<Vec<NewTag>>,
    pub refs: Mutex<Vec<(String, String)>>,
    pub releases: Mutex<Vec<(String, String)>>,
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    /// Every local path the pipeline handed over.
    pub paths: Mutex<Vec<PathBuf>>,
}

impl FakeHost {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

fn server_error() -> ApiError {
    ApiError::Status {
        url: "https://api.github.test".to_owned(),
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        message: "boom".to_owned(),
    }
}

impl ReleaseHost for FakeHost {
    async fn list_completed_runs(
        &self,
        _workflow_file: &str,
        _branch: &str,
    ) -> Result<Vec<WorkflowRun>, ApiError> {
        self.record("list_completed_runs");
        if self.fail_runs {
            return Err(server_error());
        }
        Ok(self.runs.clone())
    }

    async fn list_artifacts(&self) -> Result<Vec<Artifact>, ApiError> {
        self.record("list_artifacts");
        if self.fail_artifacts {
            return Err(server_error());
        }
        Ok(self.artifacts.clone())
    }

    async fn artifact_download_url(&self, artifact_id: u64) -> Result<String, ApiError> {
        self.record("artifact_download_url");
        if self.gone {
            return Err(ApiError::Gone);
        }
        Ok(download_url(artifact_id))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, ApiError> {
        self.record("download");
        self.paths.lock().unwrap().push(dest.to_owned());

        let bytes = self
            .archives
            .iter()
            .find(|(id, _)| download_url(**id) == url)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(server_error)?;
        std::fs::write(dest, &bytes)?;

        Ok(bytes.len() as u64)
    }

    async fn branch_head(&self, _branch: &str) -> Result<String, ApiError> {
        self.record("branch_head");
        if self.fail_head {
            return Err(server_error());
        }
        Ok(self.head_sha.clone())
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<String, ApiError> {
        self.record("create_tag");
        if self.fail_tag {
            return Err(server_error());
        }
        self.tags.lock().unwrap().push(tag.clone());
        Ok(format!("tag-sha-{}", tag.tag))
    }

    async fn create_ref(&self, reference: &str, sha: &str) -> Result<(), ApiError> {
        self.record("create_ref");
        if self.fail_ref {
            return Err(server_error());
        }
        self.refs
            .lock()
            .unwrap()
            .push((reference.to_owned(), sha.to_owned()));
        Ok(())
    }

    async fn create_release(&self, tag_name: &str, title: &str) -> Result<Release, ApiError> {
        self.record("create_release");
        if self.fail_release {
            return Err(server_error());
        }
        self.releases
            .lock()
            .unwrap()
            .push((tag_name.to_owned(), title.to_owned()));
        Ok(Release {
            id: 7,
            upload_url: "https://uploads.github.test/releases/7/assets{?name,label}".to_owned(),
            html_url: Some(format!("https://github.test/releases/tag/{tag_name}")),
        })
    }

    async fn upload_asset(
        &self,
        _release: &Release,
        name: &str,
        source: &Path,
    ) -> Result<(), ApiError> {
        self.record("upload_asset");
        self.paths.lock().unwrap().push(source.to_owned());
        let bytes = std::fs::read(source)?;
        if self.fail_upload {
            return Err(server_error());
        }
        self.uploads.lock().unwrap().push((name.to_owned(), bytes));
        Ok(())
    }
}
