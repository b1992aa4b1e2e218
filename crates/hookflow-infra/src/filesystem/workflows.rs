//! Directory-backed `WorkflowSource`.
//!
//! Every `*.json` file in the directory holds either one workflow object or
//! an array of them. Files are read in sorted path order. Unreadable or
//! malformed files are logged and skipped so one bad file cannot keep the
//! rest from loading.

use std::path::{Path, PathBuf};

use hookflow_core::repository::workflow_source::WorkflowSource;
use hookflow_types::error::RepositoryError;
use hookflow_types::workflow::Workflow;
use serde::Deserialize;

/// One file's worth of definitions.
#[derive(Deserialize)]
#[serde(untagged)]
enum WorkflowFile {
    Many(Vec<Workflow>),
    One(Box<Workflow>),
}

pub struct DirectoryWorkflowSource {
    dir: PathBuf,
}

impl DirectoryWorkflowSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn json_files(&self) -> Result<Vec<PathBuf>, RepositoryError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No workflow directory at {}", self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(RepositoryError::Io(e.to_string())),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Parse one file's contents.
pub fn parse_workflow_file(content: &str) -> Result<Vec<Workflow>, serde_json::Error> {
    Ok(match serde_json::from_str::<WorkflowFile>(content)? {
        WorkflowFile::Many(workflows) => workflows,
        WorkflowFile::One(workflow) => vec![*workflow],
    })
}

impl WorkflowSource for DirectoryWorkflowSource {
    async fn load_workflows(&self) -> Result<Vec<Workflow>, RepositoryError> {
        let mut workflows = Vec::new();

        for path in self.json_files().await? {
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!("Failed to read {}: {err}, skipping", path.display());
                    continue;
                }
            };
            match parse_workflow_file(&content) {
                Ok(parsed) => workflows.extend(parsed),
                Err(err) => {
                    tracing::warn!("Failed to parse {}: {err}, skipping", path.display());
                }
            }
        }

        Ok(workflows)
    }
}
