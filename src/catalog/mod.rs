use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::data_types::{
    DatasetName, JobName, NamespaceName, RunState, SourceName, TagName,
};
use crate::model::{
    Dataset, DatasetMeta, Job, JobMeta, Namespace, NamespaceMeta, Run, RunMeta, Source,
    SourceMeta, Tag,
};

pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{reason}")]
    InvalidArgument { reason: String },

    #[error("Namespace {name:?} not found")]
    NamespaceNotFound { name: String },

    #[error("Source {name:?} not found")]
    SourceNotFound { name: String },

    #[error("Dataset {name:?} not found")]
    DatasetNotFound { name: String },

    #[error("Field {name:?} not found")]
    FieldNotFound { name: String },

    #[error("Job {name:?} not found")]
    JobNotFound { name: String },

    #[error("Run {id} not found")]
    RunNotFound { id: Uuid },

    #[error("Tag {name:?} not found")]
    TagNotFound { name: String },

    #[error("Catalog method not implemented: {reason}")]
    NotImplemented { reason: String },
}

impl CatalogError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        CatalogError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::NamespaceNotFound { .. }
                | CatalogError::SourceNotFound { .. }
                | CatalogError::DatasetNotFound { .. }
                | CatalogError::FieldNotFound { .. }
                | CatalogError::JobNotFound { .. }
                | CatalogError::RunNotFound { .. }
                | CatalogError::TagNotFound { .. }
        )
    }
}

// Everything the normalizer parses is a client input problem, so all of the
// parser errors collapse into InvalidArgument with the parser's message.
impl From<url::ParseError> for CatalogError {
    fn from(val: url::ParseError) -> Self {
        CatalogError::invalid(format!("Failed parsing URL: {val}"))
    }
}

impl From<uuid::Error> for CatalogError {
    fn from(val: uuid::Error) -> Self {
        CatalogError::invalid(format!("Failed parsing UUID: {val}"))
    }
}

impl From<chrono::ParseError> for CatalogError {
    fn from(val: chrono::ParseError) -> Self {
        CatalogError::invalid(format!("Failed parsing timestamp: {val}"))
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(val: serde_json::Error) -> Self {
        CatalogError::invalid(format!("Failed parsing JSON: {val}"))
    }
}

fn not_impl<T>() -> CatalogResult<T> {
    Err(CatalogError::NotImplemented {
        reason: "Store method not supported".to_string(),
    })
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[async_trait]
pub trait NamespaceStore: Sync + Send {
    async fn exists(&self, _name: &NamespaceName) -> CatalogResult<bool> {
        not_impl()
    }

    async fn get(&self, _name: &NamespaceName) -> CatalogResult<Option<Namespace>> {
        not_impl()
    }

    async fn get_all(&self, _limit: usize, _offset: usize) -> CatalogResult<Vec<Namespace>> {
        not_impl()
    }

    async fn create_or_update(
        &self,
        _name: &NamespaceName,
        _meta: &NamespaceMeta,
    ) -> CatalogResult<Namespace> {
        not_impl()
    }
}

#[async_trait]
pub trait SourceStore: Sync + Send {
    async fn exists(&self, _name: &SourceName) -> CatalogResult<bool> {
        not_impl()
    }

    async fn get(&self, _name: &SourceName) -> CatalogResult<Option<Source>> {
        not_impl()
    }

    async fn get_all(&self, _limit: usize, _offset: usize) -> CatalogResult<Vec<Source>> {
        not_impl()
    }

    async fn create_or_update(
        &self,
        _name: &SourceName,
        _meta: &SourceMeta,
    ) -> CatalogResult<Source> {
        not_impl()
    }
}

#[async_trait]
pub trait DatasetStore: Sync + Send {
    async fn exists(
        &self,
        _namespace: &NamespaceName,
        _name: &DatasetName,
    ) -> CatalogResult<bool> {
        not_impl()
    }

    async fn get(
        &self,
        _namespace: &NamespaceName,
        _name: &DatasetName,
    ) -> CatalogResult<Option<Dataset>> {
        not_impl()
    }

    async fn get_all(
        &self,
        _namespace: &NamespaceName,
        _limit: usize,
        _offset: usize,
    ) -> CatalogResult<Vec<Dataset>> {
        not_impl()
    }

    async fn create_or_update(
        &self,
        _namespace: &NamespaceName,
        _name: &DatasetName,
        _meta: &DatasetMeta,
    ) -> CatalogResult<Dataset> {
        not_impl()
    }

    /// Replace the stored tags of a dataset and its fields with the ones on
    /// `dataset`. Used to persist the result of tag propagation.
    async fn update_tags(&self, _dataset: &Dataset) -> CatalogResult<Dataset> {
        not_impl()
    }
}

#[async_trait]
pub trait JobStore: Sync + Send {
    async fn exists(&self, _namespace: &NamespaceName, _name: &JobName) -> CatalogResult<bool> {
        not_impl()
    }

    async fn get(
        &self,
        _namespace: &NamespaceName,
        _name: &JobName,
    ) -> CatalogResult<Option<Job>> {
        not_impl()
    }

    async fn get_all(
        &self,
        _namespace: &NamespaceName,
        _limit: usize,
        _offset: usize,
    ) -> CatalogResult<Vec<Job>> {
        not_impl()
    }

    async fn create_or_update(
        &self,
        _namespace: &NamespaceName,
        _name: &JobName,
        _meta: &JobMeta,
    ) -> CatalogResult<Job> {
        not_impl()
    }

    async fn run_exists(&self, _id: Uuid) -> CatalogResult<bool> {
        not_impl()
    }

    async fn create_run(
        &self,
        _namespace: &NamespaceName,
        _job: &JobName,
        _meta: &RunMeta,
    ) -> CatalogResult<Run> {
        not_impl()
    }

    async fn get_run(&self, _id: Uuid) -> CatalogResult<Option<Run>> {
        not_impl()
    }

    async fn get_all_runs(
        &self,
        _namespace: &NamespaceName,
        _job: &JobName,
        _limit: usize,
        _offset: usize,
    ) -> CatalogResult<Vec<Run>> {
        not_impl()
    }

    /// Move a run into `state` at time `at`, stamping `started_at` when it
    /// starts running and `ended_at` when it reaches a terminal state.
    async fn mark_run_as(
        &self,
        _id: Uuid,
        _state: RunState,
        _at: DateTime<Utc>,
    ) -> CatalogResult<Run> {
        not_impl()
    }
}

#[async_trait]
pub trait TagStore: Sync + Send {
    async fn exists(&self, _name: &TagName) -> CatalogResult<bool> {
        not_impl()
    }

    async fn get_all(&self, _limit: usize, _offset: usize) -> CatalogResult<Vec<Tag>> {
        not_impl()
    }

    async fn create_or_update(&self, _tag: &Tag) -> CatalogResult<Tag> {
        not_impl()
    }
}
