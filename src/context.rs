use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::mapper;
use crate::api::models::{
    DatasetRequest, DatasetResponse, DatasetsResponse, JobRequest, JobResponse,
    JobsResponse, NamespaceRequest, NamespaceResponse, NamespacesResponse, RunRequest,
    RunResponse, RunsResponse, SourceRequest, SourceResponse, SourcesResponse, TagRequest,
    TagResponse, TagsResponse,
};
use crate::catalog::{
    CatalogError, CatalogResult, DatasetStore, JobStore, NamespaceStore, SourceStore,
    TagStore,
};
use crate::data_types::{
    DatasetName, FieldName, JobName, NamespaceName, RunState, SourceName, TagName,
};
use crate::model::{Dataset, Tag};
use crate::tagging;

/// `limit`/`offset` of a list request. Missing values fall back to the
/// context defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Paging {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Paging {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }
}

/// Entrypoint to the catalog. Holds one handle per store and applies the
/// existence checks that sit between a decoded request and a store write.
#[derive(Clone)]
pub struct CatalogContext {
    pub namespaces: Arc<dyn NamespaceStore>,
    pub sources: Arc<dyn SourceStore>,
    pub datasets: Arc<dyn DatasetStore>,
    pub jobs: Arc<dyn JobStore>,
    pub tags: Arc<dyn TagStore>,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl CatalogContext {
    pub fn new_from_store<S>(store: Arc<S>, default_limit: usize, max_limit: usize) -> Self
    where
        S: NamespaceStore + SourceStore + DatasetStore + JobStore + TagStore + 'static,
    {
        Self {
            namespaces: store.clone(),
            sources: store.clone(),
            datasets: store.clone(),
            jobs: store.clone(),
            tags: store,
            default_limit,
            max_limit,
        }
    }

    fn page(&self, paging: Paging) -> CatalogResult<(usize, usize)> {
        let limit = paging.limit.unwrap_or(self.default_limit);
        if limit > self.max_limit {
            return Err(CatalogError::invalid(format!(
                "limit must be at most {}, got {limit}",
                self.max_limit
            )));
        }
        Ok((limit, paging.offset.unwrap_or(0)))
    }

    async fn check_namespace(&self, namespace: &NamespaceName) -> CatalogResult<()> {
        if !self.namespaces.exists(namespace).await? {
            return Err(CatalogError::NamespaceNotFound {
                name: namespace.to_string(),
            });
        }
        Ok(())
    }

    async fn check_job(&self, namespace: &NamespaceName, job: &JobName) -> CatalogResult<()> {
        if !self.jobs.exists(namespace, job).await? {
            return Err(CatalogError::JobNotFound {
                name: job.to_string(),
            });
        }
        Ok(())
    }

    async fn check_tag(&self, tag: &TagName) -> CatalogResult<()> {
        if !self.tags.exists(tag).await? {
            return Err(CatalogError::TagNotFound {
                name: tag.to_string(),
            });
        }
        Ok(())
    }

    async fn load_dataset(
        &self,
        namespace: &NamespaceName,
        name: &DatasetName,
    ) -> CatalogResult<Dataset> {
        self.check_namespace(namespace).await?;
        self.datasets
            .get(namespace, name)
            .await?
            .ok_or_else(|| CatalogError::DatasetNotFound {
                name: name.to_string(),
            })
    }

    // Namespaces

    pub async fn create_or_update_namespace(
        &self,
        name: &str,
        request: &NamespaceRequest,
    ) -> CatalogResult<NamespaceResponse> {
        let name = NamespaceName::new(name)?;
        let meta = mapper::to_namespace_meta(request)?;

        let namespace = self.namespaces.create_or_update(&name, &meta).await?;
        info!("Namespace {name} stored");
        Ok(mapper::to_namespace_response(&namespace))
    }

    pub async fn get_namespace(&self, name: &str) -> CatalogResult<NamespaceResponse> {
        let name = NamespaceName::new(name)?;
        let namespace =
            self.namespaces
                .get(&name)
                .await?
                .ok_or_else(|| CatalogError::NamespaceNotFound {
                    name: name.to_string(),
                })?;
        Ok(mapper::to_namespace_response(&namespace))
    }

    pub async fn list_namespaces(&self, paging: Paging) -> CatalogResult<NamespacesResponse> {
        let (limit, offset) = self.page(paging)?;
        let namespaces = self.namespaces.get_all(limit, offset).await?;
        Ok(mapper::to_namespaces_response(&namespaces))
    }

    // Sources

    pub async fn create_or_update_source(
        &self,
        name: &str,
        request: &SourceRequest,
    ) -> CatalogResult<SourceResponse> {
        let name = SourceName::new(name)?;
        let meta = mapper::to_source_meta(request)?;

        let source = self.sources.create_or_update(&name, &meta).await?;
        info!("Source {name} ({}) stored", source.source_type);
        Ok(mapper::to_source_response(&source))
    }

    pub async fn get_source(&self, name: &str) -> CatalogResult<SourceResponse> {
        let name = SourceName::new(name)?;
        let source = self
            .sources
            .get(&name)
            .await?
            .ok_or_else(|| CatalogError::SourceNotFound {
                name: name.to_string(),
            })?;
        Ok(mapper::to_source_response(&source))
    }

    pub async fn list_sources(&self, paging: Paging) -> CatalogResult<SourcesResponse> {
        let (limit, offset) = self.page(paging)?;
        let sources = self.sources.get_all(limit, offset).await?;
        Ok(mapper::to_sources_response(&sources))
    }

    // Datasets

    pub async fn create_or_update_dataset(
        &self,
        namespace: &str,
        name: &str,
        request: &DatasetRequest,
    ) -> CatalogResult<DatasetResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let name = DatasetName::new(name)?;
        let meta = mapper::to_dataset_meta(request)?;

        self.check_namespace(&namespace).await?;
        if let Some(run_id) = meta.run_id {
            if !self.jobs.run_exists(run_id).await? {
                return Err(CatalogError::RunNotFound { id: run_id });
            }
        }

        let dataset = self
            .datasets
            .create_or_update(&namespace, &name, &meta)
            .await?;
        info!("{} {} stored", dataset.kind.dataset_type(), dataset.id);
        Ok(mapper::to_dataset_response(&dataset))
    }

    pub async fn get_dataset(
        &self,
        namespace: &str,
        name: &str,
    ) -> CatalogResult<DatasetResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let name = DatasetName::new(name)?;

        let dataset = self.load_dataset(&namespace, &name).await?;
        Ok(mapper::to_dataset_response(&dataset))
    }

    pub async fn list_datasets(
        &self,
        namespace: &str,
        paging: Paging,
    ) -> CatalogResult<DatasetsResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let (limit, offset) = self.page(paging)?;

        self.check_namespace(&namespace).await?;
        let datasets = self.datasets.get_all(&namespace, limit, offset).await?;
        Ok(mapper::to_datasets_response(&datasets))
    }

    /// Add a tag to a dataset. The tag itself must already be registered.
    pub async fn tag_dataset(
        &self,
        namespace: &str,
        name: &str,
        tag: &str,
    ) -> CatalogResult<DatasetResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let name = DatasetName::new(name)?;
        let tag = TagName::new(tag)?;

        let dataset = self.load_dataset(&namespace, &name).await?;
        self.check_tag(&tag).await?;

        let tagged = tagging::tag_dataset(&dataset, &tag);
        let stored = self.datasets.update_tags(&tagged).await?;
        debug!("Tagged dataset {} with {tag}", stored.id);
        Ok(mapper::to_dataset_response(&stored))
    }

    /// Add a tag to every field of a dataset, leaving the dataset's own tags
    /// alone.
    pub async fn tag_all_fields(
        &self,
        namespace: &str,
        name: &str,
        tag: &str,
    ) -> CatalogResult<DatasetResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let name = DatasetName::new(name)?;
        let tag = TagName::new(tag)?;

        let dataset = self.load_dataset(&namespace, &name).await?;
        self.check_tag(&tag).await?;

        let tagged = tagging::tag_all_fields(&dataset, &tag);
        let stored = self.datasets.update_tags(&tagged).await?;
        debug!("Tagged all fields of {} with {tag}", stored.id);
        Ok(mapper::to_dataset_response(&stored))
    }

    pub async fn tag_dataset_field(
        &self,
        namespace: &str,
        name: &str,
        field: &str,
        tag: &str,
    ) -> CatalogResult<DatasetResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let name = DatasetName::new(name)?;
        let field = FieldName::new(field)?;
        let tag = TagName::new(tag)?;

        let dataset = self.load_dataset(&namespace, &name).await?;
        self.check_tag(&tag).await?;

        let tagged = tagging::tag_field(&dataset, &field, &tag).ok_or_else(|| {
            CatalogError::FieldNotFound {
                name: field.to_string(),
            }
        })?;
        let stored = self.datasets.update_tags(&tagged).await?;
        debug!("Tagged field {field} of {} with {tag}", stored.id);
        Ok(mapper::to_dataset_response(&stored))
    }

    // Jobs

    pub async fn create_or_update_job(
        &self,
        namespace: &str,
        name: &str,
        request: &JobRequest,
    ) -> CatalogResult<JobResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let name = JobName::new(name)?;
        let meta = mapper::to_job_meta(&namespace, request)?;

        self.check_namespace(&namespace).await?;
        let job = self.jobs.create_or_update(&namespace, &name, &meta).await?;
        info!(
            "Job {} stored with {} input(s) and {} output(s)",
            job.id,
            job.inputs.len(),
            job.outputs.len()
        );
        Ok(mapper::to_job_response(&job))
    }

    pub async fn get_job(&self, namespace: &str, name: &str) -> CatalogResult<JobResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let name = JobName::new(name)?;

        self.check_namespace(&namespace).await?;
        let job = self
            .jobs
            .get(&namespace, &name)
            .await?
            .ok_or_else(|| CatalogError::JobNotFound {
                name: name.to_string(),
            })?;
        Ok(mapper::to_job_response(&job))
    }

    pub async fn list_jobs(
        &self,
        namespace: &str,
        paging: Paging,
    ) -> CatalogResult<JobsResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let (limit, offset) = self.page(paging)?;

        self.check_namespace(&namespace).await?;
        let jobs = self.jobs.get_all(&namespace, limit, offset).await?;
        Ok(mapper::to_jobs_response(&jobs))
    }

    // Runs

    pub async fn create_run(
        &self,
        namespace: &str,
        job: &str,
        request: &RunRequest,
    ) -> CatalogResult<RunResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let job = JobName::new(job)?;
        let meta = mapper::to_run_meta(request)?;

        self.check_namespace(&namespace).await?;
        self.check_job(&namespace, &job).await?;
        let run = self.jobs.create_run(&namespace, &job, &meta).await?;
        info!("Run {} created for job {namespace}.{job}", run.id);
        Ok(mapper::to_run_response(&run))
    }

    pub async fn get_run(&self, id: &str) -> CatalogResult<RunResponse> {
        let id = Uuid::parse_str(id)?;
        let run = self
            .jobs
            .get_run(id)
            .await?
            .ok_or(CatalogError::RunNotFound { id })?;
        Ok(mapper::to_run_response(&run))
    }

    pub async fn list_runs(
        &self,
        namespace: &str,
        job: &str,
        paging: Paging,
    ) -> CatalogResult<RunsResponse> {
        let namespace = NamespaceName::new(namespace)?;
        let job = JobName::new(job)?;
        let (limit, offset) = self.page(paging)?;

        self.check_namespace(&namespace).await?;
        self.check_job(&namespace, &job).await?;
        let runs = self
            .jobs
            .get_all_runs(&namespace, &job, limit, offset)
            .await?;
        Ok(mapper::to_runs_response(&runs))
    }

    /// Move a run to `state`, stamped with the current time.
    pub async fn mark_run_as(&self, id: &str, state: RunState) -> CatalogResult<RunResponse> {
        let id = Uuid::parse_str(id)?;
        if !self.jobs.run_exists(id).await? {
            return Err(CatalogError::RunNotFound { id });
        }

        let run = self.jobs.mark_run_as(id, state, Utc::now()).await?;
        info!("Run {id} marked as {state}");
        Ok(mapper::to_run_response(&run))
    }

    // Tags

    pub async fn create_or_update_tag(
        &self,
        name: &str,
        request: &TagRequest,
    ) -> CatalogResult<TagResponse> {
        let name = TagName::new(name)?;
        let tag = self
            .tags
            .create_or_update(&mapper::to_tag(&name, request))
            .await?;
        Ok(mapper::to_tag_response(&tag))
    }

    pub async fn list_tags(&self, paging: Paging) -> CatalogResult<TagsResponse> {
        let (limit, offset) = self.page(paging)?;
        let tags = self.tags.get_all(limit, offset).await?;
        Ok(mapper::to_tags_response(&tags))
    }

    /// Register tags that should exist from startup, e.g. the ones listed in
    /// the config file.
    pub async fn seed_tags(&self, tags: &[Tag]) -> CatalogResult<()> {
        for tag in tags {
            self.tags.create_or_update(tag).await?;
        }
        if !tags.is_empty() {
            info!("Seeded {} tag(s)", tags.len());
        }
        Ok(())
    }
}
