use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::catalog::{
    CatalogError, CatalogResult, DatasetStore, JobStore, NamespaceStore, SourceStore,
    TagStore,
};
use crate::data_types::{
    DatasetId, DatasetName, JobId, JobName, NamespaceName, RunState, SourceName, TagName,
};
use crate::model::{
    Dataset, DatasetMeta, Job, JobMeta, Namespace, NamespaceMeta, Run, RunMeta, Source,
    SourceMeta, Tag,
};

struct JobRecord {
    // Stored without `latest_run`; that is filled in from `runs` on read
    job: Job,
    run_ids: Vec<Uuid>,
}

struct RunRecord {
    job_id: JobId,
    run: Run,
}

#[derive(Default)]
struct MemoryState {
    namespaces: BTreeMap<NamespaceName, Namespace>,
    sources: BTreeMap<SourceName, Source>,
    datasets: BTreeMap<DatasetId, Dataset>,
    jobs: BTreeMap<JobId, JobRecord>,
    runs: HashMap<Uuid, RunRecord>,
    tags: BTreeMap<TagName, Tag>,
}

impl MemoryState {
    fn load_job(&self, record: &JobRecord) -> Job {
        Job {
            latest_run: record
                .run_ids
                .last()
                .and_then(|id| self.runs.get(id))
                .map(|r| r.run.clone()),
            ..record.job.clone()
        }
    }
}

/// Store that keeps the whole catalog in process memory. Every write takes the
/// lock once, so a single `create_or_update` is atomic; sequences of calls are
/// not.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<'a, T: Clone + 'a>(
    items: impl Iterator<Item = &'a T>,
    limit: usize,
    offset: usize,
) -> Vec<T> {
    items.skip(offset).take(limit).cloned().collect()
}

#[async_trait]
impl NamespaceStore for MemoryStore {
    async fn exists(&self, name: &NamespaceName) -> CatalogResult<bool> {
        Ok(self.state.read().namespaces.contains_key(name))
    }

    async fn get(&self, name: &NamespaceName) -> CatalogResult<Option<Namespace>> {
        Ok(self.state.read().namespaces.get(name).cloned())
    }

    async fn get_all(&self, limit: usize, offset: usize) -> CatalogResult<Vec<Namespace>> {
        Ok(page(self.state.read().namespaces.values(), limit, offset))
    }

    async fn create_or_update(
        &self,
        name: &NamespaceName,
        meta: &NamespaceMeta,
    ) -> CatalogResult<Namespace> {
        let now = Utc::now();
        let mut state = self.state.write();

        let created_at = state
            .namespaces
            .get(name)
            .map_or(now, |existing| existing.created_at);
        let namespace = Namespace {
            name: name.clone(),
            created_at,
            updated_at: now,
            owner_name: meta.owner_name.clone(),
            description: meta.description.clone(),
        };

        debug!("Storing namespace {name}");
        state.namespaces.insert(name.clone(), namespace.clone());
        Ok(namespace)
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn exists(&self, name: &SourceName) -> CatalogResult<bool> {
        Ok(self.state.read().sources.contains_key(name))
    }

    async fn get(&self, name: &SourceName) -> CatalogResult<Option<Source>> {
        Ok(self.state.read().sources.get(name).cloned())
    }

    async fn get_all(&self, limit: usize, offset: usize) -> CatalogResult<Vec<Source>> {
        Ok(page(self.state.read().sources.values(), limit, offset))
    }

    async fn create_or_update(
        &self,
        name: &SourceName,
        meta: &SourceMeta,
    ) -> CatalogResult<Source> {
        let now = Utc::now();
        let mut state = self.state.write();

        let created_at = state
            .sources
            .get(name)
            .map_or(now, |existing| existing.created_at);
        let source = Source {
            name: name.clone(),
            source_type: meta.source_type,
            connection_url: meta.connection_url.clone(),
            created_at,
            updated_at: now,
            description: meta.description.clone(),
        };

        debug!("Storing source {name}");
        state.sources.insert(name.clone(), source.clone());
        Ok(source)
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn exists(
        &self,
        namespace: &NamespaceName,
        name: &DatasetName,
    ) -> CatalogResult<bool> {
        let id = DatasetId::new(namespace.clone(), name.clone());
        Ok(self.state.read().datasets.contains_key(&id))
    }

    async fn get(
        &self,
        namespace: &NamespaceName,
        name: &DatasetName,
    ) -> CatalogResult<Option<Dataset>> {
        let id = DatasetId::new(namespace.clone(), name.clone());
        Ok(self.state.read().datasets.get(&id).cloned())
    }

    async fn get_all(
        &self,
        namespace: &NamespaceName,
        limit: usize,
        offset: usize,
    ) -> CatalogResult<Vec<Dataset>> {
        let state = self.state.read();
        Ok(page(
            state
                .datasets
                .values()
                .filter(|d| d.namespace() == namespace),
            limit,
            offset,
        ))
    }

    async fn create_or_update(
        &self,
        namespace: &NamespaceName,
        name: &DatasetName,
        meta: &DatasetMeta,
    ) -> CatalogResult<Dataset> {
        let id = DatasetId::new(namespace.clone(), name.clone());
        let now = Utc::now();
        let mut state = self.state.write();

        let (created_at, last_modified_at) = match state.datasets.get(&id) {
            Some(existing) => {
                let (current, requested) =
                    (existing.kind.dataset_type(), meta.kind.dataset_type());
                if current != requested {
                    return Err(CatalogError::invalid(format!(
                        "Dataset {id} is a {current} and cannot be changed to a {requested}"
                    )));
                }
                (existing.created_at, existing.last_modified_at)
            }
            None => (now, None),
        };

        let dataset = Dataset {
            id: id.clone(),
            physical_name: meta.physical_name.clone(),
            created_at,
            updated_at: now,
            source_name: meta.source_name.clone(),
            fields: meta.fields.clone(),
            tags: meta.tags.clone(),
            // A write attributed to a run counts as a modification
            last_modified_at: meta.run_id.map_or(last_modified_at, |_| Some(now)),
            description: meta.description.clone(),
            kind: meta.kind.clone(),
        };

        debug!("Storing {} {id}", dataset.kind.dataset_type());
        state.datasets.insert(id, dataset.clone());
        Ok(dataset)
    }

    async fn update_tags(&self, dataset: &Dataset) -> CatalogResult<Dataset> {
        let mut state = self.state.write();
        let stored = state.datasets.get_mut(&dataset.id).ok_or_else(|| {
            CatalogError::DatasetNotFound {
                name: dataset.id.to_string(),
            }
        })?;

        stored.tags = dataset.tags.clone();
        for field in stored.fields.iter_mut() {
            if let Some(tagged) = dataset.fields.iter().find(|f| f.name == field.name) {
                field.tags = tagged.tags.clone();
            }
        }
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn exists(&self, namespace: &NamespaceName, name: &JobName) -> CatalogResult<bool> {
        let id = JobId::new(namespace.clone(), name.clone());
        Ok(self.state.read().jobs.contains_key(&id))
    }

    async fn get(
        &self,
        namespace: &NamespaceName,
        name: &JobName,
    ) -> CatalogResult<Option<Job>> {
        let id = JobId::new(namespace.clone(), name.clone());
        let state = self.state.read();
        Ok(state.jobs.get(&id).map(|record| state.load_job(record)))
    }

    async fn get_all(
        &self,
        namespace: &NamespaceName,
        limit: usize,
        offset: usize,
    ) -> CatalogResult<Vec<Job>> {
        let state = self.state.read();
        Ok(state
            .jobs
            .values()
            .filter(|r| r.job.namespace() == namespace)
            .skip(offset)
            .take(limit)
            .map(|record| state.load_job(record))
            .collect())
    }

    async fn create_or_update(
        &self,
        namespace: &NamespaceName,
        name: &JobName,
        meta: &JobMeta,
    ) -> CatalogResult<Job> {
        let id = JobId::new(namespace.clone(), name.clone());
        let now = Utc::now();
        let mut state = self.state.write();

        let (created_at, run_ids) = match state.jobs.remove(&id) {
            Some(existing) => (existing.job.created_at, existing.run_ids),
            None => (now, vec![]),
        };
        let record = JobRecord {
            job: Job {
                id: id.clone(),
                job_type: meta.job_type,
                inputs: meta.inputs.clone(),
                outputs: meta.outputs.clone(),
                location: meta.location.clone(),
                context: meta.context.clone(),
                description: meta.description.clone(),
                created_at,
                updated_at: now,
                latest_run: None,
            },
            run_ids,
        };

        debug!("Storing job {id}");
        let job = state.load_job(&record);
        state.jobs.insert(id, record);
        Ok(job)
    }

    async fn run_exists(&self, id: Uuid) -> CatalogResult<bool> {
        Ok(self.state.read().runs.contains_key(&id))
    }

    async fn create_run(
        &self,
        namespace: &NamespaceName,
        job: &JobName,
        meta: &RunMeta,
    ) -> CatalogResult<Run> {
        let job_id = JobId::new(namespace.clone(), job.clone());
        let now = Utc::now();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let record = state
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| CatalogError::JobNotFound {
                name: job_id.to_string(),
            })?;

        let run = Run {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            nominal_start_time: meta.nominal_start_time,
            nominal_end_time: meta.nominal_end_time,
            started_at: None,
            ended_at: None,
            state: RunState::New,
            args: meta.args.clone(),
        };
        record.run_ids.push(run.id);

        debug!("Created run {} for job {job_id}", run.id);
        state.runs.insert(
            run.id,
            RunRecord {
                job_id,
                run: run.clone(),
            },
        );
        Ok(run)
    }

    async fn get_run(&self, id: Uuid) -> CatalogResult<Option<Run>> {
        Ok(self.state.read().runs.get(&id).map(|r| r.run.clone()))
    }

    async fn get_all_runs(
        &self,
        namespace: &NamespaceName,
        job: &JobName,
        limit: usize,
        offset: usize,
    ) -> CatalogResult<Vec<Run>> {
        let job_id = JobId::new(namespace.clone(), job.clone());
        let state = self.state.read();
        let run_ids = state
            .jobs
            .get(&job_id)
            .map(|r| r.run_ids.as_slice())
            .unwrap_or_default();

        Ok(page(
            run_ids
                .iter()
                .filter_map(|id| state.runs.get(id))
                .map(|r| &r.run),
            limit,
            offset,
        ))
    }

    async fn mark_run_as(
        &self,
        id: Uuid,
        new_state: RunState,
        at: DateTime<Utc>,
    ) -> CatalogResult<Run> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let record = state
            .runs
            .get_mut(&id)
            .ok_or(CatalogError::RunNotFound { id })?;
        let run = &mut record.run;

        if !run.state.can_transition_to(new_state) {
            warn!(
                "Run {id} moving from {} to {new_state}, which skips the usual lifecycle",
                run.state
            );
        }

        run.state = new_state;
        run.updated_at = at;
        if new_state == RunState::Running {
            run.started_at = Some(at);
        } else if new_state.is_terminal() {
            run.ended_at = Some(at);
        }

        if new_state == RunState::Completed {
            if let Some(job) = state.jobs.get(&record.job_id) {
                for output in &job.job.outputs {
                    if let Some(dataset) = state.datasets.get_mut(output) {
                        dataset.last_modified_at = Some(at);
                    }
                }
            }
        }

        debug!("Run {id} is now {new_state}");
        Ok(record.run.clone())
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn exists(&self, name: &TagName) -> CatalogResult<bool> {
        Ok(self.state.read().tags.contains_key(name))
    }

    async fn get_all(&self, limit: usize, offset: usize) -> CatalogResult<Vec<Tag>> {
        Ok(page(self.state.read().tags.values(), limit, offset))
    }

    async fn create_or_update(&self, tag: &Tag) -> CatalogResult<Tag> {
        debug!("Storing tag {}", tag.name);
        self.state.write().tags.insert(tag.name.clone(), tag.clone());
        Ok(tag.clone())
    }
}
