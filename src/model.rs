use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data_types::{
    DatasetId, DatasetName, DatasetType, Field, JobId, JobName, JobType, Location,
    NamespaceName, OwnerName, RunState, SourceName, SourceType, TagName,
};

pub type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub name: NamespaceName,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub owner_name: OwnerName,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceMeta {
    pub owner_name: OwnerName,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: SourceName,
    pub source_type: SourceType,
    pub connection_url: Location,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMeta {
    pub source_type: SourceType,
    pub connection_url: Location,
    pub description: Option<String>,
}

/// The part of a dataset that differs between its variants. Fixed when the
/// dataset is first created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetKind {
    DbTable,
    Stream { schema_location: Location },
}

impl DatasetKind {
    pub fn dataset_type(&self) -> DatasetType {
        match self {
            DatasetKind::DbTable => DatasetType::DbTable,
            DatasetKind::Stream { .. } => DatasetType::Stream,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub id: DatasetId,
    pub physical_name: DatasetName,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub source_name: SourceName,
    pub fields: Vec<Field>,
    pub tags: BTreeSet<TagName>,
    pub last_modified_at: Option<Timestamp>,
    pub description: Option<String>,
    pub kind: DatasetKind,
}

impl Dataset {
    pub fn name(&self) -> &DatasetName {
        &self.id.name
    }

    pub fn namespace(&self) -> &NamespaceName {
        &self.id.namespace
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetMeta {
    pub physical_name: DatasetName,
    pub source_name: SourceName,
    pub fields: Vec<Field>,
    pub tags: BTreeSet<TagName>,
    pub description: Option<String>,
    pub run_id: Option<Uuid>,
    pub kind: DatasetKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub inputs: Vec<DatasetId>,
    pub outputs: Vec<DatasetId>,
    pub location: Option<Location>,
    pub context: BTreeMap<String, String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub latest_run: Option<Run>,
}

impl Job {
    pub fn name(&self) -> &JobName {
        &self.id.name
    }

    pub fn namespace(&self) -> &NamespaceName {
        &self.id.namespace
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobMeta {
    pub job_type: JobType,
    pub inputs: Vec<DatasetId>,
    pub outputs: Vec<DatasetId>,
    pub location: Option<Location>,
    pub context: BTreeMap<String, String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub id: Uuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub nominal_start_time: Option<Timestamp>,
    pub nominal_end_time: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub state: RunState,
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMeta {
    pub nominal_start_time: Option<Timestamp>,
    pub nominal_end_time: Option<Timestamp>,
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: TagName,
    #[serde(default)]
    pub description: Option<String>,
}
