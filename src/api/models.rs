use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data_types::{DatasetId, Field, JobId, TagName};

// Requests carry raw client strings; validation happens in the mapper.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceRequest {
    pub owner_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRequest {
    #[serde(rename = "type")]
    pub source_type: String,
    pub connection_url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Attributes shared by every dataset request variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetRequestCommon {
    pub physical_name: String,
    pub source_name: String,
    #[serde(default)]
    pub fields: Vec<FieldRequest>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbTableRequest {
    #[serde(flatten)]
    pub common: DatasetRequestCommon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    #[serde(flatten)]
    pub common: DatasetRequestCommon,
    pub schema_location: String,
}

/// Dataset request, dispatched on its `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetRequest {
    DbTable(DbTableRequest),
    Stream(StreamRequest),
}

impl DatasetRequest {
    pub fn common(&self) -> &DatasetRequestCommon {
        match self {
            DatasetRequest::DbTable(r) => &r.common,
            DatasetRequest::Stream(r) => &r.common,
        }
    }
}

/// Job request. `inputs`/`outputs` are the legacy bare dataset names scoped
/// to the job's namespace; `inputIds`/`outputIds` are namespace-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    #[serde(rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub inputs: Option<Vec<String>>,
    #[serde(default)]
    pub outputs: Option<Vec<String>>,
    #[serde(default)]
    pub input_ids: Option<Vec<DatasetId>>,
    #[serde(default)]
    pub output_ids: Option<Vec<DatasetId>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(default)]
    pub nominal_start_time: Option<String>,
    #[serde(default)]
    pub nominal_end_time: Option<String>,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    #[serde(default)]
    pub description: Option<String>,
}

// Responses. Optional values serialize as `null` rather than being dropped.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceResponse {
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacesResponse {
    pub namespaces: Vec<NamespaceResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResponse {
    #[serde(rename = "type")]
    pub source_type: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub connection_url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTableResponse {
    pub id: DatasetId,
    pub name: String,
    pub physical_name: String,
    pub created_at: String,
    pub updated_at: String,
    pub namespace: String,
    pub source_name: String,
    pub fields: Vec<Field>,
    pub tags: Vec<TagName>,
    pub last_modified_at: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub id: DatasetId,
    pub name: String,
    pub physical_name: String,
    pub created_at: String,
    pub updated_at: String,
    pub namespace: String,
    pub source_name: String,
    pub schema_location: String,
    pub fields: Vec<Field>,
    pub tags: Vec<TagName>,
    pub last_modified_at: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetResponse {
    DbTable(DbTableResponse),
    Stream(StreamResponse),
}

impl DatasetResponse {
    pub fn id(&self) -> &DatasetId {
        match self {
            DatasetResponse::DbTable(r) => &r.id,
            DatasetResponse::Stream(r) => &r.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetsResponse {
    pub datasets: Vec<DatasetResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub nominal_start_time: Option<String>,
    pub nominal_end_time: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub duration_ms: Option<i64>,
    pub state: String,
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunsResponse {
    pub runs: Vec<RunResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: JobId,
    #[serde(rename = "type")]
    pub job_type: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub namespace: String,
    pub inputs: Vec<DatasetId>,
    pub outputs: Vec<DatasetId>,
    pub location: Option<String>,
    pub context: BTreeMap<String, String>,
    pub description: Option<String>,
    pub latest_run: Option<RunResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagsResponse {
    pub tags: Vec<TagResponse>,
}
