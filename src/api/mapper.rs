//! Conversions between client payloads and catalog entities.
//!
//! The `to_*_meta` functions validate a request and build the write-model
//! handed to a store; every parse failure surfaces as
//! [`InvalidArgument`](crate::catalog::CatalogError::InvalidArgument) before any store is touched. The
//! `to_*_response` functions render entities for clients, deriving run
//! durations and embedding a job's latest run.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::api::models::{
    DatasetRequest, DatasetRequestCommon, DatasetResponse, DatasetsResponse,
    DbTableRequest, DbTableResponse, FieldRequest, JobRequest, JobResponse,
    JobsResponse, NamespaceRequest, NamespaceResponse, NamespacesResponse, RunRequest,
    RunResponse, RunsResponse, SourceRequest, SourceResponse, SourcesResponse,
    StreamRequest, StreamResponse, TagRequest, TagResponse, TagsResponse,
};
use crate::catalog::CatalogResult;
use crate::data_types::{
    parse_label, DatasetId, DatasetName, Field, FieldName, FieldType, JobType,
    Location, NamespaceName, OwnerName, SourceName, SourceType, TagName,
};
use crate::model::{
    Dataset, DatasetKind, DatasetMeta, Job, JobMeta, Namespace, NamespaceMeta, Run,
    RunMeta, Source, SourceMeta, Tag,
};

pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn format_optional_instant(instant: &Option<DateTime<Utc>>) -> Option<String> {
    instant.as_ref().map(format_instant)
}

pub fn parse_instant(value: &str) -> CatalogResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub fn to_namespace_meta(request: &NamespaceRequest) -> CatalogResult<NamespaceMeta> {
    Ok(NamespaceMeta {
        owner_name: OwnerName::new(request.owner_name.as_str())?,
        description: request.description.clone(),
    })
}

pub fn to_namespace_response(namespace: &Namespace) -> NamespaceResponse {
    NamespaceResponse {
        name: namespace.name.to_string(),
        created_at: format_instant(&namespace.created_at),
        updated_at: format_instant(&namespace.updated_at),
        owner_name: namespace.owner_name.to_string(),
        description: namespace.description.clone(),
    }
}

pub fn to_namespace_responses(namespaces: &[Namespace]) -> Vec<NamespaceResponse> {
    namespaces.iter().map(to_namespace_response).collect()
}

pub fn to_namespaces_response(namespaces: &[Namespace]) -> NamespacesResponse {
    NamespacesResponse {
        namespaces: to_namespace_responses(namespaces),
    }
}

pub fn to_source_meta(request: &SourceRequest) -> CatalogResult<SourceMeta> {
    Ok(SourceMeta {
        source_type: parse_label::<SourceType>("source type", &request.source_type)?,
        connection_url: Location::new(request.connection_url.as_str())?,
        description: request.description.clone(),
    })
}

pub fn to_source_response(source: &Source) -> SourceResponse {
    SourceResponse {
        source_type: source.source_type.to_string(),
        name: source.name.to_string(),
        created_at: format_instant(&source.created_at),
        updated_at: format_instant(&source.updated_at),
        connection_url: source.connection_url.to_string(),
        description: source.description.clone(),
    }
}

pub fn to_source_responses(sources: &[Source]) -> Vec<SourceResponse> {
    sources.iter().map(to_source_response).collect()
}

pub fn to_sources_response(sources: &[Source]) -> SourcesResponse {
    SourcesResponse {
        sources: to_source_responses(sources),
    }
}

fn to_field(request: &FieldRequest) -> CatalogResult<Field> {
    Ok(Field {
        name: FieldName::new(request.name.as_str())?,
        field_type: FieldType::new(request.field_type.as_str())?,
        tags: request
            .tags
            .iter()
            .map(|t| TagName::new(t.as_str()))
            .collect::<CatalogResult<_>>()?,
        description: request.description.clone(),
    })
}

fn to_common_dataset_meta(
    request: &DatasetRequestCommon,
    kind: DatasetKind,
) -> CatalogResult<DatasetMeta> {
    Ok(DatasetMeta {
        physical_name: DatasetName::new(request.physical_name.as_str())?,
        source_name: SourceName::new(request.source_name.as_str())?,
        fields: request
            .fields
            .iter()
            .map(to_field)
            .collect::<CatalogResult<_>>()?,
        tags: request
            .tags
            .iter()
            .map(|t| TagName::new(t.as_str()))
            .collect::<CatalogResult<_>>()?,
        description: request.description.clone(),
        run_id: request
            .run_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()?,
        kind,
    })
}

pub fn to_dataset_meta(request: &DatasetRequest) -> CatalogResult<DatasetMeta> {
    match request {
        DatasetRequest::DbTable(request) => to_db_table_meta(request),
        DatasetRequest::Stream(request) => to_stream_meta(request),
    }
}

pub fn to_db_table_meta(request: &DbTableRequest) -> CatalogResult<DatasetMeta> {
    to_common_dataset_meta(&request.common, DatasetKind::DbTable)
}

pub fn to_stream_meta(request: &StreamRequest) -> CatalogResult<DatasetMeta> {
    let schema_location = Location::new(request.schema_location.as_str())?;
    to_common_dataset_meta(&request.common, DatasetKind::Stream { schema_location })
}

pub fn to_dataset_response(dataset: &Dataset) -> DatasetResponse {
    let id = dataset.id.clone();
    let name = dataset.name().to_string();
    let physical_name = dataset.physical_name.to_string();
    let created_at = format_instant(&dataset.created_at);
    let updated_at = format_instant(&dataset.updated_at);
    let namespace = dataset.namespace().to_string();
    let source_name = dataset.source_name.to_string();
    let fields = dataset.fields.clone();
    let tags = dataset.tags.iter().cloned().collect();
    let last_modified_at = format_optional_instant(&dataset.last_modified_at);
    let description = dataset.description.clone();

    match &dataset.kind {
        DatasetKind::DbTable => DatasetResponse::DbTable(DbTableResponse {
            id,
            name,
            physical_name,
            created_at,
            updated_at,
            namespace,
            source_name,
            fields,
            tags,
            last_modified_at,
            description,
        }),
        DatasetKind::Stream { schema_location } => {
            DatasetResponse::Stream(StreamResponse {
                id,
                name,
                physical_name,
                created_at,
                updated_at,
                namespace,
                source_name,
                schema_location: schema_location.to_string(),
                fields,
                tags,
                last_modified_at,
                description,
            })
        }
    }
}

pub fn to_dataset_responses(datasets: &[Dataset]) -> Vec<DatasetResponse> {
    datasets.iter().map(to_dataset_response).collect()
}

pub fn to_datasets_response(datasets: &[Dataset]) -> DatasetsResponse {
    DatasetsResponse {
        datasets: to_dataset_responses(datasets),
    }
}

fn qualify(namespace: &NamespaceName, names: &[String]) -> CatalogResult<Vec<DatasetId>> {
    names
        .iter()
        .map(|name| {
            Ok(DatasetId::new(
                namespace.clone(),
                DatasetName::new(name.as_str())?,
            ))
        })
        .collect()
}

/// Resolve a job's inputs and outputs into namespace-qualified ids.
///
/// If either `inputIds` or `outputIds` is given, both directions come from the
/// qualified lists and the legacy `inputs`/`outputs` are ignored. Otherwise the
/// legacy bare names are qualified with the job's own namespace. A direction
/// with nothing supplied resolves to an empty list.
pub fn resolve_job_io(
    namespace: &NamespaceName,
    request: &JobRequest,
) -> CatalogResult<(Vec<DatasetId>, Vec<DatasetId>)> {
    if request.input_ids.is_some() || request.output_ids.is_some() {
        return Ok((
            request.input_ids.clone().unwrap_or_default(),
            request.output_ids.clone().unwrap_or_default(),
        ));
    }

    let inputs = match &request.inputs {
        Some(names) => qualify(namespace, names)?,
        None => vec![],
    };
    let outputs = match &request.outputs {
        Some(names) => qualify(namespace, names)?,
        None => vec![],
    };
    Ok((inputs, outputs))
}

pub fn to_job_meta(namespace: &NamespaceName, request: &JobRequest) -> CatalogResult<JobMeta> {
    let job_type = parse_label::<JobType>("job type", &request.job_type)?;
    let (inputs, outputs) = resolve_job_io(namespace, request)?;

    Ok(JobMeta {
        job_type,
        inputs,
        outputs,
        location: request
            .location
            .as_deref()
            .map(Location::new)
            .transpose()?,
        context: request.context.clone(),
        description: request.description.clone(),
    })
}

pub fn to_job_response(job: &Job) -> JobResponse {
    JobResponse {
        id: job.id.clone(),
        job_type: job.job_type.to_string(),
        name: job.name().to_string(),
        created_at: format_instant(&job.created_at),
        updated_at: format_instant(&job.updated_at),
        namespace: job.namespace().to_string(),
        inputs: job.inputs.clone(),
        outputs: job.outputs.clone(),
        location: job.location.as_ref().map(Location::to_string),
        context: job.context.clone(),
        description: job.description.clone(),
        latest_run: job.latest_run.as_ref().map(to_run_response),
    }
}

pub fn to_job_responses(jobs: &[Job]) -> Vec<JobResponse> {
    jobs.iter().map(to_job_response).collect()
}

pub fn to_jobs_response(jobs: &[Job]) -> JobsResponse {
    JobsResponse {
        jobs: to_job_responses(jobs),
    }
}

pub fn to_run_meta(request: &RunRequest) -> CatalogResult<RunMeta> {
    Ok(RunMeta {
        nominal_start_time: request
            .nominal_start_time
            .as_deref()
            .map(parse_instant)
            .transpose()?,
        nominal_end_time: request
            .nominal_end_time
            .as_deref()
            .map(parse_instant)
            .transpose()?,
        args: request.args.clone(),
    })
}

/// Whole milliseconds between start and end, only when both are known.
fn run_duration_ms(run: &Run) -> Option<i64> {
    match (run.started_at, run.ended_at) {
        (Some(started_at), Some(ended_at)) => {
            Some((ended_at - started_at).num_milliseconds())
        }
        _ => None,
    }
}

pub fn to_run_response(run: &Run) -> RunResponse {
    RunResponse {
        id: run.id.to_string(),
        created_at: format_instant(&run.created_at),
        updated_at: format_instant(&run.updated_at),
        nominal_start_time: format_optional_instant(&run.nominal_start_time),
        nominal_end_time: format_optional_instant(&run.nominal_end_time),
        started_at: format_optional_instant(&run.started_at),
        ended_at: format_optional_instant(&run.ended_at),
        duration_ms: run_duration_ms(run),
        state: run.state.to_string(),
        args: run.args.clone(),
    }
}

pub fn to_run_responses(runs: &[Run]) -> Vec<RunResponse> {
    runs.iter().map(to_run_response).collect()
}

pub fn to_runs_response(runs: &[Run]) -> RunsResponse {
    RunsResponse {
        runs: to_run_responses(runs),
    }
}

pub fn to_tag(name: &TagName, request: &TagRequest) -> Tag {
    Tag {
        name: name.clone(),
        description: request.description.clone(),
    }
}

pub fn to_tag_response(tag: &Tag) -> TagResponse {
    TagResponse {
        name: tag.name.to_string(),
        description: tag.description.clone(),
    }
}

pub fn to_tag_responses(tags: &[Tag]) -> Vec<TagResponse> {
    tags.iter().map(to_tag_response).collect()
}

pub fn to_tags_response(tags: &[Tag]) -> TagsResponse {
    TagsResponse {
        tags: to_tag_responses(tags),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::api::decode;
    use crate::catalog::CatalogError;
    use crate::data_types::{JobId, JobName, RunState};
    use crate::testutils::{
        dataset_id, db_table, field, instant, namespace_name, new_run, stream, tag_name,
    };

    fn job_request(value: serde_json::Value) -> JobRequest {
        serde_json::from_value(value).unwrap()
    }

    fn assert_invalid<T: std::fmt::Debug>(result: CatalogResult<T>) {
        match result {
            Err(CatalogError::InvalidArgument { .. }) => {}
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }

    #[test]
    fn test_versioned_ids_win_over_legacy_names() {
        let request = job_request(json!({
            "type": "BATCH",
            "inputIds": [{"namespace": "other", "name": "d1"}],
            "inputs": ["d2"],
        }));

        let meta = to_job_meta(&namespace_name("ns"), &request).unwrap();
        assert_eq!(meta.inputs, vec![dataset_id("other", "d1")]);
        // Versioned mode covers the whole request
        assert_eq!(meta.outputs, vec![]);
    }

    #[test]
    fn test_empty_versioned_ids_still_win() {
        let request = job_request(json!({
            "type": "BATCH",
            "outputIds": [],
            "inputs": ["d1"],
            "outputs": ["d2"],
        }));

        let meta = to_job_meta(&namespace_name("ns"), &request).unwrap();
        assert!(meta.inputs.is_empty());
        assert!(meta.outputs.is_empty());
    }

    #[test]
    fn test_legacy_names_qualified_with_job_namespace() {
        let request = job_request(json!({
            "type": "BATCH",
            "inputs": ["d1", "d2"],
        }));

        let meta = to_job_meta(&namespace_name("ns"), &request).unwrap();
        assert_eq!(meta.inputs, vec![dataset_id("ns", "d1"), dataset_id("ns", "d2")]);
        assert_eq!(meta.outputs, vec![]);
    }

    #[test]
    fn test_no_io_resolves_to_empty() {
        let request = job_request(json!({"type": "SERVICE"}));

        let meta = to_job_meta(&namespace_name("ns"), &request).unwrap();
        assert_eq!(meta.job_type, JobType::Service);
        assert_eq!(meta.inputs, vec![]);
        assert_eq!(meta.outputs, vec![]);
        assert_eq!(meta.location, None);
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_job_meta_maps_optional_fields() {
        let request = job_request(json!({
            "type": "stream",
            "location": "https://github.com/example/jobs/blob/main/ingest.py",
            "context": {"sql": "SELECT 1"},
            "description": "Ingests room bookings",
        }));

        let meta = to_job_meta(&namespace_name("ns"), &request).unwrap();
        assert_eq!(meta.job_type, JobType::Stream);
        assert_eq!(
            meta.location.unwrap().as_str(),
            "https://github.com/example/jobs/blob/main/ingest.py"
        );
        assert_eq!(
            meta.context,
            BTreeMap::from([("sql".to_string(), "SELECT 1".to_string())])
        );
        assert_eq!(meta.description.as_deref(), Some("Ingests room bookings"));
    }

    #[rstest]
    #[case::unknown_type(json!({"type": "CRON"}))]
    #[case::relative_location(json!({"type": "BATCH", "location": "jobs/ingest.py"}))]
    #[case::blank_legacy_input(json!({"type": "BATCH", "inputs": ["d1", ""]}))]
    fn test_job_meta_rejects(#[case] value: serde_json::Value) {
        assert_invalid(to_job_meta(&namespace_name("ns"), &job_request(value)));
    }

    #[test]
    fn test_dataset_meta_dispatch() {
        let request: DatasetRequest = decode(
            br#"{
                "type": "STREAM",
                "physicalName": "room_bookings",
                "sourceName": "kafka_prod",
                "schemaLocation": "https://schemas.example.com/room_bookings.avsc",
                "fields": [{"name": "id", "type": "INTEGER", "tags": ["PK"]}],
                "tags": ["PII"],
                "runId": "0b8b9b8a-4d5c-4a59-9d57-5e1b6e0f2b10"
            }"#,
        )
        .unwrap();

        let meta = to_dataset_meta(&request).unwrap();
        assert_eq!(
            meta.kind,
            DatasetKind::Stream {
                schema_location: Location::new(
                    "https://schemas.example.com/room_bookings.avsc"
                )
                .unwrap()
            }
        );
        assert_eq!(meta.fields.len(), 1);
        assert!(meta.fields[0].tags.contains(&tag_name("PK")));
        assert!(meta.tags.contains(&tag_name("PII")));
        assert_eq!(
            meta.run_id.unwrap().to_string(),
            "0b8b9b8a-4d5c-4a59-9d57-5e1b6e0f2b10"
        );
        assert_eq!(meta.description, None);

        let request: DatasetRequest = decode(
            br#"{"type": "DB_TABLE", "physicalName": "public.rooms", "sourceName": "db"}"#,
        )
        .unwrap();
        let meta = to_dataset_meta(&request).unwrap();
        assert_eq!(meta.kind, DatasetKind::DbTable);
        assert!(meta.fields.is_empty());
        assert_eq!(meta.run_id, None);
    }

    #[rstest]
    #[case::unknown_variant(br#"{"type": "FILE", "physicalName": "a", "sourceName": "b"}"#.as_slice())]
    #[case::missing_variant(br#"{"physicalName": "a", "sourceName": "b"}"#.as_slice())]
    #[case::stream_without_schema(br#"{"type": "STREAM", "physicalName": "a", "sourceName": "b"}"#.as_slice())]
    fn test_dataset_request_decode_rejects(#[case] body: &[u8]) {
        assert_invalid(decode::<DatasetRequest>(body));
    }

    #[rstest]
    #[case::bad_run_id(r#"{"type": "DB_TABLE", "physicalName": "a", "sourceName": "b", "runId": "nope"}"#)]
    #[case::blank_source(r#"{"type": "DB_TABLE", "physicalName": "a", "sourceName": " "}"#)]
    #[case::blank_field_type(r#"{"type": "DB_TABLE", "physicalName": "a", "sourceName": "b", "fields": [{"name": "id", "type": ""}]}"#)]
    #[case::relative_schema(r#"{"type": "STREAM", "physicalName": "a", "sourceName": "b", "schemaLocation": "schemas/a.avsc"}"#)]
    fn test_dataset_meta_rejects(#[case] body: &str) {
        let request: DatasetRequest = decode(body.as_bytes()).unwrap();
        assert_invalid(to_dataset_meta(&request));
    }

    #[test]
    fn test_source_meta() {
        let meta = to_source_meta(&SourceRequest {
            source_type: "POSTGRESQL".to_string(),
            connection_url: "jdbc:postgresql://localhost:5432/analytics".to_string(),
            description: None,
        })
        .unwrap();
        assert_eq!(meta.source_type, SourceType::Postgresql);
        assert_eq!(
            meta.connection_url.as_str(),
            "jdbc:postgresql://localhost:5432/analytics"
        );

        assert_invalid(to_source_meta(&SourceRequest {
            source_type: "ORACLE".to_string(),
            connection_url: "jdbc:oracle://localhost".to_string(),
            description: None,
        }));
        assert_invalid(to_source_meta(&SourceRequest {
            source_type: "POSTGRESQL".to_string(),
            connection_url: "not a url".to_string(),
            description: None,
        }));
    }

    #[rstest]
    #[case::mixed_case_host("https://Warehouse.Example.com")]
    #[case::jdbc("jdbc:postgresql://localhost:5432/analytics")]
    #[case::escaped_path("s3://Bucket/raw%20events/")]
    fn test_urls_are_echoed_as_sent(#[case] url: &str) {
        let meta = to_source_meta(&SourceRequest {
            source_type: "S3".to_string(),
            connection_url: url.to_string(),
            description: None,
        })
        .unwrap();
        let source = Source {
            name: SourceName::new("warehouse").unwrap(),
            source_type: meta.source_type,
            connection_url: meta.connection_url,
            created_at: instant("2020-01-01T00:00:00Z"),
            updated_at: instant("2020-01-01T00:00:00Z"),
            description: meta.description,
        };
        assert_eq!(to_source_response(&source).connection_url, url);

        let meta = to_job_meta(
            &namespace_name("ns"),
            &job_request(json!({"type": "BATCH", "location": url})),
        )
        .unwrap();
        assert_eq!(meta.location.unwrap().as_str(), url);
    }

    #[test]
    fn test_namespace_meta() {
        let meta = to_namespace_meta(&NamespaceRequest {
            owner_name: "data-platform".to_string(),
            description: Some("Shared datasets".to_string()),
        })
        .unwrap();
        assert_eq!(meta.owner_name.as_str(), "data-platform");
        assert_eq!(meta.description.as_deref(), Some("Shared datasets"));

        assert_invalid(to_namespace_meta(&NamespaceRequest {
            owner_name: "".to_string(),
            description: None,
        }));
    }

    #[test]
    fn test_run_meta() {
        let meta = to_run_meta(&RunRequest {
            nominal_start_time: Some("2020-02-01T10:00:00+01:00".to_string()),
            nominal_end_time: None,
            args: BTreeMap::from([("date".to_string(), "2020-02-01".to_string())]),
        })
        .unwrap();
        assert_eq!(
            meta.nominal_start_time,
            Some(instant("2020-02-01T09:00:00Z"))
        );
        assert_eq!(meta.nominal_end_time, None);
        assert_eq!(meta.args.len(), 1);

        assert_invalid(to_run_meta(&RunRequest {
            nominal_start_time: Some("yesterday".to_string()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_db_table_response_has_no_schema_location() {
        let response = to_dataset_response(&db_table("ns", "rooms"));
        assert!(matches!(response, DatasetResponse::DbTable(_)));

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "DB_TABLE");
        assert!(value.get("schemaLocation").is_none());
        assert_eq!(value["lastModifiedAt"], serde_json::Value::Null);
        assert_eq!(value["description"], serde_json::Value::Null);
        assert_eq!(value["createdAt"], "2020-01-01T00:00:00Z");
        assert_eq!(value["id"], json!({"namespace": "ns", "name": "rooms"}));
        assert_eq!(value["namespace"], "ns");
        assert_eq!(value["physicalName"], "public.rooms");
    }

    #[test]
    fn test_stream_response_has_schema_location() {
        let dataset = stream("ns", "bookings", "https://schemas.example.com/b.avsc");
        let value = serde_json::to_value(to_dataset_response(&dataset)).unwrap();

        assert_eq!(value["type"], "STREAM");
        assert_eq!(value["schemaLocation"], "https://schemas.example.com/b.avsc");
    }

    #[test]
    fn test_dataset_response_fields_and_tags() {
        let mut dataset = db_table("ns", "rooms");
        let mut id_field = field("id", "INTEGER");
        id_field.tags.insert(tag_name("PK"));
        dataset.fields = vec![id_field, field("name", "VARCHAR")];
        dataset.tags.insert(tag_name("PII"));
        dataset.last_modified_at = Some(instant("2020-01-02T03:04:05.678Z"));

        let value = serde_json::to_value(to_dataset_response(&dataset)).unwrap();
        assert_eq!(
            value["fields"],
            json!([
                {"name": "id", "type": "INTEGER", "tags": ["PK"], "description": null},
                {"name": "name", "type": "VARCHAR", "tags": [], "description": null},
            ])
        );
        assert_eq!(value["tags"], json!(["PII"]));
        assert_eq!(value["lastModifiedAt"], "2020-01-02T03:04:05.678Z");
    }

    #[test]
    fn test_run_duration() {
        let mut run = new_run(RunState::Completed);
        run.started_at = Some(instant("2020-01-01T00:00:00Z"));
        run.ended_at = Some(instant("2020-01-01T00:00:01.500Z"));

        let response = to_run_response(&run);
        assert_eq!(response.duration_ms, Some(1500));
        assert_eq!(response.state, "COMPLETED");
        assert_eq!(response.started_at.as_deref(), Some("2020-01-01T00:00:00Z"));
        assert_eq!(response.ended_at.as_deref(), Some("2020-01-01T00:00:01.500Z"));
    }

    #[rstest]
    #[case::not_started(None, None)]
    #[case::still_running(Some("2020-01-01T00:00:00Z"), None)]
    #[case::ended_without_start(None, Some("2020-01-01T00:00:00Z"))]
    fn test_run_duration_unset(
        #[case] started_at: Option<&str>,
        #[case] ended_at: Option<&str>,
    ) {
        // State deliberately disagrees with the timestamps
        let mut run = new_run(RunState::Completed);
        run.started_at = started_at.map(instant);
        run.ended_at = ended_at.map(instant);

        let response = to_run_response(&run);
        assert_eq!(response.duration_ms, None);
        assert_eq!(
            serde_json::to_value(&response).unwrap()["durationMs"],
            serde_json::Value::Null
        );
    }

    #[test]
    fn test_job_response_embeds_latest_run() {
        let now = instant("2020-01-01T00:00:00Z");
        let mut run = new_run(RunState::Running);
        run.started_at = Some(now);
        let mut job = Job {
            id: JobId::new(namespace_name("ns"), JobName::new("ingest").unwrap()),
            job_type: JobType::Batch,
            inputs: vec![dataset_id("other", "d1")],
            outputs: vec![dataset_id("ns", "d2")],
            location: None,
            context: BTreeMap::new(),
            description: None,
            created_at: now,
            updated_at: now,
            latest_run: Some(run.clone()),
        };

        let response = to_job_response(&job);
        assert_eq!(response.job_type, "BATCH");
        assert_eq!(response.name, "ingest");
        assert_eq!(response.namespace, "ns");
        assert_eq!(response.inputs, vec![dataset_id("other", "d1")]);
        let latest_run = response.latest_run.unwrap();
        assert_eq!(latest_run.id, run.id.to_string());
        assert_eq!(latest_run.state, "RUNNING");
        assert_eq!(latest_run.duration_ms, None);

        job.latest_run = None;
        let value = serde_json::to_value(to_job_response(&job)).unwrap();
        assert_eq!(value["latestRun"], serde_json::Value::Null);
        assert_eq!(value["location"], serde_json::Value::Null);
    }

    #[test]
    fn test_list_responses_preserve_order() {
        let datasets = vec![
            db_table("ns", "c"),
            stream("ns", "a", "https://schemas.example.com/a.avsc"),
            db_table("ns", "b"),
        ];

        let response = to_datasets_response(&datasets);
        let names: Vec<_> = response
            .datasets
            .iter()
            .map(|d| d.id().name.to_string())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
        assert!(to_runs_response(&[]).runs.is_empty());
    }

    #[test]
    fn test_format_instant() {
        assert_eq!(
            format_instant(&instant("2020-05-06T07:08:09+02:00")),
            "2020-05-06T05:08:09Z"
        );
        assert_eq!(
            format_instant(&instant("2020-05-06T07:08:09.123456Z")),
            "2020-05-06T07:08:09.123456Z"
        );
    }
}
