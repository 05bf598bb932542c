use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::memory::MemoryStore;
use crate::context::CatalogContext;
use crate::data_types::{
    DatasetId, DatasetName, Field, FieldName, FieldType, Location, NamespaceName,
    RunState, SourceName, TagName,
};
use crate::model::{Dataset, DatasetKind, Run, Timestamp};

pub fn namespace_name(name: &str) -> NamespaceName {
    NamespaceName::new(name).unwrap()
}

pub fn dataset_name(name: &str) -> DatasetName {
    DatasetName::new(name).unwrap()
}

pub fn tag_name(name: &str) -> TagName {
    TagName::new(name).unwrap()
}

pub fn dataset_id(namespace: &str, name: &str) -> DatasetId {
    DatasetId::new(namespace_name(namespace), dataset_name(name))
}

pub fn instant(value: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(value)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn field(name: &str, field_type: &str) -> Field {
    Field {
        name: FieldName::new(name).unwrap(),
        field_type: FieldType::new(field_type).unwrap(),
        tags: BTreeSet::new(),
        description: None,
    }
}

pub fn db_table(namespace: &str, name: &str) -> Dataset {
    let now = instant("2020-01-01T00:00:00Z");
    Dataset {
        id: dataset_id(namespace, name),
        physical_name: dataset_name(&format!("public.{name}")),
        created_at: now,
        updated_at: now,
        source_name: SourceName::new("analytics_db").unwrap(),
        fields: vec![],
        tags: BTreeSet::new(),
        last_modified_at: None,
        description: None,
        kind: DatasetKind::DbTable,
    }
}

pub fn stream(namespace: &str, name: &str, schema_location: &str) -> Dataset {
    Dataset {
        kind: DatasetKind::Stream {
            schema_location: Location::new(schema_location).unwrap(),
        },
        ..db_table(namespace, name)
    }
}

pub fn new_run(state: RunState) -> Run {
    let now = instant("2020-01-01T00:00:00Z");
    Run {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        nominal_start_time: None,
        nominal_end_time: None,
        started_at: None,
        ended_at: None,
        state,
        args: BTreeMap::new(),
    }
}

/// A context backed by a fresh in-memory store, with the default paging
/// limits.
pub fn in_memory_context() -> CatalogContext {
    CatalogContext::new_from_store(Arc::new(MemoryStore::new()), 100, 1000)
}
