use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::catalog::{CatalogError, CatalogResult};

pub const MAX_NAME_LENGTH: usize = 1024;
pub const MAX_NAMESPACE_NAME_LENGTH: usize = 255;

fn validate_name(kind: &str, value: &str, max_length: usize) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::invalid(format!("{kind} must not be blank")));
    }
    if value.chars().count() > max_length {
        return Err(CatalogError::invalid(format!(
            "{kind} {value:?} is longer than {max_length} characters"
        )));
    }
    Ok(())
}

/// Declare a validated, string-backed identifier. The generated type can only
/// be built through `new` (or `TryFrom<String>` when deserializing), so holding
/// one means the value has passed validation.
macro_rules! string_identifier {
    ($(#[$doc:meta])* $name:ident, $kind:literal) => {
        string_identifier!($(#[$doc])* $name, $kind, |value: &str| {
            validate_name($kind, value, MAX_NAME_LENGTH)
        });
    };
    ($(#[$doc:meta])* $name:ident, $kind:literal, $validate:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> CatalogResult<Self> {
                let value = value.into();
                let validate: fn(&str) -> CatalogResult<()> = $validate;
                validate(&value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = CatalogError;

            fn try_from(value: String) -> CatalogResult<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(val: $name) -> Self {
                val.0
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> CatalogResult<Self> {
                Self::new(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_identifier!(
    /// Namespace names end up in URL paths, so they are restricted to a
    /// conservative character set.
    NamespaceName,
    "Namespace name",
    |value: &str| {
        validate_name("Namespace name", value, MAX_NAMESPACE_NAME_LENGTH)?;
        match value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            Some(c) => Err(CatalogError::invalid(format!(
                "Namespace name {value:?} contains invalid character {c:?}"
            ))),
            None => Ok(()),
        }
    }
);
string_identifier!(DatasetName, "Dataset name");
string_identifier!(SourceName, "Source name");
string_identifier!(JobName, "Job name");
string_identifier!(OwnerName, "Owner name");
string_identifier!(TagName, "Tag name");
string_identifier!(FieldName, "Field name");
string_identifier!(
    /// An absolute URL, kept exactly as the client wrote it. Parsing only
    /// validates; the normalized form is never stored.
    Location,
    "Location",
    |value: &str| {
        url::Url::parse(value)
            .map(|_| ())
            .map_err(CatalogError::from)
    }
);
string_identifier!(
    /// Column type label as reported by the source (`INTEGER`, `VARCHAR`, ...).
    FieldType,
    "Field type"
);

/// Parse an upper-case enum label, reporting unknown labels as InvalidArgument.
pub fn parse_label<T: FromStr>(kind: &str, value: &str) -> CatalogResult<T> {
    value
        .parse::<T>()
        .map_err(|_| CatalogError::invalid(format!("Unknown {kind} {value:?}")))
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SourceType {
    Mysql,
    Postgresql,
    Redshift,
    Snowflake,
    Bigquery,
    Kafka,
    Kinesis,
    #[serde(rename = "S3")]
    #[strum(serialize = "S3")]
    S3,
    #[serde(rename = "GCS")]
    #[strum(serialize = "GCS")]
    Gcs,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum JobType {
    Batch,
    Stream,
    Service,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum DatasetType {
    DbTable,
    Stream,
}

/// Lifecycle of a run: NEW -> RUNNING -> {COMPLETED, FAILED, ABORTED}.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum RunState {
    New,
    Running,
    Completed,
    Failed,
    Aborted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed | RunState::Aborted)
    }

    pub fn can_transition_to(&self, next: RunState) -> bool {
        match self {
            RunState::New => next == RunState::Running,
            RunState::Running => next.is_terminal(),
            _ => false,
        }
    }
}

/// Namespace-qualified reference to a dataset. Job inputs and outputs use this
/// so that a job can read from and write to other namespaces.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DatasetId {
    pub namespace: NamespaceName,
    pub name: DatasetName,
}

impl DatasetId {
    pub fn new(namespace: NamespaceName, name: DatasetName) -> Self {
        Self { namespace, name }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobId {
    pub namespace: NamespaceName,
    pub name: JobName,
}

impl JobId {
    pub fn new(namespace: NamespaceName, name: JobName) -> Self {
        Self { namespace, name }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// A column of a dataset. Owned by the dataset it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: FieldName,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub tags: BTreeSet<TagName>,
    #[serde(default)]
    pub description: Option<String>,
}
