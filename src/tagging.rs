//! Tag propagation over datasets and their fields.
//!
//! All functions take a snapshot and return a new [`Dataset`]; the input is
//! never modified. Persisting the result (and guarding against concurrent
//! taggers) is up to the store.

use std::collections::BTreeSet;

use crate::data_types::{Field, FieldName, TagName};
use crate::model::Dataset;

fn with_tag(tags: &BTreeSet<TagName>, tag: &TagName) -> BTreeSet<TagName> {
    let mut tags = tags.clone();
    tags.insert(tag.clone());
    tags
}

fn tag_field_value(field: &Field, tag: &TagName) -> Field {
    Field {
        tags: with_tag(&field.tags, tag),
        ..field.clone()
    }
}

/// Add `tag` to the dataset's own tag set. Applying the same tag twice is
/// the same as applying it once.
pub fn tag_dataset(dataset: &Dataset, tag: &TagName) -> Dataset {
    Dataset {
        tags: with_tag(&dataset.tags, tag),
        ..dataset.clone()
    }
}

/// Add `tag` to every field of the dataset, keeping field order. The
/// dataset's own tags are left alone.
pub fn tag_all_fields(dataset: &Dataset, tag: &TagName) -> Dataset {
    Dataset {
        fields: dataset
            .fields
            .iter()
            .map(|field| tag_field_value(field, tag))
            .collect(),
        ..dataset.clone()
    }
}

/// Add `tag` to a single field. Returns `None` if the dataset has no field
/// called `field_name`.
pub fn tag_field(dataset: &Dataset, field_name: &FieldName, tag: &TagName) -> Option<Dataset> {
    if !dataset.fields.iter().any(|f| &f.name == field_name) {
        return None;
    }

    Some(Dataset {
        fields: dataset
            .fields
            .iter()
            .map(|field| {
                if &field.name == field_name {
                    tag_field_value(field, tag)
                } else {
                    field.clone()
                }
            })
            .collect(),
        ..dataset.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{db_table, field, tag_name};

    #[test]
    fn test_tag_dataset_is_idempotent() {
        let dataset = db_table("ns", "room_bookings");
        let pii = tag_name("PII");

        let once = tag_dataset(&dataset, &pii);
        let twice = tag_dataset(&once, &pii);

        assert_eq!(once.tags, BTreeSet::from([pii.clone()]));
        assert_eq!(once, twice);
        // Input snapshot untouched
        assert!(dataset.tags.is_empty());
    }

    #[test]
    fn test_tag_dataset_unions_with_existing_tags() {
        let mut dataset = db_table("ns", "room_bookings");
        dataset.tags.insert(tag_name("SENSITIVE"));

        let tagged = tag_dataset(&dataset, &tag_name("PII"));

        assert_eq!(
            tagged.tags,
            BTreeSet::from([tag_name("PII"), tag_name("SENSITIVE")])
        );
        assert_eq!(tagged.fields, dataset.fields);
    }

    #[test]
    fn test_tag_all_fields() {
        let mut dataset = db_table("ns", "room_bookings");
        dataset.fields = vec![field("f1", "INTEGER"), field("f2", "VARCHAR")];
        dataset.tags.insert(tag_name("SENSITIVE"));
        let pii = tag_name("PII");

        let tagged = tag_all_fields(&dataset, &pii);

        assert_eq!(
            tagged.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["f1", "f2"]
        );
        for f in &tagged.fields {
            assert!(f.tags.contains(&pii));
        }
        assert_eq!(tagged.tags, dataset.tags);
        assert_eq!(tag_all_fields(&tagged, &pii), tagged);
    }

    #[test]
    fn test_tag_all_fields_without_fields() {
        let dataset = db_table("ns", "empty");
        assert_eq!(tag_all_fields(&dataset, &tag_name("PII")), dataset);
    }

    #[test]
    fn test_tag_single_field() {
        let mut dataset = db_table("ns", "room_bookings");
        dataset.fields = vec![field("f1", "INTEGER"), field("f2", "VARCHAR")];
        let pii = tag_name("PII");

        let tagged = tag_field(&dataset, &FieldName::new("f2").unwrap(), &pii).unwrap();
        assert!(tagged.fields[0].tags.is_empty());
        assert!(tagged.fields[1].tags.contains(&pii));

        assert!(tag_field(&dataset, &FieldName::new("missing").unwrap(), &pii).is_none());
    }
}
