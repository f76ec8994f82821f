use payflow_core::types::{insert_path, FieldMapping};
use payflow_core::{Record, WorkflowError};
use serde_json::Value as JsonValue;

use crate::executor::guard::call_transform;

/// Apply `mappings` in declaration order, writing into `record` in place.
///
/// `from` is a literal top-level key; an absent key maps as `null`.
/// A later mapping sees keys written by earlier ones. On failure `record` keeps every
/// write made before the failing mapping.
pub fn apply_mappings(
    mappings: &[FieldMapping],
    record: &mut Record,
    catch_panics: bool,
) -> Result<(), WorkflowError> {
    for mapping in mappings {
        apply_mapping(mapping, record, catch_panics).map_err(|source| WorkflowError::Mapping {
            field: mapping.from.clone(),
            source,
        })?;
    }
    Ok(())
}

fn apply_mapping(
    mapping: &FieldMapping,
    record: &mut Record,
    catch_panics: bool,
) -> Result<(), payflow_core::TransformError> {
    let mut value = record.get(&mapping.from).cloned().unwrap_or(JsonValue::Null);
    if let Some(transform) = &mapping.transform {
        value = call_transform(transform, value, catch_panics)?;
    }
    insert_path(record, &mapping.to.segments(), value)
}
