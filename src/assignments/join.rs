use std::collections::HashMap;

use serde::Serialize;

use crate::models::AssignmentRecord;
use crate::storage::ObjectDescriptor;

/// One record joined with the object its `bucket_url` names, if that object exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentView {
    #[serde(flatten)]
    pub record: AssignmentRecord,
    pub bucket_file_details: Option<ObjectDescriptor>,
}

/// Produces exactly one view per record, in record order. Keys match exactly
/// and case-sensitively; the first descriptor wins if a key repeats.
pub fn join_assignments(
    records: Vec<AssignmentRecord>,
    descriptors: Vec<ObjectDescriptor>,
) -> Vec<AssignmentView> {
    let mut by_key: HashMap<String, ObjectDescriptor> = HashMap::with_capacity(descriptors.len());
    for descriptor in descriptors {
        by_key.entry(descriptor.key.clone()).or_insert(descriptor);
    }

    records
        .into_iter()
        .map(|record| {
            let bucket_file_details = by_key.get(&record.bucket_url).cloned();
            AssignmentView {
                record,
                bucket_file_details,
            }
        })
        .collect()
}
