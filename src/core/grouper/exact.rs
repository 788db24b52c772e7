//! Bucket grouping for fingerprints compared by equality.

use super::{ComparisonStrategy, DuplicateGroup, FingerprintedFile, GroupMember};
use crate::core::fingerprint::Fingerprint;
use std::collections::HashMap;

/// Groups files whose fingerprints are identical.
///
/// Buckets are emitted in the order their first member was seen, and
/// members keep their input order.
#[derive(Debug, Clone, Copy)]
pub struct ExactGrouper {
    by_extension: bool,
}

impl ExactGrouper {
    /// `by_extension` additionally requires the same (case-insensitive)
    /// extension, so identical bytes saved as `.mp3` and `.wav` stay apart
    pub fn new(by_extension: bool) -> Self {
        Self { by_extension }
    }

    pub fn group(
        &self,
        files: Vec<FingerprintedFile>,
        strategy: &dyn ComparisonStrategy,
    ) -> Vec<DuplicateGroup> {
        let mut index: HashMap<(Fingerprint, Option<String>), usize> = HashMap::new();
        let mut buckets: Vec<Vec<GroupMember>> = Vec::new();

        for file in files {
            let extension = self.by_extension.then(|| file.record.extension());
            let key = (file.fingerprint.clone(), extension);

            let slot = *index.entry(key).or_insert_with(|| {
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(GroupMember::from_file(file, 0));
        }

        buckets
            .into_iter()
            .filter_map(|members| DuplicateGroup::from_members(members, strategy))
            .collect()
    }
}
