//! # Grouper Module
//!
//! Partitions fingerprinted files into duplicate groups.
//!
//! ## Grouping Modes
//! - **Exact** - identical fingerprints (and, for byte hashes, identical
//!   extensions) share a bucket
//! - **Clustering** - first-fit: each file joins the first earlier
//!   representative within threshold, or starts a new cluster
//!
//! Buckets and clusters with a single member are dropped.
//!
//! ## Match Classification
//! | Max distance | Classification |
//! |--------------|----------------|
//! | 0            | Exact match    |
//! | 1-4          | Near-exact     |
//! | 5-10         | Similar        |
//! | 11+          | Possibly similar |

mod cluster;
mod exact;
mod traits;

pub use cluster::FirstFitClusterer;
pub use exact::ExactGrouper;
pub use traits::{ComparisonStrategy, SimilarityThresholds, ThresholdStrategy};

use crate::core::fingerprint::{Fingerprint, GroupingMode};
use crate::core::quality::QualitySignals;
use crate::core::scanner::{FileRecord, MediaCategory};
use crate::events::{Event, EventSender, GroupEvent};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A file with its computed fingerprint, ready for grouping
#[derive(Debug, Clone)]
pub struct FingerprintedFile {
    pub record: FileRecord,
    pub fingerprint: Fingerprint,
    pub quality: QualitySignals,
}

/// A member of a duplicate group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub record: FileRecord,
    pub quality: QualitySignals,
    /// Distance to the group's first member
    pub distance: u32,
}

impl GroupMember {
    fn from_file(file: FingerprintedFile, distance: u32) -> Self {
        Self {
            record: file.record,
            quality: file.quality,
            distance,
        }
    }
}

/// Classification of match types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// Distance = 0, identical fingerprints
    Exact,
    /// Distance 1-4, virtually identical
    NearExact,
    /// Distance 5-10, likely duplicates
    Similar,
    /// Distance 11+, only reachable with loose thresholds
    MaybeSimilar,
}

impl MatchType {
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => MatchType::Exact,
            1..=4 => MatchType::NearExact,
            5..=10 => MatchType::Similar,
            _ => MatchType::MaybeSimilar,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "Exact Match"),
            MatchType::NearExact => write!(f, "Near-Exact Match"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::MaybeSimilar => write!(f, "Possibly Similar"),
        }
    }
}

/// A set of two or more files judged to be the same content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Unique identifier for this group
    pub id: Uuid,
    pub category: MediaCategory,
    /// Members in scan order
    pub members: Vec<GroupMember>,
    pub match_type: MatchType,
    /// Largest member distance to the first member
    pub max_distance: u32,
}

impl DuplicateGroup {
    pub fn new(
        category: MediaCategory,
        members: Vec<GroupMember>,
        match_type: MatchType,
        max_distance: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            members,
            match_type,
            max_distance,
        }
    }

    /// Build a group from members, classifying by their largest distance
    pub(crate) fn from_members(
        members: Vec<GroupMember>,
        strategy: &dyn ComparisonStrategy,
    ) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }
        let category = members[0].record.category;
        let max_distance = members.iter().map(|m| m.distance).max().unwrap_or(0);
        Some(Self::new(
            category,
            members,
            strategy.classify(max_distance),
            max_distance,
        ))
    }

    /// Number of members that are not kept
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.members.iter().map(|m| m.record.path.clone()).collect()
    }

    pub fn total_size(&self) -> u64 {
        self.members.iter().map(|m| m.record.size).sum()
    }
}

/// Group files with the grouper matching a strategy's grouping mode
pub fn group_files(
    mode: GroupingMode,
    strategy: &dyn ComparisonStrategy,
    files: Vec<FingerprintedFile>,
) -> Vec<DuplicateGroup> {
    group_files_with_events(mode, strategy, files, &crate::events::null_sender())
}

/// Group files, emitting an event per group found
pub fn group_files_with_events(
    mode: GroupingMode,
    strategy: &dyn ComparisonStrategy,
    files: Vec<FingerprintedFile>,
    events: &EventSender,
) -> Vec<DuplicateGroup> {
    let groups = match mode {
        GroupingMode::Exact { by_extension } => {
            ExactGrouper::new(by_extension).group(files, strategy)
        }
        GroupingMode::Clustering => FirstFitClusterer::new(strategy).group(files),
    };

    for group in &groups {
        events.send(Event::Group(GroupEvent::GroupFound {
            group_id: group.id.to_string(),
            file_count: group.members.len(),
        }));
    }

    events.send(Event::Group(GroupEvent::Completed {
        total_groups: groups.len(),
        total_duplicates: groups.iter().map(DuplicateGroup::duplicate_count).sum(),
    }));

    groups
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::events::EventChannel;

    #[test]
    fn match_type_classification() {
        assert_eq!(MatchType::from_distance(0), MatchType::Exact);
        assert_eq!(MatchType::from_distance(4), MatchType::NearExact);
        assert_eq!(MatchType::from_distance(5), MatchType::Similar);
        assert_eq!(MatchType::from_distance(11), MatchType::MaybeSimilar);
    }

    #[test]
    fn group_files_dispatches_on_mode() {
        let strategy = ThresholdStrategy::default();
        let exact_groups = group_files(
            GroupingMode::Exact { by_extension: true },
            &strategy,
            vec![exact("a.mp3", 1), exact("b.mp3", 1), exact("c.mp3", 2)],
        );
        assert_eq!(exact_groups.len(), 1);
        assert_eq!(exact_groups[0].match_type, MatchType::Exact);

        let clusters = group_files(
            GroupingMode::Clustering,
            &strategy,
            vec![image("a.jpg", 0), image("b.jpg", 0b111)],
        );
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].max_distance, 3);
        assert_eq!(clusters[0].match_type, MatchType::NearExact);
    }

    #[test]
    fn canonical_only_directory_yields_no_groups() {
        let groups = group_files(
            GroupingMode::Exact { by_extension: true },
            &ThresholdStrategy::default(),
            vec![exact("a.mp3", 1), exact("b.mp3", 2), exact("c.mp3", 3)],
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn group_events_are_emitted() {
        let (sender, receiver) = EventChannel::new();

        group_files_with_events(
            GroupingMode::Exact { by_extension: true },
            &ThresholdStrategy::default(),
            vec![exact("a.mp3", 1), exact("b.mp3", 1)],
            &sender,
        );
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert!(matches!(
            events.last(),
            Some(Event::Group(GroupEvent::Completed {
                total_groups: 1,
                total_duplicates: 1
            }))
        ));
    }
}
