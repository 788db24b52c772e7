//! # Quality Module
//!
//! Chooses which member of a duplicate group is kept and where the others go.
//!
//! ## Ranking
//! | Category | Preferred member |
//! |----------|------------------|
//! | Image    | Most pixels, then largest file |
//! | Video    | Most pixels, then longest, then largest file |
//! | Other    | First member in scan order |
//!
//! Ties always go to the earliest member so repeated runs keep the same file.
//!
//! Non-canonical images whose known dimensions fit inside the thumbnail
//! box are routed to the thumbnails folder instead of the duplicates folder.

use crate::core::grouper::DuplicateGroup;
use crate::core::scanner::{FileRecord, MediaCategory};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default largest side, in pixels, of an image treated as a thumbnail
pub const DEFAULT_THUMBNAIL_MAX_SIDE: u32 = 150;

/// Metadata used to rank group members
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualitySignals {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
    /// File size in bytes
    pub size: u64,
}

impl QualitySignals {
    pub fn from_size(size: u64) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = Some(secs);
        self
    }

    /// Width times height, zero when unknown
    pub fn pixel_count(&self) -> u64 {
        match (self.width, self.height) {
            (Some(w), Some(h)) => w as u64 * h as u64,
            _ => 0,
        }
    }
}

/// Where a non-canonical member is moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    /// Directly into the destination folder
    Duplicates,
    /// Into the thumbnails subfolder of the destination
    Thumbnails,
}

/// A single planned relocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedMove {
    pub record: FileRecord,
    pub target: MoveTarget,
}

/// What happens to the members of one group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocationPlan {
    /// Member that stays in place
    pub keep: FileRecord,
    /// Every other member, in group order
    pub moves: Vec<PlannedMove>,
}

/// Picks the canonical member of each group
#[derive(Debug, Clone)]
pub struct QualityRanker {
    thumbnail_max_side: u32,
}

impl Default for QualityRanker {
    fn default() -> Self {
        Self {
            thumbnail_max_side: DEFAULT_THUMBNAIL_MAX_SIDE,
        }
    }
}

impl QualityRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Images with both sides at or below this size count as thumbnails
    pub fn thumbnail_max_side(mut self, side: u32) -> Self {
        self.thumbnail_max_side = side;
        self
    }

    /// Index of the member to keep
    pub fn select_canonical(&self, group: &DuplicateGroup) -> usize {
        if !matches!(group.category, MediaCategory::Image | MediaCategory::Video) {
            return 0;
        }

        let mut best = 0;
        for (index, member) in group.members.iter().enumerate().skip(1) {
            let current = &group.members[best].quality;
            if compare(group.category, &member.quality, current) == Ordering::Greater {
                best = index;
            }
        }
        best
    }

    /// Whether a member is a thumbnail variant; unknown dimensions never are
    pub fn is_thumbnail(&self, category: MediaCategory, quality: &QualitySignals) -> bool {
        category == MediaCategory::Image
            && matches!(
                (quality.width, quality.height),
                (Some(w), Some(h)) if w <= self.thumbnail_max_side && h <= self.thumbnail_max_side
            )
    }

    /// Keep the canonical member and route every other member
    pub fn plan(&self, group: &DuplicateGroup) -> RelocationPlan {
        let keep_index = self.select_canonical(group);

        let moves = group
            .members
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != keep_index)
            .map(|(_, member)| PlannedMove {
                record: member.record.clone(),
                target: if self.is_thumbnail(group.category, &member.quality) {
                    MoveTarget::Thumbnails
                } else {
                    MoveTarget::Duplicates
                },
            })
            .collect();

        RelocationPlan {
            keep: group.members[keep_index].record.clone(),
            moves,
        }
    }
}

fn compare(category: MediaCategory, a: &QualitySignals, b: &QualitySignals) -> Ordering {
    let by_pixels = a.pixel_count().cmp(&b.pixel_count());
    let by_size = a.size.cmp(&b.size);

    match category {
        MediaCategory::Video => {
            let by_duration = a
                .duration_secs
                .unwrap_or(0.0)
                .total_cmp(&b.duration_secs.unwrap_or(0.0));
            by_pixels.then(by_duration).then(by_size)
        }
        _ => by_pixels.then(by_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grouper::{GroupMember, MatchType};

    fn member(name: &str, category: MediaCategory, quality: QualitySignals) -> GroupMember {
        GroupMember {
            record: FileRecord::new(name, quality.size, category),
            quality,
            distance: 0,
        }
    }

    fn group(category: MediaCategory, members: Vec<GroupMember>) -> DuplicateGroup {
        DuplicateGroup::new(category, members, MatchType::Exact, 0)
    }

    fn image(name: &str, w: u32, h: u32, size: u64) -> GroupMember {
        member(
            name,
            MediaCategory::Image,
            QualitySignals::from_size(size).with_dimensions(w, h),
        )
    }

    #[test]
    fn image_prefers_resolution_over_size() {
        let g = group(
            MediaCategory::Image,
            vec![
                image("small.jpg", 800, 600, 9_000_000),
                image("large.jpg", 1920, 1080, 500_000),
            ],
        );
        assert_eq!(QualityRanker::new().select_canonical(&g), 1);
    }

    #[test]
    fn image_ties_on_resolution_use_size() {
        let g = group(
            MediaCategory::Image,
            vec![
                image("a.jpg", 1920, 1080, 100),
                image("b.jpg", 1920, 1080, 200),
            ],
        );
        assert_eq!(QualityRanker::new().select_canonical(&g), 1);
    }

    #[test]
    fn full_tie_keeps_earliest_member() {
        let g = group(
            MediaCategory::Image,
            vec![
                image("a.jpg", 100, 100, 50),
                image("b.jpg", 1920, 1080, 200),
                image("c.jpg", 1920, 1080, 200),
            ],
        );
        assert_eq!(QualityRanker::new().select_canonical(&g), 1);
    }

    #[test]
    fn video_prefers_duration_after_resolution() {
        let video = |name: &str, secs: f64, size: u64| {
            member(
                name,
                MediaCategory::Video,
                QualitySignals::from_size(size)
                    .with_dimensions(1280, 720)
                    .with_duration(secs),
            )
        };
        let g = group(
            MediaCategory::Video,
            vec![video("short.mp4", 30.0, 900), video("long.mp4", 31.0, 100)],
        );
        assert_eq!(QualityRanker::new().select_canonical(&g), 1);
    }

    #[test]
    fn audio_keeps_first_member() {
        let g = group(
            MediaCategory::Audio,
            vec![
                member("a.mp3", MediaCategory::Audio, QualitySignals::from_size(10)),
                member("b.mp3", MediaCategory::Audio, QualitySignals::from_size(99)),
            ],
        );
        assert_eq!(QualityRanker::new().select_canonical(&g), 0);
    }

    #[test]
    fn plan_routes_thumbnails() {
        let g = group(
            MediaCategory::Image,
            vec![
                image("thumb.jpg", 100, 100, 5_000),
                image("photo.jpg", 1920, 1080, 900_000),
                image("copy.jpg", 1920, 1080, 800_000),
            ],
        );
        let plan = QualityRanker::new().plan(&g);

        assert!(plan.keep.path.ends_with("photo.jpg"));
        assert_eq!(plan.moves.len(), 2);
        assert_eq!(plan.moves[0].target, MoveTarget::Thumbnails);
        assert_eq!(plan.moves[1].target, MoveTarget::Duplicates);
    }

    #[test]
    fn thumbnail_boundary_is_inclusive() {
        let ranker = QualityRanker::new();
        let at_limit = QualitySignals::from_size(1).with_dimensions(150, 150);
        let over = QualitySignals::from_size(1).with_dimensions(151, 100);
        assert!(ranker.is_thumbnail(MediaCategory::Image, &at_limit));
        assert!(!ranker.is_thumbnail(MediaCategory::Image, &over));
        assert!(!ranker.is_thumbnail(MediaCategory::Image, &QualitySignals::from_size(1)));
        assert!(!ranker.is_thumbnail(MediaCategory::Video, &at_limit));
    }

    #[test]
    fn custom_thumbnail_side() {
        let ranker = QualityRanker::new().thumbnail_max_side(64);
        let q = QualitySignals::from_size(1).with_dimensions(100, 100);
        assert!(!ranker.is_thumbnail(MediaCategory::Image, &q));
    }
}
