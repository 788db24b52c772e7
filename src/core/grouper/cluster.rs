//! First-fit clustering for fingerprints compared by distance.
//!
//! Each file is compared with the existing cluster representatives in the
//! order the clusters were created, and joins the first one within
//! threshold. A file that matches none starts a new cluster and becomes its
//! representative. Clusters are never merged or re-split, so the result
//! depends on input order.

use super::{ComparisonStrategy, DuplicateGroup, FingerprintedFile, GroupMember};
use crate::core::fingerprint::Fingerprint;

struct Cluster {
    representative: Fingerprint,
    members: Vec<GroupMember>,
}

/// Single-pass first-fit clusterer
pub struct FirstFitClusterer<'a> {
    strategy: &'a dyn ComparisonStrategy,
}

impl<'a> FirstFitClusterer<'a> {
    pub fn new(strategy: &'a dyn ComparisonStrategy) -> Self {
        Self { strategy }
    }

    pub fn group(&self, files: Vec<FingerprintedFile>) -> Vec<DuplicateGroup> {
        let mut clusters: Vec<Cluster> = Vec::new();

        for file in files {
            let hit = clusters.iter().enumerate().find_map(|(i, cluster)| {
                self.strategy
                    .compare(&cluster.representative, &file.fingerprint)
                    .map(|distance| (i, distance))
            });

            match hit {
                Some((i, distance)) => clusters[i]
                    .members
                    .push(GroupMember::from_file(file, distance)),
                None => clusters.push(Cluster {
                    representative: file.fingerprint.clone(),
                    members: vec![GroupMember::from_file(file, 0)],
                }),
            }
        }

        clusters
            .into_iter()
            .filter_map(|cluster| DuplicateGroup::from_members(cluster.members, self.strategy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::image;
    use super::super::{MatchType, ThresholdStrategy};
    use super::*;

    fn names(group: &DuplicateGroup) -> Vec<String> {
        group
            .members
            .iter()
            .map(|m| m.record.path.to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn within_threshold_clusters_together() {
        let strategy = ThresholdStrategy::default();
        let groups = FirstFitClusterer::new(&strategy).group(vec![
            image("a.jpg", 0),
            image("b.jpg", 0b1_1111),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].max_distance, 5);
        assert_eq!(groups[0].match_type, MatchType::Similar);
    }

    #[test]
    fn beyond_threshold_stays_apart() {
        let strategy = ThresholdStrategy::default();
        let groups = FirstFitClusterer::new(&strategy).group(vec![
            image("a.jpg", 0),
            image("b.jpg", 0b11_1111),
        ]);
        assert!(groups.is_empty());
    }

    #[test]
    fn first_matching_representative_wins() {
        // c is within threshold of both a and b; a was created first
        let strategy = ThresholdStrategy::default();
        let groups = FirstFitClusterer::new(&strategy).group(vec![
            image("a.jpg", 0),
            image("b.jpg", 0xFF),
            image("c.jpg", 0x0F),
            image("d.jpg", 0xFF),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(names(&groups[0]), vec!["a.jpg", "c.jpg"]);
        assert_eq!(names(&groups[1]), vec!["b.jpg", "d.jpg"]);
    }

    #[test]
    fn comparison_is_against_representative_only() {
        // b joins a (distance 4); c is 4 from b but 8 from a, so it is alone
        let strategy = ThresholdStrategy::default();
        let groups = FirstFitClusterer::new(&strategy).group(vec![
            image("a.jpg", 0),
            image("b.jpg", 0x0F),
            image("c.jpg", 0xFF),
        ]);

        assert_eq!(groups.len(), 1);
        assert_eq!(names(&groups[0]), vec!["a.jpg", "b.jpg"]);
    }
}
