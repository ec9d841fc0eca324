//! Cover objects and cover clustering.
//!
//! A cover is a fixed point a soldier can occupy; at most one soldier holds
//! it at a time. Clusters are ephemeral: they are rebuilt from the current
//! cover list on every query and refer to covers by index.

use serde::{Deserialize, Serialize};

use crate::config::{positive, TuningError};
use crate::geometry::Vec2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoverError {
    #[error("cover is already occupied by another soldier")]
    Occupied,
}

/// A point of cover, optionally held by one agent of type `A`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverObject<A> {
    pub position: Vec2,
    occupant: Option<A>,
}

impl<A: Copy + PartialEq> CoverObject<A> {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            occupant: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn occupant(&self) -> Option<A> {
        self.occupant
    }

    /// Claim the cover for `agent`. Re-claiming by the holder is a no-op;
    /// a claim by anyone else fails and leaves the holder in place.
    pub fn set_occupied(&mut self, agent: A) -> Result<(), CoverError> {
        match self.occupant {
            Some(current) if current != agent => Err(CoverError::Occupied),
            _ => {
                self.occupant = Some(agent);
                Ok(())
            }
        }
    }

    pub fn set_free(&mut self) {
        self.occupant = None;
    }

    /// Free the cover only if `agent` holds it. Returns whether it was freed.
    pub fn release_by(&mut self, agent: A) -> bool {
        if self.occupant == Some(agent) {
            self.occupant = None;
            true
        } else {
            false
        }
    }
}

/// Anything the cluster detector can group.
pub trait CoverPoint {
    fn position(&self) -> Vec2;
    fn is_occupied(&self) -> bool;
}

impl<A: Copy + PartialEq> CoverPoint for CoverObject<A> {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn is_occupied(&self) -> bool {
        CoverObject::is_occupied(self)
    }
}

/// A group of nearby covers. `members` index into the slice it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverCluster {
    pub members: Vec<usize>,
    pub center: Vec2,
    pub available_count: usize,
}

impl CoverCluster {
    fn from_members<C: CoverPoint>(covers: &[C], members: Vec<usize>) -> Self {
        let center =
            Vec2::centroid(members.iter().map(|&i| covers[i].position())).unwrap_or(Vec2::ZERO);
        let available_count = members.iter().filter(|&&i| !covers[i].is_occupied()).count();
        Self {
            members,
            center,
            available_count,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    /// Member indices whose cover is currently free, in member order.
    pub fn free_members<C: CoverPoint>(&self, covers: &[C]) -> Vec<usize> {
        self.members
            .iter()
            .copied()
            .filter(|&i| covers.get(i).is_some_and(|c| !c.is_occupied()))
            .collect()
    }
}

/// Groups covers into clusters and picks one for a squad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterDetector {
    /// Max distance between two covers linked into the same cluster.
    pub cluster_radius: f32,
    /// Only covers this close to the squad are considered.
    pub detection_radius: f32,
    pub max_covers_per_cluster: Option<usize>,
    pub min_covers_per_cluster: usize,
}

impl Default for ClusterDetector {
    fn default() -> Self {
        Self {
            cluster_radius: 10.0,
            detection_radius: 20.0,
            max_covers_per_cluster: None,
            min_covers_per_cluster: 1,
        }
    }
}

impl ClusterDetector {
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("cluster_radius", self.cluster_radius)?;
        positive("detection_radius", self.detection_radius)?;
        if let Some(max) = self.max_covers_per_cluster {
            if max < self.min_covers_per_cluster.max(1) {
                return Err(TuningError::ClusterBounds {
                    min: self.min_covers_per_cluster,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Partition every cover into clusters.
    ///
    /// Greedy single-link: the first unassigned cover (input order) seeds a
    /// cluster, which then absorbs any unassigned cover within
    /// `cluster_radius` of any member until nothing changes or the cap is hit.
    pub fn create_clusters<C: CoverPoint>(&self, covers: &[C]) -> Vec<CoverCluster> {
        let all: Vec<usize> = (0..covers.len()).collect();
        self.cluster_subset(covers, &all)
    }

    fn cluster_subset<C: CoverPoint>(&self, covers: &[C], subset: &[usize]) -> Vec<CoverCluster> {
        let cap = self.max_covers_per_cluster.unwrap_or(usize::MAX).max(1);
        let r2 = self.cluster_radius * self.cluster_radius;
        let mut assigned = vec![false; subset.len()];
        let mut clusters = Vec::new();

        for seed in 0..subset.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut members = vec![subset[seed]];

            let mut grew = true;
            while grew && members.len() < cap {
                grew = false;
                for (slot, &candidate) in subset.iter().enumerate() {
                    if assigned[slot] || members.len() >= cap {
                        continue;
                    }
                    let p = covers[candidate].position();
                    let linked = members
                        .iter()
                        .any(|&m| covers[m].position().distance_squared(&p) <= r2);
                    if linked {
                        assigned[slot] = true;
                        members.push(candidate);
                        grew = true;
                    }
                }
            }

            clusters.push(CoverCluster::from_members(covers, members));
        }

        clusters
    }

    /// Nearest cluster around `position` with at least `squad_size` covers.
    ///
    /// Member indices of the result refer to `candidates`.
    pub fn find_best_cluster_for_squad<C: CoverPoint>(
        &self,
        position: Vec2,
        squad_size: usize,
        candidates: &[C],
    ) -> Option<CoverCluster> {
        let r2 = self.detection_radius * self.detection_radius;
        let nearby: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.position().distance_squared(&position) <= r2)
            .map(|(i, _)| i)
            .collect();

        let needed = squad_size.max(self.min_covers_per_cluster);
        if nearby.len() < needed {
            return None;
        }

        let best = self
            .cluster_subset(candidates, &nearby)
            .into_iter()
            .filter(|c| c.len() >= needed)
            .min_by(|a, b| {
                a.center
                    .distance_squared(&position)
                    .total_cmp(&b.center.distance_squared(&position))
            });

        match &best {
            Some(cluster) => tracing::debug!(
                "best cluster: {} covers ({} free) at {:.1}m",
                cluster.len(),
                cluster.available_count,
                cluster.center.distance(&position)
            ),
            None => tracing::debug!("no cluster with {} covers near squad", needed),
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers(points: &[(f32, f32)]) -> Vec<CoverObject<u32>> {
        points
            .iter()
            .map(|&(x, y)| CoverObject::new(Vec2::new(x, y)))
            .collect()
    }

    #[test]
    fn test_claim_and_free() {
        let mut cover = CoverObject::<u32>::new(Vec2::ZERO);
        assert!(!cover.is_occupied());

        cover.set_occupied(1).unwrap();
        assert_eq!(cover.occupant(), Some(1));
        // same agent again is fine
        cover.set_occupied(1).unwrap();
        assert_eq!(cover.set_occupied(2), Err(CoverError::Occupied));
        assert_eq!(cover.occupant(), Some(1));

        assert!(!cover.release_by(2));
        assert!(cover.release_by(1));
        assert!(!cover.is_occupied());

        cover.set_occupied(2).unwrap();
        cover.set_free();
        assert!(!cover.is_occupied());
    }

    #[test]
    fn test_clusters_partition_input() {
        let detector = ClusterDetector::default();
        let list = covers(&[
            (0.0, 0.0),
            (50.0, 0.0),
            (5.0, 0.0),
            (55.0, 5.0),
            (14.0, 0.0),
            (100.0, 100.0),
        ]);
        let clusters = detector.create_clusters(&list);
        assert_eq!(clusters.len(), 3);

        let mut seen: Vec<usize> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4, 5]);

        // chained through (5, 0): 0 and 14 are linked transitively
        assert_eq!(clusters[0].members, vec![0, 2, 4]);
        assert_eq!(clusters[1].members, vec![1, 3]);
    }

    #[test]
    fn test_cluster_cap() {
        let detector = ClusterDetector {
            max_covers_per_cluster: Some(2),
            ..Default::default()
        };
        let list = covers(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);
        let clusters = detector.create_clusters(&list);
        assert!(clusters.iter().all(|c| c.len() <= 2));
        assert_eq!(clusters.iter().map(|c| c.len()).sum::<usize>(), 5);
    }

    #[test]
    fn test_best_cluster_for_squad() {
        let detector = ClusterDetector::default();
        let mut list = covers(&[
            (10.0, 0.0),
            (11.0, 1.0),
            (12.0, -1.0),
            (10.0, 2.0),
            (11.0, -2.0),
            (13.0, 0.0),
            (200.0, 0.0),
        ]);
        list[0].set_occupied(9).unwrap();

        let best = detector
            .find_best_cluster_for_squad(Vec2::ZERO, 4, &list)
            .unwrap();
        assert!(best.len() >= 4);
        assert_eq!(best.len(), 6);
        assert_eq!(best.available_count, 5);
        assert!(!best.contains(6));
        assert_eq!(best.free_members(&list).len(), 5);
    }

    #[test]
    fn test_best_cluster_none_when_too_small() {
        let detector = ClusterDetector::default();
        let list = covers(&[(5.0, 0.0), (6.0, 0.0), (80.0, 0.0), (81.0, 0.0)]);
        assert!(detector
            .find_best_cluster_for_squad(Vec2::ZERO, 3, &list)
            .is_none());
        assert!(detector
            .find_best_cluster_for_squad(Vec2::ZERO, 1, &[] as &[CoverObject<u32>])
            .is_none());
    }

    #[test]
    fn test_best_cluster_prefers_nearest() {
        let detector = ClusterDetector {
            cluster_radius: 3.0,
            ..Default::default()
        };
        let list = covers(&[(15.0, 0.0), (16.0, 0.0), (-6.0, 0.0), (-7.0, 0.0)]);
        let best = detector
            .find_best_cluster_for_squad(Vec2::ZERO, 2, &list)
            .unwrap();
        assert_eq!(best.members, vec![2, 3]);
    }

    #[test]
    fn test_detector_validation() {
        assert!(ClusterDetector::default().validate().is_ok());
        let bad = ClusterDetector {
            max_covers_per_cluster: Some(2),
            min_covers_per_cluster: 4,
            ..Default::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(TuningError::ClusterBounds { min: 4, max: 2 })
        ));
    }
}
