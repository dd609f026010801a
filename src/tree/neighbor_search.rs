use ordered_float::OrderedFloat;

use super::BhTree;
use super::Node;
use crate::config::NUM_DIMENSIONS;
use crate::prelude::Float;
use crate::prelude::MVec;
use crate::simulation_box::SimulationBox;

/// The outcome of a bounded neighbour query. `indices` point into the
/// combined search buffer and are sorted by distance from the query
/// position, nearest first, which stabilizes the floating-point
/// reductions of the force loops.
#[derive(Debug)]
pub struct SearchResult {
    pub indices: Vec<usize>,
    /// Whether the collector capacity was reached. The query still
    /// returns the nearest candidates encountered up to that point.
    pub truncated: bool,
    /// Number of leaf particles whose distance was evaluated.
    pub candidates_considered: usize,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// All returned indices must address the combined buffer.
    pub fn is_valid(&self, num_particles: usize) -> bool {
        self.indices.iter().all(|index| *index < num_particles)
    }
}

/// Collects neighbour candidates up to a fixed capacity. The capacity
/// bound is structural: `try_add` refuses further entries once full
/// and the tree walk short-circuits on `is_full`.
struct NeighborCollector {
    entries: Vec<(OrderedFloat<Float>, usize)>,
    capacity: usize,
    truncated: bool,
    candidates_considered: usize,
}

impl NeighborCollector {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            truncated: false,
            candidates_considered: 0,
        }
    }

    fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    fn try_add(&mut self, index: usize, distance_squared: Float) -> bool {
        if self.is_full() {
            self.truncated = true;
            return false;
        }
        self.entries.push((OrderedFloat(distance_squared), index));
        true
    }

    fn into_result(mut self) -> SearchResult {
        self.entries.sort_unstable();
        SearchResult {
            indices: self.entries.into_iter().map(|(_, index)| index).collect(),
            truncated: self.truncated,
            candidates_considered: self.candidates_considered,
        }
    }
}

/// Returns whether the two bounding boxes given by the center
/// coordinates pos1 and pos2 and the side lengths size1 and size2
/// overlap under the minimum-image convention of the box.
fn bounding_boxes_overlap_periodic(
    box_: &SimulationBox,
    pos1: &MVec,
    size1: &MVec,
    pos2: &MVec,
    size2: &MVec,
) -> bool {
    let dist = box_.periodic_distance_vec(pos1, pos2);
    let total_size = *size1 + *size2;
    (0..NUM_DIMENSIONS).all(|d| dist[d].abs() <= total_size[d])
}

impl BhTree {
    /// Collect the indices of all particles within `radius` of `pos`,
    /// bounded by `capacity`.
    pub fn search_neighbors(
        &self,
        box_: &SimulationBox,
        pos: MVec,
        radius: Float,
        capacity: usize,
    ) -> SearchResult {
        let mut collector = NeighborCollector::with_capacity(capacity);
        self.collect_in_radius(box_, pos, radius, &mut collector);
        collector.into_result()
    }

    fn collect_in_radius(
        &self,
        box_: &SimulationBox,
        pos: MVec,
        radius: Float,
        collector: &mut NeighborCollector,
    ) {
        if collector.is_full() {
            collector.truncated = true;
            return;
        }
        if !bounding_boxes_overlap_periodic(
            box_,
            &self.extent.center,
            &self.extent.side_lengths(),
            &pos,
            &MVec::splat(radius),
        ) {
            return;
        }
        match self.node {
            Node::Tree(ref children) => {
                for child in children.iter() {
                    child.collect_in_radius(box_, pos, radius, collector);
                }
            }
            Node::Leaf(ref leaf) => {
                let radius_squared = radius * radius;
                for particle in leaf.iter() {
                    collector.candidates_considered += 1;
                    let distance_squared = box_.periodic_distance_squared(&pos, &particle.pos);
                    if distance_squared < radius_squared {
                        if !collector.try_add(particle.id, distance_squared) {
                            return;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;

    use super::super::BhTree;
    use super::super::LeafData;
    use super::super::TreeParameters;
    use crate::config::NUM_DIMENSIONS;
    use crate::extent::Extent;
    use crate::prelude::Float;
    use crate::prelude::MVec;
    use crate::simulation_box::SimulationBox;

    fn direct_neighbour_search<'a>(
        box_: &SimulationBox,
        particles: &'a [LeafData],
        pos: &MVec,
        radius: Float,
    ) -> Vec<&'a LeafData> {
        particles
            .iter()
            .filter(|particle| box_.periodic_distance(pos, &particle.pos) < radius)
            .collect()
    }

    fn random_cloud(rng: &mut StdRng, n: usize, side_length: Float) -> Vec<LeafData> {
        (0..n)
            .map(|id| {
                let mut pos = MVec::ZERO;
                for d in 0..NUM_DIMENSIONS {
                    pos[d] = rng.gen_range(0.0..side_length);
                }
                LeafData {
                    id,
                    pos,
                    mass: 1.0,
                }
            })
            .collect()
    }

    fn build_tree(particles: &[LeafData]) -> BhTree {
        let extent = Extent::from_positions(particles.iter().map(|p| &p.pos))
            .unwrap()
            .pad();
        BhTree::new(&TreeParameters::default(), particles.to_vec(), &extent)
    }

    #[test]
    fn radius_search_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(17);
        let side_length = 1.0;
        let particles = random_cloud(&mut rng, 300, side_length);
        let tree = build_tree(&particles);
        // Make the box much larger than the cloud so nothing wraps.
        let box_ = SimulationBox::cube_from_side_length(10.0 * side_length);
        let radius = 0.2;
        for particle in particles.iter() {
            let result = tree.search_neighbors(&box_, particle.pos, radius, particles.len());
            assert!(!result.truncated);
            assert!(result.is_valid(particles.len()));
            let tree_ids: HashSet<_> = result.indices.iter().copied().collect();
            let direct_ids: HashSet<_> =
                direct_neighbour_search(&box_, &particles, &particle.pos, radius)
                    .into_iter()
                    .map(|p| p.id)
                    .collect();
            assert_eq!(tree_ids, direct_ids);
        }
    }

    #[test]
    fn radius_search_matches_brute_force_under_wrapping() {
        let mut rng = StdRng::seed_from_u64(18);
        let side_length = 1.0;
        let particles = random_cloud(&mut rng, 200, side_length);
        let tree = build_tree(&particles);
        let box_ = SimulationBox::cube_from_side_length(side_length);
        let radius = 0.15;
        for particle in particles.iter() {
            let result = tree.search_neighbors(&box_, particle.pos, radius, particles.len());
            let tree_ids: HashSet<_> = result.indices.iter().copied().collect();
            let direct_ids: HashSet<_> =
                direct_neighbour_search(&box_, &particles, &particle.pos, radius)
                    .into_iter()
                    .map(|p| p.id)
                    .collect();
            assert_eq!(tree_ids, direct_ids);
        }
    }

    #[test]
    fn results_are_sorted_by_distance() {
        let mut rng = StdRng::seed_from_u64(19);
        let particles = random_cloud(&mut rng, 100, 1.0);
        let tree = build_tree(&particles);
        let box_ = SimulationBox::cube_from_side_length(10.0);
        let pos = particles[0].pos;
        let result = tree.search_neighbors(&box_, pos, 0.5, particles.len());
        let distances: Vec<_> = result
            .indices
            .iter()
            .map(|i| box_.periodic_distance(&pos, &particles[*i].pos))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
        // The query position itself is always the nearest entry.
        assert_eq!(result.indices[0], particles[0].id);
    }

    #[test]
    fn collector_capacity_bounds_the_result() {
        let mut rng = StdRng::seed_from_u64(20);
        let particles = random_cloud(&mut rng, 100, 0.1);
        let tree = build_tree(&particles);
        let box_ = SimulationBox::cube_from_side_length(10.0);
        let capacity = 7;
        let result = tree.search_neighbors(&box_, particles[0].pos, 1.0, capacity);
        assert!(result.truncated);
        assert_eq!(result.len(), capacity);
        assert!(result.is_valid(particles.len()));
    }
}
