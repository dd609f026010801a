use derive_more::Deref;

use crate::config::NUM_DIMENSIONS;
use crate::extent::Extent;
use crate::prelude::Float;
use crate::prelude::MVec;

/// The spatial domain of the simulation together with the per-axis
/// periodicity flags. All distance computations in neighbour searches
/// and force loops go through the minimum-image methods of this type;
/// on non-periodic axes they reduce to plain differences.
#[derive(Clone, Debug, Deref)]
pub struct SimulationBox {
    #[deref]
    extent: Extent,
    periodic: [bool; NUM_DIMENSIONS],
}

fn periodic_wrap_component(v: Float, min: Float, max: Float) -> Float {
    (v - min).rem_euclid(max - min) + min
}

/// Reduce a separation component to `(-length / 2, length / 2]`.
fn minimize_component(v: Float, length: Float) -> Float {
    if v < 0.0 {
        if v.abs() < (v + length).abs() {
            v
        } else {
            v + length
        }
    } else if v.abs() < (v - length).abs() {
        v
    } else {
        v - length
    }
}

impl SimulationBox {
    pub fn new(extent: Extent, periodic: [bool; NUM_DIMENSIONS]) -> Self {
        Self { extent, periodic }
    }

    pub fn fully_periodic(extent: Extent) -> Self {
        Self::new(extent, [true; NUM_DIMENSIONS])
    }

    pub fn open(extent: Extent) -> Self {
        Self::new(extent, [false; NUM_DIMENSIONS])
    }

    pub fn cube_from_side_length(side_length: Float) -> Self {
        Self::fully_periodic(Extent::cube_from_side_length(side_length))
    }

    pub fn is_periodic(&self, axis: usize) -> bool {
        self.periodic[axis]
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    /// Wrap a position back into the box along all periodic axes.
    pub fn periodic_wrap(&self, mut pos: MVec) -> MVec {
        for d in 0..NUM_DIMENSIONS {
            if self.periodic[d] {
                pos[d] = periodic_wrap_component(pos[d], self.extent.min[d], self.extent.max[d]);
            }
        }
        pos
    }

    /// The minimum-image separation `p1 - p2`.
    pub fn periodic_distance_vec(&self, p1: &MVec, p2: &MVec) -> MVec {
        let mut dist = *p1 - *p2;
        let side_lengths = self.extent.side_lengths();
        for d in 0..NUM_DIMENSIONS {
            if self.periodic[d] {
                dist[d] = minimize_component(dist[d], side_lengths[d]);
            }
        }
        dist
    }

    pub fn periodic_distance(&self, p1: &MVec, p2: &MVec) -> Float {
        self.periodic_distance_vec(p1, p2).length()
    }

    pub fn periodic_distance_squared(&self, p1: &MVec, p2: &MVec) -> Float {
        self.periodic_distance_vec(p1, p2).length_squared()
    }
}
