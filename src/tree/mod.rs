//! The spatial index used for neighbour discovery: a `2^D`-ary tree
//! over an axis-aligned bounding box of the combined particle buffer.
//! Nodes additionally accumulate mass moments, which the neighbour
//! queries ignore; they are kept for a future gravity walker.

mod coordinator;
mod neighbor_search;

use serde::Deserialize;

use crate::config::TWO_TO_NUM_DIMENSIONS;
use crate::error::Error;
use crate::error::Result;
use crate::extent::Extent;
use crate::prelude::Float;
use crate::prelude::MVec;

pub use self::coordinator::TreeCoordinator;
pub use self::neighbor_search::SearchResult;

pub const MAX_DEPTH: usize = 32;

/// Parameters controlling the construction of the tree and the
/// neighbour collector.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TreeParameters {
    /// The maximum depth of the tree. Should be high enough to ensure
    /// that the tree can keep an approximately constant number of
    /// particles per leaf node. Should not be too high in order to
    /// prevent "infinite subdivisions" in edge cases of many
    /// particles at very similar positions.
    pub max_depth: usize,
    /// The maximum number of particles that a leaf will be filled
    /// with before it is subdivided. The maximum can be exceeded if
    /// the leaf node is at max_depth and will therefore not be
    /// subdivided any further.
    pub max_num_particles_per_leaf: usize,
    /// Capacity of the bounded neighbour collector. Queries that hit
    /// the capacity return a truncated neighbour list and set the
    /// truncation flag.
    pub neighbor_list_capacity: usize,
}

impl Default for TreeParameters {
    fn default() -> Self {
        Self {
            max_depth: 20,
            max_num_particles_per_leaf: 30,
            neighbor_list_capacity: 1024,
        }
    }
}

impl TreeParameters {
    pub fn validate(&self) -> Result<()> {
        if self.max_depth > MAX_DEPTH {
            return Err(Error::configuration(format!(
                "tree max_depth must not exceed {}",
                MAX_DEPTH
            )));
        }
        if self.neighbor_list_capacity == 0 {
            return Err(Error::configuration(
                "tree neighbor_list_capacity must be positive",
            ));
        }
        Ok(())
    }
}

/// The per-particle payload stored in the leaves: the index of the
/// particle in the combined search buffer and its position.
#[derive(Clone, Debug)]
pub struct LeafData {
    pub id: usize,
    pub pos: MVec,
    pub mass: Float,
}

/// Monopole mass moments of a node, reserved for gravity.
#[derive(Clone, Debug, Default)]
pub struct MassMoments {
    total: Float,
    weighted_position_sum: MVec,
}

impl MassMoments {
    pub fn add_mass_at(&mut self, pos: &MVec, mass: Float) {
        self.total += mass;
        self.weighted_position_sum += *pos * mass;
    }

    pub fn total(&self) -> Float {
        self.total
    }

    pub fn center_of_mass(&self) -> MVec {
        if self.total == 0.0 {
            return MVec::ZERO;
        }
        self.weighted_position_sum / self.total
    }
}

type Children = Box<[BhTree; TWO_TO_NUM_DIMENSIONS]>;
type Leaf = Vec<LeafData>;

#[derive(Debug)]
pub enum Node {
    Tree(Children),
    Leaf(Leaf),
}

impl Node {
    fn make_node(&mut self, children: Children) -> Leaf {
        let value = std::mem::replace(self, Node::Tree(children));
        if let Self::Leaf(leaf) = value {
            leaf
        } else {
            panic!("make_node called on Node value")
        }
    }
}

#[derive(Debug)]
pub struct BhTree {
    pub node: Node,
    pub data: MassMoments,
    pub extent: Extent,
}

impl BhTree {
    pub fn new(parameters: &TreeParameters, particles: Vec<LeafData>, extent: &Extent) -> Self {
        let mut tree = Self::make_empty_leaf_from_extent(extent.clone());
        for particle in particles.into_iter() {
            tree.insert_new(parameters, particle, 0);
        }
        tree
    }

    fn insert_new(&mut self, parameters: &TreeParameters, leaf_data: LeafData, depth: usize) {
        self.data.add_mass_at(&leaf_data.pos, leaf_data.mass);
        self.insert(parameters, leaf_data, depth)
    }

    fn insert(&mut self, parameters: &TreeParameters, leaf_data: LeafData, depth: usize) {
        if let Node::Leaf(ref mut leaf) = self.node {
            if depth < parameters.max_depth && leaf.len() > parameters.max_num_particles_per_leaf {
                self.subdivide(parameters, depth);
            } else {
                leaf.push(leaf_data);
                return;
            }
        }
        if let Node::Tree(ref mut children) = self.node {
            let quadrant = &mut children[self.extent.get_subdivision_index(&leaf_data.pos)];
            quadrant.insert_new(parameters, leaf_data, depth + 1);
        }
    }

    fn subdivide(&mut self, parameters: &TreeParameters, depth: usize) {
        debug_assert!(matches!(self.node, Node::Leaf(_)));
        let subdivisions = self.extent.get_subdivisions();
        let children = Box::new(subdivisions.map(Self::make_empty_leaf_from_extent));
        let particles = self.node.make_node(children);
        for particle in particles.into_iter() {
            self.insert(parameters, particle, depth);
        }
    }

    pub fn make_empty_leaf_from_extent(extent: Extent) -> Self {
        Self {
            node: Node::Leaf(vec![]),
            data: MassMoments::default(),
            extent,
        }
    }

    pub fn depth_first_map_leaf<'a>(
        &'a self,
        closure: &mut impl FnMut(&'a Extent, &'a [LeafData]),
    ) {
        match self.node {
            Node::Tree(ref node) => {
                for child in node.iter() {
                    child.depth_first_map_leaf(closure);
                }
            }
            Node::Leaf(ref leaf) => {
                closure(&self.extent, leaf);
            }
        }
    }
}
