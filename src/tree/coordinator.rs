use log::debug;

use super::BhTree;
use super::LeafData;
use super::TreeParameters;
use crate::error::Error;
use crate::error::Result;
use crate::extent::Extent;
use crate::particle::Particle;

/// Headroom added whenever the combined buffer has to grow, so that
/// step-to-step fluctuations of the ghost count do not reallocate the
/// buffer while tree indices reference it.
pub const CAPACITY_RESERVE: usize = 100;

/// Owns the combined search buffer `[reals || ghosts]` and the tree
/// built over it. The buffer is the only particle storage the
/// neighbour queries and force loops read from; it is rewritten here
/// and nowhere else.
pub struct TreeCoordinator {
    parameters: TreeParameters,
    buffer: Vec<Particle>,
    num_real: usize,
    tree: Option<BhTree>,
}

impl TreeCoordinator {
    pub fn new(parameters: TreeParameters) -> Self {
        Self {
            parameters,
            buffer: vec![],
            num_real: 0,
            tree: None,
        }
    }

    pub fn parameters(&self) -> &TreeParameters {
        &self.parameters
    }

    /// Re-synchronize the combined buffer from the current reals and
    /// ghosts and rebuild the tree over it. Must run before any
    /// neighbour query once real particles have moved or ghosts have
    /// been regenerated.
    pub fn rebuild_tree_for_neighbor_search(
        &mut self,
        reals: &[Particle],
        ghosts: &[Particle],
    ) -> Result<()> {
        self.resync_buffer(reals, ghosts)?;
        let extent = Extent::from_positions(self.buffer.iter().map(|p| &p.pos))
            .ok_or_else(|| Error::invariant("tree", "cannot build a tree without particles"))?
            .pad();
        let leaves: Vec<_> = self
            .buffer
            .iter()
            .map(|p| LeafData {
                id: p.id,
                pos: p.pos,
                mass: p.mass,
            })
            .collect();
        self.tree = Some(BhTree::new(&self.parameters, leaves, &extent));
        debug!(
            "rebuilt neighbour search tree over {} particles ({} ghosts)",
            self.buffer.len(),
            ghosts.len()
        );
        Ok(())
    }

    /// Copy the current particle state into the combined buffer
    /// without rebuilding the tree. Only valid while positions are
    /// unchanged since the last rebuild; used to propagate the results
    /// of the density and gradient passes to the force loops.
    pub fn sync_properties(&mut self, reals: &[Particle], ghosts: &[Particle]) -> Result<()> {
        if reals.len() + ghosts.len() != self.buffer.len() || reals.len() != self.num_real {
            return Err(Error::invariant(
                "tree coordinator",
                format!(
                    "particle counts changed between rebuild and property sync \
                     ({} + {} vs {})",
                    reals.len(),
                    ghosts.len(),
                    self.buffer.len()
                ),
            ));
        }
        self.resync_buffer(reals, ghosts)
    }

    fn resync_buffer(&mut self, reals: &[Particle], ghosts: &[Particle]) -> Result<()> {
        for (i, particle) in reals.iter().enumerate() {
            if particle.id != i {
                return Err(Error::invariant(
                    "tree coordinator",
                    format!("real particle at index {} carries id {}", i, particle.id),
                ));
            }
        }
        let num_total = reals.len() + ghosts.len();
        self.buffer.clear();
        if self.buffer.capacity() < num_total {
            self.buffer.reserve(num_total + CAPACITY_RESERVE);
        }
        self.buffer.extend_from_slice(reals);
        self.buffer.extend_from_slice(ghosts);
        self.num_real = reals.len();
        for (i, particle) in self.buffer.iter_mut().enumerate() {
            particle.id = i;
            particle.is_ghost = i >= reals.len();
        }
        Ok(())
    }

    /// The combined search buffer. Indices returned by neighbour
    /// queries address this slice.
    pub fn particles(&self) -> &[Particle] {
        &self.buffer
    }

    pub fn num_real(&self) -> usize {
        self.num_real
    }

    pub fn get_search_particle_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn tree(&self) -> Result<&BhTree> {
        self.tree
            .as_ref()
            .ok_or_else(|| Error::invariant("tree coordinator", "tree queried before first build"))
    }
}
