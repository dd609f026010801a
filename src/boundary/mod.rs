//! Boundary handling via ghost particles.
//!
//! Ghosts are phantom copies of real particles emitted near enabled
//! boundary faces so that kernel sums near the domain edge see full
//! support. They are regenerated from scratch every step after the
//! predictor has moved the real particles and are never integrated.

use serde::Deserialize;

use crate::config::NUM_DIMENSIONS;
use crate::error::Error;
use crate::error::Result;
use crate::extent::Extent;
use crate::parameters::default_true;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::prelude::MVec;
use crate::simulation_box::SimulationBox;

/// Tolerance of the face-distance comparison. A particle whose
/// distance to a face is numerically equal to the kernel support must
/// still emit a ghost; losing it under- or overestimates the density
/// at the boundary.
pub const BOUNDARY_EPS: Float = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    None,
    Periodic,
    Mirror,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMode {
    #[default]
    NoSlip,
    FreeSlip,
}

/// Boundary configuration of a single axis. `spacing_lower` and
/// `spacing_upper` shift the mirror plane half a particle spacing
/// beyond the domain edge, which keeps mirror ghosts of an on-node
/// lattice from coinciding with their sources.
#[derive(Clone, Debug, Deserialize)]
pub struct AxisBoundary {
    #[serde(rename = "type")]
    pub kind: BoundaryType,
    pub lo: Float,
    pub hi: Float,
    #[serde(default)]
    pub mirror_mode: MirrorMode,
    #[serde(default = "default_true")]
    pub enable_lower: bool,
    #[serde(default = "default_true")]
    pub enable_upper: bool,
    #[serde(default)]
    pub spacing_lower: Float,
    #[serde(default)]
    pub spacing_upper: Float,
}

impl AxisBoundary {
    fn wall_lower(&self) -> Float {
        self.lo - 0.5 * self.spacing_lower
    }

    fn wall_upper(&self) -> Float {
        self.hi + 0.5 * self.spacing_upper
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BoundaryParameters {
    pub axes: Vec<AxisBoundary>,
    /// Abort when a real particle leaves the domain through a
    /// non-periodic face instead of logging and continuing.
    #[serde(default)]
    pub strict: bool,
}

impl BoundaryParameters {
    pub fn validate(&self) -> Result<()> {
        if self.axes.len() != NUM_DIMENSIONS {
            return Err(Error::configuration(format!(
                "expected {} boundary axes, got {}",
                NUM_DIMENSIONS,
                self.axes.len()
            )));
        }
        for (d, axis) in self.axes.iter().enumerate() {
            if axis.lo >= axis.hi {
                return Err(Error::configuration(format!(
                    "boundary axis {}: lo must be below hi",
                    d
                )));
            }
            if axis.spacing_lower < 0.0 || axis.spacing_upper < 0.0 {
                return Err(Error::configuration(format!(
                    "boundary axis {}: spacings must be non-negative",
                    d
                )));
            }
        }
        Ok(())
    }

    pub fn simulation_box(&self) -> SimulationBox {
        let mut min = MVec::ZERO;
        let mut max = MVec::ZERO;
        let mut periodic = [false; NUM_DIMENSIONS];
        for (d, axis) in self.axes.iter().enumerate() {
            min[d] = axis.lo;
            max[d] = axis.hi;
            periodic[d] = axis.kind == BoundaryType::Periodic;
        }
        SimulationBox::new(Extent::new(min, max), periodic)
    }

    pub fn has_boundaries(&self) -> bool {
        self.axes.iter().any(|axis| axis.kind != BoundaryType::None)
    }
}

/// The componentwise affine map taking a real particle to one of its
/// images: `pos' = scale * pos + offset` with `scale` in `{-1, 1}`
/// per axis. Velocities transform with their own sign vector since
/// no-slip mirrors flip all components while the position only
/// reflects along the wall normal.
#[derive(Clone, Copy, Debug)]
struct ImageTransform {
    scale: MVec,
    offset: MVec,
    vel_sign: MVec,
}

impl ImageTransform {
    fn identity() -> Self {
        Self {
            scale: MVec::ONE,
            offset: MVec::ZERO,
            vel_sign: MVec::ONE,
        }
    }

    fn translated(mut self, axis: usize, shift: Float) -> Self {
        self.offset[axis] += shift;
        self
    }

    fn reflected(mut self, axis: usize, wall: Float, mode: MirrorMode) -> Self {
        self.scale[axis] = -self.scale[axis];
        self.offset[axis] = 2.0 * wall - self.offset[axis];
        match mode {
            MirrorMode::NoSlip => self.vel_sign = -self.vel_sign,
            MirrorMode::FreeSlip => self.vel_sign[axis] = -self.vel_sign[axis],
        }
        self
    }

    fn apply_pos(&self, pos: MVec) -> MVec {
        self.scale * pos + self.offset
    }

    fn apply_vel(&self, vel: MVec) -> MVec {
        self.vel_sign * vel
    }

    fn apply_scalar_gradient(&self, gradient: MVec) -> MVec {
        self.scale * gradient
    }

    fn apply_velocity_gradient(&self, gradient: &[MVec; NUM_DIMENSIONS]) -> [MVec; NUM_DIMENSIONS] {
        let mut out = *gradient;
        for k in 0..NUM_DIMENSIONS {
            out[k] = self.scale * out[k] * self.vel_sign[k];
        }
        out
    }
}

pub struct GhostManager {
    parameters: BoundaryParameters,
    support_radius: Float,
    ghosts: Vec<Particle>,
    images: Vec<(usize, ImageTransform)>,
}

impl GhostManager {
    pub fn new(parameters: BoundaryParameters) -> Result<Self> {
        parameters.validate()?;
        Ok(Self {
            parameters,
            support_radius: 0.0,
            ghosts: vec![],
            images: vec![],
        })
    }

    /// Set the search radius within which particles spawn ghosts.
    /// Callers pass the kernel support of the largest current
    /// smoothing length.
    pub fn set_kernel_support(&mut self, radius: Float) {
        self.support_radius = radius;
    }

    pub fn ghosts(&self) -> &[Particle] {
        &self.ghosts
    }

    pub fn len(&self) -> usize {
        self.ghosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ghosts.is_empty()
    }

    fn near_lower(&self, axis: &AxisBoundary, pos: Float) -> bool {
        pos - axis.lo <= self.support_radius + BOUNDARY_EPS
    }

    fn near_upper(&self, axis: &AxisBoundary, pos: Float) -> bool {
        axis.hi - pos <= self.support_radius + BOUNDARY_EPS
    }

    /// Clear all ghosts and emit fresh ones for every real particle
    /// within the kernel support of an enabled boundary face. Corner
    /// particles emit every combination of their per-axis images.
    pub fn regenerate(&mut self, reals: &[Particle]) {
        self.ghosts.clear();
        self.images.clear();
        if !self.parameters.has_boundaries() {
            return;
        }
        let n_real = reals.len();
        let mut transforms: Vec<ImageTransform> = Vec::with_capacity(TRANSFORM_GUESS);
        for (source, particle) in reals.iter().enumerate() {
            transforms.clear();
            transforms.push(ImageTransform::identity());
            for (d, axis) in self.parameters.axes.iter().enumerate() {
                let existing = transforms.len();
                match axis.kind {
                    BoundaryType::None => {}
                    BoundaryType::Periodic => {
                        let length = axis.hi - axis.lo;
                        if self.near_lower(axis, particle.pos[d]) {
                            for i in 0..existing {
                                transforms.push(transforms[i].translated(d, length));
                            }
                        }
                        if self.near_upper(axis, particle.pos[d]) {
                            for i in 0..existing {
                                transforms.push(transforms[i].translated(d, -length));
                            }
                        }
                    }
                    BoundaryType::Mirror => {
                        if axis.enable_lower && self.near_lower(axis, particle.pos[d]) {
                            let wall = axis.wall_lower();
                            for i in 0..existing {
                                transforms.push(transforms[i].reflected(
                                    d,
                                    wall,
                                    axis.mirror_mode,
                                ));
                            }
                        }
                        if axis.enable_upper && self.near_upper(axis, particle.pos[d]) {
                            let wall = axis.wall_upper();
                            for i in 0..existing {
                                transforms.push(transforms[i].reflected(
                                    d,
                                    wall,
                                    axis.mirror_mode,
                                ));
                            }
                        }
                    }
                }
            }
            // The first entry is the identity, i.e. the particle itself.
            for transform in transforms[1..].iter() {
                let id = n_real + self.ghosts.len();
                self.ghosts.push(make_ghost(particle, transform, id));
                self.images.push((source, *transform));
            }
        }
    }

    /// Refresh the derived fields of the existing ghosts from their
    /// source particles without moving them. Used after the density
    /// and gradient passes, which update the reals between tree
    /// rebuilds.
    pub fn sync_properties(&mut self, reals: &[Particle]) {
        for (ghost, (source, transform)) in self.ghosts.iter_mut().zip(self.images.iter()) {
            let source = &reals[*source];
            ghost.vel = transform.apply_vel(source.vel);
            ghost.vel_half = transform.apply_vel(source.vel_half);
            ghost.mass = source.mass;
            ghost.dens = source.dens;
            ghost.pres = source.pres;
            ghost.pres_smoothed = source.pres_smoothed;
            ghost.ene = source.ene;
            ghost.sound = source.sound;
            ghost.sml = source.sml;
            ghost.gradh = source.gradh;
            ghost.div_v = source.div_v;
            ghost.balsara = source.balsara;
            ghost.alpha = source.alpha;
            ghost.grad_dens = transform.apply_scalar_gradient(source.grad_dens);
            ghost.grad_pres = transform.apply_scalar_gradient(source.grad_pres);
            ghost.grad_vel = transform.apply_velocity_gradient(&source.grad_vel);
        }
    }
}

/// Pre-allocation guess for the per-particle image list.
const TRANSFORM_GUESS: usize = crate::config::TWO_TO_NUM_DIMENSIONS + 1;

fn make_ghost(source: &Particle, transform: &ImageTransform, id: usize) -> Particle {
    let mut ghost = source.clone();
    ghost.id = id;
    ghost.is_ghost = true;
    ghost.pos = transform.apply_pos(source.pos);
    ghost.vel = transform.apply_vel(source.vel);
    ghost.vel_half = transform.apply_vel(source.vel_half);
    ghost.acc = MVec::ZERO;
    ghost.dt_ene = 0.0;
    ghost.neighbor = 0;
    ghost.grad_dens = transform.apply_scalar_gradient(source.grad_dens);
    ghost.grad_pres = transform.apply_scalar_gradient(source.grad_pres);
    ghost.grad_vel = transform.apply_velocity_gradient(&source.grad_vel);
    ghost
}

#[cfg(test)]
mod tests {
    use super::AxisBoundary;
    use super::BoundaryParameters;
    use super::BoundaryType;
    use super::GhostManager;
    use super::MirrorMode;
    use crate::config::NUM_DIMENSIONS;
    use crate::particle::Particle;
    use crate::prelude::MVec;
    use crate::test_utils::assert_float_is_close;

    fn axis(kind: BoundaryType, lo: f64, hi: f64) -> AxisBoundary {
        AxisBoundary {
            kind,
            lo,
            hi,
            mirror_mode: MirrorMode::NoSlip,
            enable_lower: true,
            enable_upper: true,
            spacing_lower: 0.0,
            spacing_upper: 0.0,
        }
    }

    fn manager(kind: BoundaryType, lo: f64, hi: f64, support: f64) -> GhostManager {
        let parameters = BoundaryParameters {
            axes: (0..NUM_DIMENSIONS).map(|_| axis(kind, lo, hi)).collect(),
            strict: false,
        };
        let mut manager = GhostManager::new(parameters).unwrap();
        manager.set_kernel_support(support);
        manager
    }

    fn particle_at(pos: MVec, vel: MVec) -> Particle {
        Particle {
            pos,
            vel,
            mass: 1.0,
            dens: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn interior_particle_generates_no_ghosts() {
        let mut manager = manager(BoundaryType::Periodic, -0.5, 1.5, 0.04);
        let reals = vec![particle_at(MVec::splat(0.5), MVec::ZERO)];
        manager.regenerate(&reals);
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn face_particle_generates_one_ghost_per_enabled_face() {
        // A particle numerically at the support distance from the
        // upper face must still qualify.
        let support = 0.04;
        let mut manager = manager(BoundaryType::Periodic, -0.5, 1.5, support);
        let reals = vec![particle_at(
            MVec::splat(1.5 - support),
            MVec::splat(0.3),
        )];
        manager.regenerate(&reals);
        // One periodic image per axis plus the corner combinations.
        let expected = (1usize << NUM_DIMENSIONS) - 1;
        assert_eq!(manager.len(), expected);
        let ghost = &manager.ghosts()[0];
        assert!(ghost.is_ghost);
        assert_eq!(ghost.id, reals.len());
        assert_float_is_close(ghost.pos[0], -0.5 - support);
        // Periodic images preserve the velocity exactly.
        for d in 0..NUM_DIMENSIONS {
            assert_eq!(ghost.vel[d], 0.3);
        }
    }

    #[test]
    fn mirror_no_slip_reflects_all_velocity_components() {
        let mut manager = manager(BoundaryType::Mirror, 0.0, 1.0, 0.1);
        let mut vel = MVec::ZERO;
        for d in 0..NUM_DIMENSIONS {
            vel[d] = (d + 1) as f64;
        }
        let mut pos = MVec::splat(0.5);
        pos[0] = 0.05;
        let reals = vec![particle_at(pos, vel)];
        manager.regenerate(&reals);
        assert_eq!(manager.len(), 1);
        let ghost = &manager.ghosts()[0];
        assert_float_is_close(ghost.pos[0], -0.05);
        for d in 0..NUM_DIMENSIONS {
            assert_eq!(ghost.vel[d], -vel[d]);
        }
    }

    #[test]
    fn mirror_free_slip_reflects_only_the_normal_component() {
        let mut manager = manager(BoundaryType::Mirror, 0.0, 1.0, 0.1);
        for axis in 0..NUM_DIMENSIONS {
            for a in manager.parameters.axes.iter_mut() {
                a.mirror_mode = MirrorMode::FreeSlip;
            }
            let mut vel = MVec::ZERO;
            for d in 0..NUM_DIMENSIONS {
                vel[d] = (d + 1) as f64;
            }
            let mut pos = MVec::splat(0.5);
            pos[axis] = 0.95;
            let reals = vec![particle_at(pos, vel)];
            manager.regenerate(&reals);
            assert_eq!(manager.len(), 1);
            let ghost = &manager.ghosts()[0];
            assert_float_is_close(ghost.pos[axis], 1.05);
            for d in 0..NUM_DIMENSIONS {
                if d == axis {
                    assert_eq!(ghost.vel[d], -vel[d]);
                } else {
                    assert_eq!(ghost.vel[d], vel[d]);
                }
            }
        }
    }

    #[test]
    fn sync_properties_follows_the_source() {
        let mut manager = manager(BoundaryType::Periodic, 0.0, 1.0, 0.1);
        let mut reals = vec![particle_at(MVec::splat(0.05), MVec::ZERO)];
        manager.regenerate(&reals);
        assert!(manager.len() > 0);
        reals[0].dens = 3.5;
        reals[0].pres = 0.7;
        manager.sync_properties(&reals);
        for ghost in manager.ghosts() {
            assert_eq!(ghost.dens, 3.5);
            assert_eq!(ghost.pres, 0.7);
        }
    }

    #[cfg(feature = "2d")]
    #[test]
    fn corner_particle_emits_all_combinations() {
        let mut manager = manager(BoundaryType::Periodic, 0.0, 1.0, 0.1);
        let reals = vec![particle_at(MVec::new(0.05, 0.95), MVec::ZERO)];
        manager.regenerate(&reals);
        // x-image, y-image and the diagonal corner image.
        assert_eq!(manager.len(), 3);
        let mut positions: Vec<_> = manager
            .ghosts()
            .iter()
            .map(|g| (g.pos.x, g.pos.y))
            .collect();
        positions.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(positions[0], (0.05, -0.05));
        assert_eq!(positions[1], (1.05, -0.05));
        assert_eq!(positions[2], (1.05, 0.95));
    }
}
