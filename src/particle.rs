use crate::config::NUM_DIMENSIONS;
use crate::prelude::Float;
use crate::prelude::MVec;

/// The full per-particle state. Real particles are the authoritative
/// state of the simulation; ghost copies of them are regenerated every
/// step by the boundary handling and carry `is_ghost = true`.
///
/// `id` always equals the index of the particle in the combined search
/// buffer: real particles occupy `[0, n_real)`, ghosts `[n_real,
/// n_total)`.
#[derive(Clone, Debug)]
pub struct Particle {
    pub id: usize,
    pub pos: MVec,
    pub vel: MVec,
    /// Mid-step velocity of the leapfrog predictor.
    pub vel_half: MVec,
    pub acc: MVec,
    pub mass: Float,
    pub dens: Float,
    pub pres: Float,
    /// Kernel-smoothed pressure, the volume element of the
    /// density-independent formulation.
    pub pres_smoothed: Float,
    /// Specific internal energy.
    pub ene: Float,
    pub dt_ene: Float,
    pub sound: Float,
    /// Smoothing length.
    pub sml: Float,
    /// Grad-h correction factor from the smoothing length iteration.
    pub gradh: Float,
    pub div_v: Float,
    /// Balsara shear limiter, in `[0, 1]`.
    pub balsara: Float,
    /// Per-particle viscosity amplitude (time-dependent viscosity).
    pub alpha: Float,
    /// Number of real neighbours found in the last search.
    pub neighbor: usize,
    pub is_ghost: bool,
    pub grad_dens: MVec,
    pub grad_pres: MVec,
    /// `grad_vel[k]` is the spatial gradient of the k-th velocity
    /// component.
    pub grad_vel: [MVec; NUM_DIMENSIONS],
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            id: 0,
            pos: MVec::ZERO,
            vel: MVec::ZERO,
            vel_half: MVec::ZERO,
            acc: MVec::ZERO,
            mass: 0.0,
            dens: 0.0,
            pres: 0.0,
            pres_smoothed: 0.0,
            ene: 0.0,
            dt_ene: 0.0,
            sound: 0.0,
            sml: 0.0,
            gradh: 1.0,
            div_v: 0.0,
            balsara: 1.0,
            alpha: 0.0,
            neighbor: 0,
            is_ghost: false,
            grad_dens: MVec::ZERO,
            grad_pres: MVec::ZERO,
            grad_vel: [MVec::ZERO; NUM_DIMENSIONS],
        }
    }
}

impl Particle {
    pub fn kinetic_energy(&self) -> Float {
        0.5 * self.mass * self.vel.length_squared()
    }

    pub fn thermal_energy(&self) -> Float {
        self.mass * self.ene
    }

    pub fn momentum(&self) -> MVec {
        self.vel * self.mass
    }
}
