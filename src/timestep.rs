use serde::Deserialize;

use crate::particle::Particle;
use crate::prelude::Float;

/// CFL coefficients of the two timestep criteria.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CflParameters {
    /// Courant factor of the sound crossing criterion
    /// `dt = sound * h / (c + |v|)`.
    pub sound: Float,
    /// Factor of the acceleration criterion
    /// `dt = force * sqrt(h / |a|)`.
    pub force: Float,
}

impl Default for CflParameters {
    fn default() -> Self {
        Self {
            sound: 0.3,
            force: 0.25,
        }
    }
}

/// The global timestep: the tightest of the per-particle sound
/// crossing and acceleration criteria.
pub fn compute_timestep(reals: &[Particle], cfl: &CflParameters) -> Float {
    let mut dt = Float::INFINITY;
    for particle in reals.iter() {
        let signal = particle.sound + particle.vel.length();
        if signal > 0.0 {
            dt = dt.min(cfl.sound * particle.sml / signal);
        }
        let acc = particle.acc.length();
        if acc > 0.0 {
            dt = dt.min(cfl.force * (particle.sml / acc).sqrt());
        }
    }
    dt
}
