use crate::parameters::ViscosityParameters;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::prelude::MVec;

/// Decay timescale factor of the time-dependent viscosity amplitude,
/// Morris & Monaghan 1997.
const DECAY_FACTOR: Float = 0.2;

/// Floor of the Balsara denominator, in units of `c / h`.
const BALSARA_EPS: Float = 1e-4;

/// Monaghan signal-velocity artificial viscosity with the Balsara
/// shear limiter. Inactive for receding pairs.
#[derive(Clone, Debug)]
pub struct ArtificialViscosity {
    alpha: Float,
    use_balsara: bool,
    time_dependent: bool,
    alpha_min: Float,
    alpha_max: Float,
    epsilon: Float,
}

impl ArtificialViscosity {
    pub fn new(parameters: &ViscosityParameters) -> Self {
        Self {
            alpha: parameters.alpha,
            use_balsara: parameters.balsara,
            time_dependent: parameters.time_dependent,
            alpha_min: parameters.alpha_min,
            alpha_max: parameters.alpha_max,
            epsilon: parameters.epsilon,
        }
    }

    /// A viscosity that never contributes.
    pub fn disabled() -> Self {
        Self {
            alpha: 0.0,
            use_balsara: false,
            time_dependent: false,
            alpha_min: 0.0,
            alpha_max: 0.0,
            epsilon: 0.01,
        }
    }

    pub fn is_time_dependent(&self) -> bool {
        self.time_dependent
    }

    pub fn initial_alpha(&self) -> Float {
        self.alpha
    }

    /// The pairwise viscous pressure term `Pi_ij`, non-zero only for
    /// approaching pairs: `Pi_ij = -alpha v_sig mu_ij / rho_ij`,
    /// pre-multiplied by the symmetrized Balsara factor.
    pub fn pi_ij(&self, particle: &Particle, other: &Particle, r_vec: MVec) -> Float {
        let vel_diff = particle.vel - other.vel;
        let approach = vel_diff.dot(r_vec);
        if approach >= 0.0 {
            return 0.0;
        }
        let h_mean = 0.5 * (particle.sml + other.sml);
        let dens_mean = 0.5 * (particle.dens + other.dens);
        let mu = h_mean * approach / (r_vec.length_squared() + self.epsilon * h_mean * h_mean);
        let v_sig = particle.sound + other.sound - 3.0 * mu;
        let alpha = if self.time_dependent {
            0.5 * (particle.alpha + other.alpha)
        } else {
            self.alpha
        };
        let limiter = if self.use_balsara {
            0.5 * (particle.balsara + other.balsara)
        } else {
            1.0
        };
        -limiter * alpha * v_sig * mu / dens_mean
    }

    /// The Balsara switch `|div v| / (|div v| + |curl v| + eps c/h)`.
    pub fn balsara_switch(&self, particle: &Particle, curl_magnitude: Float) -> Float {
        if !self.use_balsara {
            return 1.0;
        }
        let div = particle.div_v.abs();
        let floor = BALSARA_EPS * particle.sound / particle.sml;
        div / (div + curl_magnitude + floor)
    }

    /// Rate of change of the per-particle viscosity amplitude:
    /// decay towards `alpha_min` on a few crossing times, sourced by
    /// compression.
    pub fn alpha_derivative(&self, particle: &Particle) -> Float {
        if !self.time_dependent {
            return 0.0;
        }
        let tau = particle.sml / (DECAY_FACTOR * particle.sound.max(1e-30));
        let source = (-particle.div_v).max(0.0) * (self.alpha_max - particle.alpha);
        (self.alpha_min - particle.alpha) / tau + source
    }

    pub fn clamp_alpha(&self, alpha: Float) -> Float {
        alpha.clamp(self.alpha_min, self.alpha_max)
    }
}

/// Signal-velocity artificial conductivity (Price 2008), smoothing
/// internal energy discontinuities at contact surfaces.
#[derive(Clone, Debug)]
pub struct ArtificialConductivity {
    alpha: Float,
}

impl ArtificialConductivity {
    pub fn new(alpha: Float) -> Self {
        Self { alpha }
    }

    /// Contribution of one neighbour to `du_i/dt`. `dw_mean` is the
    /// symmetrized radial kernel derivative, which is non-positive, so
    /// heat flows from the hotter to the colder particle.
    pub fn du_pair(&self, particle: &Particle, other: &Particle, dw_mean: Float) -> Float {
        let dens_mean = 0.5 * (particle.dens + other.dens);
        let v_sig = ((particle.pres - other.pres).abs() / dens_mean).sqrt();
        other.mass * self.alpha * v_sig * (particle.ene - other.ene) * dw_mean / dens_mean
    }
}

#[cfg(test)]
mod tests {
    use super::ArtificialConductivity;
    use super::ArtificialViscosity;
    use crate::parameters::ViscosityParameters;
    use crate::particle::Particle;
    use crate::prelude::MVec;

    fn viscosity(balsara: bool) -> ArtificialViscosity {
        ArtificialViscosity::new(&ViscosityParameters {
            alpha: 1.0,
            balsara,
            time_dependent: false,
            alpha_min: 0.1,
            alpha_max: 2.0,
            epsilon: 0.01,
        })
    }

    fn pair(vel: f64) -> (Particle, Particle, MVec) {
        let particle = Particle {
            vel: MVec::splat(vel),
            dens: 1.0,
            sound: 1.0,
            sml: 0.1,
            ..Default::default()
        };
        let other = Particle {
            dens: 1.0,
            sound: 1.0,
            sml: 0.1,
            ..Default::default()
        };
        // The pair is separated along the first axis, `other` ahead.
        let mut r_vec = MVec::ZERO;
        r_vec[0] = -0.05;
        (particle, other, r_vec)
    }

    #[test]
    fn vanishes_for_receding_pairs() {
        let (particle, other, r_vec) = pair(-1.0);
        assert_eq!(viscosity(false).pi_ij(&particle, &other, r_vec), 0.0);
    }

    #[test]
    fn positive_for_approaching_pairs() {
        let (particle, other, r_vec) = pair(1.0);
        let pi = viscosity(false).pi_ij(&particle, &other, r_vec);
        assert!(pi > 0.0);
    }

    #[test]
    fn balsara_switch_suppresses_shear() {
        let viscosity = viscosity(true);
        let mut particle = Particle {
            sound: 1.0,
            sml: 0.1,
            div_v: -1.0,
            ..Default::default()
        };
        let compressive = viscosity.balsara_switch(&particle, 0.0);
        assert!(compressive > 0.99);
        let shearing = viscosity.balsara_switch(&particle, 100.0);
        assert!(shearing < 0.01);
        particle.div_v = 0.0;
        assert_eq!(viscosity.balsara_switch(&particle, 1.0), 0.0);
    }

    #[test]
    fn conductivity_moves_heat_downhill() {
        let conductivity = ArtificialConductivity::new(1.0);
        let hot = Particle {
            mass: 1.0,
            dens: 1.0,
            pres: 1.0,
            ene: 2.0,
            ..Default::default()
        };
        let cold = Particle {
            mass: 1.0,
            dens: 1.0,
            pres: 0.5,
            ene: 1.0,
            ..Default::default()
        };
        let dw_mean = -1.0;
        assert!(conductivity.du_pair(&hot, &cold, dw_mean) < 0.0);
        assert!(conductivity.du_pair(&cold, &hot, dw_mean) > 0.0);
    }

    #[test]
    fn alpha_decays_without_compression() {
        let viscosity = ArtificialViscosity::new(&ViscosityParameters {
            alpha: 1.0,
            balsara: false,
            time_dependent: true,
            alpha_min: 0.1,
            alpha_max: 2.0,
            epsilon: 0.01,
        });
        let particle = Particle {
            sound: 1.0,
            sml: 0.1,
            alpha: 1.0,
            div_v: 0.0,
            ..Default::default()
        };
        assert!(viscosity.alpha_derivative(&particle) < 0.0);
        let compressed = Particle {
            div_v: -10.0,
            ..particle
        };
        assert!(viscosity.alpha_derivative(&compressed) > 0.0);
    }
}
