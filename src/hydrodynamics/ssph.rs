use rayon::prelude::*;

use super::symmetric_kernel_derivative;
use super::ArtificialConductivity;
use super::ArtificialViscosity;
use super::ForceContext;
use super::ForceModule;
use super::ForceStats;
use crate::error::Result;
use crate::particle::Particle;
use crate::prelude::MVec;

/// Standard SPH with Monaghan artificial viscosity.
///
/// Momentum equation, grad-h corrected, everything attached to the
/// symmetrized kernel gradient:
/// `dv_i/dt = -sum_j m_j (f_i P_i / rho_i^2 + f_j P_j / rho_j^2
///  + Pi_ij) grad W_ij^sym`,
/// with the matching symmetric energy equation.
pub struct SsphForce {
    viscosity: ArtificialViscosity,
    conductivity: Option<ArtificialConductivity>,
}

impl SsphForce {
    pub fn new(
        viscosity: ArtificialViscosity,
        conductivity: Option<ArtificialConductivity>,
    ) -> Self {
        Self {
            viscosity,
            conductivity,
        }
    }
}

impl ForceModule for SsphForce {
    fn evaluate(&self, reals: &mut [Particle], context: &ForceContext) -> Result<ForceStats> {
        let truncated: usize = reals
            .par_iter_mut()
            .map(|particle| {
                let support = context.kernel.support_radius(particle.sml);
                let result = context.tree.search_neighbors(
                    context.box_,
                    particle.pos,
                    support,
                    context.neighbor_capacity,
                );
                let mut acc = MVec::ZERO;
                let mut dt_ene = 0.0;
                let pressure_term = particle.gradh * particle.pres / particle.dens.powi(2);
                for &j in result.indices.iter() {
                    if j == particle.id {
                        continue;
                    }
                    let other = &context.buffer[j];
                    let r_vec = context.box_.periodic_distance_vec(&particle.pos, &other.pos);
                    let r = r_vec.length();
                    if r == 0.0 {
                        continue;
                    }
                    let grad_sym = symmetric_kernel_derivative(
                        context.kernel,
                        r_vec,
                        r,
                        particle.sml,
                        other.sml,
                    );
                    let pi_ij = self.viscosity.pi_ij(particle, other, r_vec);
                    let momentum = pressure_term
                        + other.gradh * other.pres / other.dens.powi(2)
                        + pi_ij;
                    let vel_diff = particle.vel - other.vel;
                    acc -= grad_sym * (other.mass * momentum);
                    dt_ene += 0.5 * other.mass * momentum * vel_diff.dot(grad_sym);
                    if let Some(conductivity) = &self.conductivity {
                        let dw_mean = 0.5
                            * (context.kernel.dw_dr(r, particle.sml)
                                + context.kernel.dw_dr(r, other.sml));
                        dt_ene += conductivity.du_pair(particle, other, dw_mean);
                    }
                }
                particle.acc = acc;
                particle.dt_ene = dt_ene;
                result.truncated as usize
            })
            .sum();
        Ok(ForceStats { truncated })
    }

    fn viscosity(&self) -> Option<&ArtificialViscosity> {
        Some(&self.viscosity)
    }

    fn name(&self) -> &'static str {
        "ssph"
    }
}
