use rayon::prelude::*;

use super::limiter::van_leer;
use super::riemann::Hll;
use super::riemann::RiemannState;
use super::symmetric_kernel_derivative;
use super::ForceContext;
use super::ForceModule;
use super::ForceStats;
use crate::config::NUM_DIMENSIONS;
use crate::error::Result;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::prelude::MVec;

/// Godunov SPH after Inutsuka 2002 and Cha & Whitworth 2003: the
/// pressure force of every pair is evaluated from the solution
/// `(P*, v*)` of a one-dimensional Riemann problem along the line
/// connecting the pair, weighted by the specific volumes:
/// `dv_i/dt = -sum_j m_j P* (1 / rho_i^2 + 1 / rho_j^2) grad W_sym`,
/// `du_i/dt = -sum_j m_j P* (1 / rho_i^2 + 1 / rho_j^2)
///  (v* - v_i^{n+1/2}) . grad W_sym`.
/// Shock dissipation comes from the upwinding of the Riemann solve;
/// the scheme has no artificial viscosity or conductivity.
pub struct GsphForce {
    riemann: Hll,
    second_order: bool,
}

struct Reconstruction {
    dens: Float,
    pres: Float,
    vel: Float,
}

impl GsphForce {
    pub fn new(riemann: Hll, second_order: bool) -> Self {
        Self {
            riemann,
            second_order,
        }
    }

    /// Extrapolate `(rho, P, v_parallel)` from a particle towards the
    /// pair midpoint using the stored gradients, limited against the
    /// pairwise slope. `offset` is the signed distance along the unit
    /// vector `axis` from the particle to the reconstruction point.
    fn reconstruct(
        particle: &Particle,
        axis: MVec,
        offset: Float,
        pair_slope_dens: Float,
        pair_slope_pres: Float,
        pair_slope_vel: Float,
    ) -> Reconstruction {
        let slope_dens = van_leer(particle.grad_dens.dot(axis), pair_slope_dens);
        let slope_pres = van_leer(particle.grad_pres.dot(axis), pair_slope_pres);
        let own_slope_vel = {
            let mut along = 0.0;
            for k in 0..NUM_DIMENSIONS {
                along += axis[k] * particle.grad_vel[k].dot(axis);
            }
            along
        };
        let slope_vel = van_leer(own_slope_vel, pair_slope_vel);
        Reconstruction {
            dens: particle.dens + slope_dens * offset,
            pres: particle.pres + slope_pres * offset,
            vel: particle.vel.dot(axis) + slope_vel * offset,
        }
    }
}

impl ForceModule for GsphForce {
    fn evaluate(&self, reals: &mut [Particle], context: &ForceContext) -> Result<ForceStats> {
        let outcomes: Vec<Result<usize>> = reals
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
                    // Axis of the one-dimensional Riemann problem,
                    // pointing from this particle towards the
                    // neighbour; this particle forms the left state.
                    let axis = -r_vec / r;
                    let vel_left = particle.vel.dot(axis);
                    let vel_right = other.vel.dot(axis);
                    let mut left = RiemannState {
                        dens: particle.dens,
                        pres: particle.pres,
                        vel: vel_left,
                        sound: particle.sound,
                    };
                    let mut right = RiemannState {
                        dens: other.dens,
                        pres: other.pres,
                        vel: vel_right,
                        sound: other.sound,
                    };
                    if self.second_order {
                        let pair_slope_dens = (other.dens - particle.dens) / r;
                        let pair_slope_pres = (other.pres - particle.pres) / r;
                        let pair_slope_vel = (vel_right - vel_left) / r;
                        let offset_left =
                            0.5 * (r - particle.sound * context.dt).max(0.0);
                        let offset_right = 0.5 * (r - other.sound * context.dt).max(0.0);
                        let reconstructed_left = Self::reconstruct(
                            particle,
                            axis,
                            offset_left,
                            pair_slope_dens,
                            pair_slope_pres,
                            pair_slope_vel,
                        );
                        let reconstructed_right = Self::reconstruct(
                            other,
                            axis,
                            -offset_right,
                            pair_slope_dens,
                            pair_slope_pres,
                            pair_slope_vel,
                        );
                        // Keep first-order states when the
                        // extrapolation leaves the physical region.
                        if reconstructed_left.dens > 0.0 && reconstructed_left.pres > 0.0 {
                            left.dens = reconstructed_left.dens;
                            left.pres = reconstructed_left.pres;
                            left.vel = reconstructed_left.vel;
                        }
                        if reconstructed_right.dens > 0.0 && reconstructed_right.pres > 0.0 {
                            right.dens = reconstructed_right.dens;
                            right.pres = reconstructed_right.pres;
                            right.vel = reconstructed_right.vel;
                        }
                    }
                    let solution = self.riemann.solve(left, right)?;
                    let grad_sym = symmetric_kernel_derivative(
                        context.kernel,
                        r_vec,
                        r,
                        particle.sml,
                        other.sml,
                    );
                    let volume_term = 1.0 / particle.dens.powi(2) + 1.0 / other.dens.powi(2);
                    let weight = other.mass * solution.pres * volume_term;
                    acc -= grad_sym * weight;
                    // Interface velocity: the Riemann normal velocity
                    // plus the averaged tangential component.
                    let tangential =
                        (particle.vel + other.vel - axis * (vel_left + vel_right)) * 0.5;
                    let interface_vel = axis * solution.vel + tangential;
                    dt_ene -= weight * (interface_vel - particle.vel_half).dot(grad_sym);
                }
                particle.acc = acc;
                particle.dt_ene = dt_ene;
                Ok(result.truncated as usize)
            })
            .collect();
        let mut stats = ForceStats::default();
        for outcome in outcomes {
            stats.truncated += outcome?;
        }
        Ok(stats)
    }

    fn name(&self) -> &'static str {
        "gsph"
    }
}
