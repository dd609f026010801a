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

/// Density-independent SPH in the pressure-energy formulation of
/// Saitoh & Makino 2013. The kernel-smoothed pressure replaces the
/// density as the volume element, which removes the spurious surface
/// tension of standard SPH at contact discontinuities:
/// `dv_i/dt = -(gamma - 1)^2 sum_j m_j u_i u_j
///  [f_i grad W(h_i) / P_i + f_j grad W(h_j) / P_j]`.
/// Dissipation (artificial viscosity and conductivity) is shared with
/// the standard scheme.
pub struct DisphForce {
    viscosity: ArtificialViscosity,
    conductivity: Option<ArtificialConductivity>,
}

impl DisphForce {
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

impl ForceModule for DisphForce {
    fn evaluate(&self, reals: &mut [Particle], context: &ForceContext) -> Result<ForceStats> {
        let gamma_term = (context.gamma - 1.0).powi(2);
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
                let own_volume_term = particle.gradh / particle.pres_smoothed;
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
                    let grad_own = context.kernel.grad_w(r_vec, r, particle.sml);
                    let grad_other = context.kernel.grad_w(r_vec, r, other.sml);
                    let energy_weight = gamma_term * other.mass * particle.ene * other.ene;
                    let vel_diff = particle.vel - other.vel;
                    acc -= (grad_own * own_volume_term
                        + grad_other * (other.gradh / other.pres_smoothed))
                        * energy_weight;
                    dt_ene += energy_weight * own_volume_term * vel_diff.dot(grad_own);
                    let pi_ij = self.viscosity.pi_ij(particle, other, r_vec);
                    if pi_ij != 0.0 {
                        let grad_sym = symmetric_kernel_derivative(
                            context.kernel,
                            r_vec,
                            r,
                            particle.sml,
                            other.sml,
                        );
                        acc -= grad_sym * (other.mass * pi_ij);
                        dt_ene += 0.5 * other.mass * pi_ij * vel_diff.dot(grad_sym);
                    }
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
        "disph"
    }
}

#[cfg(test)]
mod tests {
    use super::super::ForceContext;
    use super::super::ForceModule;
    use super::ArtificialViscosity;
    use super::DisphForce;
    use crate::density::apply_equation_of_state;
    use crate::density::update_smoothing_lengths;
    use crate::kernel::Kernel;
    use crate::parameters::SphType;
    use crate::test_utils::periodic_lattice;
    use crate::test_utils::test_physics_parameters;
    use crate::tree::TreeCoordinator;
    use crate::tree::TreeParameters;

    #[test]
    fn uniform_state_produces_no_forces() {
        let (mut reals, box_) = periodic_lattice(16, 1.0, 1.0);
        let mut physics = test_physics_parameters();
        physics.sph_type = SphType::Disph;
        let mut coordinator = TreeCoordinator::new(TreeParameters::default());
        coordinator
            .rebuild_tree_for_neighbor_search(&reals, &[])
            .unwrap();
        update_smoothing_lengths(&mut reals, &coordinator, &box_, Kernel::CubicSpline, &physics)
            .unwrap();
        apply_equation_of_state(&mut reals, &physics);
        coordinator.sync_properties(&reals, &[]).unwrap();
        let force = DisphForce::new(ArtificialViscosity::disabled(), None);
        let context =
            ForceContext::new(&coordinator, &box_, Kernel::CubicSpline, physics.gamma, 0.0)
                .unwrap();
        force.evaluate(&mut reals, &context).unwrap();
        for particle in reals.iter() {
            assert!(particle.acc.length() < 1e-8);
            assert!(particle.dt_ene.abs() < 1e-8);
        }
    }
}
