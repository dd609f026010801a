//! SPH estimates of the velocity divergence and curl (for the Balsara
//! switch and the time-dependent viscosity) and of the density,
//! pressure and velocity gradients consumed by the second-order
//! reconstruction of the Godunov scheme. Recomputed every step
//! between the density solve and the force evaluation.

use rayon::prelude::*;

use crate::config::NUM_DIMENSIONS;
use crate::kernel::Kernel;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::prelude::MVec;
use crate::simulation_box::SimulationBox;
use crate::tree::TreeCoordinator;

use super::viscosity::ArtificialViscosity;

#[cfg(feature = "1d")]
#[derive(Default)]
struct CurlAccumulator;

#[cfg(feature = "1d")]
impl CurlAccumulator {
    fn add(&mut self, _vel_diff: MVec, _grad: MVec) {}

    fn magnitude(&self, _dens: Float) -> Float {
        0.0
    }
}

#[cfg(feature = "2d")]
#[derive(Default)]
struct CurlAccumulator(Float);

#[cfg(feature = "2d")]
impl CurlAccumulator {
    fn add(&mut self, vel_diff: MVec, grad: MVec) {
        self.0 += vel_diff.perp_dot(grad);
    }

    fn magnitude(&self, dens: Float) -> Float {
        (self.0 / dens).abs()
    }
}

#[cfg(feature = "3d")]
#[derive(Default)]
struct CurlAccumulator(MVec);

#[cfg(feature = "3d")]
impl CurlAccumulator {
    fn add(&mut self, vel_diff: MVec, grad: MVec) {
        self.0 += vel_diff.cross(grad);
    }

    fn magnitude(&self, dens: Float) -> Float {
        (self.0 / dens).length()
    }
}

pub struct GradientStats {
    pub truncated: usize,
}

/// Fill in `div_v`, `balsara` and, when requested, the stored field
/// gradients of every real particle. Requires densities and the
/// synced combined buffer from the preceding density solve.
pub fn compute_gradients(
    reals: &mut [Particle],
    coordinator: &TreeCoordinator,
    box_: &SimulationBox,
    kernel: Kernel,
    viscosity: &ArtificialViscosity,
    store_field_gradients: bool,
) -> GradientStats {
    let buffer = coordinator.particles();
    let tree = match coordinator.tree() {
        Ok(tree) => tree,
        Err(_) => return GradientStats { truncated: 0 },
    };
    let capacity = coordinator.parameters().neighbor_list_capacity;

    let truncated: usize = reals
        .par_iter_mut()
        .map(|particle| {
            let support = kernel.support_radius(particle.sml);
            let result = tree.search_neighbors(box_, particle.pos, support, capacity);
            let mut div_sum = 0.0;
            let mut curl = CurlAccumulator::default();
            let mut grad_dens = MVec::ZERO;
            let mut grad_pres = MVec::ZERO;
            let mut grad_vel = [MVec::ZERO; NUM_DIMENSIONS];
            for &j in result.indices.iter() {
                let other = &buffer[j];
                if j == particle.id {
                    continue;
                }
                let r_vec = box_.periodic_distance_vec(&particle.pos, &other.pos);
                let r = r_vec.length();
                let grad = kernel.grad_w(r_vec, r, particle.sml);
                let vel_diff = other.vel - particle.vel;
                div_sum += other.mass * vel_diff.dot(grad);
                curl.add(vel_diff, grad);
                if store_field_gradients {
                    grad_dens += grad * (other.mass * (other.dens - particle.dens) / other.dens);
                    grad_pres += grad * (other.mass * (other.pres - particle.pres) / other.dens);
                    for k in 0..NUM_DIMENSIONS {
                        grad_vel[k] += grad * (other.mass * vel_diff[k] / other.dens);
                    }
                }
            }
            particle.div_v = div_sum / particle.dens;
            particle.balsara =
                viscosity.balsara_switch(particle, curl.magnitude(particle.dens));
            if store_field_gradients {
                particle.grad_dens = grad_dens;
                particle.grad_pres = grad_pres;
                particle.grad_vel = grad_vel;
            }
            result.truncated as usize
        })
        .sum();

    GradientStats { truncated }
}

#[cfg(test)]
mod tests {
    use super::compute_gradients;
    use super::ArtificialViscosity;
    use crate::density::apply_equation_of_state;
    use crate::density::update_smoothing_lengths;
    use crate::kernel::Kernel;
    use crate::test_utils::periodic_lattice;
    use crate::test_utils::test_physics_parameters;
    use crate::tree::TreeCoordinator;
    use crate::tree::TreeParameters;

    #[test]
    fn uniform_flow_has_vanishing_divergence_and_gradients() {
        let (mut reals, box_) = periodic_lattice(16, 1.0, 1.0);
        for particle in reals.iter_mut() {
            particle.vel = crate::prelude::MVec::splat(0.7);
        }
        let physics = test_physics_parameters();
        let mut coordinator = TreeCoordinator::new(TreeParameters::default());
        coordinator
            .rebuild_tree_for_neighbor_search(&reals, &[])
            .unwrap();
        update_smoothing_lengths(&mut reals, &coordinator, &box_, Kernel::CubicSpline, &physics)
            .unwrap();
        apply_equation_of_state(&mut reals, &physics);
        coordinator.sync_properties(&reals, &[]).unwrap();
        let stats = compute_gradients(
            &mut reals,
            &coordinator,
            &box_,
            Kernel::CubicSpline,
            &ArtificialViscosity::disabled(),
            true,
        );
        assert_eq!(stats.truncated, 0);
        for particle in reals.iter() {
            assert!(particle.div_v.abs() < 1e-10);
            assert!(particle.grad_dens.length() < 1e-8);
            assert!(particle.grad_pres.length() < 1e-8);
        }
    }

    #[cfg(feature = "1d")]
    #[test]
    fn linear_velocity_field_recovers_the_divergence() {
        use crate::prelude::MVec;
        let (mut reals, box_) = periodic_lattice(64, 1.0, 1.0);
        // A gentle sine flow; near the node at x = 0.5 the divergence
        // is close to the analytic derivative.
        let wavenumber = 2.0 * std::f64::consts::PI;
        for particle in reals.iter_mut() {
            particle.vel = MVec::splat(0.01 * (wavenumber * particle.pos[0]).sin());
        }
        let physics = test_physics_parameters();
        let mut coordinator = TreeCoordinator::new(TreeParameters::default());
        coordinator
            .rebuild_tree_for_neighbor_search(&reals, &[])
            .unwrap();
        update_smoothing_lengths(&mut reals, &coordinator, &box_, Kernel::CubicSpline, &physics)
            .unwrap();
        apply_equation_of_state(&mut reals, &physics);
        coordinator.sync_properties(&reals, &[]).unwrap();
        compute_gradients(
            &mut reals,
            &coordinator,
            &box_,
            Kernel::CubicSpline,
            &ArtificialViscosity::disabled(),
            false,
        );
        let near_node = reals
            .iter()
            .min_by(|a, b| {
                (a.pos[0] - 0.5)
                    .abs()
                    .partial_cmp(&(b.pos[0] - 0.5).abs())
                    .unwrap()
            })
            .unwrap();
        let expected = 0.01 * wavenumber * (wavenumber * near_node.pos[0]).cos();
        assert!(
            (near_node.div_v - expected).abs() < 0.2 * expected.abs(),
            "div {} vs {}",
            near_node.div_v,
            expected
        );
    }
}
