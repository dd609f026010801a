//! The iterative density / smoothing length solve.
//!
//! For every real particle the Newton iteration finds the smoothing
//! length satisfying the neighbour-number constraint
//! `rho(h) * h^D = m * N_target / V_D`, where `V_D` is the unit-sphere
//! volume coefficient. The kernel sums forming `rho` and `drho/dh` run
//! over all neighbours including ghosts; the neighbour *count* only
//! considers real particles, since ghosts are images of reals that are
//! already counted and would otherwise inflate the implicit neighbour
//! number at the boundary until the iteration diverges.

use rayon::prelude::*;

use crate::config::NUM_DIMENSIONS;
use crate::config::UNIT_SPHERE_VOLUME;
use crate::error::Error;
use crate::error::Result;
use crate::kernel::Kernel;
use crate::parameters::NonConvergencePolicy;
use crate::parameters::PhysicsParameters;
use crate::parameters::SphType;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::simulation_box::SimulationBox;
use crate::tree::TreeCoordinator;

pub const MAX_NEWTON_ITERATIONS: usize = 10;
pub const RELATIVE_TOLERANCE: Float = 1e-6;
/// Largest fractional change of `h` per Newton step.
pub const MAX_STEP_FRACTION: Float = 0.2;

#[derive(Debug, Default)]
pub struct DensityStats {
    /// Particles whose neighbour query hit the collector capacity.
    pub truncated: usize,
    /// Particles that exhausted the iteration budget, with their last
    /// relative residual.
    pub nonconverged: Vec<(usize, Float)>,
    /// Largest number of Newton iterations spent on any particle.
    pub max_iterations: usize,
}

struct Outcome {
    iterations: usize,
    truncated: bool,
    residual: Option<Float>,
}

struct KernelSums {
    rho: Float,
    drho_dh: Float,
    num_real_neighbors: usize,
    pres_smoothed_sum: Float,
}

/// Solve for the smoothing lengths and densities of all real
/// particles. Requires a freshly rebuilt tree.
pub fn update_smoothing_lengths(
    reals: &mut [Particle],
    coordinator: &TreeCoordinator,
    box_: &SimulationBox,
    kernel: Kernel,
    physics: &PhysicsParameters,
) -> Result<DensityStats> {
    let buffer = coordinator.particles();
    let tree = coordinator.tree()?;
    let capacity = coordinator.parameters().neighbor_list_capacity;
    let num_total = coordinator.get_search_particle_count();

    let outcomes: Vec<Outcome> = reals
        .par_iter_mut()
        .map(|particle| {
            let mut truncated = false;
            let mut neighbors: Vec<usize> = vec![];
            let mut search_radius = 0.0;
            let mut h = particle.sml;
            debug_assert!(h > 0.0);

            // Refresh the candidate list whenever the support grew
            // beyond the radius of the previous query.
            let sums = |h: Float,
                            neighbors: &mut Vec<usize>,
                            search_radius: &mut Float,
                            truncated: &mut bool|
             -> KernelSums {
                let support = kernel.support_radius(h);
                if support > *search_radius {
                    let result = tree.search_neighbors(box_, particle.pos, support, capacity);
                    debug_assert!(result.is_valid(num_total));
                    *truncated |= result.truncated;
                    *neighbors = result.indices;
                    *search_radius = support;
                }
                let mut sums = KernelSums {
                    rho: 0.0,
                    drho_dh: 0.0,
                    num_real_neighbors: 0,
                    pres_smoothed_sum: 0.0,
                };
                for &j in neighbors.iter() {
                    let other = &buffer[j];
                    let r = box_.periodic_distance(&particle.pos, &other.pos);
                    if r >= support {
                        continue;
                    }
                    sums.rho += other.mass * kernel.w(r, h);
                    sums.drho_dh += other.mass * kernel.dw_dh(r, h);
                    sums.pres_smoothed_sum += other.mass * other.ene * kernel.w(r, h);
                    if !other.is_ghost {
                        sums.num_real_neighbors += 1;
                    }
                }
                sums
            };

            let dim = NUM_DIMENSIONS as Float;
            let target =
                particle.mass * physics.neighbor_number as Float / UNIT_SPHERE_VOLUME;
            let mut iterations = 0;
            let mut residual = None;
            if physics.iterative_smoothing_length {
                for iteration in 0..MAX_NEWTON_ITERATIONS {
                    iterations = iteration + 1;
                    let current = sums(h, &mut neighbors, &mut search_radius, &mut truncated);
                    let f = current.rho * h.powi(NUM_DIMENSIONS as i32) - target;
                    let df = current.drho_dh * h.powi(NUM_DIMENSIONS as i32)
                        + dim * h.powi(NUM_DIMENSIONS as i32 - 1) * current.rho;
                    residual = Some((f / target).abs());
                    let mut dh = if df.is_finite() && df != 0.0 {
                        -f / df
                    } else {
                        -MAX_STEP_FRACTION * h * f.signum()
                    };
                    dh = dh.clamp(-MAX_STEP_FRACTION * h, MAX_STEP_FRACTION * h);
                    if (dh / h).abs() < RELATIVE_TOLERANCE {
                        residual = None;
                        break;
                    }
                    h += dh;
                }
            }

            let final_sums = sums(h, &mut neighbors, &mut search_radius, &mut truncated);
            particle.sml = h;
            particle.dens = final_sums.rho;
            particle.neighbor = final_sums.num_real_neighbors;
            let omega = 1.0 + h / (dim * final_sums.rho) * final_sums.drho_dh;
            particle.gradh = if omega.is_finite() && omega != 0.0 {
                1.0 / omega
            } else {
                1.0
            };
            if physics.sph_type == SphType::Disph {
                particle.pres_smoothed = (physics.gamma - 1.0) * final_sums.pres_smoothed_sum;
            }
            Outcome {
                iterations,
                truncated,
                residual,
            }
        })
        .collect();

    let mut stats = DensityStats::default();
    for (id, outcome) in outcomes.iter().enumerate() {
        stats.max_iterations = stats.max_iterations.max(outcome.iterations);
        if outcome.truncated {
            stats.truncated += 1;
        }
        if let Some(residual) = outcome.residual {
            stats.nonconverged.push((id, residual));
        }
    }
    if physics.on_nonconvergence == NonConvergencePolicy::Abort {
        if let Some((particle, residual)) = stats.nonconverged.first() {
            return Err(Error::NonConvergence {
                particle: *particle,
                residual: *residual,
            });
        }
    }
    Ok(stats)
}

/// Set pressure and sound speed from the ideal-gas equation of state.
/// The density-independent scheme takes its pressure from the smoothed
/// internal energy sum instead of the density.
pub fn apply_equation_of_state(reals: &mut [Particle], physics: &PhysicsParameters) {
    for particle in reals.iter_mut() {
        particle.pres = match physics.sph_type {
            SphType::Disph => particle.pres_smoothed,
            _ => (physics.gamma - 1.0) * particle.dens * particle.ene,
        };
        particle.sound = (physics.gamma * particle.pres / particle.dens).max(0.0).sqrt();
    }
}

/// Initial smoothing length for a particle with known mass and
/// density estimate, chosen to satisfy the neighbour-number
/// constraint exactly on a uniform distribution.
pub fn initial_smoothing_length(
    mass: Float,
    dens: Float,
    neighbor_number: usize,
) -> Float {
    (mass * neighbor_number as Float / (UNIT_SPHERE_VOLUME * dens))
        .powf(1.0 / NUM_DIMENSIONS as Float)
}
