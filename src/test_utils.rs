use crate::config::NUM_DIMENSIONS;
use crate::density::initial_smoothing_length;
use crate::kernel::Kernel;
use crate::parameters::NonConvergencePolicy;
use crate::parameters::PhysicsParameters;
use crate::parameters::SphType;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::prelude::MVec;
use crate::simulation_box::SimulationBox;

pub fn assert_float_is_close(x: Float, y: Float) {
    assert!((x - y).abs() < 10.0 * f64::EPSILON, "{} {}", x, y)
}

pub fn assert_float_is_close_high_error(x: Float, y: Float) {
    assert!((x - y).abs() < 1e3 * f64::EPSILON, "{} {}", x, y)
}

pub fn test_physics_parameters() -> PhysicsParameters {
    PhysicsParameters {
        neighbor_number: 8,
        gamma: 1.4,
        kernel: Kernel::CubicSpline,
        sph_type: SphType::Ssph,
        iterative_smoothing_length: true,
        on_nonconvergence: NonConvergencePolicy::KeepLast,
        gsph: Default::default(),
        artificial_viscosity: None,
        artificial_conductivity: None,
    }
}

/// A cell-centered lattice of `n^D` uniform particles filling the
/// periodic unit cube, ready for density solves.
pub fn periodic_lattice(n: usize, dens: Float, pres: Float) -> (Vec<Particle>, SimulationBox) {
    let physics = test_physics_parameters();
    let spacing = 1.0 / n as Float;
    let mass = dens * spacing.powi(NUM_DIMENSIONS as i32);
    let ene = pres / ((physics.gamma - 1.0) * dens);
    let sml = initial_smoothing_length(mass, dens, physics.neighbor_number);
    let mut particles = vec![];
    let mut index = [0usize; NUM_DIMENSIONS];
    'outer: loop {
        let mut pos = MVec::ZERO;
        for d in 0..NUM_DIMENSIONS {
            pos[d] = (index[d] as Float + 0.5) * spacing;
        }
        particles.push(Particle {
            id: particles.len(),
            pos,
            mass,
            dens,
            ene,
            sml,
            ..Default::default()
        });
        let mut d = 0;
        loop {
            index[d] += 1;
            if index[d] < n {
                break;
            }
            index[d] = 0;
            d += 1;
            if d == NUM_DIMENSIONS {
                break 'outer;
            }
        }
    }
    (particles, SimulationBox::cube_from_side_length(1.0))
}
