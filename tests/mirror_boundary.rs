//! A wall-bounded box of uniform gas: mirror ghosts must complete the
//! kernel support at the walls so that the gas stays in equilibrium
//! and no particle is pushed through a wall.

#![cfg(feature = "1d")]

use riptide::ics;
use riptide::parameters::ParameterFileContents;
use riptide::parameters::RunParameters;
use riptide::simulation::Simulation;

#[test]
fn uniform_gas_between_walls_stays_in_equilibrium() {
    let output_dir = std::env::temp_dir().join("riptide_mirror");
    let yaml = format!(
        "
time:
  start: 0.0
  end: 0.05
physics:
  neighbor_number: 10
  gamma: 1.4
  kernel: cubic_spline
  sph_type: ssph
  artificial_viscosity:
    alpha: 1.0
boundary:
  strict: true
  axes:
    - type: mirror
      mirror_mode: no_slip
      lo: 0.0
      hi: 1.0
output:
  output_dir: {output_dir:?}
  particle_interval: .inf
  energy_interval: .inf
initial_conditions:
  type: lattice
  particles_per_axis: 64
  dens: 1.0
  pres: 1.0
"
    );
    let contents = ParameterFileContents::from_str(&yaml).unwrap();
    let parameters = RunParameters::load(&contents).unwrap();
    let initial_conditions = ics::build(
        &parameters.initial_conditions,
        &parameters.boundary,
        &parameters.physics,
    )
    .unwrap();
    let mut simulation = Simulation::new(parameters, initial_conditions).unwrap();
    // `strict` aborts the run if any particle escapes the walls.
    simulation.run().unwrap();

    assert!(simulation.num_ghosts() > 0);
    for particle in simulation.particles() {
        assert!(particle.pos[0] > 0.0 && particle.pos[0] < 1.0);
        // The mirror images complete the kernel support, so the
        // boundary density matches the bulk and nothing moves.
        assert!(
            (particle.dens - 1.0).abs() < 0.01,
            "density {} at x = {}",
            particle.dens,
            particle.pos[0]
        );
        assert!(
            particle.vel[0].abs() < 1e-8,
            "velocity {} at x = {}",
            particle.vel[0],
            particle.pos[0]
        );
    }
}
