//! Conservation properties of a closed periodic run: exact mass,
//! near-exact linear momentum, and energy to kernel-order accuracy in
//! a smooth dissipation-free flow.

#![cfg(feature = "1d")]

use riptide::ics;
use riptide::output::EnergyRecord;
use riptide::parameters::ParameterFileContents;
use riptide::parameters::RunParameters;
use riptide::prelude::MVec;
use riptide::simulation::Simulation;

#[test]
fn closed_periodic_run_conserves_mass_momentum_and_energy() {
    let output_dir = std::env::temp_dir().join("riptide_conservation");
    let yaml = format!(
        "
time:
  start: 0.0
  end: 0.1
physics:
  neighbor_number: 10
  gamma: 1.4
  kernel: wendland_c4
  sph_type: ssph
boundary:
  axes:
    - type: periodic
      lo: 0.0
      hi: 1.0
output:
  output_dir: {output_dir:?}
  particle_interval: .inf
  energy_interval: .inf
initial_conditions:
  type: lattice
  particles_per_axis: 100
  dens: 1.0
  pres: 1.0
"
    );
    let contents = ParameterFileContents::from_str(&yaml).unwrap();
    let parameters = RunParameters::load(&contents).unwrap();
    let mut initial_conditions = ics::build(
        &parameters.initial_conditions,
        &parameters.boundary,
        &parameters.physics,
    )
    .unwrap();
    // A smooth standing sound wave with zero net momentum.
    let wavenumber = 2.0 * std::f64::consts::PI;
    for particle in initial_conditions.particles.iter_mut() {
        let amplitude = 0.05 * (wavenumber * particle.pos[0]).sin();
        particle.vel = MVec::splat(amplitude);
        particle.vel_half = particle.vel;
    }
    let initial_mass: f64 = initial_conditions.particles.iter().map(|p| p.mass).sum();
    let initial_energy = EnergyRecord::measure(0.0, &initial_conditions.particles);

    let mut simulation = Simulation::new(parameters, initial_conditions).unwrap();
    simulation.run().unwrap();
    assert!(simulation.step_index() > 0);

    let final_mass: f64 = simulation.particles().iter().map(|p| p.mass).sum();
    assert_eq!(final_mass, initial_mass);

    let record = EnergyRecord::measure(simulation.time(), simulation.particles());
    let sound = (1.4f64).sqrt();
    let momentum_scale = final_mass * sound;
    assert!(
        record.linear_momentum[0].abs() < 1e-6 * momentum_scale,
        "net momentum {}",
        record.linear_momentum[0]
    );
    assert!(
        (record.total - initial_energy.total).abs() < 0.01 * initial_energy.total,
        "energy drifted from {} to {}",
        initial_energy.total,
        record.total
    );

    // The combined buffer keeps its structural invariants through the
    // whole run.
    let num_real = simulation.particles().len();
    for (i, particle) in simulation.search_buffer().iter().enumerate() {
        assert_eq!(particle.id, i);
        assert_eq!(particle.is_ghost, i >= num_real);
    }
}
