//! The integration loop. The step order is load-bearing:
//! timestep, predict, ghost refresh, buffer resync + tree rebuild,
//! density/smoothing length solve, gradient pass, force evaluation,
//! correct. Ghosts must match the freshly advanced positions, the
//! tree must include them, the density solve must exclude them from
//! the neighbour count, and the forces need the updated pressures.

use log::info;
use log::warn;

use crate::boundary::BoundaryType;
use crate::boundary::GhostManager;
use crate::density;
use crate::error::Error;
use crate::error::Result;
use crate::hydrodynamics::build_force_module;
use crate::hydrodynamics::gradients;
use crate::hydrodynamics::ArtificialViscosity;
use crate::hydrodynamics::ForceContext;
use crate::hydrodynamics::ForceModule;
use crate::ics::InitialConditions;
use crate::kernel::Kernel;
use crate::kernel::SUPPORT;
use crate::output::OutputManager;
use crate::parameters::RunParameters;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::simulation_box::SimulationBox;
use crate::timestep::compute_timestep;
use crate::tree::TreeCoordinator;

#[derive(Debug, Default)]
struct DiagnosticCounters {
    truncated: u64,
    nonconverged: u64,
    domain_escapes: u64,
}

pub struct Simulation {
    parameters: RunParameters,
    kernel: Kernel,
    force: Box<dyn ForceModule>,
    reals: Vec<Particle>,
    ghosts: GhostManager,
    coordinator: TreeCoordinator,
    /// The configured domain; wraps positions on periodic axes.
    domain: SimulationBox,
    /// The box view used for neighbour queries and force loops.
    /// Ghost images carry the periodicity there, so the queries run
    /// with plain distances; wrapping them as well would count every
    /// boundary neighbour twice.
    search_box: SimulationBox,
    output: OutputManager,
    time: Float,
    step_index: u64,
    counters: DiagnosticCounters,
}

impl Simulation {
    pub fn new(parameters: RunParameters, initial_conditions: InitialConditions) -> Result<Self> {
        parameters.validate()?;
        let domain = parameters.boundary.simulation_box();
        let search_box = SimulationBox::open(domain.extent().clone());
        let ghosts = GhostManager::new(parameters.boundary.clone())?;
        let coordinator = TreeCoordinator::new(parameters.tree.clone());
        let output = OutputManager::new(parameters.output.clone(), parameters.time.start);
        let force = build_force_module(&parameters.physics);
        let mut reals = initial_conditions.particles;
        if reals.is_empty() {
            return Err(Error::configuration(
                "initial conditions contain no particles",
            ));
        }
        let initial_alpha = parameters.physics.initial_alpha();
        for (i, particle) in reals.iter_mut().enumerate() {
            particle.id = i;
            particle.is_ghost = false;
            particle.alpha = initial_alpha;
            particle.vel_half = particle.vel;
            if particle.sml <= 0.0 {
                if particle.dens <= 0.0 {
                    return Err(Error::configuration(format!(
                        "particle {} has neither a smoothing length nor a density estimate",
                        i
                    )));
                }
                particle.sml = density::initial_smoothing_length(
                    particle.mass,
                    particle.dens,
                    parameters.physics.neighbor_number,
                );
            }
        }
        let time = parameters.time.start;
        let kernel = parameters.physics.kernel;
        let mut simulation = Self {
            parameters,
            kernel,
            force,
            reals,
            ghosts,
            coordinator,
            domain,
            search_box,
            output,
            time,
            step_index: 0,
            counters: DiagnosticCounters::default(),
        };
        simulation.initialize()?;
        Ok(simulation)
    }

    /// Bootstrap: a first density estimate from a ghost-free tree,
    /// then the proper solve with boundary support, then the initial
    /// forces so that the first step has accelerations to predict
    /// with.
    fn initialize(&mut self) -> Result<()> {
        self.coordinator
            .rebuild_tree_for_neighbor_search(&self.reals, &[])?;
        // No ghosts yet, so wrap distances on periodic axes to get the
        // boundary densities right in the bootstrap estimate.
        let domain = self.domain.clone();
        self.solve_density_in(&domain)?;
        self.refresh_ghosts();
        self.rebuild_tree()?;
        self.solve_density()?;
        self.sync_derived_state()?;
        self.gradient_pass();
        self.sync_derived_state()?;
        self.compute_forces(0.0)?;
        info!(
            "initialized {} particles ({} ghosts) with scheme `{}`",
            self.reals.len(),
            self.ghosts.len(),
            self.force.name()
        );
        self.output.update(self.time, &self.reals)?;
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        while self.time < self.parameters.time.end {
            self.step()?;
        }
        info!(
            "finished at t = {:.6} after {} steps ({} truncated neighbour lists, \
             {} non-converged smoothing lengths, {} domain escapes)",
            self.time,
            self.step_index,
            self.counters.truncated,
            self.counters.nonconverged,
            self.counters.domain_escapes,
        );
        Ok(())
    }

    pub fn step(&mut self) -> Result<()> {
        let dt = compute_timestep(&self.reals, &self.parameters.cfl)
            .min(self.parameters.time.end - self.time);
        if !(dt > 0.0) || !dt.is_finite() {
            return Err(Error::invariant(
                "integrator",
                format!("timestep collapsed to {}", dt),
            ));
        }
        self.predict(dt);
        self.refresh_ghosts();
        self.rebuild_tree()?;
        self.solve_density()?;
        self.sync_derived_state()?;
        self.gradient_pass();
        self.sync_derived_state()?;
        self.compute_forces(dt)?;
        self.correct(dt);
        self.check_domain()?;
        self.time += dt;
        // Snap to the end time so that a sub-epsilon remainder cannot
        // stall the outer loop.
        let end = self.parameters.time.end;
        if end - self.time < 1e-12 * (1.0 + end.abs()) {
            self.time = end;
        }
        self.step_index += 1;
        info!(
            "step {:6} t = {:.6} dt = {:.3e} ghosts = {} max |v| = {:.3e}",
            self.step_index,
            self.time,
            dt,
            self.ghosts.len(),
            self.reals
                .iter()
                .map(|p| p.vel.length())
                .fold(0.0, Float::max),
        );
        self.output.update(self.time, &self.reals)?;
        Ok(())
    }

    /// Half-kick, drift, and a full-step velocity/energy prediction
    /// for the upcoming force evaluation.
    fn predict(&mut self, dt: Float) {
        for particle in self.reals.iter_mut() {
            particle.vel_half = particle.vel + particle.acc * (0.5 * dt);
            particle.pos += particle.vel_half * dt;
            particle.pos = self.domain.periodic_wrap(particle.pos);
            particle.vel = particle.vel_half + particle.acc * (0.5 * dt);
            particle.ene += 0.5 * dt * particle.dt_ene;
        }
    }

    /// Close the kicks with the freshly computed derivatives and
    /// advance the time-dependent viscosity amplitudes.
    fn correct(&mut self, dt: Float) {
        for particle in self.reals.iter_mut() {
            particle.vel = particle.vel_half + particle.acc * (0.5 * dt);
            particle.ene += 0.5 * dt * particle.dt_ene;
        }
        if let Some(viscosity) = self.force.viscosity() {
            if viscosity.is_time_dependent() {
                for particle in self.reals.iter_mut() {
                    let derivative = viscosity.alpha_derivative(particle);
                    particle.alpha = viscosity.clamp_alpha(particle.alpha + dt * derivative);
                }
            }
        }
    }

    fn max_smoothing_length(&self) -> Float {
        self.reals.iter().map(|p| p.sml).fold(0.0, Float::max)
    }

    fn refresh_ghosts(&mut self) {
        self.ghosts
            .set_kernel_support(SUPPORT * self.max_smoothing_length());
        self.ghosts.regenerate(&self.reals);
    }

    fn rebuild_tree(&mut self) -> Result<()> {
        self.coordinator
            .rebuild_tree_for_neighbor_search(&self.reals, self.ghosts.ghosts())
    }

    fn solve_density(&mut self) -> Result<()> {
        let box_ = self.search_box.clone();
        self.solve_density_in(&box_)
    }

    fn solve_density_in(&mut self, box_: &SimulationBox) -> Result<()> {
        let stats = density::update_smoothing_lengths(
            &mut self.reals,
            &self.coordinator,
            box_,
            self.kernel,
            &self.parameters.physics,
        )?;
        for (id, residual) in stats.nonconverged.iter() {
            warn!(
                "smoothing length iteration for particle {} stopped at residual {:.3e}; \
                 keeping the last value",
                id, residual
            );
        }
        self.counters.nonconverged += stats.nonconverged.len() as u64;
        if stats.truncated > 0 {
            warn!(
                "{} neighbour lists were truncated at capacity {} during the density solve",
                stats.truncated,
                self.coordinator.parameters().neighbor_list_capacity
            );
            self.counters.truncated += stats.truncated as u64;
        }
        density::apply_equation_of_state(&mut self.reals, &self.parameters.physics);
        Ok(())
    }

    /// Push the updated real-particle fields to the ghosts and the
    /// combined buffer without touching any position.
    fn sync_derived_state(&mut self) -> Result<()> {
        self.ghosts.sync_properties(&self.reals);
        self.coordinator
            .sync_properties(&self.reals, self.ghosts.ghosts())
    }

    fn gradient_pass(&mut self) {
        let disabled = ArtificialViscosity::disabled();
        let viscosity = self.force.viscosity().unwrap_or(&disabled);
        let store_field_gradients = self.parameters.physics.gsph.second_order;
        let stats = gradients::compute_gradients(
            &mut self.reals,
            &self.coordinator,
            &self.search_box,
            self.kernel,
            viscosity,
            store_field_gradients,
        );
        self.counters.truncated += stats.truncated as u64;
    }

    fn compute_forces(&mut self, dt: Float) -> Result<()> {
        let context = ForceContext::new(
            &self.coordinator,
            &self.search_box,
            self.kernel,
            self.parameters.physics.gamma,
            dt,
        )?;
        let stats = self.force.evaluate(&mut self.reals, &context)?;
        if stats.truncated > 0 {
            warn!(
                "{} neighbour lists were truncated during the force evaluation",
                stats.truncated
            );
            self.counters.truncated += stats.truncated as u64;
        }
        Ok(())
    }

    /// Particles may only leave the domain through periodic faces,
    /// where the drift wraps them back.
    fn check_domain(&mut self) -> Result<()> {
        let mut escapes = 0;
        let mut first = None;
        for particle in self.reals.iter() {
            for (d, axis) in self.parameters.boundary.axes.iter().enumerate() {
                if axis.kind == BoundaryType::Periodic {
                    continue;
                }
                if particle.pos[d] < axis.lo || particle.pos[d] > axis.hi {
                    escapes += 1;
                    first.get_or_insert(particle.id);
                    break;
                }
            }
        }
        if escapes > 0 {
            self.counters.domain_escapes += escapes as u64;
            if self.parameters.boundary.strict {
                return Err(Error::DomainEscape {
                    particle: first.unwrap(),
                });
            }
            warn!("{} particles left the simulation domain", escapes);
        }
        Ok(())
    }

    pub fn time(&self) -> Float {
        self.time
    }

    pub fn step_index(&self) -> u64 {
        self.step_index
    }

    pub fn particles(&self) -> &[Particle] {
        &self.reals
    }

    pub fn num_ghosts(&self) -> usize {
        self.ghosts.len()
    }

    pub fn search_buffer(&self) -> &[Particle] {
        self.coordinator.particles()
    }

    pub fn total_mass(&self) -> Float {
        self.reals.iter().map(|p| p.mass).sum()
    }
}
