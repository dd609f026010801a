//! The momentum and energy equations. Three interchangeable schemes
//! share the neighbour iteration pattern: standard SPH with artificial
//! viscosity, the density-independent (pressure-energy) formulation,
//! and Godunov SPH, which replaces the explicit dissipation terms with
//! a Riemann solve at every pair interface.
//!
//! Which scheme runs is decided once per run; the meaningless
//! combinations (Godunov SPH with artificial viscosity or
//! conductivity) are unrepresentable because the Godunov module simply
//! has no dissipation fields, and the parameter validation rejects
//! such input before construction.

pub mod gradients;
mod disph;
mod gsph;
mod limiter;
mod riemann;
mod ssph;
mod viscosity;

pub use self::disph::DisphForce;
pub use self::gsph::GsphForce;
pub use self::limiter::van_leer;
pub use self::riemann::Hll;
pub use self::riemann::RiemannSolution;
pub use self::riemann::RiemannState;
pub use self::ssph::SsphForce;
pub use self::viscosity::ArtificialConductivity;
pub use self::viscosity::ArtificialViscosity;

use crate::error::Result;
use crate::kernel::Kernel;
use crate::parameters::PhysicsParameters;
use crate::parameters::SphType;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::prelude::MVec;
use crate::simulation_box::SimulationBox;
use crate::tree::BhTree;
use crate::tree::TreeCoordinator;

/// Read-only inputs of a force evaluation. The buffer and tree come
/// from the coordinator and must be in sync with the current particle
/// state.
pub struct ForceContext<'a> {
    pub buffer: &'a [Particle],
    pub tree: &'a BhTree,
    pub box_: &'a SimulationBox,
    pub kernel: Kernel,
    pub gamma: Float,
    /// The timestep about to be applied; the second-order Godunov
    /// reconstruction shortens its extrapolation by the distance
    /// sound travels within it.
    pub dt: Float,
    pub neighbor_capacity: usize,
}

impl<'a> ForceContext<'a> {
    pub fn new(
        coordinator: &'a TreeCoordinator,
        box_: &'a SimulationBox,
        kernel: Kernel,
        gamma: Float,
        dt: Float,
    ) -> Result<Self> {
        Ok(Self {
            buffer: coordinator.particles(),
            tree: coordinator.tree()?,
            box_,
            kernel,
            gamma,
            dt,
            neighbor_capacity: coordinator.parameters().neighbor_list_capacity,
        })
    }
}

#[derive(Debug, Default)]
pub struct ForceStats {
    /// Particles whose neighbour query hit the collector capacity.
    pub truncated: usize,
}

/// A force module fills in `acc` and `dt_ene` of every real particle.
/// Ghosts enter the sums through the combined buffer but are never
/// written to.
pub trait ForceModule: Send + Sync {
    fn evaluate(&self, reals: &mut [Particle], context: &ForceContext) -> Result<ForceStats>;

    /// The viscosity whose amplitude the integrator evolves, if the
    /// scheme carries a time-dependent one.
    fn viscosity(&self) -> Option<&ArtificialViscosity> {
        None
    }

    fn name(&self) -> &'static str;
}

/// Symmetrized kernel gradient `0.5 (grad W(h1) + grad W(h2))`,
/// evaluated for the separation `r_vec` with norm `r`.
pub(crate) fn symmetric_kernel_derivative(
    kernel: Kernel,
    r_vec: MVec,
    r: Float,
    h1: Float,
    h2: Float,
) -> MVec {
    (kernel.grad_w(r_vec, r, h1) + kernel.grad_w(r_vec, r, h2)) * 0.5
}

/// Construct the configured force module. The parameters must have
/// passed validation; the Godunov arm ignores no dissipation input
/// because validation guarantees there is none.
pub fn build_force_module(physics: &PhysicsParameters) -> Box<dyn ForceModule> {
    let conductivity = physics
        .artificial_conductivity
        .as_ref()
        .map(|c| ArtificialConductivity::new(c.alpha));
    let viscosity = physics
        .artificial_viscosity
        .as_ref()
        .map(ArtificialViscosity::new)
        .unwrap_or_else(ArtificialViscosity::disabled);
    match physics.sph_type {
        SphType::Ssph => Box::new(SsphForce::new(viscosity, conductivity)),
        SphType::Disph => Box::new(DisphForce::new(viscosity, conductivity)),
        SphType::Gsph => Box::new(GsphForce::new(Hll, physics.gsph.second_order)),
    }
}
