pub use crate::config::NUM_DIMENSIONS;
pub use crate::error::Error;
pub use crate::error::Result;
pub use crate::extent::Extent;
pub use crate::particle::Particle;
pub use crate::simulation::Simulation;
pub use crate::simulation_box::SimulationBox;

pub type Float = f64;

#[cfg(feature = "1d")]
pub type MVec = crate::vector::DVec1;
#[cfg(feature = "2d")]
pub type MVec = glam::DVec2;
#[cfg(feature = "3d")]
pub type MVec = glam::DVec3;
