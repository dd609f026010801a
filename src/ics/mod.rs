//! Programmatic initial condition generators. The engine consumes an
//! immutable bundle of real particles; these generators produce the
//! setups used by the validation problems: a uniform lattice and a
//! two-state (Riemann problem) configuration split at an interface
//! coordinate.

use serde::Deserialize;

use crate::boundary::BoundaryParameters;
use crate::config::NUM_DIMENSIONS;
use crate::density::initial_smoothing_length;
use crate::error::Error;
use crate::error::Result;
use crate::parameters::PhysicsParameters;
use crate::particle::Particle;
use crate::prelude::Float;
use crate::prelude::MVec;

#[derive(Clone, Debug, Deserialize)]
pub struct FluidState {
    pub dens: Float,
    pub pres: Float,
    #[serde(default)]
    pub vel: Float,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LatticeParameters {
    pub particles_per_axis: usize,
    pub dens: Float,
    pub pres: Float,
    /// Uniform initial velocity, one component per axis.
    #[serde(default)]
    pub velocity: Option<Vec<Float>>,
}

/// Two constant states separated at `interface` along the first axis,
/// sampled with equal-mass particles, so the spacing adapts to the
/// density jump.
#[cfg(feature = "1d")]
#[derive(Clone, Debug, Deserialize)]
pub struct TwoStateParameters {
    pub particles: usize,
    pub interface: Float,
    pub left: FluidState,
    pub right: FluidState,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialConditionsParameters {
    Lattice(LatticeParameters),
    #[cfg(feature = "1d")]
    TwoState(TwoStateParameters),
}

pub struct InitialConditions {
    pub particles: Vec<Particle>,
}

pub fn build(
    parameters: &InitialConditionsParameters,
    boundary: &BoundaryParameters,
    physics: &PhysicsParameters,
) -> Result<InitialConditions> {
    match parameters {
        InitialConditionsParameters::Lattice(lattice) => build_lattice(lattice, boundary, physics),
        #[cfg(feature = "1d")]
        InitialConditionsParameters::TwoState(two_state) => {
            build_two_state(two_state, boundary, physics)
        }
    }
}

fn specific_energy(state_pres: Float, state_dens: Float, gamma: Float) -> Float {
    state_pres / ((gamma - 1.0) * state_dens)
}

fn build_lattice(
    parameters: &LatticeParameters,
    boundary: &BoundaryParameters,
    physics: &PhysicsParameters,
) -> Result<InitialConditions> {
    if parameters.particles_per_axis == 0 {
        return Err(Error::configuration("lattice needs at least one particle"));
    }
    if parameters.dens <= 0.0 || parameters.pres <= 0.0 {
        return Err(Error::configuration(
            "lattice requires positive density and pressure",
        ));
    }
    let velocity = match &parameters.velocity {
        Some(components) => {
            if components.len() != NUM_DIMENSIONS {
                return Err(Error::configuration(format!(
                    "lattice velocity needs {} components",
                    NUM_DIMENSIONS
                )));
            }
            let mut velocity = MVec::ZERO;
            for d in 0..NUM_DIMENSIONS {
                velocity[d] = components[d];
            }
            velocity
        }
        None => MVec::ZERO,
    };
    let n = parameters.particles_per_axis;
    let mut spacing = MVec::ZERO;
    let mut cell_volume = 1.0;
    for d in 0..NUM_DIMENSIONS {
        let axis = &boundary.axes[d];
        spacing[d] = (axis.hi - axis.lo) / n as Float;
        cell_volume *= spacing[d];
    }
    let mass = parameters.dens * cell_volume;
    let ene = specific_energy(parameters.pres, parameters.dens, physics.gamma);
    let sml = initial_smoothing_length(mass, parameters.dens, physics.neighbor_number);
    let mut particles = vec![];
    let mut index = [0usize; NUM_DIMENSIONS];
    loop {
        let mut pos = MVec::ZERO;
        for d in 0..NUM_DIMENSIONS {
            pos[d] = boundary.axes[d].lo + (index[d] as Float + 0.5) * spacing[d];
        }
        particles.push(Particle {
            id: particles.len(),
            pos,
            vel: velocity,
            vel_half: velocity,
            mass,
            dens: parameters.dens,
            ene,
            sml,
            ..Default::default()
        });
        // Advance the mixed-radix lattice counter.
        let mut d = 0;
        loop {
            index[d] += 1;
            if index[d] < n {
                break;
            }
            index[d] = 0;
            d += 1;
            if d == NUM_DIMENSIONS {
                return Ok(InitialConditions { particles });
            }
        }
    }
}

#[cfg(feature = "1d")]
fn build_two_state(
    parameters: &TwoStateParameters,
    boundary: &BoundaryParameters,
    physics: &PhysicsParameters,
) -> Result<InitialConditions> {
    let axis = &boundary.axes[0];
    let (lo, hi) = (axis.lo, axis.hi);
    if parameters.interface <= lo || parameters.interface >= hi {
        return Err(Error::configuration(
            "two_state interface must lie inside the domain",
        ));
    }
    let left = &parameters.left;
    let right = &parameters.right;
    if left.dens <= 0.0 || right.dens <= 0.0 || left.pres <= 0.0 || right.pres <= 0.0 {
        return Err(Error::configuration(
            "two_state requires positive densities and pressures",
        ));
    }
    let left_mass = left.dens * (parameters.interface - lo);
    let right_mass = right.dens * (hi - parameters.interface);
    let mass = (left_mass + right_mass) / parameters.particles as Float;
    let num_left = ((left_mass / mass).round() as usize).min(parameters.particles);
    let num_right = parameters.particles - num_left;
    if num_left == 0 || num_right == 0 {
        return Err(Error::configuration(
            "two_state resolution leaves one side empty",
        ));
    }
    let mut particles = vec![];
    let mut emit = |n: usize, lo: Float, hi: Float, state: &FluidState| {
        let spacing = (hi - lo) / n as Float;
        let dens = mass / spacing;
        for i in 0..n {
            particles.push(Particle {
                id: particles.len(),
                pos: MVec::splat(lo + (i as Float + 0.5) * spacing),
                vel: MVec::splat(state.vel),
                vel_half: MVec::splat(state.vel),
                mass,
                dens,
                ene: specific_energy(state.pres, dens, physics.gamma),
                sml: initial_smoothing_length(mass, dens, physics.neighbor_number),
                ..Default::default()
            });
        }
    };
    emit(num_left, lo, parameters.interface, left);
    emit(num_right, parameters.interface, hi, right);
    Ok(InitialConditions { particles })
}
