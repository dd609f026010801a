// Query-heavy numerical loops read better with explicit indices.
#![allow(clippy::needless_range_loop)]

//! # Riptide
//! A smoothed particle hydrodynamics engine for compressible flow in
//! one, two or three dimensions (selected at compile time via the
//! `1d`, `2d` and `3d` features).
//!
//! The engine integrates the Euler equations on a Lagrangian particle
//! set. Neighbour discovery runs over a bounded-capacity spatial
//! tree, boundary support comes from per-step regenerated ghost
//! particles, the smoothing lengths adapt via a Newton iteration on
//! the neighbour-number constraint, and three interchangeable force
//! schemes are available: standard SPH with artificial viscosity,
//! density-independent SPH, and Godunov SPH with an HLL Riemann
//! solver and optional MUSCL reconstruction.
//!
//! A run is driven by a YAML parameter file:
//!
//! ```text
//! riptide --parameter-file-path params/sod_shock_tube.yml
//! ```
//!
//! with optional `section/key:value` overrides appended to the
//! command line.

pub mod boundary;
pub mod command_line_options;
pub mod config;
pub mod density;
pub mod error;
pub mod extent;
pub mod hydrodynamics;
pub mod ics;
pub mod kernel;
pub mod output;
pub mod parameters;
pub mod particle;
pub mod prelude;
pub mod simulation;
pub mod simulation_box;
pub mod timestep;
pub mod tree;
pub mod vector;

#[cfg(test)]
pub(crate) mod test_utils;
