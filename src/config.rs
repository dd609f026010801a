use std::f64::consts::PI;

#[cfg(feature = "1d")]
pub const NUM_DIMENSIONS: usize = 1;
#[cfg(feature = "2d")]
pub const NUM_DIMENSIONS: usize = 2;
#[cfg(feature = "3d")]
pub const NUM_DIMENSIONS: usize = 3;

pub const TWO_TO_NUM_DIMENSIONS: usize = 1 << NUM_DIMENSIONS;

/// Volume coefficient of the unit sphere in the active dimension,
/// used by the neighbour-number constraint of the smoothing length
/// iteration.
#[cfg(feature = "1d")]
pub const UNIT_SPHERE_VOLUME: f64 = 2.0;
#[cfg(feature = "2d")]
pub const UNIT_SPHERE_VOLUME: f64 = PI;
#[cfg(feature = "3d")]
pub const UNIT_SPHERE_VOLUME: f64 = 4.0 * PI / 3.0;

#[cfg(not(any(feature = "1d", feature = "2d", feature = "3d")))]
compile_error!("one of the features `1d`, `2d` or `3d` must be enabled");

#[cfg(any(
    all(feature = "1d", feature = "2d"),
    all(feature = "1d", feature = "3d"),
    all(feature = "2d", feature = "3d")
))]
compile_error!("the features `1d`, `2d` and `3d` are mutually exclusive");
