use std::f64::consts::PI;

use serde::Deserialize;
use serde::Serialize;

use crate::config::NUM_DIMENSIONS;
use crate::prelude::Float;
use crate::prelude::MVec;

/// Support radius of both kernels in units of the smoothing length.
pub const SUPPORT: Float = 2.0;

/// Cubic spline normalization, Monaghan & Lattanzio 1985, in the
/// `q = r / h` parameterization with support `2h`.
#[cfg(feature = "1d")]
const SIGMA_CUBIC: Float = 2.0 / 3.0;
#[cfg(feature = "2d")]
const SIGMA_CUBIC: Float = 10.0 / (7.0 * PI);
#[cfg(feature = "3d")]
const SIGMA_CUBIC: Float = 1.0 / PI;

/// Wendland C4 normalization, Dehnen & Aly 2012, in the `q = r / H`
/// parameterization with `H = 2h`.
#[cfg(feature = "1d")]
const SIGMA_WENDLAND: Float = 3.0 / 2.0;
#[cfg(feature = "2d")]
const SIGMA_WENDLAND: Float = 9.0 / PI;
#[cfg(feature = "3d")]
const SIGMA_WENDLAND: Float = 495.0 / (32.0 * PI);

/// The smoothing kernels of the engine. Both have compact support of
/// radius `2h`; `w` integrates to one over the support in the active
/// dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    CubicSpline,
    WendlandC4,
}

fn cubic_spline_function(q: Float) -> Float {
    if q < 1.0 {
        1.0 - 1.5 * q.powi(2) + 0.75 * q.powi(3)
    } else if q < 2.0 {
        0.25 * (2.0 - q).powi(3)
    } else {
        0.0
    }
}

fn cubic_spline_derivative(q: Float) -> Float {
    if q < 1.0 {
        -3.0 * q + 2.25 * q.powi(2)
    } else if q < 2.0 {
        -0.75 * (2.0 - q).powi(2)
    } else {
        0.0
    }
}

fn wendland_function(q: Float) -> Float {
    if q >= 1.0 {
        return 0.0;
    }
    #[cfg(feature = "1d")]
    {
        (1.0 - q).powi(5) * (1.0 + 5.0 * q + 8.0 * q.powi(2))
    }
    #[cfg(not(feature = "1d"))]
    {
        (1.0 - q).powi(6) * (1.0 + 6.0 * q + 35.0 / 3.0 * q.powi(2))
    }
}

fn wendland_derivative(q: Float) -> Float {
    if q >= 1.0 {
        return 0.0;
    }
    #[cfg(feature = "1d")]
    {
        -14.0 * q * (1.0 - q).powi(4) * (1.0 + 4.0 * q)
    }
    #[cfg(not(feature = "1d"))]
    {
        -56.0 / 3.0 * q * (1.0 - q).powi(5) * (1.0 + 5.0 * q)
    }
}

impl Kernel {
    pub fn support_radius(&self, h: Float) -> Float {
        SUPPORT * h
    }

    pub fn w(&self, r: Float, h: Float) -> Float {
        match self {
            Self::CubicSpline => {
                SIGMA_CUBIC / h.powi(NUM_DIMENSIONS as i32) * cubic_spline_function(r / h)
            }
            Self::WendlandC4 => {
                let support = SUPPORT * h;
                SIGMA_WENDLAND / support.powi(NUM_DIMENSIONS as i32)
                    * wendland_function(r / support)
            }
        }
    }

    /// Radial derivative dW/dr. Non-positive everywhere.
    pub fn dw_dr(&self, r: Float, h: Float) -> Float {
        match self {
            Self::CubicSpline => {
                SIGMA_CUBIC / h.powi(NUM_DIMENSIONS as i32 + 1) * cubic_spline_derivative(r / h)
            }
            Self::WendlandC4 => {
                let support = SUPPORT * h;
                SIGMA_WENDLAND / support.powi(NUM_DIMENSIONS as i32 + 1)
                    * wendland_derivative(r / support)
            }
        }
    }

    /// Gradient with respect to the first argument of `W(r1 - r2, h)`,
    /// evaluated for the separation vector `r_vec = r1 - r2` with
    /// `r = |r_vec|`. Antisymmetric under exchange of the two points.
    pub fn grad_w(&self, r_vec: MVec, r: Float, h: Float) -> MVec {
        if r == 0.0 {
            return MVec::ZERO;
        }
        r_vec * (self.dw_dr(r, h) / r)
    }

    /// Derivative of the kernel with respect to the smoothing length at
    /// fixed separation, needed by the Newton iteration on `h`.
    pub fn dw_dh(&self, r: Float, h: Float) -> Float {
        let dim = NUM_DIMENSIONS as Float;
        match self {
            Self::CubicSpline => {
                let q = r / h;
                -SIGMA_CUBIC / h.powi(NUM_DIMENSIONS as i32 + 1)
                    * (dim * cubic_spline_function(q) + q * cubic_spline_derivative(q))
            }
            Self::WendlandC4 => {
                let support = SUPPORT * h;
                let q = r / support;
                -SUPPORT * SIGMA_WENDLAND / support.powi(NUM_DIMENSIONS as i32 + 1)
                    * (dim * wendland_function(q) + q * wendland_derivative(q))
            }
        }
    }
}
