//! The one-dimensional vector type used when the crate is compiled
//! with the `1d` feature. It mirrors the subset of the `glam` vector
//! API that the rest of the code relies on, so that `MVec` can be
//! used uniformly in all dimensions.

#[cfg(feature = "1d")]
pub use self::dvec1::DVec1;

#[cfg(feature = "1d")]
mod dvec1 {
    use std::ops::Add;
    use std::ops::AddAssign;
    use std::ops::Div;
    use std::ops::DivAssign;
    use std::ops::Index;
    use std::ops::IndexMut;
    use std::ops::Mul;
    use std::ops::MulAssign;
    use std::ops::Neg;
    use std::ops::Sub;
    use std::ops::SubAssign;

    use serde::Deserialize;
    use serde::Serialize;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct DVec1 {
        pub x: f64,
    }

    impl DVec1 {
        pub const ZERO: Self = Self { x: 0.0 };
        pub const ONE: Self = Self { x: 1.0 };

        pub const fn new(x: f64) -> Self {
            Self { x }
        }

        pub const fn splat(v: f64) -> Self {
            Self { x: v }
        }

        pub fn length(self) -> f64 {
            self.x.abs()
        }

        pub fn length_squared(self) -> f64 {
            self.x * self.x
        }

        pub fn dot(self, rhs: Self) -> f64 {
            self.x * rhs.x
        }

        pub fn abs(self) -> Self {
            Self { x: self.x.abs() }
        }

        pub fn min(self, rhs: Self) -> Self {
            Self {
                x: self.x.min(rhs.x),
            }
        }

        pub fn max(self, rhs: Self) -> Self {
            Self {
                x: self.x.max(rhs.x),
            }
        }

        pub fn min_element(self) -> f64 {
            self.x
        }

        pub fn max_element(self) -> f64 {
            self.x
        }
    }

    impl Index<usize> for DVec1 {
        type Output = f64;

        fn index(&self, index: usize) -> &f64 {
            match index {
                0 => &self.x,
                _ => panic!("index out of bounds"),
            }
        }
    }

    impl IndexMut<usize> for DVec1 {
        fn index_mut(&mut self, index: usize) -> &mut f64 {
            match index {
                0 => &mut self.x,
                _ => panic!("index out of bounds"),
            }
        }
    }

    impl Add for DVec1 {
        type Output = Self;

        fn add(self, rhs: Self) -> Self {
            Self { x: self.x + rhs.x }
        }
    }

    impl AddAssign for DVec1 {
        fn add_assign(&mut self, rhs: Self) {
            self.x += rhs.x;
        }
    }

    impl Sub for DVec1 {
        type Output = Self;

        fn sub(self, rhs: Self) -> Self {
            Self { x: self.x - rhs.x }
        }
    }

    impl SubAssign for DVec1 {
        fn sub_assign(&mut self, rhs: Self) {
            self.x -= rhs.x;
        }
    }

    impl Neg for DVec1 {
        type Output = Self;

        fn neg(self) -> Self {
            Self { x: -self.x }
        }
    }

    impl Mul<f64> for DVec1 {
        type Output = Self;

        fn mul(self, rhs: f64) -> Self {
            Self { x: self.x * rhs }
        }
    }

    impl Mul<DVec1> for f64 {
        type Output = DVec1;

        fn mul(self, rhs: DVec1) -> DVec1 {
            DVec1 { x: self * rhs.x }
        }
    }

    // Componentwise product, as for the higher-dimensional glam types.
    impl Mul for DVec1 {
        type Output = Self;

        fn mul(self, rhs: Self) -> Self {
            Self { x: self.x * rhs.x }
        }
    }

    impl MulAssign<f64> for DVec1 {
        fn mul_assign(&mut self, rhs: f64) {
            self.x *= rhs;
        }
    }

    impl Div<f64> for DVec1 {
        type Output = Self;

        fn div(self, rhs: f64) -> Self {
            Self { x: self.x / rhs }
        }
    }

    impl DivAssign<f64> for DVec1 {
        fn div_assign(&mut self, rhs: f64) {
            self.x /= rhs;
        }
    }

}
