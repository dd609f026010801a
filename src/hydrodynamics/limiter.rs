use crate::prelude::Float;

/// The van Leer slope limiter: the harmonic mean of the two slopes
/// when they agree in sign, zero otherwise. Symmetric in its
/// arguments and flat across extrema.
pub fn van_leer(a: Float, b: Float) -> Float {
    if a * b > 0.0 {
        2.0 * a * b / (a + b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::van_leer;
    use crate::test_utils::assert_float_is_close;

    #[test]
    fn zero_on_opposite_signs() {
        assert_eq!(van_leer(1.0, -1.0), 0.0);
        assert_eq!(van_leer(-0.5, 2.0), 0.0);
        assert_eq!(van_leer(0.0, 3.0), 0.0);
        assert_eq!(van_leer(3.0, 0.0), 0.0);
    }

    #[test]
    fn unity_for_equal_slopes() {
        assert_float_is_close(van_leer(1.0, 1.0), 1.0);
        assert_float_is_close(van_leer(-2.0, -2.0), -2.0);
    }

    #[test]
    fn symmetric() {
        let check = |a: f64, b: f64| assert_float_is_close(van_leer(a, b), van_leer(b, a));
        check(0.5, 1.5);
        check(-0.25, -4.0);
        check(2.0, -1.0);
    }

    #[test]
    fn bounded_by_twice_the_smaller_slope() {
        for i in 1..100 {
            let a = 0.05 * i as f64;
            let b = 1.0;
            let limited = van_leer(a, b);
            assert!(limited <= 2.0 * a.min(b) + 1e-12);
            assert!(limited > 0.0);
        }
    }
}
