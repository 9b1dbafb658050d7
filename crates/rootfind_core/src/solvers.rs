use crate::traits::{constant, OdeFunction, Scalar, Steppable};

/// Explicit (forward) Euler
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl<T: Scalar> Steppable<T> for Euler {
    fn step(&self, f: &impl OdeFunction<T>, t: T, x: T, h: T) -> T {
        x + h * f.derivative(x, t)
    }
}

/// Second-order (midpoint) Runge-Kutta
#[derive(Debug, Clone, Copy, Default)]
pub struct RK2;

impl<T: Scalar> Steppable<T> for RK2 {
    fn step(&self, f: &impl OdeFunction<T>, t: T, x: T, h: T) -> T {
        let half = constant::<T>(0.5);

        // k1 = h f(x, t)
        let k1 = h * f.derivative(x, t);
        // k2 = h f(x + k1/2, t + h/2)
        let k2 = h * f.derivative(x + half * k1, t + half * h);

        x + k2
    }
}

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4;

impl<T: Scalar> Steppable<T> for RK4 {
    fn step(&self, f: &impl OdeFunction<T>, t: T, x: T, h: T) -> T {
        let half = constant::<T>(0.5);
        let two = constant::<T>(2.0);
        let six = constant::<T>(6.0);

        let k1 = h * f.derivative(x, t);
        let k2 = h * f.derivative(x + half * k1, t + half * h);
        let k3 = h * f.derivative(x + half * k2, t + half * h);
        let k4 = h * f.derivative(x + k3, t + h);

        // x_next = x + (k1 + 2k2 + 2k3 + k4) / 6
        x + (k1 + two * k2 + two * k3 + k4) / six
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_uses_slope_at_start_of_step() {
        let f = |x: f64, t: f64| x + t;
        let next = Euler.step(&f, 1.0, 2.0, 0.5);
        assert_eq!(next, 2.0 + 0.5 * 3.0);
    }

    #[test]
    fn rk2_uses_midpoint_slope() {
        // x' = t integrates exactly with the midpoint rule.
        let f = |_x: f64, t: f64| t;
        let next = RK2.step(&f, 1.0, 0.0, 0.5);
        let exact = (1.5_f64 * 1.5 - 1.0) / 2.0;
        assert!((next - exact).abs() < 1e-15);
    }

    #[test]
    fn rk4_is_exact_for_cubic_time_dependence() {
        // x' = t^3 is integrated exactly by Simpson-weighted stages.
        let f = |_x: f64, t: f64| t * t * t;
        let next = RK4.step(&f, 0.0, 1.0, 2.0);
        let exact = 1.0 + 2.0_f64.powi(4) / 4.0;
        assert!((next - exact).abs() < 1e-12);
    }

    #[test]
    fn rk4_single_step_tracks_exponential() {
        let f = |x: f64, _t: f64| x;
        let next = RK4.step(&f, 0.0, 1.0, 0.1);
        assert!((next - 0.1_f64.exp()).abs() < 1e-6);
    }
}
