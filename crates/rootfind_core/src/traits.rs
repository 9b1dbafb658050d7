use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the root finder and integrators.
/// Must support basic arithmetic, debug printing, and conversion from f64/usize.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A scalar function `f(x)` whose roots are sought.
pub trait ScalarFunction<T: Scalar> {
    fn eval(&self, x: T) -> T;
}

impl<T: Scalar, F: Fn(T) -> T> ScalarFunction<T> for F {
    fn eval(&self, x: T) -> T {
        self(x)
    }
}

/// The right-hand side of a scalar ODE `x' = f(x, t)`.
///
/// Note the argument order: state first, then time.
pub trait OdeFunction<T: Scalar> {
    fn derivative(&self, x: T, t: T) -> T;
}

impl<T: Scalar, F: Fn(T, T) -> T> OdeFunction<T> for F {
    fn derivative(&self, x: T, t: T) -> T {
        self(x, t)
    }
}

/// A trait for fixed-step solvers that advance a scalar ODE by one step.
pub trait Steppable<T: Scalar> {
    /// Returns the state at `t + h` given the state `x` at `t`.
    fn step(&self, f: &impl OdeFunction<T>, t: T, x: T, h: T) -> T;
}

/// Converts a small f64 constant into `T`.
pub(crate) fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}
