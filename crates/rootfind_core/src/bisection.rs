//! Root finding by interval bisection.
//!
//! The approximation at each iteration is the midpoint of the current
//! bracket, and the "error" is the change in midpoint from the previous
//! iteration. There is no default cap on the number of iterations: a zero
//! tolerance, or an `f` that misbehaves inside the bracket, can keep the loop
//! running. Set [`BisectionSettings::max_iterations`] to bound it.

use crate::error::{NumericsError, Result};
use crate::traits::{constant, Scalar, ScalarFunction};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BisectionSettings {
    /// Search stops once the midpoint moves by no more than this.
    pub tolerance: f64,
    pub max_iterations: Option<usize>,
}

impl Default for BisectionSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: None,
        }
    }
}

/// Snapshot of the search after one bisection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BisectionIterate<T> {
    pub iteration: usize,
    pub lower: T,
    pub upper: T,
    pub midpoint: T,
    /// Midpoint minus the previous midpoint.
    pub change: T,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BisectionResult<T> {
    pub root: T,
    pub iterations: usize,
    pub lower: T,
    pub upper: T,
    pub change: T,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BisectionOutcome<T> {
    Converged(BisectionResult<T>),
    /// `f(xa) * f(xb) >= 0`, so the interval does not bracket a root.
    NoSignChange,
}

impl<T: Copy> BisectionOutcome<T> {
    pub fn root(&self) -> Option<T> {
        match self {
            BisectionOutcome::Converged(result) => Some(result.root),
            BisectionOutcome::NoSignChange => None,
        }
    }

    pub fn into_result(self) -> Option<BisectionResult<T>> {
        match self {
            BisectionOutcome::Converged(result) => Some(result),
            BisectionOutcome::NoSignChange => None,
        }
    }
}

/// Receives every iterate of a bisection search.
pub trait BisectionObserver<T: Scalar> {
    fn observe(&mut self, iterate: &BisectionIterate<T>);
}

impl<T: Scalar, F: FnMut(&BisectionIterate<T>)> BisectionObserver<T> for F {
    fn observe(&mut self, iterate: &BisectionIterate<T>) {
        self(iterate)
    }
}

/// Ignores all iterates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl<T: Scalar> BisectionObserver<T> for Silent {
    fn observe(&mut self, _iterate: &BisectionIterate<T>) {}
}

/// Prints one line per iteration to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutTrace;

impl<T: Scalar> BisectionObserver<T> for StdoutTrace {
    fn observe(&mut self, iterate: &BisectionIterate<T>) {
        println!(
            "iteration {} (bisection): interval ({:?}, {:?}) root {:?}",
            iterate.iteration, iterate.lower, iterate.upper, iterate.midpoint
        );
    }
}

/// Emits one `tracing` event per iteration at DEBUG level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTrace;

impl<T: Scalar> BisectionObserver<T> for TracingTrace {
    fn observe(&mut self, iterate: &BisectionIterate<T>) {
        tracing::debug!(
            iteration = iterate.iteration,
            lower = ?iterate.lower,
            upper = ?iterate.upper,
            midpoint = ?iterate.midpoint,
            change = ?iterate.change,
            "bisection iterate"
        );
    }
}

/// Bisects `interval` until the midpoint moves by no more than
/// `settings.tolerance`.
///
/// Returns [`BisectionOutcome::NoSignChange`] without iterating when
/// `f(xa) * f(xb) >= 0`. The only error is [`NumericsError::IterationLimit`],
/// which requires `settings.max_iterations` to be set.
pub fn bisection<T: Scalar>(
    f: &impl ScalarFunction<T>,
    interval: (T, T),
    settings: &BisectionSettings,
    observer: &mut impl BisectionObserver<T>,
) -> Result<BisectionOutcome<T>> {
    let (mut xa, mut xb) = interval;
    let mut fxa = f.eval(xa);
    let fxb = f.eval(xb);
    if fxa * fxb >= T::zero() {
        tracing::debug!(lower = ?xa, upper = ?xb, "no sign change on bracketing interval");
        return Ok(BisectionOutcome::NoSignChange);
    }

    let two = constant::<T>(2.0);
    let tolerance = constant::<T>(settings.tolerance);
    let mut xm = (xb + xa) / two;
    let mut change = (xb - xa) / two;
    let mut iterations = 0usize;

    while change.abs() > tolerance {
        if let Some(limit) = settings.max_iterations {
            if iterations >= limit {
                let estimate = xm.to_f64().unwrap_or(f64::NAN);
                tracing::debug!(iterations, estimate, "bisection iteration limit reached");
                return Err(NumericsError::IterationLimit {
                    iterations,
                    estimate,
                });
            }
        }
        iterations += 1;

        // f(xa) is carried over from the previous iteration; it always equals a
        // fresh evaluation at the current xa.
        let fxm = f.eval(xm);
        if fxm == T::zero() {
            xa = xm;
            xb = xm;
            fxa = fxm;
        } else if fxa * fxm < T::zero() {
            xb = xm;
        } else {
            xa = xm;
            fxa = fxm;
        }

        let previous = xm;
        xm = (xb + xa) / two;
        change = xm - previous;

        observer.observe(&BisectionIterate {
            iteration: iterations,
            lower: xa,
            upper: xb,
            midpoint: xm,
            change,
        });
    }

    tracing::debug!(root = ?xm, iterations, "bisection converged");
    Ok(BisectionOutcome::Converged(BisectionResult {
        root: xm,
        iterations,
        lower: xa,
        upper: xb,
        change,
    }))
}

/// Convenience wrapper: returns the root, or `None` if `f` does not change
/// sign on `interval`. With `verbose` set, each iteration is printed to stdout.
pub fn find_root<T: Scalar>(
    f: &impl ScalarFunction<T>,
    interval: (T, T),
    tolerance: f64,
    verbose: bool,
) -> Option<T> {
    let settings = BisectionSettings {
        tolerance,
        max_iterations: None,
    };
    // Without an iteration cap the search cannot fail, only report no sign change.
    let outcome = if verbose {
        bisection(f, interval, &settings, &mut StdoutTrace)
    } else {
        bisection(f, interval, &settings, &mut Silent)
    };
    outcome.ok().and_then(|outcome| outcome.root())
}
