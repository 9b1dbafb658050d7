use thiserror::Error;

/// Failures reported by the bisection and integration routines.
///
/// A bracket without a sign change is not an error; see
/// [`BisectionOutcome::NoSignChange`](crate::bisection::BisectionOutcome).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericsError {
    #[error("unsupported integration order {0}; expected 1, 2 or 4")]
    UnsupportedOrder(u32),

    #[error("step count must be at least 1")]
    ZeroSteps,

    #[error("bisection did not converge within {iterations} iterations (last midpoint {estimate})")]
    IterationLimit { iterations: usize, estimate: f64 },
}

pub type Result<T> = std::result::Result<T, NumericsError>;
