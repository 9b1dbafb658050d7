pub mod bisection;
pub mod error;
pub mod expression;
pub mod integrate;
pub mod solvers;
/// The `rootfind_core` crate provides two small numerical primitives for
/// computational physics coursework. Both are generic over the floating-point
/// type (`f64` or `f32`).
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `ScalarFunction` / `OdeFunction` (user functions), `Steppable` (Solvers).
/// - **Bisection**: bracketed root finding with pluggable per-iteration observers.
/// - **Integrate**: fixed-step trajectories of scalar ODEs on a half-open interval.
/// - **Solvers**: one-step update rules (Euler, RK2, RK4).
/// - **Expression**: a parser and bytecode VM for functions typed as text.
pub mod traits;

pub use bisection::{bisection, find_root, BisectionOutcome, BisectionSettings};
pub use error::NumericsError;
pub use integrate::{integrate, solve, IntegrationSettings, Order, Trajectory};
