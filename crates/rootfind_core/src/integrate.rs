//! Fixed-step integration of scalar ODEs `x' = f(x, t)`.
//!
//! Samples are taken on the half-open interval `[a, b)`: `t_i = a + i*h` for
//! `i = 0..steps`, so a run produces `steps` points and never samples `b`
//! itself. Each sample records the state at the *start* of its step. The
//! state after the final step is kept separately as
//! [`Trajectory::terminal`].

use crate::error::{NumericsError, Result};
use crate::solvers::{Euler, RK2, RK4};
use crate::traits::{OdeFunction, Scalar, Steppable};
use serde::{Deserialize, Serialize};

/// Accuracy order of the fixed-step method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Order {
    Euler,
    Midpoint,
    RungeKutta4,
}

impl Order {
    fn stepper(self) -> Stepper {
        match self {
            Order::Euler => Stepper::Euler(Euler),
            Order::Midpoint => Stepper::Rk2(RK2),
            Order::RungeKutta4 => Stepper::Rk4(RK4),
        }
    }
}

impl TryFrom<u32> for Order {
    type Error = NumericsError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Order::Euler),
            2 => Ok(Order::Midpoint),
            4 => Ok(Order::RungeKutta4),
            other => Err(NumericsError::UnsupportedOrder(other)),
        }
    }
}

impl From<Order> for u32 {
    fn from(order: Order) -> Self {
        match order {
            Order::Euler => 1,
            Order::Midpoint => 2,
            Order::RungeKutta4 => 4,
        }
    }
}

enum Stepper {
    Euler(Euler),
    Rk2(RK2),
    Rk4(RK4),
}

impl Stepper {
    fn step<T: Scalar>(&self, f: &impl OdeFunction<T>, t: T, x: T, h: T) -> T {
        match self {
            Stepper::Euler(s) => s.step(f, t, x, h),
            Stepper::Rk2(s) => s.step(f, t, x, h),
            Stepper::Rk4(s) => s.step(f, t, x, h),
        }
    }
}

/// Where the integrated state starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialValue {
    /// Start from the caller's `y0`.
    #[default]
    Supplied,
    /// Start from zero regardless of `y0`. Matches results produced by older
    /// versions of the course code.
    LegacyZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    pub steps: usize,
    pub order: Order,
    pub initial_value: InitialValue,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            steps: 100,
            order: Order::Euler,
            initial_value: InitialValue::Supplied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint<T> {
    pub t: T,
    pub x: T,
}

/// Output of a fixed-step run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory<T> {
    points: Vec<TrajectoryPoint<T>>,
    terminal: TrajectoryPoint<T>,
}

impl<T: Copy> Trajectory<T> {
    pub fn points(&self) -> &[TrajectoryPoint<T>] {
        &self.points
    }

    /// State after the last step, at `t = a + steps*h`. Not one of the samples.
    pub fn terminal(&self) -> TrajectoryPoint<T> {
        self.terminal
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint<T>> {
        self.points.last()
    }

    pub fn times(&self) -> Vec<T> {
        self.points.iter().map(|p| p.t).collect()
    }

    pub fn values(&self) -> Vec<T> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrajectoryPoint<T>> {
        self.points.iter()
    }
}

impl<'a, T> IntoIterator for &'a Trajectory<T> {
    type Item = &'a TrajectoryPoint<T>;
    type IntoIter = std::slice::Iter<'a, TrajectoryPoint<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn from_index<T: Scalar>(i: usize) -> T {
    T::from_usize(i).unwrap_or_else(T::nan)
}

/// Step size `h = (b - a) / steps`.
pub fn step_size<T: Scalar>(interval: (T, T), steps: usize) -> Result<T> {
    if steps == 0 {
        return Err(NumericsError::ZeroSteps);
    }
    let (a, b) = interval;
    Ok((b - a) / from_index(steps))
}

/// Sample times `a, a + h, ..., a + (steps - 1) h`.
pub fn sample_times<T: Scalar>(interval: (T, T), steps: usize) -> Result<Vec<T>> {
    let h = step_size(interval, steps)?;
    let a = interval.0;
    Ok((0..steps).map(|i| a + from_index::<T>(i) * h).collect())
}

/// Integrates `x' = f(x, t)` over `interval` with a fixed number of steps.
pub fn integrate<T: Scalar>(
    f: &impl OdeFunction<T>,
    y0: T,
    interval: (T, T),
    settings: &IntegrationSettings,
) -> Result<Trajectory<T>> {
    let h = step_size(interval, settings.steps)?;
    let times = sample_times(interval, settings.steps)?;
    let stepper = settings.order.stepper();

    let mut x = match settings.initial_value {
        InitialValue::Supplied => y0,
        InitialValue::LegacyZero => T::zero(),
    };
    let mut points = Vec::with_capacity(times.len());
    for t in times {
        points.push(TrajectoryPoint { t, x });
        x = stepper.step(f, t, x, h);
    }

    let terminal = TrajectoryPoint {
        t: interval.0 + from_index::<T>(settings.steps) * h,
        x,
    };
    tracing::debug!(
        steps = settings.steps,
        order = u32::from(settings.order),
        terminal = ?terminal.x,
        "fixed-step integration finished"
    );

    Ok(Trajectory { points, terminal })
}

/// Convenience wrapper taking the order as a number (1, 2 or 4) and starting
/// from `y0`.
pub fn solve<T: Scalar>(
    f: &impl OdeFunction<T>,
    y0: T,
    interval: (T, T),
    steps: usize,
    order: u32,
) -> Result<Trajectory<T>> {
    let settings = IntegrationSettings {
        steps,
        order: Order::try_from(order)?,
        initial_value: InitialValue::Supplied,
    };
    integrate(f, y0, interval, &settings)
}
