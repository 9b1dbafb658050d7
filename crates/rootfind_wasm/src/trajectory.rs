//! Fixed-step integration entry point, producing plot-ready series.

use crate::js_error;
use anyhow::{Context, Result};
use rootfind_core::expression::Expression;
use rootfind_core::integrate::{integrate as core_integrate, IntegrationSettings};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// A trajectory laid out for a line chart of `x(t)` against `t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSeries {
    pub x_label: String,
    pub y_label: String,
    pub t: Vec<f64>,
    pub x: Vec<f64>,
    /// `(t, x)` after the last step, just past the sampled range.
    pub terminal: (f64, f64),
}

pub(crate) fn run_integration(
    expression: &str,
    y0: f64,
    interval: (f64, f64),
    settings: &IntegrationSettings,
) -> Result<PlotSeries> {
    let f = Expression::<f64>::ode(expression, "x", "t")
        .with_context(|| format!("Failed to compile derivative '{expression}'"))?;
    let trajectory = core_integrate(&f, y0, interval, settings).context("Integration failed")?;
    let terminal = trajectory.terminal();

    Ok(PlotSeries {
        x_label: "t".to_string(),
        y_label: "x(t)".to_string(),
        t: trajectory.times(),
        x: trajectory.values(),
        terminal: (terminal.t, terminal.x),
    })
}

/// Integrates `x' = expression(x, t)` from `x(a) = y0` over `[a, b)`.
///
/// `settings` is a partial `IntegrationSettings` object, e.g.
/// `{ steps: 200, order: 4 }`, or `undefined` for the defaults.
#[wasm_bindgen]
pub fn integrate(
    expression: &str,
    y0: f64,
    a: f64,
    b: f64,
    settings: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let settings: IntegrationSettings = if settings.is_undefined() || settings.is_null() {
        IntegrationSettings::default()
    } else {
        from_value(settings)
            .map_err(|e| JsValue::from_str(&format!("Invalid integration settings: {}", e)))?
    };

    let series = run_integration(expression, y0, (a, b), &settings).map_err(js_error)?;
    to_value(&series).map_err(|e| JsValue::from_str(&format!("Failed to serialize trajectory: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rootfind_core::integrate::{InitialValue, Order};

    fn settings(steps: usize, order: Order) -> IntegrationSettings {
        IntegrationSettings {
            steps,
            order,
            initial_value: InitialValue::Supplied,
        }
    }

    #[test]
    fn run_integration_labels_axes_and_samples_half_open_range() {
        let series = run_integration("1", 0.0, (0.0, 1.0), &settings(10, Order::Euler))
            .expect("integration should run");
        assert_eq!(series.x_label, "t");
        assert_eq!(series.y_label, "x(t)");
        assert_eq!(series.t.len(), 10);
        assert_eq!(series.x.len(), 10);
        assert!(series.t.iter().all(|&t| t < 1.0));
        assert!((series.terminal.1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn run_integration_uses_time_variable() {
        let series = run_integration("2*t", 0.0, (0.0, 1.0), &settings(4, Order::RungeKutta4))
            .expect("integration should run");
        for (t, x) in series.t.iter().zip(&series.x) {
            assert!((x - t * t).abs() < 1e-12);
        }
    }

    #[test]
    fn run_integration_honours_legacy_zero_start() {
        let legacy = IntegrationSettings {
            initial_value: InitialValue::LegacyZero,
            ..settings(5, Order::Midpoint)
        };
        let series = run_integration("0", 7.0, (0.0, 1.0), &legacy).expect("integration should run");
        assert!(series.x.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn run_integration_rejects_zero_steps() {
        let err = run_integration("x", 1.0, (0.0, 1.0), &settings(0, Order::Euler))
            .expect_err("zero steps should fail");
        assert!(format!("{err:#}").contains("step count must be at least 1"));
    }

    #[test]
    fn run_integration_surfaces_compile_errors() {
        let err = run_integration("x +", 1.0, (0.0, 1.0), &IntegrationSettings::default())
            .expect_err("parse error should fail");
        assert!(format!("{err:#}").contains("Failed to compile derivative"));
    }
}
