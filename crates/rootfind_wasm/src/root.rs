//! Bisection entry point.

use crate::js_error;
use anyhow::{Context, Result};
use rootfind_core::bisection::{
    bisection, BisectionIterate, BisectionOutcome, BisectionSettings, Silent,
};
use rootfind_core::expression::Expression;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootOptions {
    pub tolerance: f64,
    pub max_iterations: Option<usize>,
    /// Collect one line of text per iteration into `RootReport::trace`.
    pub verbose: bool,
}

impl Default for RootOptions {
    fn default() -> Self {
        let settings = BisectionSettings::default();
        Self {
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
            verbose: false,
        }
    }
}

impl RootOptions {
    fn settings(&self) -> BisectionSettings {
        BisectionSettings {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootReport {
    pub root: f64,
    pub iterations: usize,
    pub lower: f64,
    pub upper: f64,
    pub trace: Vec<String>,
}

fn trace_line(iterate: &BisectionIterate<f64>) -> String {
    format!(
        "iteration {} (bisection): interval ({}, {}) root {}",
        iterate.iteration, iterate.lower, iterate.upper, iterate.midpoint
    )
}

/// Returns `None` when the expression does not change sign on the interval.
pub(crate) fn run_bisection(
    expression: &str,
    variable: &str,
    interval: (f64, f64),
    options: &RootOptions,
) -> Result<Option<RootReport>> {
    let f = Expression::<f64>::univariate(expression, variable)
        .with_context(|| format!("Failed to compile expression '{expression}'"))?;
    let settings = options.settings();

    let mut trace = Vec::new();
    let searched = if options.verbose {
        let mut record = |iterate: &BisectionIterate<f64>| trace.push(trace_line(iterate));
        bisection(&f, interval, &settings, &mut record)
    } else {
        bisection(&f, interval, &settings, &mut Silent)
    };
    let outcome = searched.context("Bisection failed")?;

    Ok(match outcome {
        BisectionOutcome::Converged(result) => Some(RootReport {
            root: result.root,
            iterations: result.iterations,
            lower: result.lower,
            upper: result.upper,
            trace,
        }),
        BisectionOutcome::NoSignChange => None,
    })
}

/// Finds a root of `expression` (a function of `variable`) on `[xa, xb]`.
///
/// Resolves to a `RootReport` object, or `null` if there is no sign change.
/// `options` may be `undefined` to use the defaults.
#[wasm_bindgen]
pub fn find_root(
    expression: &str,
    variable: &str,
    xa: f64,
    xb: f64,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let options: RootOptions = if options.is_undefined() || options.is_null() {
        RootOptions::default()
    } else {
        from_value(options)
            .map_err(|e| JsValue::from_str(&format!("Invalid root options: {}", e)))?
    };

    match run_bisection(expression, variable, (xa, xb), &options).map_err(js_error)? {
        Some(report) => to_value(&report)
            .map_err(|e| JsValue::from_str(&format!("Failed to serialize root: {}", e))),
        None => Ok(JsValue::NULL),
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[derive(Deserialize)]
    struct ReportView {
        root: f64,
        iterations: usize,
    }

    #[wasm_bindgen_test]
    fn find_root_returns_report_object() {
        let value = find_root("x - 0.25", "x", -1.0, 1.0, JsValue::UNDEFINED).expect("root");
        let report: ReportView = from_value(value).expect("report");
        assert_eq!(report.root, 0.25);
        assert_eq!(report.iterations, 3);
    }

    #[wasm_bindgen_test]
    fn find_root_returns_null_without_sign_change() {
        let value = find_root("x^2 + 1", "x", -1.0, 1.0, JsValue::UNDEFINED).expect("result");
        assert!(value.is_null());
    }

    #[wasm_bindgen_test]
    fn find_root_rejects_bad_options() {
        let options = to_value(&"not an object").expect("options");
        let result = find_root("x", "x", -1.0, 1.0, options);
        let message = result
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("Invalid root options"));
    }
}
