//! WASM bridge exposing the rootfind core to a JavaScript front end.
//!
//! Functions are passed in as expression strings and results come back as
//! plain JS objects. Plotting happens on the JS side.

use wasm_bindgen::prelude::*;

mod root;
mod trajectory;

pub use root::{find_root, RootOptions, RootReport};
pub use trajectory::{integrate, PlotSeries};

pub(crate) fn js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
