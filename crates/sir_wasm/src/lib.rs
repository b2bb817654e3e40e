//! WASM bridge: configured SIR runs and their plot series for a JS front-end.

use js_sys::Float64Array;
use serde_wasm_bindgen::{from_value, to_value};
use sir_core::reporter::PlotData;
use sir_core::{ConfiguredRun, IntegratedRun, SimulationConfig, SimulationError};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmSimulation {
    config: SimulationConfig,
}

fn to_js_error(err: SimulationError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

impl WasmSimulation {
    fn integrate(&self, step_size: f64) -> Result<IntegratedRun, SimulationError> {
        ConfiguredRun::from_config(&self.config, step_size)?.integrate()
    }

    fn state_at(&self, step_size: f64, t: f64) -> Result<[f64; 2], SimulationError> {
        Ok(self.integrate(step_size)?.sample_at(t)?.to_array())
    }
}

#[wasm_bindgen]
impl WasmSimulation {
    /// `config` is a plain object with any subset of the configuration fields;
    /// `undefined` or `null` gives the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmSimulation, JsValue> {
        console_error_panic_hook::set_once();

        let config = if config.is_undefined() || config.is_null() {
            SimulationConfig::default()
        } else {
            from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        config.validate().map_err(to_js_error)?;
        Ok(WasmSimulation { config })
    }

    pub fn step_sizes(&self) -> Vec<f64> {
        self.config.step_sizes.clone()
    }

    /// Plot series (infected and susceptible vs time, phase) for one step size.
    pub fn run(&self, step_size: f64) -> Result<JsValue, JsValue> {
        let run = self.integrate(step_size).map_err(to_js_error)?;
        let plot = PlotData::from_trajectory(run.trajectory());
        to_value(&plot).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// `[s, i]` at the grid point nearest `t`.
    pub fn sample_at(&self, step_size: f64, t: f64) -> Result<Float64Array, JsValue> {
        let state = self.state_at(step_size, t).map_err(to_js_error)?;
        Ok(Float64Array::from(&state[..]))
    }
}
