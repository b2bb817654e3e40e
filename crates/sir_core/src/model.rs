//! Two-compartment susceptible/infected model.
//!
//!   ds/dt = -λ s i
//!   di/dt =  λ s i - μ i
//!
//! The removed fraction is implied as `1 - s - i`.

use crate::error::{invalid, SimulationResult};
use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};

/// Transmission rate λ and removal rate μ, fixed for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SirParameters {
    transmission_rate: f64,
    removal_rate: f64,
}

impl SirParameters {
    /// Requires λ ∈ (0, 1] and μ > 0.
    pub fn new(transmission_rate: f64, removal_rate: f64) -> SimulationResult<Self> {
        if !transmission_rate.is_finite() || transmission_rate <= 0.0 || transmission_rate > 1.0 {
            return Err(invalid(format!(
                "transmission rate must lie in (0, 1], got {transmission_rate}"
            )));
        }
        if !removal_rate.is_finite() || removal_rate <= 0.0 {
            return Err(invalid(format!(
                "removal rate must be positive, got {removal_rate}"
            )));
        }
        Ok(Self {
            transmission_rate,
            removal_rate,
        })
    }

    pub fn transmission_rate(&self) -> f64 {
        self.transmission_rate
    }

    pub fn removal_rate(&self) -> f64 {
        self.removal_rate
    }
}

/// Affine map from two small integer indices to (λ, μ):
/// `λ = base_transmission - transmission_slope * n`,
/// `μ = base_removal + removal_slope * m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub base_transmission: f64,
    pub transmission_slope: f64,
    pub base_removal: f64,
    pub removal_slope: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            base_transmission: 1.0,
            transmission_slope: 0.1,
            base_removal: 0.1,
            removal_slope: 0.005,
        }
    }
}

impl Calibration {
    pub fn parameters(&self, n: u32, m: u32) -> SimulationResult<SirParameters> {
        SirParameters::new(
            self.base_transmission - self.transmission_slope * f64::from(n),
            self.base_removal + self.removal_slope * f64::from(m),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SirState {
    pub susceptible: f64,
    pub infected: f64,
}

impl SirState {
    pub fn new(susceptible: f64, infected: f64) -> Self {
        Self {
            susceptible,
            infected,
        }
    }

    /// Reads a `[s, i]` trajectory row.
    ///
    /// # Panics
    ///
    /// Panics if `row` has fewer than two entries.
    pub fn from_row(row: &[f64]) -> Self {
        Self::new(row[0], row[1])
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.susceptible, self.infected]
    }

    pub fn removed(&self) -> f64 {
        1.0 - self.susceptible - self.infected
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirModel {
    pub params: SirParameters,
}

impl SirModel {
    pub const SUSCEPTIBLE: usize = 0;
    pub const INFECTED: usize = 1;

    pub fn new(params: SirParameters) -> Self {
        Self { params }
    }

    /// Returns `(ds/dt, di/dt)`. Total over the reals; out-of-range states
    /// are evaluated as-is.
    pub fn rate(&self, state: SirState) -> (f64, f64) {
        let lambda = self.params.transmission_rate;
        let mu = self.params.removal_rate;
        let contact = lambda * state.susceptible * state.infected;
        (-contact, contact - mu * state.infected)
    }

    /// λ / μ
    pub fn basic_reproduction_number(&self) -> f64 {
        self.params.transmission_rate / self.params.removal_rate
    }

    /// True while the infected fraction is increasing (λ s > μ, for i > 0).
    pub fn epidemic_grows(&self, state: SirState) -> bool {
        let (_, di) = self.rate(state);
        di > 0.0
    }

    /// `s + i - (μ/λ) ln s`, constant along exact solutions of the flow.
    /// Undefined (NaN or infinite) for `s <= 0`.
    pub fn first_integral(&self, state: SirState) -> f64 {
        let ratio = self.params.removal_rate / self.params.transmission_rate;
        state.susceptible + state.infected - ratio * state.susceptible.ln()
    }
}

impl<T: Scalar> DynamicalSystem<T> for SirModel {
    fn dimension(&self) -> usize {
        2
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let lambda = T::from_f64(self.params.transmission_rate).unwrap_or_else(T::nan);
        let mu = T::from_f64(self.params.removal_rate).unwrap_or_else(T::nan);
        let contact = lambda * x[0] * x[1];
        out[0] = -contact;
        out[1] = contact - mu * x[1];
    }
}
