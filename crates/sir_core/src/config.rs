use crate::error::{invalid, SimulationResult};
use crate::integrator::{Horizon, IntegrationSettings};
use crate::model::{Calibration, SirParameters, SirState};
use crate::reporter::DEFAULT_CHECKPOINTS;
use serde::{Deserialize, Serialize};

// Slack on s0 + i0 <= 1 for decimal inputs such as 0.7 + 0.3.
const MASS_TOLERANCE: f64 = 1e-12;

/// Everything needed to set up one or more runs of the SIR comparison.
///
/// Every field has a default, so an empty JSON object reproduces the
/// classic setup: h = 1.0 and h = 0.1 over [0, 50], n = 2, m = 20
/// (λ = 0.8, μ = 0.2), s0 = 0.98, i0 = 0.01.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub step_sizes: Vec<f64>,
    pub horizon: Horizon,
    pub calibration: Calibration,
    /// `n` in `λ = base_transmission - transmission_slope * n`.
    pub transmission_index: u32,
    /// `m` in `μ = base_removal + removal_slope * m`.
    pub removal_index: u32,
    pub initial: SirState,
    pub checkpoints: Vec<f64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_sizes: vec![1.0, 0.1],
            horizon: Horizon::default(),
            calibration: Calibration::default(),
            transmission_index: 2,
            removal_index: 20,
            initial: SirState::new(0.98, 0.01),
            checkpoints: DEFAULT_CHECKPOINTS.to_vec(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(text: &str) -> SimulationResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| invalid(format!("malformed configuration: {err}")))
    }

    pub fn parameters(&self) -> SimulationResult<SirParameters> {
        self.calibration
            .parameters(self.transmission_index, self.removal_index)
    }

    pub fn settings(&self, step_size: f64) -> IntegrationSettings {
        IntegrationSettings::new(step_size, self.horizon)
    }

    /// Checks every run this configuration describes, before any of them starts.
    pub fn validate(&self) -> SimulationResult<()> {
        if self.step_sizes.is_empty() {
            return Err(invalid("at least one step size is required"));
        }
        for &h in &self.step_sizes {
            self.settings(h).step_count()?;
        }
        self.parameters()?;
        validate_initial_state(self.initial)?;
        if self.checkpoints.iter().any(|t| !t.is_finite()) {
            return Err(invalid("checkpoint times must be finite"));
        }
        Ok(())
    }
}

/// Requires finite, non-negative fractions with `s0 + i0 <= 1`.
pub fn validate_initial_state(initial: SirState) -> SimulationResult<()> {
    let SirState {
        susceptible,
        infected,
    } = initial;
    if !susceptible.is_finite() || !infected.is_finite() {
        return Err(invalid("initial fractions must be finite"));
    }
    if susceptible < 0.0 || infected < 0.0 {
        return Err(invalid(format!(
            "initial fractions must be non-negative, got s0 = {susceptible}, i0 = {infected}"
        )));
    }
    if susceptible + infected > 1.0 + MASS_TOLERANCE {
        return Err(invalid(format!(
            "initial fractions exceed the population: s0 + i0 = {}",
            susceptible + infected
        )));
    }
    Ok(())
}
