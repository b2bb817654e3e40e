//! One SIR run as a three-stage pipeline:
//! [`ConfiguredRun`] → [`IntegratedRun`] → [`Report`].
//!
//! Each stage consumes the previous one, so a trajectory can never be
//! re-integrated in place; a new run starts from a new `ConfiguredRun`.

use crate::config::{validate_initial_state, SimulationConfig};
use crate::error::SimulationResult;
use crate::integrator::{integrate, IntegrationSettings, Trajectory};
use crate::model::{SirModel, SirParameters, SirState};
use crate::reporter::{checkpoints, max_deviation, peak, sample_at, Peak, PlotData};
use log::{debug, info, warn};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct ConfiguredRun {
    model: SirModel,
    initial: SirState,
    settings: IntegrationSettings,
}

impl ConfiguredRun {
    pub fn new(
        params: SirParameters,
        initial: SirState,
        settings: IntegrationSettings,
    ) -> SimulationResult<Self> {
        validate_initial_state(initial)?;
        settings.step_count()?;
        Ok(Self {
            model: SirModel::new(params),
            initial,
            settings,
        })
    }

    pub fn from_config(config: &SimulationConfig, step_size: f64) -> SimulationResult<Self> {
        Self::new(config.parameters()?, config.initial, config.settings(step_size))
    }

    pub fn integrate(self) -> SimulationResult<IntegratedRun> {
        debug!(
            "h = {}: R0 = {:.3}, infected fraction initially {}",
            self.settings.step_size,
            self.model.basic_reproduction_number(),
            if self.model.epidemic_grows(self.initial) {
                "growing"
            } else {
                "declining"
            }
        );
        let trajectory = integrate(&self.model, &self.initial.to_array(), &self.settings)?;

        let escaped = trajectory
            .rows()
            .find(|(_, row)| row.iter().any(|v| !(0.0..=1.0).contains(v)));
        if let Some((t, row)) = escaped {
            warn!(
                "h = {}: state left [0, 1] at t = {} (s = {}, i = {})",
                self.settings.step_size, t, row[0], row[1]
            );
        }
        info!(
            "h = {}: {} points, final s = {:.6}, i = {:.6}",
            self.settings.step_size,
            trajectory.len(),
            trajectory.final_state()[SirModel::SUSCEPTIBLE],
            trajectory.final_state()[SirModel::INFECTED]
        );

        Ok(IntegratedRun {
            model: self.model,
            trajectory,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IntegratedRun {
    model: SirModel,
    trajectory: Trajectory,
}

impl IntegratedRun {
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn sample_at(&self, t: f64) -> SimulationResult<SirState> {
        sample_at(&self.trajectory, t).map(SirState::from_row)
    }

    /// True if any recorded fraction fell outside [0, 1].
    pub fn left_unit_interval(&self) -> bool {
        self.trajectory
            .states()
            .iter()
            .any(|v| !(0.0..=1.0).contains(v))
    }

    /// Largest `|H(k) - H(0)|` of the first integral along the trajectory.
    /// Zero for the exact flow; grows with the step size under Euler.
    ///
    /// NaN if any row has `s <= 0`, where `H` is undefined; such runs also
    /// report [`left_unit_interval`](Self::left_unit_interval) when `s < 0`.
    pub fn invariant_drift(&self) -> f64 {
        let initial = self.model.first_integral(SirState::from_row(self.trajectory.state(0)));
        let mut drift: f64 = 0.0;
        for (_, row) in self.trajectory.rows() {
            let state = SirState::from_row(row);
            if state.susceptible <= 0.0 {
                return f64::NAN;
            }
            drift = drift.max((self.model.first_integral(state) - initial).abs());
        }
        drift
    }

    pub fn report(self, checkpoint_times: &[f64]) -> SimulationResult<Report> {
        let rows = checkpoints(&self.trajectory, checkpoint_times)?
            .into_iter()
            .map(|checkpoint| {
                let state = SirState::from_row(&checkpoint.state);
                ReportRow {
                    t: checkpoint.time,
                    infected: state.infected,
                    susceptible: state.susceptible,
                    removed: state.removed(),
                }
            })
            .collect();

        Ok(Report {
            params: self.model.params,
            step_size: self.trajectory.step_size(),
            rows,
            peak_infected: peak(&self.trajectory, SirModel::INFECTED),
            invariant_drift: self.invariant_drift(),
            left_unit_interval: self.left_unit_interval(),
            plot: PlotData::from_trajectory(&self.trajectory),
            trajectory: self.trajectory,
        })
    }
}

/// `(t, i(t), s(t))` at one checkpoint, plus the implied removed fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportRow {
    pub t: f64,
    pub infected: f64,
    pub susceptible: f64,
    pub removed: f64,
}

/// Terminal stage of a run: checkpoint rows, plot views, and summary numbers.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub params: SirParameters,
    pub step_size: f64,
    pub rows: Vec<ReportRow>,
    pub peak_infected: Peak,
    pub invariant_drift: f64,
    pub left_unit_interval: bool,
    pub plot: PlotData,
    #[serde(skip)]
    trajectory: Trajectory,
}

impl Report {
    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

/// How far one run strays from a reference run at the checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub reference_step_size: f64,
    pub step_size: f64,
    pub max_infected_deviation: f64,
    pub max_susceptible_deviation: f64,
}

pub fn compare(
    reference: &Report,
    other: &Report,
    checkpoint_times: &[f64],
) -> SimulationResult<Comparison> {
    Ok(Comparison {
        reference_step_size: reference.step_size,
        step_size: other.step_size,
        max_infected_deviation: max_deviation(
            reference.trajectory(),
            other.trajectory(),
            SirModel::INFECTED,
            checkpoint_times,
        )?,
        max_susceptible_deviation: max_deviation(
            reference.trajectory(),
            other.trajectory(),
            SirModel::SUSCEPTIBLE,
            checkpoint_times,
        )?,
    })
}

/// Runs every configured step size, in order. The whole configuration is
/// validated first, so either all runs happen or none do.
pub fn run_all(config: &SimulationConfig) -> SimulationResult<Vec<Report>> {
    config.validate()?;
    config
        .step_sizes
        .iter()
        .map(|&h| {
            ConfiguredRun::from_config(config, h)?
                .integrate()?
                .report(&config.checkpoints)
        })
        .collect()
}
