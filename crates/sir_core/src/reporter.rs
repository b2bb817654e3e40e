//! Read-only views over a finished [`Trajectory`]: checkpoint lookup, time
//! and phase series, and step-size comparison helpers. Nothing here
//! recomputes or interpolates.

use crate::error::{SimulationError, SimulationResult};
use crate::integrator::Trajectory;
use crate::model::SirModel;
use serde::Serialize;

/// Checkpoint times used by the default report.
pub const DEFAULT_CHECKPOINTS: [f64; 5] = [10.0, 20.0, 30.0, 40.0, 50.0];

/// Returns the recorded state nearest to `t_target`.
///
/// The row index is `round((t_target - t_start) / h)`. When the horizon was
/// not a whole number of steps, times past the last grid point map to the
/// final row.
pub fn sample_at(trajectory: &Trajectory, t_target: f64) -> SimulationResult<&[f64]> {
    let index = index_at(trajectory, t_target)?;
    Ok(trajectory.state(index))
}

fn index_at(trajectory: &Trajectory, t_target: f64) -> SimulationResult<usize> {
    let horizon = trajectory.horizon();
    if !t_target.is_finite() || !horizon.contains(t_target) {
        return Err(SimulationError::OutOfRange {
            t: t_target,
            t_start: horizon.t_start,
            t_end: horizon.t_end,
        });
    }
    let offset = (t_target - horizon.t_start) / trajectory.step_size();
    let index = offset.round() as usize;
    Ok(index.min(trajectory.len() - 1))
}

/// `(t, x_component)` pairs in time order.
///
/// # Panics
/// If `component >= trajectory.dimension()`.
pub fn time_series(
    trajectory: &Trajectory,
    component: usize,
) -> impl Iterator<Item = (f64, f64)> + '_ {
    assert!(
        component < trajectory.dimension(),
        "component {component} out of range for dimension {}",
        trajectory.dimension()
    );
    trajectory.rows().map(move |(t, row)| (t, row[component]))
}

/// `(x_component, y_component)` pairs in time order, for phase-plane plots.
///
/// # Panics
/// If either component is `>= trajectory.dimension()`.
pub fn phase_series(
    trajectory: &Trajectory,
    x_component: usize,
    y_component: usize,
) -> impl Iterator<Item = (f64, f64)> + '_ {
    let dim = trajectory.dimension();
    assert!(
        x_component < dim && y_component < dim,
        "phase components ({x_component}, {y_component}) out of range for dimension {dim}"
    );
    trajectory
        .rows()
        .map(move |(_, row)| (row[x_component], row[y_component]))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    /// Requested time.
    pub time: f64,
    /// Time stamp of the row actually returned.
    pub grid_time: f64,
    pub index: usize,
    pub state: Vec<f64>,
}

pub fn checkpoints(trajectory: &Trajectory, times: &[f64]) -> SimulationResult<Vec<Checkpoint>> {
    times
        .iter()
        .map(|&time| {
            let index = index_at(trajectory, time)?;
            Ok(Checkpoint {
                time,
                grid_time: trajectory.times()[index],
                index,
                state: trajectory.state(index).to_vec(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peak {
    pub index: usize,
    pub time: f64,
    pub value: f64,
}

/// Largest recorded value of `component`; the earliest row wins ties.
pub fn peak(trajectory: &Trajectory, component: usize) -> Peak {
    let mut best = Peak {
        index: 0,
        time: trajectory.times()[0],
        value: trajectory.state(0)[component],
    };
    for (index, (time, value)) in time_series(trajectory, component).enumerate() {
        if value > best.value {
            best = Peak { index, time, value };
        }
    }
    best
}

/// Largest `|a(t) - b(t)|` for `component` over the given checkpoint times.
pub fn max_deviation(
    a: &Trajectory,
    b: &Trajectory,
    component: usize,
    times: &[f64],
) -> SimulationResult<f64> {
    let mut worst = 0.0_f64;
    for &t in times {
        let diff = (sample_at(a, t)?[component] - sample_at(b, t)?[component]).abs();
        worst = worst.max(diff);
    }
    Ok(worst)
}

/// The three series handed to a plotting front-end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotData {
    pub step_size: f64,
    pub infected_vs_time: Vec<[f64; 2]>,
    pub susceptible_vs_time: Vec<[f64; 2]>,
    /// `[s, i]` pairs.
    pub phase: Vec<[f64; 2]>,
}

impl PlotData {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        let series = |component: usize| -> Vec<[f64; 2]> {
            time_series(trajectory, component)
                .map(|(t, v)| [t, v])
                .collect()
        };
        Self {
            step_size: trajectory.step_size(),
            infected_vs_time: series(SirModel::INFECTED),
            susceptible_vs_time: series(SirModel::SUSCEPTIBLE),
            phase: phase_series(trajectory, SirModel::SUSCEPTIBLE, SirModel::INFECTED)
                .map(|(s, i)| [s, i])
                .collect(),
        }
    }
}
