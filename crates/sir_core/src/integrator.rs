use crate::error::{invalid, SimulationResult};
use crate::solvers::ForwardEuler;
use crate::traits::{DynamicalSystem, Steppable};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of steps a single run may take.
pub const MAX_STEPS: usize = 100_000_000;

// Slack, in ulps of (t_end - t_start) / h, when deciding whether the ratio is a
// whole number, so that 0.3 / 0.1 counts as 3 steps rather than 2.
const STEP_COUNT_ULPS: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Horizon {
    pub t_start: f64,
    pub t_end: f64,
}

impl Default for Horizon {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            t_end: 50.0,
        }
    }
}

impl Horizon {
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t_start && t <= self.t_end
    }

    pub fn span(&self) -> f64 {
        self.t_end - self.t_start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationSettings {
    pub step_size: f64,
    pub horizon: Horizon,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            step_size: 1.0,
            horizon: Horizon::default(),
        }
    }
}

impl IntegrationSettings {
    pub fn new(step_size: f64, horizon: Horizon) -> Self {
        Self { step_size, horizon }
    }

    /// Validates the settings and returns the number of steps they imply.
    pub fn step_count(&self) -> SimulationResult<usize> {
        let h = self.step_size;
        if !h.is_finite() || h <= 0.0 {
            return Err(invalid(format!(
                "step size must be positive and finite, got {h}"
            )));
        }
        let Horizon { t_start, t_end } = self.horizon;
        if !t_start.is_finite() || !t_end.is_finite() {
            return Err(invalid("horizon bounds must be finite"));
        }
        if t_end <= t_start {
            return Err(invalid(format!(
                "horizon end ({t_end}) must be greater than start ({t_start})"
            )));
        }

        let ratio = self.horizon.span() / h;
        if !ratio.is_finite() || ratio > MAX_STEPS as f64 {
            return Err(invalid(format!(
                "step size {h} over [{t_start}, {t_end}] exceeds {MAX_STEPS} steps"
            )));
        }
        let nearest = ratio.round();
        let steps = if (ratio - nearest).abs() <= STEP_COUNT_ULPS * f64::EPSILON * ratio {
            nearest
        } else {
            ratio.floor()
        };
        Ok(steps as usize)
    }
}

/// Discretized solution of one run.
///
/// `states` is row-major with `dimension` columns; row `k` is the state at
/// `times[k] = t_start + k * step_size`. Row 0 is the initial condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    dimension: usize,
    step_size: f64,
    horizon: Horizon,
    times: Vec<f64>,
    states: Vec<f64>,
}

impl Trajectory {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Flat row-major state storage.
    pub fn states(&self) -> &[f64] {
        &self.states
    }

    /// Number of recorded points (steps + 1).
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// State row at `index`. Panics if `index >= len()`, like slice indexing.
    pub fn state(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.states[start..start + self.dimension]
    }

    pub fn final_state(&self) -> &[f64] {
        self.state(self.len() - 1)
    }

    /// Iterates `(t, state)` pairs in time order.
    pub fn rows(&self) -> impl Iterator<Item = (f64, &[f64])> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.states.chunks_exact(self.dimension))
    }
}

/// Integrates `system` from `initial_state` over the settings' horizon with
/// fixed-step forward Euler.
///
/// All validation happens before the first step; no partial trajectory is
/// ever returned. The final time stamp is the last whole step that fits in
/// the horizon, so it may fall short of `t_end`.
pub fn integrate<S>(
    system: &S,
    initial_state: &[f64],
    settings: &IntegrationSettings,
) -> SimulationResult<Trajectory>
where
    S: DynamicalSystem<f64>,
{
    let dim = system.dimension();
    if dim == 0 {
        return Err(invalid("system has zero dimension"));
    }
    if initial_state.len() != dim {
        return Err(invalid(format!(
            "initial state dimension mismatch: expected {}, got {}",
            dim,
            initial_state.len()
        )));
    }
    if initial_state.iter().any(|v| !v.is_finite()) {
        return Err(invalid("initial state must be finite"));
    }
    let steps = settings.step_count()?;

    let h = settings.step_size;
    let t_start = settings.horizon.t_start;
    let mut times = Vec::with_capacity(steps + 1);
    let mut states = Vec::with_capacity((steps + 1) * dim);
    times.push(t_start);
    states.extend_from_slice(initial_state);

    let mut solver = ForwardEuler::new(dim);
    let mut state = initial_state.to_vec();
    let mut t = t_start;
    let mut diverged = false;

    for k in 1..=steps {
        solver.step(system, &mut t, &mut state, h);
        // Re-anchor to the grid so spacing stays exactly h.
        t = t_start + k as f64 * h;
        times.push(t);
        states.extend_from_slice(&state);

        if !diverged && state.iter().any(|v| !v.is_finite()) {
            diverged = true;
            warn!("state became non-finite at t = {t} (h = {h})");
        }
    }

    debug!(
        "integrated {} steps of h = {} over [{}, {}]",
        steps, h, t_start, settings.horizon.t_end
    );

    Ok(Trajectory {
        dimension: dim,
        step_size: h,
        horizon: settings.horizon,
        times,
        states,
    })
}

#[cfg(test)]
mod tests {
    use super::{integrate, Horizon, IntegrationSettings, MAX_STEPS};
    use crate::error::SimulationError;
    use crate::traits::RateFn;

    fn decay(rate: f64) -> RateFn<impl Fn(f64, &[f64], &mut [f64])> {
        RateFn::new(1, move |_t: f64, x: &[f64], out: &mut [f64]| {
            out[0] = -rate * x[0];
        })
    }

    fn settings(step_size: f64, t_start: f64, t_end: f64) -> IntegrationSettings {
        IntegrationSettings::new(step_size, Horizon { t_start, t_end })
    }

    fn assert_invalid<T: std::fmt::Debug>(result: Result<T, SimulationError>, needle: &str) {
        let err = result.expect_err("expected error");
        assert!(
            matches!(err, SimulationError::InvalidConfiguration(_)),
            "expected InvalidConfiguration, got {err:?}"
        );
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn trajectory_length_matches_floor_of_span_over_step() {
        let system = decay(1.0);
        let cases = [
            (1.0, 0.0, 50.0, 51),
            (0.1, 0.0, 50.0, 501),
            (0.3, 0.0, 1.0, 4),
            (0.4, 0.0, 1.0, 3),
            (0.7, 2.0, 3.0, 2),
            (5.0, 0.0, 1.0, 1),
        ];
        for (h, t0, t1, expected) in cases {
            let trajectory =
                integrate(&system, &[1.0], &settings(h, t0, t1)).expect("integration succeeds");
            assert_eq!(trajectory.len(), expected, "h = {h}, horizon = [{t0}, {t1}]");
            assert_eq!(trajectory.states().len(), expected);
        }
    }

    #[test]
    fn near_integer_ratio_with_real_remainder_is_floored() {
        // span / h = 999_999.9995: close to an integer but not round-off.
        let t_end = 99_999.999_95;
        let trajectory = integrate(&decay(1.0), &[1.0], &settings(0.1, 0.0, t_end))
            .expect("integration succeeds");
        assert_eq!(trajectory.len(), 1_000_000);
        let last = *trajectory.times().last().expect("non-empty");
        assert!(last <= t_end, "last stamp {last} is past {t_end}");

        // 0.3 / 0.1 evaluates to 2.9999999999999996 and still gives three steps.
        let trajectory = integrate(&decay(1.0), &[1.0], &settings(0.1, 0.0, 0.3))
            .expect("integration succeeds");
        assert_eq!(trajectory.len(), 4);
    }

    #[test]
    fn times_start_at_horizon_and_keep_constant_spacing() {
        let system = decay(1.0);
        let trajectory =
            integrate(&system, &[1.0], &settings(0.1, 2.0, 7.0)).expect("integration succeeds");
        let times = trajectory.times();
        assert_eq!(times[0], 2.0);
        for (k, t) in times.iter().enumerate() {
            assert_eq!(*t, 2.0 + k as f64 * 0.1);
        }
        for pair in times.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!((pair[1] - pair[0] - 0.1).abs() < 1e-12);
        }
        assert!(trajectory.times().last().copied().unwrap_or_default() <= 7.0 + 1e-12);
    }

    #[test]
    fn initial_row_is_exact_copy_of_initial_state() {
        let system = RateFn::new(3, |_t: f64, x: &[f64], out: &mut [f64]| {
            out.copy_from_slice(x);
        });
        let initial = [0.123456789, -4.5, 1e-300];
        let trajectory =
            integrate(&system, &initial, &settings(0.5, 0.0, 2.0)).expect("integration succeeds");
        assert_eq!(trajectory.dimension(), 3);
        assert_eq!(trajectory.state(0), &initial);
    }

    #[test]
    fn linear_decay_matches_closed_form_euler_iterates() {
        let h = 0.1;
        let system = decay(1.0);
        let trajectory =
            integrate(&system, &[1.0], &settings(h, 0.0, 1.0)).expect("integration succeeds");
        for (k, (_, row)) in trajectory.rows().enumerate() {
            let expected = (1.0 - h).powi(k as i32);
            assert!((row[0] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn linear_decay_global_error_is_first_order() {
        let system = decay(1.0);
        let exact = (-1.0_f64).exp();
        let error = |h: f64| {
            let trajectory =
                integrate(&system, &[1.0], &settings(h, 0.0, 1.0)).expect("integration succeeds");
            (trajectory.final_state()[0] - exact).abs()
        };
        let coarse = error(0.02);
        let fine = error(0.01);
        let ratio = coarse / fine;
        assert!(ratio > 1.8 && ratio < 2.2, "error ratio {ratio}");
    }

    #[test]
    fn identical_runs_are_bit_identical() {
        let system = RateFn::new(2, |_t: f64, x: &[f64], out: &mut [f64]| {
            out[0] = -0.8 * x[0] * x[1];
            out[1] = 0.8 * x[0] * x[1] - 0.2 * x[1];
        });
        let config = settings(0.1, 0.0, 50.0);
        let a = integrate(&system, &[0.98, 0.01], &config).expect("first run");
        let b = integrate(&system, &[0.98, 0.01], &config).expect("second run");
        assert_eq!(a.times(), b.times());
        for (x, y) in a.states().iter().zip(b.states()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn mass_is_conserved_without_removal() {
        let system = RateFn::new(2, |_t: f64, x: &[f64], out: &mut [f64]| {
            let contact = 0.8 * x[0] * x[1];
            out[0] = -contact;
            out[1] = contact;
        });
        for h in [1.0, 0.1] {
            let trajectory = integrate(&system, &[0.98, 0.01], &settings(h, 0.0, 50.0))
                .expect("integration succeeds");
            for (_, row) in trajectory.rows() {
                assert!((row[0] + row[1] - 0.99).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn overshoot_is_preserved_without_clamping() {
        // h * rate > 1 makes forward Euler flip sign.
        let system = decay(3.0);
        let trajectory =
            integrate(&system, &[1.0], &settings(1.0, 0.0, 2.0)).expect("integration succeeds");
        assert_eq!(trajectory.state(1)[0], -2.0);
        assert_eq!(trajectory.state(2)[0], 4.0);
    }

    #[test]
    fn integrate_rejects_invalid_step_size() {
        let system = decay(1.0);
        assert_invalid(integrate(&system, &[1.0], &settings(0.0, 0.0, 1.0)), "step size");
        assert_invalid(integrate(&system, &[1.0], &settings(-0.1, 0.0, 1.0)), "step size");
        assert_invalid(
            integrate(&system, &[1.0], &settings(f64::NAN, 0.0, 1.0)),
            "step size",
        );
    }

    #[test]
    fn integrate_rejects_inverted_or_empty_horizon() {
        let system = decay(1.0);
        assert_invalid(integrate(&system, &[1.0], &settings(0.1, 1.0, 0.0)), "horizon");
        assert_invalid(integrate(&system, &[1.0], &settings(0.1, 1.0, 1.0)), "horizon");
        assert_invalid(
            integrate(&system, &[1.0], &settings(0.1, 0.0, f64::INFINITY)),
            "finite",
        );
    }

    #[test]
    fn integrate_rejects_state_mismatch_and_step_overflow() {
        let system = decay(1.0);
        assert_invalid(
            integrate(&system, &[1.0, 2.0], &settings(0.1, 0.0, 1.0)),
            "dimension mismatch",
        );
        assert_invalid(
            integrate(&system, &[f64::NAN], &settings(0.1, 0.0, 1.0)),
            "finite",
        );
        assert_invalid(
            integrate(&system, &[1.0], &settings(1e-12, 0.0, 50.0)),
            &MAX_STEPS.to_string(),
        );
    }
}
