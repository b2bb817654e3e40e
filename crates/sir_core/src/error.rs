use thiserror::Error;

/// Failures raised by the integration engine and the reporter.
///
/// Both are local to one run: nothing has been integrated (or sampled) when
/// they are returned, and retrying with the same inputs gives the same result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Step size, horizon, or initial condition rejected before stepping.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A checkpoint time outside the integrated horizon.
    #[error("time {t} is outside the integrated horizon [{t_start}, {t_end}]")]
    OutOfRange { t: f64, t_start: f64, t_end: f64 },
}

pub type SimulationResult<T> = Result<T, SimulationError>;

pub(crate) fn invalid(message: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfiguration(message.into())
}
