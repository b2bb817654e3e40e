pub mod config;
pub mod error;
pub mod integrator;
pub mod model;
pub mod reporter;
pub mod simulation;
pub mod solvers;
/// The `sir_core` crate is a fixed-step explicit integration engine for
/// first-order ODE systems, with a susceptible/infected epidemic model as its
/// main instantiation.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `DynamicalSystem` (right-hand sides), `Steppable` (solvers), `RateFn` (closure adapter).
/// - **Solvers**: `ForwardEuler`, the only stepping scheme; truncation error is meant to be visible.
/// - **Integrator**: validates a horizon and step size, then records the full trajectory.
/// - **Model**: SIR rate function, calibration of (λ, μ), and the flow's first integral.
/// - **Reporter / Simulation**: checkpoint sampling, plot views, and the configured → integrated → reported run pipeline.
pub mod traits;

pub use config::SimulationConfig;
pub use error::{SimulationError, SimulationResult};
pub use integrator::{integrate, Horizon, IntegrationSettings, Trajectory};
pub use model::{Calibration, SirModel, SirParameters, SirState};
pub use simulation::{compare, run_all, ConfiguredRun, IntegratedRun, Report};
