use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// Numeric type the stepper and models are generic over.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// Right-hand side of a first-order system dx/dt = f(t, x).
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// t: current time
    /// x: current state
    /// out: buffer to write dx/dt into
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A trait for solvers that can step a system forward.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    /// dt: step size
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}

/// Adapts a plain closure into a [`DynamicalSystem`].
///
/// The closure receives `(t, x, out)` and must fill `out` with the derivative.
pub struct RateFn<F> {
    dimension: usize,
    f: F,
}

impl<F> RateFn<F> {
    pub fn new(dimension: usize, f: F) -> Self {
        Self { dimension, f }
    }
}

impl<T, F> DynamicalSystem<T> for RateFn<F>
where
    T: Scalar,
    F: Fn(T, &[T], &mut [T]),
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn apply(&self, t: T, x: &[T], out: &mut [T]) {
        (self.f)(t, x, out)
    }
}

