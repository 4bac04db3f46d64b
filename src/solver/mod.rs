//! Symbolic solver pipeline.
//!
//! This module turns the MNA equations of a circuit into an executable
//! update recipe. The system
//!
//! ```text
//! F(y, dy/dt, t) = 0
//! ```
//!
//! is processed in stages:
//!
//! 1. Equations involving derivatives are solved for `dy/dt` by symbolic
//!    row reduction and discretized with the trapezoidal rule, leaving a
//!    purely algebraic system in the current-step unknowns.
//! 2. Unknowns the algebraic system determines linearly are solved in
//!    closed form and substituted away.
//! 3. The remainder becomes a Newton-Raphson block: a symbolic Jacobian
//!    over per-unknown update deltas, with the linearly occurring deltas
//!    pre-solved symbolically so the runtime only iterates on the truly
//!    nonlinear core.
//!
//! The pieces are reusable on their own: [`LinearCombination`] is one
//! symbolic matrix row, [`SystemOfEquations`] drives the elimination,
//! and [`integrate_trapezoid`] performs the discretization.

pub mod gauss;
pub mod integrate;
pub mod linear_combination;
pub mod solution;
pub mod transient;

pub use gauss::SystemOfEquations;
pub use integrate::integrate_trapezoid;
pub use linear_combination::LinearCombination;
pub use solution::{LinearSolutions, NewtonIteration, SolutionSet, TransientSolution};
pub use transient::CompilerConfig;
