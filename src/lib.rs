//! # Pedalc
//!
//! A symbolic circuit-to-solver compiler for real-time analog effect
//! simulation.
//!
//! This library provides:
//! - A symbolic algebra kernel (expressions, differentiation,
//!   substitution, factoring, numeric root finding)
//! - Symbolic Gaussian elimination over expression-valued matrix rows
//! - Trapezoidal discretization of the differential MNA equations
//! - A compiler that partitions the system into closed-form updates and
//!   a per-sample Newton-Raphson block
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`algebra`] - Expression trees and the operations over them
//! - [`analysis`] - The circuit analysis artifact consumed as input
//! - [`solver`] - Row reduction, integration, and the transient compiler
//! - [`log`] - The logging sink handed to the compiler
//!
//! ## Usage
//!
//! ```no_run
//! use pedalc::{Analysis, NullLog, TransientSolution};
//!
//! # fn build_analysis() -> Analysis { Analysis::new() }
//! let analysis: Analysis = build_analysis();
//! let solution = TransientSolution::solve(&analysis, 1.0 / 48000.0, &NullLog)?;
//! for set in solution.solutions() {
//!     // hand each solution set to the per-sample runtime
//! }
//! # Ok::<(), pedalc::CompilerError>(())
//! ```
//!
//! ## Compilation Method
//!
//! The input is a system of symbolic MNA equations over unknowns written
//! as functions of time, e.g. `v_out(t)`. For a time step h = 1/sample_rate:
//!
//! 1. Equations referencing `D(y, t)` are solved for the derivatives and
//!    discretized with the trapezoidal rule, which rewrites them as
//!    algebraic relations between the current and previous steps
//! 2. Unknowns determined linearly are solved once, symbolically, into an
//!    ordered list of closed-form assignments
//! 3. The remaining nonlinear unknowns are emitted as a Newton-Raphson
//!    block: per-iteration Jacobian rows plus the update deltas that drop
//!    out linearly
//!
//! Steady-state initial conditions come from the same system with the
//! derivatives and both time symbols pinned to zero.

pub mod algebra;
pub mod analysis;
pub mod error;
pub mod log;
pub mod solver;

// Re-export main types for convenience
pub use algebra::{Arrow, Equation, Expr};
pub use analysis::Analysis;
pub use error::{CompilerError, Result};
pub use log::{Log, NullLog, Severity, StdLog};
pub use solver::{
    CompilerConfig, LinearSolutions, NewtonIteration, SolutionSet, TransientSolution,
};

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Thermal voltage at room temperature (approximately 26mV)
pub const THERMAL_VOLTAGE: f64 = 0.0258;
