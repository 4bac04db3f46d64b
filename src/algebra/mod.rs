//! Symbolic algebra kernel.
//!
//! Everything the solver compiler needs from a computer-algebra system:
//!
//! - [`Expr`] - expression trees with structural equality, hashing and a
//!   total canonical order
//! - [`normalize`] - canonical form, which doubles as the best-effort
//!   symbolic zero test
//! - [`Expr::evaluate`] - parallel multi-substitution
//! - [`derivative`] - partial differentiation with respect to an atom
//! - [`factor`] - common-factor extraction for operation-count reduction
//! - [`nsolve`] - numeric Newton-Raphson over a symbolic system
//!
//! The symbolic *linear* solver lives with the row-reduction machinery in
//! [`crate::solver::gauss`], which it is built on.

pub mod derivative;
pub mod equation;
pub mod expr;
pub mod factor;
pub mod newton;
pub mod simplify;

pub use derivative::derivative;
pub use equation::{Arrow, Equation};
pub use expr::{Expr, Rational, TIME, TIME_PREV};
pub use factor::factor;
pub use newton::{nsolve, NewtonSolver, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
pub use simplify::normalize;

use thiserror::Error;

/// Errors from the algebra kernel.
#[derive(Error, Debug)]
pub enum AlgebraError {
    /// An atom had no binding during numeric evaluation.
    #[error("Unbound symbol '{symbol}' in numeric evaluation")]
    UnboundSymbol { symbol: String },

    /// The linearized system was numerically singular.
    #[error("Singular system in numeric solve")]
    SingularSystem,

    /// Newton-Raphson iteration did not converge.
    #[error("Newton-Raphson did not converge after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },

    /// Equation and unknown counts disagree.
    #[error("System shape mismatch: {equations} equations for {unknowns} unknowns")]
    ShapeMismatch { equations: usize, unknowns: usize },

    /// A non-finite value appeared during numeric evaluation.
    #[error("Non-finite value in numeric evaluation")]
    NonFinite,
}

impl AlgebraError {
    /// Create an unbound-symbol error.
    pub fn unbound(symbol: impl Into<String>) -> Self {
        Self::UnboundSymbol {
            symbol: symbol.into(),
        }
    }
}
