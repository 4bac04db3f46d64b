//! Error types for the circuit-solver compiler.
//!
//! This module provides a unified error type [`CompilerError`] that covers
//! all error conditions that can occur while compiling a circuit analysis
//! into a transient solution.

use thiserror::Error;

use crate::algebra::AlgebraError;

/// Result type alias using [`CompilerError`].
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Unified error type for all compiler operations.
#[derive(Error, Debug)]
pub enum CompilerError {
    // ============ Input Validation Errors ============
    /// The requested time step is not usable
    #[error("Invalid time step {value}: must be positive and finite")]
    InvalidTimeStep { value: f64 },

    // ============ Symbolic Solving Errors ============
    /// A required update variable has no pivot row and no nonzero column
    #[error("Singular Jacobian: no usable row for unknown '{unknown}'")]
    SingularJacobian { unknown: String },

    /// A row was solved for a variable with a symbolically zero coefficient
    #[error("Cannot solve for '{variable}': its coefficient is symbolically zero")]
    ZeroPivot { variable: String },

    /// A differential equation is not linear in the derivative terms
    #[error("Equation '{equation}' is not linear in the derivatives of the unknowns")]
    NonlinearDifferential { equation: String },

    /// Trapezoidal integration was handed a non-derivative assignment
    #[error("Expected a derivative assignment, found '{arrow}'")]
    NotADerivative { arrow: String },

    // ============ Algebra Errors ============
    /// Error propagated from the algebra kernel
    #[error("Algebra error: {0}")]
    Algebra(#[from] AlgebraError),
}

impl CompilerError {
    /// Create an invalid-time-step error.
    pub fn invalid_time_step(value: f64) -> Self {
        Self::InvalidTimeStep { value }
    }

    /// Create a singular-Jacobian error.
    pub fn singular_jacobian(unknown: impl Into<String>) -> Self {
        Self::SingularJacobian {
            unknown: unknown.into(),
        }
    }

    /// Create a zero-pivot error.
    pub fn zero_pivot(variable: impl Into<String>) -> Self {
        Self::ZeroPivot {
            variable: variable.into(),
        }
    }

    /// Create a nonlinear-differential error.
    pub fn nonlinear_differential(equation: impl Into<String>) -> Self {
        Self::NonlinearDifferential {
            equation: equation.into(),
        }
    }

    /// Create a not-a-derivative error.
    pub fn not_a_derivative(arrow: impl Into<String>) -> Self {
        Self::NotADerivative {
            arrow: arrow.into(),
        }
    }
}
