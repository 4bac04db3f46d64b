//! Numeric Newton-Raphson solver for algebraic systems.
//!
//! Used by the steady-state (DC) analysis: the symbolic residuals and
//! their Jacobian are evaluated numerically at each iterate and the
//! linearized system is solved with a dense LU decomposition.

use super::derivative::derivative;
use super::equation::Arrow;
use super::expr::Expr;
use super::AlgebraError;

/// Default iteration cap for the numeric solver.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default convergence tolerance on the update step.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Numeric Newton-Raphson solver.
pub struct NewtonSolver {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance
    pub tolerance: f64,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NewtonSolver {
    /// Create a solver with default iteration cap and tolerance.
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Create a solver with a custom iteration cap and tolerance.
    pub fn with_config(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// Solve `residuals = 0` for the unknowns named by `guess`.
    ///
    /// Each guess arrow supplies one unknown and its numeric starting
    /// value. Returns one arrow per unknown with its solved constant
    /// value, in the guess order.
    pub fn solve(&self, residuals: &[Expr], guess: &[Arrow]) -> Result<Vec<Arrow>, AlgebraError> {
        let n = guess.len();
        if residuals.len() != n {
            return Err(AlgebraError::ShapeMismatch {
                equations: residuals.len(),
                unknowns: n,
            });
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let unknowns: Vec<Expr> = guess.iter().map(|a| a.left.clone()).collect();
        let mut x: Vec<f64> = Vec::with_capacity(n);
        for a in guess {
            x.push(a.right.eval(&[])?);
        }

        // The symbolic Jacobian is fixed; only its numeric value changes
        // per iterate.
        let jacobian: Vec<Vec<Expr>> = residuals
            .iter()
            .map(|f| unknowns.iter().map(|u| derivative(f, u)).collect())
            .collect();

        let mut a = vec![0.0f64; n * n];
        let mut b = vec![0.0f64; n];
        let mut residual_norm = 0.0f64;

        for _ in 0..self.max_iterations {
            let bindings: Vec<(Expr, f64)> = unknowns
                .iter()
                .cloned()
                .zip(x.iter().copied())
                .collect();

            residual_norm = 0.0;
            for (i, f) in residuals.iter().enumerate() {
                let value = f.eval(&bindings)?;
                if !value.is_finite() {
                    return Err(AlgebraError::NonFinite);
                }
                residual_norm = residual_norm.max(value.abs());
                b[i] = -value;
                for (j, df) in jacobian[i].iter().enumerate() {
                    let coefficient = df.eval(&bindings)?;
                    if !coefficient.is_finite() {
                        return Err(AlgebraError::NonFinite);
                    }
                    a[i * n + j] = coefficient;
                }
            }

            let dx = lu_solve(&mut a, &b, n)?;
            let mut step = 0.0f64;
            for i in 0..n {
                x[i] += dx[i];
                step = step.max(dx[i].abs());
            }

            if step < self.tolerance {
                return Ok(unknowns
                    .into_iter()
                    .zip(x)
                    .map(|(u, v)| Arrow::new(u, Expr::constant(v)))
                    .collect());
            }
        }

        Err(AlgebraError::ConvergenceFailure {
            iterations: self.max_iterations,
            residual: residual_norm,
        })
    }
}

/// Solve the linear system `a * x = b` for `x` with LU decomposition and
/// partial pivoting. `a` is an `n`-by-`n` row-major matrix; it is
/// factored in place.
fn lu_solve(a: &mut [f64], b: &[f64], n: usize) -> Result<Vec<f64>, AlgebraError> {
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        // Find pivot
        let mut max_val = a[k * n + k].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let val = a[i * n + k].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val < 1e-15 {
            return Err(AlgebraError::SingularSystem);
        }

        // Swap rows if needed
        if max_row != k {
            pivots.swap(k, max_row);
            for j in 0..n {
                a.swap(k * n + j, max_row * n + j);
            }
        }

        // Eliminate
        let pivot = a[k * n + k];
        for i in (k + 1)..n {
            let factor = a[i * n + k] / pivot;
            a[i * n + k] = factor;
            for j in (k + 1)..n {
                a[i * n + j] -= factor * a[k * n + j];
            }
        }
    }

    // Apply the pivot permutation to b
    let mut x: Vec<f64> = (0..n).map(|i| b[pivots[i]]).collect();

    // Forward substitution (L * y = Pb)
    for i in 0..n {
        for j in 0..i {
            x[i] -= a[i * n + j] * x[j];
        }
    }

    // Back substitution (U * x = y)
    for i in (0..n).rev() {
        for j in (i + 1)..n {
            x[i] -= a[i * n + j] * x[j];
        }
        x[i] /= a[i * n + i];
    }

    Ok(x)
}

/// Solve `residuals = 0` numerically with default settings.
pub fn nsolve(residuals: &[Expr], guess: &[Arrow]) -> Result<Vec<Arrow>, AlgebraError> {
    NewtonSolver::new().solve(residuals, guess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_system() {
        // 2x + y = 5, x - y = 1  =>  x = 2, y = 1
        let x = Expr::var("x");
        let y = Expr::var("y");
        let residuals = [
            (Expr::constant(2.0) * x.clone() + y.clone() - Expr::constant(5.0)).simplified(),
            (x.clone() - y.clone() - Expr::constant(1.0)).simplified(),
        ];
        let guess = [
            Arrow::new(x.clone(), Expr::zero()),
            Arrow::new(y.clone(), Expr::zero()),
        ];
        let solved = nsolve(&residuals, &guess).unwrap();
        assert_eq!(solved[0].left, x);
        assert!((solved[0].right.as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert!((solved[1].right.as_f64().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_nonlinear_convergence() {
        // exp(v) - 2 = 0  =>  v = ln 2
        let v = Expr::var("v");
        let residuals = [(Expr::exp(v.clone()) - Expr::constant(2.0)).simplified()];
        let guess = [Arrow::new(v.clone(), Expr::zero())];
        let solved = nsolve(&residuals, &guess).unwrap();
        let value = solved[0].right.as_f64().unwrap();
        assert!((value - 2.0f64.ln()).abs() < 1e-8);
    }

    #[test]
    fn test_no_solution_reports_failure() {
        // exp(v) + 2 = 0 has no real solution.
        let v = Expr::var("v");
        let residuals = [(Expr::exp(v.clone()) + Expr::constant(2.0)).simplified()];
        let guess = [Arrow::new(v, Expr::zero())];
        assert!(nsolve(&residuals, &guess).is_err());
    }

    #[test]
    fn test_shape_mismatch() {
        let v = Expr::var("v");
        let err = nsolve(&[], &[Arrow::new(v, Expr::zero())]);
        assert!(matches!(err, Err(AlgebraError::ShapeMismatch { .. })));
    }
}
