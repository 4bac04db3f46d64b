//! Symbolic Gaussian elimination.
//!
//! Operates on an owned, ordered list of [`LinearCombination`] rows over
//! an ordered list of pivot variables. Reduction is the textbook
//! algorithm lifted to symbolic coefficients: find a pivot row, scale its
//! pivot to one, eliminate the column elsewhere. When several rows
//! qualify as a pivot the first in current list order wins, so results
//! are deterministic for a fixed input ordering.

use crate::algebra::{derivative, normalize, Arrow, Equation, Expr};
use crate::error::Result;

use super::linear_combination::LinearCombination;

/// An ordered, mutable list of symbolic rows.
#[derive(Debug, Clone, Default)]
pub struct SystemOfEquations {
    rows: Vec<LinearCombination>,
}

impl SystemOfEquations {
    /// Create an empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row.
    pub fn push(&mut self, row: LinearCombination) {
        self.rows.push(row);
    }

    /// The rows, in order.
    pub fn rows(&self) -> &[LinearCombination] {
        &self.rows
    }

    /// Mutable access to the rows.
    pub fn rows_mut(&mut self) -> &mut [LinearCombination] {
        &mut self.rows
    }

    /// Consume the system, yielding the remaining rows.
    pub fn into_rows(self) -> Vec<LinearCombination> {
        self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the system has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Reduce to row echelon form over the given pivot variables, in
    /// order. A variable with no available pivot row is skipped: it is
    /// free with respect to the linear part.
    pub fn row_reduce(&mut self, variables: &[Expr]) {
        let mut next_pivot_row = 0;
        for v in variables {
            let Some(found) = (next_pivot_row..self.rows.len())
                .find(|&i| self.rows[i].pivot() == Some(v))
            else {
                continue;
            };
            self.rows.swap(next_pivot_row, found);

            // Scale the pivot row so the pivot coefficient is one.
            let c = self.rows[next_pivot_row].coefficient(v);
            let inverse = normalize(&c.pow(Expr::constant(-1.0)));
            self.rows[next_pivot_row].scale(&inverse);

            // Eliminate the column from the rows below.
            let pivot_row = self.rows[next_pivot_row].clone();
            for row in self.rows.iter_mut().skip(next_pivot_row + 1) {
                let c = row.coefficient(v);
                if !c.is_zero() {
                    row.subtract_scaled(&pivot_row, &c);
                }
            }
            next_pivot_row += 1;
        }
    }

    /// Clear the entries above each pivot, from the last pivot row
    /// backward, leaving every pivot column a clean basis vector.
    pub fn back_substitute(&mut self, variables: &[Expr]) {
        for i in (0..self.rows.len()).rev() {
            let Some(v) = self.rows[i].pivot().cloned() else {
                continue;
            };
            if !variables.contains(&v) {
                continue;
            }
            let pivot_row = self.rows[i].clone();
            for row in self.rows.iter_mut().take(i) {
                let c = row.coefficient(&v);
                if !c.is_zero() {
                    row.subtract_scaled(&pivot_row, &c);
                }
            }
        }
    }

    /// The first row whose pivot position is the given variable.
    pub fn find_pivot(&self, variable: &Expr) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.pivot() == Some(variable))
    }

    /// Walk the variables in reverse; for each, solve and remove the row
    /// that pivots on it, falling back to any row with a nonzero
    /// coefficient in that column. Later variables are solved first so
    /// their rows are consumed before earlier ones, matching
    /// upper-triangular form. Variables with no usable row are skipped.
    pub fn solve_and_remove(&mut self, variables: &[Expr]) -> Result<Vec<Arrow>> {
        let mut solutions = Vec::new();
        for v in variables.iter().rev() {
            let found = self.find_pivot(v).or_else(|| {
                self.rows.iter().position(|row| !row.coefficient(v).is_zero())
            });
            if let Some(i) = found {
                let row = self.rows.remove(i);
                solutions.push(row.solve_for(v)?);
            }
        }
        Ok(solutions)
    }
}

/// Express a residual as a row over the given basis, if it is linear in
/// the basis: every coefficient and the remaining constant term must be
/// independent of the basis.
pub fn linearize(residual: &Expr, basis: &[Expr]) -> Option<LinearCombination> {
    let mut row = LinearCombination::new(basis.iter().cloned());
    let mut constant = residual.clone();
    for b in basis {
        let coefficient = derivative(residual, b);
        if coefficient.depends_on(basis) {
            return None;
        }
        constant = constant - coefficient.clone() * b.clone();
        row.set_coefficient(b, coefficient);
    }
    let constant = normalize(&constant);
    if constant.depends_on(basis) {
        return None;
    }
    row.set_constant(constant);
    Some(row)
}

/// Best-effort linear solve of a set of equations for the given
/// unknowns. Equations that are not linear in the unknowns are ignored;
/// the returned arrows cover whatever subset of the unknowns the linear
/// part determines.
pub fn solve(equations: &[Equation], unknowns: &[Expr]) -> Result<Vec<Arrow>> {
    let mut system = SystemOfEquations::new();
    for equation in equations {
        if let Some(row) = linearize(&equation.residual(), unknowns) {
            system.push(row);
        }
    }
    system.row_reduce(unknowns);
    system.back_substitute(unknowns);
    system.solve_and_remove(unknowns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Expr {
        Expr::var("x")
    }

    fn y() -> Expr {
        Expr::var("y")
    }

    #[test]
    fn test_two_by_two_solve() {
        // 2x + y = 5, x - y = 1
        let equations = [
            Equation::new(
                Expr::constant(2.0) * x() + y(),
                Expr::constant(5.0),
            ),
            Equation::new(x() - y(), Expr::one()),
        ];
        let unknowns = [x(), y()];
        let mut solved = solve(&equations, &unknowns).unwrap();
        // Reverse walk: y first, then x.
        assert_eq!(solved.len(), 2);
        let sx = solved.pop().unwrap();
        let sy = solved.pop().unwrap();
        assert_eq!(sy.left, y());
        assert_eq!(sx.left, x());
        assert_eq!(sx.right, Expr::constant(2.0));
        assert_eq!(sy.right, Expr::one());
    }

    #[test]
    fn test_nonlinear_equations_are_ignored() {
        let equations = [
            Equation::new(Expr::exp(x()), Expr::constant(2.0)),
            Equation::new(y() + x(), Expr::constant(3.0)),
        ];
        let solved = solve(&equations, &[x(), y()]).unwrap();
        // Only the linear equation contributes: y solved in terms of x.
        assert_eq!(solved.len(), 1);
        assert_eq!(solved[0].left, y());
        assert!(solved[0].right.depends_on(&[x()]));
    }

    #[test]
    fn test_free_variable_is_skipped() {
        // One equation, two unknowns: x + y = 1. The reverse walk solves
        // y from the only row; x is left unsolved.
        let equations = [Equation::new(x() + y(), Expr::one())];
        let solved = solve(&equations, &[x(), y()]).unwrap();
        assert_eq!(solved.len(), 1);
        assert_eq!(solved[0].left, y());
    }

    #[test]
    fn test_linearize_rejects_nonlinear() {
        assert!(linearize(&Expr::exp(x()), &[x()]).is_none());
        assert!(linearize(&(x() * y()).simplified(), &[x(), y()]).is_none());
        // Linear with symbolic coefficient: fine.
        let row = linearize(&(Expr::var("R") * x()).simplified(), &[x()]).unwrap();
        assert_eq!(row.coefficient(&x()), Expr::var("R"));
    }

    #[test]
    fn test_symbolic_coefficients_reduce() {
        // (1/R)x + (1/R)y = 0 and x - y = 2 => y = -1, x = 1.
        let r = Expr::var("R");
        let equations = [
            Equation::new(x() / r.clone() + y() / r, Expr::zero()),
            Equation::new(x() - y(), Expr::constant(2.0)),
        ];
        let solved = solve(&equations, &[x(), y()]).unwrap();
        assert_eq!(solved.len(), 2);
        let sy = &solved[0];
        let sx = &solved[1];
        assert_eq!(sy.left, y());
        assert_eq!(sy.right, Expr::constant(-1.0));
        assert_eq!(sx.left, x());
        assert_eq!(sx.right, Expr::one());
    }
}
