//! Equations and solved assignments.

use std::fmt;

use super::expr::Expr;
use super::simplify::normalize;

/// An equality `left = right` between two expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    pub left: Expr,
    pub right: Expr,
}

impl Equation {
    /// Create a new equation.
    pub fn new(left: Expr, right: Expr) -> Self {
        Self { left, right }
    }

    /// The residual `left - right`, normalized.
    pub fn residual(&self) -> Expr {
        normalize(&(self.left.clone() - self.right.clone()))
    }

    /// Check whether either side structurally contains any of the atoms.
    pub fn depends_on(&self, atoms: &[Expr]) -> bool {
        self.left.depends_on(atoms) || self.right.depends_on(atoms)
    }

    /// Substitute all arrows in parallel on both sides.
    pub fn evaluate(&self, substitutions: &[Arrow]) -> Equation {
        Equation {
            left: self.left.evaluate(substitutions),
            right: self.right.evaluate(substitutions),
        }
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

/// A solved assignment `left := right`.
///
/// `left` is a single unknown; within an ordered sequence of arrows,
/// `right` may only reference unknowns assigned by earlier arrows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    pub left: Expr,
    pub right: Expr,
}

impl Arrow {
    /// Create a new assignment.
    pub fn new(left: Expr, right: Expr) -> Self {
        Self { left, right }
    }
}

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} := {}", self.left, self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual() {
        let eq = Equation::new(Expr::var("a"), Expr::var("b"));
        let r = eq.residual();
        assert_eq!(r.to_string(), "a - b");
        assert!(Equation::new(Expr::var("a"), Expr::var("a"))
            .residual()
            .is_zero());
    }

    #[test]
    fn test_evaluate_both_sides() {
        let eq = Equation::new(Expr::var("a"), Expr::constant(2.0) * Expr::var("b"));
        let sub = [Arrow::new(Expr::var("b"), Expr::constant(3.0))];
        let out = eq.evaluate(&sub);
        assert_eq!(out.right, Expr::constant(6.0));
    }
}
