//! A symbolic matrix row.
//!
//! A [`LinearCombination`] is one row of a symbolic linear system: an
//! ordered basis of expressions with a coefficient for each, plus a
//! constant term. `c1*b1 + c2*b2 + ... + c0 = 0`. The basis order defines
//! the pivot scanning order, and swapping columns reorders coefficients
//! with their basis elements.

use std::fmt;

use crate::algebra::{normalize, Arrow, Expr};
use crate::error::{CompilerError, Result};

/// One row of a symbolic linear system.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearCombination {
    // (basis element, coefficient), in basis order. Coefficients are kept
    // normalized so the zero test is a constant-time match.
    terms: Vec<(Expr, Expr)>,
    constant: Expr,
}

impl LinearCombination {
    /// Create a row over the given basis with all coefficients zero.
    pub fn new(basis: impl IntoIterator<Item = Expr>) -> Self {
        Self::with_constant(basis, Expr::zero())
    }

    /// Create a zero row over the given basis with the given constant
    /// term. The Jacobian construction passes the residual here so the
    /// constant column carries it explicitly.
    pub fn with_constant(basis: impl IntoIterator<Item = Expr>, constant: Expr) -> Self {
        Self {
            terms: basis.into_iter().map(|b| (b, Expr::zero())).collect(),
            constant: normalize(&constant),
        }
    }

    /// The coefficient of a basis element; zero if the element is not in
    /// the basis.
    pub fn coefficient(&self, basis_element: &Expr) -> Expr {
        self.terms
            .iter()
            .find(|(b, _)| b == basis_element)
            .map(|(_, c)| c.clone())
            .unwrap_or_else(Expr::zero)
    }

    /// Replace the coefficient of a basis element. Extends the basis if
    /// the element is not present.
    pub fn set_coefficient(&mut self, basis_element: &Expr, coefficient: Expr) {
        let coefficient = normalize(&coefficient);
        if let Some(entry) = self.terms.iter_mut().find(|(b, _)| b == basis_element) {
            entry.1 = coefficient;
        } else {
            self.terms.push((basis_element.clone(), coefficient));
        }
    }

    /// The constant term.
    pub fn constant(&self) -> &Expr {
        &self.constant
    }

    /// Replace the constant term.
    pub fn set_constant(&mut self, constant: Expr) {
        self.constant = normalize(&constant);
    }

    /// The basis, in pivot scanning order.
    pub fn basis(&self) -> impl Iterator<Item = &Expr> {
        self.terms.iter().map(|(b, _)| b)
    }

    /// The leftmost basis element with a symbolically nonzero
    /// coefficient, if any.
    pub fn pivot(&self) -> Option<&Expr> {
        self.terms
            .iter()
            .find(|(_, c)| !c.is_zero())
            .map(|(b, _)| b)
    }

    /// Permute the basis to the given order; coefficients follow their
    /// basis elements.
    pub fn swap_columns(&mut self, order: &[Expr]) {
        debug_assert_eq!(order.len(), self.terms.len());
        let terms = order
            .iter()
            .map(|b| (b.clone(), self.coefficient(b)))
            .collect();
        self.terms = terms;
    }

    /// Solve the row for one basis element:
    /// `b := -(sum of the other terms + constant) / c_b`. Fails if the
    /// coefficient of `b` is symbolically zero.
    pub fn solve_for(&self, basis_element: &Expr) -> Result<Arrow> {
        let c = self.coefficient(basis_element);
        if c.is_zero() {
            return Err(CompilerError::zero_pivot(basis_element.to_string()));
        }
        let mut rest: Vec<Expr> = self
            .terms
            .iter()
            .filter(|(b, _)| b != basis_element)
            .map(|(b, coefficient)| coefficient.clone() * b.clone())
            .collect();
        rest.push(self.constant.clone());
        let rhs = -Expr::Sum(rest) / c;
        Ok(Arrow::new(basis_element.clone(), normalize(&rhs)))
    }

    /// The row as an expression: `sum of c_i*b_i + constant`.
    pub fn to_expression(&self) -> Expr {
        let mut terms: Vec<Expr> = self
            .terms
            .iter()
            .map(|(b, c)| c.clone() * b.clone())
            .collect();
        terms.push(self.constant.clone());
        normalize(&Expr::Sum(terms))
    }

    /// Multiply every coefficient and the constant by a factor.
    pub fn scale(&mut self, factor: &Expr) {
        for (_, c) in &mut self.terms {
            *c = normalize(&(factor.clone() * c.clone()));
        }
        self.constant = normalize(&(factor.clone() * self.constant.clone()));
    }

    /// Subtract `factor` times another row from this row, column by
    /// column.
    pub fn subtract_scaled(&mut self, other: &LinearCombination, factor: &Expr) {
        for (b, c) in &mut self.terms {
            let delta = factor.clone() * other.coefficient(b);
            *c = normalize(&(c.clone() - delta));
        }
        self.constant =
            normalize(&(self.constant.clone() - factor.clone() * other.constant.clone()));
    }

    /// Apply a rewrite to every coefficient and the constant.
    pub fn map_entries(&mut self, rewrite: impl Fn(&Expr) -> Expr) {
        for (_, c) in &mut self.terms {
            *c = rewrite(c);
        }
        self.constant = rewrite(&self.constant);
    }
}

impl fmt::Display for LinearCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = 0", self.to_expression())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> LinearCombination {
        // 2x + 0y + 3 = 0 over basis [x, y]
        let x = Expr::var("x");
        let y = Expr::var("y");
        let mut r = LinearCombination::with_constant([x.clone(), y], Expr::constant(3.0));
        r.set_coefficient(&x, Expr::constant(2.0));
        r
    }

    #[test]
    fn test_coefficient_lookup() {
        let r = row();
        assert_eq!(r.coefficient(&Expr::var("x")), Expr::constant(2.0));
        assert!(r.coefficient(&Expr::var("y")).is_zero());
        // Not in the basis at all: still zero.
        assert!(r.coefficient(&Expr::var("z")).is_zero());
    }

    #[test]
    fn test_pivot_skips_zero_columns() {
        let r = row();
        assert_eq!(r.pivot(), Some(&Expr::var("x")));

        let mut zeroed = row();
        zeroed.set_coefficient(&Expr::var("x"), Expr::zero());
        assert_eq!(zeroed.pivot(), None);
    }

    #[test]
    fn test_swap_columns() {
        let mut r = row();
        r.swap_columns(&[Expr::var("y"), Expr::var("x")]);
        assert_eq!(r.pivot(), Some(&Expr::var("x")));
        assert_eq!(r.basis().next(), Some(&Expr::var("y")));
    }

    #[test]
    fn test_solve_for() {
        let r = row();
        let arrow = r.solve_for(&Expr::var("x")).unwrap();
        assert_eq!(arrow.left, Expr::var("x"));
        assert_eq!(arrow.right, Expr::constant(-1.5));

        assert!(r.solve_for(&Expr::var("y")).is_err());
    }

    #[test]
    fn test_to_expression_round_trip() {
        let r = row();
        let e = r.to_expression();
        let value = e.eval(&[(Expr::var("x"), -1.5)]).unwrap();
        assert!(value.abs() < 1e-12);
    }

    #[test]
    fn test_symbolic_cancellation_in_elimination() {
        // Row a: x/R + 1 = 0; row b: x/R + 2 = 0. b - 1*a has a zero x
        // column even though the coefficients are symbolic.
        let x = Expr::var("x");
        let r = Expr::var("R");
        let mut a = LinearCombination::with_constant([x.clone()], Expr::one());
        a.set_coefficient(&x, Expr::one() / r.clone());
        let mut b = LinearCombination::with_constant([x.clone()], Expr::constant(2.0));
        b.set_coefficient(&x, Expr::one() / r);
        b.subtract_scaled(&a, &Expr::one());
        assert_eq!(b.pivot(), None);
        assert_eq!(*b.constant(), Expr::one());
    }
}
