//! Partial differentiation.
//!
//! The differentiation variable is an *atom*: either a plain variable or a
//! function-call unknown such as `v_out(t)`, matched structurally and
//! treated as opaque. This is what the Jacobian construction needs, where
//! the unknowns themselves are calls over the time variable.

use num_traits::One;

use super::expr::{Expr, Rational};
use super::simplify::normalize;

/// Differentiate `expr` with respect to the atom `x`. The result is
/// normalized.
pub fn derivative(expr: &Expr, x: &Expr) -> Expr {
    normalize(&d(expr, x))
}

fn d(expr: &Expr, x: &Expr) -> Expr {
    if expr == x {
        return Expr::one();
    }
    match expr {
        Expr::Constant(_) | Expr::Variable(_) => Expr::zero(),
        Expr::Call { name, args } if name == "exp" && args.len() == 1 => {
            d(&args[0], x) * expr.clone()
        }
        Expr::Call { name, args } if name == "ln" && args.len() == 1 => {
            d(&args[0], x) * args[0].clone().pow(Expr::constant(-1.0))
        }
        Expr::Call { .. } => {
            // Opaque call: the chain rule cannot be applied, so an
            // argument that contains the atom leaves a symbolic
            // derivative node behind.
            if expr.depends_on(std::slice::from_ref(x)) {
                Expr::Derivative {
                    f: Box::new(expr.clone()),
                    x: Box::new(x.clone()),
                }
            } else {
                Expr::zero()
            }
        }
        Expr::Derivative { .. } => Expr::zero(),
        Expr::Sum(terms) => Expr::Sum(terms.iter().map(|t| d(t, x)).collect()),
        Expr::Product(factors) => {
            let mut terms = Vec::with_capacity(factors.len());
            for (i, _) in factors.iter().enumerate() {
                let mut fs = factors.clone();
                fs[i] = d(&factors[i], x);
                terms.push(Expr::Product(fs));
            }
            Expr::Sum(terms)
        }
        Expr::Power { base, exponent } => {
            if let Expr::Constant(n) = &**exponent {
                // n * base^(n-1) * base'
                return Expr::Constant(n.clone())
                    * base
                        .as_ref()
                        .clone()
                        .pow(Expr::Constant(n - Rational::one()))
                    * d(base, x);
            }
            // General rule: b^e * (e' ln b + e b'/b)
            expr.clone()
                * (d(exponent, x) * Expr::ln(base.as_ref().clone())
                    + exponent.as_ref().clone() * d(base, x)
                        / base.as_ref().clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_coefficients() {
        let v = Expr::unknown("v");
        let e = Expr::constant(3.0) * v.clone() + Expr::var("b");
        assert_eq!(derivative(&e, &v), Expr::constant(3.0));
        assert_eq!(derivative(&e, &Expr::var("b")), Expr::one());
    }

    #[test]
    fn test_exp_chain_rule() {
        // d/dv exp(v/vt) = exp(v/vt) / vt
        let v = Expr::unknown("v");
        let vt = Expr::var("vt");
        let e = Expr::exp(v.clone() / vt.clone());
        let deriv = derivative(&e, &v);
        let expected = (Expr::exp(v / vt.clone()) / vt).simplified();
        assert_eq!(deriv, expected);
    }

    #[test]
    fn test_power_rule() {
        let v = Expr::unknown("v");
        let e = v.clone().pow(Expr::constant(3.0));
        let expected = (Expr::constant(3.0) * v.clone().pow(Expr::constant(2.0))).simplified();
        assert_eq!(derivative(&e, &v), expected);
    }

    #[test]
    fn test_previous_step_is_constant() {
        // v(t0) does not vary with v(t).
        let v = Expr::unknown("v");
        let prev = Expr::call("v", vec![Expr::t0()]);
        assert!(derivative(&prev, &v).is_zero());
    }
}
