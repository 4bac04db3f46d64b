//! Best-effort factoring for operation-count reduction.
//!
//! Pulls factors common to every term out of a sum, turning
//! `a*x + a*y` into `a*(x + y)`. No attempt is made at polynomial
//! factorization; the goal is fewer multiplies in the emitted solver,
//! nothing more.

use num_traits::{One, Signed};

use super::expr::{Expr, Rational};
use super::simplify::{make_term, normalize, split_term};

/// Factor common symbolic factors out of a sum. Expressions that are not
/// sums (after normalization) are returned normalized but otherwise
/// untouched.
pub fn factor(expr: &Expr) -> Expr {
    let n = normalize(expr);
    let Expr::Sum(terms) = &n else {
        return n;
    };

    let decomposed: Vec<(Rational, Vec<Expr>)> =
        terms.iter().map(|t| split_term(t.clone())).collect();

    // Candidate bases come from the first term; a base qualifies when it
    // appears in every term with a constant exponent of the same sign.
    let mut common: Vec<(Expr, Rational)> = Vec::new();
    for f in &decomposed[0].1 {
        let Some((base, exponent)) = base_exponent(f) else {
            continue;
        };
        let mut exponents = vec![exponent];
        let mut shared = true;
        for (_, factors) in &decomposed[1..] {
            match factors
                .iter()
                .filter_map(base_exponent)
                .find(|(b, _)| *b == base)
            {
                Some((_, e)) => exponents.push(e),
                None => {
                    shared = false;
                    break;
                }
            }
        }
        if !shared {
            continue;
        }
        let pulled = if exponents.iter().all(|e| e.is_positive()) {
            exponents.iter().min().cloned()
        } else if exponents.iter().all(|e| e.is_negative()) {
            exponents.iter().max().cloned()
        } else {
            None
        };
        if let Some(pulled) = pulled {
            common.push((base, pulled));
        }
    }

    if common.is_empty() {
        return n;
    }

    let mut residual: Vec<Expr> = decomposed
        .into_iter()
        .map(|(coefficient, factors)| {
            let mut reduced: Vec<Expr> = factors
                .into_iter()
                .filter_map(|f| {
                    let Some((base, exponent)) = base_exponent(&f) else {
                        return Some(f);
                    };
                    match common.iter().find(|(b, _)| *b == base) {
                        Some((_, pulled)) if exponent == *pulled => None,
                        Some((_, pulled)) => Some(
                            base.pow(Expr::Constant(exponent - pulled)),
                        ),
                        None => Some(f),
                    }
                })
                .collect();
            reduced.sort();
            make_term(coefficient, reduced)
        })
        .collect();
    residual.sort();

    let inner = match residual.len() {
        0 => Expr::zero(),
        1 => residual.remove(0),
        _ => Expr::Sum(residual),
    };
    let mut outer: Vec<Expr> = common
        .into_iter()
        .map(|(base, exponent)| {
            if exponent.is_one() {
                base
            } else {
                base.pow(Expr::Constant(exponent))
            }
        })
        .collect();
    outer.push(inner);
    Expr::Product(outer)
}

// A factor viewed as base^exponent with a constant exponent.
fn base_exponent(f: &Expr) -> Option<(Expr, Rational)> {
    match f {
        Expr::Power { base, exponent } => match &**exponent {
            Expr::Constant(e) => Some(((**base).clone(), e.clone())),
            _ => None,
        },
        other => Some((other.clone(), Rational::one())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_factor_extraction() {
        let a = Expr::var("a");
        let x = Expr::var("x");
        let y = Expr::var("y");
        let e = a.clone() * x.clone() + a.clone() * y.clone();
        let factored = factor(&e);
        // a*(x + y): a product with the common factor pulled out.
        let Expr::Product(factors) = &factored else {
            panic!("expected a product, got {factored}");
        };
        assert!(factors.contains(&a));
        // The factored form is equivalent to the original.
        let bindings = [(x, 2.0), (y, 3.0), (a, 5.0)];
        assert!((factored.eval(&bindings).unwrap() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_common_factor_is_identity() {
        let e = Expr::var("x") + Expr::var("y");
        assert_eq!(factor(&e), normalize(&e));
    }

    #[test]
    fn test_negative_powers() {
        // x/R + y/R -> (x + y)/R
        let r = Expr::var("R");
        let e = Expr::var("x") / r.clone() + Expr::var("y") / r.clone();
        let factored = factor(&e);
        let bindings = [(Expr::var("x"), 1.0), (Expr::var("y"), 3.0), (r, 2.0)];
        assert!((factored.eval(&bindings).unwrap() - 2.0).abs() < 1e-12);
        assert!(matches!(factored, Expr::Product(_)));
    }
}
