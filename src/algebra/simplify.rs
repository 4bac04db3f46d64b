//! Canonical normalization of expressions.
//!
//! `normalize` rewrites an expression into a canonical form: constants are
//! folded with exact rational arithmetic, products are distributed over
//! sums, like terms and like factors are collected, and the children of
//! every sum and product are sorted by the total order on expressions.
//! Two expressions that are equal under these rewrites normalize to
//! structurally identical trees, which is what the pivot logic uses as
//! its (best-effort) symbolic zero test.
//!
//! The canonical form of a sum is a sum of monomials: each term is either
//! a constant, an atom, or a product whose first factor is the numeric
//! coefficient. Quotients are represented as products with negative-power
//! factors, so `x/R - x/R` cancels structurally.

use num_traits::{One, Signed, ToPrimitive, Zero};

use super::expr::{Expr, Rational};

/// Normalize an expression to canonical form.
pub fn normalize(expr: &Expr) -> Expr {
    match expr {
        Expr::Constant(_) | Expr::Variable(_) => expr.clone(),
        Expr::Call { name, args } => Expr::Call {
            name: name.clone(),
            args: args.iter().map(normalize).collect(),
        },
        Expr::Derivative { f, x } => Expr::Derivative {
            f: Box::new(normalize(f)),
            x: Box::new(normalize(x)),
        },
        Expr::Power { base, exponent } => normalize_power(normalize(base), normalize(exponent)),
        Expr::Product(factors) => normalize_product(factors.iter().map(normalize).collect()),
        Expr::Sum(terms) => normalize_sum(terms.iter().map(normalize).collect()),
    }
}

// Exponents that fold must fit in an i32; anything larger stays symbolic.
fn small_integer(value: &Rational) -> Option<i32> {
    if value.is_integer() {
        value.to_integer().to_i32()
    } else {
        None
    }
}

fn normalize_power(base: Expr, exponent: Expr) -> Expr {
    if let Expr::Constant(e) = &exponent {
        if e.is_zero() {
            return Expr::one();
        }
        if e.is_one() {
            return base;
        }
        match &base {
            Expr::Constant(b) => {
                if b.is_zero() {
                    if e.is_positive() {
                        return Expr::zero();
                    }
                    // 0^negative is left symbolic rather than folded.
                } else if let Some(n) = small_integer(e) {
                    return Expr::Constant(b.pow(n));
                }
            }
            Expr::Power {
                base: inner,
                exponent: inner_exp,
            } => {
                if let Expr::Constant(ie) = &**inner_exp {
                    return normalize_power(
                        (**inner).clone(),
                        Expr::Constant(ie * e),
                    );
                }
            }
            Expr::Product(factors) => {
                if small_integer(e).is_some() {
                    return normalize_product(
                        factors
                            .iter()
                            .map(|f| normalize_power(f.clone(), exponent.clone()))
                            .collect(),
                    );
                }
            }
            _ => {}
        }
    }
    Expr::Power {
        base: Box::new(base),
        exponent: Box::new(exponent),
    }
}

// Inputs are individually normalized; flattens, distributes over sums,
// and collects repeated bases into powers.
fn normalize_product(factors: Vec<Expr>) -> Expr {
    let mut flat: Vec<Expr> = Vec::with_capacity(factors.len());
    for f in factors {
        match f {
            Expr::Product(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    // Distribute over the first sum factor; recursion handles the rest.
    if let Some(pos) = flat.iter().position(|f| matches!(f, Expr::Sum(_))) {
        let sum = flat.remove(pos);
        let Expr::Sum(terms) = sum else { unreachable!() };
        let expanded: Vec<Expr> = terms
            .into_iter()
            .map(|t| {
                let mut fs = flat.clone();
                fs.push(t);
                normalize_product(fs)
            })
            .collect();
        return normalize_sum(expanded);
    }

    let mut coefficient = Rational::one();
    let mut bases: Vec<(Expr, Vec<Expr>)> = Vec::new();
    for f in flat {
        match f {
            Expr::Constant(c) => coefficient *= c,
            Expr::Power { base, exponent } => push_power(&mut bases, *base, *exponent),
            other => push_power(&mut bases, other, Expr::one()),
        }
    }
    if coefficient.is_zero() {
        return Expr::zero();
    }

    let mut out: Vec<Expr> = Vec::with_capacity(bases.len());
    for (base, exponents) in bases {
        let exponent = normalize_sum(exponents);
        if matches!(&exponent, Expr::Constant(v) if v.is_zero()) {
            continue;
        }
        match normalize_power(base, exponent) {
            Expr::Constant(c) => coefficient *= c,
            Expr::Product(inner) => {
                for f in inner {
                    match f {
                        Expr::Constant(c) => coefficient *= c,
                        other => out.push(other),
                    }
                }
            }
            powered => out.push(powered),
        }
    }
    if coefficient.is_zero() {
        return Expr::zero();
    }
    out.sort();

    if out.is_empty() {
        Expr::Constant(coefficient)
    } else if coefficient.is_one() {
        if out.len() == 1 {
            out.remove(0)
        } else {
            Expr::Product(out)
        }
    } else {
        let mut v = vec![Expr::Constant(coefficient)];
        v.extend(out);
        Expr::Product(v)
    }
}

fn push_power(bases: &mut Vec<(Expr, Vec<Expr>)>, base: Expr, exponent: Expr) {
    if let Some(entry) = bases.iter_mut().find(|(b, _)| *b == base) {
        entry.1.push(exponent);
    } else {
        bases.push((base, vec![exponent]));
    }
}

// Inputs are individually normalized; flattens and collects like terms.
fn normalize_sum(terms: Vec<Expr>) -> Expr {
    let mut flat: Vec<Expr> = Vec::with_capacity(terms.len());
    for t in terms {
        match t {
            Expr::Sum(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    let mut collected: Vec<(Vec<Expr>, Rational)> = Vec::new();
    for t in flat {
        let (coefficient, key) = split_term(t);
        if let Some(entry) = collected.iter_mut().find(|(k, _)| *k == key) {
            entry.1 += coefficient;
        } else {
            collected.push((key, coefficient));
        }
    }

    let mut out: Vec<Expr> = collected
        .into_iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(key, c)| make_term(c, key))
        .collect();
    out.sort();

    match out.len() {
        0 => Expr::zero(),
        1 => out.remove(0),
        _ => Expr::Sum(out),
    }
}

/// Split a normalized term into (numeric coefficient, symbolic factors).
pub(crate) fn split_term(term: Expr) -> (Rational, Vec<Expr>) {
    match term {
        Expr::Constant(c) => (c, Vec::new()),
        Expr::Product(factors) => {
            let mut coefficient = Rational::one();
            let mut rest = Vec::with_capacity(factors.len());
            for f in factors {
                match f {
                    Expr::Constant(c) => coefficient *= c,
                    other => rest.push(other),
                }
            }
            (coefficient, rest)
        }
        other => (Rational::one(), vec![other]),
    }
}

/// Rebuild a monomial from a coefficient and sorted symbolic factors.
pub(crate) fn make_term(coefficient: Rational, mut factors: Vec<Expr>) -> Expr {
    if coefficient.is_zero() {
        return Expr::zero();
    }
    if factors.is_empty() {
        return Expr::Constant(coefficient);
    }
    if coefficient.is_one() {
        return if factors.len() == 1 {
            factors.remove(0)
        } else {
            Expr::Product(factors)
        };
    }
    let mut v = vec![Expr::Constant(coefficient)];
    v.extend(factors);
    Expr::Product(v)
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
    fn test_like_terms_combine() {
        let e = x() + x() + x();
        assert_eq!(normalize(&e), Expr::integer(3) * x());
        let cancel = x() - x();
        assert!(normalize(&cancel).is_zero());
    }

    #[test]
    fn test_distribution() {
        // 2*(x + y) -> 2x + 2y
        let e = Expr::integer(2) * (x() + y());
        let n = normalize(&e);
        let expected = normalize(&(Expr::integer(2) * x() + Expr::integer(2) * y()));
        assert_eq!(n, expected);
    }

    #[test]
    fn test_reciprocal_cancellation() {
        // (1/R)*R -> 1, so x/R - x/R -> 0 and x/R * R -> x.
        let r = Expr::var("R");
        let e = x() / r.clone() * r.clone();
        assert_eq!(normalize(&e), x());
        let diff = x() / r.clone() - x() / r;
        assert!(diff.is_zero());
    }

    #[test]
    fn test_constant_folding_is_exact() {
        // 1/49 * 49 is exactly 1 - exact rationals, not floats.
        let e = Expr::one() / Expr::integer(49) * Expr::integer(49);
        assert_eq!(normalize(&e), Expr::one());
        // (2*x)^-1 -> (1/2) * x^-1
        let inv = (Expr::integer(2) * x()).pow(Expr::integer(-1));
        let n = normalize(&inv);
        let expected = normalize(&(Expr::constant(0.5) * x().pow(Expr::integer(-1))));
        assert_eq!(n, expected);
    }

    #[test]
    fn test_canonical_ordering_is_stable() {
        let a = normalize(&(y() + x()));
        let b = normalize(&(x() + y()));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_power_collection() {
        let e = x() * x();
        assert_eq!(normalize(&e), x().pow(Expr::integer(2)));
        let ee = x().pow(Expr::integer(2)) * x().pow(Expr::integer(-2));
        assert_eq!(normalize(&ee), Expr::one());
    }

    #[test]
    fn test_zero_annihilates_product() {
        let e = Expr::zero() * Expr::exp(x());
        assert!(normalize(&e).is_zero());
    }
}
