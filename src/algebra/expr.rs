//! Symbolic expression trees.
//!
//! Expressions are a tagged variant over the kinds the solver needs:
//! constants, variables, function calls, derivatives, sums, products and
//! powers. Sums and products are n-ary and kept flattened, so combining
//! like terms only ever has to look at one level of the tree.
//!
//! Constants are exact rationals. Row reduction leans on structural
//! cancellation (`c - (c/p)*p` must vanish), which floating point cannot
//! guarantee; rationals make every pivot and zero test exact. Values only
//! become `f64` at the numeric-evaluation boundary.
//!
//! Circuit unknowns are represented as function calls over the time
//! variable, e.g. `v_out(t)`. Substituting `t -> t0` therefore turns every
//! current-step value into its previous-step value `v_out(t0)`, and
//! substituting `t -> 0` produces the steady-state instance `v_out(0)`.

use std::cmp::Ordering;
use std::fmt;
use std::ops;

use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use super::equation::Arrow;
use super::simplify::normalize;
use super::AlgebraError;

/// Exact rational constant type.
pub type Rational = BigRational;

/// Name of the current-time variable.
pub const TIME: &str = "t";

/// Name of the previous-step time variable.
pub const TIME_PREV: &str = "t0";

/// A symbolic expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// An exact rational constant.
    Constant(Rational),
    /// A free variable: time symbols, parameters, Newton update deltas.
    Variable(String),
    /// A function application: circuit unknowns `v(t)`, input signals
    /// `V(t)`, and the built-in functions `exp` and `ln`.
    Call { name: String, args: Vec<Expr> },
    /// The derivative operator `D(f, x)`.
    Derivative { f: Box<Expr>, x: Box<Expr> },
    /// An n-ary sum. Kept flattened: no child is itself a `Sum`.
    Sum(Vec<Expr>),
    /// An n-ary product. Kept flattened: no child is itself a `Product`.
    Product(Vec<Expr>),
    /// `base ^ exponent`.
    Power { base: Box<Expr>, exponent: Box<Expr> },
}

impl Expr {
    /// Create a constant from a float. The conversion is exact; every
    /// finite `f64` is a rational. Non-finite values are not
    /// representable and collapse to zero.
    pub fn constant(value: f64) -> Self {
        debug_assert!(value.is_finite(), "constants must be finite");
        match Rational::from_float(value) {
            Some(r) => Expr::Constant(r),
            None => Expr::Constant(Rational::zero()),
        }
    }

    /// Create a constant from an integer.
    pub fn integer(value: i64) -> Self {
        Expr::Constant(Rational::from_integer(value.into()))
    }

    /// The constant zero.
    pub fn zero() -> Self {
        Expr::Constant(Rational::zero())
    }

    /// The constant one.
    pub fn one() -> Self {
        Expr::integer(1)
    }

    /// Create a free variable.
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    /// Create a function call.
    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    /// The current-time variable `t`.
    pub fn t() -> Self {
        Expr::var(TIME)
    }

    /// The previous-step time variable `t0`.
    pub fn t0() -> Self {
        Expr::var(TIME_PREV)
    }

    /// A circuit unknown or input signal: a function of the current time,
    /// e.g. `unknown("v_out")` is `v_out(t)`.
    pub fn unknown(name: impl Into<String>) -> Self {
        Expr::call(name, vec![Expr::t()])
    }

    /// The time derivative `D(y, t)` of an expression.
    pub fn time_derivative(y: Expr) -> Self {
        Expr::Derivative {
            f: Box::new(y),
            x: Box::new(Expr::t()),
        }
    }

    /// Natural exponential `exp(e)`.
    pub fn exp(e: Expr) -> Self {
        Expr::call("exp", vec![e])
    }

    /// Natural logarithm `ln(e)`.
    pub fn ln(e: Expr) -> Self {
        Expr::call("ln", vec![e])
    }

    /// Raise this expression to a power.
    pub fn pow(self, exponent: Expr) -> Self {
        Expr::Power {
            base: Box::new(self),
            exponent: Box::new(exponent),
        }
    }

    /// The rational value if this is a constant.
    pub fn as_constant(&self) -> Option<&Rational> {
        match self {
            Expr::Constant(v) => Some(v),
            _ => None,
        }
    }

    /// The value as an `f64` if this is a constant.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_constant().and_then(|r| r.to_f64())
    }

    /// Check whether this is a call to the named function.
    pub fn is_call(&self, name: &str) -> bool {
        matches!(self, Expr::Call { name: n, .. } if n == name)
    }

    /// If this is a derivative `D(f, x)`, return `(f, x)`.
    pub fn as_derivative(&self) -> Option<(&Expr, &Expr)> {
        match self {
            Expr::Derivative { f, x } => Some((f, x)),
            _ => None,
        }
    }

    /// Normalize to canonical form. See [`super::simplify`].
    pub fn simplified(&self) -> Expr {
        normalize(self)
    }

    /// Best-effort symbolic zero test: normalize, then check for the
    /// constant zero. Structural, not numerical.
    pub fn is_zero(&self) -> bool {
        matches!(normalize(self), Expr::Constant(v) if v.is_zero())
    }

    /// Check whether this expression structurally contains any of the
    /// given atoms.
    pub fn depends_on(&self, atoms: &[Expr]) -> bool {
        if atoms.contains(self) {
            return true;
        }
        match self {
            Expr::Constant(_) | Expr::Variable(_) => false,
            Expr::Call { args, .. } => args.iter().any(|a| a.depends_on(atoms)),
            Expr::Derivative { f, x } => f.depends_on(atoms) || x.depends_on(atoms),
            Expr::Sum(terms) => terms.iter().any(|e| e.depends_on(atoms)),
            Expr::Product(factors) => factors.iter().any(|e| e.depends_on(atoms)),
            Expr::Power { base, exponent } => base.depends_on(atoms) || exponent.depends_on(atoms),
        }
    }

    /// Substitute all arrows in parallel and normalize the result.
    ///
    /// Every node is matched against the arrow left-hand sides exactly
    /// once; replacements are not themselves re-substituted. The swap
    /// `[a := b, b := a]` therefore exchanges `a` and `b` rather than
    /// collapsing both to one of them.
    pub fn evaluate(&self, substitutions: &[Arrow]) -> Expr {
        normalize(&self.substitute(substitutions))
    }

    fn substitute(&self, substitutions: &[Arrow]) -> Expr {
        if let Some(arrow) = substitutions.iter().find(|a| a.left == *self) {
            return arrow.right.clone();
        }
        match self {
            Expr::Constant(_) | Expr::Variable(_) => self.clone(),
            Expr::Call { name, args } => Expr::Call {
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(substitutions)).collect(),
            },
            Expr::Derivative { f, x } => Expr::Derivative {
                f: Box::new(f.substitute(substitutions)),
                x: Box::new(x.substitute(substitutions)),
            },
            Expr::Sum(terms) => {
                Expr::Sum(terms.iter().map(|e| e.substitute(substitutions)).collect())
            }
            Expr::Product(factors) => Expr::Product(
                factors
                    .iter()
                    .map(|e| e.substitute(substitutions))
                    .collect(),
            ),
            Expr::Power { base, exponent } => Expr::Power {
                base: Box::new(base.substitute(substitutions)),
                exponent: Box::new(exponent.substitute(substitutions)),
            },
        }
    }

    /// Evaluate numerically. Atoms are looked up in `bindings` by
    /// structural equality; any atom left unbound is an error.
    pub fn eval(&self, bindings: &[(Expr, f64)]) -> Result<f64, AlgebraError> {
        if let Some((_, value)) = bindings.iter().find(|(e, _)| e == self) {
            return Ok(*value);
        }
        match self {
            Expr::Constant(v) => v.to_f64().ok_or(AlgebraError::NonFinite),
            Expr::Variable(name) => Err(AlgebraError::unbound(name)),
            Expr::Call { name, args } if name == "exp" && args.len() == 1 => {
                Ok(args[0].eval(bindings)?.exp())
            }
            Expr::Call { name, args } if name == "ln" && args.len() == 1 => {
                Ok(args[0].eval(bindings)?.ln())
            }
            Expr::Call { .. } | Expr::Derivative { .. } => {
                Err(AlgebraError::unbound(self.to_string()))
            }
            Expr::Sum(terms) => terms.iter().try_fold(0.0, |acc, e| Ok(acc + e.eval(bindings)?)),
            Expr::Product(factors) => factors
                .iter()
                .try_fold(1.0, |acc, e| Ok(acc * e.eval(bindings)?)),
            Expr::Power { base, exponent } => {
                Ok(base.eval(bindings)?.powf(exponent.eval(bindings)?))
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Expr::Constant(_) => 0,
            Expr::Variable(_) => 1,
            Expr::Call { .. } => 2,
            Expr::Derivative { .. } => 3,
            Expr::Power { .. } => 4,
            Expr::Product(_) => 5,
            Expr::Sum(_) => 6,
        }
    }
}

// Total order used for canonical term/factor ordering. Ranks the variant
// first, then compares contents.
impl Ord for Expr {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Expr::Constant(a), Expr::Constant(b)) => a.cmp(b),
            (Expr::Variable(a), Expr::Variable(b)) => a.cmp(b),
            (
                Expr::Call { name: a, args: x },
                Expr::Call { name: b, args: y },
            ) => a.cmp(b).then_with(|| cmp_slices(x, y)),
            (
                Expr::Derivative { f: a, x: ax },
                Expr::Derivative { f: b, x: bx },
            ) => a.cmp(b).then_with(|| ax.cmp(bx)),
            (
                Expr::Power {
                    base: a,
                    exponent: ax,
                },
                Expr::Power {
                    base: b,
                    exponent: bx,
                },
            ) => a.cmp(b).then_with(|| ax.cmp(bx)),
            (Expr::Product(a), Expr::Product(b)) => cmp_slices(a, b),
            (Expr::Sum(a), Expr::Sum(b)) => cmp_slices(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn cmp_slices(a: &[Expr], b: &[Expr]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x.cmp(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

// ============ Arithmetic combinators ============

impl ops::Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        Expr::Sum(vec![self, rhs])
    }
}

impl ops::Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        Expr::Sum(vec![self, -rhs])
    }
}

impl ops::Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        Expr::Product(vec![self, rhs])
    }
}

impl ops::Div for Expr {
    type Output = Expr;
    fn div(self, rhs: Expr) -> Expr {
        Expr::Product(vec![self, rhs.pow(Expr::integer(-1))])
    }
}

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Product(vec![Expr::integer(-1), self])
    }
}

// ============ Rendering ============

// If `term` is a negated expression, return its positive form.
fn negated_form(term: &Expr) -> Option<Expr> {
    match term {
        Expr::Constant(v) if v.is_negative() => Some(Expr::Constant(-v.clone())),
        Expr::Product(factors) => match factors.first() {
            Some(Expr::Constant(c)) if c.is_negative() => {
                let positive = -c.clone();
                let rest: Vec<Expr> = factors[1..].to_vec();
                if positive.is_one() && rest.len() == 1 {
                    rest.into_iter().next()
                } else if positive.is_one() {
                    Some(Expr::Product(rest))
                } else {
                    let mut v = vec![Expr::Constant(positive)];
                    v.extend(rest);
                    Some(Expr::Product(v))
                }
            }
            _ => None,
        },
        _ => None,
    }
}

// Write a factor, parenthesizing sums, quotient constants and negative
// constants.
fn write_factor(f: &mut fmt::Formatter<'_>, e: &Expr) -> fmt::Result {
    match e {
        Expr::Sum(_) => write!(f, "({e})"),
        Expr::Constant(v) if v.is_negative() || !v.is_integer() => write!(f, "({e})"),
        _ => write!(f, "{e}"),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{v}"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
            Expr::Derivative { f: func, x } => write!(f, "D({func}, {x})"),
            Expr::Power { base, exponent } => {
                match **base {
                    Expr::Sum(_) | Expr::Product(_) | Expr::Power { .. } => {
                        write!(f, "({base})")?
                    }
                    Expr::Constant(ref v) if v.is_negative() || !v.is_integer() => {
                        write!(f, "({base})")?
                    }
                    _ => write!(f, "{base}")?,
                }
                match **exponent {
                    Expr::Sum(_) | Expr::Product(_) | Expr::Power { .. } => {
                        write!(f, "^({exponent})")
                    }
                    _ => write!(f, "^{exponent}"),
                }
            }
            Expr::Product(factors) => {
                for (i, e) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                        write_factor(f, e)?;
                    } else {
                        match e {
                            Expr::Sum(_) => write!(f, "({e})")?,
                            _ => write!(f, "{e}")?,
                        }
                    }
                }
                Ok(())
            }
            Expr::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{term}")?;
                    } else if let Some(positive) = negated_form(term) {
                        write!(f, " - {positive}")?;
                    } else {
                        write!(f, " + {term}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Expr::unknown("v_a");
        let b = Expr::unknown("v_a");
        assert_eq!(a, b);
        assert_ne!(a, Expr::unknown("v_b"));
        // Same name, different time argument: distinct expressions.
        let prev = Expr::call("v_a", vec![Expr::t0()]);
        assert_ne!(a, prev);
    }

    #[test]
    fn test_float_constants_are_exact() {
        assert_eq!(Expr::constant(2.0), Expr::integer(2));
        assert_eq!(Expr::constant(0.5).as_f64(), Some(0.5));
    }

    #[test]
    fn test_depends_on_distinguishes_time_steps() {
        let v = Expr::unknown("v");
        let prev = Expr::call("v", vec![Expr::t0()]);
        let e = prev.clone() + Expr::integer(2) * Expr::t();
        assert!(!e.depends_on(&[v]));
        assert!(e.depends_on(&[prev]));
    }

    #[test]
    fn test_parallel_substitution_swaps() {
        let a = Expr::var("a");
        let b = Expr::var("b");
        let swap = [
            Arrow::new(a.clone(), b.clone()),
            Arrow::new(b.clone(), a.clone()),
        ];
        let e = a.clone() - b.clone();
        // Parallel: a - b becomes b - a, not 0.
        let swapped = e.evaluate(&swap);
        assert_eq!(swapped, (b - a).simplified());
    }

    #[test]
    fn test_substitution_reaches_call_arguments() {
        let v = Expr::unknown("v");
        let shifted = v.evaluate(&[Arrow::new(Expr::t(), Expr::t0())]);
        assert_eq!(shifted, Expr::call("v", vec![Expr::t0()]));
    }

    #[test]
    fn test_numeric_eval() {
        let v = Expr::unknown("v");
        let e = Expr::integer(2) * v.clone() + Expr::exp(v.clone());
        let value = e.eval(&[(v, 0.0)]).unwrap();
        assert!((value - 1.0).abs() < 1e-12);

        // Unbound atom is an error.
        assert!(Expr::var("x").eval(&[]).is_err());
    }

    #[test]
    fn test_display_is_stable() {
        let e = (Expr::var("a") - Expr::var("b")).simplified();
        assert_eq!(e.to_string(), "a - b");
        let p = (Expr::integer(2) * Expr::var("x")).simplified();
        assert_eq!(p.to_string(), "2*x");
    }
}
