//! Trapezoidal discretization of first-order ODEs.
//!
//! Turns symbolic derivative assignments `D(y, t) := f(y, t)` into the
//! implicit trapezoidal update
//!
//! ```text
//! y(t) = y(t0) + (h/2) * (f(y(t), t) + f(y(t0), t0))
//! ```
//!
//! The previous-step copy of `f` is produced by substituting `t -> t0`,
//! which rewrites every current-step unknown to its previous-step value.
//! The current-step copy keeps `y(t)`, so the update is implicit and goes
//! back into the algebraic system.

use crate::algebra::{normalize, Arrow, Expr};
use crate::error::{CompilerError, Result};

/// Discretize derivative assignments with the trapezoidal rule over a
/// time step `h`. Each input arrow must have a derivative `D(y, t)` on
/// its left-hand side; the output arrow assigns the corresponding `y`.
pub fn integrate_trapezoid(derivatives: &[Arrow], h: f64) -> Result<Vec<Arrow>> {
    let previous_step = [Arrow::new(Expr::t(), Expr::t0())];
    let half_step = Expr::constant(h / 2.0);

    derivatives
        .iter()
        .map(|arrow| {
            let Some((y, _)) = arrow.left.as_derivative() else {
                return Err(CompilerError::not_a_derivative(arrow.to_string()));
            };
            let y = y.clone();
            let y_prev = y.evaluate(&previous_step);
            let f_prev = arrow.right.evaluate(&previous_step);
            let update =
                y_prev + half_step.clone() * (arrow.right.clone() + f_prev);
            Ok(Arrow::new(y, normalize(&update)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc_update() {
        // D(v, t) := (u(t) - v(t)) * k, h = 2:
        // v = v(t0) + (u(t) - v(t))*k + (u(t0) - v(t0))*k
        let v = Expr::unknown("v");
        let u = Expr::unknown("u");
        let k = 0.25;
        let f = (u.clone() - v.clone()) * Expr::constant(k);
        let arrow = Arrow::new(Expr::time_derivative(v.clone()), f);

        let updates = integrate_trapezoid(&[arrow], 2.0).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].left, v);

        let v_prev = Expr::call("v", vec![Expr::t0()]);
        let u_prev = Expr::call("u", vec![Expr::t0()]);
        let bindings = [
            (v.clone(), 1.0),
            (u, 3.0),
            (v_prev, 2.0),
            (u_prev, 4.0),
        ];
        // 2 + 1*((3-1)*0.25 + (4-2)*0.25) = 3
        let value = updates[0].right.eval(&bindings).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_previous_step_substitution_is_complete() {
        let v = Expr::unknown("v");
        let arrow = Arrow::new(
            Expr::time_derivative(v.clone()),
            v.clone() * Expr::constant(-1.0),
        );
        let updates = integrate_trapezoid(&[arrow], 1.0 / 48000.0).unwrap();
        let v_prev = Expr::call("v", vec![Expr::t0()]);
        // The update references both the implicit current step and the
        // previous step.
        assert!(updates[0].right.depends_on(&[v.clone()]));
        assert!(updates[0].right.depends_on(&[v_prev]));
    }

    #[test]
    fn test_rejects_plain_assignment() {
        let arrow = Arrow::new(Expr::unknown("v"), Expr::zero());
        assert!(matches!(
            integrate_trapezoid(&[arrow], 1.0),
            Err(CompilerError::NotADerivative { .. })
        ));
    }
}
