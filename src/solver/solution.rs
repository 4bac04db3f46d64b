//! Compiled solution sets.
//!
//! A [`TransientSolution`] is the compiler's output: a time step, an
//! ordered list of [`SolutionSet`]s that together update every unknown
//! once per sample, and the steady-state initial conditions. It is
//! immutable after construction; a per-sample runtime may read it from
//! any number of threads.

use std::fmt;

use crate::algebra::{Arrow, Expr};

use super::linear_combination::LinearCombination;

/// An ordered list of closed-form assignments, evaluated once per
/// sample. Each right-hand side references only previously assigned
/// unknowns, previous-step values, time symbols, inputs and constants.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSolutions {
    pub solutions: Vec<Arrow>,
}

/// One Newton-Raphson update step, emitted as data: the runtime seeds
/// the unknowns from `initial_guess`, then iterates - evaluate the
/// `jacobian` rows numerically, solve for the `nonlinear_deltas`, apply
/// the `linear_updates` to get the remaining deltas in closed form, and
/// step the unknowns until the update is below its tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonIteration {
    /// Delta assignments that drop out linearly, already in closed form.
    pub linear_updates: Vec<Arrow>,
    /// The remaining Jacobian rows, over the delta basis.
    pub jacobian: Vec<LinearCombination>,
    /// The update variables that must be solved numerically each
    /// iteration.
    pub nonlinear_deltas: Vec<Expr>,
    /// Starting point: each unknown seeded from its previous-step value.
    pub initial_guess: Vec<Arrow>,
}

impl NewtonIteration {
    /// The update variable paired with an unknown: `v_out(t)` maps to
    /// the variable `δv_out`. The mapping is a pure rename and is
    /// bijective over distinct unknown names.
    pub fn delta(unknown: &Expr) -> Expr {
        Expr::var(format!("δ{}", base_name(unknown)))
    }
}

fn base_name(unknown: &Expr) -> String {
    match unknown {
        Expr::Call { name, .. } => name.clone(),
        Expr::Variable(name) => name.clone(),
        other => other.to_string(),
    }
}

/// One stage of the compiled solution.
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionSet {
    /// Closed-form assignments applied in order.
    Linear(LinearSolutions),
    /// A Newton-Raphson update block.
    Newton(NewtonIteration),
}

impl SolutionSet {
    /// The linear assignments, if this is a linear set.
    pub fn as_linear(&self) -> Option<&LinearSolutions> {
        match self {
            SolutionSet::Linear(s) => Some(s),
            _ => None,
        }
    }

    /// The Newton block, if this is one.
    pub fn as_newton(&self) -> Option<&NewtonIteration> {
        match self {
            SolutionSet::Newton(n) => Some(n),
            _ => None,
        }
    }
}

/// The compiled transient solver for one circuit at one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientSolution {
    pub(crate) time_step: f64,
    pub(crate) solutions: Vec<SolutionSet>,
    pub(crate) initial_conditions: Vec<Arrow>,
}

impl TransientSolution {
    /// The time step `h`, in seconds.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// The ordered solution sets. Evaluating them in order updates every
    /// unknown for one sample.
    pub fn solutions(&self) -> &[SolutionSet] {
        &self.solutions
    }

    /// Steady-state values of the unknowns at `t = 0`. Empty if the DC
    /// analysis was skipped or failed.
    pub fn initial_conditions(&self) -> &[Arrow] {
        &self.initial_conditions
    }
}

impl fmt::Display for LinearSolutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "LinearSolutions:")?;
        for arrow in &self.solutions {
            writeln!(f, "  {arrow}")?;
        }
        Ok(())
    }
}

impl fmt::Display for NewtonIteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "NewtonIteration:")?;
        for arrow in &self.initial_guess {
            writeln!(f, "  guess {arrow}")?;
        }
        for row in &self.jacobian {
            writeln!(f, "  solve {row}")?;
        }
        for delta in &self.nonlinear_deltas {
            writeln!(f, "  for {delta}")?;
        }
        for arrow in &self.linear_updates {
            writeln!(f, "  then {arrow}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SolutionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionSet::Linear(s) => fmt::Display::fmt(s, f),
            SolutionSet::Newton(n) => fmt::Display::fmt(n, f),
        }
    }
}

impl fmt::Display for TransientSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TransientSolution: h = {}", self.time_step)?;
        for set in &self.solutions {
            write!(f, "{set}")?;
        }
        writeln!(f, "initial conditions:")?;
        for arrow in &self.initial_conditions {
            writeln!(f, "  {arrow}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_mapping_is_a_rename() {
        let v = Expr::unknown("v_out");
        assert_eq!(NewtonIteration::delta(&v), Expr::var("δv_out"));
        // Distinct unknowns map to distinct deltas.
        assert_ne!(
            NewtonIteration::delta(&Expr::unknown("a")),
            NewtonIteration::delta(&Expr::unknown("b"))
        );
    }
}
