//! The circuit-to-solver compiler.
//!
//! Compiles a symbolic [`Analysis`] into a [`TransientSolution`]: the
//! differential equations are discretized with the trapezoidal rule, the
//! algebraic system is split into a closed-form linear part and a
//! residual nonlinear part, and the nonlinear part is emitted as a
//! Newton-Raphson update block. Steady-state initial conditions are
//! computed by the same machinery with the derivatives pinned to zero.
//!
//! The compiler is a pure function of its inputs: same analysis, same
//! time step, same output, down to the rendered text. Downstream code
//! generation caches rely on that.

use crate::algebra::{
    derivative, factor, AlgebraError, Arrow, Equation, Expr, NewtonSolver,
    DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE,
};
use crate::analysis::Analysis;
use crate::error::{CompilerError, Result};
use crate::log::Log;

use super::gauss::{self, linearize, SystemOfEquations};
use super::integrate::integrate_trapezoid;
use super::linear_combination::LinearCombination;
use super::solution::{
    LinearSolutions, NewtonIteration, SolutionSet, TransientSolution,
};

/// Configuration for the compiler.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Whether to compute steady-state initial conditions.
    pub with_initial_conditions: bool,
    /// Iteration cap for the steady-state numeric solve.
    pub dc_max_iterations: usize,
    /// Convergence tolerance for the steady-state numeric solve.
    pub dc_tolerance: f64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            with_initial_conditions: true,
            dc_max_iterations: DEFAULT_MAX_ITERATIONS,
            dc_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl CompilerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the steady-state analysis.
    pub fn with_initial_conditions(mut self, enabled: bool) -> Self {
        self.with_initial_conditions = enabled;
        self
    }

    /// Set the steady-state iteration cap.
    pub fn with_dc_max_iterations(mut self, max_iterations: usize) -> Self {
        self.dc_max_iterations = max_iterations;
        self
    }

    /// Set the steady-state convergence tolerance.
    pub fn with_dc_tolerance(mut self, tolerance: f64) -> Self {
        self.dc_tolerance = tolerance;
        self
    }
}

impl TransientSolution {
    /// Compile an analysis into a transient solution with default
    /// configuration.
    pub fn solve(analysis: &Analysis, time_step: f64, log: &dyn Log) -> Result<Self> {
        Self::solve_with_config(analysis, time_step, &CompilerConfig::default(), log)
    }

    /// Compile an analysis into a transient solution.
    pub fn solve_with_config(
        analysis: &Analysis,
        time_step: f64,
        config: &CompilerConfig,
        log: &dyn Log,
    ) -> Result<Self> {
        if !time_step.is_finite() || time_step <= 0.0 {
            return Err(CompilerError::invalid_time_step(time_step));
        }

        let mut unknowns: Vec<Expr> = analysis.unknowns().to_vec();
        let mna: Vec<Equation> = analysis.equations().to_vec();

        log.info(&format!(
            "Compiling transient solution: {} equations, {} unknowns, h = {}",
            mna.len(),
            unknowns.len(),
            time_step
        ));

        // The derivatives the system actually references.
        let derivatives: Vec<Expr> = unknowns
            .iter()
            .map(|y| Expr::time_derivative(y.clone()))
            .filter(|d| mna.iter().any(|eq| eq.depends_on(std::slice::from_ref(d))))
            .collect();

        // Steady state. Soft failure: warn and start from zero.
        let initial_conditions = if config.with_initial_conditions {
            match steady_state(analysis, &derivatives, config) {
                Ok(values) => {
                    log.verbose(&format!(
                        "Steady state solved for {} unknowns",
                        values.len()
                    ));
                    values
                }
                Err(error) => {
                    log.warning(&format!(
                        "Unable to solve steady state ({error}); \
                         initial conditions left empty"
                    ));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        // Split the differential equations from the algebraic ones.
        let mut diffeq = SystemOfEquations::new();
        let mut algebraic: Vec<Equation> = Vec::with_capacity(mna.len());
        for equation in mna {
            if !derivatives.is_empty() && equation.depends_on(&derivatives) {
                match linearize(&equation.residual(), &derivatives) {
                    Some(row) => diffeq.push(row),
                    None => {
                        return Err(CompilerError::nonlinear_differential(
                            equation.to_string(),
                        ))
                    }
                }
            } else {
                algebraic.push(equation);
            }
        }
        let mut mna = algebraic;

        // Integrate the differential subsystem: solve for each dy/dt,
        // discretize, and fold the updates back into the algebraic
        // system. Rows with no derivative left are plain constraints.
        if !diffeq.is_empty() {
            diffeq.row_reduce(&derivatives);
            diffeq.back_substitute(&derivatives);
            let mut solved = diffeq.solve_and_remove(&derivatives)?;
            solved.reverse();
            for update in integrate_trapezoid(&solved, time_step)? {
                mna.push(Equation::new(update.left, update.right));
            }
            for row in diffeq.into_rows() {
                let constraint = row.to_expression();
                if !constraint.is_zero() {
                    mna.push(Equation::new(constraint, Expr::zero()));
                }
            }
        }

        let mut solution_sets: Vec<SolutionSet> = Vec::new();

        // Peel off the unknowns that have closed-form solutions: solve
        // the linear part, keep only arrows free of the remaining
        // unknowns, and substitute them back.
        let mut linear = gauss::solve(&mna, &unknowns)?;
        linear.retain(|arrow| !arrow.right.depends_on(&unknowns));
        if linear.is_empty() {
            log.verbose("No closed-form linear solutions");
        } else {
            linear.sort_by_key(|arrow| {
                unknowns.iter().position(|u| *u == arrow.left)
            });
            mna = mna.iter().map(|eq| eq.evaluate(&linear)).collect();
            unknowns.retain(|u| linear.iter().all(|arrow| arrow.left != *u));
            let solutions: Vec<Arrow> = linear
                .into_iter()
                .map(|arrow| Arrow::new(arrow.left, factor(&arrow.right)))
                .collect();
            log.verbose(&format!(
                "{} unknowns solved in closed form",
                solutions.len()
            ));
            solution_sets.push(SolutionSet::Linear(LinearSolutions { solutions }));
        }

        // Whatever is left needs Newton iteration.
        if !unknowns.is_empty() {
            log.verbose(&format!(
                "{} unknowns require Newton iteration",
                unknowns.len()
            ));
            let newton = newton_iteration(&mna, &unknowns)?;
            solution_sets.push(SolutionSet::Newton(newton));
        }

        Ok(TransientSolution {
            time_step,
            solutions: solution_sets,
            initial_conditions,
        })
    }
}

// Build the Newton update block for the remaining unknowns.
//
// The Jacobian row for residual F is sum over j of dF/dy_j * δy_j + F,
// so the constant column carries the residual explicitly. Delta columns
// whose coefficients are free of the unknowns (and of the deltas) drop
// out linearly: they are row-reduced away symbolically and emitted as
// closed-form updates, leaving a dense numeric core for the runtime.
fn newton_iteration(mna: &[Equation], unknowns: &[Expr]) -> Result<NewtonIteration> {
    let residuals: Vec<Expr> = mna
        .iter()
        .map(|eq| eq.residual())
        .filter(|f| !f.is_zero())
        .collect();
    let deltas: Vec<Expr> = unknowns.iter().map(NewtonIteration::delta).collect();

    let mut jacobian = SystemOfEquations::new();
    for residual in &residuals {
        let mut row =
            LinearCombination::with_constant(deltas.iter().cloned(), residual.clone());
        for (y, delta) in unknowns.iter().zip(&deltas) {
            row.set_coefficient(delta, derivative(residual, y));
        }
        jacobian.push(row);
    }

    // Partition the delta columns into linear and nonlinear.
    let mut sensitive: Vec<Expr> = unknowns.to_vec();
    sensitive.extend(deltas.iter().cloned());
    let mut linear_deltas: Vec<Expr> = Vec::new();
    let mut nonlinear_deltas: Vec<Expr> = Vec::new();
    for delta in &deltas {
        let linear = jacobian
            .rows()
            .iter()
            .all(|row| !row.coefficient(delta).depends_on(&sensitive));
        if linear {
            linear_deltas.push(delta.clone());
        } else {
            nonlinear_deltas.push(delta.clone());
        }
    }

    // One delta left overall: the row is linear in it by construction,
    // so the block collapses to the scalar update δy := -F/F'.
    if deltas.len() == 1 {
        linear_deltas = deltas.clone();
        nonlinear_deltas.clear();
    }

    // Linear columns first, then reduce over them only.
    let mut order = linear_deltas.clone();
    order.extend(nonlinear_deltas.iter().cloned());
    for row in jacobian.rows_mut() {
        row.swap_columns(&order);
    }
    jacobian.row_reduce(&linear_deltas);
    let mut linear_updates = jacobian.solve_and_remove(&linear_deltas)?;

    // Every linear delta needs a usable row; a column that lost both its
    // pivot and every nonzero entry is a structural singularity.
    for (y, delta) in unknowns.iter().zip(&deltas) {
        if linear_deltas.contains(delta)
            && linear_updates.iter().all(|arrow| arrow.left != *delta)
        {
            return Err(CompilerError::singular_jacobian(y.to_string()));
        }
    }

    for arrow in &mut linear_updates {
        arrow.right = factor(&arrow.right);
    }
    let mut jacobian = jacobian.into_rows();
    for row in &mut jacobian {
        row.map_entries(factor);
    }

    let previous_step = [Arrow::new(Expr::t(), Expr::t0())];
    let initial_guess: Vec<Arrow> = unknowns
        .iter()
        .map(|y| Arrow::new(y.clone(), y.evaluate(&previous_step)))
        .collect();

    Ok(NewtonIteration {
        linear_updates,
        jacobian,
        nonlinear_deltas,
        initial_guess,
    })
}

// Steady state: derivatives pinned to zero, both time symbols at zero,
// hints applied, then a numeric solve from an all-zero guess.
fn steady_state(
    analysis: &Analysis,
    derivatives: &[Expr],
    config: &CompilerConfig,
) -> std::result::Result<Vec<Arrow>, AlgebraError> {
    let zero_time = [
        Arrow::new(Expr::t(), Expr::zero()),
        Arrow::new(Expr::t0(), Expr::zero()),
    ];
    let zero_derivatives: Vec<Arrow> = derivatives
        .iter()
        .map(|d| Arrow::new(d.clone(), Expr::zero()))
        .collect();
    // Hints are authored against current-time symbols; move them to the
    // steady-state instant before applying.
    let hints: Vec<Arrow> = analysis
        .initial_conditions()
        .iter()
        .map(|hint| {
            Arrow::new(
                hint.left.evaluate(&zero_time),
                hint.right.evaluate(&zero_time),
            )
        })
        .collect();

    let residuals: Vec<Expr> = analysis
        .equations()
        .iter()
        .map(|eq| {
            eq.residual()
                .evaluate(&zero_derivatives)
                .evaluate(&zero_time)
                .evaluate(&hints)
        })
        .filter(|f| !f.is_zero())
        .collect();

    let guess: Vec<Arrow> = analysis
        .unknowns()
        .iter()
        .map(|y| Arrow::new(y.evaluate(&zero_time), Expr::zero()))
        .collect();

    NewtonSolver::with_config(config.dc_max_iterations, config.dc_tolerance)
        .solve(&residuals, &guess)
}
