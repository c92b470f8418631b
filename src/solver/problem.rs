//! Defines the nonlinear program that the trajectory builder constructs.
//!
//! A problem is a registry of scalar decision variables together with an objective
//! function, a list of equality constraints `h(x) = 0` and a list of inequality
//! constraints `g(x) < 0`. Objective and constraints are plain closures over the
//! packed variable vector, so the problem carries no knowledge of the trajectory
//! domain and a solver backend carries no knowledge of the problem structure.
//!
//! The inequality constraints model an open feasible region, matching the strict
//! inequalities of the drivetrain limits. Numerically a backend treats a
//! boundary-exact point (`g(x) = 0`) as feasible; strictness is a modeling choice,
//! not a safety margin.

extern crate nalgebra as na;

use na::DVector;

#[cfg(test)]
#[path = "problem_tests.rs"]
mod problem_tests;

/// The signature of a scalar function over the packed decision-variable vector.
type ScalarFunction = Box<dyn Fn(&[f64]) -> f64>;

/// Defines a handle to a single scalar decision variable in an [NlpProblem].
///
/// Handles are only meaningful for the problem that created them; a fresh problem
/// hands out a fresh set of handles.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Variable {
    index: usize,
}

impl Variable {
    /// Returns the position of this variable in the packed variable vector.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Defines a nonlinear program under construction.
///
/// A problem instance is built once, solved once and then discarded; handles and
/// initial values must not be carried over to another instance.
pub struct NlpProblem {
    /// Initial value for each variable, indexed by [Variable::index]. Doubles as
    /// the variable count.
    initial_values: Vec<f64>,

    /// The objective function to minimize. Zero until [NlpProblem::minimize] is
    /// called.
    objective: Option<ScalarFunction>,

    /// Equality constraint residuals, feasible when exactly zero.
    equalities: Vec<ScalarFunction>,

    /// Inequality constraint values, feasible when negative.
    inequalities: Vec<ScalarFunction>,
}

impl NlpProblem {
    /// Creates a new, empty problem.
    pub fn new() -> Self {
        Self {
            initial_values: Vec::new(),
            objective: None,
            equalities: Vec::new(),
            inequalities: Vec::new(),
        }
    }

    /// Registers a new scalar decision variable with an initial value of zero.
    pub fn add_variable(&mut self) -> Variable {
        let index = self.initial_values.len();
        self.initial_values.push(0.0);
        Variable { index }
    }

    /// Registers 'count' new scalar decision variables with initial values of zero.
    pub fn add_variables(&mut self, count: usize) -> Vec<Variable> {
        (0..count).map(|_| self.add_variable()).collect()
    }

    /// Sets the initial value for a decision variable.
    ///
    /// ## Parameters
    ///
    /// * 'variable' - The variable to seed.
    /// * 'value' - The value the solver should start from.
    pub fn set_initial(&mut self, variable: Variable, value: f64) {
        self.initial_values[variable.index()] = value;
    }

    /// Sets the objective function to minimize, replacing any previous objective.
    pub fn minimize<F>(&mut self, objective: F)
    where
        F: Fn(&[f64]) -> f64 + 'static,
    {
        self.objective = Some(Box::new(objective));
    }

    /// Adds an equality constraint. The given residual function must evaluate to
    /// zero at any feasible point.
    pub fn constrain_equality<F>(&mut self, residual: F)
    where
        F: Fn(&[f64]) -> f64 + 'static,
    {
        self.equalities.push(Box::new(residual));
    }

    /// Adds an inequality constraint. The given function must evaluate to a
    /// negative value at any interior feasible point; zero is on the boundary.
    pub fn constrain_inequality<F>(&mut self, value: F)
    where
        F: Fn(&[f64]) -> f64 + 'static,
    {
        self.inequalities.push(Box::new(value));
    }

    /// Returns the number of decision variables.
    pub fn dimension(&self) -> usize {
        self.initial_values.len()
    }

    /// Returns the number of equality constraints.
    pub fn equality_count(&self) -> usize {
        self.equalities.len()
    }

    /// Returns the number of inequality constraints.
    pub fn inequality_count(&self) -> usize {
        self.inequalities.len()
    }

    /// Returns the initial point the solver should start from.
    pub fn initial_point(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.initial_values)
    }

    /// Evaluates the objective at the given point. A problem without an objective
    /// evaluates to zero, turning the solve into a pure feasibility search.
    pub fn objective(&self, point: &[f64]) -> f64 {
        match &self.objective {
            Some(objective) => objective(point),
            None => 0.0,
        }
    }

    /// Evaluates the equality constraint with the given index at the given point.
    pub fn equality_residual(&self, index: usize, point: &[f64]) -> f64 {
        (self.equalities[index])(point)
    }

    /// Evaluates the inequality constraint with the given index at the given point.
    pub fn inequality_value(&self, index: usize, point: &[f64]) -> f64 {
        (self.inequalities[index])(point)
    }

    /// Returns the largest constraint violation at the given point: the maximum of
    /// all absolute equality residuals and all positive inequality values.
    pub fn max_violation(&self, point: &[f64]) -> f64 {
        let equality_violation = self
            .equalities
            .iter()
            .map(|h| h(point).abs())
            .fold(0.0, f64::max);
        let inequality_violation = self
            .inequalities
            .iter()
            .map(|g| g(point).max(0.0))
            .fold(0.0, f64::max);
        equality_violation.max(inequality_violation)
    }
}

impl Default for NlpProblem {
    fn default() -> Self {
        Self::new()
    }
}
