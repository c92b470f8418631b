//! Defines the nonlinear program representation and the solver backends.
//!
//! The trajectory problem builder only ever talks to the narrow [NlpSolver] trait so
//! that the numerical backend can be swapped without touching the problem
//! construction. The crate ships one backend, an augmented-Lagrangian method in
//! [augmented_lagrangian], but an adapter around an external interior-point or SQP
//! solver would fit behind the same trait.

use crate::Error;

/// Defines the nonlinear program: decision variables, objective and constraints.
pub mod problem;

/// Provides the built-in augmented-Lagrangian solver backend.
pub mod augmented_lagrangian;

use problem::{NlpProblem, Variable};

/// A point returned by a solver backend, indexed by the problem's variables.
#[derive(Clone, Debug)]
pub struct NlpSolution {
    values: Vec<f64>,
}

impl NlpSolution {
    /// Creates a new solution from the packed variable values.
    ///
    /// ## Parameters
    ///
    /// * 'values' - The value of every decision variable, in registration order.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Returns the solved value of the given decision variable.
    pub fn value(&self, variable: Variable) -> f64 {
        self.values[variable.index()]
    }
}

/// Defines the abstraction over nonlinear program solver backends.
///
/// A backend receives a fully constructed [NlpProblem] and either returns a point
/// that minimizes the objective subject to the constraints, or reports divergence.
pub trait NlpSolver {
    /// Solves the given problem starting from its initial point.
    ///
    /// ## Errors
    ///
    /// * [Error::SolverDivergence] - Returned when no feasible, optimal point could
    ///   be found within the backend's iteration budget.
    fn solve(&self, problem: &NlpProblem) -> Result<NlpSolution, Error>;
}
