//! Augmented-Lagrangian solver backend for the trajectory problem.
//!
//! Solves the constrained program by repeatedly minimizing the augmented
//! Lagrangian, written in its shifted-penalty form
//!
//! `L(x) = f(x) + (μ/2)·Σ (h(x) + λ/μ)² + (μ/2)·Σ max(0, g(x) + σ/μ)²`
//!
//! over an outer loop that updates the multipliers `λ` (equalities) and `σ`
//! (inequalities) and grows the penalty `μ` when the constraint violation does not
//! shrink fast enough. Because the constraint terms are a sum of squared
//! residuals, the inner minimization is a damped Gauss-Newton iteration: the
//! normal equations are assembled from a central finite-difference Jacobian of
//! the residuals (the problem exposes its functions as opaque closures, so no
//! analytic derivatives are available) and the damping adapts
//! Levenberg-Marquardt style, shrinking after an accepted step and growing after
//! a rejected one.
//!
//! This backend favors robustness over speed. It is sized for the sample counts
//! used in tests and for offline generation; wiring a sparse interior-point solver
//! behind [NlpSolver] is the upgrade path for large problems.

extern crate nalgebra as na;

use na::{DMatrix, DVector};

use crate::solver::problem::NlpProblem;
use crate::solver::{NlpSolution, NlpSolver};
use crate::Error;

#[cfg(test)]
#[path = "augmented_lagrangian_tests.rs"]
mod augmented_lagrangian_tests;

/// The smallest damping the inner iteration shrinks to.
const MIN_DAMPING: f64 = 1e-8;

/// The damping at which the inner iteration gives up on finding a descent step.
const MAX_DAMPING: f64 = 1e10;

/// The largest penalty μ the outer loop grows to. Keeps the merit function
/// finite when a problem has no feasible point at all.
const MAX_PENALTY: f64 = 1e12;

/// Configuration for the augmented-Lagrangian solver.
#[derive(Clone, Debug)]
pub struct AugmentedLagrangianConfig {
    /// Maximum number of outer multiplier/penalty iterations.
    /// Default: 60
    pub max_outer_iterations: usize,

    /// Maximum number of inner Gauss-Newton iterations per outer iteration.
    /// Default: 400
    pub max_inner_iterations: usize,

    /// Initial penalty parameter μ.
    /// Default: 10.0
    pub initial_penalty: f64,

    /// Factor by which μ grows when the violation does not shrink enough.
    /// Default: 5.0
    pub penalty_growth: f64,

    /// Largest constraint violation accepted as feasible.
    /// Default: 1e-6
    pub constraint_tolerance: f64,

    /// Merit gradient norm below which the inner minimization stops.
    /// Default: 1e-6
    pub gradient_tolerance: f64,

    /// Step size for the central finite-difference derivatives.
    /// Default: 1e-6
    pub finite_difference_step: f64,

    /// Required fractional decrease of the violation per outer iteration before
    /// the penalty is grown.
    /// Default: 0.25
    pub sufficient_violation_decrease: f64,

    /// Initial Gauss-Newton damping at the start of every inner minimization.
    /// Default: 1.0
    pub initial_damping: f64,

    /// Factor by which the damping grows after a rejected step and shrinks after
    /// an accepted one.
    /// Default: 10.0
    pub damping_adaptation: f64,
}

impl Default for AugmentedLagrangianConfig {
    fn default() -> Self {
        Self {
            max_outer_iterations: 60,
            max_inner_iterations: 400,
            initial_penalty: 10.0,
            penalty_growth: 5.0,
            constraint_tolerance: 1e-6,
            gradient_tolerance: 1e-6,
            finite_difference_step: 1e-6,
            sufficient_violation_decrease: 0.25,
            initial_damping: 1.0,
            damping_adaptation: 10.0,
        }
    }
}

impl AugmentedLagrangianConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for the outer iteration budget.
    pub fn with_max_outer_iterations(mut self, iterations: usize) -> Self {
        self.max_outer_iterations = iterations;
        self
    }

    /// Builder-style setter for the inner iteration budget.
    pub fn with_max_inner_iterations(mut self, iterations: usize) -> Self {
        self.max_inner_iterations = iterations;
        self
    }

    /// Builder-style setter for the accepted constraint violation.
    pub fn with_constraint_tolerance(mut self, tolerance: f64) -> Self {
        self.constraint_tolerance = tolerance;
        self
    }
}

/// An augmented-Lagrangian solver for the problems built by the trajectory
/// generator.
pub struct AugmentedLagrangian {
    config: AugmentedLagrangianConfig,
}

impl AugmentedLagrangian {
    /// Creates a new solver with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AugmentedLagrangianConfig::default())
    }

    /// Creates a new solver with the given configuration.
    pub fn with_config(config: AugmentedLagrangianConfig) -> Self {
        Self { config }
    }

    /// Evaluates the shifted constraint residuals at the given point: `h + λ/μ`
    /// for the equalities followed by `max(0, g + σ/μ)` for the inequalities. The
    /// squared norm of this vector, scaled by μ/2, is the constraint part of the
    /// augmented Lagrangian.
    fn shifted_residuals(
        &self,
        problem: &NlpProblem,
        point: &[f64],
        eq_multipliers: &[f64],
        ineq_multipliers: &[f64],
        penalty: f64,
    ) -> DVector<f64> {
        let mut residuals = DVector::zeros(eq_multipliers.len() + ineq_multipliers.len());

        for (index, multiplier) in eq_multipliers.iter().enumerate() {
            residuals[index] = problem.equality_residual(index, point) + multiplier / penalty;
        }

        for (index, multiplier) in ineq_multipliers.iter().enumerate() {
            residuals[eq_multipliers.len() + index] =
                (problem.inequality_value(index, point) + multiplier / penalty).max(0.0);
        }

        residuals
    }

    /// Evaluates the augmented Lagrangian at the given point, up to an additive
    /// term that does not depend on the point.
    fn merit(
        &self,
        problem: &NlpProblem,
        point: &[f64],
        eq_multipliers: &[f64],
        ineq_multipliers: &[f64],
        penalty: f64,
    ) -> f64 {
        let residuals =
            self.shifted_residuals(problem, point, eq_multipliers, ineq_multipliers, penalty);
        problem.objective(point) + 0.5 * penalty * residuals.norm_squared()
    }

    /// Evaluates all raw constraint functions at the given point, equalities
    /// first.
    fn constraint_values(problem: &NlpProblem, point: &[f64]) -> Vec<f64> {
        let mut values = Vec::with_capacity(problem.equality_count() + problem.inequality_count());
        for index in 0..problem.equality_count() {
            values.push(problem.equality_residual(index, point));
        }
        for index in 0..problem.inequality_count() {
            values.push(problem.inequality_value(index, point));
        }
        values
    }

    /// Computes the central finite-difference Jacobian of the constraint
    /// functions. Rows of inactive inequalities are zero: their clipped residual
    /// does not respond to the point, so they contribute nothing to the
    /// Gauss-Newton model.
    fn constraint_jacobian(
        &self,
        problem: &NlpProblem,
        point: &mut DVector<f64>,
        active: &[bool],
    ) -> DMatrix<f64> {
        let step = self.config.finite_difference_step;
        let mut jacobian = DMatrix::zeros(active.len(), point.len());
        for i in 0..point.len() {
            let original = point[i];

            point[i] = original + step;
            let forward = Self::constraint_values(problem, point.as_slice());

            point[i] = original - step;
            let backward = Self::constraint_values(problem, point.as_slice());

            point[i] = original;
            for (row, row_active) in active.iter().enumerate() {
                if *row_active {
                    jacobian[(row, i)] = (forward[row] - backward[row]) / (2.0 * step);
                }
            }
        }

        jacobian
    }

    /// Computes the central finite-difference gradient of the objective.
    fn objective_gradient(&self, problem: &NlpProblem, point: &mut DVector<f64>) -> DVector<f64> {
        let step = self.config.finite_difference_step;
        let mut gradient = DVector::zeros(point.len());
        for i in 0..point.len() {
            let original = point[i];

            point[i] = original + step;
            let forward = problem.objective(point.as_slice());

            point[i] = original - step;
            let backward = problem.objective(point.as_slice());

            point[i] = original;
            gradient[i] = (forward - backward) / (2.0 * step);
        }

        gradient
    }

    /// Minimizes the merit function from the given point with a damped
    /// Gauss-Newton iteration. Returns false when the iterate turned non-finite.
    fn minimize_merit(
        &self,
        problem: &NlpProblem,
        point: &mut DVector<f64>,
        eq_multipliers: &[f64],
        ineq_multipliers: &[f64],
        penalty: f64,
    ) -> bool {
        let dimension = point.len();
        let equality_count = problem.equality_count();
        let mut damping = self.config.initial_damping;

        let mut current = self.merit(
            problem,
            point.as_slice(),
            eq_multipliers,
            ineq_multipliers,
            penalty,
        );

        for _ in 0..self.config.max_inner_iterations {
            if !current.is_finite() {
                return false;
            }

            let residuals = self.shifted_residuals(
                problem,
                point.as_slice(),
                eq_multipliers,
                ineq_multipliers,
                penalty,
            );
            let active: Vec<bool> = (0..residuals.len())
                .map(|row| row < equality_count || residuals[row] > 0.0)
                .collect();
            let jacobian = self.constraint_jacobian(problem, point, &active);

            // ∇L = ∇f + μ Jᵀ c, the exact merit gradient at the current point.
            let gradient =
                self.objective_gradient(problem, point) + jacobian.transpose() * &residuals * penalty;
            let gradient_norm = gradient
                .iter()
                .fold(0.0_f64, |largest, g| largest.max(g.abs()));
            if gradient_norm < self.config.gradient_tolerance {
                break;
            }

            let hessian_model = jacobian.transpose() * &jacobian * penalty;

            let mut accepted = false;
            while damping <= MAX_DAMPING {
                let mut hessian = hessian_model.clone();
                for i in 0..dimension {
                    hessian[(i, i)] += damping;
                }

                // The damped model is positive definite, so the factorization only
                // fails on numerical breakdown; treat that like a rejected step.
                let step = match hessian.cholesky() {
                    Some(factor) => factor.solve(&gradient),
                    None => {
                        damping *= self.config.damping_adaptation;
                        continue;
                    }
                };

                let candidate = &*point - &step;
                let candidate_merit = self.merit(
                    problem,
                    candidate.as_slice(),
                    eq_multipliers,
                    ineq_multipliers,
                    penalty,
                );

                if candidate_merit.is_finite() && candidate_merit < current {
                    *point = candidate;
                    current = candidate_merit;
                    damping = (damping / self.config.damping_adaptation).max(MIN_DAMPING);
                    accepted = true;
                    break;
                }

                damping *= self.config.damping_adaptation;
            }

            if !accepted {
                // No descent step at any damping. Leave it to the outer loop to
                // change the landscape via the multipliers.
                break;
            }
        }

        true
    }
}

impl Default for AugmentedLagrangian {
    fn default() -> Self {
        Self::new()
    }
}

impl NlpSolver for AugmentedLagrangian {
    #[cfg_attr(test, mutants::skip)] // Long-running numeric loop, not sensibly mutation-testable
    fn solve(&self, problem: &NlpProblem) -> Result<NlpSolution, Error> {
        let mut point = problem.initial_point();
        let mut eq_multipliers = vec![0.0; problem.equality_count()];
        let mut ineq_multipliers = vec![0.0; problem.inequality_count()];
        let mut penalty = self.config.initial_penalty;
        let mut previous_violation = f64::INFINITY;

        for outer in 0..self.config.max_outer_iterations {
            let finite = self.minimize_merit(
                problem,
                &mut point,
                &eq_multipliers,
                &ineq_multipliers,
                penalty,
            );
            if !finite || point.iter().any(|v| !v.is_finite()) {
                return Err(Error::SolverDivergence {
                    iterations: outer + 1,
                    violation: f64::INFINITY,
                });
            }

            let violation = problem.max_violation(point.as_slice());
            if violation <= self.config.constraint_tolerance {
                return Ok(NlpSolution::new(point.as_slice().to_vec()));
            }

            // First-order multiplier updates.
            for (index, multiplier) in eq_multipliers.iter_mut().enumerate() {
                *multiplier += penalty * problem.equality_residual(index, point.as_slice());
            }
            for (index, multiplier) in ineq_multipliers.iter_mut().enumerate() {
                *multiplier = (*multiplier
                    + penalty * problem.inequality_value(index, point.as_slice()))
                .max(0.0);
            }

            // Grow the penalty only when the violation stalls.
            if violation > self.config.sufficient_violation_decrease * previous_violation {
                penalty = (penalty * self.config.penalty_growth).min(MAX_PENALTY);
            }
            previous_violation = violation;
        }

        Err(Error::SolverDivergence {
            iterations: self.config.max_outer_iterations,
            violation: problem.max_violation(point.as_slice()),
        })
    }
}
