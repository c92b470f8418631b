use super::*;

#[test]
fn test_variables_are_registered_in_order() {
    let mut problem = NlpProblem::new();
    let first = problem.add_variable();
    let second = problem.add_variable();
    let batch = problem.add_variables(3);

    assert_eq!(first.index(), 0);
    assert_eq!(second.index(), 1);
    assert_eq!(batch.iter().map(Variable::index).collect::<Vec<_>>(), vec![2, 3, 4]);
    assert_eq!(problem.dimension(), 5);
}

#[test]
fn test_initial_point_defaults_to_zero() {
    let mut problem = NlpProblem::new();
    problem.add_variables(4);
    assert_eq!(problem.initial_point(), DVector::from_element(4, 0.0));
}

#[test]
fn test_set_initial() {
    let mut problem = NlpProblem::new();
    let a = problem.add_variable();
    let b = problem.add_variable();
    problem.set_initial(a, 5.0);
    problem.set_initial(b, -2.5);

    let point = problem.initial_point();
    assert_eq!(point[0], 5.0);
    assert_eq!(point[1], -2.5);
}

#[test]
fn test_objective_defaults_to_zero() {
    let mut problem = NlpProblem::new();
    problem.add_variable();
    assert_eq!(problem.objective(&[42.0]), 0.0);
}

#[test]
fn test_objective_evaluation() {
    let mut problem = NlpProblem::new();
    let a = problem.add_variable();
    let b = problem.add_variable();
    problem.minimize(move |x| x[a.index()] + 2.0 * x[b.index()]);

    assert_eq!(problem.objective(&[1.0, 3.0]), 7.0);
}

#[test]
fn test_constraint_evaluation() {
    let mut problem = NlpProblem::new();
    let a = problem.add_variable();
    problem.constrain_equality(move |x| x[a.index()] - 1.0);
    problem.constrain_inequality(move |x| x[a.index()] - 10.0);

    assert_eq!(problem.equality_count(), 1);
    assert_eq!(problem.inequality_count(), 1);
    assert_eq!(problem.equality_residual(0, &[3.0]), 2.0);
    assert_eq!(problem.inequality_value(0, &[3.0]), -7.0);
}

#[test]
fn test_max_violation_mixes_both_constraint_kinds() {
    let mut problem = NlpProblem::new();
    let a = problem.add_variable();
    problem.constrain_equality(move |x| x[a.index()] - 1.0);
    problem.constrain_inequality(move |x| x[a.index()] - 2.0);

    // Equality violated by 2, inequality satisfied.
    assert_eq!(problem.max_violation(&[-1.0]), 2.0);

    // Equality violated by 3, inequality violated by 2.
    assert_eq!(problem.max_violation(&[4.0]), 3.0);
}

#[test]
fn test_boundary_exact_inequality_counts_as_feasible() {
    // The drivetrain limits are modeled as strict inequalities, but a point that
    // lands exactly on the boundary must not register as a violation.
    let mut problem = NlpProblem::new();
    let a = problem.add_variable();
    problem.constrain_inequality(move |x| x[a.index()] - 2.0);

    assert_eq!(problem.max_violation(&[2.0]), 0.0);
}

#[test]
fn test_feasible_point_has_zero_violation() {
    let mut problem = NlpProblem::new();
    let a = problem.add_variable();
    problem.constrain_equality(move |x| x[a.index()] - 1.0);
    problem.constrain_inequality(move |x| x[a.index()] - 2.0);

    assert_eq!(problem.max_violation(&[1.0]), 0.0);
}
