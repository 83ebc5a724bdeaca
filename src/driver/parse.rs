//! Parsers for the output of every supported solver family.
//!
//! MaxSAT and PBO solvers print `s`/`v` lines; each LP solver has its own
//! table or key-value shape, so the driver dispatches on the configured
//! [`LpSolver`]. All parsers are tolerant of chatter around the model and
//! only trust the variables they can positively identify (`x<id>` atoms or
//! signed DIMACS ids). Fractional LP values are an error: integrality is
//! enforced when the file is written.

use crate::basic_types::Assignment;
use crate::error::LeximaxError;
use crate::options::Formalism;
use crate::options::LpSolver;

/// Tolerance when classifying an LP activity value as 0 or 1.
const INTEGRALITY_EPS: f64 = 1e-6;

/// What the output file told us.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedOutput {
    Model(Assignment),
    Unsatisfiable,
    /// Neither a model nor an unsatisfiability claim was found.
    Inconclusive,
}

pub(crate) fn parse_output(
    formalism: Formalism,
    lp_solver: LpSolver,
    text: &str,
    top_id: i32,
) -> Result<ParsedOutput, LeximaxError> {
    match formalism {
        Formalism::Wcnf | Formalism::Opb => Ok(parse_v_lines(text, top_id)),
        Formalism::Lp => match lp_solver {
            LpSolver::Cplex => read_cplex_output(text, top_id),
            LpSolver::Gurobi => read_gurobi_output(text, top_id),
            LpSolver::Glpk => read_glpk_output(text, top_id),
            LpSolver::LpSolve => read_lpsolve_output(text, top_id),
            LpSolver::Scip => read_scip_output(text, top_id),
            LpSolver::Cbc => read_cbc_output(text, top_id),
        },
    }
}

/// `s`/`v`-line output of MaxSAT, SAT and PBO solvers. Values accumulate
/// across `v` lines; anytime solvers that print successive models leave the
/// last (best) one in place.
fn parse_v_lines(text: &str, top_id: i32) -> ParsedOutput {
    let mut model = vec![0_i32; top_id as usize + 1];
    let mut saw_value = false;
    for line in text.lines() {
        let line = line.trim();
        if let Some(status) = line.strip_prefix("s ") {
            if status.trim().eq_ignore_ascii_case("UNSATISFIABLE") {
                return ParsedOutput::Unsatisfiable;
            }
        } else if is_value_line(line) {
            for token in line[1..].split_whitespace() {
                let Some(code) = parse_literal_token(token) else {
                    continue;
                };
                // 0 terminates a model in the DIMACS convention
                if code == 0 {
                    continue;
                }
                let var = code.unsigned_abs() as usize;
                if var < model.len() {
                    model[var] = code;
                    saw_value = true;
                }
            }
        }
    }
    if saw_value {
        ParsedOutput::Model(Assignment::from_model_vec(model))
    } else {
        ParsedOutput::Inconclusive
    }
}

fn is_value_line(line: &str) -> bool {
    line.starts_with('v')
        && line[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace())
}

/// Accepts `17`, `-17`, `+17`, `x17` and `-x17`.
fn parse_literal_token(token: &str) -> Option<i32> {
    let token = token.strip_prefix('+').unwrap_or(token);
    let (negative, token) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let token = token.strip_prefix('x').unwrap_or(token);
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let var: i32 = token.parse().ok()?;
    Some(if negative { -var } else { var })
}

fn read_cplex_output(text: &str, top_id: i32) -> Result<ParsedOutput, LeximaxError> {
    if text.to_ascii_lowercase().contains("infeasible") {
        return Ok(ParsedOutput::Unsatisfiable);
    }
    model_from_activities(LpSolver::Cplex, &extract_x_activities(text), top_id)
}

fn read_gurobi_output(text: &str, top_id: i32) -> Result<ParsedOutput, LeximaxError> {
    if text.to_ascii_lowercase().contains("infeasible") {
        return Ok(ParsedOutput::Unsatisfiable);
    }
    model_from_activities(LpSolver::Gurobi, &extract_x_activities(text), top_id)
}

fn read_glpk_output(text: &str, top_id: i32) -> Result<ParsedOutput, LeximaxError> {
    if text.to_ascii_lowercase().contains("problem has no") {
        return Ok(ParsedOutput::Unsatisfiable);
    }
    model_from_activities(LpSolver::Glpk, &extract_x_activities(text), top_id)
}

fn read_lpsolve_output(text: &str, top_id: i32) -> Result<ParsedOutput, LeximaxError> {
    if text.to_ascii_lowercase().contains("infeasible") {
        return Ok(ParsedOutput::Unsatisfiable);
    }
    model_from_activities(LpSolver::LpSolve, &extract_x_activities(text), top_id)
}

fn read_scip_output(text: &str, top_id: i32) -> Result<ParsedOutput, LeximaxError> {
    if text.to_ascii_lowercase().contains("infeasible") {
        return Ok(ParsedOutput::Unsatisfiable);
    }
    model_from_activities(LpSolver::Scip, &extract_x_activities(text), top_id)
}

fn read_cbc_output(text: &str, top_id: i32) -> Result<ParsedOutput, LeximaxError> {
    if text.to_ascii_lowercase().contains("infeasible") {
        return Ok(ParsedOutput::Unsatisfiable);
    }
    model_from_activities(LpSolver::Cbc, &extract_x_activities(text), top_id)
}

/// Scans every line for an `x<id>` atom followed by a numeric column and
/// collects the (variable, activity) pairs. This covers the table shapes of
/// all six LP solvers: the solvers differ in the columns *around* the pair,
/// not in the pair itself.
fn extract_x_activities(text: &str) -> Vec<(i32, f64)> {
    let mut activities = Vec::new();
    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        for (position, token) in tokens.iter().enumerate() {
            let Some(var) = x_variable(token) else {
                continue;
            };
            let value = tokens[position + 1..]
                .iter()
                .find_map(|candidate| candidate.parse::<f64>().ok());
            if let Some(value) = value {
                activities.push((var, value));
            }
            break;
        }
    }
    activities
}

fn x_variable(token: &str) -> Option<i32> {
    let digits = token.strip_prefix('x')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn model_from_activities(
    solver: LpSolver,
    activities: &[(i32, f64)],
    top_id: i32,
) -> Result<ParsedOutput, LeximaxError> {
    if activities.is_empty() {
        return Ok(ParsedOutput::Inconclusive);
    }
    let mut model = vec![0_i32; top_id as usize + 1];
    for &(var, value) in activities {
        let truth = if value.abs() < INTEGRALITY_EPS {
            false
        } else if (value - 1.0).abs() < INTEGRALITY_EPS {
            true
        } else {
            return Err(LeximaxError::SolverError(format!(
                "fractional value {value} for variable x{var} in {solver} output"
            )));
        };
        if (var as usize) < model.len() {
            model[var as usize] = if truth { var } else { -var };
        }
    }
    Ok(ParsedOutput::Model(Assignment::from_model_vec(model)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic_types::Lit;

    fn value(output: &ParsedOutput, var: i32) -> bool {
        match output {
            ParsedOutput::Model(assignment) => assignment.value(Lit::positive(var)),
            other => panic!("expected a model, got {other:?}"),
        }
    }

    #[test]
    fn maxsat_v_lines() {
        let text = "c comment\no 3\ns OPTIMUM FOUND\nv 1 -2 3 0\n";
        let parsed = parse_v_lines(text, 3);
        assert!(value(&parsed, 1));
        assert!(!value(&parsed, 2));
        assert!(value(&parsed, 3));
    }

    #[test]
    fn later_models_of_an_anytime_solver_win() {
        let text = "o 2\nv 1 2 0\no 1\nv -1 2 0\n";
        let parsed = parse_v_lines(text, 2);
        assert!(!value(&parsed, 1));
        assert!(value(&parsed, 2));
    }

    #[test]
    fn opb_style_atoms() {
        let text = "s OPTIMUM FOUND\nv x1 -x2 x3\n";
        let parsed = parse_v_lines(text, 3);
        assert!(value(&parsed, 1));
        assert!(!value(&parsed, 2));
        assert!(value(&parsed, 3));
    }

    #[test]
    fn unsatisfiable_status_line() {
        assert_eq!(
            parse_v_lines("c nope\ns UNSATISFIABLE\n", 2),
            ParsedOutput::Unsatisfiable
        );
    }

    #[test]
    fn chatter_only_is_inconclusive() {
        assert_eq!(parse_v_lines("c killed\n", 2), ParsedOutput::Inconclusive);
    }

    #[test]
    fn cplex_table() {
        let text = "\
CPLEX> MIP - Integer optimal solution:  Objective =  1.0000000000e+00
Variable Name           Solution Value
x1                            1.000000
x2                            0.000000
";
        let parsed = read_cplex_output(text, 2).unwrap();
        assert!(value(&parsed, 1));
        assert!(!value(&parsed, 2));
    }

    #[test]
    fn gurobi_solution_file() {
        let text = "# Objective value = 1\nx1 1\nx2 0\n";
        let parsed = read_gurobi_output(text, 2).unwrap();
        assert!(value(&parsed, 1));
        assert!(!value(&parsed, 2));
    }

    #[test]
    fn glpk_column_table() {
        let text = "\
   No. Column name       Activity     Lower bound   Upper bound
------ ------------    ------------- ------------- -------------
     1 x1           *              1             0             1
     2 x2           *              0             0             1
";
        let parsed = read_glpk_output(text, 2).unwrap();
        assert!(value(&parsed, 1));
        assert!(!value(&parsed, 2));
    }

    #[test]
    fn lpsolve_values() {
        let text = "\
Value of objective function: 1

Actual values of the variables:
x1                              1
x2                              0
";
        let parsed = read_lpsolve_output(text, 2).unwrap();
        assert!(value(&parsed, 1));
        assert!(!value(&parsed, 2));
    }

    #[test]
    fn scip_primal_solution() {
        let text = "\
SCIP Status        : problem is solved [optimal solution found]
primal solution:
=================
x1                                                  1 \t(obj:1)
";
        let parsed = read_scip_output(text, 2).unwrap();
        assert!(value(&parsed, 1));
        // x2 does not appear: zero entries are omitted by scip
        assert!(!value(&parsed, 2));
    }

    #[test]
    fn cbc_solution_rows() {
        let text = "\
Result - Optimal solution found
      0 x1                             1                       1
      1 x2                             0                       0
";
        let parsed = read_cbc_output(text, 2).unwrap();
        assert!(value(&parsed, 1));
        assert!(!value(&parsed, 2));
    }

    #[test]
    fn infeasibility_is_reported_per_family() {
        assert_eq!(
            read_cplex_output("MIP - Integer infeasible.\n", 2).unwrap(),
            ParsedOutput::Unsatisfiable
        );
        assert_eq!(
            read_gurobi_output("Model is infeasible\n", 2).unwrap(),
            ParsedOutput::Unsatisfiable
        );
        assert_eq!(
            read_glpk_output("PROBLEM HAS NO INTEGER FEASIBLE SOLUTION\n", 2).unwrap(),
            ParsedOutput::Unsatisfiable
        );
        assert_eq!(
            read_lpsolve_output("This problem is infeasible\n", 2).unwrap(),
            ParsedOutput::Unsatisfiable
        );
        assert_eq!(
            read_scip_output("SCIP Status        : problem is solved [infeasible]\n", 2).unwrap(),
            ParsedOutput::Unsatisfiable
        );
        assert_eq!(
            read_cbc_output("Result - Problem proven infeasible\n", 2).unwrap(),
            ParsedOutput::Unsatisfiable
        );
    }

    #[test]
    fn fractional_activities_are_an_error() {
        let outcome = read_cplex_output("x1    0.500000\n", 1);
        assert!(matches!(outcome, Err(LeximaxError::SolverError(_))));
    }
}
