//! Configuration enums for the external-solver interface.

use std::fmt::Display;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::LeximaxError;

/// The file format handed to the external optimisation solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Formalism {
    /// DIMACS weighted CNF; the solver is a MaxSAT solver.
    #[default]
    Wcnf,
    /// Pseudo-Boolean OPB with a `min:` line; the solver is a PBO solver.
    Opb,
    /// CPLEX LP format; the solver is one of the [`LpSolver`] family.
    Lp,
}

impl Display for Formalism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Formalism::Wcnf => write!(f, "wcnf"),
            Formalism::Opb => write!(f, "opb"),
            Formalism::Lp => write!(f, "lp"),
        }
    }
}

impl FromStr for Formalism {
    type Err = LeximaxError;

    fn from_str(s: &str) -> Result<Formalism, LeximaxError> {
        match s {
            "wcnf" => Ok(Formalism::Wcnf),
            "opb" => Ok(Formalism::Opb),
            "lp" => Ok(Formalism::Lp),
            other => Err(LeximaxError::InvalidConfig(format!(
                "`{other}` is not a valid formalism; expected one of wcnf opb lp"
            ))),
        }
    }
}

/// Which LP solver produced the output we are about to parse.
///
/// Every solver in this family writes its model in a different shape, so the
/// driver dispatches on this tag to pick the right parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LpSolver {
    #[default]
    Cplex,
    Gurobi,
    Glpk,
    #[value(name = "lp_solve")]
    LpSolve,
    Scip,
    Cbc,
}

impl Display for LpSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LpSolver::Cplex => write!(f, "cplex"),
            LpSolver::Gurobi => write!(f, "gurobi"),
            LpSolver::Glpk => write!(f, "glpk"),
            LpSolver::LpSolve => write!(f, "lp_solve"),
            LpSolver::Scip => write!(f, "scip"),
            LpSolver::Cbc => write!(f, "cbc"),
        }
    }
}

impl FromStr for LpSolver {
    type Err = LeximaxError;

    fn from_str(s: &str) -> Result<LpSolver, LeximaxError> {
        match s {
            "cplex" => Ok(LpSolver::Cplex),
            "gurobi" => Ok(LpSolver::Gurobi),
            "glpk" => Ok(LpSolver::Glpk),
            "lp_solve" => Ok(LpSolver::LpSolve),
            "scip" => Ok(LpSolver::Scip),
            "cbc" => Ok(LpSolver::Cbc),
            other => Err(LeximaxError::InvalidConfig(format!(
                "`{other}` is not a valid lp solver; expected one of \
                 cplex gurobi glpk lp_solve scip cbc"
            ))),
        }
    }
}

/// Upper-bound presolve strategy run before the first iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UbPresolve {
    /// No presolve.
    #[default]
    Off,
    /// One SAT call on the hard clauses; the model's cost vector bounds the
    /// optimum.
    Sat,
    /// SAT call followed by a greedy maximal-satisfiable-subset extension.
    Mss,
    /// One MaxSAT call over the union of all objectives' soft clauses.
    Maxsat,
}

impl UbPresolve {
    /// Maps the numeric presolve mode `{0, 1, 2, 3}` used by front-ends.
    pub fn from_mode(mode: u8) -> Result<UbPresolve, LeximaxError> {
        match mode {
            0 => Ok(UbPresolve::Off),
            1 => Ok(UbPresolve::Sat),
            2 => Ok(UbPresolve::Mss),
            3 => Ok(UbPresolve::Maxsat),
            other => Err(LeximaxError::InvalidConfig(format!(
                "`{other}` is not a valid upper-bound presolve mode; expected 0, 1, 2 or 3"
            ))),
        }
    }
}

impl Display for UbPresolve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UbPresolve::Off => write!(f, "off"),
            UbPresolve::Sat => write!(f, "sat"),
            UbPresolve::Mss => write!(f, "mss"),
            UbPresolve::Maxsat => write!(f, "maxsat"),
        }
    }
}
