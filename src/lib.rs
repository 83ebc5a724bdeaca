//! A leximax multi-objective Boolean optimisation encoder.
//!
//! Given hard constraints in CNF and an ordered list of objectives — each a
//! set of soft clauses whose cost is the number of falsified clauses — the
//! solver searches for a model of the hard constraints that minimises the
//! leximax order of the cost vector: sort the per-objective costs
//! non-increasingly and compare lexicographically.
//!
//! The encoder builds one odd-even merge sorting network per objective,
//! relaxes the sorted vectors iteration by iteration, and delegates each
//! single-objective subproblem to an external MaxSAT, pseudo-Boolean or LP
//! solver running as a child process. After `N` iterations (one per
//! objective) every coordinate of the optimal cost vector is fixed.
//!
//! ```no_run
//! use leximax::Formalism;
//! use leximax::LeximaxSolver;
//! use leximax::Lit;
//!
//! let mut solver = LeximaxSolver::new();
//! solver.set_ext_solver_cmd("open-wbo");
//! solver.set_formalism(Formalism::Wcnf);
//! // hard: x1 ∨ x2; two objectives penalising each variable
//! solver.set_problem(
//!     vec![vec![Lit::positive(1), Lit::positive(2)]],
//!     vec![
//!         vec![vec![Lit::negative(1)]],
//!         vec![vec![Lit::negative(2)]],
//!     ],
//! )?;
//! let status = solver.solve()?;
//! println!("{status}: {:?}", solver.get_objective_vector());
//! # Ok::<(), leximax::LeximaxError>(())
//! ```

pub(crate) mod basic_types;
pub(crate) mod driver;
pub(crate) mod encoding;
pub(crate) mod error;
pub(crate) mod options;
pub(crate) mod optimisation;
pub(crate) mod presolve;
pub(crate) mod problem;
pub mod termination;
#[cfg(test)]
pub(crate) mod test_helper;
pub mod weighted;

pub use basic_types::leximax_sorted;
pub use basic_types::Assignment;
pub use basic_types::Clause;
pub use basic_types::Lit;
pub use error::LeximaxError;
pub use optimisation::LeximaxSolver;
pub use optimisation::SolveStatus;
pub use options::Formalism;
pub use options::LpSolver;
pub use options::UbPresolve;
pub use presolve::SatOracle;
pub use termination::SignalHandler;
pub use termination::TerminationSignal;
