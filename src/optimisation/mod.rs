//! The iterative leximax optimisation procedure.
//!
//! [`LeximaxSolver`] owns the whole assembly for one `solve()`: the clause
//! store, the fresh-variable counter, the per-objective sorted vectors and
//! the per-iteration relaxation layers. Iteration `i` encodes the relaxation,
//! hands the snapshot to the external solver with the objective "minimise
//! the componentwise-OR vector", reads the `i`-th largest cost off the model
//! and freezes it as a hard bound before moving on. After `N` iterations
//! every coordinate of the leximax-optimal cost vector is fixed.

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use log::info;

use crate::basic_types::Assignment;
use crate::basic_types::Clause;
use crate::basic_types::Lit;
use crate::driver::ExternalSolver;
use crate::driver::SolverVerdict;
use crate::encoding::relaxation::encode_relaxation;
use crate::encoding::sorting_net::encode_sorted;
use crate::encoding::ClauseStore;
use crate::encoding::EncodingContext;
use crate::encoding::VarManager;
use crate::error::LeximaxError;
use crate::options::Formalism;
use crate::options::LpSolver;
use crate::options::UbPresolve;
use crate::presolve;
use crate::presolve::PresolveOutcome;
use crate::presolve::SatOracle;
use crate::problem::objective_costs;
use crate::problem::validate;
use crate::problem::TermConverter;
use crate::termination::TerminationSignal;

/// How a `solve()` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Every one of the `N` leximax coordinates was fixed.
    Optimal,
    /// The solve was interrupted, but a feasible assignment (the best prefix
    /// achieved) is available.
    Satisfiable,
    /// The hard clauses are unsatisfiable.
    Unsatisfiable,
    /// Interrupted before any feasible assignment was found.
    Aborted,
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::Satisfiable => write!(f, "satisfiable"),
            SolveStatus::Unsatisfiable => write!(f, "unsatisfiable"),
            SolveStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Where a solve currently stands. Transitions are strictly forward;
/// `Done(Aborted)` is reachable from anywhere through the termination
/// signal or the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Encoding,
    Presolving,
    Iterating(usize),
    Done(SolveStatus),
}

/// The leximax encoder and solving loop.
///
/// Configure it through the setters, install a problem with
/// [`LeximaxSolver::set_problem`], then call [`LeximaxSolver::solve`]. A
/// solver instance is single-shot: call [`LeximaxSolver::clear`] before
/// reusing it.
pub struct LeximaxSolver {
    verbosity: u8,
    formalism: Formalism,
    lp_solver: LpSolver,
    ext_solver_cmd: Option<String>,
    ub_presolve: UbPresolve,
    timeout: Option<Duration>,
    simplify_last: bool,
    multiplication_string: String,
    leave_tmp_files: bool,
    tmp_dir: PathBuf,
    termination: TerminationSignal,
    oracle: Option<Box<dyn SatOracle>>,

    vars: VarManager,
    store: ClauseStore,
    objectives: Vec<Vec<Clause>>,
    terms: Vec<Vec<Lit>>,
    sorted_vecs: Vec<Vec<Lit>>,
    maxima: Vec<usize>,
    phase: Phase,
    solution: Option<Assignment>,
}

impl Default for LeximaxSolver {
    fn default() -> LeximaxSolver {
        LeximaxSolver {
            verbosity: 0,
            formalism: Formalism::default(),
            lp_solver: LpSolver::default(),
            ext_solver_cmd: None,
            ub_presolve: UbPresolve::default(),
            timeout: None,
            simplify_last: false,
            multiplication_string: "*".to_owned(),
            leave_tmp_files: false,
            tmp_dir: std::env::temp_dir(),
            termination: TerminationSignal::new(),
            oracle: None,
            vars: VarManager::default(),
            store: ClauseStore::default(),
            objectives: Vec::new(),
            terms: Vec::new(),
            sorted_vecs: Vec::new(),
            maxima: Vec::new(),
            phase: Phase::Fresh,
            solution: None,
        }
    }
}

impl std::fmt::Debug for LeximaxSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeximaxSolver")
            .field("formalism", &self.formalism)
            .field("lp_solver", &self.lp_solver)
            .field("ub_presolve", &self.ub_presolve)
            .field("simplify_last", &self.simplify_last)
            .field("num_objectives", &self.objectives.len())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl LeximaxSolver {
    pub fn new() -> LeximaxSolver {
        LeximaxSolver::default()
    }

    /// Installs the hard constraints and the ordered objective list,
    /// resetting any prior problem. Objectives are given as lists of soft
    /// clauses; an objective's cost is the number of its falsified clauses.
    pub fn set_problem(
        &mut self,
        hard: Vec<Clause>,
        objectives: Vec<Vec<Clause>>,
    ) -> Result<(), LeximaxError> {
        self.clear();
        validate(&hard, "hard constraints")?;
        for (index, objective) in objectives.iter().enumerate() {
            validate(objective, &format!("objective {index}"))?;
        }
        {
            let mut ctx = EncodingContext {
                store: &mut self.store,
                vars: &mut self.vars,
            };
            for clause in hard {
                ctx.add_hard(clause);
            }
        }
        // objective clauses may mention variables the hard clauses do not
        for objective in &objectives {
            for clause in objective {
                for &lit in clause {
                    self.vars.accommodate(lit);
                }
            }
        }
        self.objectives = objectives;
        Ok(())
    }

    pub fn set_formalism(&mut self, formalism: Formalism) {
        self.formalism = formalism;
    }

    pub fn set_lp_solver(&mut self, lp_solver: LpSolver) {
        self.lp_solver = lp_solver;
    }

    /// The shell command used to launch the external solver. It is split on
    /// whitespace at spawn time; the input file path is appended as the
    /// final argument.
    pub fn set_ext_solver_cmd(&mut self, command: impl Into<String>) {
        self.ext_solver_cmd = Some(command.into());
    }

    pub fn set_ub_presolve(&mut self, mode: UbPresolve) {
        self.ub_presolve = mode;
    }

    /// Deadline for each external solver call; also bounds how long an
    /// interrupted solve lingers before tearing the child down.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Skip the sorting networks in the last iteration and minimise the
    /// remaining un-frozen objective directly over its terms.
    pub fn set_simplify_last(&mut self, simplify_last: bool) {
        self.simplify_last = simplify_last;
    }

    /// Verbosity `0` is silent, `1` reports per-iteration solving info, `2`
    /// additionally dumps encoding detail. Other values are rejected.
    pub fn set_verbosity(&mut self, verbosity: u8) -> Result<(), LeximaxError> {
        if verbosity > 2 {
            return Err(LeximaxError::InvalidConfig(format!(
                "verbosity must be 0, 1 or 2, got {verbosity}"
            )));
        }
        self.verbosity = verbosity;
        Ok(())
    }

    /// Separator between coefficient and variable in the OPB and LP writers.
    pub fn set_multiplication_string(&mut self, separator: impl Into<String>) {
        self.multiplication_string = separator.into();
    }

    /// Keep the scratch files of every solver call around for debugging.
    pub fn set_leave_tmp_files(&mut self, leave: bool) {
        self.leave_tmp_files = leave;
    }

    /// Directory for scratch files; defaults to the system temp directory.
    pub fn set_tmp_dir(&mut self, dir: PathBuf) {
        self.tmp_dir = dir;
    }

    /// Installs the incremental SAT oracle used by the SAT and MSS presolve
    /// modes.
    pub fn set_sat_oracle(&mut self, oracle: impl SatOracle + 'static) {
        self.oracle = Some(Box::new(oracle));
    }

    /// A cloneable handle that aborts the running solve; see
    /// [`crate::termination::SignalHandler`] to wire it to SIGTERM/SIGINT.
    pub fn termination_signal(&self) -> TerminationSignal {
        self.termination.clone()
    }

    /// Aborts the running solve, collecting the best partial result.
    pub fn terminate(&self) {
        self.termination.terminate();
    }

    /// Whether a feasible assignment is available.
    pub fn get_sat(&self) -> bool {
        self.solution.is_some()
    }

    /// The best assignment found, if any.
    pub fn get_solution(&self) -> Option<&Assignment> {
        self.solution.as_ref()
    }

    /// Per-objective costs of the best assignment, in objective order.
    /// Empty when no assignment is available.
    pub fn get_objective_vector(&self) -> Vec<usize> {
        self.solution
            .as_ref()
            .map(|model| objective_costs(model, &self.terms))
            .unwrap_or_default()
    }

    /// The maxima frozen so far, one per completed iteration.
    pub fn frozen_maxima(&self) -> &[usize] {
        &self.maxima
    }

    /// The final status, once `solve()` has returned.
    pub fn status(&self) -> Option<SolveStatus> {
        match self.phase {
            Phase::Done(status) => Some(status),
            _ => None,
        }
    }

    /// Tears down every transient structure (clauses, sorted vectors,
    /// relaxation variables, the solution) and re-arms the termination
    /// flag. Configuration survives.
    pub fn clear(&mut self) {
        self.store.clear();
        self.vars = VarManager::default();
        self.objectives.clear();
        self.terms.clear();
        self.sorted_vecs.clear();
        self.maxima.clear();
        self.solution = None;
        self.phase = Phase::Fresh;
        self.termination.reset();
    }

    /// Runs the leximax loop to completion, to UNSAT, or to an interrupt.
    pub fn solve(&mut self) -> Result<SolveStatus, LeximaxError> {
        if self.phase != Phase::Fresh {
            return Err(LeximaxError::InvalidConfig(
                "solve() was already run on this instance; call clear() first".to_owned(),
            ));
        }
        let command = self.ext_solver_cmd.clone().ok_or_else(|| {
            LeximaxError::InvalidConfig("no external solver command configured".to_owned())
        })?;
        let mut driver = ExternalSolver::new(
            command,
            self.formalism,
            self.lp_solver,
            self.multiplication_string.clone(),
            self.tmp_dir.clone(),
            self.leave_tmp_files,
            self.timeout,
            self.termination.clone(),
        );

        self.phase = Phase::Encoding;
        self.convert_objectives();

        self.phase = Phase::Presolving;
        let upper_bound = match presolve::calculate_upper_bound(
            self.ub_presolve,
            &mut self.store,
            &self.terms,
            self.oracle.as_deref_mut(),
            &mut driver,
            self.vars.top_id(),
        )? {
            Some(PresolveOutcome::Unsatisfiable) => {
                return Ok(self.finish(SolveStatus::Unsatisfiable));
            }
            Some(PresolveOutcome::Feasible { model, costs }) => {
                let bound = costs.iter().copied().max().unwrap_or(0);
                self.solution = Some(model);
                Some(bound)
            }
            None => None,
        };

        if self.terms.is_empty() {
            // no objectives: plain satisfiability of the hard clauses
            self.store.replace_soft(Vec::new());
            let verdict = driver.solve(&self.store, &[], self.vars.top_id())?;
            let status = match verdict {
                SolverVerdict::Satisfied(model) => {
                    self.solution = Some(model);
                    SolveStatus::Optimal
                }
                SolverVerdict::Unsatisfiable => SolveStatus::Unsatisfiable,
                SolverVerdict::Interrupted(model) => self.absorb_interrupt(model),
            };
            return Ok(self.finish(status));
        }

        self.build_sorted_vectors(upper_bound);

        let total = self.terms.len();
        for iteration in 0..total {
            if self.termination.is_set() {
                let status = self.absorb_interrupt(None);
                return Ok(self.finish(status));
            }
            self.phase = Phase::Iterating(iteration);
            let simplify = self.simplify_last && iteration + 1 == total;
            let layer = {
                let mut ctx = EncodingContext {
                    store: &mut self.store,
                    vars: &mut self.vars,
                };
                let basis: &[Vec<Lit>] = if simplify {
                    &self.terms
                } else {
                    &self.sorted_vecs
                };
                encode_relaxation(&mut ctx, iteration, basis)
            };

            let verdict = driver.solve(&self.store, &layer.or_vector, self.vars.top_id())?;
            match verdict {
                SolverVerdict::Satisfied(model) => {
                    #[cfg(feature = "debug-checks")]
                    self.assert_model_consistent(&model);
                    let maximum = layer
                        .or_vector
                        .iter()
                        .filter(|&&position| model.value(position))
                        .count();
                    if self.verbosity >= 1 {
                        info!("iteration {iteration}: maximum {maximum}");
                    }
                    if self.verbosity >= 2 {
                        debug!(
                            "iteration {iteration}: objective vector {:?}",
                            objective_costs(&model, &self.terms)
                        );
                    }
                    self.maxima.push(maximum);
                    self.solution = Some(model);
                    if iteration + 1 < total {
                        // freeze the maximum: later iterations cannot regress
                        let mut ctx = EncodingContext {
                            store: &mut self.store,
                            vars: &mut self.vars,
                        };
                        for &position in layer.or_vector.iter().skip(maximum) {
                            ctx.add_hard(vec![!position]);
                        }
                    }
                }
                SolverVerdict::Unsatisfiable => {
                    if iteration == 0 {
                        return Ok(self.finish(SolveStatus::Unsatisfiable));
                    }
                    return Err(LeximaxError::InternalInvariant(format!(
                        "the external solver reported unsat at iteration {iteration}, \
                         but the previous iteration's model is still feasible"
                    )));
                }
                SolverVerdict::Interrupted(model) => {
                    let status = self.absorb_interrupt(model);
                    return Ok(self.finish(status));
                }
            }
        }

        if self.verbosity >= 1 {
            info!("leximax optimum: {:?}", self.get_objective_vector());
        }
        Ok(self.finish(SolveStatus::Optimal))
    }

    /// Replaces every objective's soft clauses by their term literals,
    /// Tseitin-encoding clause negations where needed.
    fn convert_objectives(&mut self) {
        let mut converter = TermConverter::default();
        let mut terms = Vec::with_capacity(self.objectives.len());
        let mut ctx = EncodingContext {
            store: &mut self.store,
            vars: &mut self.vars,
        };
        for clauses in &self.objectives {
            terms.push(converter.convert(&mut ctx, clauses));
        }
        self.terms = terms;
    }

    /// Builds one sorted vector per objective (unless the single iteration
    /// of a one-objective problem is simplified away) and asserts the
    /// presolve bound on every sorted vector.
    fn build_sorted_vectors(&mut self, upper_bound: Option<usize>) {
        if self.simplify_last && self.terms.len() == 1 {
            return;
        }
        let mut sorted_vecs = Vec::with_capacity(self.terms.len());
        let mut ctx = EncodingContext {
            store: &mut self.store,
            vars: &mut self.vars,
        };
        for terms in &self.terms {
            sorted_vecs.push(encode_sorted(&mut ctx, terms));
        }
        if let Some(bound) = upper_bound {
            // the optimum's maximum cannot exceed the presolve model's
            for sorted in &sorted_vecs {
                for &position in sorted.iter().skip(bound) {
                    ctx.add_hard(vec![!position]);
                }
            }
        }
        self.sorted_vecs = sorted_vecs;
    }

    /// Distrust the external solver: every hard clause must hold under the
    /// model it returned.
    #[cfg(feature = "debug-checks")]
    fn assert_model_consistent(&self, model: &Assignment) {
        for clause in self.store.hard() {
            assert!(
                clause.iter().any(|&lit| model.value(lit)),
                "external solver model falsifies the hard clause {clause:?}"
            );
        }
    }

    fn absorb_interrupt(&mut self, model: Option<Assignment>) -> SolveStatus {
        if let Some(model) = model {
            self.solution = Some(model);
        }
        if self.solution.is_some() {
            SolveStatus::Satisfiable
        } else {
            SolveStatus::Aborted
        }
    }

    fn finish(&mut self, status: SolveStatus) -> SolveStatus {
        self.phase = Phase::Done(status);
        status
    }
}
