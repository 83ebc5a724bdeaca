//! Optional upper-bound presolve run before the first iteration.
//!
//! A feasible assignment found here serves two purposes: its leximax-sorted
//! cost vector bounds the optimum (the first coordinate is asserted on the
//! sorted vectors before iteration 0), and it is kept as the best-so-far
//! solution should the solve be interrupted early.

use fnv::FnvHashSet;
use log::info;

use crate::basic_types::Assignment;
use crate::basic_types::Lit;
use crate::driver::ExternalSolver;
use crate::driver::SolverVerdict;
use crate::encoding::ClauseStore;
use crate::error::LeximaxError;
use crate::options::UbPresolve;
use crate::problem::objective_costs;

/// The embedded incremental SAT solver consumed by the SAT and MSS presolve
/// modes. Implementations own their formula; the presolver loads the hard
/// clauses and queries under assumptions.
pub trait SatOracle {
    /// Adds a hard clause to the oracle's formula.
    fn add_clause(&mut self, clause: &[Lit]);

    /// Solves the loaded formula under `assumptions`, returning a model or
    /// `None` when unsatisfiable.
    fn solve(&mut self, assumptions: &[Lit]) -> Result<Option<Assignment>, LeximaxError>;
}

/// Outcome of a presolve pass.
#[derive(Debug, Clone)]
pub(crate) enum PresolveOutcome {
    Feasible {
        model: Assignment,
        costs: Vec<usize>,
    },
    Unsatisfiable,
}

/// Runs the configured presolve mode. `Ok(None)` means presolve is off or
/// was interrupted before producing anything usable.
pub(crate) fn calculate_upper_bound(
    mode: UbPresolve,
    store: &mut ClauseStore,
    terms: &[Vec<Lit>],
    oracle: Option<&mut (dyn SatOracle + 'static)>,
    driver: &mut ExternalSolver,
    top_id: i32,
) -> Result<Option<PresolveOutcome>, LeximaxError> {
    let outcome = match mode {
        UbPresolve::Off => return Ok(None),
        UbPresolve::Sat => sat_solve(require_oracle(mode, oracle)?, store, terms)?,
        UbPresolve::Mss => mss_solve(require_oracle(mode, oracle)?, store, terms)?,
        UbPresolve::Maxsat => return maxsat_solve(driver, store, terms, top_id),
    };
    if let PresolveOutcome::Feasible { ref costs, .. } = outcome {
        info!("presolve ({mode}) found a feasible assignment with costs {costs:?}");
    }
    Ok(Some(outcome))
}

fn require_oracle<'a>(
    mode: UbPresolve,
    oracle: Option<&'a mut (dyn SatOracle + 'static)>,
) -> Result<&'a mut (dyn SatOracle + 'static), LeximaxError> {
    oracle.ok_or_else(|| {
        LeximaxError::InvalidConfig(format!(
            "upper-bound presolve mode `{mode}` needs a sat oracle; none is installed"
        ))
    })
}

fn load_hard_clauses(oracle: &mut dyn SatOracle, store: &ClauseStore) {
    for clause in store.hard() {
        oracle.add_clause(clause);
    }
}

/// Mode 1: a single SAT call on the hard clauses.
fn sat_solve(
    oracle: &mut dyn SatOracle,
    store: &ClauseStore,
    terms: &[Vec<Lit>],
) -> Result<PresolveOutcome, LeximaxError> {
    load_hard_clauses(oracle, store);
    match oracle.solve(&[])? {
        None => Ok(PresolveOutcome::Unsatisfiable),
        Some(model) => Ok(PresolveOutcome::Feasible {
            costs: objective_costs(&model, terms),
            model,
        }),
    }
}

/// Mode 2: extend the SAT model towards a maximal satisfiable subset by
/// greedily falsifying currently-true terms while the hard clauses stay
/// satisfiable. Every successful flip is pinned through an assumption.
fn mss_solve(
    oracle: &mut dyn SatOracle,
    store: &ClauseStore,
    terms: &[Vec<Lit>],
) -> Result<PresolveOutcome, LeximaxError> {
    load_hard_clauses(oracle, store);
    let Some(mut model) = oracle.solve(&[])? else {
        return Ok(PresolveOutcome::Unsatisfiable);
    };
    let mut assumptions: Vec<Lit> = Vec::new();
    let mut seen: FnvHashSet<i32> = FnvHashSet::default();
    for term in terms.iter().flatten().copied() {
        if !seen.insert(term.code()) {
            continue;
        }
        if !model.value(term) {
            continue;
        }
        assumptions.push(!term);
        match oracle.solve(&assumptions)? {
            Some(better) => model = better,
            None => {
                let _ = assumptions.pop();
            }
        }
    }
    Ok(PresolveOutcome::Feasible {
        costs: objective_costs(&model, terms),
        model,
    })
}

/// Mode 3: one MaxSAT call over the union of all objectives' soft clauses
/// (weight 1 each). Cheap but coarse as a leximax bound.
fn maxsat_solve(
    driver: &mut ExternalSolver,
    store: &mut ClauseStore,
    terms: &[Vec<Lit>],
    top_id: i32,
) -> Result<Option<PresolveOutcome>, LeximaxError> {
    let flattened: Vec<Lit> = terms.iter().flatten().copied().collect();
    store.replace_soft(flattened.iter().map(|&term| vec![!term]).collect());
    let verdict = driver.solve(store, &flattened, top_id)?;
    match verdict {
        SolverVerdict::Satisfied(model) | SolverVerdict::Interrupted(Some(model)) => {
            let costs = objective_costs(&model, terms);
            info!("presolve (maxsat) found a feasible assignment with costs {costs:?}");
            Ok(Some(PresolveOutcome::Feasible { model, costs }))
        }
        SolverVerdict::Unsatisfiable => Ok(Some(PresolveOutcome::Unsatisfiable)),
        SolverVerdict::Interrupted(None) => Ok(None),
    }
}
