//! Helpers shared by the unit tests of the encoding modules.

use fnv::FnvHashMap;

use crate::basic_types::Clause;
use crate::basic_types::Lit;

/// A Boolean unit-propagation fixpoint over a clause set.
///
/// The encoding clauses define every auxiliary variable through
/// equivalences, so once the free variables of a test are assumed, unit
/// propagation alone determines the rest of the model. That makes exhaustive
/// checks over `2^m` input valuations cheap.
#[derive(Debug, Default)]
pub(crate) struct UnitPropagator {
    values: FnvHashMap<i32, bool>,
}

impl UnitPropagator {
    /// Fixes the value of a variable before propagation.
    pub(crate) fn assume(&mut self, var: i32, value: bool) {
        let _ = self.values.insert(var, value);
    }

    /// The current value of `lit`, or `None` while its variable is
    /// unassigned.
    pub(crate) fn value(&self, lit: Lit) -> Option<bool> {
        self.values
            .get(&lit.var())
            .map(|&var_value| if lit.is_positive() { var_value } else { !var_value })
    }

    /// Propagates unit clauses until fixpoint, failing on a falsified
    /// clause.
    pub(crate) fn run(&mut self, clauses: &[Clause]) -> Result<(), String> {
        loop {
            let mut changed = false;
            for clause in clauses {
                if clause.iter().any(|&lit| self.value(lit) == Some(true)) {
                    continue;
                }
                let unassigned: Vec<Lit> = clause
                    .iter()
                    .copied()
                    .filter(|&lit| self.value(lit).is_none())
                    .collect();
                match unassigned.len() {
                    0 => return Err(format!("conflict on clause {clause:?}")),
                    1 => {
                        let lit = unassigned[0];
                        let _ = self.values.insert(lit.var(), lit.is_positive());
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }
}
