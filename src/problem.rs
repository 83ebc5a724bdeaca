//! Problem intake: clause validation and soft-clause-to-term conversion.

use fnv::FnvHashMap;

use crate::basic_types::Clause;
use crate::basic_types::Lit;
use crate::encoding::EncodingContext;
use crate::error::LeximaxError;

/// Rejects malformed clause collections. The [`Lit`] type already rules out
/// zero and negative variable ids, so the only remaining shape error is an
/// empty clause.
pub(crate) fn validate(clauses: &[Clause], role: &str) -> Result<(), LeximaxError> {
    for clause in clauses {
        if clause.is_empty() {
            return Err(LeximaxError::InvalidInput(format!(
                "{role} contains an empty clause"
            )));
        }
    }
    Ok(())
}

/// The per-objective cost vector of `model`: each objective's cost is the
/// number of its terms that evaluate to true.
pub(crate) fn objective_costs(
    model: &crate::basic_types::Assignment,
    terms: &[Vec<Lit>],
) -> Vec<usize> {
    terms
        .iter()
        .map(|objective| {
            objective
                .iter()
                .filter(|&&term| model.value(term))
                .count()
        })
        .collect()
}

/// Converts objectives' soft clauses into term literals.
///
/// A term is true exactly when its clause is falsified, so an objective's
/// cost is the number of its true terms. A unit clause `(l)` needs no fresh
/// variable (its term is `¬l`); a larger clause gets a fresh variable
/// constrained to the clause's negation. Identical clauses, which the
/// weighted-input conversion produces deliberately, share one fresh
/// variable.
#[derive(Debug, Default)]
pub(crate) struct TermConverter {
    cache: FnvHashMap<Vec<i32>, Lit>,
}

impl TermConverter {
    pub(crate) fn convert(
        &mut self,
        ctx: &mut EncodingContext<'_>,
        clauses: &[Clause],
    ) -> Vec<Lit> {
        clauses
            .iter()
            .map(|clause| self.term_for(ctx, clause))
            .collect()
    }

    fn term_for(&mut self, ctx: &mut EncodingContext<'_>, clause: &Clause) -> Lit {
        if let [only] = clause.as_slice() {
            return !*only;
        }
        let key: Vec<i32> = clause.iter().map(|lit| lit.code()).collect();
        if let Some(&term) = self.cache.get(&key) {
            return term;
        }
        let term = Lit::positive(ctx.fresh());
        // term ↔ ¬(l1 ∨ … ∨ lk)
        let mut reverse = vec![term];
        reverse.extend(clause.iter().copied());
        ctx.add_hard(reverse);
        for &lit in clause {
            ctx.add_hard(vec![!term, !lit]);
        }
        let _ = self.cache.insert(key, term);
        term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ClauseStore;
    use crate::encoding::VarManager;
    use crate::test_helper::UnitPropagator;

    #[test]
    fn empty_clauses_are_rejected() {
        assert!(validate(&[vec![Lit::positive(1)], vec![]], "objective 0").is_err());
        assert!(validate(&[vec![Lit::negative(2)]], "hard constraints").is_ok());
    }

    #[test]
    fn unit_clauses_need_no_fresh_variable() {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        vars.accommodate(Lit::positive(2));
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        let mut converter = TermConverter::default();
        let terms = converter.convert(
            &mut ctx,
            &[vec![Lit::positive(1)], vec![Lit::negative(2)]],
        );
        assert_eq!(terms, vec![Lit::negative(1), Lit::positive(2)]);
        assert!(store.hard().is_empty());
        assert_eq!(vars.top_id(), 2);
    }

    #[test]
    fn larger_clauses_get_the_negation_encoding() {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        vars.accommodate(Lit::positive(2));
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        let mut converter = TermConverter::default();
        let clause = vec![Lit::positive(1), Lit::negative(2)];
        let terms = converter.convert(&mut ctx, &[clause.clone()]);
        assert_eq!(terms.len(), 1);
        let term = terms[0];
        assert_eq!(term.var(), 3);

        for mask in 0..4_u32 {
            let mut propagator = UnitPropagator::default();
            propagator.assume(1, mask & 1 != 0);
            propagator.assume(2, mask & 2 != 0);
            propagator.run(store.hard()).unwrap();
            let clause_true = (mask & 1 != 0) || (mask & 2 == 0);
            assert_eq!(propagator.value(term), Some(!clause_true), "mask {mask}");
        }
    }

    #[test]
    fn duplicate_clauses_share_one_term() {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        vars.accommodate(Lit::positive(2));
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        let mut converter = TermConverter::default();
        let clause = vec![Lit::positive(1), Lit::positive(2)];
        let first = converter.convert(&mut ctx, &[clause.clone()]);
        let clauses_after_first = ctx.store.hard().len();
        let second = converter.convert(&mut ctx, &[clause]);
        assert_eq!(first, second);
        assert_eq!(store.hard().len(), clauses_after_first);
    }
}
