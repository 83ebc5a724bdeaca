//! Per-iteration relaxation of the sorted objective vectors.
//!
//! Iteration `i` allocates one relaxation indicator per objective, forces a
//! relaxed copy of each sorted vector to all-false when its indicator is
//! set, restricts the indicators to at most `i` true, and takes the
//! componentwise OR of the relaxed copies. The unit negations of the OR
//! vector become the iteration's soft clauses: minimising their falsification
//! computes the `i`-th largest objective cost.

use log::debug;

use crate::basic_types::Lit;
use crate::encoding::EncodingContext;

/// The per-iteration variables the loop needs to keep: the relaxation
/// indicators and the componentwise-OR vector they feed.
#[derive(Debug, Clone)]
pub(crate) struct RelaxationLayer {
    pub(crate) indicators: Vec<Lit>,
    pub(crate) or_vector: Vec<Lit>,
}

/// Encodes the relaxation of iteration `iteration` over the given vectors
/// (the sorted vectors, or the raw term vectors when the last iteration is
/// simplified) and installs the iteration's soft clauses.
pub(crate) fn encode_relaxation(
    ctx: &mut EncodingContext<'_>,
    iteration: usize,
    vectors: &[Vec<Lit>],
) -> RelaxationLayer {
    let indicators: Vec<Lit> = vectors.iter().map(|_| Lit::positive(ctx.fresh())).collect();

    // relaxed copy of every vector: r ↔ s ∧ ¬y
    let mut relaxed: Vec<Vec<Lit>> = Vec::with_capacity(vectors.len());
    for (objective, vector) in vectors.iter().enumerate() {
        let indicator = indicators[objective];
        let copy: Vec<Lit> = vector.iter().map(|_| Lit::positive(ctx.fresh())).collect();
        for (&relaxed_lit, &source) in copy.iter().zip(vector) {
            ctx.add_hard(vec![!relaxed_lit, source]);
            ctx.add_hard(vec![!relaxed_lit, !indicator]);
            ctx.add_hard(vec![relaxed_lit, !source, indicator]);
        }
        relaxed.push(copy);
    }

    at_most(ctx, &indicators, iteration);

    // componentwise OR across the relaxed copies
    let width = vectors.iter().map(Vec::len).max().unwrap_or(0);
    let or_vector: Vec<Lit> = (0..width).map(|_| Lit::positive(ctx.fresh())).collect();
    for (position, &or_lit) in or_vector.iter().enumerate() {
        let mut definition = vec![!or_lit];
        for copy in &relaxed {
            if let Some(&relaxed_lit) = copy.get(position) {
                ctx.add_hard(vec![!relaxed_lit, or_lit]);
                definition.push(relaxed_lit);
            }
        }
        ctx.add_hard(definition);
    }

    // the iteration's soft clauses replace the previous iteration's set
    ctx.store
        .replace_soft(or_vector.iter().map(|&or_lit| vec![!or_lit]).collect());

    debug!(
        "relaxation of iteration {iteration}: {} indicators, or-vector of width {width}",
        indicators.len(),
    );

    RelaxationLayer {
        indicators,
        or_vector,
    }
}

/// At most `bound` of `indicators` may be true, encoded as the naive subset
/// expansion: every `(bound + 1)`-subset contributes the clause of its
/// negations. Only viable because the indicator count is the (small) number
/// of objectives.
pub(crate) fn at_most(ctx: &mut EncodingContext<'_>, indicators: &[Lit], bound: usize) {
    if indicators.len() <= bound {
        return;
    }
    let mut subset = Vec::with_capacity(bound + 1);
    all_subsets(ctx, indicators, 0, bound + 1, &mut subset);
}

fn all_subsets(
    ctx: &mut EncodingContext<'_>,
    indicators: &[Lit],
    start: usize,
    remaining: usize,
    subset: &mut Vec<Lit>,
) {
    if remaining == 0 {
        ctx.add_hard(subset.iter().map(|&indicator| !indicator).collect());
        return;
    }
    for index in start..=indicators.len() - remaining {
        subset.push(indicators[index]);
        all_subsets(ctx, indicators, index + 1, remaining - 1, subset);
        let _ = subset.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::ClauseStore;
    use crate::encoding::VarManager;
    use crate::test_helper::UnitPropagator;

    fn binomial(n: usize, k: usize) -> usize {
        if k > n {
            return 0;
        }
        (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
    }

    #[test]
    fn at_most_emits_one_clause_per_subset() {
        for n in 1..=5 {
            for bound in 0..n {
                let mut store = ClauseStore::default();
                let mut vars = VarManager::default();
                let mut ctx = EncodingContext {
                    store: &mut store,
                    vars: &mut vars,
                };
                let indicators: Vec<Lit> =
                    (0..n).map(|_| Lit::positive(ctx.fresh())).collect();
                at_most(&mut ctx, &indicators, bound);
                assert_eq!(
                    store.hard().len(),
                    binomial(n, bound + 1),
                    "n = {n}, bound = {bound}"
                );
                for clause in store.hard() {
                    assert_eq!(clause.len(), bound + 1);
                    assert!(clause.iter().all(|lit| !lit.is_positive()));
                }
            }
        }
    }

    #[test]
    fn at_most_zero_forces_every_indicator_false() {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        let indicators: Vec<Lit> = (0..3).map(|_| Lit::positive(ctx.fresh())).collect();
        at_most(&mut ctx, &indicators, 0);

        let mut propagator = UnitPropagator::default();
        propagator.run(store.hard()).unwrap();
        for indicator in indicators {
            assert_eq!(propagator.value(indicator), Some(false));
        }
    }

    /// Exhaustively checks the layer semantics over two small vectors: for
    /// every valuation of the vector entries and indicators respecting the
    /// cardinality bound, the OR vector matches the componentwise OR of the
    /// non-relaxed vectors, and valuations violating the bound conflict.
    #[test]
    fn or_vector_matches_the_unrelaxed_disjunction() {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        let vectors = vec![
            vec![Lit::positive(1), Lit::positive(2)],
            vec![Lit::positive(3)],
        ];
        vars.accommodate(Lit::positive(3));
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        let layer = encode_relaxation(&mut ctx, 1, &vectors);
        assert_eq!(layer.indicators.len(), 2);
        assert_eq!(layer.or_vector.len(), 2);

        for mask in 0..(1_u32 << 5) {
            let mut propagator = UnitPropagator::default();
            for var in 1..=3 {
                propagator.assume(var, mask & (1 << (var - 1)) != 0);
            }
            let relax_first = mask & (1 << 3) != 0;
            let relax_second = mask & (1 << 4) != 0;
            propagator.assume(layer.indicators[0].var(), relax_first);
            propagator.assume(layer.indicators[1].var(), relax_second);

            let outcome = propagator.run(store.hard());
            if relax_first && relax_second {
                assert!(outcome.is_err(), "both objectives relaxed in iteration 1");
                continue;
            }
            outcome.unwrap();

            let first = [
                !relax_first && mask & 1 != 0,
                !relax_first && mask & 2 != 0,
            ];
            let second = [!relax_second && mask & 4 != 0, false];
            for position in 0..2 {
                assert_eq!(
                    propagator.value(layer.or_vector[position]),
                    Some(first[position] || second[position]),
                    "mask {mask:#b}, position {position}"
                );
            }
        }
    }

    #[test]
    fn soft_clauses_are_the_or_vector_negations() {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        let vectors = vec![vec![Lit::positive(1)], vec![Lit::positive(2)]];
        vars.accommodate(Lit::positive(2));
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        let layer = encode_relaxation(&mut ctx, 0, &vectors);
        assert_eq!(store.soft().len(), layer.or_vector.len());
        for (soft, &or_lit) in store.soft().iter().zip(&layer.or_vector) {
            assert_eq!(soft.as_slice(), &[!or_lit]);
        }
    }

    #[test]
    fn empty_vectors_contribute_nothing() {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        let vectors = vec![vec![], vec![Lit::positive(1)]];
        vars.accommodate(Lit::positive(1));
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        let layer = encode_relaxation(&mut ctx, 0, &vectors);
        // the width is the longest vector, not the objective count
        assert_eq!(layer.or_vector.len(), 1);
    }
}
