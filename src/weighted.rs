//! Conversion of weighted soft clauses into leximax objectives.
//!
//! Callers coming from weighted-CNF land group their soft clauses by weight:
//! one objective per distinct weight, in descending weight order. A clause
//! of weight `w` is duplicated `⌊w / d⌋` times into the objective of each
//! distinct weight `d`, with the remainder carrying on to the smaller
//! weights, so the total weight of every clause is preserved across the
//! objective list.

use fnv::FnvHashSet;

use crate::basic_types::Clause;

/// Groups `soft` into `(distinct weight, clauses)` pairs in descending
/// weight order. Weight-0 clauses contribute nothing.
pub fn objectives_from_weighted(soft: &[(Clause, u64)]) -> Vec<(u64, Vec<Clause>)> {
    let distinct: FnvHashSet<u64> = soft
        .iter()
        .map(|&(_, weight)| weight)
        .filter(|&weight| weight > 0)
        .collect();
    let mut weights: Vec<u64> = distinct.into_iter().collect();
    weights.sort_unstable_by(|a, b| b.cmp(a));

    let mut objectives: Vec<(u64, Vec<Clause>)> =
        weights.iter().map(|&weight| (weight, Vec::new())).collect();
    for (clause, weight) in soft {
        let mut remaining = *weight;
        for (distinct_weight, clauses) in &mut objectives {
            let copies = remaining / *distinct_weight;
            remaining %= *distinct_weight;
            for _ in 0..copies {
                clauses.push(clause.clone());
            }
        }
    }
    objectives
}
