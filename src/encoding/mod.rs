//! Clause storage and fresh-variable allocation, shared by every encoder.

pub(crate) mod relaxation;
pub(crate) mod sorting_net;

use log::trace;

use crate::basic_types::Clause;
use crate::basic_types::Lit;

/// Hands out fresh Boolean variable ids.
///
/// The counter starts at the largest id mentioned by the input and only ever
/// grows; ids are never recycled. Single-threaded use only.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VarManager {
    top_id: i32,
}

impl VarManager {
    /// The largest id handed out or observed so far.
    pub(crate) fn top_id(&self) -> i32 {
        self.top_id
    }

    /// Allocates and returns a fresh variable id.
    pub(crate) fn fresh(&mut self) -> i32 {
        self.top_id += 1;
        self.top_id
    }

    /// Raises the counter so `lit`'s variable is covered.
    pub(crate) fn accommodate(&mut self, lit: Lit) {
        if lit.var() > self.top_id {
            self.top_id = lit.var();
        }
    }
}

/// Owns the hard and soft clause vectors of one solve.
///
/// Hard clauses are append-only for the whole solve; the soft set belongs to
/// a single iteration of the leximax loop and is replaced wholesale when the
/// next iteration is encoded. Insertion order is preserved and is exactly
/// the order clauses are serialized in.
#[derive(Debug, Clone, Default)]
pub(crate) struct ClauseStore {
    hard: Vec<Clause>,
    soft: Vec<Clause>,
}

impl ClauseStore {
    pub(crate) fn hard(&self) -> &[Clause] {
        &self.hard
    }

    pub(crate) fn soft(&self) -> &[Clause] {
        &self.soft
    }

    /// Discards every clause. Only used at teardown.
    pub(crate) fn clear(&mut self) {
        self.hard.clear();
        self.soft.clear();
    }

    /// Installs the soft clauses of the next iteration, dropping the
    /// previous iteration's set.
    pub(crate) fn replace_soft(&mut self, soft: Vec<Clause>) {
        self.soft = soft;
    }
}

/// Mutable view over the clause store and the id counter for the duration of
/// one encoding call.
///
/// Appending a clause through the context keeps the id counter in sync with
/// the highest variable referenced, which is what every fresh-variable
/// reservation relies on.
#[derive(Debug)]
pub(crate) struct EncodingContext<'a> {
    pub(crate) store: &'a mut ClauseStore,
    pub(crate) vars: &'a mut VarManager,
}

impl EncodingContext<'_> {
    pub(crate) fn fresh(&mut self) -> i32 {
        self.vars.fresh()
    }

    pub(crate) fn add_hard(&mut self, clause: Clause) {
        debug_assert!(!clause.is_empty(), "attempted to add an empty hard clause");
        trace!("hard clause: {clause:?}");
        for &lit in &clause {
            self.vars.accommodate(lit);
        }
        self.store.hard.push(clause);
    }

    pub(crate) fn add_soft(&mut self, clause: Clause) {
        debug_assert!(!clause.is_empty(), "attempted to add an empty soft clause");
        trace!("soft clause: {clause:?}");
        for &lit in &clause {
            self.vars.accommodate(lit);
        }
        self.store.soft.push(clause);
    }
}
