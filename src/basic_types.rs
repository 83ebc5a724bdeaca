//! Shared primitive types: literals, clauses and assignments.
//!
//! Variables are strictly positive integers; a literal is a non-zero integer
//! whose sign selects the polarity. This mirrors the DIMACS convention used
//! by every file format the encoder speaks.

use std::fmt::Display;
use std::fmt::Formatter;

use crate::error::LeximaxError;

/// A propositional literal: a variable id with a polarity.
///
/// The internal code is the signed DIMACS integer (`+v` / `-v`). A [`Lit`]
/// can never hold the code `0`; construct one through [`Lit::positive`],
/// [`Lit::negative`] or the fallible `TryFrom<i32>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(i32);

impl Lit {
    /// The positive literal of `var`.
    ///
    /// # Panics
    /// Panics if `var` is not strictly positive; variable ids handed out by
    /// the encoder always are.
    pub fn positive(var: i32) -> Lit {
        assert!(var > 0, "variable ids are strictly positive, got {var}");
        Lit(var)
    }

    /// The negative literal of `var`.
    pub fn negative(var: i32) -> Lit {
        assert!(var > 0, "variable ids are strictly positive, got {var}");
        Lit(-var)
    }

    /// The variable this literal ranges over.
    pub fn var(self) -> i32 {
        self.0.abs()
    }

    /// Whether this is the positive phase of its variable.
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// The signed DIMACS code of this literal.
    pub fn code(self) -> i32 {
        self.0
    }
}

impl std::ops::Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit(-self.0)
    }
}

impl TryFrom<i32> for Lit {
    type Error = LeximaxError;

    fn try_from(code: i32) -> Result<Lit, LeximaxError> {
        if code == 0 {
            Err(LeximaxError::InvalidInput(
                "a literal must be a non-zero integer".to_owned(),
            ))
        } else {
            Ok(Lit(code))
        }
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Lit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A clause is a disjunction of literals. Clause emission order is
/// significant: it is the order in which clauses are serialized to the
/// external solver.
pub type Clause = Vec<Lit>;

/// A complete truth assignment, indexed by variable id.
///
/// Entry `v` holds `+v` when variable `v` is true and `-v` when it is false,
/// matching the model vectors printed by MaxSAT and pseudo-Boolean solvers.
/// Index `0` is unused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<i32>,
}

impl Assignment {
    /// An all-false assignment over variables `1..=top_var`.
    pub fn all_false(top_var: i32) -> Assignment {
        let mut values = vec![0_i32; top_var as usize + 1];
        for (var, value) in values.iter_mut().enumerate().skip(1) {
            *value = -(var as i32);
        }
        Assignment { values }
    }

    /// Builds an assignment from a raw signed model vector where entry `v`
    /// is `±v` (entry 0 ignored). Unmentioned variables default to false.
    pub fn from_model_vec(mut values: Vec<i32>) -> Assignment {
        for (var, value) in values.iter_mut().enumerate().skip(1) {
            if *value == 0 {
                *value = -(var as i32);
            }
        }
        Assignment { values }
    }

    /// The largest variable id this assignment covers.
    pub fn top_var(&self) -> i32 {
        self.values.len().saturating_sub(1) as i32
    }

    /// The truth value of `lit` under this assignment.
    ///
    /// Variables beyond [`Assignment::top_var`] are treated as false.
    pub fn value(&self, lit: Lit) -> bool {
        let var = lit.var() as usize;
        let var_true = self.values.get(var).is_some_and(|&entry| entry > 0);
        if lit.is_positive() {
            var_true
        } else {
            !var_true
        }
    }

    /// Sets the truth value of a single variable, growing the vector if the
    /// variable is not covered yet.
    pub fn assign(&mut self, var: i32, value: bool) {
        let index = var as usize;
        if index >= self.values.len() {
            let old_len = self.values.len().max(1);
            self.values.resize(index + 1, 0_i32);
            for v in old_len..self.values.len() {
                self.values[v] = -(v as i32);
            }
        }
        self.values[index] = if value { var } else { -var };
    }

    /// The signed model vector, entry `v` being `±v` (entry 0 is `0`).
    pub fn model_vec(&self) -> &[i32] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1
    }
}

/// Sorts a per-objective cost vector into the canonical leximax form
/// (non-increasing).
pub fn leximax_sorted(mut costs: Vec<usize>) -> Vec<usize> {
    costs.sort_unstable_by(|a, b| b.cmp(a));
    costs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_polarity_and_negation() {
        let lit = Lit::positive(3);
        assert!(lit.is_positive());
        assert_eq!(lit.var(), 3);
        assert_eq!((!lit).code(), -3);
        assert_eq!(!!lit, lit);
    }

    #[test]
    fn zero_is_not_a_literal() {
        assert!(Lit::try_from(0).is_err());
        assert_eq!(Lit::try_from(-7).unwrap(), Lit::negative(7));
    }

    #[test]
    fn assignment_values() {
        let assignment = Assignment::from_model_vec(vec![0, 1, -2, 3]);
        assert!(assignment.value(Lit::positive(1)));
        assert!(!assignment.value(Lit::positive(2)));
        assert!(assignment.value(Lit::negative(2)));
        assert!(assignment.value(Lit::positive(3)));
        // variables beyond the vector read as false
        assert!(!assignment.value(Lit::positive(10)));
        assert!(assignment.value(Lit::negative(10)));
    }

    #[test]
    fn assignment_grows_on_assign() {
        let mut assignment = Assignment::all_false(2);
        assignment.assign(5, true);
        assert_eq!(assignment.top_var(), 5);
        assert!(assignment.value(Lit::positive(5)));
        // the gap introduced by growing defaults to false
        assert!(!assignment.value(Lit::positive(4)));
    }

    #[test]
    fn leximax_sorting_is_non_increasing() {
        assert_eq!(leximax_sorted(vec![0, 2, 1]), vec![2, 1, 0]);
        assert_eq!(leximax_sorted(vec![]), Vec::<usize>::new());
    }
}
