//! Serialization of the clause store into the external-solver input formats.
//!
//! All three writers emit clauses in insertion order and name variables
//! `x<id>`; coefficients are ±1 throughout. The OPB and LP writers carry the
//! minimisation objective explicitly (a list of literals: positive literal =
//! coefficient +1, negative = −1), while WCNF expresses it through the
//! stored weight-1 soft clauses.

use std::io::Write;

use crate::basic_types::Clause;
use crate::basic_types::Lit;
use crate::encoding::ClauseStore;

/// DIMACS weighted CNF. Hard clauses get the top weight, soft clauses
/// weight 1; the top weight exceeds the sum of the soft weights.
pub(crate) fn write_wcnf(
    out: &mut dyn Write,
    store: &ClauseStore,
    top_id: i32,
) -> std::io::Result<()> {
    let top_weight = store.soft().len() + 1;
    let clause_count = store.hard().len() + store.soft().len();
    writeln!(out, "p wcnf {top_id} {clause_count} {top_weight}")?;
    for clause in store.hard() {
        write_weighted_clause(out, top_weight, clause)?;
    }
    for clause in store.soft() {
        write_weighted_clause(out, 1, clause)?;
    }
    Ok(())
}

fn write_weighted_clause(
    out: &mut dyn Write,
    weight: usize,
    clause: &Clause,
) -> std::io::Result<()> {
    write!(out, "{weight}")?;
    for lit in clause {
        write!(out, " {}", lit.code())?;
    }
    writeln!(out, " 0")
}

/// Pseudo-Boolean OPB: a `min:` line followed by one `>= k ;` constraint per
/// hard clause, where `k` is 1 minus the number of negative literals.
pub(crate) fn write_opb(
    out: &mut dyn Write,
    store: &ClauseStore,
    objective: &[Lit],
    top_id: i32,
    separator: &str,
) -> std::io::Result<()> {
    writeln!(
        out,
        "* #variable= {top_id} #constraint= {}",
        store.hard().len()
    )?;
    if !objective.is_empty() {
        write!(out, "min:")?;
        for lit in objective {
            write!(out, " {}", coefficient_term(*lit, separator))?;
        }
        writeln!(out, " ;")?;
    }
    for clause in store.hard() {
        for lit in clause {
            write!(out, "{} ", coefficient_term(*lit, separator))?;
        }
        writeln!(out, ">= {} ;", clause_rhs(clause))?;
    }
    Ok(())
}

/// CPLEX LP format: `Minimize` / `Subject To` / `Binaries` / `End`, with the
/// same per-clause constraint arithmetic as the OPB writer.
pub(crate) fn write_lp(
    out: &mut dyn Write,
    store: &ClauseStore,
    objective: &[Lit],
    top_id: i32,
    separator: &str,
) -> std::io::Result<()> {
    writeln!(out, "Minimize")?;
    write!(out, " obj:")?;
    for lit in objective {
        write!(out, " {}", coefficient_term(*lit, separator))?;
    }
    writeln!(out)?;
    writeln!(out, "Subject To")?;
    for (index, clause) in store.hard().iter().enumerate() {
        write!(out, " c{index}:")?;
        for lit in clause {
            write!(out, " {}", coefficient_term(*lit, separator))?;
        }
        writeln!(out, " >= {}", clause_rhs(clause))?;
    }
    writeln!(out, "Binaries")?;
    for var in 1..=top_id {
        write!(out, " x{var}")?;
    }
    writeln!(out)?;
    writeln!(out, "End")
}

/// A clause `l1 ∨ … ∨ lk` as a linear constraint has right-hand side
/// `1 − #negative literals`.
fn clause_rhs(clause: &Clause) -> i64 {
    1 - clause.iter().filter(|lit| !lit.is_positive()).count() as i64
}

fn coefficient_term(lit: Lit, separator: &str) -> String {
    if lit.is_positive() {
        format!("+1{separator}x{}", lit.var())
    } else {
        format!("-1{separator}x{}", lit.var())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::EncodingContext;
    use crate::encoding::VarManager;

    fn small_store() -> (ClauseStore, i32) {
        let mut store = ClauseStore::default();
        let mut vars = VarManager::default();
        let mut ctx = EncodingContext {
            store: &mut store,
            vars: &mut vars,
        };
        ctx.add_hard(vec![Lit::positive(1), Lit::negative(2)]);
        ctx.add_hard(vec![Lit::positive(3)]);
        ctx.add_soft(vec![Lit::negative(3)]);
        (store, vars.top_id())
    }

    #[test]
    fn wcnf_layout() {
        let (store, top_id) = small_store();
        let mut buffer = Vec::new();
        write_wcnf(&mut buffer, &store, top_id).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "p wcnf 3 3 2\n\
             2 1 -2 0\n\
             2 3 0\n\
             1 -3 0\n"
        );
    }

    #[test]
    fn opb_layout() {
        let (store, top_id) = small_store();
        let mut buffer = Vec::new();
        write_opb(&mut buffer, &store, &[Lit::positive(3)], top_id, "*").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "* #variable= 3 #constraint= 2\n\
             min: +1*x3 ;\n\
             +1*x1 -1*x2 >= 0 ;\n\
             +1*x3 >= 1 ;\n"
        );
    }

    #[test]
    fn opb_without_objective_omits_the_min_line() {
        let (store, top_id) = small_store();
        let mut buffer = Vec::new();
        write_opb(&mut buffer, &store, &[], top_id, "*").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(!text.contains("min:"));
    }

    #[test]
    fn lp_layout() {
        let (store, top_id) = small_store();
        let mut buffer = Vec::new();
        write_lp(&mut buffer, &store, &[Lit::positive(3)], top_id, " ").unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "Minimize\n \
             obj: +1 x3\n\
             Subject To\n \
             c0: +1 x1 -1 x2 >= 0\n \
             c1: +1 x3 >= 1\n\
             Binaries\n \
             x1 x2 x3\n\
             End\n"
        );
    }
}
