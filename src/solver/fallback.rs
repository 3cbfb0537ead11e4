//! Deterministic fallback solver.
//!
//! A rule-based stand-in for environments without a solver runtime. It
//! answers through the same interface as the Z3 backend but decides
//! satisfiability by sentinel scan: a constraint or clause mentioning a
//! denial sentinel is treated as a satisfiable conflict witness, anything
//! else as unsatisfiable. Answers are deterministic and must never be
//! mistaken for real verification; callers see `solver_used = "fallback"`.

use std::collections::BTreeMap;

use super::SolverVerdict;
use crate::parser::parse_predicate;
use crate::symbol::SymbolTable;
use crate::term::Term;

/// Substrings that mark a conflict witness.
const SENTINELS: [&str; 2] = ["access_denied", "deny"];

/// Assignments synthesized per counterexample, mirroring the Z3 cap.
const ASSIGNMENT_CAP: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSolver;

impl FallbackSolver {
    pub fn new() -> Self {
        Self
    }

    /// Sentinel scan over rendered terms.
    pub fn check_terms(&self, _symbols: &SymbolTable, terms: &[Term]) -> SolverVerdict {
        let offending: Vec<&Term> = terms
            .iter()
            .filter(|t| contains_sentinel(&t.to_string()))
            .collect();
        if offending.is_empty() {
            return SolverVerdict::unsat();
        }

        let mut model = BTreeMap::new();
        'outer: for term in offending {
            for var in term.free_vars() {
                if model.len() >= ASSIGNMENT_CAP {
                    break 'outer;
                }
                model.insert(var, "true".to_string());
            }
        }
        SolverVerdict::sat(model)
    }

    /// Sentinel scan over raw clause texts (entailment path).
    pub fn check_texts<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> SolverVerdict {
        let offending: Vec<&str> = texts
            .into_iter()
            .filter(|t| contains_sentinel(t))
            .collect();
        if offending.is_empty() {
            return SolverVerdict::unsat();
        }

        let mut model = BTreeMap::new();
        for text in offending {
            if model.len() >= ASSIGNMENT_CAP {
                break;
            }
            // Reduce the clause to its head predicate for the witness.
            let head = text.split(":-").next().unwrap_or(text);
            if let Ok(atom) = parse_predicate(head) {
                model.insert(atom.name, "true".to_string());
            }
        }
        SolverVerdict::sat(model)
    }
}

fn contains_sentinel(text: &str) -> bool {
    SENTINELS.iter().any(|s| text.contains(s))
}
