//! Solver adapter.
//!
//! Two interchangeable backends behind one interface: a real Z3 subprocess
//! and a deterministic fallback for hosts without a solver. The variant is
//! selected once by capability detection, not per call, and every check
//! runs in a fresh context so assertions never leak between sessions.

pub mod fallback;
pub mod z3;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use fallback::FallbackSolver;
pub use z3::Z3Backend;

use crate::builder::ConstraintBuilder;
use crate::parser::datalog::parse_clause;
use crate::symbol::SymbolTable;
use crate::term::Term;

/// Result of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Sat,
    Unsat,
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Sat => "sat",
            Outcome::Unsat => "unsat",
            Outcome::Unknown => "unknown",
        }
    }
}

/// Verdict of one solver invocation.
///
/// A counterexample is present only for `Sat`; `error` only when solving
/// failed internally (spawn failure, malformed solver output).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverVerdict {
    pub outcome: Outcome,
    pub counterexample: Option<BTreeMap<String, String>>,
    pub error: Option<String>,
}

impl SolverVerdict {
    pub fn sat(model: BTreeMap<String, String>) -> Self {
        Self {
            outcome: Outcome::Sat,
            counterexample: Some(model),
            error: None,
        }
    }

    pub fn unsat() -> Self {
        Self {
            outcome: Outcome::Unsat,
            counterexample: None,
            error: None,
        }
    }

    pub fn unknown() -> Self {
        Self {
            outcome: Outcome::Unknown,
            counterexample: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Unknown,
            counterexample: None,
            error: Some(error.into()),
        }
    }
}

/// Answer to an entailment question, shaped for the external contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntailmentAnswer {
    pub is_satisfiable: bool,
    pub is_unsatisfiable: bool,
    /// Human-readable model rendering, e.g. `access_denied = true`.
    pub counter_example: Option<String>,
    pub error_message: Option<String>,
}

impl EntailmentAnswer {
    fn from_verdict(verdict: SolverVerdict) -> Self {
        let counter_example = verdict
            .counterexample
            .as_ref()
            .filter(|m| !m.is_empty())
            .map(render_assignments);
        Self {
            is_satisfiable: verdict.outcome == Outcome::Sat,
            is_unsatisfiable: verdict.outcome == Outcome::Unsat,
            counter_example,
            error_message: verdict.error,
        }
    }
}

fn render_assignments(model: &BTreeMap<String, String>) -> String {
    model
        .iter()
        .map(|(var, val)| format!("{} = {}", var, val))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The solver backend selected for a session.
#[derive(Debug, Clone)]
pub enum SolverAdapter {
    Z3(Z3Backend),
    Fallback(FallbackSolver),
}

impl SolverAdapter {
    /// Capability detection: use Z3 when a binary is present, otherwise the
    /// deterministic fallback.
    pub fn detect() -> Self {
        match Z3Backend::locate() {
            Some(backend) => SolverAdapter::Z3(backend),
            None => {
                warn!("no z3 binary found, using deterministic fallback solver");
                SolverAdapter::Fallback(FallbackSolver::new())
            }
        }
    }

    pub fn fallback() -> Self {
        SolverAdapter::Fallback(FallbackSolver::new())
    }

    /// Tag recorded in results so downstream consumers can tell real
    /// verdicts from fallback ones.
    pub fn name(&self) -> &'static str {
        match self {
            SolverAdapter::Z3(_) => "z3",
            SolverAdapter::Fallback(_) => "fallback",
        }
    }

    /// Assert every term in a fresh context and check satisfiability.
    pub fn check(&self, symbols: &SymbolTable, terms: &[Term]) -> SolverVerdict {
        match self {
            SolverAdapter::Z3(backend) => backend.check_terms(symbols, terms),
            SolverAdapter::Fallback(solver) => solver.check_terms(symbols, terms),
        }
    }

    /// Do the rules entail every obligation?
    ///
    /// Asserts the rule clauses and the negation of each obligation, then
    /// checks satisfiability: `Unsat` means the obligations are entailed,
    /// `Sat` means they are not and the model is the counterexample.
    /// Clauses that fail to parse are skipped with a warning.
    pub fn check_entailment(&self, rules: &[String], obligations: &[String]) -> EntailmentAnswer {
        if let SolverAdapter::Fallback(solver) = self {
            let verdict =
                solver.check_texts(rules.iter().chain(obligations).map(String::as_str));
            return EntailmentAnswer::from_verdict(verdict);
        }

        let mut builder = ConstraintBuilder::new();
        let mut terms = Vec::new();
        for text in rules {
            match parse_clause(text) {
                Ok(clause) => terms.push(builder.clause_term(&clause)),
                Err(err) => warn!(clause = text.as_str(), %err, "skipping malformed rule"),
            }
        }
        for text in obligations {
            match parse_clause(text) {
                Ok(clause) => {
                    let term = builder.clause_term(&clause);
                    terms.push(Term::not(term));
                }
                Err(err) => {
                    warn!(clause = text.as_str(), %err, "skipping malformed obligation")
                }
            }
        }
        let (symbols, _) = builder.finish();
        EntailmentAnswer::from_verdict(self.check(&symbols, &terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_invariants() {
        let sat = SolverVerdict::sat(BTreeMap::new());
        assert_eq!(sat.outcome, Outcome::Sat);
        assert!(sat.counterexample.is_some());
        assert!(sat.error.is_none());

        let unsat = SolverVerdict::unsat();
        assert!(unsat.counterexample.is_none());

        let failed = SolverVerdict::failed("spawn error");
        assert_eq!(failed.outcome, Outcome::Unknown);
        assert!(failed.error.is_some());
    }

    #[test]
    fn test_entailment_answer_rendering() {
        let mut model = BTreeMap::new();
        model.insert("access_denied".to_string(), "true".to_string());
        let answer = EntailmentAnswer::from_verdict(SolverVerdict::sat(model));
        assert!(answer.is_satisfiable);
        assert!(!answer.is_unsatisfiable);
        assert_eq!(
            answer.counter_example.as_deref(),
            Some("access_denied = true")
        );
    }

    #[test]
    fn test_unknown_is_neither() {
        let answer = EntailmentAnswer::from_verdict(SolverVerdict::unknown());
        assert!(!answer.is_satisfiable);
        assert!(!answer.is_unsatisfiable);
        assert!(answer.counter_example.is_none());
    }

    #[test]
    fn test_fallback_entailment_clean_rules() {
        let adapter = SolverAdapter::fallback();
        let rules = vec![
            "access_allowed(User,Resource) :- has_role(User,admin).".to_string(),
            "has_role(alice,admin).".to_string(),
        ];
        let obligations = vec!["ensure_role_based_access_for_principle_1.".to_string()];
        let answer = adapter.check_entailment(&rules, &obligations);
        assert!(answer.is_unsatisfiable);
        assert!(answer.counter_example.is_none());
    }

    #[test]
    fn test_fallback_entailment_detects_conflict() {
        let adapter = SolverAdapter::fallback();
        let rules = vec!["access_denied(User,Resource) :- true.".to_string()];
        let obligations = vec!["ensure_role_based_access_for_principle_1.".to_string()];
        let answer = adapter.check_entailment(&rules, &obligations);
        assert!(answer.is_satisfiable);
        let ce = answer.counter_example.unwrap();
        assert!(ce.contains("access_denied"));
    }

    #[test]
    fn test_adapter_name() {
        assert_eq!(SolverAdapter::fallback().name(), "fallback");
    }
}
