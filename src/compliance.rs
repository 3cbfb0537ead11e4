//! Compliance evaluation.
//!
//! Per-constraint compliance tests each constraint's negation in an
//! isolated context: when the negation is unsatisfiable the constraint can
//! never be violated and counts as compliant. The same pattern verifies
//! the derived formal properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::solver::{Outcome, SolverAdapter};
use crate::symbol::SymbolTable;
use crate::term::Term;

/// Per-principle and aggregate compliance outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Compliance per source identifier; a source with several constraints
    /// is compliant only if all of them are.
    pub per_constraint: BTreeMap<String, bool>,
    /// compliant count / total count; 1.0 when there is nothing to check.
    pub compliance_score: f64,
    pub overall_compliant: bool,
}

/// Verification outcome for the derived formal properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyVerification {
    pub per_property: BTreeMap<String, bool>,
    /// Fraction of properties that verify; 1.0 when there are none.
    pub verification_score: f64,
}

/// Evaluate each constraint's negation in isolation.
pub fn evaluate_compliance(
    adapter: &SolverAdapter,
    symbols: &SymbolTable,
    constraints: &[Constraint],
) -> ComplianceReport {
    let (per_constraint, score) = negation_checks(adapter, symbols, constraints);
    ComplianceReport {
        per_constraint,
        compliance_score: score,
        overall_compliant: score == 1.0,
    }
}

/// Apply the isolated-negation check to the derived properties.
pub fn verify_properties(
    adapter: &SolverAdapter,
    symbols: &SymbolTable,
    properties: &[Constraint],
) -> PropertyVerification {
    let (per_property, score) = negation_checks(adapter, symbols, properties);
    PropertyVerification {
        per_property,
        verification_score: score,
    }
}

fn negation_checks(
    adapter: &SolverAdapter,
    symbols: &SymbolTable,
    constraints: &[Constraint],
) -> (BTreeMap<String, bool>, f64) {
    let mut results: BTreeMap<String, bool> = BTreeMap::new();
    let mut passed = 0usize;

    for constraint in constraints {
        let negated = Term::not(constraint.expression.clone());
        let verdict = adapter.check(symbols, &[negated]);
        // Unknown counts as a failure: inconclusive is not compliant.
        let ok = verdict.outcome == Outcome::Unsat;
        if ok {
            passed += 1;
        }
        results
            .entry(constraint.source_id.clone())
            .and_modify(|entry| *entry = *entry && ok)
            .or_insert(ok);
    }

    let score = if constraints.is_empty() {
        1.0
    } else {
        passed as f64 / constraints.len() as f64
    };
    (results, score)
}
