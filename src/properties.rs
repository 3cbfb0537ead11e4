//! Derived formal properties.
//!
//! Two properties are synthesized from the accumulated constraint set:
//! consistency (conjunction of the access-control constraints) and
//! completeness (conjunction of the constitutional-principle constraints).
//! An empty conjunction is vacuously true and the property is omitted.

use crate::constraint::{Constraint, PolicyCategory};
use crate::term::Term;

pub const CONSISTENCY_ID: &str = "consistency_check";
pub const COMPLETENESS_ID: &str = "completeness_check";

const PRIORITY_CONSISTENCY: u8 = 4;
const PRIORITY_COMPLETENESS: u8 = 5;

/// Synthesize the derived properties for a constraint set.
pub fn derive_properties(constraints: &[Constraint]) -> Vec<Constraint> {
    let mut properties = Vec::new();

    if let Some(conjunction) = conjunction_of(constraints, PolicyCategory::AccessControl) {
        properties.push(Constraint::new(
            conjunction,
            CONSISTENCY_ID,
            PolicyCategory::ComplianceRequirement,
            PRIORITY_CONSISTENCY,
        ));
    }

    if let Some(conjunction) = conjunction_of(constraints, PolicyCategory::ConstitutionalPrinciple)
    {
        properties.push(Constraint::new(
            conjunction,
            COMPLETENESS_ID,
            PolicyCategory::ComplianceRequirement,
            PRIORITY_COMPLETENESS,
        ));
    }

    properties
}

fn conjunction_of(constraints: &[Constraint], category: PolicyCategory) -> Option<Term> {
    let terms: Vec<Term> = constraints
        .iter()
        .filter(|c| c.category == category)
        .map(|c| c.expression.clone())
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(Term::conjoin(terms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access(expr: Term) -> Constraint {
        Constraint::new(expr, "p", PolicyCategory::AccessControl, 1)
    }

    fn principle(expr: Term) -> Constraint {
        Constraint::new(expr, "c", PolicyCategory::ConstitutionalPrinciple, 3)
    }

    #[test]
    fn test_empty_set_yields_no_properties() {
        assert!(derive_properties(&[]).is_empty());
    }

    #[test]
    fn test_consistency_only() {
        let props = derive_properties(&[access(Term::var("a")), access(Term::var("b"))]);
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].source_id, CONSISTENCY_ID);
        assert_eq!(props[0].priority, 4);
        assert_eq!(props[0].expression.to_string(), "(and a b)");
    }

    #[test]
    fn test_both_properties() {
        let props = derive_properties(&[
            access(Term::var("a")),
            principle(Term::var("p")),
        ]);
        assert_eq!(props.len(), 2);
        assert_eq!(props[1].source_id, COMPLETENESS_ID);
        assert_eq!(props[1].priority, 5);
        assert_eq!(props[1].expression.to_string(), "p");
        assert_eq!(
            props[1].category,
            PolicyCategory::ComplianceRequirement
        );
    }
}
