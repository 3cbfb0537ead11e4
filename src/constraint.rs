//! Constraints with provenance.
//!
//! A constraint couples one logic term with where it came from: the source
//! policy or principle identifier, its category, and a priority used by
//! the derived formal properties.

use serde::{Deserialize, Serialize};

use crate::term::Term;

/// Classification of a constraint's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyCategory {
    AccessControl,
    GovernanceRule,
    ConstitutionalPrinciple,
    ComplianceRequirement,
}

impl PolicyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyCategory::AccessControl => "access_control",
            PolicyCategory::GovernanceRule => "governance_rule",
            PolicyCategory::ConstitutionalPrinciple => "constitutional_principle",
            PolicyCategory::ComplianceRequirement => "compliance_requirement",
        }
    }
}

/// One logical assertion derived from policy or principle text.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// The asserted term.
    pub expression: Term,
    /// Identifier of the policy or principle this came from.
    pub source_id: String,
    pub category: PolicyCategory,
    /// 1 (lowest) through 5 (strict assertions and completeness).
    pub priority: u8,
}

impl Constraint {
    pub fn new(
        expression: Term,
        source_id: impl Into<String>,
        category: PolicyCategory,
        priority: u8,
    ) -> Self {
        debug_assert!((1..=5).contains(&priority));
        Self {
            expression,
            source_id: source_id.into(),
            category,
            priority,
        }
    }
}
