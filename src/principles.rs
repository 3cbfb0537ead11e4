//! Constitutional principles and governance requirements.
//!
//! Principles arrive as a YAML document:
//!
//! ```yaml
//! constitutional_principles:
//!   safety_first:
//!     description: model outputs must clear the safety bar
//!     requirements:
//!       - metric: safety_score
//!         threshold: 0.9
//!       - human_oversight_enabled
//!     enforcement: strict
//! governance_requirements:
//!   audit_coverage:
//!     description: audits must cover most actions
//!     threshold: 0.75
//! ```
//!
//! Maps are `BTreeMap` so constraint construction order is stable across
//! runs regardless of YAML key order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// Top-level principles document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrinciplesDoc {
    #[serde(default)]
    pub constitutional_principles: BTreeMap<String, PrincipleSpec>,
    #[serde(default)]
    pub governance_requirements: BTreeMap<String, RequirementSpec>,
}

/// One named constitutional principle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrincipleSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    /// `strict` means the principle must unconditionally hold.
    #[serde(default)]
    pub enforcement: Option<String>,
}

impl PrincipleSpec {
    pub fn is_strict(&self) -> bool {
        self.enforcement.as_deref() == Some("strict")
    }
}

/// A requirement under a principle: a bare requirement name, a metric
/// threshold, or a boolean flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Threshold { metric: String, threshold: f64 },
    Flag { name: String, expected: bool },
    Text(String),
}

/// One named governance requirement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl PrinciplesDoc {
    /// Parse a YAML document.
    pub fn from_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Load and parse a principles file.
    ///
    /// A missing or invalid file is fatal to the session that asked for it.
    pub fn from_path(path: &Path) -> Result<Self, CompileError> {
        let text =
            std::fs::read_to_string(path).map_err(|source| CompileError::PrinciplesUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        serde_yaml::from_str(&text).map_err(|source| CompileError::PrinciplesInvalid {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.constitutional_principles.is_empty() && self.governance_requirements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let doc = PrinciplesDoc::from_str(
            r#"
constitutional_principles:
  transparency:
    description: decisions must be explainable
    requirements:
      - decision_log_enabled
      - metric: explanation_coverage
        threshold: 0.8
    enforcement: advisory
  safety_first:
    requirements:
      - name: kill_switch
        expected: true
    enforcement: strict
governance_requirements:
  audit_coverage:
    threshold: 0.75
"#,
        )
        .unwrap();

        assert_eq!(doc.constitutional_principles.len(), 2);
        let transparency = &doc.constitutional_principles["transparency"];
        assert_eq!(transparency.requirements.len(), 2);
        assert_eq!(
            transparency.requirements[0],
            Requirement::Text("decision_log_enabled".to_string())
        );
        assert_eq!(
            transparency.requirements[1],
            Requirement::Threshold {
                metric: "explanation_coverage".to_string(),
                threshold: 0.8,
            }
        );
        assert!(!transparency.is_strict());
        assert!(doc.constitutional_principles["safety_first"].is_strict());
        assert_eq!(
            doc.governance_requirements["audit_coverage"].threshold,
            Some(0.75)
        );
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let doc = PrinciplesDoc::from_str("constitutional_principles: {}\n").unwrap();
        assert!(doc.is_empty());
        let doc = PrinciplesDoc::from_str("{}").unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(PrinciplesDoc::from_str("constitutional_principles: [not, a, map]").is_err());
    }

    #[test]
    fn test_flag_requirement() {
        let doc = PrinciplesDoc::from_str(
            r#"
constitutional_principles:
  oversight:
    requirements:
      - name: human_review
        expected: false
"#,
        )
        .unwrap();
        assert_eq!(
            doc.constitutional_principles["oversight"].requirements[0],
            Requirement::Flag {
                name: "human_review".to_string(),
                expected: false,
            }
        );
    }
}
