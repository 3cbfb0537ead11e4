//! Compilation session and verification orchestrator.
//!
//! One session covers one compile-and-verify run: it owns its symbol
//! table, constraint list, derived properties, and solver adapter, and is
//! discarded once the verdict is extracted. Sessions are never shared, so
//! concurrent verification requests cannot leak assertions into each
//! other.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::ConstraintBuilder;
use crate::compliance::{self, ComplianceReport, PropertyVerification};
use crate::constraint::{Constraint, PolicyCategory};
use crate::parser::parse_policy;
use crate::principles::PrinciplesDoc;
use crate::properties::derive_properties;
use crate::smtlib::export_smtlib;
use crate::solver::{EntailmentAnswer, Outcome, SolverAdapter, SolverVerdict};
use crate::symbol::SymbolTable;
use crate::term::Term;

/// Counts of what one compilation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilationSummary {
    pub variable_count: usize,
    pub constraint_count: usize,
    pub constraints_by_category: BTreeMap<String, usize>,
    pub property_count: usize,
}

/// The structured verdict returned to the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub policy_id: String,
    /// "verified", "failed", "inconclusive", or "error".
    pub verification_status: String,
    pub outcome: Option<Outcome>,
    pub compliance: Option<ComplianceReport>,
    pub properties: Option<PropertyVerification>,
    pub summary: Option<CompilationSummary>,
    pub counterexample: Option<BTreeMap<String, String>>,
    pub recommendations: Vec<String>,
    /// "z3" or "fallback"; downstream consumers must not conflate the two.
    pub solver_used: String,
    pub error_message: Option<String>,
}

impl VerificationResult {
    fn error(policy_id: &str, solver_used: &str, message: String) -> Self {
        Self {
            policy_id: policy_id.to_string(),
            verification_status: "error".to_string(),
            outcome: None,
            compliance: None,
            properties: None,
            summary: None,
            counterexample: None,
            recommendations: Vec::new(),
            solver_used: solver_used.to_string(),
            error_message: Some(message),
        }
    }
}

/// One compile-and-verify run.
pub struct CompilationSession {
    builder: ConstraintBuilder,
    properties: Vec<Constraint>,
    solver: SolverAdapter,
}

impl CompilationSession {
    /// New session with a capability-detected solver.
    pub fn new() -> Self {
        Self::with_solver(SolverAdapter::detect())
    }

    /// New session with a caller-chosen solver adapter.
    pub fn with_solver(solver: SolverAdapter) -> Self {
        Self {
            builder: ConstraintBuilder::new(),
            properties: Vec::new(),
            solver,
        }
    }

    /// Compile policy text into constraints; malformed fragments are
    /// skipped with warnings, never an error.
    pub fn compile(&mut self, policy_text: &str, policy_id: &str) {
        let clauses = parse_policy(policy_text);
        debug!(policy_id, clause_count = clauses.len(), "compiled policy");
        self.builder.add_clauses(&clauses, policy_id);
    }

    /// Load a constitutional-principles file. Missing or invalid files are
    /// fatal to this session only.
    pub fn load_principles_file(&mut self, path: &Path) -> Result<(), crate::CompileError> {
        let doc = PrinciplesDoc::from_path(path)?;
        self.add_principles(&doc);
        Ok(())
    }

    pub fn add_principles(&mut self, doc: &PrinciplesDoc) {
        self.builder.add_principles(doc);
    }

    /// Synthesize the derived consistency/completeness properties from the
    /// current constraint set, replacing any previously derived ones.
    pub fn derive_properties(&mut self) {
        self.properties = derive_properties(self.builder.constraints());
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.builder.symbols()
    }

    pub fn constraints(&self) -> &[Constraint] {
        self.builder.constraints()
    }

    pub fn properties(&self) -> &[Constraint] {
        &self.properties
    }

    /// The raw satisfiability outcome: do the asserted constraints entail
    /// the derived properties? `Unsat` means no violating model exists.
    /// With nothing to violate the answer is trivially `Unsat` and the
    /// solver is not consulted.
    pub fn verify(&self) -> SolverVerdict {
        if self.properties.is_empty() {
            return SolverVerdict::unsat();
        }
        let mut terms: Vec<Term> = self
            .builder
            .constraints()
            .iter()
            .map(|c| c.expression.clone())
            .collect();
        let obligations: Vec<Term> = self
            .properties
            .iter()
            .map(|p| p.expression.clone())
            .collect();
        terms.push(Term::not(Term::conjoin(obligations)));
        self.solver.check(self.builder.symbols(), &terms)
    }

    /// Per-principle compliance over the constitutional constraints.
    pub fn evaluate_compliance(&self) -> ComplianceReport {
        let constitutional: Vec<Constraint> = self
            .builder
            .constraints()
            .iter()
            .filter(|c| c.category == PolicyCategory::ConstitutionalPrinciple)
            .cloned()
            .collect();
        compliance::evaluate_compliance(&self.solver, self.builder.symbols(), &constitutional)
    }

    /// Isolated-negation verification of the derived properties.
    pub fn verify_properties(&self) -> PropertyVerification {
        compliance::verify_properties(&self.solver, self.builder.symbols(), &self.properties)
    }

    /// SMT-LIB export of the full session (constraints plus derived
    /// properties) for audit.
    pub fn to_smtlib(&self) -> String {
        let mut all: Vec<Constraint> = self.builder.constraints().to_vec();
        all.extend(self.properties.iter().cloned());
        export_smtlib(self.builder.symbols(), &all)
    }

    pub fn summary(&self) -> CompilationSummary {
        let mut by_category = BTreeMap::new();
        for constraint in self.builder.constraints() {
            *by_category
                .entry(constraint.category.as_str().to_string())
                .or_insert(0) += 1;
        }
        CompilationSummary {
            variable_count: self.builder.symbols().len(),
            constraint_count: self.builder.constraints().len(),
            constraints_by_category: by_category,
            property_count: self.properties.len(),
        }
    }

    /// Full pipeline for one request: compile, load principles, derive
    /// properties, solve, score compliance, and bundle the verdict.
    pub fn run(
        mut self,
        policy_text: &str,
        policy_id: &str,
        principles_path: Option<&Path>,
    ) -> VerificationResult {
        if let Some(path) = principles_path {
            if let Err(err) = self.load_principles_file(path) {
                return VerificationResult::error(
                    policy_id,
                    self.solver.name(),
                    err.to_string(),
                );
            }
        }

        self.compile(policy_text, policy_id);
        self.derive_properties();

        let verdict = self.verify();
        let compliance = self.evaluate_compliance();
        let properties = self.verify_properties();
        let summary = self.summary();
        let recommendations = recommendations(&verdict, &compliance, self.solver.name());

        let verification_status = match verdict.outcome {
            Outcome::Unsat => "verified",
            Outcome::Sat => "failed",
            Outcome::Unknown => "inconclusive",
        };

        VerificationResult {
            policy_id: policy_id.to_string(),
            verification_status: verification_status.to_string(),
            outcome: Some(verdict.outcome),
            compliance: Some(compliance),
            properties: Some(properties),
            summary: Some(summary),
            counterexample: verdict.counterexample,
            recommendations,
            solver_used: self.solver.name().to_string(),
            error_message: verdict.error,
        }
    }
}

impl Default for CompilationSession {
    fn default() -> Self {
        Self::new()
    }
}

fn recommendations(
    verdict: &SolverVerdict,
    compliance: &ComplianceReport,
    solver_used: &str,
) -> Vec<String> {
    let mut out = Vec::new();
    match verdict.outcome {
        Outcome::Unsat => out.push(
            "Policy is formally verified: no counterexample to the derived obligations exists."
                .to_string(),
        ),
        Outcome::Sat => out.push(
            "Policy verification failed: review the returned model for conflicting rules."
                .to_string(),
        ),
        Outcome::Unknown => out.push(
            "Verification was inconclusive: simplify the policy or increase the solver timeout and retry."
                .to_string(),
        ),
    }
    if !compliance.overall_compliant {
        let failing = compliance
            .per_constraint
            .iter()
            .filter(|(_, ok)| !**ok)
            .count();
        out.push(format!(
            "{} constitutional constraint(s) failed compliance; review the per-constraint report.",
            failing
        ));
    }
    if solver_used == "fallback" {
        out.push(
            "Verdicts came from the deterministic fallback solver; install z3 for full verification."
                .to_string(),
        );
    }
    out
}

/// Compile one policy, verify it, and bundle the verdict.
///
/// Never fails for malformed policy input: unparseable fragments are
/// skipped and an unreadable principles file yields a result with
/// `verification_status = "error"` and a descriptive message.
pub fn compile_and_verify(
    policy_text: &str,
    policy_id: &str,
    principles_path: Option<&Path>,
) -> VerificationResult {
    CompilationSession::new().run(policy_text, policy_id, principles_path)
}

/// Do the rules entail every obligation? Uses a capability-detected
/// solver; see [`SolverAdapter::check_entailment`].
pub fn check_entailment(rules: &[String], obligations: &[String]) -> EntailmentAnswer {
    SolverAdapter::detect().check_entailment(rules, obligations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fallback_session() -> CompilationSession {
        CompilationSession::with_solver(SolverAdapter::fallback())
    }

    #[test]
    fn test_empty_policy_trivially_verified() {
        let result = fallback_session().run("", "empty", None);
        assert_eq!(result.verification_status, "verified");
        assert_eq!(result.outcome, Some(Outcome::Unsat));
        let compliance = result.compliance.unwrap();
        assert_eq!(compliance.compliance_score, 1.0);
        assert!(compliance.overall_compliant);
        let summary = result.summary.unwrap();
        assert_eq!(summary.constraint_count, 0);
        assert_eq!(summary.property_count, 0);
    }

    #[test]
    fn test_missing_principles_file_is_session_error() {
        let result = fallback_session().run(
            "allow { input.role == \"admin\" }",
            "p-1",
            Some(Path::new("/nonexistent/principles.yaml")),
        );
        assert_eq!(result.verification_status, "error");
        assert!(result.error_message.unwrap().contains("principles.yaml"));
        assert!(result.compliance.is_none());
        assert!(result.summary.is_none());
    }

    #[test]
    fn test_clean_policy_verifies_under_fallback() {
        let result = fallback_session().run(
            "grant(U, R) :- has_role(U, admin), resource(R).\nhas_role(alice, admin).\n",
            "p-2",
            None,
        );
        assert_eq!(result.verification_status, "verified");
        assert_eq!(result.solver_used, "fallback");
        let summary = result.summary.unwrap();
        assert_eq!(summary.constraint_count, 2);
        assert_eq!(summary.constraints_by_category["access_control"], 2);
        assert_eq!(summary.property_count, 1);
        assert!(result.recommendations.iter().any(|r| r.contains("verified")));
    }

    #[test]
    fn test_denial_policy_fails_with_counterexample() {
        let result = fallback_session().run(
            "access_denied(User, Resource) :- true.\n",
            "p-3",
            None,
        );
        assert_eq!(result.verification_status, "failed");
        assert_eq!(result.outcome, Some(Outcome::Sat));
        let model = result.counterexample.unwrap();
        assert!(!model.is_empty());
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("conflicting rules")));
    }

    #[test]
    fn test_smtlib_export_includes_derived_properties() {
        let mut session = fallback_session();
        session.compile("has_role(alice, admin).", "p");
        session.derive_properties();
        let text = session.to_smtlib();
        assert!(text.starts_with("(set-logic QF_LIA)"));
        assert!(text.contains("(declare-fun has_role__1 () Bool)"));
        // Derived consistency property re-asserts the fact.
        assert_eq!(text.matches("(assert has_role__1)").count(), 2);
        assert!(text.ends_with("(check-sat)\n(exit)"));
    }

    #[test]
    fn test_fallback_recommendation_present() {
        let result = fallback_session().run("has_role(alice, admin).", "p", None);
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("fallback")));
    }
}
