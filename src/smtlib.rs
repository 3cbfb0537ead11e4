//! SMT-LIB serialization.
//!
//! Two rendering paths share the same declaration and assertion layout:
//! the audit export (fixed `QF_LIA` header, `check-sat`/`exit` trailer,
//! per the interchange contract) and the live solver query (no logic
//! restriction, solver timeout option, `get-model` for counterexamples).

use crate::constraint::Constraint;
use crate::symbol::SymbolTable;
use crate::term::Term;

/// Serialize the symbol table and constraint set for interoperability and
/// audit: logic declaration, variable declarations in creation order,
/// assertions in construction order, `(check-sat)` and `(exit)`.
pub fn export_smtlib(symbols: &SymbolTable, constraints: &[Constraint]) -> String {
    let mut lines = Vec::with_capacity(symbols.len() + constraints.len() + 3);
    lines.push("(set-logic QF_LIA)".to_string());
    for var in symbols.iter() {
        lines.push(format!("(declare-fun {} () {})", var.name, var.kind.as_smt()));
    }
    for constraint in constraints {
        lines.push(format!("(assert {})", constraint.expression));
    }
    lines.push("(check-sat)".to_string());
    lines.push("(exit)".to_string());
    lines.join("\n")
}

/// Render a query for a live solver run over raw terms.
pub(crate) fn solver_query(symbols: &SymbolTable, terms: &[Term], timeout_ms: u64) -> String {
    let mut lines = Vec::with_capacity(symbols.len() + terms.len() + 4);
    lines.push(format!("(set-option :timeout {})", timeout_ms));
    for var in symbols.iter() {
        lines.push(format!("(declare-fun {} () {})", var.name, var.kind.as_smt()));
    }
    for term in terms {
        lines.push(format!("(assert {})", term));
    }
    lines.push("(check-sat)".to_string());
    lines.push("(get-model)".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::PolicyCategory;
    use crate::symbol::VarKind;

    #[test]
    fn test_export_layout() {
        let mut symbols = SymbolTable::new();
        symbols.get_or_create("allow", VarKind::Bool);
        symbols.get_or_create("input_role", VarKind::String);
        let constraints = vec![Constraint::new(
            Term::implies(Term::str_eq("input_role", "admin"), Term::var("allow")),
            "p",
            PolicyCategory::AccessControl,
            2,
        )];

        let text = export_smtlib(&symbols, &constraints);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "(set-logic QF_LIA)");
        assert_eq!(lines[1], "(declare-fun allow () Bool)");
        assert_eq!(lines[2], "(declare-fun input_role () String)");
        assert_eq!(
            lines[3],
            "(assert (=> (= input_role \"admin\") allow))"
        );
        assert_eq!(lines[4], "(check-sat)");
        assert_eq!(lines[5], "(exit)");
    }

    #[test]
    fn test_empty_session_exports_trivial_script() {
        let text = export_smtlib(&SymbolTable::new(), &[]);
        assert_eq!(text, "(set-logic QF_LIA)\n(check-sat)\n(exit)");
    }

    #[test]
    fn test_solver_query_has_timeout_and_model() {
        let mut symbols = SymbolTable::new();
        symbols.get_or_create("p", VarKind::Bool);
        let query = solver_query(&symbols, &[Term::var("p")], 5000);
        assert!(query.starts_with("(set-option :timeout 5000)"));
        assert!(query.contains("(assert p)"));
        assert!(query.ends_with("(check-sat)\n(get-model)"));
    }
}
