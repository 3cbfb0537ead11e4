//! Policy parser.
//!
//! Converts the three accepted surface syntaxes into a list of parsed
//! clauses. The dialect is sniffed from the text itself: a JSON document
//! starts with `{` or `[`, Rego-like input carries `allow { ... }` blocks,
//! and everything else is treated as Datalog-like clauses.
//!
//! Predicates are abstracted to boolean atoms: `name(arg1, arg2)` keeps its
//! name plus a normalized argument key, and two predicates collapse to the
//! same atom only when both match. Arguments are never unified or bound.

pub mod datalog;
pub mod json;
pub mod rego;

use serde::{Deserialize, Serialize};

use crate::constraint::PolicyCategory;
use crate::error::ParseError;

/// The surface syntax a policy document was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
    Json,
    Rego,
    Datalog,
}

/// A predicate abstracted to a propositional atom.
///
/// Identity is the (name, arg_key) pair; the argument key is the
/// comma-joined, whitespace-normalized argument list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    pub name: String,
    pub arg_key: String,
}

impl Atom {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arg_key: String::new(),
        }
    }
}

/// One condition extracted from a policy clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A predicate or bare fact.
    Atom(Atom),
    /// A negated predicate (JSON `false` values).
    Negated(Atom),
    /// String equality against a field, e.g. `input.role == "admin"`.
    Equals { field: String, value: String },
    /// Numeric equality against a field (JSON number values).
    NumberEquals { field: String, value: f64 },
    /// Field presence check, e.g. a bare `input.user` line.
    Present { field: String },
}

/// A parsed clause: either a bare fact or a body-implies-head rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Fact(Condition),
    Rule {
        body: Vec<Condition>,
        head: Condition,
    },
}

/// A clause annotated with its originating category.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedClause {
    pub clause: Clause,
    pub category: PolicyCategory,
}

impl ParsedClause {
    pub fn access_control(clause: Clause) -> Self {
        Self {
            clause,
            category: PolicyCategory::AccessControl,
        }
    }
}

/// Sniff the dialect of a policy document.
pub fn detect_dialect(text: &str) -> Dialect {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Dialect::Json;
    }
    if rego::has_allow_block(text) {
        return Dialect::Rego;
    }
    Dialect::Datalog
}

/// Parse a policy document, skipping malformed fragments with a warning.
///
/// An unparseable document yields an empty clause list, never an error;
/// an empty constraint set is valid and trivially satisfiable.
pub fn parse_policy(text: &str) -> Vec<ParsedClause> {
    match detect_dialect(text) {
        Dialect::Json => json::parse_json(text),
        Dialect::Rego => rego::parse_rego(text),
        Dialect::Datalog => datalog::parse_datalog(text),
    }
}

/// Parse a single predicate of the form `name(arg1, arg2, ...)` or a bare
/// atom name. The trailing clause terminator `.` is stripped.
pub fn parse_predicate(text: &str) -> Result<Atom, ParseError> {
    let text = text.trim().trim_end_matches('.').trim();
    if text.is_empty() {
        return Err(ParseError::MalformedClause(text.to_string()));
    }

    if let Some(open) = text.find('(') {
        let close = text
            .rfind(')')
            .ok_or_else(|| ParseError::MalformedClause(text.to_string()))?;
        if close < open {
            return Err(ParseError::MalformedClause(text.to_string()));
        }
        let name = sanitize_ident(&text[..open]);
        if name.is_empty() {
            return Err(ParseError::MalformedClause(text.to_string()));
        }
        let arg_key = text[open + 1..close]
            .split(',')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(",");
        Ok(Atom { name, arg_key })
    } else {
        let name = sanitize_ident(text);
        if name.is_empty() {
            return Err(ParseError::MalformedClause(text.to_string()));
        }
        Ok(Atom::bare(name))
    }
}

/// Reduce arbitrary text to a solver-safe identifier: alphanumerics and
/// underscores, with every other run of characters collapsed to one `_`.
pub fn sanitize_ident(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_underscore = false;
    for ch in text.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_json() {
        assert_eq!(detect_dialect(r#"{"resource": "vault"}"#), Dialect::Json);
        assert_eq!(detect_dialect("  [1, 2]"), Dialect::Json);
    }

    #[test]
    fn test_detect_rego() {
        let text = "package authz\n\nallow {\n  input.role == \"admin\"\n}\n";
        assert_eq!(detect_dialect(text), Dialect::Rego);
    }

    #[test]
    fn test_detect_datalog() {
        assert_eq!(
            detect_dialect("grant(X) :- owner(X).\n"),
            Dialect::Datalog
        );
        assert_eq!(detect_dialect("plain_fact."), Dialect::Datalog);
    }

    #[test]
    fn test_parse_predicate_with_args() {
        let atom = parse_predicate("has_role(User, admin)").unwrap();
        assert_eq!(atom.name, "has_role");
        assert_eq!(atom.arg_key, "User,admin");
    }

    #[test]
    fn test_parse_predicate_bare() {
        let atom = parse_predicate("ensure_role_based_access_for_principle_1.").unwrap();
        assert_eq!(atom.name, "ensure_role_based_access_for_principle_1");
        assert_eq!(atom.arg_key, "");
    }

    #[test]
    fn test_parse_predicate_distinct_args_distinct_atoms() {
        let a = parse_predicate("has_role(User,admin)").unwrap();
        let b = parse_predicate("has_role(alice,admin)").unwrap();
        assert_ne!(a, b);
        let c = parse_predicate("has_role( User , admin )").unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn test_parse_predicate_malformed() {
        assert!(parse_predicate("broken(").is_err());
        assert!(parse_predicate("").is_err());
        assert!(parse_predicate(")(").is_err());
    }

    #[test]
    fn test_sanitize_ident() {
        assert_eq!(sanitize_ident("input.user.role"), "input_user_role");
        assert_eq!(sanitize_ident("Safety First!"), "safety_first");
        assert_eq!(sanitize_ident("  spaced  out  "), "spaced_out");
    }
}
