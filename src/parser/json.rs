//! Structured JSON policy parsing.
//!
//! A top-level JSON object becomes a uniform list of access-control facts:
//! string values are field equalities, booleans assert or negate a bare
//! atom, numbers are numeric equalities. Nested values have no
//! propositional reading here and are skipped with a warning.

use serde_json::Value;
use tracing::warn;

use super::{sanitize_ident, Atom, Clause, Condition, ParsedClause};
use crate::error::ParseError;

pub fn parse_json(text: &str) -> Vec<ParsedClause> {
    match parse_json_object(text) {
        Ok(clauses) => clauses,
        Err(err) => {
            warn!(%err, "skipping malformed JSON policy");
            Vec::new()
        }
    }
}

fn parse_json_object(text: &str) -> Result<Vec<ParsedClause>, ParseError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| ParseError::MalformedJson(e.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| ParseError::MalformedJson("top-level value is not an object".into()))?;

    let mut clauses = Vec::new();
    for (key, value) in object {
        let field = sanitize_ident(key);
        if field.is_empty() {
            warn!(key = key.as_str(), "skipping JSON key with no identifier characters");
            continue;
        }
        let condition = match value {
            Value::String(s) => Condition::Equals {
                field,
                value: s.clone(),
            },
            Value::Bool(true) => Condition::Atom(Atom::bare(field)),
            Value::Bool(false) => Condition::Negated(Atom::bare(field)),
            Value::Number(n) => match n.as_f64() {
                Some(value) => Condition::NumberEquals { field, value },
                None => {
                    warn!(key = key.as_str(), "skipping non-finite JSON number");
                    continue;
                }
            },
            _ => {
                warn!(
                    key = key.as_str(),
                    "skipping JSON value with no propositional reading"
                );
                continue;
            }
        };
        clauses.push(ParsedClause::access_control(Clause::Fact(condition)));
    }
    Ok(clauses)
}
