//! Datalog-like clause parsing.
//!
//! A clause is `head :- body.` or a bare fact `fact.`; the body splits on
//! top-level commas (parenthesis-depth aware), and every predicate is
//! abstracted to a propositional atom. `%` and `#` comment lines are
//! ignored. This is intentionally not full Datalog: no unification, no
//! recursion, one atom per distinct (name, argument-list) pair.

use tracing::warn;

use super::{parse_predicate, Clause, Condition, ParsedClause};
use crate::error::ParseError;

/// Parse a document of newline-separated clauses, skipping malformed
/// clauses with a warning.
pub fn parse_datalog(text: &str) -> Vec<ParsedClause> {
    let mut clauses = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }
        match parse_clause(line) {
            Ok(clause) => clauses.push(ParsedClause::access_control(clause)),
            Err(err) => warn!(clause = line, %err, "skipping malformed clause"),
        }
    }
    clauses
}

/// Parse one clause string.
pub fn parse_clause(text: &str) -> Result<Clause, ParseError> {
    let text = text.trim();
    match text.split_once(":-") {
        Some((head, body)) => {
            let head = Condition::Atom(parse_predicate(head)?);
            let mut conditions = Vec::new();
            for part in split_top_level(body.trim().trim_end_matches('.')) {
                conditions.push(Condition::Atom(parse_predicate(part)?));
            }
            if conditions.is_empty() {
                return Err(ParseError::MalformedClause(text.to_string()));
            }
            Ok(Clause::Rule {
                body: conditions,
                head,
            })
        }
        None => Ok(Clause::Fact(Condition::Atom(parse_predicate(text)?))),
    }
}

/// Split on commas at parenthesis depth zero.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}
