//! Rego-like rule block parsing.
//!
//! Locates `allow { ... }` and `allow if { ... }` blocks by brace matching
//! and extracts the conditions inside: equality lines (`lhs == "rhs"`,
//! where `lhs` may be an `input.<field>` path) and bare `input.<field>`
//! presence checks. Comment (`#`) and blank lines are ignored.

use tracing::warn;

use super::{sanitize_ident, Atom, Clause, Condition, ParsedClause};

/// True when the text carries at least one `allow` block.
pub fn has_allow_block(text: &str) -> bool {
    find_allow_blocks(text).next().is_some()
}

/// Parse every `allow` block into an implication clause.
pub fn parse_rego(text: &str) -> Vec<ParsedClause> {
    let mut clauses = Vec::new();
    for body in find_allow_blocks(text) {
        let mut conditions = Vec::new();
        for line in body.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_condition_line(line) {
                Some(cond) => conditions.push(cond),
                None => warn!(line, "skipping unrecognized rego condition"),
            }
        }
        let head = Condition::Atom(Atom::bare("allow"));
        let clause = if conditions.is_empty() {
            Clause::Fact(head)
        } else {
            Clause::Rule {
                body: conditions,
                head,
            }
        };
        clauses.push(ParsedClause::access_control(clause));
    }
    clauses
}

/// Iterate over the brace-matched bodies of `allow` blocks.
fn find_allow_blocks(text: &str) -> impl Iterator<Item = &str> {
    let mut blocks = Vec::new();
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find("allow") {
        let at = search_from + rel;
        let after = &text[at + "allow".len()..];
        // Accept `allow {` and `allow if {`; anything else is not a block.
        let rest = after.trim_start();
        let rest = rest.strip_prefix("if").map(str::trim_start).unwrap_or(rest);
        if let Some(stripped) = rest.strip_prefix('{') {
            let body_start = text.len() - stripped.len();
            match match_brace(text, body_start) {
                Some(body_end) => {
                    blocks.push(&text[body_start..body_end]);
                    search_from = body_end + 1;
                    continue;
                }
                None => {
                    warn!(offset = at, "unbalanced braces in allow block");
                    break;
                }
            }
        }
        search_from = at + "allow".len();
    }
    blocks.into_iter()
}

/// Given the index just past an opening brace, return the index of the
/// matching closing brace.
fn match_brace(text: &str, body_start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (i, ch) in text[body_start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(body_start + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_condition_line(line: &str) -> Option<Condition> {
    if let Some(pos) = line.find("==") {
        let left = line[..pos].trim();
        let right = line[pos + 2..].trim();
        let field = sanitize_ident(left);
        if field.is_empty() || right.is_empty() {
            return None;
        }
        if let Some(value) = strip_quotes(right) {
            return Some(Condition::Equals {
                field,
                value: value.to_string(),
            });
        }
        if let Ok(value) = right.parse::<f64>() {
            return Some(Condition::NumberEquals { field, value });
        }
        return match right {
            "true" => Some(Condition::Atom(Atom::bare(field))),
            "false" => Some(Condition::Negated(Atom::bare(field))),
            _ => None,
        };
    }

    if line.starts_with("input.") && !line.contains(char::is_whitespace) {
        return Some(Condition::Present {
            field: sanitize_ident(line),
        });
    }

    None
}

fn strip_quotes(text: &str) -> Option<&str> {
    text.strip_prefix('"').and_then(|t| t.strip_suffix('"'))
}
