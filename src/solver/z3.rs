//! Z3 subprocess backend.
//!
//! Pipes an SMT-LIB query into a `z3` binary discovered at startup and
//! parses the sat/unsat/unknown answer plus the model. The timeout is
//! solver-native (`:timeout` option), so a stuck query surfaces as
//! `unknown` rather than blocking the session.

use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::debug;

use super::SolverVerdict;
use crate::smtlib::solver_query;
use crate::symbol::SymbolTable;
use crate::term::Term;

/// Model assignments reported per counterexample, for readability.
const MODEL_ASSIGNMENT_CAP: usize = 5;

const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// A located Z3 binary plus the per-check timeout.
#[derive(Debug, Clone)]
pub struct Z3Backend {
    z3_path: String,
    timeout_ms: u64,
}

impl Z3Backend {
    /// Probe for a usable `z3` binary; `None` means the caller should fall
    /// back to the deterministic solver.
    pub fn locate() -> Option<Self> {
        let z3_path = Self::find_z3()?;
        Some(Self {
            z3_path,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        })
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn find_z3() -> Option<String> {
        if Command::new("z3")
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
        {
            return Some("z3".to_string());
        }

        let paths = ["/usr/bin/z3", "/usr/local/bin/z3", "/opt/homebrew/bin/z3"];
        for path in paths {
            if std::path::Path::new(path).exists() {
                return Some(path.to_string());
            }
        }

        None
    }

    /// Assert every term and check satisfiability in a fresh context.
    pub fn check_terms(&self, symbols: &SymbolTable, terms: &[Term]) -> SolverVerdict {
        let query = solver_query(symbols, terms, self.timeout_ms);
        debug!(query_len = query.len(), "running z3 query");
        match self.run(&query) {
            Ok(output) => self.parse_output(&output),
            Err(err) => SolverVerdict::failed(format!("{:#}", err)),
        }
    }

    fn run(&self, query: &str) -> Result<String> {
        let mut child = Command::new(&self.z3_path)
            .arg("-in")
            .arg("-smt2")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn z3")?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(query.as_bytes())
                .context("failed to write query to z3")?;
        }

        let output = child.wait_with_output().context("failed to wait for z3")?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn parse_output(&self, output: &str) -> SolverVerdict {
        let mut lines = output.lines();
        match lines.next().map(str::trim) {
            Some("sat") => {
                let model = parse_model(lines, MODEL_ASSIGNMENT_CAP);
                SolverVerdict::sat(model)
            }
            Some("unsat") => SolverVerdict::unsat(),
            Some("unknown") => SolverVerdict::unknown(),
            Some(other) => SolverVerdict::failed(format!("unexpected z3 output: {}", other)),
            None => SolverVerdict::failed("empty output from z3"),
        }
    }
}

/// Extract variable assignments from `(define-fun name () Sort value)`
/// lines, capped for readability. Enumeration order follows solver-internal
/// bookkeeping and is not a stable contract.
fn parse_model<'a>(
    lines: impl Iterator<Item = &'a str>,
    cap: usize,
) -> BTreeMap<String, String> {
    let mut model = BTreeMap::new();
    for line in lines {
        if model.len() >= cap {
            break;
        }
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("(define-fun ") {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            if parts.len() >= 4 {
                if let Some(value) = parts.last() {
                    let value = value.trim_end_matches(')');
                    model.insert(parts[0].to_string(), value.to_string());
                }
            }
        }
    }
    model
}
