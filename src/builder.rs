//! Constraint builder.
//!
//! Turns parsed clauses and constitutional-principle declarations into
//! typed constraints over the session's symbol table. Predicates are
//! interned: each distinct (name, argument-list) pair gets one boolean
//! variable, so syntactically equal predicates collapse and distinct
//! argument lists never collide.

use std::collections::HashMap;

use crate::constraint::{Constraint, PolicyCategory};
use crate::parser::{sanitize_ident, Atom, Clause, Condition, ParsedClause};
use crate::principles::{PrinciplesDoc, Requirement};
use crate::symbol::{SymbolTable, VarKind};
use crate::term::Term;

/// Priorities assigned by the builder, lowest to highest.
const PRIORITY_FACT: u8 = 1;
const PRIORITY_RULE: u8 = 2;
const PRIORITY_REQUIREMENT: u8 = 2;
const PRIORITY_PRINCIPLE: u8 = 3;
const PRIORITY_STRICT: u8 = 5;

/// Accumulates symbols and constraints for one compilation session.
#[derive(Debug, Default)]
pub struct ConstraintBuilder {
    symbols: SymbolTable,
    constraints: Vec<Constraint>,
    atom_vars: HashMap<Atom, String>,
    atom_counts: HashMap<String, usize>,
}

impl ConstraintBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every parsed clause as a constraint under the given policy id.
    pub fn add_clauses(&mut self, clauses: &[ParsedClause], policy_id: &str) {
        for parsed in clauses {
            let priority = match &parsed.clause {
                Clause::Fact(_) => PRIORITY_FACT,
                Clause::Rule { .. } => PRIORITY_RULE,
            };
            let expression = self.clause_term(&parsed.clause);
            self.constraints.push(Constraint::new(
                expression,
                policy_id,
                parsed.category,
                priority,
            ));
        }
    }

    /// Lower one clause to a term: a fact is its condition, a rule is
    /// `Implies(And(body), head)`.
    pub fn clause_term(&mut self, clause: &Clause) -> Term {
        match clause {
            Clause::Fact(cond) => self.condition_term(cond),
            Clause::Rule { body, head } => {
                let body_terms: Vec<Term> = body.iter().map(|c| self.condition_term(c)).collect();
                let head_term = self.condition_term(head);
                Term::implies(Term::conjoin(body_terms), head_term)
            }
        }
    }

    /// Add constraints for a constitutional-principles document.
    ///
    /// Each principle gets a `principle_<name>` boolean implied to its
    /// requirements conjunction; `enforcement: strict` additionally asserts
    /// the bare principle variable. Governance requirements follow the same
    /// pattern at a lower priority.
    pub fn add_principles(&mut self, doc: &PrinciplesDoc) {
        for (name, spec) in &doc.constitutional_principles {
            let var_name = format!("principle_{}", sanitize_ident(name));
            self.symbols.get_or_create(&var_name, VarKind::Bool);

            let requirement_terms: Vec<Term> = spec
                .requirements
                .iter()
                .map(|req| self.requirement_term(req))
                .collect();

            if !requirement_terms.is_empty() {
                self.constraints.push(Constraint::new(
                    Term::implies(
                        Term::var(&var_name),
                        Term::conjoin(requirement_terms),
                    ),
                    name,
                    PolicyCategory::ConstitutionalPrinciple,
                    PRIORITY_PRINCIPLE,
                ));
            }

            if spec.is_strict() {
                self.constraints.push(Constraint::new(
                    Term::var(&var_name),
                    name,
                    PolicyCategory::ConstitutionalPrinciple,
                    PRIORITY_STRICT,
                ));
            }
        }

        for (name, spec) in &doc.governance_requirements {
            let var_name = format!("requirement_{}", sanitize_ident(name));
            self.symbols.get_or_create(&var_name, VarKind::Bool);

            if let Some(threshold) = spec.threshold {
                let metric = format!("{}_value", sanitize_ident(name));
                self.symbols.get_or_create(&metric, VarKind::Real);
                self.constraints.push(Constraint::new(
                    Term::implies(Term::var(&var_name), Term::at_least(metric, threshold)),
                    name,
                    PolicyCategory::GovernanceRule,
                    PRIORITY_REQUIREMENT,
                ));
            }
        }
    }

    /// Lower one condition to a term, registering its variables.
    pub fn condition_term(&mut self, condition: &Condition) -> Term {
        match condition {
            Condition::Atom(atom) => self.atom_term(atom),
            Condition::Negated(atom) => Term::not(self.atom_term(atom)),
            Condition::Equals { field, value } => {
                let id = self.symbols.get_or_create(field, VarKind::String);
                self.symbols.extend_domain(id, value);
                Term::str_eq(field, value)
            }
            Condition::NumberEquals { field, value } => {
                self.symbols.get_or_create(field, VarKind::Real);
                Term::compare(
                    Term::var(field),
                    crate::term::CompareOp::Eq,
                    Term::Real(*value),
                )
            }
            Condition::Present { field } => {
                let name = format!("{}_present", field);
                self.symbols.get_or_create(&name, VarKind::Bool);
                Term::var(name)
            }
        }
    }

    fn requirement_term(&mut self, requirement: &Requirement) -> Term {
        match requirement {
            Requirement::Threshold { metric, threshold } => {
                let name = sanitize_ident(metric);
                self.symbols.get_or_create(&name, VarKind::Real);
                Term::at_least(name, *threshold)
            }
            Requirement::Flag { name, expected } => {
                let var = sanitize_ident(name);
                self.symbols.get_or_create(&var, VarKind::Bool);
                if *expected {
                    Term::var(var)
                } else {
                    Term::not(Term::var(var))
                }
            }
            Requirement::Text(text) => {
                let var = sanitize_ident(text);
                self.symbols.get_or_create(&var, VarKind::Bool);
                Term::var(var)
            }
        }
    }

    /// The boolean term for an interned atom.
    ///
    /// `true` and `false` atoms lower to boolean literals so Datalog bodies
    /// like `:- true` behave as expected.
    fn atom_term(&mut self, atom: &Atom) -> Term {
        if atom.arg_key.is_empty() {
            match atom.name.as_str() {
                "true" => return Term::Bool(true),
                "false" => return Term::Bool(false),
                _ => {}
            }
        }
        let name = self.intern_atom(atom);
        self.symbols.get_or_create(&name, VarKind::Bool);
        Term::var(name)
    }

    fn intern_atom(&mut self, atom: &Atom) -> String {
        if let Some(name) = self.atom_vars.get(atom) {
            return name.clone();
        }
        let name = if atom.arg_key.is_empty() {
            atom.name.clone()
        } else {
            let count = self.atom_counts.entry(atom.name.clone()).or_insert(0);
            *count += 1;
            format!("{}__{}", atom.name, count)
        };
        self.atom_vars.insert(atom.clone(), name.clone());
        name
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn finish(self) -> (SymbolTable, Vec<Constraint>) {
        (self.symbols, self.constraints)
    }
}
