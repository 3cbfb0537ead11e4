//! Symbol table for formal variables.
//!
//! Owns the mapping from logical-variable names to typed variables and
//! their observed value domains. Variables are stored in creation order so
//! SMT-LIB declarations and reports come out the same way on every run.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// The solver sort of a formal variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Bool,
    Int,
    Real,
    String,
}

impl VarKind {
    pub fn as_smt(&self) -> &'static str {
        match self {
            VarKind::Bool => "Bool",
            VarKind::Int => "Int",
            VarKind::Real => "Real",
            VarKind::String => "String",
        }
    }
}

/// Stable identity of a variable within one session's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarId(pub usize);

/// A named logic variable bound to the underlying solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormalVariable {
    pub name: String,
    pub kind: VarKind,
    /// String values this variable has been compared against, if any.
    pub domain: BTreeSet<String>,
}

/// Per-session registry of formal variables.
///
/// `get_or_create` is first-writer-wins: a second call with the same name
/// returns the existing variable regardless of the requested kind. The
/// first declaration fixes the sort.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    variables: Vec<FormalVariable>,
    by_name: HashMap<String, VarId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variable, or return the existing one under this name.
    pub fn get_or_create(&mut self, name: impl Into<String>, kind: VarKind) -> VarId {
        let name = name.into();
        if let Some(&id) = self.by_name.get(&name) {
            return id;
        }
        let id = VarId(self.variables.len());
        self.variables.push(FormalVariable {
            name: name.clone(),
            kind,
            domain: BTreeSet::new(),
        });
        self.by_name.insert(name, id);
        id
    }

    /// Record a string value observed in an equality against this variable.
    pub fn extend_domain(&mut self, id: VarId, value: impl Into<String>) {
        if let Some(var) = self.variables.get_mut(id.0) {
            var.domain.insert(value.into());
        }
    }

    pub fn resolve(&self, id: VarId) -> &FormalVariable {
        &self.variables[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<&FormalVariable> {
        self.by_name.get(name).map(|id| &self.variables[id.0])
    }

    /// Variables in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &FormalVariable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
