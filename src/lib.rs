//! Policy-to-SMT compilation and verification engine.
//!
//! Compiles governance policies written in three surface dialects
//! (Rego-like rule blocks, structured JSON policy objects, Datalog-like
//! clauses) plus YAML-declared constitutional principles into typed logic
//! constraints, checks them with an SMT solver, and interprets the
//! satisfiability answers as compliance verdicts with counterexamples.
//!
//! # Architecture
//!
//! ```text
//! Policy text / principles YAML
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Parse          │  dialect sniffing, clause extraction
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  Constraint     │  symbol table, atom interning,
//! │  Building       │  typed terms with provenance
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │  SMT Solving    │  Z3 subprocess, or deterministic
//! │                 │  fallback when no solver is present
//! └─────────────────┘
//!          │
//!          ├─── UNSAT: obligations entailed, policy verified
//!          └─── SAT: counterexample extracted for review
//! ```
//!
//! The two external entry points are [`compile_and_verify`] and
//! [`check_entailment`]; everything else (transport, storage, auth) is the
//! caller's responsibility.

pub mod builder;
pub mod compliance;
pub mod constraint;
pub mod error;
pub mod parser;
pub mod principles;
pub mod properties;
pub mod session;
pub mod smtlib;
pub mod solver;
pub mod symbol;
pub mod term;

pub use builder::ConstraintBuilder;
pub use compliance::{ComplianceReport, PropertyVerification};
pub use constraint::{Constraint, PolicyCategory};
pub use error::{CompileError, ParseError};
pub use parser::{parse_policy, Atom, Clause, Condition, Dialect, ParsedClause};
pub use principles::PrinciplesDoc;
pub use session::{
    check_entailment, compile_and_verify, CompilationSession, CompilationSummary,
    VerificationResult,
};
pub use smtlib::export_smtlib;
pub use solver::{EntailmentAnswer, Outcome, SolverAdapter, SolverVerdict};
pub use symbol::{FormalVariable, SymbolTable, VarId, VarKind};
pub use term::{CompareOp, Term};
