//! The AST data model: five parallel tagged-variant families (`Type` lives in `crate::types`,
//! the other four live here) replacing the source compiler's runtime-downcasted `TreeElement`
//! hierarchy. Every family is an exhaustive enum; the checker and lowerer match on it directly
//! rather than chasing `dyn` objects, so both are total over the grammar by construction.

pub mod decl;
pub mod expr;
pub mod stmt;

use crate::errors::Location;

/// An identifier as written in source. Thin wrapper (not a bare `String`) so the rest of the
/// compiler can't accidentally compare a variable name against an unrelated string, mirroring the
/// teacher's own `Name` newtype (`parser/expressions/util/name.rs`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub String);

impl std::fmt::Display for Name {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<String> for Name {
	fn from(value: String) -> Self {
		Self(value)
	}
}

impl From<&str> for Name {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

pub use expr::{Expr, ExprKind};
pub use stmt::Stmt;

/// An owned index into the `DeclContext` arena (`crate::scope`). Stands in for the "weak link to
/// a parent context" the specification describes; the arena itself enforces that every index it
/// hands out stays valid for the compilation unit's lifetime.
pub type ScopeId = usize;

/// A source-range anchor shared by every AST node kind. The original has a full start/end range;
/// this crate, like the original's actual usage, only ever needs the start location for
/// diagnostics, so `source_range` and `location` coincide.
pub trait Spanned {
	fn location(&self) -> Location;
}
