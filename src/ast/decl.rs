//! Declaration nodes. Each kind is its own struct - not a bare enum arm - so that the
//! per-kind behavior the scope builder needs (name, declared type if any, own location) is a
//! single trait impl per struct rather than a match arm repeated at every call site; `enum_dispatch`
//! wires the `Decl` enum to that trait the same way the teacher wires `Expression` to its
//! `CompileTime`/`Typed`/etc. traits in `parser/expressions/mod.rs`.

use super::{stmt::Stmt, Expr, Name, ScopeId, Spanned};
use crate::{errors::Location, types::TypeId};

/// Shared behavior every declaration kind provides.
#[enum_dispatch::enum_dispatch]
pub trait DeclNode {
	fn name(&self) -> &Name;
	fn location(&self) -> Location;
}

/// An immutable binding: `let x = expr`. No stack slot is allocated for it; the lowerer binds its
/// name directly to the evaluated value.
#[derive(Debug, Clone)]
pub struct LetDecl {
	pub name: Name,
	pub expr: Expr,
	pub location: Location,
	/// The `DeclContext` this declaration was inserted into. `None` until the scope builder visits it.
	pub scope: Option<ScopeId>,
}

impl DeclNode for LetDecl {
	fn name(&self) -> &Name {
		&self.name
	}

	fn location(&self) -> Location {
		self.location
	}
}

/// A mutable binding: `var x: T = expr`, backed by a stack slot once lowered.
#[derive(Debug, Clone)]
pub struct VarDecl {
	pub name: Name,
	pub declared_type: TypeId,
	pub init: Expr,
	pub location: Location,
	pub scope: Option<ScopeId>,
}

impl DeclNode for VarDecl {
	fn name(&self) -> &Name {
		&self.name
	}

	fn location(&self) -> Location {
		self.location
	}
}

/// A function parameter. Bound directly to the incoming argument value at lowering time - never a
/// stack slot - matching the specification's `named_values` rule for `ParamDecl`.
#[derive(Debug, Clone)]
pub struct ParamDecl {
	pub name: Name,
	pub declared_type: TypeId,
	pub location: Location,
	pub scope: Option<ScopeId>,
}

impl DeclNode for ParamDecl {
	fn name(&self) -> &Name {
		&self.name
	}

	fn location(&self) -> Location {
		self.location
	}
}

/// A function declaration. `signature` is the interned `FunctionType` built from the parsed
/// parameter and return types. `params_scope` is this `FuncDecl`'s own `DeclContext` (holding the
/// `ParamDecl`s); the body's own context is reached through `body` (a `Stmt::Compound`) and has
/// `params_scope` as its parent, per the specification's scope-nesting invariant.
#[derive(Debug, Clone)]
pub struct FuncDecl {
	pub name: Name,
	pub signature: TypeId,
	pub params: Vec<ParamDecl>,
	pub body: Stmt,
	pub location: Location,
	pub scope: Option<ScopeId>,
	pub params_scope: Option<ScopeId>,
}

impl DeclNode for FuncDecl {
	fn name(&self) -> &Name {
		&self.name
	}

	fn location(&self) -> Location {
		self.location
	}
}

/// A declaration of one of the four kinds above.
#[enum_dispatch::enum_dispatch(DeclNode)]
#[derive(Debug, Clone)]
pub enum Decl {
	Let(LetDecl),
	Var(VarDecl),
	Param(ParamDecl),
	Func(FuncDecl),
}

impl Spanned for Decl {
	fn location(&self) -> Location {
		DeclNode::location(self)
	}
}
