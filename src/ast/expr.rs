//! Expression nodes. One tagged enum per the specification's `Expr` variant list, matching
//! `AST/Expr.cpp`'s variant shapes but replacing its `dynamic_cast` hierarchy with plain pattern
//! matching, per the "Polymorphic AST" design note.

use super::{Name, Spanned};
use crate::{errors::Location, types::TypeId};

/// A parsed expression. `resolved_type` and `is_left_value` start unset and are filled in exactly
/// once, by the type checker (`crate::sema`); the IR lowerer only ever reads them afterwards.
#[derive(Debug, Clone)]
pub struct Expr {
	pub kind: ExprKind,
	pub location: Location,
	pub resolved_type: Option<TypeId>,
	pub is_left_value: bool,
}

impl Expr {
	#[must_use]
	pub fn new(kind: ExprKind, location: Location) -> Self {
		Self {
			kind,
			location,
			resolved_type: None,
			is_left_value: false,
		}
	}

	/// The resolved type, expected to be set by the time this is called (i.e. any time after the
	/// checker has visited this node). Panicking here rather than returning `Option` matches the
	/// specification's invariant that every non-literal checked `Expr` has a non-null type: a
	/// `None` at lowering time is a checker bug, not a user error.
	#[must_use]
	pub fn resolved_type(&self) -> TypeId {
		self.resolved_type.expect("expression lowered before type-check annotated it")
	}

	/// The immediate sub-expressions, for uniform traversal. Does not recurse.
	#[must_use]
	pub fn children(&self) -> Vec<&Self> {
		match &self.kind {
			ExprKind::Integer(_) | ExprKind::Double(_) | ExprKind::Bool(_) | ExprKind::String(_) | ExprKind::Identifier(_) | ExprKind::Operator { .. } => vec![],
			ExprKind::Tuple(elements) | ExprKind::List(elements) => elements.iter().collect(),
			ExprKind::Accessor { base, .. } => vec![base],
			ExprKind::Unary { operand, .. } => vec![operand],
			ExprKind::Binary { left, right, .. } => vec![left, right],
			ExprKind::Call { args, .. } => args.iter().collect(),
			ExprKind::Labeled { expr, .. } => vec![expr],
		}
	}
}

impl Spanned for Expr {
	fn location(&self) -> Location {
		self.location
	}
}

/// The discriminator for [`Expr`].
#[derive(Debug, Clone)]
pub enum ExprKind {
	Integer(i64),
	Double(f64),
	Bool(bool),
	String(String),
	Identifier(Name),
	Tuple(Vec<Expr>),
	List(Vec<Expr>),
	/// Tuple indexing with a constant integer, per the specification's Open Question: the source
	/// defines `AccessorExpr` but never checks or lowers it, so this shape ("base expression,
	/// constant integer index") is inferred from the AST alone.
	Accessor { base: Box<Expr>, index: i64 },
	/// A bare reference to an operator as a value (e.g. passing `+` itself around). Parsed by
	/// nothing in this grammar - the specification lists it as an `Expr` variant but no grammar
	/// rule ever constructs one - so the checker treats any occurrence as `Unimplemented`.
	Operator { lexeme: String, level: usize },
	Unary { op: String, operand: Box<Expr> },
	Binary { left: Box<Expr>, op: String, right: Box<Expr> },
	Call { callee: Name, args: Vec<Expr> },
	Labeled { label: Name, expr: Box<Expr> },
}
