//! Statement nodes. Mirrors the specification's `Stmt` family one-for-one; `CompoundStmt` and the
//! loop/conditional bodies each carry the `ScopeId` the scope builder creates for them, since
//! every block in this language introduces its own `DeclContext`.

use super::{decl::Decl, Expr, ScopeId, Spanned};
use crate::errors::Location;

/// A single arm of an if/else-if chain: an optional binding visible only to `condition` and
/// `body` (covering `if let` patterns), the condition itself, and the arm's own body.
#[derive(Debug, Clone)]
pub struct ConditionalArm {
	pub decl: Option<Decl>,
	pub condition: Expr,
	pub body: Box<Stmt>,
	pub scope: ScopeId,
	pub location: Location,
}

/// A statement, tagged by [`StmtKind`].
#[derive(Debug, Clone)]
pub struct Stmt {
	pub kind: StmtKind,
	pub location: Location,
}

impl Stmt {
	#[must_use]
	pub fn new(kind: StmtKind, location: Location) -> Self {
		Self { kind, location }
	}
}

impl Spanned for Stmt {
	fn location(&self) -> Location {
		self.location
	}
}

/// The discriminator for [`Stmt`].
#[derive(Debug, Clone)]
pub enum StmtKind {
	Decl(Decl),
	Expr(Expr),
	/// `return expr;` or bare `return;`, the latter only legal in a function returning `()`.
	Return(Option<Expr>),
	/// A `{ ... }` block. Owns the `ScopeId` the scope builder allocates for its direct contents.
	Compound(Vec<Stmt>, ScopeId),
	/// An if/else-if/.../else chain. The trailing `else` arm, if present, is a bare `Compound`
	/// with no condition - it is never itself a `ConditionalArm`.
	Conditional { arms: Vec<ConditionalArm>, otherwise: Option<Box<Stmt>> },
	While {
		decl: Option<Decl>,
		condition: Expr,
		body: Box<Stmt>,
		scope: ScopeId,
	},
}
