//! Recursive-descent parsing. Generalizes the teacher's `Parse`/`TokenQueue`/`parse_list!` trio
//! (`parser/mod.rs`) unchanged in shape: tokens are consumed from the front of a `VecDeque`, each
//! grammar rule is a type implementing [`Parse`], and comma-separated lists still go through one
//! macro. The one deliberate deviation: the teacher's `TokenQueue::pop` and `::pop_type` raise two
//! differently-shaped errors from the same trait; here both paths - and every parse failure -
//! raise one [`CompileError`] of kind `ParseError`, so the driver never special-cases parser
//! failures against checker/lowerer failures.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod types;

use std::collections::VecDeque;

use crate::{
	ast::{
		decl::Decl,
		stmt::{Stmt, StmtKind},
		Spanned as _,
	},
	errors::{CompileError, CompileErrorKind, Location},
	lexer::{Token, TokenKind},
	types::TypeInterner,
};

/// State threaded through every parse rule. Holds the type interner because type annotations are
/// resolved to a [`crate::types::TypeId`] eagerly, at parse time (fundamental and compound type
/// grammar never needs a forward reference, unlike value-level declarations).
pub struct Context {
	pub types: TypeInterner,
}

impl Context {
	#[must_use]
	pub fn new() -> Self {
		Self { types: TypeInterner::new() }
	}
}

impl Default for Context {
	fn default() -> Self {
		Self::new()
	}
}

/// A grammar rule: parses one node of type `Output` from the front of a token stream.
pub trait Parse {
	type Output;

	/// # Errors
	/// Returns [`CompileError`] of kind [`CompileErrorKind::ParseError`] if the token stream does
	/// not match this rule's grammar.
	fn parse(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Self::Output, CompileError>;
}

/// Treats a `VecDeque<Token>` as a consumable stream with lookahead one, the same role the
/// teacher's `TokenQueue` plays over `VecDeque<Token>`.
pub trait TokenQueue {
	/// Removes and returns the next token if its kind is `kind`; otherwise raises `ParseError`
	/// without consuming anything.
	fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError>;

	/// Returns a reference to the next token, if any.
	fn peek(&self) -> Option<&Token>;

	/// Whether the next token has kind `kind`.
	fn next_is(&self, kind: TokenKind) -> bool;

	/// Whether the next token has one of `kinds`.
	fn next_is_one_of(&self, kinds: &[TokenKind]) -> bool {
		kinds.iter().any(|kind| self.next_is(*kind))
	}

	/// The location the next token starts at, or the location just past the last token if the
	/// stream is exhausted (only the synthetic `Eof` token should ever be in that position).
	fn current_location(&self) -> Location;

	/// Consumes the next token only if it is an `OperatorId` with exactly this lexeme - the
	/// equivalent of the original parser's `consumeOperator`/`expectOperator`, but fatal on
	/// mismatch rather than returning a bool, since every call site here requires the operator.
	fn expect_operator(&mut self, lexeme: &str) -> Result<Token, CompileError>;
}

impl TokenQueue for VecDeque<Token> {
	fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
		let location = self.current_location();
		match self.pop_front() {
			Some(token) if token.kind == kind => Ok(token),
			Some(token) => Err(CompileError::new(
				CompileErrorKind::ParseError,
				location,
				format!("expected {kind:?} but found {:?} ('{}')", token.kind, token.lexeme),
			)),
			None => Err(CompileError::new(CompileErrorKind::ParseError, location, format!("expected {kind:?} but found end of input"))),
		}
	}

	fn peek(&self) -> Option<&Token> {
		self.front()
	}

	fn next_is(&self, kind: TokenKind) -> bool {
		self.peek().is_some_and(|token| token.kind == kind)
	}

	fn current_location(&self) -> Location {
		self.peek().map_or(Location::synthetic(), |token| token.location)
	}

	fn expect_operator(&mut self, lexeme: &str) -> Result<Token, CompileError> {
		let location = self.current_location();
		match self.front() {
			Some(token) if token.kind == TokenKind::OperatorId && token.lexeme == lexeme => Ok(self.pop_front().expect("just peeked")),
			Some(token) => Err(CompileError::new(CompileErrorKind::ParseError, location, format!("expected '{lexeme}' but found '{}'", token.lexeme))),
			None => Err(CompileError::new(CompileErrorKind::ParseError, location, format!("expected '{lexeme}' but found end of input"))),
		}
	}
}

/// Parses a comma-separated list: runs `$body` once, then while the next token is a comma,
/// consumes it and runs `$body` again. Matches the teacher's `parse_list!` (`parser/mod.rs`); this
/// grammar likewise has no trailing commas.
#[macro_export]
macro_rules! parse_list {
	($tokens:expr, $body:block) => {{
		$body;
		while $tokens.next_is($crate::lexer::TokenKind::Comma) {
			$crate::parser::TokenQueue::expect($tokens, $crate::lexer::TokenKind::Comma)?;
			$body;
		}
	}};
}

/// A whole parsed program: top-level declarations in source order.
#[derive(Debug, Clone)]
pub struct Program {
	pub statements: Vec<Stmt>,
}

/// Parses an entire token stream into a [`Program`]. Every top-level statement must be a
/// [`Decl`]; bare expressions and control flow are only legal inside function bodies.
pub fn parse(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Program, CompileError> {
	let mut statements = Vec::new();
	loop {
		while tokens.next_is(TokenKind::NewLine) {
			tokens.expect(TokenKind::NewLine)?;
		}
		if tokens.is_empty() || tokens.next_is(TokenKind::Eof) {
			break;
		}
		let decl = Decl::parse(tokens, context)?;
		let location = decl.location();
		statements.push(Stmt::new(StmtKind::Decl(decl), location));
	}
	Ok(Program { statements })
}
