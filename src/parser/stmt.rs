//! Statement grammar. No grammar table for this is in the retained source excerpts, so the
//! dispatch shape follows the teacher's own `Statement::parse` (`parser/statements/mod.rs`):
//! a keyword-driven `match` over the lookahead token, falling through to a bare expression
//! statement when nothing else matches.

use std::collections::VecDeque;

use super::{
	expr::{parse_expr, FullExpr},
	Context, Parse, TokenQueue as _,
};
use crate::{
	ast::{
		decl::Decl,
		stmt::{ConditionalArm, Stmt, StmtKind},
	},
	errors::CompileError,
	lexer::{Token, TokenKind},
	operators,
};

/// A thin `Parse`-compatible entry point so callers write `StmtRule::parse(...)` like every other
/// rule; `Stmt` itself is a plain data struct with no grammar of its own.
pub struct StmtRule;

impl Parse for StmtRule {
	type Output = Stmt;

	fn parse(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Stmt, CompileError> {
		let Some(token) = tokens.peek() else {
			let location = tokens.current_location();
			return Err(CompileError::new(crate::errors::CompileErrorKind::ParseError, location, "expected a statement but found end of input".to_owned()));
		};
		match token.kind {
			TokenKind::KeywordLet | TokenKind::KeywordVar | TokenKind::KeywordFunc => {
				let decl = Decl::parse(tokens, context)?;
				let location = crate::ast::Spanned::location(&decl);
				Ok(Stmt::new(StmtKind::Decl(decl), location))
			}
			TokenKind::KeywordReturn => parse_return(tokens, context),
			TokenKind::LBrace => parse_compound(tokens, context),
			TokenKind::KeywordIf => parse_conditional(tokens, context),
			TokenKind::KeywordWhile => parse_while(tokens, context),
			_ => {
				let location = token.location;
				let expr = FullExpr::parse(tokens, context)?;
				consume_statement_terminator(tokens)?;
				Ok(Stmt::new(StmtKind::Expr(expr), location))
			}
		}
	}
}

/// Statements are terminated by a newline (or, at the end of a block, the closing brace); a
/// semicolon-free grammar still needs *some* delimiter so `a = 1 b = 2` can't be read as one
/// statement, and the lexer already hands the parser a real `NewLine` token for exactly this.
fn consume_statement_terminator(tokens: &mut VecDeque<Token>) -> Result<(), CompileError> {
	if tokens.next_is(TokenKind::NewLine) {
		tokens.expect(TokenKind::NewLine)?;
	}
	Ok(())
}

fn parse_return(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Stmt, CompileError> {
	let keyword = tokens.expect(TokenKind::KeywordReturn)?;
	if tokens.next_is(TokenKind::NewLine) || tokens.next_is(TokenKind::RBrace) {
		consume_statement_terminator(tokens)?;
		return Ok(Stmt::new(StmtKind::Return(None), keyword.location));
	}
	let expr = FullExpr::parse(tokens, context)?;
	consume_statement_terminator(tokens)?;
	Ok(Stmt::new(StmtKind::Return(Some(expr)), keyword.location))
}

/// Parses `{ stmt* }`. Allocates this block's own `ScopeId` eagerly, at parse time - the scope
/// builder later attaches the `DeclContext` that lives at this id, but the AST shape needs the id
/// up front so every node that introduces a scope can name it uniformly.
pub fn parse_compound(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Stmt, CompileError> {
	let open = tokens.expect(TokenKind::LBrace)?;
	skip_newlines(tokens);
	let mut statements = Vec::new();
	while !tokens.next_is(TokenKind::RBrace) {
		statements.push(StmtRule::parse(tokens, context)?);
		skip_newlines(tokens);
	}
	tokens.expect(TokenKind::RBrace)?;
	Ok(Stmt::new(StmtKind::Compound(statements, 0), open.location))
}

fn skip_newlines(tokens: &mut VecDeque<Token>) {
	while tokens.next_is(TokenKind::NewLine) {
		let _ = tokens.pop_front();
	}
}

/// An `if`/`else if`/`else` chain. The trailing `else` (if present) is a bare compound block, not
/// a `ConditionalArm` - it has no condition of its own, matching the specification's
/// `ConditionalBlock(arms, optional else CompoundStmt)` shape.
fn parse_conditional(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Stmt, CompileError> {
	let first = tokens.expect(TokenKind::KeywordIf)?;
	let mut arms = vec![parse_conditional_arm(tokens, context)?];
	let mut otherwise = None;
	loop {
		if !tokens.next_is(TokenKind::KeywordElse) {
			break;
		}
		tokens.expect(TokenKind::KeywordElse)?;
		if tokens.next_is(TokenKind::KeywordIf) {
			tokens.expect(TokenKind::KeywordIf)?;
			arms.push(parse_conditional_arm(tokens, context)?);
		} else {
			otherwise = Some(Box::new(parse_compound(tokens, context)?));
			break;
		}
	}
	Ok(Stmt::new(StmtKind::Conditional { arms, otherwise }, first.location))
}

fn parse_conditional_arm(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<ConditionalArm, CompileError> {
	let decl = parse_optional_binding(tokens, context)?;
	let condition = parse_expr(tokens, context, operators::MAX_LEVEL)?;
	let location = condition.location;
	let body = Box::new(parse_compound(tokens, context)?);
	Ok(ConditionalArm { decl, condition, body, scope: 0, location })
}

fn parse_while(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Stmt, CompileError> {
	let keyword = tokens.expect(TokenKind::KeywordWhile)?;
	let decl = parse_optional_binding(tokens, context)?;
	let condition = parse_expr(tokens, context, operators::MAX_LEVEL)?;
	let body = Box::new(parse_compound(tokens, context)?);
	Ok(Stmt::new(
		StmtKind::While {
			decl,
			condition,
			body,
			scope: 0,
		},
		keyword.location,
	))
}

/// `if let x = expr { ... }` / `while let x = expr { ... }`: an optional `let` binding visible
/// only to the following condition and body.
fn parse_optional_binding(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Option<Decl>, CompileError> {
	if !tokens.next_is(TokenKind::KeywordLet) {
		return Ok(None);
	}
	Ok(Some(Decl::parse(tokens, context)?))
}

