//! Expression grammar: precedence climbing over the process-wide [`crate::operators`] table.
//! Grounded in `Parse/ExprParser.cpp`, with one redesign: the original's `parseInfixLeft` folds
//! left-associative chains with a recursive inner lambda; here it's an iterative loop, since
//! nothing about left-folding needs the call stack to grow with the chain's length.

use std::collections::VecDeque;

use super::{Context, Parse, TokenQueue as _};
use crate::{
	ast::{Expr, ExprKind, Name},
	errors::{CompileError, CompileErrorKind, Location},
	lexer::{Token, TokenKind},
	operators::{self, Associativity},
};

/// A thin `Parse`-compatible entry point for a full expression, starting at the loosest level.
pub struct FullExpr;

impl Parse for FullExpr {
	type Output = Expr;

	fn parse(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Expr, CompileError> {
		parse_expr(tokens, context, operators::MAX_LEVEL)
	}
}

/// Parses an expression at precedence `level`. A leading `(` always starts a tuple/grouped
/// expression regardless of `level`, matching the original's "check for `(` before dispatching on
/// precedence" shortcut.
pub fn parse_expr(tokens: &mut VecDeque<Token>, context: &mut Context, level: usize) -> Result<Expr, CompileError> {
	if tokens.next_is(TokenKind::LParen) {
		return parse_tuple_expr(tokens, context);
	}
	match level {
		operators::VALUE_LEVEL => parse_value_expr(tokens, context),
		operators::UNARY_LEVEL => parse_unary_expr(tokens, context),
		_ => parse_binary_expr(tokens, context, level),
	}
}

fn current_lexeme(tokens: &VecDeque<Token>) -> Option<&str> {
	tokens.peek().map(|token| token.lexeme.as_str())
}

fn parse_binary_expr(tokens: &mut VecDeque<Token>, context: &mut Context, level: usize) -> Result<Expr, CompileError> {
	match operators::level(level).associativity {
		Associativity::Left => parse_infix_left(tokens, context, level),
		Associativity::Right => parse_infix_right(tokens, context, level),
		Associativity::None => parse_infix_none(tokens, context, level),
	}
}

fn parse_infix_none(tokens: &mut VecDeque<Token>, context: &mut Context, level: usize) -> Result<Expr, CompileError> {
	let left = parse_expr(tokens, context, level - 1)?;
	let Some(lexeme) = current_lexeme(tokens).filter(|lexeme| operators::contains(level, lexeme)) else {
		return Ok(left);
	};
	let lexeme = lexeme.to_owned();
	let op_token = tokens.expect(TokenKind::OperatorId)?;
	let right = parse_expr(tokens, context, level - 1)?;
	Ok(binary(left, lexeme, right, op_token.location))
}

fn parse_infix_right(tokens: &mut VecDeque<Token>, context: &mut Context, level: usize) -> Result<Expr, CompileError> {
	let left = parse_expr(tokens, context, level - 1)?;
	let Some(lexeme) = current_lexeme(tokens).filter(|lexeme| operators::contains(level, lexeme)) else {
		return Ok(left);
	};
	let lexeme = lexeme.to_owned();
	let op_token = tokens.expect(TokenKind::OperatorId)?;
	let right = parse_expr(tokens, context, level)?;
	Ok(binary(left, lexeme, right, op_token.location))
}

fn parse_infix_left(tokens: &mut VecDeque<Token>, context: &mut Context, level: usize) -> Result<Expr, CompileError> {
	let mut left = parse_expr(tokens, context, level - 1)?;
	while let Some(lexeme) = current_lexeme(tokens).filter(|lexeme| operators::contains(level, lexeme)) {
		let lexeme = lexeme.to_owned();
		let op_token = tokens.expect(TokenKind::OperatorId)?;
		let right = parse_expr(tokens, context, level - 1)?;
		left = binary(left, lexeme, right, op_token.location);
	}
	Ok(left)
}

fn binary(left: Expr, op: String, right: Expr, location: Location) -> Expr {
	Expr::new(
		ExprKind::Binary {
			left: Box::new(left),
			op,
			right: Box::new(right),
		},
		location,
	)
}

fn parse_unary_expr(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Expr, CompileError> {
	let Some(lexeme) = current_lexeme(tokens).filter(|lexeme| operators::UNARY_LEXEMES.contains(lexeme)) else {
		return parse_value_expr(tokens, context);
	};
	let lexeme = lexeme.to_owned();
	let op_token = tokens.expect(TokenKind::OperatorId)?;
	let operand = parse_value_expr(tokens, context)?;
	Ok(Expr::new(
		ExprKind::Unary {
			op: lexeme,
			operand: Box::new(operand),
		},
		op_token.location,
	))
}

fn parse_value_expr(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Expr, CompileError> {
	let Some(token) = tokens.peek() else {
		return Err(CompileError::new(CompileErrorKind::ParseError, Location::synthetic(), "expected an expression but found end of input".to_owned()));
	};
	match token.kind {
		TokenKind::Identifier => parse_identifier_or_call(tokens, context),
		TokenKind::IntegerLiteral => {
			let token = tokens.expect(TokenKind::IntegerLiteral)?;
			let value: i64 = token
				.lexeme
				.parse()
				.map_err(|_| CompileError::new(CompileErrorKind::ParseError, token.location, "malformed integer literal".to_owned()))?;
			Ok(Expr::new(ExprKind::Integer(value), token.location))
		}
		TokenKind::DoubleLiteral => {
			let token = tokens.expect(TokenKind::DoubleLiteral)?;
			let value: f64 = token
				.lexeme
				.parse()
				.map_err(|_| CompileError::new(CompileErrorKind::ParseError, token.location, "malformed double literal".to_owned()))?;
			Ok(Expr::new(ExprKind::Double(value), token.location))
		}
		TokenKind::StringLiteral => {
			let token = tokens.expect(TokenKind::StringLiteral)?;
			let unquoted = token.lexeme.trim_matches('"').to_owned();
			Ok(Expr::new(ExprKind::String(unquoted), token.location))
		}
		TokenKind::KeywordTrue => {
			let token = tokens.expect(TokenKind::KeywordTrue)?;
			Ok(Expr::new(ExprKind::Bool(true), token.location))
		}
		TokenKind::KeywordFalse => {
			let token = tokens.expect(TokenKind::KeywordFalse)?;
			Ok(Expr::new(ExprKind::Bool(false), token.location))
		}
		TokenKind::LParen => parse_tuple_expr(tokens, context),
		TokenKind::LSquare => parse_list_expr(tokens, context),
		_ => Err(CompileError::new(CompileErrorKind::ParseError, token.location, format!("expected a value, but found '{}'", token.lexeme))),
	}
}

fn parse_identifier_or_call(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Expr, CompileError> {
	let token = tokens.expect(TokenKind::Identifier)?;
	let name = Name::from(token.lexeme.clone());
	if !tokens.next_is(TokenKind::LParen) {
		return Ok(Expr::new(ExprKind::Identifier(name), token.location));
	}
	tokens.expect(TokenKind::LParen)?;
	let mut args = Vec::new();
	if !tokens.next_is(TokenKind::RParen) {
		crate::parse_list!(tokens, {
			args.push(parse_labeled_or_expr(tokens, context)?);
		});
	}
	tokens.expect(TokenKind::RParen)?;
	Ok(Expr::new(ExprKind::Call { callee: name, args }, token.location))
}

/// A parenthesized expression list: `()` is the empty tuple, `(x)` parses to `x` itself (not a
/// one-element tuple), anything else becomes a `TupleExpr`. Matches `parseTupleExpr`'s collapsing
/// rule exactly.
fn parse_tuple_expr(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Expr, CompileError> {
	let open = tokens.expect(TokenKind::LParen)?;
	let mut elements = Vec::new();
	if !tokens.next_is(TokenKind::RParen) {
		crate::parse_list!(tokens, {
			elements.push(parse_labeled_or_expr(tokens, context)?);
		});
	}
	tokens.expect(TokenKind::RParen)?;

	if let [single] = elements.as_slice() {
		if let ExprKind::Labeled { label, .. } = &single.kind {
			return Err(CompileError::new(CompileErrorKind::ParseError, single.location, format!("expression '{label}' may not be labeled")));
		}
		return Ok(elements.into_iter().next().unwrap());
	}

	Ok(Expr::new(ExprKind::Tuple(elements), open.location))
}

/// `[e1, e2, ...]`. Parsed so the grammar is total over the specification's `Expr` family;
/// checking/lowering rejects it with `Unimplemented` (see `crate::sema`/`crate::ir`).
fn parse_list_expr(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Expr, CompileError> {
	let open = tokens.expect(TokenKind::LSquare)?;
	let mut elements = Vec::new();
	if !tokens.next_is(TokenKind::RSquare) {
		crate::parse_list!(tokens, {
			elements.push(parse_expr(tokens, context, operators::MAX_LEVEL)?);
		});
	}
	tokens.expect(TokenKind::RSquare)?;
	Ok(Expr::new(ExprKind::List(elements), open.location))
}

/// `label: expr` if the lookahead is `identifier ':'`, otherwise a plain expression.
fn parse_labeled_or_expr(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Expr, CompileError> {
	let is_label = tokens.peek().is_some_and(|token| token.kind == TokenKind::Identifier) && matches!(tokens.get(1), Some(next) if next.kind == TokenKind::Colon);
	if !is_label {
		return parse_expr(tokens, context, operators::MAX_LEVEL);
	}
	let label_token = tokens.expect(TokenKind::Identifier)?;
	tokens.expect(TokenKind::Colon)?;
	let expr = parse_expr(tokens, context, operators::MAX_LEVEL)?;
	Ok(Expr::new(
		ExprKind::Labeled {
			label: Name::from(label_token.lexeme),
			expr: Box::new(expr),
		},
		label_token.location,
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lexer::tokenize;

	fn parse(source: &str) -> Expr {
		let mut tokens = tokenize("test", source).unwrap();
		let mut context = Context::new();
		FullExpr::parse(&mut tokens, &mut context).unwrap()
	}

	#[test]
	fn multiplication_binds_tighter_than_addition() {
		let expr = parse("1 + 2 * 3");
		let ExprKind::Binary { op, right, .. } = &parse("1 + 2 * 3").kind else { panic!("expected a binary expr") };
		assert_eq!(op, "+");
		assert!(matches!(&right.kind, ExprKind::Binary { op, .. } if op == "*"));
		let _ = expr;
	}

	#[test]
	fn assignment_is_right_associative() {
		let expr = parse("a = b = c");
		let ExprKind::Binary { right, .. } = &expr.kind else { panic!("expected a binary expr") };
		assert!(matches!(&right.kind, ExprKind::Binary { .. }));
	}

	#[test]
	fn single_parenthesized_expr_is_not_a_tuple() {
		let expr = parse("(5)");
		assert!(matches!(expr.kind, ExprKind::Integer(5)));
	}

	#[test]
	fn empty_parens_is_the_empty_tuple() {
		let expr = parse("()");
		assert!(matches!(expr.kind, ExprKind::Tuple(elements) if elements.is_empty()));
	}

	#[test]
	fn unary_minus_binds_tighter_than_addition() {
		let expr = parse("-1 + 2");
		assert!(matches!(expr.kind, ExprKind::Binary { .. }));
	}

	#[test]
	fn call_with_labeled_argument() {
		let expr = parse("f(x: 1)");
		let ExprKind::Call { args, .. } = &expr.kind else { panic!("expected a call") };
		assert!(matches!(&args[0].kind, ExprKind::Labeled { .. }));
	}
}
