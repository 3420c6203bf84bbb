//! Type grammar. Grounded directly in `Parse/TypeParser.cpp`: dispatch on the lookahead token's
//! kind/lexeme, resolving straight to an interned [`TypeId`] since type annotations never need a
//! forward reference the way value declarations do.

use std::collections::VecDeque;

use super::{Context, Parse, TokenQueue as _};
use crate::{
	errors::{CompileError, CompileErrorKind},
	lexer::{Token, TokenKind},
	types::TypeId,
};

/// A thin `Parse`-compatible wrapper so `Type::parse` reads like every other grammar rule despite
/// producing a `TypeId` rather than owning an AST node.
pub struct Type;

impl Parse for Type {
	type Output = TypeId;

	fn parse(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<TypeId, CompileError> {
		match tokens.peek().map(|token| (token.kind, token.lexeme.as_str())) {
			Some((TokenKind::LParen, _)) => parse_tuple_or_function_type(tokens, context),
			Some((TokenKind::Identifier, _)) => parse_type_identifier(tokens, context),
			Some((TokenKind::LBrace, _)) => parse_struct_type(tokens, context),
			Some((TokenKind::OperatorId, "*")) => parse_pointer_type(tokens, context),
			Some((TokenKind::OperatorId, "&")) => parse_reference_or_slice_type(tokens, context),
			Some((TokenKind::LSquare, _)) => parse_list_or_map_type(tokens, context),
			_ => {
				let location = tokens.current_location();
				Err(CompileError::new(CompileErrorKind::ParseError, location, "expected a type".to_owned()))
			}
		}
	}
}

fn parse_type_identifier(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<TypeId, CompileError> {
	let token = tokens.expect(TokenKind::Identifier)?;
	match token.lexeme.as_str() {
		"i64" => Ok(context.types.integer()),
		"bool" => Ok(context.types.boolean()),
		"f64" => Ok(context.types.double()),
		"char" => Ok(context.types.character()),
		other => Err(CompileError::new(CompileErrorKind::ParseError, token.location, format!("unrecognized type identifier '{other}'"))),
	}
}

/// Parses a comma-separated, possibly-empty element list and returns it alongside whether the
/// list was immediately followed by `->`, in which case the caller builds a `FunctionType`
/// instead of a `TupleType` - the teacher-generalized merge of `parseTupleType`/`parseFunctionType`
/// the original keeps as two near-duplicate functions (`parseTupleOrFunctionType`).
fn parse_tuple_or_function_type(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<TypeId, CompileError> {
	tokens.expect(TokenKind::LParen)?;
	let mut elements = Vec::new();
	if !tokens.next_is(TokenKind::RParen) {
		crate::parse_list!(tokens, {
			elements.push(Type::parse(tokens, context)?);
		});
	}
	tokens.expect(TokenKind::RParen)?;

	if tokens.peek().is_some_and(|token| token.kind == TokenKind::OperatorId && token.lexeme == "->") {
		tokens.expect_operator("->")?;
		let returns = Type::parse(tokens, context)?;
		return Ok(context.types.function(elements, returns));
	}

	Ok(context.types.tuple(elements))
}

fn parse_pointer_type(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<TypeId, CompileError> {
	tokens.expect_operator("*")?;
	let pointee = Type::parse(tokens, context)?;
	Ok(context.types.pointer(pointee))
}

fn parse_reference_or_slice_type(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<TypeId, CompileError> {
	tokens.expect_operator("&")?;
	if tokens.next_is(TokenKind::LSquare) {
		tokens.expect(TokenKind::LSquare)?;
		let element = Type::parse(tokens, context)?;
		tokens.expect(TokenKind::RSquare)?;
		return Ok(context.types.slice(element));
	}
	let pointee = Type::parse(tokens, context)?;
	Ok(context.types.reference(pointee))
}

fn parse_struct_type(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<TypeId, CompileError> {
	tokens.expect(TokenKind::LBrace)?;
	tokens.expect(TokenKind::NewLine)?;
	let mut fields: Vec<(String, TypeId)> = Vec::new();
	while !tokens.next_is(TokenKind::RBrace) {
		let field_name = tokens.expect(TokenKind::Identifier)?;
		tokens.expect(TokenKind::Colon)?;
		let field_type = Type::parse(tokens, context)?;
		tokens.expect(TokenKind::NewLine)?;
		if fields.iter().any(|(name, _)| *name == field_name.lexeme) {
			return Err(CompileError::new(CompileErrorKind::DuplicateDeclaration, field_name.location, format!("duplicate field name '{}'", field_name.lexeme)));
		}
		fields.push((field_name.lexeme, field_type));
	}
	tokens.expect(TokenKind::RBrace)?;
	Ok(context.types.struct_type(fields))
}

/// Parses `[` followed by either `key: value]` (a `MapType`) or `element, size]` (a `ListType`),
/// disambiguated by whether a colon follows the first type - the merge of
/// `parseListType`/`parseMapType`/`parseListOrMapType` the original keeps as three functions.
fn parse_list_or_map_type(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<TypeId, CompileError> {
	tokens.expect(TokenKind::LSquare)?;
	let first = Type::parse(tokens, context)?;
	if tokens.next_is(TokenKind::Colon) {
		tokens.expect(TokenKind::Colon)?;
		let value = Type::parse(tokens, context)?;
		tokens.expect(TokenKind::RSquare)?;
		return Ok(context.types.map(first, value));
	}
	tokens.expect(TokenKind::Comma)?;
	let size_token = tokens.expect(TokenKind::IntegerLiteral)?;
	let size: i64 = size_token
		.lexeme
		.parse()
		.map_err(|_| CompileError::new(CompileErrorKind::ParseError, size_token.location, "list size must be an integer literal".to_owned()))?;
	tokens.expect(TokenKind::RSquare)?;
	Ok(context.types.list(first, size))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lexer::tokenize;

	fn parse_type_str(source: &str) -> TypeId {
		let mut tokens = tokenize("test", source).unwrap();
		let mut context = Context::new();
		Type::parse(&mut tokens, &mut context).unwrap()
	}

	#[test]
	fn fundamental_type() {
		let mut context = Context::new();
		assert_eq!(parse_type_str("i64"), context.types.integer());
	}

	#[test]
	fn function_type_vs_tuple_type() {
		let mut context = Context::new();
		let tuple = parse_type_str("(i64, bool)");
		assert_eq!(tuple, context.types.tuple(vec![context.types.integer(), context.types.boolean()]));
	}

	#[test]
	fn list_type_and_map_type_share_bracket_prefix() {
		let list = parse_type_str("[i64, 4]");
		let map = parse_type_str("[i64: bool]");
		assert_ne!(list, map);
	}
}
