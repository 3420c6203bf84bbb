//! Declaration grammar: `let`, `var`, and `func`. Parameter and return types resolve straight to
//! a `TypeId` as they're parsed (see `parser::types`); no forward reference is needed for types,
//! only for the value-level names the scope builder resolves later.

use std::collections::VecDeque;

use super::{
	expr::FullExpr,
	stmt::parse_compound,
	types::Type,
	Context, Parse, TokenQueue as _,
};
use crate::{
	ast::{
		decl::{Decl as DeclNode, FuncDecl, LetDecl, ParamDecl, VarDecl},
		Name,
	},
	errors::CompileError,
	lexer::{Token, TokenKind},
};

impl Parse for DeclNode {
	type Output = Self;

	fn parse(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<Self, CompileError> {
		match tokens.peek().map(|token| token.kind) {
			Some(TokenKind::KeywordLet) => parse_let(tokens, context).map(Self::Let),
			Some(TokenKind::KeywordVar) => parse_var(tokens, context).map(Self::Var),
			Some(TokenKind::KeywordFunc) => parse_func(tokens, context).map(Self::Func),
			_ => {
				let location = tokens.current_location();
				Err(CompileError::new(crate::errors::CompileErrorKind::ParseError, location, "expected 'let', 'var', or 'func'".to_owned()))
			}
		}
	}
}

fn parse_let(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<LetDecl, CompileError> {
	let keyword = tokens.expect(TokenKind::KeywordLet)?;
	let name = parse_name(tokens)?;
	tokens.expect_operator("=")?;
	let expr = FullExpr::parse(tokens, context)?;
	Ok(LetDecl {
		name,
		expr,
		location: keyword.location,
		scope: None,
	})
}

fn parse_var(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<VarDecl, CompileError> {
	let keyword = tokens.expect(TokenKind::KeywordVar)?;
	let name = parse_name(tokens)?;
	tokens.expect(TokenKind::Colon)?;
	let declared_type = Type::parse(tokens, context)?;
	tokens.expect_operator("=")?;
	let init = FullExpr::parse(tokens, context)?;
	Ok(VarDecl {
		name,
		declared_type,
		init,
		location: keyword.location,
		scope: None,
	})
}

fn parse_func(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<FuncDecl, CompileError> {
	let keyword = tokens.expect(TokenKind::KeywordFunc)?;
	let name = parse_name(tokens)?;
	tokens.expect(TokenKind::LParen)?;
	let mut params = Vec::new();
	if !tokens.next_is(TokenKind::RParen) {
		crate::parse_list!(tokens, {
			params.push(parse_param(tokens, context)?);
		});
	}
	tokens.expect(TokenKind::RParen)?;
	tokens.expect_operator("->")?;
	let return_type = Type::parse(tokens, context)?;

	let param_types = params.iter().map(|param| param.declared_type).collect();
	let signature = context.types.function(param_types, return_type);

	let body = parse_compound(tokens, context)?;

	Ok(FuncDecl {
		name,
		signature,
		params,
		body,
		location: keyword.location,
		scope: None,
		params_scope: None,
	})
}

fn parse_param(tokens: &mut VecDeque<Token>, context: &mut Context) -> Result<ParamDecl, CompileError> {
	let name_token = tokens.expect(TokenKind::Identifier)?;
	tokens.expect(TokenKind::Colon)?;
	let declared_type = Type::parse(tokens, context)?;
	Ok(ParamDecl {
		name: Name::from(name_token.lexeme),
		declared_type,
		location: name_token.location,
		scope: None,
	})
}

fn parse_name(tokens: &mut VecDeque<Token>) -> Result<Name, CompileError> {
	let token = tokens.expect(TokenKind::Identifier)?;
	Ok(Name::from(token.lexeme))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::lexer::tokenize;

	#[test]
	fn func_decl_interns_its_signature_from_params_and_return() {
		let mut tokens = tokenize("test", "func add(a: i64, b: i64) -> i64 {\nreturn a + b\n}").unwrap();
		let mut context = Context::new();
		let DeclNode::Func(func) = DeclNode::parse(&mut tokens, &mut context).unwrap() else {
			panic!("expected a FuncDecl")
		};
		assert_eq!(func.params.len(), 2);
		let crate::types::TypeKind::Function { params, returns } = context.types.kind(func.signature) else {
			panic!("signature should be a FunctionType")
		};
		assert_eq!(params.len(), 2);
		assert_eq!(*returns, context.types.integer());
	}

	#[test]
	fn let_decl_has_no_declared_type() {
		let mut tokens = tokenize("test", "let x = 5").unwrap();
		let mut context = Context::new();
		assert!(matches!(DeclNode::parse(&mut tokens, &mut context).unwrap(), DeclNode::Let(_)));
	}
}
