//! Tokenization: turns raw source text into a flat [`VecDeque<Token>`], the input to the parser.
//!
//! Follows the teacher's approach of trying one constant regex per [`TokenKind`] variant, in a
//! fixed priority order provided by `#[derive(strum_macros::EnumIter)]` - keywords and
//! multi-character operators are declared before the patterns they're a prefix of. Unlike the
//! teacher's own lexer, newlines are never swallowed as whitespace: the grammar's struct-field
//! syntax needs them as real tokens (see [`TokenKind::NewLine`]).

use std::collections::VecDeque;

use strum::IntoEnumIterator as _;

use crate::errors::{CompileError, CompileErrorKind, Location};

/// The fixed tag set every token carries. `OperatorId` tokens additionally carry their matched
/// lexeme on the [`Token`] itself (e.g. `"=="`, `"->"`, `"*"`); the Operator Table (`operators.rs`)
/// is what gives those lexemes meaning, not this enum.
#[derive(strum_macros::EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	// Tried before `Identifier`/`OperatorId` so they aren't shadowed.
	NewLine,
	LineComment,
	Whitespace,

	KeywordLet,
	KeywordVar,
	KeywordFunc,
	KeywordIf,
	KeywordElse,
	KeywordWhile,
	KeywordReturn,
	KeywordTrue,
	KeywordFalse,

	DoubleLiteral,
	IntegerLiteral,
	StringLiteral,
	Identifier,

	OperatorId,

	LParen,
	RParen,
	LBrace,
	RBrace,
	LSquare,
	RSquare,
	Comma,
	Colon,

	/// Never produced by [`TokenKind::find_match`]; appended once at the end of the stream.
	Eof,
}

impl TokenKind {
	/// The regex this token kind is recognized by, anchored to the start of the remaining input.
	/// `Eof` has no pattern - it is synthesized, never matched.
	fn pattern(self) -> Option<&'static regex_macro::Regex> {
		match self {
			Self::NewLine => Some(regex_macro::regex!(r"^\r?\n")),
			Self::LineComment => Some(regex_macro::regex!(r"^//[^\n]*")),
			Self::Whitespace => Some(regex_macro::regex!(r"^[^\S\n]+")),

			Self::KeywordLet => Some(regex_macro::regex!(r"^let\b")),
			Self::KeywordVar => Some(regex_macro::regex!(r"^var\b")),
			Self::KeywordFunc => Some(regex_macro::regex!(r"^func\b")),
			Self::KeywordIf => Some(regex_macro::regex!(r"^if\b")),
			Self::KeywordElse => Some(regex_macro::regex!(r"^else\b")),
			Self::KeywordWhile => Some(regex_macro::regex!(r"^while\b")),
			Self::KeywordReturn => Some(regex_macro::regex!(r"^return\b")),
			Self::KeywordTrue => Some(regex_macro::regex!(r"^true\b")),
			Self::KeywordFalse => Some(regex_macro::regex!(r"^false\b")),

			Self::DoubleLiteral => Some(regex_macro::regex!(r"^\d+\.\d+")),
			Self::IntegerLiteral => Some(regex_macro::regex!(r"^\d+")),
			Self::StringLiteral => Some(regex_macro::regex!(r#"^"[^"]*""#)),
			Self::Identifier => Some(regex_macro::regex!(r"^[A-Za-z_]\w*")),

			// Longest lexemes first so `==` isn't lexed as two `=` tokens, etc.
			Self::OperatorId => Some(regex_macro::regex!(r"^(->|==|!=|<=|>=|&&|\|\||[+\-*/%!=<>&])")),

			Self::LParen => Some(regex_macro::regex!(r"^\(")),
			Self::RParen => Some(regex_macro::regex!(r"^\)")),
			Self::LBrace => Some(regex_macro::regex!(r"^\{")),
			Self::RBrace => Some(regex_macro::regex!(r"^\}")),
			Self::LSquare => Some(regex_macro::regex!(r"^\[")),
			Self::RSquare => Some(regex_macro::regex!(r"^\]")),
			Self::Comma => Some(regex_macro::regex!(r"^,")),
			Self::Colon => Some(regex_macro::regex!(r"^:")),

			Self::Eof => None,
		}
	}

	/// The matched text at the start of `code` for this kind, if any.
	fn get_match(self, code: &str) -> Option<&str> {
		self.pattern().and_then(|pattern| pattern.find(code)).map(|matched| matched.as_str())
	}

	/// The first token kind (in priority order) that matches the start of `code`.
	fn find_match(code: &str) -> Option<(Self, &str)> {
		Self::iter().find_map(|kind| kind.get_match(code).map(|matched| (kind, matched)))
	}
}

/// A single lexical token: its kind, its exact source text, and where it started.
#[derive(Debug, Clone)]
pub struct Token {
	pub kind: TokenKind,
	pub lexeme: String,
	pub location: Location,
}

/// Tokenizes `source` into an ordered token stream, always ending in one `Eof` token. `file` is
/// stamped onto every token's [`Location`] - the name diagnostics report, not a path this function
/// reads from.
///
/// # Errors
/// Returns a [`CompileError`] of kind [`CompileErrorKind::LexError`] if no token kind's pattern
/// matches at some offset (e.g. an unsupported character like `@`).
pub fn tokenize(file: &'static str, source: &str) -> Result<VecDeque<Token>, CompileError> {
	let mut tokens = VecDeque::new();
	let mut remaining = source;
	let mut line = 1;
	let mut column = 1;

	while !remaining.is_empty() {
		let Some((kind, matched)) = TokenKind::find_match(remaining) else {
			let offending = remaining.lines().next().unwrap_or(remaining);
			return Err(CompileError::new(
				CompileErrorKind::LexError,
				Location::new(file, line, column),
				format!("unrecognized token starting at \"{offending}\""),
			));
		};

		let length = matched.len();
		let lexeme = matched.to_owned();

		if !matches!(kind, TokenKind::Whitespace | TokenKind::LineComment) {
			tokens.push_back(Token {
				kind,
				lexeme,
				location: Location::new(file, line, column),
			});
		}

		if kind == TokenKind::NewLine {
			line += 1;
			column = 1;
		} else {
			column += length;
		}

		remaining = remaining.get(length..).unwrap_or("");
	}

	tokens.push_back(Token {
		kind: TokenKind::Eof,
		lexeme: String::new(),
		location: Location::new(file, line, column),
	});

	Ok(tokens)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kinds(source: &str) -> Vec<TokenKind> {
		tokenize("test", source).unwrap().into_iter().map(|token| token.kind).collect()
	}

	#[test]
	fn keywords_before_identifiers() {
		assert_eq!(kinds("let x"), vec![TokenKind::KeywordLet, TokenKind::Identifier, TokenKind::Eof]);
	}

	#[test]
	fn double_before_integer() {
		let tokens = tokenize("test", "3.5").unwrap();
		assert_eq!(tokens[0].kind, TokenKind::DoubleLiteral);
		assert_eq!(tokens[0].lexeme, "3.5");
	}

	#[test]
	fn multi_char_operators_are_not_split() {
		let tokens = tokenize("test", "a == b").unwrap();
		assert_eq!(tokens[1].kind, TokenKind::OperatorId);
		assert_eq!(tokens[1].lexeme, "==");
	}

	#[test]
	fn newline_is_a_real_token() {
		assert_eq!(kinds("x\ny"), vec![TokenKind::Identifier, TokenKind::NewLine, TokenKind::Identifier, TokenKind::Eof]);
	}

	#[test]
	fn unrecognized_character_is_a_lex_error() {
		assert!(tokenize("test", "@").is_err());
	}
}
