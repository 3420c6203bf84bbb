//! The compiler's error taxonomy. Every fatal condition the core can raise - across lexing,
//! parsing, scope building, type checking, and IR lowering - is one of the [`CompileErrorKind`]
//! variants below, always paired with the [`Location`] of the token that triggered it.
//!
//! This mirrors the way the teacher threads a single structured error type (`TokenError`) through
//! the whole pipeline rather than letting every stage invent its own error shape.

use colored::Colorize as _;
use convert_case::Casing as _;

/// A position in a source file: `{file, line, column}` (1-based line/column, matching how the
/// original compiler reports positions in diagnostics). `file` is `&'static str` rather than an
/// owned `String` so `Location` stays cheap to copy around the AST the way the rest of the pipeline
/// expects - the driver leaks the one path it compiles for the process's lifetime to produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
	pub file: &'static str,
	pub line: usize,
	pub column: usize,
}

impl Location {
	#[must_use]
	pub const fn new(file: &'static str, line: usize, column: usize) -> Self {
		Self { file, line, column }
	}

	/// A placeholder location for nodes synthesized by the compiler itself rather than parsed
	/// from source (builtin operator declarations, the implicit `GlobalContext`).
	#[must_use]
	pub const fn synthetic() -> Self {
		Self { file: "<builtin>", line: 0, column: 0 }
	}
}

impl std::fmt::Display for Location {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}:{}:{}", self.file, self.line, self.column)
	}
}

/// The kind discriminator for a [`CompileError`]. These are the seven fatal error kinds the core
/// can raise; every one terminates the compilation of the current unit immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
	/// No token pattern matched at the current offset.
	LexError,
	/// The token stream deviated from the grammar at some production.
	ParseError,
	/// An identifier was not found in any ancestor scope.
	UnresolvedName,
	/// More than one overload matched a call or operator use with no tie-breaker.
	AmbiguousName,
	/// Two types that were required to agree did not.
	TypeMismatch,
	/// The same name was declared twice in one scope, or a struct repeated a field name.
	DuplicateDeclaration,
	/// An assignment's left-hand side was not an identifier bound to a mutable slot.
	NotAssignable,
	/// A construct is recognized by the grammar but not supported by the checker or lowerer.
	Unimplemented,
}

impl std::fmt::Display for CompileErrorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", format!("{self:?}").to_case(convert_case::Case::Title))
	}
}

/// A fatal compiler error: a kind, the source location it was raised at, and a human-readable
/// message. All `CompileError`s are fatal; the pipeline stops at the first one.
#[derive(Debug, Clone)]
pub struct CompileError {
	pub kind: CompileErrorKind,
	pub location: Location,
	pub message: String,
}

impl CompileError {
	#[must_use]
	pub fn new(kind: CompileErrorKind, location: Location, message: impl Into<String>) -> Self {
		Self {
			kind,
			location,
			message: message.into(),
		}
	}

	/// Renders this error the way the driver prints it: a bold, colored one-line summary (carrying
	/// `self.location`'s own file name) followed by the offending source line with a caret under the
	/// column, if the location isn't synthetic and the line exists in `source`.
	#[must_use]
	pub fn render(&self, source: &str) -> String {
		let mut rendered = format!("{location}: {kind}: {message}", location = self.location, kind = self.kind.to_string().bold().red(), message = self.message);

		if self.location.line > 0 {
			if let Some(line) = source.lines().nth(self.location.line - 1) {
				let caret_padding = " ".repeat(self.location.column.saturating_sub(1));
				rendered.push_str(&format!("\n  {}\n  {caret_padding}{}", line.dimmed(), "^".bold().red()));
			}
		}

		rendered
	}
}

impl std::fmt::Display for CompileError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}: {}", self.location, self.kind, self.message)
	}
}

impl std::error::Error for CompileError {}
