//! Builtin operator declarations. Grounded in the specification's §6 operator table and
//! `ScopeBuilder::buildCompilationUnitScope`'s `BuiltinDecl::add_int`/`assign_int`/`equ_int`
//! pattern: each supported operator, for each primitive type it applies to, is one `Function`
//! summary named after its lexeme and seeded directly into `GlobalContext` as an overload.

use crate::{
	ast::Name,
	scope::{DeclContextArena, DeclSummary},
	types::TypeInterner,
};

fn install_function(arena: &mut DeclContextArena, interner: &mut TypeInterner, lexeme: &str, params: Vec<crate::types::TypeId>, returns: crate::types::TypeId) {
	let signature = interner.function(params, returns);
	arena.insert_builtin(DeclContextArena::GLOBAL, &Name::from(lexeme), DeclSummary::Function { signature });
}

/// Seeds every builtin operator overload into `arena`'s global context, for:
/// - `i64`: `+ - * / % == != < <= > >=` (arithmetic returns `i64`, comparisons return `bool`)
/// - `f64`: the same set, with IEEE ordered comparisons
/// - `bool`: `&& ||`
/// - unary `-` and `!` for `i64`/`bool` respectively
/// - assignment `=`, one overload per assignable primitive type
pub fn install(arena: &mut DeclContextArena, interner: &mut TypeInterner) {
	let integer = interner.integer();
	let double = interner.double();
	let boolean = interner.boolean();

	for lexeme in ["+", "-", "*", "/", "%"] {
		install_function(arena, interner, lexeme, vec![integer, integer], integer);
		install_function(arena, interner, lexeme, vec![double, double], double);
	}
	for lexeme in ["==", "!=", "<", "<=", ">", ">="] {
		install_function(arena, interner, lexeme, vec![integer, integer], boolean);
		install_function(arena, interner, lexeme, vec![double, double], boolean);
	}
	for lexeme in ["&&", "||"] {
		install_function(arena, interner, lexeme, vec![boolean, boolean], boolean);
	}

	install_function(arena, interner, "-", vec![integer], integer);
	install_function(arena, interner, "-", vec![double], double);
	install_function(arena, interner, "!", vec![boolean], boolean);

	for type_id in [integer, double, boolean] {
		install_function(arena, interner, "=", vec![type_id, type_id], type_id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ast::Name, errors::Location};

	#[test]
	fn integer_addition_and_assignment_are_both_registered() {
		let mut interner = TypeInterner::new();
		let mut arena = DeclContextArena::new();
		install(&mut arena, &mut interner);
		let integer = interner.integer();
		let add = arena.lookup(&interner, DeclContextArena::GLOBAL, &Name::from("+"), Some(&[integer, integer]), Location::synthetic());
		assert!(add.is_ok());
		let assign = arena.lookup(&interner, DeclContextArena::GLOBAL, &Name::from("="), Some(&[integer, integer]), Location::synthetic());
		assert!(assign.is_ok());
	}

	#[test]
	fn addition_overload_set_picks_the_matching_type() {
		let mut interner = TypeInterner::new();
		let mut arena = DeclContextArena::new();
		install(&mut arena, &mut interner);
		let double = interner.double();
		let found = arena.lookup(&interner, DeclContextArena::GLOBAL, &Name::from("+"), Some(&[double, double]), Location::synthetic()).unwrap();
		let DeclSummary::Function { signature } = found else { panic!("expected a Function summary") };
		assert_eq!(signature, interner.function(vec![double, double], double));
	}
}
