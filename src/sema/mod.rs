//! The scope builder and type checker. Grounded in `Sema/ScopeBuilder.cpp`: declarations are
//! inserted into their enclosing `DeclContext` before their own bodies are checked (so a function
//! may call one declared later in the same unit), every block-introducing node gets its own
//! `DeclContext` as a child of its enclosing one, and checking a statement always means both
//! "attach its scope" and "resolve the types inside it" in the same walk - the original never
//! separates scope-building from type-checking into two passes, so neither does this.
//!
//! This pass runs on an already-parsed [`crate::parser::Program`] and mutates it in place: each
//! `Decl`'s `scope` field, each block's `ScopeId`, and each `Expr`'s `resolved_type`/`is_left_value`
//! start unset from parsing and are filled in here, exactly once.

pub mod builtins;

use crate::{
	ast::{
		decl::{Decl, FuncDecl},
		stmt::{Stmt, StmtKind},
		Expr, ExprKind, Name, ScopeId,
	},
	errors::{CompileError, CompileErrorKind, Location},
	parser::Program,
	scope::{DeclContextArena, DeclSummary},
	types::{TypeId, TypeInterner, TypeKind},
};

/// Builds scopes and checks types for a whole program. `arena` must already hold the builtin
/// operator overloads (see [`builtins::install`]); this never seeds them itself, since a program
/// under test may want a bare arena with only the declarations it registers by hand.
pub fn check_program(program: &mut Program, arena: &mut DeclContextArena, interner: &mut TypeInterner) -> Result<(), CompileError> {
	// Pass 1: forward-declare every top-level function's name and signature, so call sites don't
	// care about declaration order. Function signatures are already fully known from parsing (the
	// parameter/return types were interned eagerly), so nothing here needs a function's own body.
	for stmt in &mut program.statements {
		if let StmtKind::Decl(Decl::Func(func)) = &mut stmt.kind {
			declare_func_signature(func, DeclContextArena::GLOBAL, arena)?;
		}
	}

	// Pass 2: check bodies, and handle any top-level `let`/`var` in source order.
	for stmt in &mut program.statements {
		match &mut stmt.kind {
			StmtKind::Decl(Decl::Func(func)) => build_func_body(func, arena, interner)?,
			StmtKind::Decl(decl) => build_decl(decl, DeclContextArena::GLOBAL, arena, interner)?,
			_ => return Err(CompileError::new(CompileErrorKind::ParseError, stmt.location, "only declarations are allowed at the top level".to_owned())),
		}
	}

	Ok(())
}

fn declare_func_signature(func: &mut FuncDecl, scope: ScopeId, arena: &mut DeclContextArena) -> Result<(), CompileError> {
	arena.insert(&func.name, scope, DeclSummary::Function { signature: func.signature }, func.location)?;
	func.scope = Some(scope);
	Ok(())
}

/// Builds the function's own `params_scope` (a child of wherever it was declared), declares each
/// parameter into it, then checks the body against that scope with the function's return type as
/// the expected type for every `return`.
fn build_func_body(func: &mut FuncDecl, arena: &mut DeclContextArena, interner: &mut TypeInterner) -> Result<(), CompileError> {
	let parent = func.scope.expect("declare_func_signature runs before build_func_body");
	let params_scope = arena.new_child(parent);
	func.params_scope = Some(params_scope);
	for param in &mut func.params {
		arena.insert(&param.name, params_scope, DeclSummary::Value { type_id: param.declared_type, mutable: false }, param.location)?;
		param.scope = Some(params_scope);
	}

	let TypeKind::Function { returns, .. } = interner.kind(func.signature) else {
		unreachable!("a FuncDecl's signature is always a FunctionType, by construction at parse time")
	};
	let returns = *returns;

	build_stmt(&mut func.body, params_scope, arena, interner, returns)
}

/// Declares one `let`/`var`/`func`/`param` into `scope`. A bare `ParamDecl` never reaches this
/// function - the grammar only ever produces one as part of a `FuncDecl`'s parameter list, never as
/// a standalone statement.
fn build_decl(decl: &mut Decl, scope: ScopeId, arena: &mut DeclContextArena, interner: &mut TypeInterner) -> Result<(), CompileError> {
	match decl {
		Decl::Let(let_decl) => {
			check_expr(&mut let_decl.expr, scope, arena, interner)?;
			let type_id = let_decl.expr.resolved_type();
			arena.insert(&let_decl.name, scope, DeclSummary::Value { type_id, mutable: false }, let_decl.location)?;
			let_decl.scope = Some(scope);
			Ok(())
		}
		Decl::Var(var_decl) => {
			check_expr(&mut var_decl.init, scope, arena, interner)?;
			let init_type = var_decl.init.resolved_type();
			if init_type != var_decl.declared_type {
				return Err(CompileError::new(
					CompileErrorKind::TypeMismatch,
					var_decl.location,
					format!("'{}' is declared as {} but initialized with {}", var_decl.name, interner.display(var_decl.declared_type), interner.display(init_type)),
				));
			}
			arena.insert(&var_decl.name, scope, DeclSummary::Value { type_id: var_decl.declared_type, mutable: true }, var_decl.location)?;
			var_decl.scope = Some(scope);
			Ok(())
		}
		Decl::Param(param) => unreachable!("stray ParamDecl at statement position: '{}' at {:?}", param.name, param.location),
		Decl::Func(func) => {
			declare_func_signature(func, scope, arena)?;
			build_func_body(func, arena, interner)
		}
	}
}

/// Dispatches on statement kind, threading `expected_return` down so every `return` can be
/// checked against the enclosing function's declared return type without re-deriving it.
fn build_stmt(stmt: &mut Stmt, scope: ScopeId, arena: &mut DeclContextArena, interner: &mut TypeInterner, expected_return: TypeId) -> Result<(), CompileError> {
	match &mut stmt.kind {
		StmtKind::Decl(decl) => build_decl(decl, scope, arena, interner),
		StmtKind::Expr(expr) => check_expr(expr, scope, arena, interner),
		StmtKind::Return(None) => {
			let unit = interner.tuple(vec![]);
			if expected_return != unit {
				return Err(CompileError::new(
					CompileErrorKind::TypeMismatch,
					stmt.location,
					format!("bare 'return' is only legal in a function returning (), not {}", interner.display(expected_return)),
				));
			}
			Ok(())
		}
		StmtKind::Return(Some(expr)) => {
			check_expr(expr, scope, arena, interner)?;
			let found = expr.resolved_type();
			if found != expected_return {
				return Err(CompileError::new(
					CompileErrorKind::TypeMismatch,
					stmt.location,
					format!("returned {} but the function returns {}", interner.display(found), interner.display(expected_return)),
				));
			}
			Ok(())
		}
		StmtKind::Compound(..) => build_compound_stmt(stmt, scope, arena, interner, expected_return),
		StmtKind::Conditional { .. } => build_conditional_stmt(stmt, scope, arena, interner, expected_return),
		StmtKind::While { .. } => build_while_loop(stmt, scope, arena, interner, expected_return),
	}
}

/// Allocates this block's `ScopeId` as a child of `parent`, overwriting the `0` placeholder the
/// parser left in its place, then checks every statement against it in order.
fn build_compound_stmt(stmt: &mut Stmt, parent: ScopeId, arena: &mut DeclContextArena, interner: &mut TypeInterner, expected_return: TypeId) -> Result<(), CompileError> {
	let StmtKind::Compound(statements, scope_id) = &mut stmt.kind else {
		unreachable!("build_compound_stmt is only ever called on a StmtKind::Compound")
	};
	let child = arena.new_child(parent);
	*scope_id = child;
	for inner in statements {
		build_stmt(inner, child, arena, interner, expected_return)?;
	}
	Ok(())
}

/// Grounded in `buildConditionalStmtScope`: each arm gets its own `DeclContext` (a child of the
/// enclosing scope, not of the previous arm's) so an `if let` binding is visible only to its own
/// condition and body. The trailing `else`, if any, is a bare `Compound` and allocates its own
/// scope the way any nested block does.
fn build_conditional_stmt(stmt: &mut Stmt, parent: ScopeId, arena: &mut DeclContextArena, interner: &mut TypeInterner, expected_return: TypeId) -> Result<(), CompileError> {
	let StmtKind::Conditional { arms, otherwise } = &mut stmt.kind else {
		unreachable!("build_conditional_stmt is only ever called on a StmtKind::Conditional")
	};
	for arm in arms {
		let arm_scope = arena.new_child(parent);
		arm.scope = arm_scope;
		if let Some(decl) = &mut arm.decl {
			build_decl(decl, arm_scope, arena, interner)?;
		}
		check_expr(&mut arm.condition, arm_scope, arena, interner)?;
		require_boolean(&arm.condition, interner)?;
		build_stmt(&mut arm.body, arm_scope, arena, interner, expected_return)?;
	}
	if let Some(otherwise) = otherwise {
		build_stmt(otherwise, parent, arena, interner, expected_return)?;
	}
	Ok(())
}

/// Grounded in `buildWhileLoopScope`: the loop's own `DeclContext` holds the optional `let`
/// binding and is the parent both the condition and the body check against.
fn build_while_loop(stmt: &mut Stmt, parent: ScopeId, arena: &mut DeclContextArena, interner: &mut TypeInterner, expected_return: TypeId) -> Result<(), CompileError> {
	let StmtKind::While { decl, condition, body, scope } = &mut stmt.kind else {
		unreachable!("build_while_loop is only ever called on a StmtKind::While")
	};
	let loop_scope = arena.new_child(parent);
	*scope = loop_scope;
	if let Some(decl) = decl {
		build_decl(decl, loop_scope, arena, interner)?;
	}
	check_expr(condition, loop_scope, arena, interner)?;
	require_boolean(condition, interner)?;
	build_stmt(body, loop_scope, arena, interner, expected_return)
}

fn require_boolean(expr: &Expr, interner: &TypeInterner) -> Result<(), CompileError> {
	let found = expr.resolved_type();
	if found != interner.boolean() {
		return Err(CompileError::new(
			CompileErrorKind::TypeMismatch,
			expr.location,
			format!("condition must be bool, found {}", interner.display(found)),
		));
	}
	Ok(())
}

/// Resolves `expr`'s type bottom-up, filling in `resolved_type` and `is_left_value`. Constructs
/// the grammar parses but the checker has no rule for (`String`, `List`, `Accessor`, a bare
/// `Operator` value) raise `Unimplemented` here rather than at lowering, so the IR backend never
/// has to re-derive "is this actually supported".
fn check_expr(expr: &mut Expr, scope: ScopeId, arena: &mut DeclContextArena, interner: &mut TypeInterner) -> Result<(), CompileError> {
	match &mut expr.kind {
		ExprKind::Integer(_) => expr.resolved_type = Some(interner.integer()),
		ExprKind::Double(_) => expr.resolved_type = Some(interner.double()),
		ExprKind::Bool(_) => expr.resolved_type = Some(interner.boolean()),
		ExprKind::String(_) => return unimplemented_construct(expr.location, "string literals are not type-checked or lowered"),
		ExprKind::List(_) => return unimplemented_construct(expr.location, "list literals are not type-checked or lowered"),
		ExprKind::Accessor { .. } => return unimplemented_construct(expr.location, "tuple accessors are not type-checked or lowered"),
		ExprKind::Operator { .. } => return unimplemented_construct(expr.location, "operators cannot be used as bare values"),
		ExprKind::Identifier(name) => check_identifier(expr, name, scope, arena, interner)?,
		ExprKind::Tuple(elements) => {
			for element in elements.iter_mut() {
				check_expr(element, scope, arena, interner)?;
			}
			let element_types = elements.iter().map(Expr::resolved_type).collect();
			expr.resolved_type = Some(interner.tuple(element_types));
		}
		ExprKind::Unary { op, operand } => {
			check_expr(operand, scope, arena, interner)?;
			let arg_types = [operand.resolved_type()];
			let summary = arena.lookup(interner, scope, &Name::from(op.as_str()), Some(&arg_types), expr.location)?;
			expr.resolved_type = Some(function_return(interner, summary));
		}
		ExprKind::Binary { left, op, right } if op.as_str() == "=" => {
			check_expr(left, scope, arena, interner)?;
			if !left.is_left_value {
				return Err(CompileError::new(CompileErrorKind::NotAssignable, left.location, "the left side of '=' must be a mutable variable".to_owned()));
			}
			check_expr(right, scope, arena, interner)?;
			let (left_type, right_type) = (left.resolved_type(), right.resolved_type());
			if left_type != right_type {
				return Err(CompileError::new(
					CompileErrorKind::TypeMismatch,
					expr.location,
					format!("cannot assign {} to a variable of type {}", interner.display(right_type), interner.display(left_type)),
				));
			}
			expr.resolved_type = Some(left_type);
		}
		ExprKind::Binary { left, op, right } => {
			check_expr(left, scope, arena, interner)?;
			check_expr(right, scope, arena, interner)?;
			let arg_types = [left.resolved_type(), right.resolved_type()];
			let summary = arena.lookup(interner, scope, &Name::from(op.as_str()), Some(&arg_types), expr.location)?;
			expr.resolved_type = Some(function_return(interner, summary));
		}
		ExprKind::Call { callee, args } => {
			for arg in args.iter_mut() {
				check_expr(arg, scope, arena, interner)?;
			}
			let arg_types: Vec<TypeId> = args.iter().map(argument_type).collect();
			let summary = arena.lookup(interner, scope, callee, Some(&arg_types), expr.location)?;
			expr.resolved_type = Some(function_return(interner, summary));
		}
		ExprKind::Labeled { expr: inner, .. } => {
			check_expr(inner, scope, arena, interner)?;
			expr.resolved_type = inner.resolved_type;
			expr.is_left_value = inner.is_left_value;
		}
	}
	Ok(())
}

/// A call argument's type for overload matching - a labeled argument (`f(x: 1)`) contributes its
/// inner expression's type, the label itself being positional sugar rather than part of the type.
fn argument_type(arg: &Expr) -> TypeId {
	match &arg.kind {
		ExprKind::Labeled { expr, .. } => expr.resolved_type(),
		_ => arg.resolved_type(),
	}
}

/// `arg_types: None` widens the match to every overload under this name; a bare identifier naming
/// an overloaded function (rather than calling it) has no single type to report, so that case is
/// `Unimplemented` rather than an arbitrary pick among candidates.
fn check_identifier(expr: &mut Expr, name: &Name, scope: ScopeId, arena: &DeclContextArena, interner: &TypeInterner) -> Result<(), CompileError> {
	let summary = arena.lookup(interner, scope, name, None, expr.location)?;
	match summary {
		DeclSummary::Value { type_id, mutable } => {
			expr.resolved_type = Some(type_id);
			expr.is_left_value = mutable;
			Ok(())
		}
		DeclSummary::Function { .. } => unimplemented_construct(expr.location, "bare references to a function name are not supported, call it instead"),
	}
}

fn function_return(interner: &TypeInterner, summary: DeclSummary) -> TypeId {
	match summary {
		DeclSummary::Function { signature } => match interner.kind(signature) {
			TypeKind::Function { returns, .. } => *returns,
			_ => unreachable!("a Function summary's signature is always a FunctionType"),
		},
		DeclSummary::Value { .. } => unreachable!("lookup with arg_types only ever returns a Function summary"),
	}
}

fn unimplemented_construct(location: Location, message: &str) -> Result<(), CompileError> {
	Err(CompileError::new(CompileErrorKind::Unimplemented, location, message.to_owned()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{lexer::tokenize, parser};

	fn check(source: &str) -> Result<(), CompileError> {
		let mut tokens = tokenize("test", source).unwrap();
		let mut context = parser::Context::new();
		let mut program = parser::parse(&mut tokens, &mut context).unwrap();
		let mut arena = DeclContextArena::new();
		builtins::install(&mut arena, &mut context.types);
		check_program(&mut program, &mut arena, &mut context.types)
	}

	#[test]
	fn function_may_call_one_declared_later() {
		assert!(check("func a() -> i64 {\nreturn b()\n}\nfunc b() -> i64 {\nreturn 1\n}").is_ok());
	}

	#[test]
	fn var_is_assignable_but_let_is_not() {
		assert!(check("func f() -> () {\nvar x: i64 = 1\nx = 2\n}").is_ok());
		let error = check("func f() -> () {\nlet x = 1\nx = 2\n}").unwrap_err();
		assert_eq!(error.kind, CompileErrorKind::NotAssignable);
	}

	#[test]
	fn while_condition_must_be_boolean() {
		let error = check("func f() -> () {\nwhile 1 {\n}\n}").unwrap_err();
		assert_eq!(error.kind, CompileErrorKind::TypeMismatch);
	}

	#[test]
	fn return_type_mismatch_is_rejected() {
		let error = check("func f() -> bool {\nreturn 1\n}").unwrap_err();
		assert_eq!(error.kind, CompileErrorKind::TypeMismatch);
	}
}
