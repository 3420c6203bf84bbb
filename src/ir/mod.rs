//! Lowers a type-checked [`Program`] to the reference IR. Grounded in `CodeGen/IRGenWalker.h`:
//! one `IrFunction` per `FuncDecl`, a `current` block threaded through statement lowering exactly
//! the way the original mutates its own `CurrentBlock` field, and the same `named_values`
//! direct-value-vs-stack-slot split for `LetDecl`/`ParamDecl` vs `VarDecl`.
//!
//! Only constructs the type checker fully resolves reach here - every `Unimplemented` raised by
//! `crate::sema` means the corresponding lowering case below is unreachable by construction, not
//! a gap in this module.

pub mod backend;

use std::collections::HashMap;

use backend::{BinOp, BlockId, FunctionId, IrType, ReferenceBackend, SlotId, UnOp, Value};

use crate::{
	ast::{
		decl::{Decl, FuncDecl},
		stmt::{ConditionalArm, Stmt, StmtKind},
		Expr, ExprKind, Name,
	},
	errors::{CompileError, CompileErrorKind, Location},
	parser::Program,
	types::{TypeId, TypeInterner, TypeKind},
};

/// What a name is bound to while lowering a function body: a value computed once (a `LetDecl` or
/// `ParamDecl`), or a stack slot that must be `load`ed on every read (a `VarDecl`).
#[derive(Debug, Clone, Copy)]
enum NamedValue {
	Direct(Value),
	Slot(SlotId, IrType),
}

/// The key a call site resolves against: a callee name plus its argument types, mirroring how
/// `crate::scope::DeclContextArena::lookup` disambiguates overloads at type-check time. Lowering
/// redoes this lookup against the functions actually emitted into the module, rather than
/// threading the type checker's resolved summary through the AST.
type FunctionTable = HashMap<(Name, Vec<TypeId>), FunctionId>;

/// Maps a checked type to the reference backend's machine type. Every type the grammar can parse
/// besides the three fundamentals the checker lowers (`i64`/`bool`/`f64`) is rejected here with
/// `Unimplemented`, matching the checker's own "only fundamental-typed expressions are lowered"
/// boundary - tuples, pointers, references, slices, lists, maps, and structs have no runtime
/// representation in this backend.
fn lower_type(interner: &TypeInterner, type_id: TypeId) -> Result<IrType, CompileError> {
	match interner.kind(type_id) {
		TypeKind::Integer => Ok(IrType::I64),
		TypeKind::Boolean => Ok(IrType::I1),
		TypeKind::Double => Ok(IrType::F64),
		other => Err(CompileError::new(
			CompileErrorKind::Unimplemented,
			Location::synthetic(),
			format!("type '{}' has no lowering to the reference backend", display_kind(other, interner)),
		)),
	}
}

fn display_kind(kind: &TypeKind, interner: &TypeInterner) -> String {
	// `TypeInterner::display` takes a `TypeId`, not a `&TypeKind`; re-intern is unnecessary here
	// since this only ever runs on the error path, so a short manual render is enough.
	match kind {
		TypeKind::Tuple(_) => "tuple".to_owned(),
		TypeKind::Function { .. } => "function".to_owned(),
		TypeKind::List { .. } => "list".to_owned(),
		TypeKind::Map { .. } => "map".to_owned(),
		TypeKind::Pointer(_) => "pointer".to_owned(),
		TypeKind::Reference(_) => "reference".to_owned(),
		TypeKind::Slice(_) => "slice".to_owned(),
		TypeKind::Struct(_) => "struct".to_owned(),
		_ => {
			let _ = interner;
			"<fundamental>".to_owned()
		}
	}
}

/// Lowers every function declared anywhere in `program` - at the top level or nested inside
/// another function's body - into a fresh [`ReferenceBackend`]. Global `let`/`var` declarations
/// are checked but not lowered: the reference backend's `Module` holds only functions.
pub fn lower_program(program: &Program, interner: &TypeInterner) -> Result<ReferenceBackend, CompileError> {
	let mut decls = Vec::new();
	for stmt in &program.statements {
		collect_func_decls(stmt, &mut decls);
	}

	let mut backend = ReferenceBackend::new();
	let mut functions = FunctionTable::new();
	for func in &decls {
		let TypeKind::Function { params, returns } = interner.kind(func.signature) else {
			unreachable!("a FuncDecl's signature is always a FunctionType, by construction at parse time")
		};
		let param_types = params.iter().map(|param| lower_type(interner, *param)).collect::<Result<Vec<_>, _>>()?;
		let return_type = lower_type(interner, *returns)?;
		let fid = backend.make_function(&func.name.0, param_types, return_type);
		functions.insert((func.name.clone(), params.clone()), fid);
	}

	for func in &decls {
		let TypeKind::Function { params, .. } = interner.kind(func.signature) else {
			unreachable!("a FuncDecl's signature is always a FunctionType, by construction at parse time")
		};
		let fid = functions[&(func.name.clone(), params.clone())];
		lower_function(&mut backend, interner, &functions, func, fid)?;
	}

	Ok(backend)
}

fn collect_func_decls<'a>(stmt: &'a Stmt, out: &mut Vec<&'a FuncDecl>) {
	match &stmt.kind {
		StmtKind::Decl(Decl::Func(func)) => {
			out.push(func);
			collect_func_decls(&func.body, out);
		}
		StmtKind::Decl(_) | StmtKind::Expr(_) | StmtKind::Return(_) => {}
		StmtKind::Compound(statements, _) => {
			for inner in statements {
				collect_func_decls(inner, out);
			}
		}
		StmtKind::Conditional { arms, otherwise } => {
			for arm in arms {
				if let Some(Decl::Func(func)) = &arm.decl {
					out.push(func);
					collect_func_decls(&func.body, out);
				}
				collect_func_decls(&arm.body, out);
			}
			if let Some(otherwise) = otherwise {
				collect_func_decls(otherwise, out);
			}
		}
		StmtKind::While { decl, body, .. } => {
			if let Some(Decl::Func(func)) = decl {
				out.push(func);
				collect_func_decls(&func.body, out);
			}
			collect_func_decls(body, out);
		}
	}
}

fn lower_function(backend: &mut ReferenceBackend, interner: &TypeInterner, functions: &FunctionTable, func: &FuncDecl, fid: FunctionId) -> Result<(), CompileError> {
	let entry = backend.new_block(fid, "entry");
	let mut lowerer = FunctionLowerer {
		interner,
		backend,
		functions,
		function: fid,
		scopes: vec![HashMap::new()],
		current: entry,
	};
	for (index, param) in func.params.iter().enumerate() {
		lowerer.bind(param.name.clone(), NamedValue::Direct(Value::Param(index.try_into().expect("parameter counts fit in u32"))));
	}
	let StmtKind::Compound(statements, _) = &func.body.kind else {
		unreachable!("a FuncDecl's body is always a parsed Compound")
	};
	lowerer.lower_block(statements)?;
	backend.finalize_function(fid);
	Ok(())
}

/// Lowering state for one function body. `current` is mutated in place as control-flow
/// constructs open and close blocks, mirroring `IRGenWalker`'s own `CurrentBlock` field.
struct FunctionLowerer<'a> {
	interner: &'a TypeInterner,
	backend: &'a mut ReferenceBackend,
	functions: &'a FunctionTable,
	function: FunctionId,
	scopes: Vec<HashMap<Name, NamedValue>>,
	current: BlockId,
}

impl FunctionLowerer<'_> {
	fn push_scope(&mut self) {
		self.scopes.push(HashMap::new());
	}

	fn pop_scope(&mut self) {
		self.scopes.pop();
	}

	fn bind(&mut self, name: Name, value: NamedValue) {
		self.scopes.last_mut().expect("a function always has at least one open scope while lowering").insert(name, value);
	}

	fn lookup(&self, name: &Name) -> NamedValue {
		self.scopes
			.iter()
			.rev()
			.find_map(|scope| scope.get(name))
			.copied()
			.unwrap_or_else(|| unreachable!("'{name}' resolved during type-checking but not during lowering"))
	}

	/// Lowers a list of statements in their own child scope, stopping early once `current` gets a
	/// terminator - any statement after a `return` (or after an exhaustive conditional) in the same
	/// block is unreachable and left un-lowered, rather than appended to a now-closed block.
	fn lower_block(&mut self, statements: &[Stmt]) -> Result<(), CompileError> {
		self.push_scope();
		for stmt in statements {
			if !self.backend.is_open(self.function, self.current) {
				break;
			}
			self.lower_stmt(stmt)?;
		}
		self.pop_scope();
		Ok(())
	}

	fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
		match &stmt.kind {
			StmtKind::Decl(decl) => self.lower_decl(decl),
			StmtKind::Expr(expr) => self.lower_expr(expr).map(|_| ()),
			StmtKind::Return(None) => {
				self.backend.ret(self.function, self.current, None);
				Ok(())
			}
			StmtKind::Return(Some(expr)) => {
				let value = self.lower_expr(expr)?;
				self.backend.ret(self.function, self.current, Some(value));
				Ok(())
			}
			StmtKind::Compound(statements, _) => self.lower_block(statements),
			StmtKind::Conditional { arms, otherwise } => self.lower_conditional(arms, otherwise),
			StmtKind::While { decl, condition, body, .. } => self.lower_while(decl, condition, body),
		}
	}

	fn lower_decl(&mut self, decl: &Decl) -> Result<(), CompileError> {
		match decl {
			Decl::Let(let_decl) => {
				let value = self.lower_expr(&let_decl.expr)?;
				self.bind(let_decl.name.clone(), NamedValue::Direct(value));
				Ok(())
			}
			Decl::Var(var_decl) => {
				let value = self.lower_expr(&var_decl.init)?;
				let ty = lower_type(self.interner, var_decl.declared_type)?;
				let slot = self.backend.alloca(self.function, self.current, ty);
				self.backend.store(self.function, self.current, slot, value);
				self.bind(var_decl.name.clone(), NamedValue::Slot(slot, ty));
				Ok(())
			}
			Decl::Param(param) => unreachable!("stray ParamDecl at statement position: '{}'", param.name),
			Decl::Func(nested) => {
				let TypeKind::Function { params, .. } = self.interner.kind(nested.signature) else {
					unreachable!("a FuncDecl's signature is always a FunctionType")
				};
				let fid = *self
					.functions
					.get(&(nested.name.clone(), params.clone()))
					.expect("every FuncDecl, nested or not, is registered before any body is lowered");
				lower_function(self.backend, self.interner, self.functions, nested, fid)
			}
		}
	}

	/// Grounded in `transformConditionalBlock`/`transformConditionalStmt`: a terminal `if_exit`
	/// block is allocated up front, then a dedicated `if_cond` block is allocated for the first
	/// arm's test and the entry block unconditionally branches into it (mirroring `lower_while`'s
	/// `entry -> loop_cond` branch, and the original's own `entry_builder.CreateBr(if_cond)`).
	/// Every later arm's condition gets its own test block in the same way, and each arm's false
	/// branch threads to the next arm's test, the `else` block, or `if_exit` directly, whichever
	/// applies. `if_exit` is pruned at the end of function lowering if it turns out nothing ever
	/// reached it.
	fn lower_conditional(&mut self, arms: &[ConditionalArm], otherwise: &Option<Box<Stmt>>) -> Result<(), CompileError> {
		let if_exit = self.backend.new_block(self.function, "if_exit");
		let if_cond = self.backend.new_block(self.function, "if_cond");
		self.backend.br(self.function, self.current, if_cond);
		self.current = if_cond;

		for (index, arm) in arms.iter().enumerate() {
			self.push_scope();
			if let Some(decl) = &arm.decl {
				self.lower_decl(decl)?;
			}
			let condition = self.lower_expr(&arm.condition)?;
			let body_block = self.backend.new_block(self.function, &format!("if_body_{index}"));
			let next_block = if index + 1 < arms.len() {
				self.backend.new_block(self.function, &format!("if_test_{}", index + 1))
			} else if otherwise.is_some() {
				self.backend.new_block(self.function, "if_else")
			} else {
				if_exit
			};
			self.backend.cond_br(self.function, self.current, condition, body_block, next_block);

			self.current = body_block;
			self.lower_stmt(&arm.body)?;
			if self.backend.is_open(self.function, self.current) {
				self.backend.br(self.function, self.current, if_exit);
			}
			self.pop_scope();

			self.current = next_block;
		}
		if let Some(otherwise) = otherwise {
			self.lower_stmt(otherwise)?;
			if self.backend.is_open(self.function, self.current) {
				self.backend.br(self.function, self.current, if_exit);
			}
		}
		self.current = if_exit;
		Ok(())
	}

	/// Grounded in `transformWhileLoop`: a dedicated `loop_cond` block re-entered on every
	/// iteration (so the condition, and any `while let` binding, is re-evaluated each time), a
	/// `loop_body_entry` that always branches back to `loop_cond`, and a `loop_exit` the condition's
	/// false branch leads to and which becomes the new current block.
	fn lower_while(&mut self, decl: &Option<Decl>, condition: &Expr, body: &Stmt) -> Result<(), CompileError> {
		let loop_cond = self.backend.new_block(self.function, "loop_cond");
		let loop_body = self.backend.new_block(self.function, "loop_body");
		let loop_exit = self.backend.new_block(self.function, "loop_exit");

		self.backend.br(self.function, self.current, loop_cond);

		self.current = loop_cond;
		self.push_scope();
		if let Some(decl) = decl {
			self.lower_decl(decl)?;
		}
		let cond_value = self.lower_expr(condition)?;
		self.backend.cond_br(self.function, self.current, cond_value, loop_body, loop_exit);

		self.current = loop_body;
		self.lower_stmt(body)?;
		if self.backend.is_open(self.function, self.current) {
			self.backend.br(self.function, self.current, loop_cond);
		}
		self.pop_scope();

		self.current = loop_exit;
		Ok(())
	}

	fn lower_expr(&mut self, expr: &Expr) -> Result<Value, CompileError> {
		match &expr.kind {
			ExprKind::Integer(value) => Ok(Value::ConstInt(*value)),
			ExprKind::Double(value) => Ok(Value::ConstDouble(*value)),
			ExprKind::Bool(value) => Ok(Value::ConstBool(*value)),
			ExprKind::Identifier(name) => Ok(self.lower_identifier(name)),
			ExprKind::Labeled { expr, .. } => self.lower_expr(expr),
			ExprKind::Unary { op, operand: operand_expr } => {
				let operand = self.lower_expr(operand_expr)?;
				let op = match op.as_str() {
					"!" => UnOp::Not,
					"-" => match numeric_family(self.interner, operand_expr.resolved_type()) {
						Some(NumericFamily::Int) => UnOp::Neg,
						Some(NumericFamily::Float) => UnOp::FNeg,
						None => return Err(unlowerable(expr.location, "unary '-' on a non-numeric operand")),
					},
					other => return Err(unlowerable(expr.location, &format!("unary operator '{other}'"))),
				};
				Ok(self.backend.unary(self.function, self.current, op, operand))
			}
			ExprKind::Binary { left, op, right } if op.as_str() == "=" => self.lower_assignment(left, right),
			ExprKind::Binary { left, op, right } if op.as_str() == "&&" || op.as_str() == "||" => {
				let lhs = self.lower_expr(left)?;
				let rhs = self.lower_expr(right)?;
				let op = if op.as_str() == "&&" { BinOp::And } else { BinOp::Or };
				Ok(self.backend.binary(self.function, self.current, op, lhs, rhs))
			}
			ExprKind::Binary { left, op, right } => {
				let lhs = self.lower_expr(left)?;
				let rhs = self.lower_expr(right)?;
				let family = numeric_family(self.interner, left.resolved_type()).ok_or_else(|| unlowerable(expr.location, &format!("binary operator '{op}' on a non-numeric operand")))?;
				let op = binary_op(op, family).ok_or_else(|| unlowerable(expr.location, &format!("binary operator '{op}'")))?;
				Ok(self.backend.binary(self.function, self.current, op, lhs, rhs))
			}
			ExprKind::Call { callee, args } => self.lower_call(expr.location, callee, args),
			ExprKind::String(_) | ExprKind::List(_) | ExprKind::Tuple(_) | ExprKind::Accessor { .. } | ExprKind::Operator { .. } => {
				Err(unlowerable(expr.location, "this expression form"))
			}
		}
	}

	fn lower_identifier(&mut self, name: &Name) -> Value {
		match self.lookup(name) {
			NamedValue::Direct(value) => value,
			NamedValue::Slot(slot, ty) => self.backend.load(self.function, self.current, slot, ty),
		}
	}

	/// The left side of `=` is always an `Identifier` bound to a stack slot: the checker already
	/// rejected anything else via `NotAssignable`, and `Accessor` (the only other left-value shape
	/// the grammar admits) is rejected earlier still, at type-check time, as `Unimplemented`.
	fn lower_assignment(&mut self, left: &Expr, right: &Expr) -> Result<Value, CompileError> {
		let ExprKind::Identifier(name) = &left.kind else {
			return Err(unlowerable(left.location, "assignment to anything but a plain variable"));
		};
		let NamedValue::Slot(slot, _) = self.lookup(name) else {
			unreachable!("the checker only marks a Value with mutable = true, which this module only ever binds to a Slot, as a left value")
		};
		let value = self.lower_expr(right)?;
		self.backend.store(self.function, self.current, slot, value);
		Ok(value)
	}

	fn lower_call(&mut self, location: Location, callee: &Name, args: &[Expr]) -> Result<Value, CompileError> {
		let mut values = Vec::with_capacity(args.len());
		let mut arg_types = Vec::with_capacity(args.len());
		for arg in args {
			values.push(self.lower_expr(arg)?);
			arg_types.push(argument_type(arg));
		}
		let fid = *self
			.functions
			.get(&(callee.clone(), arg_types))
			.ok_or_else(|| unlowerable(location, &format!("calling '{callee}' as a function (it only resolves to a builtin operator)")))?;
		Ok(self.backend.call(self.function, self.current, fid, values))
	}
}

/// A call argument's type for overload resolution - a labeled argument (`f(x: 1)`) contributes its
/// inner expression's type, matching `crate::sema::argument_type`'s treatment of the label as
/// positional sugar rather than part of the type.
fn argument_type(arg: &Expr) -> TypeId {
	match &arg.kind {
		ExprKind::Labeled { expr, .. } => expr.resolved_type(),
		_ => arg.resolved_type(),
	}
}

/// Which family of machine op a numeric source operator lowers to - `i64` arithmetic/comparisons
/// use the plain integer ops (`Add`, `Lt`, ...), `f64` ones use the distinct floating-point ops
/// (`FAdd`, `FLt`, ...), matching the original's `CreateAdd`/`CreateFAdd`,
/// `CreateICmpSLT`/`CreateFCmpOLT` split (`CodeGen/IRGenWalker.h`). `bool` has no numeric family;
/// `&&`/`||` are dispatched separately since they never need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumericFamily {
	Int,
	Float,
}

fn numeric_family(interner: &TypeInterner, type_id: TypeId) -> Option<NumericFamily> {
	match interner.kind(type_id) {
		TypeKind::Integer => Some(NumericFamily::Int),
		TypeKind::Double => Some(NumericFamily::Float),
		_ => None,
	}
}

fn binary_op(lexeme: &str, family: NumericFamily) -> Option<BinOp> {
	use NumericFamily::{Float, Int};
	Some(match (lexeme, family) {
		("+", Int) => BinOp::Add,
		("+", Float) => BinOp::FAdd,
		("-", Int) => BinOp::Sub,
		("-", Float) => BinOp::FSub,
		("*", Int) => BinOp::Mul,
		("*", Float) => BinOp::FMul,
		("/", Int) => BinOp::Div,
		("/", Float) => BinOp::FDiv,
		("%", Int) => BinOp::Rem,
		("%", Float) => BinOp::FRem,
		("==", Int) => BinOp::Eq,
		("==", Float) => BinOp::FEq,
		("!=", Int) => BinOp::Ne,
		("!=", Float) => BinOp::FNe,
		("<", Int) => BinOp::Lt,
		("<", Float) => BinOp::FLt,
		("<=", Int) => BinOp::Le,
		("<=", Float) => BinOp::FLe,
		(">", Int) => BinOp::Gt,
		(">", Float) => BinOp::FGt,
		(">=", Int) => BinOp::Ge,
		(">=", Float) => BinOp::FGe,
		_ => return None,
	})
}

fn unlowerable(location: Location, what: &str) -> CompileError {
	CompileError::new(CompileErrorKind::Unimplemented, location, format!("{what} has no lowering to the reference backend"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{lexer::tokenize, parser, scope::DeclContextArena, sema};

	fn lower(source: &str) -> Result<ReferenceBackend, CompileError> {
		let mut tokens = tokenize("test", source).unwrap();
		let mut context = parser::Context::new();
		let mut program = parser::parse(&mut tokens, &mut context).unwrap();
		let mut arena = DeclContextArena::new();
		sema::builtins::install(&mut arena, &mut context.types);
		sema::check_program(&mut program, &mut arena, &mut context.types).unwrap();
		lower_program(&program, &context.types)
	}

	#[test]
	fn straight_line_function_lowers_to_one_block() {
		let backend = lower("func add(a: i64, b: i64) -> i64 {\nreturn a + b\n}").unwrap();
		assert_eq!(backend.module.functions.len(), 1);
		assert_eq!(backend.module.functions[0].blocks.len(), 1);
		let rendered = backend.module.to_string();
		assert!(rendered.contains("add %arg0, %arg1"));
	}

	#[test]
	fn var_assignment_goes_through_a_slot() {
		let backend = lower("func f() -> i64 {\nvar x: i64 = 1\nx = 2\nreturn x\n}").unwrap();
		let rendered = backend.module.to_string();
		assert!(rendered.contains("alloca i64"));
		assert!(rendered.contains("store 2"));
	}

	#[test]
	fn float_arithmetic_and_comparison_use_the_float_ops() {
		let backend = lower("func f(a: f64, b: f64) -> bool {\nreturn a + b < a\n}").unwrap();
		let rendered = backend.module.to_string();
		assert!(rendered.contains("fadd %arg0, %arg1"));
		assert!(rendered.contains("fcmp.lt"));
		assert!(!rendered.contains(" add "));
	}

	#[test]
	fn integer_arithmetic_still_uses_the_integer_ops() {
		let backend = lower("func f(a: i64, b: i64) -> bool {\nreturn a + b < a\n}").unwrap();
		let rendered = backend.module.to_string();
		assert!(rendered.contains("add %arg0, %arg1"));
		assert!(rendered.contains("cmp.lt"));
		assert!(!rendered.contains("fadd"));
	}

	#[test]
	fn conditional_with_every_arm_returning_drops_if_exit() {
		let backend = lower("func f(x: bool) -> i64 {\nif x {\nreturn 1\n} else {\nreturn 2\n}\n}").unwrap();
		// entry + if_cond + if_body_0 + if_else = 4 blocks once the unreachable if_exit is pruned
		assert_eq!(backend.module.functions[0].blocks.len(), 4);
	}

	#[test]
	fn conditional_falling_through_keeps_if_exit() {
		let backend = lower("func f(x: bool) -> i64 {\nif x {\nreturn 1\n}\nreturn 2\n}").unwrap();
		// entry + if_cond + if_body_0 + if_exit - nothing is unreferenced here
		assert_eq!(backend.module.functions[0].blocks.len(), 4);
	}

	#[test]
	fn three_way_conditional_has_three_condition_blocks() {
		let backend = lower("func f(x: i64) -> i64 {\nif x == 1 {\nreturn 1\n} else if x == 2 {\nreturn 2\n} else {\nreturn 3\n}\n}").unwrap();
		let rendered = backend.module.to_string();
		assert!(rendered.contains("if_cond:"));
		assert!(rendered.contains("if_test_1:"));
		assert!(rendered.contains("if_else:"));
	}

	#[test]
	fn while_loop_has_three_blocks() {
		let backend = lower("func f() -> i64 {\nvar x: i64 = 0\nwhile x < 10 {\nx = x + 1\n}\nreturn x\n}").unwrap();
		assert_eq!(backend.module.functions[0].blocks.len(), 4); // entry, loop_cond, loop_body, loop_exit
	}

	#[test]
	fn call_to_a_later_declared_function_resolves() {
		let backend = lower("func a() -> i64 {\nreturn b()\n}\nfunc b() -> i64 {\nreturn 1\n}").unwrap();
		let rendered = backend.module.to_string();
		assert!(rendered.contains("call b()"));
	}
}
