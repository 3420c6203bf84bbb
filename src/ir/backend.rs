//! The reference IR backend: an in-memory SSA module, standing in for the real target back-end
//! the lowerer (`crate::ir`) hands instructions to. Grounded in `CodeGen/IRGenWalker.h`'s shape -
//! one function per `FuncDecl`, one `BasicBlock` per control-flow node, each holding an ordered
//! instruction list and at most one terminator - but expressed as data (`Module`/`IrFunction`/
//! `BasicBlock`/`Instruction`) rather than as LLVM IR builder calls, since the actual target is
//! external to this crate.
//!
//! There is exactly one implementation of this interface in the crate, so its public methods on
//! [`ReferenceBackend`] (`make_function`, `new_block`, `alloca`, `store`, `load`, `br`, `cond_br`,
//! `ret`, the arithmetic/comparison/call ops) are the contract directly, rather than a trait with
//! one impl - a second backend was never asked for, and a trait with a single implementor buys
//! nothing but indirection.

use std::fmt;

/// A fundamental machine type the reference backend knows how to allocate, load, and store.
/// `IntegerType -> I64`, `BooleanType -> I1`, `DoubleType -> F64`; every other source type is
/// rejected with `Unimplemented` before reaching here (see `crate::ir::lower_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrType {
	I64,
	I1,
	F64,
}

impl fmt::Display for IrType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			Self::I64 => "i64",
			Self::I1 => "i1",
			Self::F64 => "f64",
		};
		write!(f, "{text}")
	}
}

/// An operand: a compile-time constant, the current function's Nth parameter, or a previously
/// computed temporary. Small and `Copy` so lowering can pass values around by value, the way a
/// `llvm::Value*` is passed around by the original.
#[derive(Debug, Clone, Copy)]
pub enum Value {
	ConstInt(i64),
	ConstBool(bool),
	ConstDouble(f64),
	Param(u32),
	Temp(u32),
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ConstInt(value) => write!(f, "{value}"),
			Self::ConstBool(value) => write!(f, "{value}"),
			Self::ConstDouble(value) => write!(f, "{value}"),
			Self::Param(index) => write!(f, "%arg{index}"),
			Self::Temp(id) => write!(f, "%t{id}"),
		}
	}
}

/// A slot allocated by `alloca`, named by the temp id of the `Alloca` instruction that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "%t{}", self.0)
	}
}

/// Arithmetic, comparison, and logical ops. Arithmetic and comparisons come in an integer and a
/// floating-point form (`Add`/`FAdd`, `Lt`/`FLt`, ...) - the reference backend never guesses a
/// family from the operand `Value` alone, so the lowerer picks the right variant up front from the
/// operand's checked type. `And`/`Or` have no float form; they only ever operate on `i1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	FAdd,
	FSub,
	FMul,
	FDiv,
	FRem,
	FEq,
	FNe,
	FLt,
	FLe,
	FGt,
	FGe,
	And,
	Or,
}

impl fmt::Display for BinOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			Self::Add => "add",
			Self::Sub => "sub",
			Self::Mul => "mul",
			Self::Div => "div",
			Self::Rem => "rem",
			Self::Eq => "cmp.eq",
			Self::Ne => "cmp.ne",
			Self::Lt => "cmp.lt",
			Self::Le => "cmp.le",
			Self::Gt => "cmp.gt",
			Self::Ge => "cmp.ge",
			Self::FAdd => "fadd",
			Self::FSub => "fsub",
			Self::FMul => "fmul",
			Self::FDiv => "fdiv",
			Self::FRem => "frem",
			Self::FEq => "fcmp.eq",
			Self::FNe => "fcmp.ne",
			Self::FLt => "fcmp.lt",
			Self::FLe => "fcmp.le",
			Self::FGt => "fcmp.gt",
			Self::FGe => "fcmp.ge",
			Self::And => "and",
			Self::Or => "or",
		};
		write!(f, "{text}")
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
	Neg,
	FNeg,
	Not,
}

impl fmt::Display for UnOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let text = match self {
			Self::Neg => "neg",
			Self::FNeg => "fneg",
			Self::Not => "not",
		};
		write!(f, "{text}")
	}
}

/// One instruction. `result`, when present, is the temp id other instructions reference via
/// [`Value::Temp`] (an `Alloca`'s own temp id doubles as its [`SlotId`]).
#[derive(Debug, Clone)]
pub struct Instruction {
	pub result: Option<u32>,
	pub op: Op,
}

#[derive(Debug, Clone)]
pub enum Op {
	Alloca { ty: IrType },
	Load { slot: SlotId, ty: IrType },
	Store { slot: SlotId, value: Value },
	Binary { op: BinOp, lhs: Value, rhs: Value },
	Unary { op: UnOp, operand: Value },
	Call { callee: String, args: Vec<Value> },
}

impl fmt::Display for Instruction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(result) = self.result {
			write!(f, "%t{result} = ")?;
		}
		match &self.op {
			Op::Alloca { ty } => write!(f, "alloca {ty}"),
			Op::Load { slot, ty } => write!(f, "load {ty}, {slot}"),
			Op::Store { slot, value } => write!(f, "store {value}, {slot}"),
			Op::Binary { op, lhs, rhs } => write!(f, "{op} {lhs}, {rhs}"),
			Op::Unary { op, operand } => write!(f, "{op} {operand}"),
			Op::Call { callee, args } => write!(f, "call {callee}({})", args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")),
		}
	}
}

#[derive(Debug, Clone)]
pub enum Terminator {
	Branch(BlockId),
	CondBranch { cond: Value, then_block: BlockId, else_block: BlockId },
	Return(Option<Value>),
}

impl fmt::Display for Terminator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Branch(target) => write!(f, "br {target}"),
			Self::CondBranch { cond, then_block, else_block } => write!(f, "cond_br {cond}, {then_block}, {else_block}"),
			Self::Return(Some(value)) => write!(f, "ret {value}"),
			Self::Return(None) => write!(f, "ret"),
		}
	}
}

/// An index into an [`IrFunction`]'s own `blocks` vector. Scoped to one function, the way the
/// original's `llvm::BasicBlock*` is always implicitly read within one `llvm::Function`'s context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "%{}", self.0)
	}
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
	pub label: String,
	pub instructions: Vec<Instruction>,
	pub terminator: Option<Terminator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionId(pub usize);

#[derive(Debug, Clone)]
pub struct IrFunction {
	pub name: String,
	pub params: Vec<IrType>,
	pub return_type: IrType,
	pub blocks: Vec<BasicBlock>,
	next_temp: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Module {
	pub functions: Vec<IrFunction>,
}

impl Module {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

impl fmt::Display for Module {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (index, function) in self.functions.iter().enumerate() {
			if index > 0 {
				writeln!(f)?;
			}
			writeln!(f, "func {}({}) -> {} {{", function.name, function.params.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "), function.return_type)?;
			for (block_index, block) in function.blocks.iter().enumerate() {
				writeln!(f, "{}:", if block.label.is_empty() { format!("%{block_index}") } else { block.label.clone() })?;
				for instruction in &block.instructions {
					writeln!(f, "  {instruction}")?;
				}
				if let Some(terminator) = &block.terminator {
					writeln!(f, "  {terminator}")?;
				}
			}
			writeln!(f, "}}")?;
		}
		Ok(())
	}
}

/// The concrete backend the driver runs against. Owns a [`Module`] and performs exactly the
/// bookkeeping the lowering contract requires: handle allocation, terminator-once enforcement,
/// and arity checks on `call` - no instruction selection, no register allocation, no optimization.
#[derive(Debug, Clone, Default)]
pub struct ReferenceBackend {
	pub module: Module,
}

impl ReferenceBackend {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn make_function(&mut self, name: &str, params: Vec<IrType>, return_type: IrType) -> FunctionId {
		let id = FunctionId(self.module.functions.len());
		self.module.functions.push(IrFunction {
			name: name.to_owned(),
			params,
			return_type,
			blocks: Vec::new(),
			next_temp: 0,
		});
		id
	}

	pub fn new_block(&mut self, function: FunctionId, label: &str) -> BlockId {
		let function = &mut self.module.functions[function.0];
		let id = BlockId(function.blocks.len());
		function.blocks.push(BasicBlock {
			label: label.to_owned(),
			instructions: Vec::new(),
			terminator: None,
		});
		id
	}

	fn next_temp(&mut self, function: FunctionId) -> u32 {
		let function = &mut self.module.functions[function.0];
		let temp = function.next_temp;
		function.next_temp += 1;
		temp
	}

	fn push(&mut self, function: FunctionId, block: BlockId, op: Op, produces_value: bool) -> Value {
		let result = produces_value.then(|| self.next_temp(function));
		self.module.functions[function.0].blocks[block.0].instructions.push(Instruction { result, op });
		Value::Temp(result.expect("produces_value was true"))
	}

	pub fn alloca(&mut self, function: FunctionId, block: BlockId, ty: IrType) -> SlotId {
		let temp = self.next_temp(function);
		self.module.functions[function.0].blocks[block.0].instructions.push(Instruction {
			result: Some(temp),
			op: Op::Alloca { ty },
		});
		SlotId(temp)
	}

	pub fn store(&mut self, function: FunctionId, block: BlockId, slot: SlotId, value: Value) {
		self.module.functions[function.0].blocks[block.0].instructions.push(Instruction {
			result: None,
			op: Op::Store { slot, value },
		});
	}

	pub fn load(&mut self, function: FunctionId, block: BlockId, slot: SlotId, ty: IrType) -> Value {
		self.push(function, block, Op::Load { slot, ty }, true)
	}

	pub fn binary(&mut self, function: FunctionId, block: BlockId, op: BinOp, lhs: Value, rhs: Value) -> Value {
		self.push(function, block, Op::Binary { op, lhs, rhs }, true)
	}

	pub fn unary(&mut self, function: FunctionId, block: BlockId, op: UnOp, operand: Value) -> Value {
		self.push(function, block, Op::Unary { op, operand }, true)
	}

	/// Emits a call, returning its result. The arity check the contract requires is enforced here,
	/// against the callee's own recorded parameter list - a mismatch is an internal bug (the type
	/// checker already verified the call resolves to a matching overload), so it panics rather than
	/// returning a `CompileError` the lowerer would have to thread through just for this.
	pub fn call(&mut self, function: FunctionId, block: BlockId, callee: FunctionId, args: Vec<Value>) -> Value {
		let expected = self.module.functions[callee.0].params.len();
		assert_eq!(args.len(), expected, "call to '{}' passed {} arguments but it takes {expected}", self.module.functions[callee.0].name, args.len());
		let callee_name = self.module.functions[callee.0].name.clone();
		self.push(function, block, Op::Call { callee: callee_name, args }, true)
	}

	pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
		self.module.functions.iter().position(|function| function.name == name).map(FunctionId)
	}

	pub fn function_arity(&self, function: FunctionId) -> usize {
		self.module.functions[function.0].params.len()
	}

	/// Whether `block` has no terminator yet - the lowerer consults this before deciding whether to
	/// thread a fallthrough branch onto the end of a lowered sub-block.
	pub fn is_open(&self, function: FunctionId, block: BlockId) -> bool {
		self.module.functions[function.0].blocks[block.0].terminator.is_none()
	}

	/// Sets `block`'s terminator. Panics on a second terminator - the contract's "at most one
	/// terminator per block" invariant is enforced here, at the one place blocks are ever closed.
	fn terminate(&mut self, function: FunctionId, block: BlockId, terminator: Terminator) {
		let slot = &mut self.module.functions[function.0].blocks[block.0].terminator;
		assert!(slot.is_none(), "block {block} already has a terminator");
		*slot = Some(terminator);
	}

	pub fn br(&mut self, function: FunctionId, block: BlockId, target: BlockId) {
		self.terminate(function, block, Terminator::Branch(target));
	}

	pub fn cond_br(&mut self, function: FunctionId, block: BlockId, cond: Value, then_block: BlockId, else_block: BlockId) {
		self.terminate(function, block, Terminator::CondBranch { cond, then_block, else_block });
	}

	pub fn ret(&mut self, function: FunctionId, block: BlockId, value: Option<Value>) {
		self.terminate(function, block, Terminator::Return(value));
	}

	/// Whether any block in `function` branches to `block` - used by [`Self::finalize_function`] to
	/// decide whether a dangling `if_exit` (every arm returned) should be dropped.
	fn has_predecessor(&self, function: FunctionId, block: BlockId) -> bool {
		self.module.functions[function.0].blocks.iter().any(|candidate| match &candidate.terminator {
			Some(Terminator::Branch(target)) => *target == block,
			Some(Terminator::CondBranch { then_block, else_block, .. }) => *then_block == block || *else_block == block,
			_ => false,
		})
	}

	/// Drops every block in `function` that is unreferenced, empty, and still open - a dangling
	/// `if_exit` left behind when every arm of a conditional returns. Grounded in
	/// `transformConditionalBlock`'s `if (pred_begin(if_exit) == pred_end(if_exit)) if_exit->removeFromParent()`,
	/// generalized into a single fixpoint pass run once the whole function body is lowered, rather
	/// than removing mid-lowering: only once lowering is finished can a block be deleted and every
	/// remaining `BlockId` renumbered without invalidating a `current` block some caller still holds.
	/// The entry block (index `0`) is never a candidate, even if nothing branches to it.
	pub fn finalize_function(&mut self, function: FunctionId) {
		loop {
			let dead = self.module.functions[function.0]
				.blocks
				.iter()
				.enumerate()
				.skip(1)
				.position(|(index, block)| block.instructions.is_empty() && block.terminator.is_none() && !self.has_predecessor(function, BlockId(index)));
			let Some(dead) = dead else { break };
			let dead = dead + 1; // undo the skip(1) offset
			let blocks = &mut self.module.functions[function.0].blocks;
			blocks.remove(dead);
			for later in blocks.iter_mut() {
				if let Some(terminator) = &mut later.terminator {
					renumber_after_removal(terminator, dead);
				}
			}
		}
	}
}

fn renumber_after_removal(terminator: &mut Terminator, removed: usize) {
	let shift = |id: &mut BlockId| {
		if id.0 > removed {
			id.0 -= 1;
		}
	};
	match terminator {
		Terminator::Branch(target) => shift(target),
		Terminator::CondBranch { then_block, else_block, .. } => {
			shift(then_block);
			shift(else_block);
		}
		Terminator::Return(_) => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn simple_function_renders_as_pseudo_assembly() {
		let mut backend = ReferenceBackend::new();
		let add = backend.make_function("add", vec![IrType::I64, IrType::I64], IrType::I64);
		let entry = backend.new_block(add, "entry");
		let sum = backend.binary(add, entry, BinOp::Add, Value::Param(0), Value::Param(1));
		backend.ret(add, entry, Some(sum));
		let rendered = backend.module.to_string();
		assert!(rendered.contains("add %arg0, %arg1"));
		assert!(rendered.contains("ret %t0"));
	}

	#[test]
	fn unreferenced_exit_block_is_dropped_on_finalize() {
		let mut backend = ReferenceBackend::new();
		let f = backend.make_function("f", vec![], IrType::I64);
		let entry = backend.new_block(f, "entry");
		let _exit = backend.new_block(f, "if_exit");
		backend.ret(f, entry, Some(Value::ConstInt(1)));
		backend.finalize_function(f);
		assert_eq!(backend.module.functions[f.0].blocks.len(), 1);
	}

	#[test]
	fn referenced_block_survives_finalize() {
		let mut backend = ReferenceBackend::new();
		let f = backend.make_function("f", vec![], IrType::I64);
		let entry = backend.new_block(f, "entry");
		let exit = backend.new_block(f, "if_exit");
		backend.br(f, entry, exit);
		backend.ret(f, exit, Some(Value::ConstInt(1)));
		backend.finalize_function(f);
		assert_eq!(backend.module.functions[f.0].blocks.len(), 2);
	}

	#[test]
	fn call_with_wrong_arity_panics() {
		let mut backend = ReferenceBackend::new();
		let callee = backend.make_function("callee", vec![IrType::I64], IrType::I64);
		let caller = backend.make_function("caller", vec![], IrType::I64);
		let block = backend.new_block(caller, "entry");
		let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| backend.call(caller, block, callee, vec![])));
		assert!(result.is_err());
	}
}
