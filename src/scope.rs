//! The `DeclContext` arena. Generalizes the teacher's `Scope`/`ScopeData` pair (`api/scope.rs`):
//! same "flat `Vec` of nodes + parent index" shape, but keyed on this language's declarations
//! rather than Cabin's `Expression`, and supporting the overload sets the builtin operator table
//! needs (`+` on `i64` and `+` on `f64` are two distinct `FuncDecl`s sharing one name in
//! `GlobalContext`).
//!
//! Each context stores a lightweight [`DeclSummary`] per declaration rather than the `Decl` node
//! itself - the specification calls the arena's references to a `Decl` "non-owning"; since the
//! AST tree is the Decl's real owner, the summary (name, type, mutability) is all lookup and
//! type-check ever need from here.

use std::collections::HashMap;

use crate::{
	ast::{Name, ScopeId},
	errors::{CompileError, CompileErrorKind, Location},
	types::{TypeId, TypeInterner, TypeKind},
};

/// What a name resolves to, as far as scope lookup and type-checking are concerned.
#[derive(Debug, Clone, Copy)]
pub enum DeclSummary {
	/// A `LetDecl`/`VarDecl`/`ParamDecl`: a value of `type_id`, writable only if `mutable`.
	Value { type_id: TypeId, mutable: bool },
	/// A `FuncDecl`: callable with `signature` (a `TypeKind::Function`).
	Function { signature: TypeId },
}

impl DeclSummary {
	fn signature(self) -> Option<TypeId> {
		match self {
			Self::Function { signature } => Some(signature),
			Self::Value { .. } => None,
		}
	}
}

struct Entry {
	summary: DeclSummary,
	location: Location,
}

/// One lexical region: an overload map keyed by name, plus a parent link. The root (index `0`) is
/// the process-wide `GlobalContext`; every other context's `parent` is `Some`.
pub struct DeclContext {
	parent: Option<ScopeId>,
	children: Vec<ScopeId>,
	index: ScopeId,
	decls: HashMap<Name, Vec<Entry>>,
}

impl DeclContext {
	fn new(index: ScopeId, parent: Option<ScopeId>) -> Self {
		Self {
			parent,
			children: Vec::new(),
			index,
			decls: HashMap::new(),
		}
	}

	#[must_use]
	pub const fn index(&self) -> ScopeId {
		self.index
	}

	#[must_use]
	pub const fn parent(&self) -> Option<ScopeId> {
		self.parent
	}
}

/// The owning arena. A compilation unit holds exactly one; `DeclContext`s never outlive it and
/// never move, so `ScopeId`s handed out at construction stay valid for the arena's whole life.
pub struct DeclContextArena {
	contexts: Vec<DeclContext>,
}

impl DeclContextArena {
	pub const GLOBAL: ScopeId = 0;

	/// Builds an arena containing only the empty global context (index `0`, no parent). Builtin
	/// operator declarations are seeded separately, by `crate::sema::builtins`.
	#[must_use]
	pub fn new() -> Self {
		Self {
			contexts: vec![DeclContext::new(0, None)],
		}
	}

	/// Allocates a fresh child context of `parent` and returns its id.
	pub fn new_child(&mut self, parent: ScopeId) -> ScopeId {
		let index = self.contexts.len();
		self.contexts.push(DeclContext::new(index, Some(parent)));
		self.contexts[parent].children.push(index);
		index
	}

	#[must_use]
	pub fn get(&self, scope: ScopeId) -> &DeclContext {
		&self.contexts[scope]
	}

	/// Inserts `name` into `scope`, enforcing `DuplicateDeclaration`: a name may be re-declared in
	/// the same context only when every existing entry and the new one are all `Function`
	/// summaries with pairwise distinct signatures (the builtin-overload shape).
	pub fn insert(&mut self, name: &Name, scope: ScopeId, summary: DeclSummary, location: Location) -> Result<(), CompileError> {
		let context = &mut self.contexts[scope];
		if let Some(existing) = context.decls.get(name) {
			let collides = existing.iter().any(|prior| match (prior.summary.signature(), summary.signature()) {
				(Some(a), Some(b)) => a == b,
				_ => true, // at least one side isn't an overloadable Function summary: any reuse collides
			});
			if collides {
				return Err(CompileError::new(CompileErrorKind::DuplicateDeclaration, location, format!("'{name}' is already declared in this scope")));
			}
		}
		context.decls.entry(name.clone()).or_default().push(Entry { summary, location });
		Ok(())
	}

	/// Seeds a builtin overload directly, bypassing the duplicate check above - builtins are
	/// constructed once, by trusted code, as a deliberately-overloaded set.
	pub fn insert_builtin(&mut self, scope: ScopeId, name: &Name, summary: DeclSummary) {
		self.contexts[scope].decls.entry(name.clone()).or_default().push(Entry {
			summary,
			location: Location::synthetic(),
		});
	}

	/// Resolves `name` starting at `scope` and ascending through parents. `arg_types`, when given,
	/// filters candidate `Function` summaries by exact parameter-type match (call-site resolution,
	/// needed to pick the right overload among e.g. `+` on `i64` vs `+` on `f64`); when absent,
	/// every entry under `name` in the first context that has one is a candidate.
	pub fn lookup(&self, interner: &TypeInterner, scope: ScopeId, name: &Name, arg_types: Option<&[TypeId]>, location: Location) -> Result<DeclSummary, CompileError> {
		let mut current = Some(scope);
		while let Some(index) = current {
			let context = &self.contexts[index];
			if let Some(candidates) = context.decls.get(name) {
				let matches: Vec<&Entry> = candidates.iter().filter(|entry| signature_params_match(interner, entry.summary, arg_types)).collect();
				return match matches.as_slice() {
					[] => Err(CompileError::new(CompileErrorKind::UnresolvedName, location, format!("no overload of '{name}' matches these argument types"))),
					[only] => Ok(only.summary),
					_ => Err(CompileError::new(CompileErrorKind::AmbiguousName, location, format!("'{name}' is ambiguous among {} candidates", matches.len()))),
				};
			}
			current = context.parent;
		}
		Err(CompileError::new(CompileErrorKind::UnresolvedName, location, format!("'{name}' is not declared in any enclosing scope")))
	}
}

/// Whether `summary` is a candidate given `arg_types`: a non-`Function` summary (a plain value) is
/// always a candidate, since only calls pass `arg_types`; a `Function` summary is a candidate only
/// when `arg_types` is absent, or present and equal to its declared parameter types.
fn signature_params_match(interner: &TypeInterner, summary: DeclSummary, arg_types: Option<&[TypeId]>) -> bool {
	match (summary, arg_types) {
		(DeclSummary::Value { .. }, _) => true,
		(DeclSummary::Function { .. }, None) => true,
		(DeclSummary::Function { signature }, Some(args)) => match interner.kind(signature) {
			TypeKind::Function { params, .. } => params.as_slice() == args,
			_ => false,
		},
	}
}

impl Default for DeclContextArena {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn inner_scope_shadows_outer() {
		let interner = TypeInterner::new();
		let mut arena = DeclContextArena::new();
		let type_id = interner.integer();
		arena.insert(&Name::from("x"), DeclContextArena::GLOBAL, DeclSummary::Value { type_id, mutable: false }, Location::synthetic()).unwrap();
		let inner = arena.new_child(DeclContextArena::GLOBAL);
		arena.insert(&Name::from("x"), inner, DeclSummary::Value { type_id, mutable: true }, Location::synthetic()).unwrap();
		let found = arena.lookup(&interner, inner, &Name::from("x"), None, Location::synthetic()).unwrap();
		assert!(matches!(found, DeclSummary::Value { mutable: true, .. }));
	}

	#[test]
	fn unresolved_name_ascends_to_global_context_boundary() {
		let interner = TypeInterner::new();
		let arena = DeclContextArena::new();
		let error = arena.lookup(&interner, DeclContextArena::GLOBAL, &Name::from("missing"), None, Location::synthetic()).unwrap_err();
		assert_eq!(error.kind, CompileErrorKind::UnresolvedName);
	}

	#[test]
	fn duplicate_non_function_name_in_one_scope_is_rejected() {
		let interner = TypeInterner::new();
		let mut arena = DeclContextArena::new();
		let type_id = interner.integer();
		arena.insert(&Name::from("x"), DeclContextArena::GLOBAL, DeclSummary::Value { type_id, mutable: false }, Location::synthetic()).unwrap();
		let error = arena
			.insert(&Name::from("x"), DeclContextArena::GLOBAL, DeclSummary::Value { type_id, mutable: false }, Location::synthetic())
			.unwrap_err();
		assert_eq!(error.kind, CompileErrorKind::DuplicateDeclaration);
	}
}
