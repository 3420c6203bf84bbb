//! Interned types. Every `Type` the checker produces lives in one [`TypeInterner`] arena, the same
//! "flat vector + index" pattern the teacher uses for its scope arena (`api/scope.rs`'s
//! `ScopeData`): structural equality is computed once, at intern time, and every later comparison
//! is just comparing two [`TypeId`]s.

use std::collections::HashMap;

/// A structural description of a type. Compound variants reference their component types by
/// [`TypeId`], never by value, so every Type graph is finite and shareable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
	Integer,
	Boolean,
	Double,
	Character,
	Tuple(Vec<TypeId>),
	Function { params: Vec<TypeId>, returns: TypeId },
	List { element: TypeId, size: i64 },
	Map { key: TypeId, value: TypeId },
	Pointer(TypeId),
	Reference(TypeId),
	Slice(TypeId),
	/// An ordered field list; order matters for display but not for structural equality, which is
	/// why this is a `Vec` of pairs rather than a `HashMap` or `BTreeMap`.
	Struct(Vec<(String, TypeId)>),
}

/// An index into a [`TypeInterner`]'s arena. Two `TypeId`s are equal iff the types they name are
/// structurally equal - equality is identity after interning, exactly as the specification
/// requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

/// The process-wide type pool. A compilation unit owns exactly one; the four fundamental
/// singletons are interned up front so `integer()`/`boolean()`/`double()`/`character()` never
/// allocate.
pub struct TypeInterner {
	types: Vec<TypeKind>,
	by_kind: HashMap<TypeKind, TypeId>,
	integer: TypeId,
	boolean: TypeId,
	double: TypeId,
	character: TypeId,
}

impl TypeInterner {
	#[must_use]
	pub fn new() -> Self {
		let mut interner = Self {
			types: Vec::new(),
			by_kind: HashMap::new(),
			integer: TypeId(0),
			boolean: TypeId(0),
			double: TypeId(0),
			character: TypeId(0),
		};
		interner.integer = interner.intern(TypeKind::Integer);
		interner.boolean = interner.intern(TypeKind::Boolean);
		interner.double = interner.intern(TypeKind::Double);
		interner.character = interner.intern(TypeKind::Character);
		interner
	}

	fn intern(&mut self, kind: TypeKind) -> TypeId {
		if let Some(existing) = self.by_kind.get(&kind) {
			return *existing;
		}
		let id = TypeId(self.types.len());
		self.by_kind.insert(kind.clone(), id);
		self.types.push(kind);
		id
	}

	#[must_use]
	pub const fn integer(&self) -> TypeId {
		self.integer
	}

	#[must_use]
	pub const fn boolean(&self) -> TypeId {
		self.boolean
	}

	#[must_use]
	pub const fn double(&self) -> TypeId {
		self.double
	}

	#[must_use]
	pub const fn character(&self) -> TypeId {
		self.character
	}

	pub fn tuple(&mut self, elements: Vec<TypeId>) -> TypeId {
		self.intern(TypeKind::Tuple(elements))
	}

	pub fn function(&mut self, params: Vec<TypeId>, returns: TypeId) -> TypeId {
		self.intern(TypeKind::Function { params, returns })
	}

	pub fn list(&mut self, element: TypeId, size: i64) -> TypeId {
		self.intern(TypeKind::List { element, size })
	}

	pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
		self.intern(TypeKind::Map { key, value })
	}

	pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
		self.intern(TypeKind::Pointer(pointee))
	}

	pub fn reference(&mut self, pointee: TypeId) -> TypeId {
		self.intern(TypeKind::Reference(pointee))
	}

	pub fn slice(&mut self, element: TypeId) -> TypeId {
		self.intern(TypeKind::Slice(element))
	}

	pub fn struct_type(&mut self, fields: Vec<(String, TypeId)>) -> TypeId {
		self.intern(TypeKind::Struct(fields))
	}

	/// Looks up the structural description behind `id`. Every `TypeId` ever handed out by this
	/// interner is a valid index, so this never fails.
	#[must_use]
	pub fn kind(&self, id: TypeId) -> &TypeKind {
		&self.types[id.0]
	}

	/// Renders a type the way the source language spells it, e.g. `(i64, f64) -> bool`.
	#[must_use]
	pub fn display(&self, id: TypeId) -> String {
		match self.kind(id) {
			TypeKind::Integer => "i64".to_owned(),
			TypeKind::Boolean => "bool".to_owned(),
			TypeKind::Double => "f64".to_owned(),
			TypeKind::Character => "char".to_owned(),
			TypeKind::Tuple(elements) => format!("({})", elements.iter().map(|element| self.display(*element)).collect::<Vec<_>>().join(", ")),
			TypeKind::Function { params, returns } => format!(
				"({}) -> {}",
				params.iter().map(|param| self.display(*param)).collect::<Vec<_>>().join(", "),
				self.display(*returns)
			),
			TypeKind::List { element, size } => format!("[{}, {size}]", self.display(*element)),
			TypeKind::Map { key, value } => format!("[{}: {}]", self.display(*key), self.display(*value)),
			TypeKind::Pointer(pointee) => format!("*{}", self.display(*pointee)),
			TypeKind::Reference(pointee) => format!("&{}", self.display(*pointee)),
			TypeKind::Slice(element) => format!("&[{}]", self.display(*element)),
			TypeKind::Struct(fields) => format!(
				"{{ {} }}",
				fields.iter().map(|(name, field)| format!("{name}: {}", self.display(*field))).collect::<Vec<_>>().join(", ")
			),
		}
	}
}

impl Default for TypeInterner {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fundamental_types_are_singletons() {
		let mut interner = TypeInterner::new();
		let first = interner.integer();
		let second = interner.tuple(vec![]); // unrelated intern to perturb the arena
		let _ = second;
		assert_eq!(first, interner.integer());
	}

	#[test]
	fn structurally_equal_compound_types_share_an_id() {
		let mut interner = TypeInterner::new();
		let a = interner.tuple(vec![interner.integer(), interner.boolean()]);
		let b = interner.tuple(vec![interner.integer(), interner.boolean()]);
		assert_eq!(a, b);
	}

	#[test]
	fn structurally_different_compound_types_differ() {
		let mut interner = TypeInterner::new();
		let a = interner.tuple(vec![interner.integer()]);
		let b = interner.tuple(vec![interner.boolean()]);
		assert_ne!(a, b);
	}
}
