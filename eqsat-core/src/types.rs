/*!

Sorts and types. A sort is an uninterpreted base classification (`$i`, `$o`, a user sort); a type
is either a sort or a flattened arrow `τ₁ → τ₂ → … → τₙ → σ` over argument types down to a result
sort. Types are interned so that two occurrences of the same arrow shape share one [`TypeId`], the
same way [`crate::term::bank::TermBank`] hash-conses term shapes.

*/

use eqsat_abs::{IString, HashMap, SmallVec};

/// A base sort. `BOOL` and `INDIVIDUAL` are reserved so that every signature has a usable default
/// predicate/individual distinction without forcing callers to declare them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortId(pub u32);

impl SortId {
  pub const BOOL: SortId = SortId(0);
  pub const INDIVIDUAL: SortId = SortId(1);
}

/// An interned type: `args.is_empty()` means this is just the base sort `result`; otherwise this
/// is the arrow type `args[0] → args[1] → … → result`, with each element of `args` itself a
/// (possibly higher-order) [`TypeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TypeShape {
  args:   SmallVec<[TypeId; 4]>,
  result: SortId,
}

#[derive(Debug)]
pub struct TypeTable {
  sort_names: Vec<IString>,
  sort_index: HashMap<IString, SortId>,

  shapes:    Vec<TypeShape>,
  shape_index: HashMap<TypeShape, TypeId>,

  bool_type:       TypeId,
  individual_type: TypeId,
}

impl Default for TypeTable {
  fn default() -> Self {
    let mut table = TypeTable {
      sort_names:  Vec::new(),
      sort_index:  HashMap::new(),
      shapes:      Vec::new(),
      shape_index: HashMap::new(),
      bool_type:       TypeId(0),
      individual_type: TypeId(0),
    };
    let bool_sort = table.declare_sort("$o");
    debug_assert_eq!(bool_sort, SortId::BOOL);
    let individual_sort = table.declare_sort("$i");
    debug_assert_eq!(individual_sort, SortId::INDIVIDUAL);
    table.bool_type = table.base(SortId::BOOL);
    table.individual_type = table.base(SortId::INDIVIDUAL);
    table
  }
}

impl TypeTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares a new base sort, or returns the existing one if `name` was already declared.
  pub fn declare_sort(&mut self, name: impl Into<IString>) -> SortId {
    let name = name.into();
    if let Some(&id) = self.sort_index.get(&name) {
      return id;
    }
    let id = SortId(self.sort_names.len() as u32);
    self.sort_names.push(name.clone());
    self.sort_index.insert(name, id);
    id
  }

  pub fn sort_name(&self, sort: SortId) -> &IString {
    &self.sort_names[sort.0 as usize]
  }

  pub fn lookup_sort(&self, name: &str) -> Option<SortId> {
    self.sort_index.get(name).copied()
  }

  fn intern(&mut self, shape: TypeShape) -> TypeId {
    if let Some(&id) = self.shape_index.get(&shape) {
      return id;
    }
    let id = TypeId(self.shapes.len() as u32);
    self.shape_index.insert(shape.clone(), id);
    self.shapes.push(shape);
    id
  }

  /// Interns the base (non-arrow) type over `sort`.
  pub fn base(&mut self, sort: SortId) -> TypeId {
    self.intern(TypeShape { args: SmallVec::new(), result: sort })
  }

  /// Interns the arrow type `args[0] → … → args[n-1] → result`. An empty `args` is the same as
  /// [`TypeTable::base`].
  pub fn arrow(&mut self, args: &[TypeId], result: SortId) -> TypeId {
    self.intern(TypeShape { args: SmallVec::from_slice(args), result })
  }

  pub fn bool(&self) -> TypeId {
    self.bool_type
  }

  pub fn individual(&self) -> TypeId {
    self.individual_type
  }

  pub fn is_base(&self, ty: TypeId) -> bool {
    self.shapes[ty.0 as usize].args.is_empty()
  }

  /// The argument types of an arrow type, empty for a base type.
  pub fn args(&self, ty: TypeId) -> &[TypeId] {
    &self.shapes[ty.0 as usize].args
  }

  /// The arity of the type when viewed as a curried function: `0` for a base type.
  pub fn arity(&self, ty: TypeId) -> usize {
    self.shapes[ty.0 as usize].args.len()
  }

  pub fn result_sort(&self, ty: TypeId) -> SortId {
    self.shapes[ty.0 as usize].result
  }

  /// The type obtained by applying a value of type `ty` to one more argument, dropping the
  /// leading argument type. Panics (an internal invariant, not a user error) if `ty` is a base
  /// type; callers are expected to have checked arity before applying.
  pub fn result_after_one_arg(&mut self, ty: TypeId) -> TypeId {
    let shape = &self.shapes[ty.0 as usize];
    crate::error::invariant!(!shape.args.is_empty(), "result_after_one_arg on a base type");
    let remaining: SmallVec<[TypeId; 4]> = shape.args[1..].into();
    let result = shape.result;
    self.intern(TypeShape { args: remaining, result })
  }

  /// The inverse of [`Self::result_after_one_arg`]: the type of `λ(x:arg_ty). body` given
  /// `body`'s type, used by the lambda normaliser to recover a binder's own arrow type from its
  /// bound-variable type and its body's type.
  pub fn prepend_arg(&mut self, arg_ty: TypeId, body_ty: TypeId) -> TypeId {
    let body_shape = &self.shapes[body_ty.0 as usize];
    let result = body_shape.result;
    let mut args: SmallVec<[TypeId; 4]> = SmallVec::with_capacity(body_shape.args.len() + 1);
    args.push(arg_ty);
    args.extend_from_slice(&body_shape.args);
    self.intern(TypeShape { args, result })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_types_are_interned() {
    let mut types = TypeTable::new();
    let s = types.declare_sort("nat");
    let a = types.base(s);
    let b = types.base(s);
    assert_eq!(a, b);
  }

  #[test]
  fn arrow_types_are_interned_and_distinct() {
    let mut types = TypeTable::new();
    let nat = types.declare_sort("nat");
    let nat_ty = types.base(nat);
    let arrow1 = types.arrow(&[nat_ty], nat);
    let arrow2 = types.arrow(&[nat_ty], nat);
    assert_eq!(arrow1, arrow2);
    assert_ne!(arrow1, nat_ty);
    assert_eq!(types.arity(arrow1), 1);
    assert!(types.is_base(nat_ty));
    assert!(!types.is_base(arrow1));
  }

  #[test]
  fn result_after_one_arg_peels_curried_argument() {
    let mut types = TypeTable::new();
    let nat = types.declare_sort("nat");
    let nat_ty = types.base(nat);
    let binary = types.arrow(&[nat_ty, nat_ty], nat);
    let unary = types.result_after_one_arg(binary);
    assert_eq!(types.arity(unary), 1);
    assert_eq!(types.result_sort(unary), nat);
  }

  #[test]
  fn prepend_arg_inverts_result_after_one_arg() {
    let mut types = TypeTable::new();
    let nat = types.declare_sort("nat");
    let nat_ty = types.base(nat);
    let binary = types.arrow(&[nat_ty, nat_ty], nat);
    let unary = types.result_after_one_arg(binary);
    let rebuilt = types.prepend_arg(nat_ty, unary);
    assert_eq!(rebuilt, binary);
  }

  #[test]
  fn reserved_sorts_are_bool_and_individual() {
    let types = TypeTable::new();
    assert_eq!(types.sort_name(SortId::BOOL).as_ref(), "$o");
    assert_eq!(types.sort_name(SortId::INDIVIDUAL).as_ref(), "$i");
  }
}
