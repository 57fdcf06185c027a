/*!

The signature: the table of declared function symbols, grounded on the teacher's
`mod2-lib/src/api/symbol.rs` `Symbol`/`SymbolType`/`SymbolAttribute` triple, generalized from a
single-theory Maude symbol to the flat function-code space a saturation prover indexes terms over.

A small handful of function codes are reserved at startup (`$true`, `$false`, equality, the
connectives, the lambda and phony-application heads) the way E reserves `SIG_TRUE_CODE` and
friends in `cte_signature.h`.

*/

use enumflags2::{bitflags, BitFlags};
use eqsat_abs::{HashMap, IString};

use crate::error::{EngineError, EngineResult};
use crate::types::TypeId;

pub type FunctionCode = u32;

/// Reserved function codes, always present in a fresh [`Signature`] at the positions given here.
pub mod reserved {
  use super::FunctionCode;

  pub const TRUE: FunctionCode = 0;
  pub const FALSE: FunctionCode = 1;
  pub const EQUALITY: FunctionCode = 2;
  pub const NOT: FunctionCode = 3;
  pub const AND: FunctionCode = 4;
  pub const OR: FunctionCode = 5;
  pub const IMPLIES: FunctionCode = 6;
  pub const EQUIV: FunctionCode = 7;
  /// The head of a "phony application": `phony_app(h, a1, .., an)` represents `h` (a variable or
  /// a lambda term) applied to `a1 .. an`. Never survives insertion with a rigid (symbol) head;
  /// see [`crate::term::bank::TermBank::app`].
  pub const PHONY_APP: FunctionCode = 8;
  /// The head of a lambda abstraction: `lambda(db0, body)`, where `db0` is the de Bruijn-0
  /// variable term carrying the bound variable's type and `body` is the abstraction's body.
  pub const LAMBDA: FunctionCode = 9;

  pub const FIRST_USER_CODE: FunctionCode = 10;
}

#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolProperty {
  /// Declared as a logical connective or other symbol with fixed interpretation; never unifies
  /// against a variable binding in the inference rules that treat the connectives specially.
  Logical,
  /// May appear as the head of a positive/negative literal directly (a predicate symbol) rather
  /// than only inside a term that is then compared to `$true`/`$false`.
  Predicate,
  /// Associative.
  Assoc,
  /// Commutative.
  Commutative,
  /// Skolem function introduced by clausification, never entered by a user declaration.
  Skolem,
}

pub type SymbolProperties = BitFlags<SymbolProperty>;

#[derive(Debug, Clone)]
pub struct SymbolEntry {
  pub name:       IString,
  pub arity:      u32,
  pub ty:         TypeId,
  pub properties: SymbolProperties,
}

/// The table of declared function symbols, indexed by [`FunctionCode`].
#[derive(Debug)]
pub struct Signature {
  entries:      Vec<SymbolEntry>,
  by_name_arity: HashMap<(IString, u32), FunctionCode>,
  next_skolem:  u32,
}

impl Signature {
  pub fn new(types: &mut crate::types::TypeTable) -> Self {
    let bool_ty = types.bool();
    let mut sig = Signature { entries: Vec::new(), by_name_arity: HashMap::new(), next_skolem: 0 };

    let reserve = |sig: &mut Signature, name: &str, arity: u32, ty: TypeId, props: SymbolProperties| {
      let code = sig.entries.len() as FunctionCode;
      sig.entries.push(SymbolEntry { name: IString::from(name), arity, ty, properties: props });
      sig.by_name_arity.insert((IString::from(name), arity), code);
    };

    reserve(&mut sig, "$true", 0, bool_ty, SymbolProperty::Logical.into());
    reserve(&mut sig, "$false", 0, bool_ty, SymbolProperty::Logical.into());
    reserve(&mut sig, "=", 2, bool_ty, SymbolProperty::Logical | SymbolProperty::Commutative);
    reserve(&mut sig, "~", 1, bool_ty, SymbolProperty::Logical.into());
    reserve(&mut sig, "&", 2, bool_ty, SymbolProperty::Logical | SymbolProperty::Assoc | SymbolProperty::Commutative);
    reserve(&mut sig, "|", 2, bool_ty, SymbolProperty::Logical | SymbolProperty::Assoc | SymbolProperty::Commutative);
    reserve(&mut sig, "=>", 2, bool_ty, SymbolProperty::Logical.into());
    reserve(&mut sig, "<=>", 2, bool_ty, SymbolProperty::Logical | SymbolProperty::Commutative);
    reserve(&mut sig, "@", 0, bool_ty, SymbolProperty::Logical.into());
    reserve(&mut sig, "^", 0, bool_ty, SymbolProperty::Logical.into());

    debug_assert_eq!(sig.entries.len() as FunctionCode, reserved::FIRST_USER_CODE);
    sig
  }

  /// Declares a new function symbol, or returns its existing code if `name` was already declared
  /// with the same arity and type. Re-declaring `name` with a *different* arity is a hard error
  /// (spec §4.1: "Declaring the same name with a conflicting arity is a hard error surfaced to
  /// the caller"), so this scans every arity already on file for `name` rather than only probing
  /// the requested `(name, arity)` pair, which on its own would never notice a conflict (two
  /// different arities hash to two different map keys).
  pub fn declare(
    &mut self,
    name: impl Into<IString>,
    arity: u32,
    ty: TypeId,
    properties: SymbolProperties,
  ) -> EngineResult<FunctionCode> {
    let name = name.into();
    if let Some(&code) = self.by_name_arity.get(&(name.clone(), arity)) {
      let existing = &self.entries[code as usize];
      if existing.ty != ty {
        return Err(EngineError::SignatureConflict {
          name,
          existing_arity: existing.arity,
          requested_arity: arity,
        });
      }
      return Ok(code);
    }
    if let Some(existing_arity) = self.arity_on_file(&name) {
      return Err(EngineError::SignatureConflict { name, existing_arity, requested_arity: arity });
    }
    let code = self.entries.len() as FunctionCode;
    self.entries.push(SymbolEntry { name: name.clone(), arity, ty, properties });
    self.by_name_arity.insert((name, arity), code);
    Ok(code)
  }

  fn arity_on_file(&self, name: &IString) -> Option<u32> {
    self.by_name_arity.iter().find(|((n, _), _)| n == name).map(|((_, arity), _)| *arity)
  }

  /// Declares `code` as a predicate: its result sort becomes `Bool` and [`SymbolProperty::Predicate`]
  /// is set. Idempotent if `code` is already a `Bool`-valued predicate.
  ///
  /// Spec §4.1 reads, in the same paragraph, both "converting its result type to Bool" and "fails
  /// if the symbol already has a non-Boolean fixed result type" — contradictory unless "fixed" is
  /// read narrowly. We read it as: a symbol declared with `Individual` as its result sort (the
  /// default every symbol gets unless a caller asked for something else) hasn't had its result
  /// sort *fixed* by anyone yet, so `declare_predicate` may still rewrite it to `Bool`; a symbol
  /// declared with any other explicit non-Boolean result sort has had it fixed and conversion is
  /// rejected as [`EngineError::TypeMismatch`]. See `DESIGN.md`.
  pub fn declare_predicate(&mut self, code: FunctionCode, types: &mut crate::types::TypeTable) -> EngineResult<()> {
    let entry = &self.entries[code as usize];
    let result_sort = types.result_sort(entry.ty);
    if result_sort == crate::types::SortId::BOOL {
      self.entries[code as usize].properties.insert(SymbolProperty::Predicate);
      return Ok(());
    }
    if result_sort != crate::types::SortId::INDIVIDUAL {
      return Err(EngineError::TypeMismatch { expected: types.bool(), found: entry.ty, context: "declare_predicate" });
    }
    let args = types.args(entry.ty).to_vec();
    let new_ty = if args.is_empty() { types.bool() } else { types.arrow(&args, crate::types::SortId::BOOL) };
    let entry = &mut self.entries[code as usize];
    entry.ty = new_ty;
    entry.properties.insert(SymbolProperty::Predicate);
    Ok(())
  }

  pub fn lookup(&self, name: &str, arity: u32) -> Option<FunctionCode> {
    self.by_name_arity.get(&(IString::from(name), arity)).copied()
  }

  pub fn entry(&self, code: FunctionCode) -> &SymbolEntry {
    &self.entries[code as usize]
  }

  pub fn name(&self, code: FunctionCode) -> &IString {
    &self.entries[code as usize].name
  }

  pub fn arity(&self, code: FunctionCode) -> u32 {
    self.entries[code as usize].arity
  }

  pub fn ty(&self, code: FunctionCode) -> TypeId {
    self.entries[code as usize].ty
  }

  pub fn properties(&self, code: FunctionCode) -> SymbolProperties {
    self.entries[code as usize].properties
  }

  pub fn has_property(&self, code: FunctionCode, property: SymbolProperty) -> bool {
    self.entries[code as usize].properties.contains(property)
  }

  /// Introduces a fresh Skolem function symbol of the given arity and type, named distinctly
  /// from any user-visible identifier.
  pub fn fresh_skolem(&mut self, arity: u32, ty: TypeId) -> FunctionCode {
    let id = self.next_skolem;
    self.next_skolem += 1;
    let name = IString::from(format!("#sk{}", id));
    self.declare(name, arity, ty, SymbolProperty::Skolem.into())
      .expect("freshly minted skolem name cannot conflict")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::TypeTable;

  #[test]
  fn reserved_codes_match_constants() {
    let mut types = TypeTable::new();
    let sig = Signature::new(&mut types);
    assert_eq!(sig.name(reserved::TRUE).as_ref(), "$true");
    assert_eq!(sig.name(reserved::EQUALITY).as_ref(), "=");
    assert_eq!(sig.arity(reserved::EQUALITY), 2);
    assert!(sig.has_property(reserved::AND, SymbolProperty::Commutative));
  }

  #[test]
  fn declare_is_idempotent_for_matching_type() {
    let mut types = TypeTable::new();
    let mut sig = Signature::new(&mut types);
    let individual_sort = types.result_sort(types.individual());
    let individual = types.individual();
    let unary = types.arrow(&[individual], individual_sort);
    let code1 = sig.declare("f", 1, unary, SymbolProperties::empty()).unwrap();
    let code2 = sig.declare("f", 1, unary, SymbolProperties::empty()).unwrap();
    assert_eq!(code1, code2);
  }

  #[test]
  fn declare_rejects_conflicting_type() {
    let mut types = TypeTable::new();
    let mut sig = Signature::new(&mut types);
    let individual = types.individual();
    let bool_ty = types.bool();
    sig.declare("g", 1, individual, SymbolProperties::empty()).unwrap();
    let err = sig.declare("g", 1, bool_ty, SymbolProperties::empty());
    assert!(matches!(err, Err(EngineError::SignatureConflict { .. })));
  }
}
