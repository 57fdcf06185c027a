/*!

Free-variable and de-Bruijn-variable interning, generalized from the teacher's
`mod2-lib/src/core/gc/root_container` notion of a small set of long-lived handles and from
`TermCore`'s `occurs_set`/`context_set` bookkeeping, which presupposes a stable small-integer
identity for every variable a term can mention.

Two disjoint *banks* (`A`/`B`) are provided for free variables so that two clauses can be renamed
apart without walking their terms: allocate one clause's variables from bank `A` and the other's
from bank `B`, and no name ever collides. This is the arena-index analogue of E's "two variable
banks" trick in `cte_subst.h`/`cte_varbanks.h`.

*/

use eqsat_abs::HashMap;

use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bank {
  A,
  B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarCell {
  pub bank: Bank,
  /// The ordinal within `bank`; together with `bank` this is the variable's full identity.
  pub ordinal: u32,
  pub ty: TypeId,
}

/// Interns free variables. Each `(bank, ordinal, ty)` triple gets one stable [`VarId`]; fresh
/// variables are minted by bumping the bank's ordinal counter, and externally-named variables
/// (e.g. parsed source text like `X`, `Y`) are asserted by explicit ordinal so that repeated
/// mentions of the same name intern to the same [`VarId`].
#[derive(Debug, Default)]
pub struct VariableBank {
  cells: Vec<VarCell>,
  index: HashMap<VarCell, VarId>,
  next_ordinal: [u32; 2],
}

impl VariableBank {
  pub fn new() -> Self {
    Self::default()
  }

  fn intern(&mut self, cell: VarCell) -> VarId {
    if let Some(&id) = self.index.get(&cell) {
      return id;
    }
    let id = VarId(self.cells.len() as u32);
    self.cells.push(cell);
    self.index.insert(cell, id);
    id
  }

  /// Mints a variable in `bank` that has never been handed out before.
  pub fn fresh(&mut self, bank: Bank, ty: TypeId) -> VarId {
    let ordinal = self.next_ordinal[bank as usize];
    self.next_ordinal[bank as usize] += 1;
    self.intern(VarCell { bank, ordinal, ty })
  }

  /// Interns (or re-finds) the variable named `ordinal` in `bank`, for callers that assign their
  /// own small-integer names (a parser resolving repeated occurrences of the identifier `X`).
  /// Does not advance `fresh`'s ordinal counter, so a caller mixing `assert` and `fresh` on the
  /// same bank is responsible for keeping the two ordinal spaces from colliding.
  pub fn assert(&mut self, bank: Bank, ordinal: u32, ty: TypeId) -> VarId {
    self.intern(VarCell { bank, ordinal, ty })
  }

  pub fn cell(&self, var: VarId) -> VarCell {
    self.cells[var.0 as usize]
  }

  pub fn ty(&self, var: VarId) -> TypeId {
    self.cells[var.0 as usize].ty
  }

  pub fn bank(&self, var: VarId) -> Bank {
    self.cells[var.0 as usize].bank
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  /// Clears the interning table used by [`Self::assert`]/[`Self::fresh`] to dedupe repeated
  /// `(bank, ordinal, ty)` triples, per spec §4.3 ("a reset operation clears extended-name
  /// mappings used by the parser"). Already-issued [`VarId`]s remain valid (`cells` is untouched);
  /// a later `assert` for the same `ordinal` a caller previously used mints a fresh cell rather
  /// than returning the pre-reset one, so a parser resolving the identifier `X` in one clause
  /// never collides with its resolution of `X` in the next.
  pub fn reset(&mut self) {
    self.index.clear();
  }
}

/// A de Bruijn-indexed bound variable, interned purely by `(type, index)` since its identity is
/// positional rather than nominal; distinct from [`VarId`] the way the spec's term cell keeps
/// `FreeVar`/`DbVar` as separate shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbVarId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DbVarCell {
  ty:    TypeId,
  index: u32,
}

#[derive(Debug, Default)]
pub struct DbVariableBank {
  cells: Vec<DbVarCell>,
  index: HashMap<DbVarCell, DbVarId>,
}

impl DbVariableBank {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn intern(&mut self, ty: TypeId, index: u32) -> DbVarId {
    let cell = DbVarCell { ty, index };
    if let Some(&id) = self.index.get(&cell) {
      return id;
    }
    let id = DbVarId(self.cells.len() as u32);
    self.cells.push(cell);
    self.index.insert(cell, id);
    id
  }

  pub fn ty(&self, var: DbVarId) -> TypeId {
    self.cells[var.0 as usize].ty
  }

  pub fn index(&self, var: DbVarId) -> u32 {
    self.cells[var.0 as usize].index
  }
}
