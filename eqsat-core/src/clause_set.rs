/*!

A clause arena plus the doubly-linked membership lists a saturation loop's "unprocessed"/"usable"
clause sets are built from, grounded on the original implementation's `CLAUSES/ccl_clausesets.c`
(`ClauseSetInsert`/`ClauseSetExtractClause`/`ClauseSetFindBest`). Clauses are owned centrally by
[`ClauseArena`]; a [`ClauseSet`] only ever holds non-owning [`ClauseId`]s, so the same clause may
be referenced by several sets (e.g. a freshly-processed clause appearing in both "usable" and an
index) without ever being cloned.

*/

use eqsat_abs::HashMap;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

use crate::clause::{Clause, ClauseId, ClauseProperties, ClauseProperty};
use crate::equation::Equation;
use crate::index::fingerprint::FingerprintIndex;
use crate::index::fv_index::{FeatureSchema, FvIndex};
use crate::index::pdt::Pdt;
use crate::index::{ClausePosition, Side};
use crate::signature::FunctionCode;
use crate::term::{TermBank, TermId};
use crate::types::TypeId;
use crate::variable_bank::VarId;

/// Owns every clause ever created; clause sets and indices reference clauses by [`ClauseId`] and
/// never hold a `Clause` directly.
#[derive(Debug, Default)]
pub struct ClauseArena {
  clauses: HashMap<ClauseId, Clause>,
  next_id: i64,
}

impl ClauseArena {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fresh_id(&mut self) -> ClauseId {
    let id = ClauseId(self.next_id);
    self.next_id += 1;
    id
  }

  pub fn insert(&mut self, literals: Vec<Equation>, properties: ClauseProperties, date: u64) -> ClauseId {
    let id = self.fresh_id();
    self.clauses.insert(id, Clause::new(id, literals, properties, date));
    id
  }

  /// Stores an already-constructed clause (e.g. one built via [`Clause::copy_to_bank`] against
  /// an id minted with [`Self::fresh_id`]) directly, without re-deriving it from a literal list.
  pub fn insert_clause(&mut self, clause: Clause) {
    self.clauses.insert(clause.id, clause);
  }

  pub fn get(&self, id: ClauseId) -> Option<&Clause> {
    self.clauses.get(&id)
  }

  pub fn get_mut(&mut self, id: ClauseId) -> Option<&mut Clause> {
    self.clauses.get_mut(&id)
  }

  pub fn remove(&mut self, id: ClauseId) -> Option<Clause> {
    self.clauses.remove(&id)
  }

  pub fn len(&self) -> usize {
    self.clauses.len()
  }
}

/// The retrieval indices a [`ClauseSet`] may have installed, grounded on spec §4.8 ("if the set
/// has any indices installed, the clause is also added to each") and §4.9's index descriptions.
/// Each field is independently optional: a set with no indices installed pays nothing beyond the
/// `Option` checks on insert/extract.
#[derive(Debug, Default)]
pub struct ClauseIndices {
  pub pdt: Option<Pdt>,
  pub fingerprint: Option<FingerprintIndex>,
  pub fv: Option<FvIndex>,
  pub fv_schema: Option<FeatureSchema>,
}

impl ClauseIndices {
  pub fn new() -> Self {
    Self::default()
  }

  fn index_clause(&mut self, bank: &TermBank, clause: &Clause) {
    for (i, lit) in clause.literals.iter().enumerate() {
      let literal = i as u32;
      let lpos = ClausePosition { clause: clause.id, literal, side: Side::Left };
      let rpos = ClausePosition { clause: clause.id, literal, side: Side::Right };
      if let Some(pdt) = &mut self.pdt {
        pdt.insert(bank, lit.lterm, lpos);
        pdt.insert(bank, lit.rterm, rpos);
      }
      if let Some(fp) = &mut self.fingerprint {
        fp.insert(bank, lit.lterm, lpos);
        fp.insert(bank, lit.rterm, rpos);
      }
    }
    if let (Some(fv), Some(schema)) = (&mut self.fv, &self.fv_schema) {
      let vector = schema.vector_of(bank, clause);
      fv.insert(clause.id, vector);
    }
  }

  fn deindex_clause(&mut self, bank: &TermBank, clause: &Clause) {
    for (i, lit) in clause.literals.iter().enumerate() {
      let literal = i as u32;
      let lpos = ClausePosition { clause: clause.id, literal, side: Side::Left };
      let rpos = ClausePosition { clause: clause.id, literal, side: Side::Right };
      if let Some(pdt) = &mut self.pdt {
        pdt.delete(bank, lit.lterm, lpos);
        pdt.delete(bank, lit.rterm, rpos);
      }
      if let Some(fp) = &mut self.fingerprint {
        fp.delete(bank, lit.lterm, lpos);
        fp.delete(bank, lit.rterm, rpos);
      }
    }
    if let Some(fv) = &mut self.fv {
      fv.remove(clause.id);
    }
  }

  fn has_any(&self) -> bool {
    self.pdt.is_some() || self.fingerprint.is_some() || self.fv.is_some()
  }
}

/// A structural key for duplicate detection modulo the symmetry of equality, grounded on the
/// original's `ClauseCompareFun`/`EqnListEqual`: literals are reduced to `(sign, {lterm, rterm})`
/// with the two sides sorted so `s = t` and `t = s` key identically, then the per-clause list of
/// literal keys is itself sorted so literal order doesn't matter either (mirroring
/// [`Clause::canonicalize_literal_order`]'s positives-then-negatives contract, but fully
/// order-independent within each sign).
fn structural_key(clause: &Clause) -> Vec<(bool, TermIdPair)> {
  let mut keys: Vec<(bool, TermIdPair)> = clause
    .literals
    .iter()
    .map(|lit| {
      let (a, b) = if lit.lterm.0 <= lit.rterm.0 { (lit.lterm, lit.rterm) } else { (lit.rterm, lit.lterm) };
      (lit.is_positive(), TermIdPair(a, b))
    })
    .collect();
  keys.sort();
  keys
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct TermIdPair(crate::term::TermId, crate::term::TermId);

/// A doubly-linked membership list of clauses. The original implementation anchors this list at
/// a dummy header cell; an arena-index design represents the same "no clause here yet" state more
/// directly with a plain `Option` head/tail pair instead of minting a sentinel [`ClauseId`] that
/// would otherwise need special-casing in every arena lookup.
#[derive(Debug, Default)]
pub struct ClauseSet {
  head: Option<ClauseId>,
  tail: Option<ClauseId>,
  count: usize,
  pub indices: ClauseIndices,
}

impl ClauseSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.count
  }

  pub fn is_empty(&self) -> bool {
    self.count == 0
  }

  /// Appends `id` at the tail of this set, then adds it to every installed index (spec §4.8:
  /// "if the set has any indices installed, the clause is also added to each"). `id` must not
  /// already belong to a set (its `pred`/`succ` must both be `None`).
  pub fn insert(&mut self, arena: &mut ClauseArena, bank: &TermBank, id: ClauseId) {
    let old_tail = self.tail;
    {
      let clause = arena.get_mut(id).expect("clause must exist in the arena before joining a set");
      debug_assert!(clause.pred.is_none() && clause.succ.is_none());
      clause.pred = old_tail;
      clause.succ = None;
    }
    match old_tail {
      Some(tail_id) => {
        arena.get_mut(tail_id).expect("tail must exist").succ = Some(id);
      }
      None => {
        self.head = Some(id);
      }
    }
    self.tail = Some(id);
    self.count += 1;
    if self.indices.has_any() {
      let clause = arena.get_mut(id).expect("just linked");
      clause.properties.insert(ClauseProperty::Indexed);
      self.indices.index_clause(bank, clause);
    }
  }

  /// Removes `id` from this set, relinking its neighbours, and removes it from every installed
  /// index. Does not remove the clause from the owning arena.
  pub fn extract(&mut self, arena: &mut ClauseArena, bank: &TermBank, id: ClauseId) {
    let (pred, succ) = match arena.get(id) {
      Some(c) => (c.pred, c.succ),
      None => return,
    };
    match pred {
      Some(p) => arena.get_mut(p).unwrap().succ = succ,
      None => self.head = succ,
    }
    match succ {
      Some(s) => arena.get_mut(s).unwrap().pred = pred,
      None => self.tail = pred,
    }
    if let Some(clause) = arena.get_mut(id) {
      clause.pred = None;
      clause.succ = None;
      if self.indices.has_any() {
        clause.properties.remove(ClauseProperty::Indexed);
      }
    }
    if self.indices.has_any() {
      if let Some(clause) = arena.get(id) {
        self.indices.deindex_clause(bank, clause);
      }
    }
    self.count = self.count.saturating_sub(1);
  }

  /// `extract` followed by freeing the clause from the owning arena (spec §4.8: "`delete(c)` =
  /// `extract` + free").
  pub fn delete(&mut self, arena: &mut ClauseArena, bank: &TermBank, id: ClauseId) -> Option<Clause> {
    self.extract(arena, bank, id);
    arena.remove(id)
  }

  pub fn iter<'a>(&'a self, arena: &'a ClauseArena) -> ClauseSetIter<'a> {
    ClauseSetIter { arena, current: self.head }
  }

  /// Flags every clause structurally equal (modulo the symmetry of equality, see
  /// [`structural_key`]) to an earlier one in iteration order as [`ClauseProperty::Dead`],
  /// returning the number flagged. Grounded on `ClauseSetMarkCopies`: walk the set once, keep an
  /// ordered store of the first clause seen per structural key, mark every later duplicate.
  pub fn mark_copies(&self, arena: &mut ClauseArena) -> usize {
    let mut seen: std::collections::HashSet<Vec<(bool, TermIdPair)>> = std::collections::HashSet::new();
    let mut marked = 0;
    let mut current = self.head;
    while let Some(id) = current {
      let key = structural_key(arena.get(id).expect("linked clause must exist"));
      if !seen.insert(key) {
        arena.get_mut(id).expect("linked clause must exist").properties.insert(ClauseProperty::Dead);
        marked += 1;
      }
      current = arena.get(id).expect("linked clause must exist").succ;
    }
    marked
  }

  /// `mark_copies` followed by deleting everything it flagged (spec §4.8: "`delete_copies` ...
  /// flag and remove duplicates modulo symmetry of equality"), grounded on `ClauseSetDeleteCopies`.
  pub fn delete_copies(&mut self, arena: &mut ClauseArena, bank: &TermBank) -> usize {
    self.mark_copies(arena);
    self.delete_flagged(arena, bank, ClauseProperty::Dead)
  }

  /// Removes every member clause matching `predicate`, returning how many were removed.
  fn delete_where(&mut self, arena: &mut ClauseArena, bank: &TermBank, predicate: impl Fn(&Clause) -> bool) -> usize {
    let mut removed = 0;
    let mut current = self.head;
    while let Some(id) = current {
      current = arena.get(id).expect("linked clause must exist").succ;
      if predicate(arena.get(id).expect("linked clause must exist")) {
        self.delete(arena, bank, id);
        removed += 1;
      }
    }
    removed
  }

  fn delete_flagged(&mut self, arena: &mut ClauseArena, bank: &TermBank, flag: ClauseProperty) -> usize {
    self.delete_where(arena, bank, |c| c.properties.contains(flag))
  }

  /// Removes every member clause [`Clause::is_trivial`], grounded on `ClauseSetFilterTrivial`.
  pub fn filter_trivial(&mut self, arena: &mut ClauseArena, bank: &TermBank) -> usize {
    self.delete_where(arena, bank, |c| c.is_trivial())
  }

  /// Invalidates every member clause's cached weight, e.g. after the ordering or signature
  /// changed underneath it. Grounded on the original's re-weighting sweep after a precedence
  /// change invalidates every clause's cached evaluation.
  pub fn reweight(&mut self, arena: &mut ClauseArena) {
    let mut current = self.head;
    while let Some(id) = current {
      let clause = arena.get_mut(id).expect("linked clause must exist");
      clause.invalidate_weight();
      current = clause.succ;
    }
  }

  /// Sets `property` on every member clause.
  pub fn set_property(&mut self, arena: &mut ClauseArena, property: ClauseProperty) {
    let mut current = self.head;
    while let Some(id) = current {
      let clause = arena.get_mut(id).expect("linked clause must exist");
      clause.properties.insert(property);
      current = clause.succ;
    }
  }

  /// Clears `property` on every member clause.
  pub fn clear_property(&mut self, arena: &mut ClauseArena, property: ClauseProperty) {
    let mut current = self.head;
    while let Some(id) = current {
      let clause = arena.get_mut(id).expect("linked clause must exist");
      clause.properties.remove(property);
      current = clause.succ;
    }
  }

  /// Removes every member clause [`Clause::is_trivial`] judges a tautology. Grounded on
  /// `ClauseSetFilterTautologies`, which in the original calls a semantic tautology detector
  /// (`ClauseIsTautology`, using a scratch term bank to test ground instances); spec §4.7 defines
  /// this engine's notion of triviality purely syntactically (`t = t` or complementary literals),
  /// so here the two bulk filters coincide. Kept as a separate entry point so a future semantic
  /// tautology detector has somewhere to plug in without changing [`Self::filter_trivial`]'s
  /// contract.
  pub fn filter_tautologies(&mut self, arena: &mut ClauseArena, bank: &TermBank) -> usize {
    self.filter_trivial(arena, bank)
  }

  /// Inserts every clause in `ids` (grounded on `ClauseSetIndexedInsertClauseSet`'s bulk indexed
  /// insert, named `insert-indexed` in spec §4.8's bulk-operation list). Equivalent to calling
  /// [`Self::insert`] once per id; kept as a named bulk entry point for callers migrating a whole
  /// batch of freshly produced clauses into an indexed set at once.
  pub fn insert_indexed(&mut self, arena: &mut ClauseArena, bank: &TermBank, ids: impl IntoIterator<Item = ClauseId>) {
    for id in ids {
      self.insert(arena, bank, id);
    }
  }

  /// Copies every member clause into `target_arena`/`target_set`, rebuilding its literals in
  /// `target_bank` via [`Clause::copy_to_bank`] (spec §4.8's "new-terms copy (rebuild terms in
  /// another bank)"). Grounded on `ClauseSetNewTerms`. Returns the fresh ids in source-iteration
  /// order.
  #[allow(clippy::too_many_arguments)]
  pub fn copy_to_bank(
    &self,
    source_arena: &ClauseArena,
    source_bank: &TermBank,
    target_arena: &mut ClauseArena,
    target_bank: &mut TermBank,
    target_set: &mut ClauseSet,
    date: u64,
    var_ty: impl Fn(VarId) -> TypeId + Copy,
    db_ty: impl Fn(crate::variable_bank::DbVarId) -> TypeId + Copy,
    app_ty: impl Fn(FunctionCode, &[TermId]) -> TypeId + Copy,
  ) -> Vec<ClauseId> {
    let mut fresh_ids = Vec::with_capacity(self.count);
    for id in self.iter(source_arena) {
      let clause = source_arena.get(id).expect("linked clause must exist");
      let fresh_id = target_arena.fresh_id();
      let copy = clause.copy_to_bank(source_bank, target_bank, fresh_id, date, var_ty, db_ty, app_ty);
      target_arena.insert_clause(copy);
      target_set.insert(target_arena, target_bank, fresh_id);
      fresh_ids.push(fresh_id);
    }
    fresh_ids
  }
}

pub struct ClauseSetIter<'a> {
  arena: &'a ClauseArena,
  current: Option<ClauseId>,
}

impl<'a> Iterator for ClauseSetIter<'a> {
  type Item = ClauseId;

  fn next(&mut self) -> Option<ClauseId> {
    let id = self.current?;
    self.current = self.arena.get(id).and_then(|c| c.succ);
    Some(id)
  }
}

/// A priority-ordered view over a subset of clauses, used by `find_best`-style given-clause
/// selection. Distinct from [`ClauseSet`]'s insertion-ordered membership list: several named
/// evaluation orders can coexist over the same clauses, mirroring the original's "clause
/// evaluation function" heaps.
#[derive(Debug, Default)]
pub struct EvaluationQueue {
  tree: BTreeMap<(OrderedFloat<f64>, ClauseId), ()>,
}

impl EvaluationQueue {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, id: ClauseId, priority: f64) {
    self.tree.insert((OrderedFloat(priority), id), ());
  }

  pub fn remove(&mut self, id: ClauseId, priority: f64) {
    self.tree.remove(&(OrderedFloat(priority), id));
  }

  /// The clause with the lowest priority value (lighter clauses are usually preferred), or `None`
  /// if the queue is empty.
  pub fn find_best(&self) -> Option<ClauseId> {
    self.tree.keys().next().map(|(_, id)| *id)
  }

  pub fn len(&self) -> usize {
    self.tree.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::equation::Equation;
  use crate::term::TermId;

  fn mk_clause(arena: &mut ClauseArena) -> ClauseId {
    arena.insert(vec![Equation::positive(TermId(0), TermId(1))], ClauseProperties::empty(), 0)
  }

  fn empty_bank() -> TermBank {
    let mut types = crate::types::TypeTable::new();
    TermBank::new(&mut types)
  }

  #[test]
  fn insert_and_iterate_preserves_order() {
    let bank = empty_bank();
    let mut arena = ClauseArena::new();
    let mut set = ClauseSet::new();
    let a = mk_clause(&mut arena);
    let b = mk_clause(&mut arena);
    let c = mk_clause(&mut arena);
    set.insert(&mut arena, &bank, a);
    set.insert(&mut arena, &bank, b);
    set.insert(&mut arena, &bank, c);
    let order: Vec<_> = set.iter(&arena).collect();
    assert_eq!(order, vec![a, b, c]);
    assert_eq!(set.len(), 3);
  }

  #[test]
  fn extract_middle_relinks_neighbours() {
    let bank = empty_bank();
    let mut arena = ClauseArena::new();
    let mut set = ClauseSet::new();
    let a = mk_clause(&mut arena);
    let b = mk_clause(&mut arena);
    let c = mk_clause(&mut arena);
    set.insert(&mut arena, &bank, a);
    set.insert(&mut arena, &bank, b);
    set.insert(&mut arena, &bank, c);

    set.extract(&mut arena, &bank, b);
    let order: Vec<_> = set.iter(&arena).collect();
    assert_eq!(order, vec![a, c]);
    assert_eq!(set.len(), 2);
  }

  #[test]
  fn find_best_returns_lowest_priority() {
    let mut arena = ClauseArena::new();
    let mut queue = EvaluationQueue::new();
    let a = mk_clause(&mut arena);
    let b = mk_clause(&mut arena);
    queue.insert(a, 5.0);
    queue.insert(b, 1.0);
    assert_eq!(queue.find_best(), Some(b));
  }

  #[test]
  fn delete_removes_from_set_and_arena() {
    let bank = empty_bank();
    let mut arena = ClauseArena::new();
    let mut set = ClauseSet::new();
    let a = mk_clause(&mut arena);
    set.insert(&mut arena, &bank, a);
    let removed = set.delete(&mut arena, &bank, a);
    assert!(removed.is_some());
    assert!(set.is_empty());
    assert!(arena.get(a).is_none());
  }

  #[test]
  fn mark_and_delete_copies_keeps_one_of_each_structural_class() {
    let bank = empty_bank();
    let mut arena = ClauseArena::new();
    let mut set = ClauseSet::new();
    let a = arena.insert(vec![Equation::positive(TermId(0), TermId(1))], ClauseProperties::empty(), 0);
    let b = arena.insert(vec![Equation::positive(TermId(1), TermId(0))], ClauseProperties::empty(), 0);
    let c = arena.insert(vec![Equation::positive(TermId(0), TermId(2))], ClauseProperties::empty(), 0);
    set.insert(&mut arena, &bank, a);
    set.insert(&mut arena, &bank, b);
    set.insert(&mut arena, &bank, c);

    let removed = set.delete_copies(&mut arena, &bank);
    assert_eq!(removed, 1);
    assert_eq!(set.len(), 2);
    let remaining: Vec<_> = set.iter(&arena).collect();
    assert_eq!(remaining, vec![a, c]);
  }

  #[test]
  fn filter_trivial_removes_reflexive_clauses() {
    let bank = empty_bank();
    let mut arena = ClauseArena::new();
    let mut set = ClauseSet::new();
    let trivial = arena.insert(vec![Equation::positive(TermId(0), TermId(0))], ClauseProperties::empty(), 0);
    let ok = arena.insert(vec![Equation::positive(TermId(0), TermId(1))], ClauseProperties::empty(), 0);
    set.insert(&mut arena, &bank, trivial);
    set.insert(&mut arena, &bank, ok);

    let removed = set.filter_trivial(&mut arena, &bank);
    assert_eq!(removed, 1);
    assert_eq!(set.iter(&arena).collect::<Vec<_>>(), vec![ok]);
  }
}
