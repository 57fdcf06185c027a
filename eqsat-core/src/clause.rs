/*!

Clauses: an ordered list of [`Equation`] literals plus the bookkeeping a saturation loop threads
through given/clause processing. Grounded on `CLAUSES/ccl_clauses.c`/`ccl_clauses.h`'s `ClauseCell`
(id, literal array, properties, weight, proof metadata) from the original implementation, with the
clause's intrusive doubly-linked-list pointers into its owning [`crate::clause_set::ClauseSet`]
factored out into the clause itself (`pred`/`succ`) the way the original keeps them on `ClauseCell`
rather than on the set.

*/

use enumflags2::{bitflags, BitFlags};

use crate::equation::Equation;
use crate::signature::{FunctionCode, Signature};
use crate::term::{TermBank, TermId, TermShape};
use crate::types::TypeId;
use crate::variable_bank::{Bank, VarId, VariableBank};

/// Which side of a unit equation a recognised equality-definition `f(X1..Xn) = t` lives on, per
/// spec §4.7 ("detect an equality-definition shape ... and no free vars in `t` beyond X1..Xn").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionSide {
  Left,
  Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClauseId(pub i64);

#[bitflags]
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseProperty {
  /// Present in the input problem, not derived by an inference.
  Initial,
  /// Has already passed through the saturation loop's processing step (as opposed to sitting in
  /// the unprocessed queue).
  Processed,
  /// Logically subsumed or otherwise made redundant; kept around (rather than deallocated
  /// immediately) so that proof reconstruction can still find it.
  Dead,
  /// Currently present in at least one retrieval index; a clause must be unindexed before its
  /// literals may be mutated in place.
  Indexed,
  /// Belongs to the set-of-support (eligible to initiate an inference with an axiom, but not
  /// with another set-of-support clause) the way the original's `CPInitialSOS` does.
  SetOfSupport,
  /// Negation of the conjecture, as opposed to a problem axiom.
  Conjecture,
}

pub type ClauseProperties = BitFlags<ClauseProperty>;

#[derive(Debug, Clone)]
pub struct Clause {
  pub id: ClauseId,
  pub literals: Vec<Equation>,
  pub properties: ClauseProperties,

  /// Proof-tree depth: 0 for initial clauses, `1 + max(parent depths)` for derived ones.
  pub proof_depth: u32,
  /// Total literal count across every clause in this clause's proof, used by some clause
  /// selection heuristics as a tie-breaker distinct from the clause's own weight.
  pub proof_size: u32,
  /// Monotonically increasing insertion order, used to break ties in evaluation-function
  /// comparisons the way the original's clause `date` does.
  pub date: u64,

  weight_cache: std::cell::Cell<Option<u32>>,

  /// Doubly-linked-list pointers into whichever [`crate::clause_set::ClauseSet`] currently owns
  /// this clause; `None`/`None` when the clause belongs to no set. Maintained exclusively by
  /// `ClauseSet`'s insert/extract methods.
  pub(crate) pred: Option<ClauseId>,
  pub(crate) succ: Option<ClauseId>,
}

impl Clause {
  pub fn new(id: ClauseId, literals: Vec<Equation>, properties: ClauseProperties, date: u64) -> Self {
    let mut clause = Clause {
      id,
      literals,
      properties,
      proof_depth: 0,
      proof_size: 0,
      date,
      weight_cache: std::cell::Cell::new(None),
      pred: None,
      succ: None,
    };
    clause.canonicalize_literal_order();
    clause
  }

  pub fn pos_count(&self) -> usize {
    self.literals.iter().filter(|l| l.is_positive()).count()
  }

  pub fn neg_count(&self) -> usize {
    self.literals.iter().filter(|l| l.is_negative()).count()
  }

  pub fn is_empty_clause(&self) -> bool {
    self.literals.is_empty()
  }

  pub fn is_unit(&self) -> bool {
    self.literals.len() == 1
  }

  pub fn is_dead(&self) -> bool {
    self.properties.contains(ClauseProperty::Dead)
  }

  /// The clause's symbol weight: the sum of its literals' `lterm`/`rterm` weights. Memoised and
  /// invalidated by [`Self::invalidate_weight`], which any literal mutation must call.
  pub fn weight(&self, bank: &crate::term::TermBank) -> u32 {
    if let Some(w) = self.weight_cache.get() {
      return w;
    }
    let w: u32 = self
      .literals
      .iter()
      .map(|l| bank.weight(l.lterm) + bank.weight(l.rterm))
      .sum();
    self.weight_cache.set(Some(w));
    w
  }

  pub fn invalidate_weight(&mut self) {
    self.weight_cache.set(None);
  }

  /// Stable-sorts literals positive-first, the canonical order the indices and subsumption check
  /// expect so that two variants of a clause line up literal-for-literal.
  pub fn canonicalize_literal_order(&mut self) {
    self.literals.sort_by_key(|l| !l.is_positive());
  }

  /// Every free variable mentioned by any literal, in first-occurrence order (not a set: callers
  /// that need set operations wrap this themselves, matching the original's `PTree` var-sets
  /// built freshly per call rather than cached).
  pub fn free_vars(&self, bank: &TermBank) -> Vec<VarId> {
    let mut seen = eqsat_abs::NatSet::new();
    let mut out = Vec::new();
    for lit in &self.literals {
      collect_free_vars(bank, lit.lterm, &mut seen, &mut out);
      collect_free_vars(bank, lit.rterm, &mut seen, &mut out);
    }
    out
  }

  fn pos_vars(&self, bank: &TermBank) -> Vec<VarId> {
    let mut seen = eqsat_abs::NatSet::new();
    let mut out = Vec::new();
    for lit in self.literals.iter().filter(|l| l.is_positive()) {
      collect_free_vars(bank, lit.lterm, &mut seen, &mut out);
      collect_free_vars(bank, lit.rterm, &mut seen, &mut out);
    }
    out
  }

  fn neg_vars(&self, bank: &TermBank) -> Vec<VarId> {
    let mut seen = eqsat_abs::NatSet::new();
    let mut out = Vec::new();
    for lit in self.literals.iter().filter(|l| l.is_negative()) {
      collect_free_vars(bank, lit.lterm, &mut seen, &mut out);
      collect_free_vars(bank, lit.rterm, &mut seen, &mut out);
    }
    out
  }

  /// Triviality per spec §4.7/§8 property-10's seed scenarios: a literal `t = t` (positive), or
  /// two literals of opposite sign that are the same equation up to swapping sides, grounded on
  /// `ccl_eqnlist.c`'s `EqnListIsTrivial` (`EqnIsTrue` for the reflexive case, `EqnEqual` for the
  /// complementary-pair case).
  pub fn is_trivial(&self) -> bool {
    if self.literals.iter().any(|l| l.is_positive() && l.lterm == l.rterm) {
      return true;
    }
    for i in 0..self.literals.len() {
      for j in (i + 1)..self.literals.len() {
        let a = &self.literals[i];
        let b = &self.literals[j];
        if a.is_positive() == b.is_positive() {
          continue;
        }
        let same_pair = (a.lterm == b.lterm && a.rterm == b.rterm) || (a.lterm == b.rterm && a.rterm == b.lterm);
        if same_pair {
          return true;
        }
      }
    }
    false
  }

  /// `true` iff every variable occurring in a negative literal also occurs in some positive
  /// literal, per spec §4.7 and `ccl_clauses.c`'s `ClauseIsRangeRestricted`: positive-only and
  /// ground clauses are trivially range-restricted; purely negative non-ground clauses never are.
  pub fn is_range_restricted(&self, bank: &TermBank) -> bool {
    if self.neg_count() == 0 {
      return true;
    }
    if self.pos_count() == 0 {
      return self.literals.iter().all(|l| bank.is_ground(l.lterm) && bank.is_ground(l.rterm));
    }
    let pos: eqsat_abs::Set<VarId> = self.pos_vars(bank).into_iter().collect();
    self.neg_vars(bank).iter().all(|v| pos.contains(v))
  }

  /// Recognises a positive unit clause of the equality-definition shape `f(X1,..,Xn) = t` (or its
  /// mirror `t = f(X1,..,Xn)`) where `X1,..,Xn` are pairwise-distinct free variables, `f` does not
  /// occur in `t`, and `t` mentions no free variable outside `{X1,..,Xn}`, grounded on
  /// `ccl_eqn.c`'s `EqnIsDefinition`. Returns which side carries the defined head, or `None` if
  /// the clause isn't of this shape (including any clause that isn't a positive unit clause).
  pub fn equality_definition_side(&self, bank: &TermBank) -> Option<DefinitionSide> {
    if !self.is_unit() || self.pos_count() != 1 {
      return None;
    }
    let lit = &self.literals[0];
    if is_definition_term(bank, lit.lterm) && !term_has_head(bank, lit.rterm, head_code(bank, lit.lterm))
      && no_vars_outside(bank, lit.rterm, &def_term_vars(bank, lit.lterm))
    {
      return Some(DefinitionSide::Left);
    }
    if is_definition_term(bank, lit.rterm) && !term_has_head(bank, lit.lterm, head_code(bank, lit.rterm))
      && no_vars_outside(bank, lit.lterm, &def_term_vars(bank, lit.rterm))
    {
      return Some(DefinitionSide::Right);
    }
    None
  }

  /// Replaces every free variable of this clause with a fresh Skolem constant (spec §4.7:
  /// "skolemise free variables of a clause using fresh constants allocated in the signature"),
  /// mutating the clause's literals in place and invalidating its cached weight. Used for
  /// (negated) existentially-quantified goal clauses whose free variables stand for the
  /// existential witnesses.
  pub fn skolemize(&mut self, bank: &mut TermBank, sig: &mut Signature) {
    if self.free_vars(bank).is_empty() {
      return;
    }
    let mut subst: eqsat_abs::HashMap<VarId, TermId> = eqsat_abs::HashMap::new();
    let mut fresh_for = |bank: &mut TermBank, sig: &mut Signature, v: VarId, ty: TypeId| -> TermId {
      *subst.entry(v).or_insert_with(|| {
        let code = sig.fresh_skolem(0, ty);
        bank.app_direct(code, eqsat_abs::SmallVec::new(), ty)
      })
    };
    for lit in &mut self.literals {
      lit.lterm = skolemize_term(bank, sig, lit.lterm, &mut fresh_for);
      lit.rterm = skolemize_term(bank, sig, lit.rterm, &mut fresh_for);
    }
    self.invalidate_weight();
  }

  /// A copy of this clause with every free variable renamed to a bank-disjoint fresh variable
  /// (spec §4.7: "copy with disjoint variables"), sharing the renamed terms into `bank` via
  /// [`crate::term::TermBank::insert_disjoint`]. The copy gets a fresh id from `id_source` and is
  /// not linked into any clause set.
  pub fn copy_disjoint(&self, bank: &mut TermBank, vars: &mut VariableBank, fresh_id: ClauseId, date: u64) -> Clause {
    let mut rename = eqsat_abs::HashMap::new();
    let mut rename_fn = |v: VarId| -> VarId {
      *rename.entry(v).or_insert_with_key(|v| {
        let other = match vars.bank(*v) {
          Bank::A => Bank::B,
          Bank::B => Bank::A,
        };
        vars.fresh(other, vars.ty(*v))
      })
    };
    let literals = self
      .literals
      .iter()
      .map(|lit| Equation {
        lterm: bank.insert_disjoint(lit.lterm, &mut rename_fn),
        rterm: bank.insert_disjoint(lit.rterm, &mut rename_fn),
        properties: lit.properties,
      })
      .collect();
    Clause::new(fresh_id, literals, self.properties, date)
  }

  /// Destructively renumbers this clause's free variables to a canonical sequence of fresh
  /// variables in first-occurrence order, reusing `vars`' existing bank assignment for each
  /// (unlike [`Self::copy_disjoint`], which deliberately flips banks, this keeps a clause's
  /// variables in whichever bank they started in). Grounded on the original's
  /// `ClauseNormalizeVars`: "destructively normalize variables in clause" by substituting each
  /// with a fresh one drawn in the order variables are first seen, via `VarBankResetVCounts` +
  /// `NormSubstClause`. A no-op clause with no free variables is left untouched.
  pub fn normalize_var_indices(&mut self, bank: &mut TermBank, vars: &mut VariableBank) {
    let order = self.free_vars(bank);
    if order.is_empty() {
      return;
    }
    let mut rename: eqsat_abs::HashMap<VarId, VarId> = eqsat_abs::HashMap::new();
    for v in order {
      let fresh = vars.fresh(vars.bank(v), vars.ty(v));
      rename.insert(v, fresh);
    }
    let mut rename_fn = |v: VarId| -> VarId { *rename.get(&v).unwrap_or(&v) };
    for lit in &mut self.literals {
      lit.lterm = bank.insert_disjoint(lit.lterm, &mut rename_fn);
      lit.rterm = bank.insert_disjoint(lit.rterm, &mut rename_fn);
    }
    self.invalidate_weight();
  }

  /// A copy of this clause with its literals rebuilt into `target` (a different term bank),
  /// e.g. when importing a clause produced in a scratch bank into the prover's main bank (spec
  /// §4.7: "copy with optional term-bank change"). `var_ty`/`db_ty`/`app_ty` resolve leaf/
  /// application types in `target`, the same closures [`TermBank::insert`] itself takes.
  pub fn copy_to_bank(
    &self,
    source: &TermBank,
    target: &mut TermBank,
    fresh_id: ClauseId,
    date: u64,
    var_ty: impl Fn(VarId) -> TypeId + Copy,
    db_ty: impl Fn(crate::variable_bank::DbVarId) -> TypeId + Copy,
    app_ty: impl Fn(FunctionCode, &[TermId]) -> TypeId + Copy,
  ) -> Clause {
    let literals = self
      .literals
      .iter()
      .map(|lit| Equation {
        lterm: rebuild_in(source, target, lit.lterm, var_ty, db_ty, app_ty),
        rterm: rebuild_in(source, target, lit.rterm, var_ty, db_ty, app_ty),
        properties: lit.properties,
      })
      .collect();
    Clause::new(fresh_id, literals, self.properties, date)
  }
}

fn collect_free_vars(bank: &TermBank, term: TermId, seen: &mut eqsat_abs::NatSet, out: &mut Vec<VarId>) {
  if bank.is_ground(term) {
    return;
  }
  match bank.shape(term) {
    TermShape::FreeVar(v) => {
      if !seen.contains(v.0 as usize) {
        seen.insert(v.0 as usize);
        out.push(*v);
      }
    }
    TermShape::DbVar(_) => {}
    TermShape::App { args, .. } => {
      for &a in args.clone().iter() {
        collect_free_vars(bank, a, seen, out);
      }
    }
  }
}

/// `TermIsDefTerm`: `term` is `f(a1,..,an)` where every `ai` is a free variable and no two are
/// the same variable.
fn is_definition_term(bank: &TermBank, term: TermId) -> bool {
  match bank.shape(term) {
    TermShape::App { args, .. } => {
      let mut seen = eqsat_abs::NatSet::new();
      for &a in args.iter() {
        match bank.shape(a) {
          TermShape::FreeVar(v) => {
            if seen.contains(v.0 as usize) {
              return false;
            }
            seen.insert(v.0 as usize);
          }
          _ => return false,
        }
      }
      true
    }
    _ => false,
  }
}

fn head_code(bank: &TermBank, term: TermId) -> FunctionCode {
  match bank.shape(term) {
    TermShape::App { head, .. } => *head,
    _ => unreachable!("head_code called on a non-application definition term"),
  }
}

fn def_term_vars(bank: &TermBank, term: TermId) -> eqsat_abs::Set<VarId> {
  match bank.shape(term) {
    TermShape::App { args, .. } => args
      .iter()
      .map(|&a| match bank.shape(a) {
        TermShape::FreeVar(v) => *v,
        _ => unreachable!(),
      })
      .collect(),
    _ => Default::default(),
  }
}

/// `TermHasFCode`: `head` occurs anywhere in `term`.
fn term_has_head(bank: &TermBank, term: TermId, head: FunctionCode) -> bool {
  match bank.shape(term) {
    TermShape::App { head: h, args } => {
      *h == head || args.clone().iter().any(|&a| term_has_head(bank, a, head))
    }
    _ => false,
  }
}

fn no_vars_outside(bank: &TermBank, term: TermId, allowed: &eqsat_abs::Set<VarId>) -> bool {
  let mut seen = eqsat_abs::NatSet::new();
  let mut vars = Vec::new();
  collect_free_vars(bank, term, &mut seen, &mut vars);
  vars.iter().all(|v| allowed.contains(v))
}

fn skolemize_term(
  bank: &mut TermBank,
  sig: &mut Signature,
  term: TermId,
  fresh_for: &mut impl FnMut(&mut TermBank, &mut Signature, VarId, TypeId) -> TermId,
) -> TermId {
  if bank.is_ground(term) {
    return term;
  }
  match bank.shape(term).clone() {
    TermShape::FreeVar(v) => {
      let ty = bank.ty(term);
      fresh_for(bank, sig, v, ty)
    }
    TermShape::DbVar(_) => term,
    TermShape::App { head, args } => {
      let ty = bank.ty(term);
      let mut changed = false;
      let mut new_args = eqsat_abs::SmallVec::<[TermId; 4]>::with_capacity(args.len());
      for &a in &args {
        let replaced = skolemize_term(bank, sig, a, fresh_for);
        changed |= replaced != a;
        new_args.push(replaced);
      }
      if changed {
        bank.app(head, new_args, ty)
      } else {
        term
      }
    }
  }
}

fn rebuild_in(
  source: &TermBank,
  target: &mut TermBank,
  term: TermId,
  var_ty: impl Fn(VarId) -> TypeId + Copy,
  db_ty: impl Fn(crate::variable_bank::DbVarId) -> TypeId + Copy,
  app_ty: impl Fn(FunctionCode, &[TermId]) -> TypeId + Copy,
) -> TermId {
  match source.shape(term).clone() {
    TermShape::FreeVar(v) => target.free_var_term(v, var_ty(v)),
    TermShape::DbVar(v) => target.db_var_term(v, db_ty(v)),
    TermShape::App { head, args } => {
      let rebuilt: eqsat_abs::SmallVec<[TermId; 4]> =
        args.iter().map(|&a| rebuild_in(source, target, a, var_ty, db_ty, app_ty)).collect();
      let ty = app_ty(head, rebuilt.as_slice());
      target.app(head, rebuilt, ty)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::term::TermId;

  #[test]
  fn pos_neg_counts() {
    let clause = Clause::new(
      ClauseId(1),
      vec![Equation::positive(TermId(0), TermId(1)), Equation::negative(TermId(2), TermId(3))],
      ClauseProperty::Initial.into(),
      0,
    );
    assert_eq!(clause.pos_count(), 1);
    assert_eq!(clause.neg_count(), 1);
    assert!(!clause.is_empty_clause());
  }

  #[test]
  fn empty_clause_has_no_literals() {
    let clause = Clause::new(ClauseId(2), vec![], ClauseProperties::empty(), 0);
    assert!(clause.is_empty_clause());
  }

  #[test]
  fn new_canonicalizes_positives_first() {
    let clause = Clause::new(
      ClauseId(3),
      vec![Equation::negative(TermId(0), TermId(1)), Equation::positive(TermId(2), TermId(3))],
      ClauseProperties::empty(),
      0,
    );
    assert!(clause.literals[0].is_positive());
    assert!(clause.literals[1].is_negative());
  }

  #[test]
  fn canonicalize_is_a_stable_partition() {
    let mut clause = Clause::new(
      ClauseId(4),
      vec![
        Equation::positive(TermId(0), TermId(1)),
        Equation::negative(TermId(2), TermId(3)),
        Equation::positive(TermId(4), TermId(5)),
        Equation::negative(TermId(6), TermId(7)),
      ],
      ClauseProperties::empty(),
      0,
    );
    clause.canonicalize_literal_order();
    assert_eq!(
      clause.literals.iter().map(|l| l.lterm).collect::<Vec<_>>(),
      vec![TermId(0), TermId(4), TermId(2), TermId(6)]
    );
  }

  fn fixture() -> (TermBank, crate::types::TypeTable, Signature, VariableBank, TypeId) {
    let mut types = crate::types::TypeTable::new();
    let individual = types.individual();
    let sig = Signature::new(&mut types);
    let bank = TermBank::new(&mut types);
    (bank, types, sig, VariableBank::new(), individual)
  }

  #[test]
  fn reflexive_positive_literal_is_trivial() {
    let (mut bank, _types, mut sig, _vars, individual) = fixture();
    let trail = crate::trail::Trail::new();
    let a = sig.declare("a", 0, individual, Default::default()).unwrap();
    let a_term = bank.insert(
      &crate::term::Build::app(a, vec![]),
      crate::term::DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let clause = Clause::new(ClauseId(1), vec![Equation::positive(a_term, a_term)], ClauseProperties::empty(), 0);
    assert!(clause.is_trivial());
  }

  #[test]
  fn complementary_literals_are_trivial() {
    let (mut bank, _types, mut sig, _vars, individual) = fixture();
    let trail = crate::trail::Trail::new();
    let p = sig.declare("p", 0, individual, Default::default()).unwrap();
    let t = sig.declare("t", 0, individual, Default::default()).unwrap();
    let build = |bank: &mut TermBank, code| {
      bank.insert(&crate::term::Build::app(code, vec![]), crate::term::DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual)
    };
    let p_term = build(&mut bank, p);
    let t_term = build(&mut bank, t);
    let clause = Clause::new(
      ClauseId(1),
      vec![Equation::positive(p_term, t_term), Equation::negative(p_term, t_term)],
      ClauseProperties::empty(),
      0,
    );
    assert!(clause.is_trivial());
  }

  #[test]
  fn range_restriction_requires_negative_vars_covered_by_positive() {
    let (mut bank, _types, mut sig, mut vars, individual) = fixture();
    let trail = crate::trail::Trail::new();
    let p = sig.declare("p", 1, individual, Default::default()).unwrap();
    let q = sig.declare("q", 1, individual, Default::default()).unwrap();
    let x = vars.fresh(Bank::A, individual);
    let term = |bank: &mut TermBank, code, v: VarId| {
      bank.insert(
        &crate::term::Build::app(code, vec![crate::term::Build::var(v)]),
        crate::term::DerefType::Never,
        &trail,
        |_| individual,
        |_| individual,
        |_, _| individual,
      )
    };
    let px = term(&mut bank, p, x);
    let qx = term(&mut bank, q, x);
    let true_term = bank.true_term();

    let restricted = Clause::new(
      ClauseId(1),
      vec![Equation::positive(px, true_term), Equation::negative(qx, true_term)],
      ClauseProperties::empty(),
      0,
    );
    assert!(restricted.is_range_restricted(&bank));

    let unrestricted =
      Clause::new(ClauseId(2), vec![Equation::negative(qx, true_term)], ClauseProperties::empty(), 0);
    assert!(!unrestricted.is_range_restricted(&bank));
  }

  #[test]
  fn recognises_equality_definition_shape() {
    let (mut bank, _types, mut sig, mut vars, individual) = fixture();
    let trail = crate::trail::Trail::new();
    let f = sig.declare("f", 1, individual, Default::default()).unwrap();
    let c = sig.declare("c", 0, individual, Default::default()).unwrap();
    let x = vars.fresh(Bank::A, individual);
    let lhs = bank.insert(
      &crate::term::Build::app(f, vec![crate::term::Build::var(x)]),
      crate::term::DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let rhs = bank.insert(
      &crate::term::Build::app(c, vec![]),
      crate::term::DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let clause = Clause::new(ClauseId(1), vec![Equation::positive(lhs, rhs)], ClauseProperties::empty(), 0);
    assert_eq!(clause.equality_definition_side(&bank), Some(DefinitionSide::Left));
  }

  #[test]
  fn skolemize_replaces_every_free_variable() {
    let (mut bank, _types, mut sig, mut vars, individual) = fixture();
    let trail = crate::trail::Trail::new();
    let p = sig.declare("p", 1, individual, Default::default()).unwrap();
    let x = vars.fresh(Bank::A, individual);
    let px = bank.insert(
      &crate::term::Build::app(p, vec![crate::term::Build::var(x)]),
      crate::term::DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let true_term = bank.true_term();
    let mut clause = Clause::new(ClauseId(1), vec![Equation::positive(px, true_term)], ClauseProperties::empty(), 0);
    assert!(!clause.free_vars(&bank).is_empty());
    clause.skolemize(&mut bank, &mut sig);
    assert!(clause.free_vars(&bank).is_empty());
  }

  #[test]
  fn normalize_var_indices_gives_a_fresh_canonical_variable_set() {
    let (mut bank, _types, _sig, mut vars, individual) = fixture();
    let trail = crate::trail::Trail::new();
    let eq_code = crate::signature::reserved::EQUALITY;
    let x = vars.fresh(Bank::A, individual);
    let y = vars.fresh(Bank::A, individual);
    let xy = bank.insert(
      &crate::term::Build::app(eq_code, vec![crate::term::Build::var(x), crate::term::Build::var(y)]),
      crate::term::DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let true_term = bank.true_term();
    let mut clause = Clause::new(ClauseId(2), vec![Equation::positive(xy, true_term)], ClauseProperties::empty(), 0);
    let before = clause.free_vars(&bank);
    assert_eq!(before, vec![x, y]);
    clause.normalize_var_indices(&mut bank, &mut vars);
    let after = clause.free_vars(&bank);
    assert_eq!(after.len(), 2);
    assert_ne!(after, before);
  }
}
