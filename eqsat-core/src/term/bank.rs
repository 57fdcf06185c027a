/*!

The term bank: a single owning arena of [`TermCell`]s, hash-consed so that structurally equal
terms share one [`TermId`], generalized from the teacher's `core/hash_cons_set.rs` /
`core/term_bag.rs` pairing (a consing table plus the owning storage it points into) onto a plain
`Vec`-backed arena instead of the teacher's raw-pointer `DagNodeCore` allocator — see the
redesign note on cyclic owning structures in `SPEC_FULL.md` §10.

Binding is intentionally absent from this module: a bound variable's value lives in
[`crate::trail::Trail`], never on the (shared) cell. `insert*` methods take an already-built
[`Build`] tree (the caller's transient, unshared representation) and return a canonical,
already-shared [`TermId`], dereferencing free variables against a trail as directed by
[`DerefType`].

*/

use eqsat_abs::HashMap;

use crate::error::invariant;
use crate::signature::{reserved, FunctionCode};
use crate::trail::Trail;
use crate::types::TypeId;
use crate::variable_bank::{DbVarId, VarId};

use super::cell::{TermCell, TermId, TermShape};

/// A caller-constructed, not-yet-shared term tree, the input to [`TermBank::insert`] and its
/// variants. Every leaf already names an interned [`VarId`]/[`DbVarId`]/[`FunctionCode`]; only
/// the tree shape itself is unshared.
#[derive(Debug, Clone)]
pub enum Build {
  Var(VarId),
  Db(DbVarId),
  App(FunctionCode, Vec<Build>),
}

impl Build {
  pub fn var(v: VarId) -> Self {
    Build::Var(v)
  }

  pub fn db(v: DbVarId) -> Self {
    Build::Db(v)
  }

  pub fn app(head: FunctionCode, args: Vec<Build>) -> Self {
    Build::App(head, args)
  }
}

/// Controls how far a free variable's binding is followed while a [`Build`] tree is being shared
/// into the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerefType {
  /// Follow the binding chain until an unbound variable or a non-variable term is reached.
  Always,
  /// Follow exactly one binding, if any.
  Once,
  /// Never consult the trail; a bound variable is inserted as itself.
  Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ShapeKey {
  head: FunctionCode,
  args: eqsat_abs::SmallVec<[TermId; 4]>,
}

#[derive(Debug)]
pub struct TermBank {
  cells: Vec<TermCell>,
  shape_index: HashMap<ShapeKey, TermId>,
  free_var_terms: HashMap<VarId, TermId>,
  db_var_terms: HashMap<DbVarId, TermId>,

  roots: Vec<TermId>,

  true_term:  TermId,
  false_term: TermId,

  /// Cache for [`Self::min_term`], keyed by type so each type gets exactly one designated
  /// minimal constant.
  min_terms: HashMap<TypeId, TermId>,
}

/// Per-symbol weight used by the default term-weight ordering, mirroring E's
/// `DEFAULT_FWEIGHT`/`DEFAULT_VWEIGHT` constants from `cte_termbanks.h`.
pub const DEFAULT_VWEIGHT: u32 = 1;
pub const DEFAULT_FWEIGHT: u32 = 2;

impl TermBank {
  pub fn new(types: &mut crate::types::TypeTable) -> Self {
    let bool_ty = types.bool();
    let mut bank = TermBank {
      cells: Vec::new(),
      shape_index: HashMap::new(),
      free_var_terms: HashMap::new(),
      db_var_terms: HashMap::new(),
      roots: Vec::new(),
      true_term: TermId(0),
      false_term: TermId(0),
      min_terms: HashMap::new(),
    };
    bank.true_term = bank.intern_app(reserved::TRUE, eqsat_abs::SmallVec::new(), bool_ty);
    bank.false_term = bank.intern_app(reserved::FALSE, eqsat_abs::SmallVec::new(), bool_ty);
    bank
  }

  pub fn true_term(&self) -> TermId {
    self.true_term
  }

  pub fn false_term(&self) -> TermId {
    self.false_term
  }

  pub fn cell(&self, term: TermId) -> &TermCell {
    &self.cells[term.0 as usize]
  }

  pub fn shape(&self, term: TermId) -> &TermShape {
    &self.cells[term.0 as usize].shape
  }

  pub fn ty(&self, term: TermId) -> TypeId {
    self.cells[term.0 as usize].ty
  }

  pub fn is_ground(&self, term: TermId) -> bool {
    self.cells[term.0 as usize].is_ground
  }

  pub fn weight(&self, term: TermId) -> u32 {
    self.cells[term.0 as usize].weight
  }

  pub fn has_loose_db(&self, term: TermId) -> bool {
    self.cells[term.0 as usize].has_loose_db
  }

  fn intern_app(
    &mut self,
    head: FunctionCode,
    args: eqsat_abs::SmallVec<[TermId; 4]>,
    ty: TypeId,
  ) -> TermId {
    let key = ShapeKey { head, args: args.clone() };
    if let Some(&id) = self.shape_index.get(&key) {
      return id;
    }

    let is_ground = args.iter().all(|a| self.cells[a.0 as usize].is_ground);
    let var_occurrences: u32 = args.iter().map(|a| self.cells[a.0 as usize].var_occurrences).sum();
    let has_loose_db = if head == reserved::LAMBDA {
      // The bound variable at index 0 is consumed by this binder; only indices >= 1 in the body
      // (shifted down) would remain loose, but we track looseness pre-shift at the body itself,
      // so a lambda is "has loose db" iff its body still mentions db1+ before this binder peels
      // off db0. Conservatively: a lambda's own looseness (relevant to an *enclosing* binder) is
      // whether the body has any loose db index at all once this binder's own db0 is discounted;
      // we approximate by deferring to `lambda::has_loose_db_above` at call sites that need the
      // precise shifted count and just record "body mentions some bound variable" here.
      args.iter().any(|a| self.cells[a.0 as usize].has_loose_db)
    } else {
      args.iter().any(|a| self.cells[a.0 as usize].has_loose_db)
    };
    let weight = DEFAULT_FWEIGHT + args.iter().map(|a| self.cells[a.0 as usize].weight).sum::<u32>();

    let cell = TermCell {
      shape: TermShape::App { head, args },
      ty,
      weight,
      var_occurrences,
      is_ground,
      has_loose_db,
      whnf_cache: std::cell::Cell::new(None),
      beta_nf_cache: std::cell::Cell::new(None),
      mark: std::cell::Cell::new(false),
    };
    let id = TermId(self.cells.len() as u32);
    self.cells.push(cell);
    self.shape_index.insert(key, id);
    id
  }

  /// Shares the function application `head(args)` directly, bypassing [`Self::insert`]'s
  /// deref-walk over a [`Build`] tree; used by the lambda normalizer and unifier, which already
  /// hold already-shared [`TermId`] children.
  pub fn app_direct(&mut self, head: FunctionCode, args: eqsat_abs::SmallVec<[TermId; 4]>, ty: TypeId) -> TermId {
    self.app(head, args, ty)
  }

  /// The shared term for the free variable `var`, creating it if this is the first mention.
  pub fn free_var_term(&mut self, var: VarId, ty: TypeId) -> TermId {
    self.intern_free_var(var, ty)
  }

  /// The shared term for the de Bruijn variable `var`, creating it if this is the first mention.
  pub fn db_var_term(&mut self, var: DbVarId, ty: TypeId) -> TermId {
    self.intern_db_var(var, ty)
  }

  fn intern_free_var(&mut self, var: VarId, ty: TypeId) -> TermId {
    if let Some(&id) = self.free_var_terms.get(&var) {
      return id;
    }
    let cell = TermCell {
      shape: TermShape::FreeVar(var),
      ty,
      weight: DEFAULT_VWEIGHT,
      var_occurrences: 1,
      is_ground: false,
      has_loose_db: false,
      whnf_cache: std::cell::Cell::new(None),
      beta_nf_cache: std::cell::Cell::new(None),
      mark: std::cell::Cell::new(false),
    };
    let id = TermId(self.cells.len() as u32);
    self.cells.push(cell);
    self.free_var_terms.insert(var, id);
    id
  }

  fn intern_db_var(&mut self, var: DbVarId, ty: TypeId) -> TermId {
    if let Some(&id) = self.db_var_terms.get(&var) {
      return id;
    }
    let cell = TermCell {
      shape: TermShape::DbVar(var),
      ty,
      weight: DEFAULT_VWEIGHT,
      var_occurrences: 0,
      is_ground: true,
      has_loose_db: true,
      whnf_cache: std::cell::Cell::new(None),
      beta_nf_cache: std::cell::Cell::new(None),
      mark: std::cell::Cell::new(false),
    };
    let id = TermId(self.cells.len() as u32);
    self.cells.push(cell);
    self.db_var_terms.insert(var, id);
    id
  }

  /// Shares `raw` into the bank, dereferencing free variables against `trail` per `deref`.
  /// `var_types`/`db_types` supply each leaf's type (the caller already knows it, e.g. from a
  /// [`crate::variable_bank::VariableBank`]); application types are read from `sig_ty`.
  pub fn insert(
    &mut self,
    raw: &Build,
    deref: DerefType,
    trail: &Trail,
    var_ty: impl Fn(VarId) -> TypeId + Copy,
    db_ty: impl Fn(DbVarId) -> TypeId + Copy,
    app_ty: impl Fn(FunctionCode, &[TermId]) -> TypeId + Copy,
  ) -> TermId {
    match raw {

      Build::Db(v) => self.intern_db_var(*v, db_ty(*v)),

      Build::Var(v) => {
        let ty = var_ty(*v);
        match deref {
          DerefType::Never => self.intern_free_var(*v, ty),
          DerefType::Once => match trail.value(*v) {
            Some(bound) => bound,
            None => self.intern_free_var(*v, ty),
          },
          DerefType::Always => {
            let mut current = *v;
            loop {
              match trail.value(current) {
                Some(bound) => {
                  if let TermShape::FreeVar(next) = self.shape(bound) {
                    current = *next;
                    continue;
                  }
                  return bound;
                }
                None => return self.intern_free_var(current, var_ty(current)),
              }
            }
          }
        }
      }

      Build::App(head, args) => {
        let shared: eqsat_abs::SmallVec<[TermId; 4]> = args
          .iter()
          .map(|a| self.insert(a, deref, trail, var_ty, db_ty, app_ty))
          .collect();
        let ty = app_ty(*head, shared.as_slice());
        self.app(*head, shared, ty)
      }

    }
  }

  /// Builds (or finds) the application `head(args)`. If `head` is the phony-application head and
  /// `args[0]` is itself already a phony application or a rigid (non-variable, non-lambda) term,
  /// flattens/rejects as the redesign note on phony-application normal form requires: a phony
  /// application never settles on a rigid head in the bank.
  pub fn app(&mut self, head: FunctionCode, args: eqsat_abs::SmallVec<[TermId; 4]>, ty: TypeId) -> TermId {
    if head == reserved::PHONY_APP {
      invariant!(!args.is_empty(), "phony application with no head argument");
      let inner_head = args[0];
      match self.shape(inner_head) {
        TermShape::FreeVar(_) => {}
        TermShape::App { head: inner_code, .. } if *inner_code == reserved::LAMBDA => {}
        TermShape::App { head: inner_code, args: inner_args } => {
          // Rigid head: flatten into a single ordinary application instead of nesting phony-apps.
          let inner_code = *inner_code;
          let mut flattened = inner_args.clone();
          flattened.extend(args.into_iter().skip(1));
          return self.intern_app(inner_code, flattened, ty);
        }
        TermShape::DbVar(_) => {
          invariant!(false, "phony application headed by a loose de Bruijn variable");
        }
      }
    }
    self.intern_app(head, args, ty)
  }

  /// Finds an already-shared term matching `raw` without inserting anything new; `None` if no
  /// such term has been shared yet. Free variable leaves are looked up directly (never derefed),
  /// matching the teacher's `find` convention of operating on already-canonical pieces.
  pub fn find(&self, raw: &Build) -> Option<TermId> {
    match raw {
      Build::Var(v) => self.free_var_terms.get(v).copied(),
      Build::Db(v) => self.db_var_terms.get(v).copied(),
      Build::App(head, args) => {
        let mut shared = eqsat_abs::SmallVec::<[TermId; 4]>::new();
        for a in args {
          shared.push(self.find(a)?);
        }
        let key = ShapeKey { head: *head, args: shared };
        self.shape_index.get(&key).copied()
      }
    }
  }

  /// Replaces every occurrence of `old` within `term` with `new`, sharing the result. Identity
  /// on subtrees that don't contain `old`.
  pub fn insert_repl(&mut self, term: TermId, old: TermId, new: TermId) -> TermId {
    if term == old {
      return new;
    }
    let (head, args) = match self.shape(term) {
      TermShape::App { head, args } => (*head, args.clone()),
      _ => return term,
    };
    let mut changed = false;
    let mut new_args = eqsat_abs::SmallVec::<[TermId; 4]>::with_capacity(args.len());
    for a in &args {
      let replaced = self.insert_repl(*a, old, new);
      changed |= replaced != *a;
      new_args.push(replaced);
    }
    if !changed {
      return term;
    }
    let ty = self.ty(term);
    self.app(head, new_args, ty)
  }

  /// [`Self::insert`], documented separately because spec §4.2 names it as a distinct variant
  /// ("clear new-cell properties"). Every piece of per-cell metadata this bank tracks (`weight`,
  /// `var_occurrences`, `is_ground`, `has_loose_db`) is a pure function of a cell's shape and its
  /// already-shared children, recomputed identically regardless of which path shared the cell;
  /// there is no separate, independently-settable property bitset on [`super::cell::TermCell`]
  /// for a "no properties" variant to actually clear (unlike [`crate::equation::Equation`]'s or
  /// [`crate::clause::Clause`]'s bitsets, which *do* carry caller-set state). So this is a plain
  /// alias kept as its own entry point for call sites that want to say, at the call site, "I
  /// don't care about any property-merging semantics" even though there happens to be none to
  /// merge. See `DESIGN.md`.
  pub fn insert_no_props(
    &mut self,
    raw: &Build,
    deref: DerefType,
    trail: &Trail,
    var_ty: impl Fn(VarId) -> TypeId + Copy,
    db_ty: impl Fn(DbVarId) -> TypeId + Copy,
    app_ty: impl Fn(FunctionCode, &[TermId]) -> TypeId + Copy,
  ) -> TermId {
    self.insert(raw, deref, trail, var_ty, db_ty, app_ty)
  }

  /// Applies the substitution recorded on `trail` to the already-shared term `term`, re-sharing
  /// only the subterms that actually change. A ground subterm is returned unchanged without
  /// descending into it at all (spec §4.2: "insert_opt ... exploit the fact that every proper
  /// subterm is already shared (so ground terms are returned unchanged)"), which is exactly the
  /// short-circuit [`Self::is_ground`] exists to make cheap.
  pub fn insert_opt(&mut self, term: TermId, trail: &Trail) -> TermId {
    if self.is_ground(term) {
      return term;
    }
    match self.shape(term).clone() {
      TermShape::FreeVar(v) => match trail.value(v) {
        Some(bound) => self.insert_opt(bound, trail),
        None => term,
      },
      TermShape::DbVar(_) => term,
      TermShape::App { head, args } => {
        let ty = self.ty(term);
        let mut changed = false;
        let mut new_args = eqsat_abs::SmallVec::<[TermId; 4]>::with_capacity(args.len());
        for &a in &args {
          let replaced = self.insert_opt(a, trail);
          changed |= replaced != a;
          new_args.push(replaced);
        }
        if changed {
          self.app(head, new_args, ty)
        } else {
          term
        }
      }
    }
  }

  /// [`Self::insert_opt`] under an explicit substitution map rather than the live trail, for
  /// callers instantiating a stored clause/equation's variables (e.g. a demodulator's matched
  /// left-hand side) without first pushing bindings onto the trail at all.
  pub fn insert_instantiated(&mut self, term: TermId, subst: &HashMap<VarId, TermId>) -> TermId {
    if self.is_ground(term) {
      return term;
    }
    match self.shape(term).clone() {
      TermShape::FreeVar(v) => subst.get(&v).copied().unwrap_or(term),
      TermShape::DbVar(_) => term,
      TermShape::App { head, args } => {
        let ty = self.ty(term);
        let mut changed = false;
        let mut new_args = eqsat_abs::SmallVec::<[TermId; 4]>::with_capacity(args.len());
        for &a in &args {
          let replaced = self.insert_instantiated(a, subst);
          changed |= replaced != a;
          new_args.push(replaced);
        }
        if changed {
          self.app(head, new_args, ty)
        } else {
          term
        }
      }
    }
  }

  /// Re-shares `term` with every free variable renamed to the *other* variable bank (same
  /// ordinal, opposite [`crate::variable_bank::Bank`]), producing a copy guaranteed
  /// variable-disjoint from the original without walking a fresh-variable map (spec §4.2:
  /// "rename variables by parity to produce a variable-disjoint copy"). Ground subterms are
  /// returned unchanged. `rename` maps a variable in its current bank to its disjoint
  /// counterpart; callers typically supply [`crate::variable_bank::VariableBank::assert`] flipped
  /// to the other bank at the same ordinal.
  pub fn insert_disjoint(&mut self, term: TermId, rename: &mut impl FnMut(VarId) -> VarId) -> TermId {
    if self.is_ground(term) {
      return term;
    }
    match self.shape(term).clone() {
      TermShape::FreeVar(v) => {
        let renamed = rename(v);
        let ty = self.ty(term);
        self.free_var_term(renamed, ty)
      }
      TermShape::DbVar(_) => term,
      TermShape::App { head, args } => {
        let ty = self.ty(term);
        let mut changed = false;
        let mut new_args = eqsat_abs::SmallVec::<[TermId; 4]>::with_capacity(args.len());
        for &a in &args {
          let replaced = self.insert_disjoint(a, rename);
          changed |= replaced != a;
          new_args.push(replaced);
        }
        if changed {
          self.app(head, new_args, ty)
        } else {
          term
        }
      }
    }
  }

  /// Idempotently creates (or returns the cached) designated "small" ground term of type `ty`,
  /// used as the default right-hand side instantiation for a variable a rewrite needs to
  /// eliminate but whose value is otherwise unconstrained (spec §4.2 `create_min_term`). The
  /// first call for a given `ty` declares a fresh nullary constant in `sig` named distinctly from
  /// any user symbol and caches the resulting term; later calls for the same `ty` return the
  /// cached term without touching `sig` again.
  pub fn min_term(&mut self, ty: TypeId, sig: &mut crate::signature::Signature) -> TermId {
    if let Some(&id) = self.min_terms.get(&ty) {
      return id;
    }
    let code = sig.declare(format!("#min_{}", ty.0), 0, ty, Default::default())
      .expect("freshly minted min-term name cannot conflict");
    let id = self.intern_app(code, eqsat_abs::SmallVec::new(), ty);
    self.min_terms.insert(ty, id);
    id
  }

  /// Registers `term` as a GC root: it and everything reachable from it survive [`Self::sweep`]
  /// until [`Self::unregister_root`] is called with the same id. Mirrors the teacher's
  /// `RootContainer` concept, redesigned onto arena indices instead of an intrusive linked list
  /// of raw pointers.
  pub fn register_root(&mut self, term: TermId) {
    self.roots.push(term);
  }

  pub fn unregister_root(&mut self, term: TermId) {
    if let Some(pos) = self.roots.iter().rposition(|&t| t == term) {
      self.roots.remove(pos);
    }
  }

  fn mark(&self, term: TermId) {
    let cell = &self.cells[term.0 as usize];
    if cell.mark.get() {
      return;
    }
    cell.mark.set(true);
    if let TermShape::App { args, .. } = &cell.shape {
      for a in args.clone() {
        self.mark(a);
      }
    }
  }

  /// Marks every registered root (plus `$true`/`$false`, every cached [`Self::min_term`], and
  /// any additional `extra_roots`, such as terms currently bound on the trail or sitting in a
  /// clause set) and reclaims every application cell that wasn't reached, clearing their
  /// `shape_index` entries and invalidating their WHNF/β-normal-form caches (spec §4.5: "the bank
  /// clears caches when it sweeps"). Free and de Bruijn variable cells are never reclaimed: their
  /// population is bounded by the signature's/db-bank's variable supply, not by term-construction
  /// churn. Returns the number of application cells reclaimed this sweep.
  pub fn sweep(&mut self, extra_roots: impl IntoIterator<Item = TermId>) -> usize {
    for cell in &self.cells {
      cell.mark.set(false);
    }
    self.mark(self.true_term);
    self.mark(self.false_term);
    for &root in &self.roots {
      self.mark(root);
    }
    for &min in self.min_terms.values() {
      self.mark(min);
    }
    for root in extra_roots {
      self.mark(root);
    }

    let before = self.shape_index.len();
    self.shape_index.retain(|_, &mut id| self.cells[id.0 as usize].mark.get());
    let freed = before - self.shape_index.len();

    for cell in &self.cells {
      if !cell.mark.get() {
        cell.whnf_cache.set(None);
        cell.beta_nf_cache.set(None);
      }
    }

    freed
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::TypeTable;
  use crate::variable_bank::{Bank, VariableBank};

  fn fresh_bank() -> (TermBank, TypeTable, VariableBank) {
    let mut types = TypeTable::new();
    let bank = TermBank::new(&mut types);
    let vars = VariableBank::new();
    (bank, types, vars)
  }

  #[test]
  fn hash_consing_shares_identical_applications() {
    let (mut bank, mut types, mut vars) = fresh_bank();
    let individual = types.individual();
    let f = crate::signature::Signature::new(&mut types).declare("f", 1, individual, Default::default()).unwrap();
    let x = vars.fresh(Bank::A, individual);
    let trail = Trail::new();

    let raw = Build::app(f, vec![Build::var(x)]);
    let t1 = bank.insert(&raw, DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);
    let t2 = bank.insert(&raw, DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);
    assert_eq!(t1, t2);
  }

  #[test]
  fn distinct_free_variables_are_distinct_terms() {
    let (mut bank, mut types, mut vars) = fresh_bank();
    let individual = types.individual();
    let x = vars.fresh(Bank::A, individual);
    let y = vars.fresh(Bank::A, individual);
    let tx = bank.insert(&Build::var(x), DerefType::Never, &Trail::new(), |_| individual, |_| individual, |_, _| individual);
    let ty_ = bank.insert(&Build::var(y), DerefType::Never, &Trail::new(), |_| individual, |_| individual, |_, _| individual);
    assert_ne!(tx, ty_);
  }

  #[test]
  fn sweep_reclaims_unreachable_application() {
    let (mut bank, mut types, mut vars) = fresh_bank();
    let individual = types.individual();
    let f = crate::signature::Signature::new(&mut types).declare("f", 1, individual, Default::default()).unwrap();
    let x = vars.fresh(Bank::A, individual);
    let trail = Trail::new();
    let raw = Build::app(f, vec![Build::var(x)]);
    let before = bank.find(&raw);
    assert!(before.is_none());
    let t1 = bank.insert(&raw, DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);
    assert!(bank.find(&raw).is_some());

    bank.sweep(std::iter::empty());
    // t1 was never registered as a root and no longer reachable from $true/$false.
    assert!(bank.find(&raw).is_none());
    let _ = t1;
  }
}
