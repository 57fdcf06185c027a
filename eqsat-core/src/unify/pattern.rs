/*!

The Miller higher-order pattern fragment: unification where every flex (free-variable) head is
applied only to a spine of pairwise-distinct bound variables. Within this fragment an MGU always
exists and is computable without search; outside it a caller falls back to [`super::fixpoint`]'s
cheap oracle or, failing that, [`super::enumerate`]'s explicit binding search, exactly as spec §4.6
describes the fallback chain.

Grounded on the shape of the original implementation's `TERMS/cte_pattern_match_mgu.c`
(`solve_flex_rigid`, `flex_flex_diff`, `flex_flex_same`) but scoped down to the sub-case that
source's own pattern check admits most often in practice: a flex spine of de Bruijn-bound
variables rather than the fuller `db_var_map`/`PruneLambdaPrefix` machinery that also prunes
flex-headed subterms inside the rigid side. A rigid side that itself needs pruning (a flex
occurrence buried under an unrelated binder) is reported [`FragmentStatus::NotInFragment`] here
rather than solved, handing it to [`super::enumerate`].

*/

use eqsat_abs::{HashMap, SmallVec};

use crate::lambda;
use crate::signature::reserved;
use crate::term::{TermBank, TermId, TermShape};
use crate::trail::Trail;
use crate::types::TypeTable;
use crate::variable_bank::{Bank, DbVariableBank, VarId, VariableBank};

use super::fo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentStatus {
  Solved,
  Failed,
  NotInFragment,
}

impl super::MaybeInFragment for FragmentStatus {
  fn not_in_fragment(&self) -> bool {
    matches!(self, FragmentStatus::NotInFragment)
  }
}

enum Decomp {
  /// An unbound free variable applied (possibly zero times) to `spine`.
  Flex { var: VarId, spine: SmallVec<[TermId; 4]> },
  Other(TermId),
}

fn decompose(bank: &TermBank, trail: &Trail, term: TermId) -> Decomp {
  match bank.shape(term).clone() {
    // A WHNF'd term's own head is never a bound variable ([`lambda::whnf_step`] chases those away),
    // so reaching `FreeVar` here means `var` is genuinely unbound.
    TermShape::FreeVar(v) => Decomp::Flex { var: v, spine: SmallVec::new() },
    TermShape::App { head, args } if head == reserved::PHONY_APP => {
      let resolved_head = fo::deref(bank, trail, args[0]);
      if let TermShape::FreeVar(v) = *bank.shape(resolved_head) {
        return Decomp::Flex { var: v, spine: args[1..].into() };
      }
      Decomp::Other(term)
    }
    _ => Decomp::Other(term),
  }
}

/// The de Bruijn index of each spine element, or `None` if an element isn't a bound variable or
/// the spine repeats an index (not a pattern).
fn spine_indices(bank: &TermBank, db_vars: &DbVariableBank, spine: &[TermId]) -> Option<Vec<u32>> {
  let mut seen = Vec::with_capacity(spine.len());
  for &a in spine {
    let TermShape::DbVar(d) = bank.shape(a) else { return None };
    let idx = db_vars.index(*d);
    if seen.contains(&idx) {
      return None;
    }
    seen.push(idx);
  }
  Some(seen)
}

/// Renames every ambient loose de Bruijn index (one at or above `local_depth`, i.e. not bound by a
/// lambda introduced while descending into `term` itself) to its position in the new binder
/// sequence `build_lambda_solution` wraps `term` in. `None` means `term` mentions an ambient
/// variable outside `map` — this oracle declines rather than prune it away.
fn remap(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  term: TermId,
  local_depth: u32,
  map: &HashMap<u32, u32>,
  spine_len: u32,
) -> Option<TermId> {
  if !bank.has_loose_db(term) {
    return Some(term);
  }
  match bank.shape(term).clone() {
    TermShape::FreeVar(_) => Some(term),
    TermShape::DbVar(d) => {
      let idx = db_vars.index(d);
      if idx < local_depth {
        return Some(term);
      }
      let ambient = idx - local_depth;
      let position = *map.get(&ambient)?;
      let new_ambient = spine_len - 1 - position;
      let ty = db_vars.ty(d);
      let new_var = db_vars.intern(ty, local_depth + new_ambient);
      Some(bank.db_var_term(new_var, ty))
    }
    TermShape::App { head, args } => {
      let ty = bank.ty(term);
      let inner_depth = if head == reserved::LAMBDA { local_depth + 1 } else { local_depth };
      let mut new_args: SmallVec<[TermId; 4]> = SmallVec::with_capacity(args.len());
      for (i, &a) in args.iter().enumerate() {
        let d = if head == reserved::LAMBDA && i == 1 { inner_depth } else { local_depth };
        new_args.push(remap(bank, db_vars, a, d, map, spine_len)?);
      }
      Some(bank.app_direct(head, new_args, ty))
    }
  }
}

/// Builds `λy0 .. y(n-1). body'`, where `body'` is `body` with every ambient reference to
/// `spine[j]` renamed to the fresh binder introduced for position `j`. Returns `None` if `body`
/// mentions an ambient bound variable not present in `spine`.
fn build_lambda_solution(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  body: TermId,
  spine: &[TermId],
  indices: &[u32],
) -> Option<TermId> {
  let map: HashMap<u32, u32> = indices.iter().enumerate().map(|(j, &idx)| (idx, j as u32)).collect();
  let remapped = remap(bank, db_vars, body, 0, &map, spine.len() as u32)?;

  let mut current = remapped;
  let mut current_ty = bank.ty(remapped);
  for &s in spine.iter().rev() {
    let TermShape::DbVar(d) = bank.shape(s).clone() else { unreachable!("spine elements are bound variables") };
    let arg_ty = db_vars.ty(d);
    let placeholder_var = db_vars.intern(arg_ty, 0);
    let placeholder = bank.db_var_term(placeholder_var, arg_ty);
    let lambda_ty = types.prepend_arg(arg_ty, current_ty);
    current = bank.app_direct(reserved::LAMBDA, eqsat_abs::smallvec![placeholder, current], lambda_ty);
    current_ty = lambda_ty;
  }
  Some(current)
}

fn flex_rigid(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  trail: &mut Trail,
  var: VarId,
  spine: &[TermId],
  rigid: TermId,
) -> FragmentStatus {
  let Some(indices) = spine_indices(bank, db_vars, spine) else { return FragmentStatus::NotInFragment };
  if fo::occurs(bank, trail, var, rigid) {
    return FragmentStatus::Failed;
  }
  match build_lambda_solution(bank, db_vars, types, rigid, spine, &indices) {
    Some(solution) => {
      trail.bind(var, solution);
      FragmentStatus::Solved
    }
    None => FragmentStatus::NotInFragment,
  }
}

/// `F x1 .. xn =? F y1 .. yn`, same flex head: standard pruning keeps only the positions where the
/// two spines name the same bound variable, rebinding `F` to a fresh variable `H` of the reduced
/// arity applied to the surviving binders.
fn flex_flex_same(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  trail: &mut Trail,
  var: VarId,
  s1: &[TermId],
  s2: &[TermId],
) -> FragmentStatus {
  if s1.len() != s2.len() {
    return FragmentStatus::NotInFragment;
  }
  let (Some(i1), Some(i2)) = (spine_indices(bank, db_vars, s1), spine_indices(bank, db_vars, s2)) else {
    return FragmentStatus::NotInFragment;
  };
  let kept: Vec<usize> = (0..s1.len()).filter(|&i| i1[i] == i2[i]).collect();
  if kept.len() == s1.len() {
    return FragmentStatus::Solved;
  }

  let result_sort = types.result_sort(vars.ty(var));
  let arg_types: Vec<crate::types::TypeId> = kept.iter().map(|&i| bank.ty(s1[i])).collect();
  let fresh_ty = types.arrow(&arg_types, result_sort);
  let fresh = vars.fresh(Bank::A, fresh_ty);
  let fresh_term = bank.insert(
    &crate::term::Build::var(fresh),
    crate::term::DerefType::Never,
    trail,
    |_| fresh_ty,
    |_| fresh_ty,
    |_, _| fresh_ty,
  );

  let kept_spine: Vec<TermId> = kept.iter().map(|&i| s1[i]).collect();
  let applied = apply_spine(bank, types, fresh_term, &kept_spine);
  match build_lambda_solution(bank, db_vars, types, applied, s1, &i1) {
    Some(solution) => {
      trail.bind(var, solution);
      FragmentStatus::Solved
    }
    None => FragmentStatus::NotInFragment,
  }
}

/// `F x1 .. xm =? G y1 .. yn`, distinct flex heads: both get pruned down to the bound variables
/// they share, by position-independent membership (not pointwise, since the two spines needn't be
/// the same length) and bound to a common fresh variable `H` applied to that shared set.
fn flex_flex_diff(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  trail: &mut Trail,
  v1: VarId,
  s1: &[TermId],
  v2: VarId,
  s2: &[TermId],
) -> FragmentStatus {
  let (Some(i1), Some(i2)) = (spine_indices(bank, db_vars, s1), spine_indices(bank, db_vars, s2)) else {
    return FragmentStatus::NotInFragment;
  };

  let shared: Vec<u32> = i1.iter().copied().filter(|idx| i2.contains(idx)).collect();
  let shared_spine: Vec<TermId> = shared
    .iter()
    .map(|idx| s1[i1.iter().position(|x| x == idx).unwrap()])
    .collect();

  let kept1: Vec<usize> = (0..s1.len()).filter(|&i| shared.contains(&i1[i])).collect();
  let kept2: Vec<usize> = (0..s2.len()).filter(|&i| shared.contains(&i2[i])).collect();

  let result_sort = types.result_sort(vars.ty(v1));
  let arg_types: Vec<crate::types::TypeId> = shared_spine.iter().map(|&s| bank.ty(s)).collect();
  let fresh_ty = types.arrow(&arg_types, result_sort);
  let fresh = vars.fresh(Bank::A, fresh_ty);
  let fresh_term = bank.insert(
    &crate::term::Build::var(fresh),
    crate::term::DerefType::Never,
    trail,
    |_| fresh_ty,
    |_| fresh_ty,
    |_, _| fresh_ty,
  );

  let applied1 = apply_spine(bank, types, fresh_term, &kept1.iter().map(|&i| s1[i]).collect::<Vec<_>>());
  let applied2 = apply_spine(bank, types, fresh_term, &kept2.iter().map(|&i| s2[i]).collect::<Vec<_>>());

  let Some(sol1) = build_lambda_solution(bank, db_vars, types, applied1, s1, &i1) else { return FragmentStatus::NotInFragment };
  let Some(sol2) = build_lambda_solution(bank, db_vars, types, applied2, s2, &i2) else { return FragmentStatus::NotInFragment };

  trail.bind(v1, sol1);
  trail.bind(v2, sol2);
  FragmentStatus::Solved
}

/// Applies `head` (of arrow type `arg0 -> .. -> argN-1 -> result_sort`) to every element of
/// `spine` at once, as a single flattened phony application (matching the bank's own phony-app
/// flattening invariant), computing the fully-applied result type by peeling one argument per
/// spine element.
fn apply_spine(bank: &mut TermBank, types: &mut TypeTable, head: TermId, spine: &[TermId]) -> TermId {
  if spine.is_empty() {
    return head;
  }
  let mut ty = bank.ty(head);
  for _ in spine {
    ty = types.result_after_one_arg(ty);
  }
  let mut args: SmallVec<[TermId; 4]> = SmallVec::with_capacity(spine.len() + 1);
  args.push(head);
  args.extend_from_slice(spine);
  bank.app_direct(reserved::PHONY_APP, args, ty)
}

/// Decomposes a rigid/rigid pair per spec §4.6 ("rigid/rigid with equal heads: decompose; push
/// corresponding argument pairs; fail if head arities/types disagree"): equal applicative heads
/// recurse argument-by-argument through `solve`, equal de Bruijn indices succeed outright, anything
/// else (including an arity/head mismatch) fails. A descendant pair that itself isn't in the
/// fragment propagates `NotInFragment` rather than being silently treated as a failure.
fn rigid_rigid(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  trail: &mut Trail,
  t1: TermId,
  t2: TermId,
  solve: impl Fn(&mut TermBank, &mut DbVariableBank, &mut TypeTable, &mut VariableBank, &mut Trail, TermId, TermId) -> FragmentStatus + Copy,
) -> FragmentStatus {
  match (bank.shape(t1).clone(), bank.shape(t2).clone()) {
    (TermShape::DbVar(d1), TermShape::DbVar(d2)) => {
      if d1 == d2 {
        FragmentStatus::Solved
      } else {
        FragmentStatus::Failed
      }
    }
    (TermShape::App { head: h1, args: a1 }, TermShape::App { head: h2, args: a2 }) => {
      if h1 != h2 || a1.len() != a2.len() {
        return FragmentStatus::Failed;
      }
      for (&x, &y) in a1.iter().zip(a2.iter()) {
        match solve(bank, db_vars, types, vars, trail, x, y) {
          FragmentStatus::Solved => continue,
          other => return other,
        }
      }
      FragmentStatus::Solved
    }
    _ => FragmentStatus::Failed,
  }
}

/// Attempts to solve `t1 =? t2` within the pattern fragment. Both sides are brought to WHNF first
/// (never under binders, matching the rest of this crate's weak-head convention); a caller that
/// needs a fuller normal form should normalize before calling, as [`super::fixpoint`] does.
pub fn pattern_unify(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  trail: &mut Trail,
  t1: TermId,
  t2: TermId,
) -> FragmentStatus {
  let t1 = lambda::whnf_deref(bank, db_vars, trail, t1);
  let t2 = lambda::whnf_deref(bank, db_vars, trail, t2);
  if t1 == t2 {
    return FragmentStatus::Solved;
  }

  match (decompose(bank, trail, t1), decompose(bank, trail, t2)) {
    (Decomp::Flex { var: v1, spine: s1 }, Decomp::Flex { var: v2, spine: s2 }) if v1 == v2 => {
      flex_flex_same(bank, db_vars, types, vars, trail, v1, &s1, &s2)
    }
    (Decomp::Flex { var: v1, spine: s1 }, Decomp::Flex { var: v2, spine: s2 }) => {
      flex_flex_diff(bank, db_vars, types, vars, trail, v1, &s1, v2, &s2)
    }
    (Decomp::Flex { var, spine }, Decomp::Other(_)) => flex_rigid(bank, db_vars, types, trail, var, &spine, t2),
    (Decomp::Other(_), Decomp::Flex { var, spine }) => flex_rigid(bank, db_vars, types, trail, var, &spine, t1),
    (Decomp::Other(_), Decomp::Other(_)) => rigid_rigid(bank, db_vars, types, vars, trail, t1, t2, pattern_unify),
  }
}

/// One-way variant of [`pattern_unify`]: only `t1` ("pattern")'s flex heads may be bound; a flex
/// head surfacing on the `t2` ("term") side is treated as rigid (opaque), matching [`fo::match_term`]'s
/// convention that the term side is never written to. Rigid/rigid decomposition recurses through
/// `pattern_match` on both sides so a flex pattern nested in an argument position still gets bound.
pub fn pattern_match(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  trail: &mut Trail,
  t1: TermId,
  t2: TermId,
) -> FragmentStatus {
  let t1 = lambda::whnf_deref(bank, db_vars, trail, t1);
  let t2 = lambda::whnf_deref(bank, db_vars, trail, t2);
  if t1 == t2 {
    return FragmentStatus::Solved;
  }

  match decompose(bank, trail, t1) {
    Decomp::Flex { var, spine } => flex_rigid(bank, db_vars, types, trail, var, &spine, t2),
    Decomp::Other(_) => {
      if let Decomp::Flex { .. } = decompose(bank, trail, t2) {
        return FragmentStatus::Failed;
      }
      rigid_rigid(bank, db_vars, types, vars, trail, t1, t2, pattern_match)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::signature::Signature;
  use crate::term::{Build, DerefType};
  use crate::types::TypeTable;

  struct Fixture {
    bank: TermBank,
    types: TypeTable,
    sig: Signature,
    db_vars: DbVariableBank,
    vars: VariableBank,
    trail: Trail,
    individual: crate::types::TypeId,
  }

  fn fixture() -> Fixture {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let sig = Signature::new(&mut types);
    let bank = TermBank::new(&mut types);
    Fixture { bank, types, sig, db_vars: DbVariableBank::new(), vars: VariableBank::new(), trail: Trail::new(), individual }
  }

  #[test]
  fn flex_rigid_with_single_bound_variable_spine_solves() {
    let mut fx = fixture();
    let individual = fx.individual;
    let unary = fx.types.arrow(&[individual], fx.types.result_sort(individual));
    let f = fx.vars.fresh(Bank::A, unary);
    let f_term = fx.bank.insert(&Build::var(f), DerefType::Never, &fx.trail, |_| unary, |_| individual, |_, _| individual);

    let c = fx.sig.declare("c", 0, individual, Default::default()).unwrap();
    let c_term = fx.bank.app_direct(c, SmallVec::new(), individual);

    let db0 = fx.db_vars.intern(individual, 0);
    let db0_term = fx.bank.db_var_term(db0, individual);
    // F x  =?  c     (x bound by an ambient lambda we simulate directly at depth 0)
    let lhs = fx.bank.app_direct(reserved::PHONY_APP, eqsat_abs::smallvec![f_term, db0_term], individual);

    let status = pattern_unify(&mut fx.bank, &mut fx.db_vars, &mut fx.types, &mut fx.vars, &mut fx.trail, lhs, c_term);
    assert_eq!(status, FragmentStatus::Solved);
    assert!(fx.trail.is_bound(f));
  }

  #[test]
  fn flex_rigid_fails_occurs_check() {
    let mut fx = fixture();
    let individual = fx.individual;
    let unary = fx.types.arrow(&[individual], fx.types.result_sort(individual));
    let f = fx.vars.fresh(Bank::A, unary);
    let f_term = fx.bank.insert(&Build::var(f), DerefType::Never, &fx.trail, |_| unary, |_| individual, |_, _| individual);

    let g = fx.sig.declare("g", 1, individual, Default::default()).unwrap();
    let db0 = fx.db_vars.intern(individual, 0);
    let db0_term = fx.bank.db_var_term(db0, individual);
    let lhs = fx.bank.app_direct(reserved::PHONY_APP, eqsat_abs::smallvec![f_term, db0_term], individual);
    let rhs = fx.bank.app_direct(g, eqsat_abs::smallvec![f_term], individual);

    let status = pattern_unify(&mut fx.bank, &mut fx.db_vars, &mut fx.types, &mut fx.vars, &mut fx.trail, lhs, rhs);
    assert_eq!(status, FragmentStatus::Failed);
    assert!(!fx.trail.is_bound(f));
  }

  #[test]
  fn rigid_rigid_distinct_heads_fails() {
    let mut fx = fixture();
    let individual = fx.individual;
    let c = fx.sig.declare("c", 0, individual, Default::default()).unwrap();
    let d = fx.sig.declare("d", 0, individual, Default::default()).unwrap();
    let c_term = fx.bank.app_direct(c, SmallVec::new(), individual);
    let d_term = fx.bank.app_direct(d, SmallVec::new(), individual);

    let status = pattern_unify(&mut fx.bank, &mut fx.db_vars, &mut fx.types, &mut fx.vars, &mut fx.trail, c_term, d_term);
    assert_eq!(status, FragmentStatus::Failed);
  }

  #[test]
  fn rigid_rigid_equal_heads_recurses_into_flex_argument() {
    let mut fx = fixture();
    let individual = fx.individual;
    let unary = fx.types.arrow(&[individual], fx.types.result_sort(individual));
    let f = fx.vars.fresh(Bank::A, unary);
    let f_term = fx.bank.insert(&Build::var(f), DerefType::Never, &fx.trail, |_| unary, |_| individual, |_, _| individual);

    let c = fx.sig.declare("c", 0, individual, Default::default()).unwrap();
    let c_term = fx.bank.app_direct(c, SmallVec::new(), individual);
    let g = fx.sig.declare("g", 1, individual, Default::default()).unwrap();
    let lhs = fx.bank.app_direct(g, eqsat_abs::smallvec![f_term], individual);
    let rhs = fx.bank.app_direct(g, eqsat_abs::smallvec![c_term], individual);

    let status = pattern_unify(&mut fx.bank, &mut fx.db_vars, &mut fx.types, &mut fx.vars, &mut fx.trail, lhs, rhs);
    assert_eq!(status, FragmentStatus::Solved);
    assert_eq!(fx.trail.value(f), Some(c_term));
  }

  #[test]
  fn pattern_match_binds_only_the_pattern_side() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.vars.fresh(Bank::A, individual);
    let f_term = fx.bank.insert(&Build::var(f), DerefType::Never, &fx.trail, |_| individual, |_| individual, |_, _| individual);
    let c = fx.sig.declare("c", 0, individual, Default::default()).unwrap();
    let c_term = fx.bank.app_direct(c, SmallVec::new(), individual);

    let status = pattern_match(&mut fx.bank, &mut fx.db_vars, &mut fx.types, &mut fx.vars, &mut fx.trail, f_term, c_term);
    assert_eq!(status, FragmentStatus::Solved);
    assert_eq!(fx.trail.value(f), Some(c_term));
  }

  #[test]
  fn pattern_match_never_binds_the_term_sides_variable() {
    let mut fx = fixture();
    let individual = fx.individual;
    let c = fx.sig.declare("c", 0, individual, Default::default()).unwrap();
    let c_term = fx.bank.app_direct(c, SmallVec::new(), individual);
    let t = fx.vars.fresh(Bank::A, individual);
    let t_term = fx.bank.insert(&Build::var(t), DerefType::Never, &fx.trail, |_| individual, |_| individual, |_, _| individual);

    let status = pattern_match(&mut fx.bank, &mut fx.db_vars, &mut fx.types, &mut fx.vars, &mut fx.trail, c_term, t_term);
    assert_eq!(status, FragmentStatus::Failed);
    assert!(!fx.trail.is_bound(t));
  }
}
