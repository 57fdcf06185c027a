/*!

Explicit binding enumeration for the flex-rigid and flex-flex equations that fall outside the
higher-order pattern fragment ([`super::pattern`]): Huet-style imitation, projection, elimination,
and identification candidate generation, grounded on the shape of the original implementation's
`TERMS/cte_pattern_match_mgu.c` binding routines (`FreshVarWArgs`, `solve_flex_rigid`,
`eta_expand_otf`) carried over onto this crate's de Bruijn representation and hash-consed term
bank.

Unlike [`super::fixpoint`] and [`super::pattern`], which either settle an equation outright or
decline, this module only produces *candidates*: [`enumerate_bindings`] returns the terms a flex
variable could be bound to so that the resulting equation has a chance of being solved by further
unification elsewhere. Trying each candidate under its own trail mark, and backtracking to the
next one on failure, is the caller's iterative-deepening loop to drive, the same way
`solve_flex_rigid`'s caller drives the search in the original.

Four candidate kinds, per spec §4.6, each guarded by its own counter in [`Limits`]: *imitation*
(copy a rigid target's head), *projection* (apply one of the flex variable's own parameters),
*elimination* (drop one of the flex variable's own arguments), and *identification* (when the
target is itself a distinct flex head, introduce a shared fresh variable). Imitation and
projection apply to flex-rigid pairs; elimination applies regardless of the target's shape (it
only inspects the flex side); identification applies only when the target is flex.

*/

use eqsat_abs::SmallVec;

use crate::signature::{reserved, FunctionCode, Signature};
use crate::term::{TermBank, TermId, TermShape};
use crate::trail::Trail;
use crate::types::{TypeId, TypeTable};
use crate::variable_bank::{Bank, DbVariableBank, VarId, VariableBank};

use super::fo;

/// Per-candidate-kind budgets, standing in for the iterative-deepening driver that wraps
/// `solve_flex_rigid` in the original; made explicit, caller-tunable values here instead of
/// compiled-in constants. Each `max_*` field caps how many candidates of that kind a single
/// [`enumerate_bindings`] call may return; `0` disables the kind entirely. `max_depth` bounds the
/// overall branch depth the way it always has, independent of which kinds are still enabled at
/// that depth.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
  pub max_depth:          u32,
  pub max_imitation:      u32,
  pub max_projection:     u32,
  pub max_elimination:    u32,
  pub max_identification: u32,
}

impl Default for Limits {
  fn default() -> Self {
    Limits { max_depth: 4, max_imitation: 1, max_projection: 8, max_elimination: 4, max_identification: 1 }
  }
}

/// `head`'s argument types as imitation/projection need them: when the symbol's declared type's
/// own arity matches its signature arity, its argument types come straight off that arrow type;
/// a symbol declared with a bare result type (a shorthand some callers use when per-argument
/// sorts don't matter to them) falls back to `types.individual()` for every position.
fn arg_types_of(sig: &Signature, types: &TypeTable, head: FunctionCode) -> SmallVec<[TypeId; 4]> {
  let arity = sig.arity(head) as usize;
  let ty = sig.ty(head);
  if types.arity(ty) == arity {
    return SmallVec::from_slice(types.args(ty));
  }
  SmallVec::from_elem(types.individual(), arity)
}

/// `arg_types[0] → arg_types[1] → … → result_ty`, flattening `result_ty`'s own argument list onto
/// the end the way [`TypeTable::prepend_arg`] does one argument at a time.
fn full_arrow(types: &mut TypeTable, arg_types: &[TypeId], result_ty: TypeId) -> TypeId {
  let mut acc = result_ty;
  for &a in arg_types.iter().rev() {
    acc = types.prepend_arg(a, acc);
  }
  acc
}

/// A fresh metavariable of type `param_types -> result_ty`, applied to `params` (assumed to have
/// exactly `param_types`'s types, in order) so the value it stands for may depend on all of the
/// bound variable `var` ranges over. This is `H_j` in Huet's notation: one such metavariable per
/// residual argument position an imitation or projection head still needs.
fn fresh_applied(
  bank: &mut TermBank,
  vars: &mut VariableBank,
  types: &mut TypeTable,
  param_types: &[TypeId],
  params: &[TermId],
  result_ty: TypeId,
) -> TermId {
  let meta_ty = full_arrow(types, param_types, result_ty);
  let meta_var = vars.fresh(Bank::A, meta_ty);
  let meta_term = bank.free_var_term(meta_var, meta_ty);
  if params.is_empty() {
    return meta_term;
  }
  let mut spine: SmallVec<[TermId; 4]> = SmallVec::with_capacity(params.len() + 1);
  spine.push(meta_term);
  spine.extend_from_slice(params);
  bank.app_direct(reserved::PHONY_APP, spine, result_ty)
}

/// Wraps `body` in `arg_types.len()` nested lambdas, outermost first. `body` must already
/// reference parameter `i` (of type `arg_types[i]`) via the de Bruijn index
/// `arg_types.len() - 1 - i`, the index that survives unchanged regardless of how many further
/// outer binders get wrapped around it afterwards.
fn wrap_lambdas(bank: &mut TermBank, db_vars: &mut DbVariableBank, types: &mut TypeTable, arg_types: &[TypeId], body: TermId) -> TermId {
  let mut term = body;
  let mut ty = bank.ty(body);
  for &arg_ty in arg_types.iter().rev() {
    let db = db_vars.intern(arg_ty, 0);
    let db_term = bank.db_var_term(db, arg_ty);
    ty = types.prepend_arg(arg_ty, ty);
    term = bank.app_direct(reserved::LAMBDA, eqsat_abs::smallvec![db_term, term], ty);
  }
  term
}

/// The de Bruijn terms for `var`'s own `n` bound parameters, each already carrying the index it
/// keeps no matter how many more outer binders [`wrap_lambdas`] adds afterwards.
fn params_of(bank: &mut TermBank, db_vars: &mut DbVariableBank, arg_types: &[TypeId]) -> Vec<TermId> {
  let n = arg_types.len();
  (0..n)
    .map(|j| {
      let idx = (n - 1 - j) as u32;
      let d = db_vars.intern(arg_types[j], idx);
      bank.db_var_term(d, arg_types[j])
    })
    .collect()
}

/// A projection candidate for parameter `i`: `λ params. params[i] H_0(params) .. H_{k-1}(params)`,
/// where `k` is however many more arguments `params[i]`'s own type still needs to reach
/// `result_sort`. `None` if parameter `i`'s result sort doesn't match `result_sort` at all, Huet's
/// projection-applicability condition.
fn projection_candidate(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  arg_types: &[TypeId],
  params: &[TermId],
  result_sort: crate::types::SortId,
  i: usize,
) -> Option<TermId> {
  let pty = arg_types[i];
  if types.result_sort(pty) != result_sort {
    return None;
  }
  let extra: Vec<TypeId> = types.args(pty).to_vec();
  let head_term = params[i];
  let body = if extra.is_empty() {
    head_term
  } else {
    let mut spine: SmallVec<[TermId; 4]> = SmallVec::with_capacity(extra.len() + 1);
    spine.push(head_term);
    for &e in &extra {
      spine.push(fresh_applied(bank, vars, types, arg_types, params, e));
    }
    let result_ty = types.base(result_sort);
    bank.app_direct(reserved::PHONY_APP, spine, result_ty)
  };
  Some(wrap_lambdas(bank, db_vars, types, arg_types, body))
}

/// An imitation candidate for the rigid symbol `head`: `λ params. head(H_0(params), ..,
/// H_{m-1}(params))`, with one fresh metavariable per argument position `head` declares, each
/// free to depend on all of `params`.
fn imitation_candidate(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  sig: &Signature,
  arg_types: &[TypeId],
  params: &[TermId],
  head: FunctionCode,
) -> TermId {
  let head_arg_types = arg_types_of(sig, types, head);
  let head_result_sort = types.result_sort(sig.ty(head));
  let mut fresh_args: SmallVec<[TermId; 4]> = SmallVec::with_capacity(head_arg_types.len());
  for &a_ty in &head_arg_types {
    fresh_args.push(fresh_applied(bank, vars, types, arg_types, params, a_ty));
  }
  let body_ty = types.base(head_result_sort);
  let body = bank.app_direct(head, fresh_args, body_ty);
  wrap_lambdas(bank, db_vars, types, arg_types, body)
}

/// An elimination candidate dropping parameter `i`: `λ params. H(params without params[i])`, a
/// fresh metavariable of one fewer argument applied to every parameter except the dropped one.
/// `None` when `var` has no parameters to drop.
fn elimination_candidate(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  arg_types: &[TypeId],
  params: &[TermId],
  result_sort: crate::types::SortId,
  i: usize,
) -> Option<TermId> {
  if arg_types.is_empty() {
    return None;
  }
  let remaining_types: SmallVec<[TypeId; 4]> =
    arg_types.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, &t)| t).collect();
  let remaining_params: SmallVec<[TermId; 4]> =
    params.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, &p)| p).collect();
  let body_ty = types.base(result_sort);
  let body = fresh_applied(bank, vars, types, &remaining_types, &remaining_params, body_ty);
  Some(wrap_lambdas(bank, db_vars, types, arg_types, body))
}

/// An identification candidate: `var` and the distinct flex variable at `target`'s head cannot
/// both keep their own identity, so both get bound (eventually, by further search) to the same
/// fresh variable `H`. This call only produces `var`'s half — `λ params. H(params)` — the shared
/// head each is free to depend on the whole of its own parameter list; unifying the resulting
/// term against `target` is what forces `target`'s own flex head toward the matching binding.
fn identification_candidate(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  vars: &mut VariableBank,
  arg_types: &[TypeId],
  params: &[TermId],
  result_sort: crate::types::SortId,
) -> TermId {
  let body_ty = types.base(result_sort);
  let body = fresh_applied(bank, vars, types, arg_types, params, body_ty);
  wrap_lambdas(bank, db_vars, types, arg_types, body)
}

/// `Some(var)` if `term` (assumed already WHNF'd) is a free variable, alone or applied to a
/// spine, dereferencing its own head through the trail — the same flex/rigid split
/// [`super::pattern::decompose`] makes, reduced down to just the variable identity since this
/// module only needs to tell "distinct flex head" from "rigid", not the spine's shape.
fn flex_head(bank: &TermBank, trail: &Trail, term: TermId) -> Option<VarId> {
  match bank.shape(term).clone() {
    TermShape::FreeVar(v) => Some(v),
    TermShape::App { head, args } if head == reserved::PHONY_APP => {
      let resolved_head = fo::deref(bank, trail, args[0]);
      match bank.shape(resolved_head) {
        TermShape::FreeVar(v) => Some(*v),
        _ => None,
      }
    }
    _ => None,
  }
}

/// Enumerates candidate bindings for the flex variable `var` against the term `target` (already
/// normalised to WHNF and eta-reduced by the caller, the same precondition
/// [`super::fixpoint::fixpoint_unify`] and [`super::pattern::pattern_unify`] place on their own
/// inputs). Produces, in order and each capped by its own counter in `limits`: projection
/// candidates (one per parameter of `var`'s own type whose result sort matches `target`'s),
/// imitation candidates (one, when `target`'s head is an ordinary rigid symbol rather than a
/// variable or a lambda), elimination candidates (one per argument `var` could drop), and
/// identification candidates (one, when `target`'s own head is a free variable distinct from
/// `var`). Returns nothing once `depth` has reached `limits.max_depth`, so a caller driving
/// iterative deepening eventually runs out of branches to try rather than recursing forever.
pub fn enumerate_bindings(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &mut TypeTable,
  sig: &Signature,
  vars: &mut VariableBank,
  trail: &Trail,
  var: VarId,
  target: TermId,
  depth: u32,
  limits: &Limits,
) -> Vec<TermId> {
  if depth >= limits.max_depth {
    return Vec::new();
  }

  let var_ty = vars.ty(var);
  let arg_types: SmallVec<[TypeId; 4]> = SmallVec::from_slice(types.args(var_ty));
  let result_sort = types.result_sort(var_ty);
  let params = params_of(bank, db_vars, &arg_types);

  let mut out = Vec::new();

  let mut projections = 0;
  for i in 0..arg_types.len() {
    if projections >= limits.max_projection {
      break;
    }
    if let Some(candidate) = projection_candidate(bank, db_vars, types, vars, &arg_types, &params, result_sort, i) {
      out.push(candidate);
      projections += 1;
    }
  }

  if limits.max_imitation > 0 {
    if let TermShape::App { head, .. } = bank.shape(target).clone() {
      if head != reserved::PHONY_APP && head != reserved::LAMBDA {
        out.push(imitation_candidate(bank, db_vars, types, vars, sig, &arg_types, &params, head));
      }
    }
  }

  let mut eliminations = 0;
  for i in 0..arg_types.len() {
    if eliminations >= limits.max_elimination {
      break;
    }
    if let Some(candidate) = elimination_candidate(bank, db_vars, types, vars, &arg_types, &params, result_sort, i) {
      out.push(candidate);
      eliminations += 1;
    }
  }

  if limits.max_identification > 0 {
    if let Some(target_var) = flex_head(bank, trail, target) {
      if target_var != var {
        out.push(identification_candidate(bank, db_vars, types, vars, &arg_types, &params, result_sort));
      }
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::term::{Build, DerefType};

  struct Fixture {
    bank: TermBank,
    types: TypeTable,
    sig: Signature,
    vars: VariableBank,
    db_vars: DbVariableBank,
    trail: Trail,
    individual: TypeId,
  }

  fn fixture() -> Fixture {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let sig = Signature::new(&mut types);
    let bank = TermBank::new(&mut types);
    Fixture { bank, types, sig, vars: VariableBank::new(), db_vars: DbVariableBank::new(), trail: Trail::new(), individual }
  }

  impl Fixture {
    fn term(&mut self, raw: &Build) -> TermId {
      let individual = self.individual;
      self.bank.insert(raw, DerefType::Never, &self.trail, |_| individual, |_| individual, |_, _| individual)
    }
  }

  #[test]
  fn projection_and_imitation_candidates_cover_matching_parameters_and_rigid_head() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 1, individual, Default::default()).unwrap();
    let a = fx.sig.declare("a", 0, individual, Default::default()).unwrap();
    let at = fx.term(&Build::app(a, vec![]));
    let target = fx.term(&Build::app(f, vec![at]));

    let binary = fx.types.arrow(&[individual, individual], crate::types::SortId::INDIVIDUAL);
    let var = fx.vars.fresh(Bank::A, binary);

    let limits = Limits::default();
    let candidates = enumerate_bindings(
      &mut fx.bank, &mut fx.db_vars, &mut fx.types, &fx.sig, &mut fx.vars, &fx.trail, var, target, 0, &limits,
    );

    // Two projections (both parameters are individual, matching the result sort), one imitation
    // of `f`, and two eliminations (one per argument dropped); no identification, since `target`
    // is rigid, not flex.
    assert_eq!(candidates.len(), 5);
    for &c in &candidates {
      assert_eq!(fx.bank.ty(c), binary);
      assert!(fx.bank.cell(c).is_lambda());
    }
  }

  #[test]
  fn projection_skips_parameters_with_a_different_result_sort() {
    let mut fx = fixture();
    let individual = fx.individual;
    let bool_ty = fx.types.bool();
    let f = fx.sig.declare("f", 0, individual, Default::default()).unwrap();
    let target = fx.term(&Build::app(f, vec![]));

    let ty = fx.types.arrow(&[bool_ty], crate::types::SortId::INDIVIDUAL);
    let var = fx.vars.fresh(Bank::A, ty);

    let limits = Limits::default();
    let candidates = enumerate_bindings(
      &mut fx.bank, &mut fx.db_vars, &mut fx.types, &fx.sig, &mut fx.vars, &fx.trail, var, target, 0, &limits,
    );

    // The one parameter has sort $o, the result sort is $i: no projection applies, leaving the
    // imitation of `f` plus one elimination (dropping the sole argument).
    assert_eq!(candidates.len(), 2);
  }

  #[test]
  fn elimination_drops_one_argument_per_candidate() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 0, individual, Default::default()).unwrap();
    let target = fx.term(&Build::app(f, vec![]));

    let ternary = fx.types.arrow(&[individual, individual, individual], crate::types::SortId::INDIVIDUAL);
    let var = fx.vars.fresh(Bank::A, ternary);

    let limits = Limits { max_projection: 0, max_imitation: 0, max_identification: 0, ..Limits::default() };
    let candidates = enumerate_bindings(
      &mut fx.bank, &mut fx.db_vars, &mut fx.types, &fx.sig, &mut fx.vars, &fx.trail, var, target, 0, &limits,
    );

    // One elimination candidate per argument of the ternary flex variable.
    assert_eq!(candidates.len(), 3);
    for &c in &candidates {
      assert_eq!(fx.bank.ty(c), ternary);
      assert!(fx.bank.cell(c).is_lambda());
    }
  }

  #[test]
  fn elimination_is_capped_by_its_own_limit() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 0, individual, Default::default()).unwrap();
    let target = fx.term(&Build::app(f, vec![]));

    let ternary = fx.types.arrow(&[individual, individual, individual], crate::types::SortId::INDIVIDUAL);
    let var = fx.vars.fresh(Bank::A, ternary);

    let limits =
      Limits { max_projection: 0, max_imitation: 0, max_identification: 0, max_elimination: 1, ..Limits::default() };
    let candidates = enumerate_bindings(
      &mut fx.bank, &mut fx.db_vars, &mut fx.types, &fx.sig, &mut fx.vars, &fx.trail, var, target, 0, &limits,
    );
    assert_eq!(candidates.len(), 1);
  }

  #[test]
  fn identification_fires_only_against_a_distinct_flex_head() {
    let mut fx = fixture();
    let individual = fx.individual;
    let unary = fx.types.arrow(&[individual], crate::types::SortId::INDIVIDUAL);
    let var = fx.vars.fresh(Bank::A, unary);
    let other = fx.vars.fresh(Bank::A, unary);
    let other_term =
      fx.bank.insert(&Build::var(other), DerefType::Never, &fx.trail, |_| unary, |_| individual, |_, _| individual);

    let limits =
      Limits { max_projection: 0, max_imitation: 0, max_elimination: 0, max_identification: 1, ..Limits::default() };
    let candidates = enumerate_bindings(
      &mut fx.bank, &mut fx.db_vars, &mut fx.types, &fx.sig, &mut fx.vars, &fx.trail, var, other_term, 0, &limits,
    );
    assert_eq!(candidates.len(), 1);
    assert!(fx.bank.cell(candidates[0]).is_lambda());

    // Against its own flex term, no identification candidate is produced (there's no distinct
    // head to identify `var` with).
    let var_term =
      fx.bank.insert(&Build::var(var), DerefType::Never, &fx.trail, |_| unary, |_| individual, |_, _| individual);
    let candidates_self = enumerate_bindings(
      &mut fx.bank, &mut fx.db_vars, &mut fx.types, &fx.sig, &mut fx.vars, &fx.trail, var, var_term, 0, &limits,
    );
    assert!(candidates_self.is_empty());
  }

  #[test]
  fn depth_at_the_limit_yields_no_candidates() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 0, individual, Default::default()).unwrap();
    let target = fx.term(&Build::app(f, vec![]));
    let var = fx.vars.fresh(Bank::A, individual);

    let limits = Limits { max_depth: 2, ..Default::default() };
    let candidates = enumerate_bindings(
      &mut fx.bank, &mut fx.db_vars, &mut fx.types, &fx.sig, &mut fx.vars, &fx.trail, var, target, 2, &limits,
    );
    assert!(candidates.is_empty());
  }
}
