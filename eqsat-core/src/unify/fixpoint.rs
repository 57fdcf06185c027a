/*!

The fixpoint oracle: a cheap sufficient test for unifiability between two (possibly
higher-order) terms that binds a variable only in the trivial case, ported line-for-line from the
original implementation's `TERMS/cte_fixpoint_unif.c` (`SubstComputeFixpointMgu`/
`rigid_path_check`/`rigid_path_check_args`), onto this crate's de Bruijn term representation and
trail-backed bindings.

*/

use crate::lambda;
use crate::term::{TermBank, TermId, TermShape};
use crate::trail::Trail;
use crate::types::TypeTable;
use crate::variable_bank::{DbVariableBank, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixpointStatus {
  Unifiable,
  NotUnifiable,
  NotInFragment,
}

impl super::MaybeInFragment for FixpointStatus {
  fn not_in_fragment(&self) -> bool {
    matches!(self, FixpointStatus::NotInFragment)
  }
}

/// Descends `t2` (already WHNF'd) looking for `var`. `has_pref` tracks whether the path crossed a
/// lambda prefix; `under_var` tracks whether it crossed a variable-headed (flex) application.
/// Ported from `rigid_path_check`: a rigid occurrence of `var` fails unification outright; an
/// occurrence only reachable through a flex head or under a lambda's binder is merely outside this
/// oracle's fragment, not a proof of non-unifiability.
fn rigid_path_check(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &TypeTable,
  trail: &Trail,
  var: VarId,
  t2: TermId,
  has_pref: bool,
  under_var: bool,
  depth: u32,
) -> FixpointStatus {
  let t2 = lambda::whnf_deref(bank, db_vars, trail, t2);
  match bank.shape(t2).clone() {
    TermShape::App { head, args } if head == crate::signature::reserved::PHONY_APP => {
      let applied_head = args[0];
      match bank.shape(applied_head) {
        TermShape::FreeVar(v) if *v == var => {
          if under_var || has_pref {
            FixpointStatus::NotInFragment
          } else {
            FixpointStatus::NotUnifiable
          }
        }
        TermShape::FreeVar(_) => {
          rigid_path_check_args(bank, db_vars, types, trail, var, &args[1..], has_pref, true, depth)
        }
        // The bank's phony-application invariant guarantees the head is always a free variable
        // or a lambda (a rigid head gets flattened at insertion); a lambda head here means a
        // whnf_deref step should already have reduced it away, so this branch is unreachable.
        _ => {
          crate::error::invariant!(false, "phony application head neither a variable nor reduced");
          unreachable!()
        }
      }
    }
    TermShape::FreeVar(v) => {
      if v == var {
        if under_var || !types.is_base(bank.ty(t2)) {
          FixpointStatus::NotInFragment
        } else {
          FixpointStatus::NotUnifiable
        }
      } else {
        FixpointStatus::Unifiable
      }
    }
    TermShape::App { head, args } if head == crate::signature::reserved::LAMBDA => {
      let mut body = args[1];
      let mut next_depth = depth + 1;
      loop {
        let whnf_body = lambda::whnf_deref(bank, db_vars, trail, body);
        if let TermShape::App { head: h2, args: a2 } = bank.shape(whnf_body).clone() {
          if h2 == crate::signature::reserved::LAMBDA {
            body = a2[1];
            next_depth += 1;
            continue;
          }
        }
        body = whnf_body;
        break;
      }
      rigid_path_check(bank, db_vars, types, trail, var, body, has_pref, under_var, next_depth)
    }
    TermShape::DbVar(d) => {
      if db_vars.index(d) >= depth {
        if under_var {
          FixpointStatus::NotInFragment
        } else {
          FixpointStatus::NotUnifiable
        }
      } else {
        FixpointStatus::Unifiable
      }
    }
    TermShape::App { args, .. } => {
      rigid_path_check_args(bank, db_vars, types, trail, var, &args, has_pref, under_var, depth)
    }
  }
}

fn rigid_path_check_args(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &TypeTable,
  trail: &Trail,
  var: VarId,
  args: &[TermId],
  has_pref: bool,
  under_var: bool,
  depth: u32,
) -> FixpointStatus {
  for &a in args {
    match rigid_path_check(bank, db_vars, types, trail, var, a, has_pref, under_var, depth) {
      FixpointStatus::Unifiable => continue,
      other => return other,
    }
  }
  FixpointStatus::Unifiable
}

/// Normalises both sides to WHNF + full eta-reduction, then: two free variables unify by binding
/// one to the other; a free variable against a rigid term unifies iff `rigid_path_check` finds no
/// occurrence of the variable along a rigid path; two rigid terms are always outside this
/// oracle's fragment (this oracle never decomposes rigid structure, only checks variable-side
/// shortcuts — a caller escalates to [`super::pattern`] or [`super::enumerate`] for that).
pub fn fixpoint_unify(
  bank: &mut TermBank,
  db_vars: &mut DbVariableBank,
  types: &TypeTable,
  trail: &mut Trail,
  t1: TermId,
  t2: TermId,
) -> FixpointStatus {
  let t1 = lambda::eta_reduce_full(bank, db_vars, lambda::whnf_deref(bank, db_vars, trail, t1));
  let t2 = lambda::eta_reduce_full(bank, db_vars, lambda::whnf_deref(bank, db_vars, trail, t2));

  match (bank.shape(t1).clone(), bank.shape(t2).clone()) {
    (TermShape::FreeVar(v1), TermShape::FreeVar(v2)) => {
      if v1 != v2 {
        trail.bind(v1, t2);
      }
      FixpointStatus::Unifiable
    }
    (TermShape::FreeVar(v), _) => {
      let has_pref = bank.cell(t2).is_lambda();
      let res = rigid_path_check(bank, db_vars, types, trail, v, t2, has_pref, false, 0);
      if res == FixpointStatus::Unifiable {
        trail.bind(v, t2);
      }
      res
    }
    (_, TermShape::FreeVar(v)) => {
      let has_pref = bank.cell(t1).is_lambda();
      let res = rigid_path_check(bank, db_vars, types, trail, v, t1, has_pref, false, 0);
      if res == FixpointStatus::Unifiable {
        trail.bind(v, t1);
      }
      res
    }
    _ => FixpointStatus::NotInFragment,
  }
}
