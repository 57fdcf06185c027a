/*!

First-order unification and one-way matching on shared terms, grounded on the original
implementation's `cte_pattern_match_mgu.c` sibling routines for the non-lambda case (standard
Robinson unification/matching over a trail-backed substitution rather than the file's own
1-1 non-indexed routines, since here a binding is a trail push rather than a mutation of the term
cell itself — see [`crate::trail::Trail`]'s redesign note).

Both [`unify`] and `match_term` dereference free variables against the trail as they walk (a bound
variable is transparent to these routines: they always see through to its value), but leave it to
the caller to undo bindings on failure, exactly as [`crate::trail::Trail`]'s doc comment and spec
§7 describe.

*/

use crate::term::{TermBank, TermId, TermShape};
use crate::trail::Trail;
use crate::variable_bank::VarId;

/// Follows `term`'s binding chain (if it's a free variable) until reaching either an unbound
/// variable or a non-variable term.
pub fn deref(bank: &TermBank, trail: &Trail, term: TermId) -> TermId {
  let mut current = term;
  loop {
    let TermShape::FreeVar(v) = bank.shape(current) else { return current };
    match trail.value(*v) {
      Some(bound) => current = bound,
      None => return current,
    }
  }
}

/// `true` if the free variable `var` occurs anywhere in `term` once bindings are followed; used
/// by [`unify`]'s occurs-check and by [`super::pattern`]'s flex-rigid occurs-check.
pub(crate) fn occurs(bank: &TermBank, trail: &Trail, var: VarId, term: TermId) -> bool {
  let term = deref(bank, trail, term);
  match bank.shape(term) {
    TermShape::FreeVar(v) => *v == var,
    TermShape::DbVar(_) => false,
    TermShape::App { args, .. } => {
      let args = args.clone();
      args.iter().any(|&a| occurs(bank, trail, var, a))
    }
  }
}

fn bind(bank: &TermBank, trail: &mut Trail, var: VarId, var_term: TermId, value: TermId) -> bool {
  if bank.ty(var_term) != bank.ty(value) {
    return false;
  }
  if occurs(bank, trail, var, value) {
    return false;
  }
  trail.bind(var, value);
  true
}

/// Standard Robinson unification with occurs-check: extends `trail` in place and returns whether
/// `t1` and `t2` are unifiable. On failure the trail may already hold bindings pushed before the
/// failing subgoal; the caller restores to a mark taken before calling `unify`.
pub fn unify(bank: &TermBank, trail: &mut Trail, t1: TermId, t2: TermId) -> bool {
  let t1 = deref(bank, trail, t1);
  let t2 = deref(bank, trail, t2);
  if t1 == t2 {
    return true;
  }
  match (bank.shape(t1).clone(), bank.shape(t2).clone()) {
    (TermShape::FreeVar(v1), _) => bind(bank, trail, v1, t1, t2),
    (_, TermShape::FreeVar(v2)) => bind(bank, trail, v2, t2, t1),
    (TermShape::DbVar(d1), TermShape::DbVar(d2)) => d1 == d2,
    (TermShape::App { head: h1, args: a1 }, TermShape::App { head: h2, args: a2 }) => {
      h1 == h2 && a1.len() == a2.len() && a1.iter().zip(a2.iter()).all(|(&x, &y)| unify(bank, trail, x, y))
    }
    _ => false,
  }
}

/// One-way matching: `pattern`'s free variables may be bound; `term`'s are treated as rigid
/// (opaque) constants even if they happen to be bound on the trail from an unrelated earlier
/// step — matching never binds anything on the `term` side, matching spec §4.6's "pattern's
/// variables get bound; fails if a variable would need two different bindings".
pub fn match_term(bank: &TermBank, trail: &mut Trail, pattern: TermId, term: TermId) -> bool {
  let pattern = deref(bank, trail, pattern);
  match bank.shape(pattern).clone() {
    TermShape::FreeVar(v) => match trail.value(v) {
      Some(bound) => bound == term,
      None => {
        if bank.ty(pattern) != bank.ty(term) {
          return false;
        }
        trail.bind(v, term);
        true
      }
    },
    TermShape::DbVar(d) => matches!(bank.shape(term), TermShape::DbVar(d2) if d == *d2),
    TermShape::App { head: h1, args: a1 } => match bank.shape(term).clone() {
      TermShape::App { head: h2, args: a2 } if h1 == h2 && a1.len() == a2.len() => {
        a1.iter().zip(a2.iter()).all(|(&x, &y)| match_term(bank, trail, x, y))
      }
      _ => false,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::signature::Signature;
  use crate::term::{Build, DerefType};
  use crate::types::TypeTable;
  use crate::variable_bank::{Bank, VariableBank};

  struct Fixture {
    bank: TermBank,
    types: TypeTable,
    sig: Signature,
    vars: VariableBank,
    trail: Trail,
    individual: crate::types::TypeId,
  }

  fn fixture() -> Fixture {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let sig = Signature::new(&mut types);
    let bank = TermBank::new(&mut types);
    Fixture { bank, types, sig, vars: VariableBank::new(), trail: Trail::new(), individual }
  }

  impl Fixture {
    fn term(&mut self, raw: &Build) -> TermId {
      let individual = self.individual;
      self.bank.insert(raw, DerefType::Never, &self.trail, |_| individual, |_| individual, |_, _| individual)
    }
  }

  #[test]
  fn unify_binds_variable_to_matching_subterm() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 2, individual, Default::default()).unwrap();
    let g = fx.sig.declare("g", 1, individual, Default::default()).unwrap();
    let a = fx.sig.declare("a", 0, individual, Default::default()).unwrap();
    let x = fx.vars.fresh(Bank::A, individual);

    let t1 = fx.term(&Build::app(f, vec![Build::var(x), Build::app(g, vec![Build::var(x)])]));
    let t2 = fx.term(&Build::app(f, vec![Build::app(a, vec![]), Build::app(g, vec![Build::app(a, vec![])])]));

    let before = fx.trail.len();
    assert!(unify(&fx.bank, &mut fx.trail, t1, t2));
    assert_eq!(fx.trail.len() - before, 1);
    let a_term = fx.term(&Build::app(a, vec![]));
    assert_eq!(deref(&fx.bank, &fx.trail, fx.term(&Build::var(x))), a_term);
  }

  #[test]
  fn occurs_check_rejects_self_referential_binding() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 1, individual, Default::default()).unwrap();
    let x = fx.vars.fresh(Bank::A, individual);

    let xt = fx.term(&Build::var(x));
    let fxt = fx.term(&Build::app(f, vec![Build::var(x)]));

    let mark = fx.trail.mark();
    assert!(!unify(&fx.bank, &mut fx.trail, xt, fxt));
    fx.trail.backtrack_to(mark);
    assert!(fx.trail.is_empty());
  }

  #[test]
  fn match_never_binds_the_term_side() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 1, individual, Default::default()).unwrap();
    let y = fx.vars.fresh(Bank::A, individual);
    let x = fx.vars.fresh(Bank::A, individual);

    let pattern = fx.term(&Build::app(f, vec![Build::var(x)]));
    let term = fx.term(&Build::app(f, vec![Build::var(y)]));

    let mark = fx.trail.mark();
    assert!(match_term(&fx.bank, &mut fx.trail, pattern, term));
    let y_term = fx.term(&Build::var(y));
    assert_eq!(deref(&fx.bank, &fx.trail, fx.term(&Build::var(x))), y_term);
    assert!(!fx.trail.is_bound(y));
    fx.trail.backtrack_to(mark);
  }

  #[test]
  fn mismatched_head_fails() {
    let mut fx = fixture();
    let individual = fx.individual;
    let f = fx.sig.declare("f", 1, individual, Default::default()).unwrap();
    let g = fx.sig.declare("g", 1, individual, Default::default()).unwrap();
    let a = fx.sig.declare("a", 0, individual, Default::default()).unwrap();

    let t1 = fx.term(&Build::app(f, vec![Build::app(a, vec![])]));
    let t2 = fx.term(&Build::app(g, vec![Build::app(a, vec![])]));
    assert!(!unify(&fx.bank, &mut fx.trail, t1, t2));
  }
}
