/*!

The ordering control block: the opaque interface inference code calls back into whenever it needs
the reduction ordering spec §6 describes ("Ordering callbacks (`OCB`): opaque to the core; the
core calls `compare(t1, t2) -> {<, =, >, ⊥}` whenever it needs the reduction ordering"). The term
and clause engine never picks an ordering itself (KBO/LPO selection is strategy-layer territory,
out of scope per spec §1); it only ever consults one through this trait.

*/

use std::cmp::Ordering;

use eqsat_abs::PartialOrdering;

use crate::term::{TermBank, TermId};

/// `compare` returns `None` for `⊥` (incomparable), matching
/// [`eqsat_abs::partial_ordering::PartialOrdering`]'s `Option<Ordering>` convention so call sites
/// read the same way `std::cmp::PartialOrd` does, while still allowing a true "incomparable"
/// result distinct from "equal".
pub trait Ocb {
  fn compare(&self, bank: &TermBank, t1: TermId, t2: TermId) -> Option<Ordering>;

  /// `true` if `t1`'s orientation strictly dominates `t2`'s under this ordering, i.e.
  /// `compare(t1, t2) == Greater`. A convenience used by equation orientation
  /// (see [`crate::equation::Equation`]) so call sites don't match on `Option<Ordering>` by hand.
  fn greater(&self, bank: &TermBank, t1: TermId, t2: TermId) -> bool {
    self.compare(bank, t1, t2) == PartialOrdering::Greater
  }
}

/// A size-based ordering usable as a placeholder [`Ocb`] in tests and for any caller that hasn't
/// wired in a real reduction ordering yet: compares by [`crate::term::TermBank::weight`], falling
/// back to [`crate::term::TermId`]'s raw index to break ties so that `compare` is still a total
/// (not just partial) order on any two distinct shared terms with equal weight. Not a real
/// reduction ordering (it isn't even stable under substitution) and must never be used by actual
/// inference code, only by tests that need *some* `Ocb` to exercise equation/clause ordering.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightOcb;

impl Ocb for WeightOcb {
  fn compare(&self, bank: &TermBank, t1: TermId, t2: TermId) -> Option<Ordering> {
    if t1 == t2 {
      return PartialOrdering::Equal;
    }
    let (w1, w2) = (bank.weight(t1), bank.weight(t2));
    if w1 != w2 {
      return PartialOrdering::from_ordering(w1.cmp(&w2));
    }
    PartialOrdering::from_ordering(t1.0.cmp(&t2.0))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::term::{Build, DerefType};
  use crate::trail::Trail;
  use crate::types::TypeTable;

  #[test]
  fn weight_ocb_orders_by_term_weight() {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let mut sig = crate::signature::Signature::new(&mut types);
    let mut bank = crate::term::TermBank::new(&mut types);
    let trail = Trail::new();
    let c = sig.declare("c", 0, individual, Default::default()).unwrap();
    let f = sig.declare("f", 1, individual, Default::default()).unwrap();

    let c_term = bank.insert(&Build::app(c, vec![]), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);
    let fc_term = bank.insert(&Build::app(f, vec![Build::app(c, vec![])]), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);

    assert!(WeightOcb.greater(&bank, fc_term, c_term));
    assert_eq!(WeightOcb.compare(&bank, c_term, c_term), PartialOrdering::Equal);
  }
}
