/*!

Equations (literals): a signed equality `lterm ≈ rterm` (or `lterm ≉ rterm`) between two terms,
with a bitset of derived properties. Grounded on the original implementation's `CLAUSES/ccl_eqn.h`
`EqnProperties`/`EqnCell`, generalized from its intrusive clause-bank linkage to an
[`crate::term::TermId`]-only representation: a literal doesn't know which clause (if any) it
belongs to; [`crate::clause::Clause`] owns the `Vec<Equation>`.

*/

use std::cmp::Ordering;

use enumflags2::{bitflags, BitFlags};
use eqsat_abs::PartialOrdering;

use crate::signature::Signature;
use crate::term::{TermBank, TermId, TermShape};
use crate::types::TypeTable;
use crate::unify::ocb::Ocb;

#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationProperty {
  /// `true` for `lterm ≈ rterm`, `false` for `lterm ≉ rterm` (a negative literal).
  Positive,
  /// Maximal in its clause under the clause's term ordering; a prerequisite for being selected
  /// by most literal-selection strategies.
  Maximal,
  /// Strictly greater than every other literal in its clause (not just maximal among equals).
  StrictlyMaximal,
  /// `lterm`/`rterm` have the same (non-Boolean) sort, i.e. this is a genuine equation rather
  /// than a literal `p` written `p ≈ $true`.
  Equational,
  /// The orientation `lterm > rterm` under the term ordering has been established and is safe to
  /// rely on for rewriting.
  Oriented,
  /// [`EquationProperty::Maximal`]/[`EquationProperty::StrictlyMaximal`] reflect the clause's
  /// *current* literal set; cleared whenever the clause's literals change.
  MaxIsUpToDate,
  /// Selected by the clause's literal-selection function for resolution/superposition.
  Selected,
  /// Originates from splitting a clause into components (a "pseudo-literal" split marker rather
  /// than a literal present in the original input).
  SplitLiteral,
}

pub type EquationProperties = BitFlags<EquationProperty>;

/// Declares `atom`'s head symbol a predicate (spec §4.1/§4.7), if `atom` is an application at all
/// — a bare variable used as a predicate-position atom (permitted by the term model, just not a
/// symbol this signature can annotate) is left alone. The head is already Bool-result by
/// construction (nothing else produces a `$true`/`$false` comparison), so `declare_predicate`'s
/// "non-Boolean fixed result type" failure case cannot trigger here.
pub(crate) fn mark_predicate_head(bank: &TermBank, sig: &mut Signature, types: &mut TypeTable, atom: TermId) {
  if let TermShape::App { head, .. } = *bank.shape(atom) {
    sig.declare_predicate(head, types).expect("predicate atom's head is already Bool-typed");
  }
}

#[derive(Debug, Clone)]
pub struct Equation {
  pub lterm: TermId,
  pub rterm: TermId,
  pub properties: EquationProperties,
}

impl Equation {
  pub fn positive(lterm: TermId, rterm: TermId) -> Self {
    Equation { lterm, rterm, properties: EquationProperty::Positive.into() }
  }

  pub fn negative(lterm: TermId, rterm: TermId) -> Self {
    Equation { lterm, rterm, properties: EquationProperties::empty() }
  }

  pub fn is_positive(&self) -> bool {
    self.properties.contains(EquationProperty::Positive)
  }

  pub fn is_negative(&self) -> bool {
    !self.is_positive()
  }

  /// A literal built from a predicate application `p` is represented as the equation `p ≈ $true`
  /// (or `p ≉ $true` for `¬p`); `from_atom` builds that normal form directly. Per spec §4.7 ("for
  /// non-equational literals, the lhs function code is marked predicate in the signature"),
  /// `atom`'s head symbol is declared a predicate as a side effect.
  pub fn from_atom(bank: &mut TermBank, sig: &mut Signature, types: &mut TypeTable, atom: TermId, positive: bool) -> Self {
    mark_predicate_head(bank, sig, types, atom);
    let true_term = bank.true_term();
    if positive {
      Equation::positive(atom, true_term)
    } else {
      Equation::negative(atom, true_term)
    }
  }

  pub fn flip(&self) -> Self {
    Equation { lterm: self.rterm, rterm: self.lterm, properties: self.properties }
  }

  /// Swaps `lterm`/`rterm` in place. Unlike [`Self::flip`], which hands back an unrelated fresh
  /// equation, this mutates an equation that may already carry an orientation/max-cache verdict
  /// computed for the old side assignment, so both must be invalidated (spec §4.7: "sides may be
  /// swapped (`swap_sides`), which invalidates the oriented and max-cache bits").
  pub fn swap_sides(&mut self) {
    std::mem::swap(&mut self.lterm, &mut self.rterm);
    self.properties.remove(EquationProperty::Oriented);
    self.properties.remove(EquationProperty::MaxIsUpToDate);
    self.properties.remove(EquationProperty::Maximal);
    self.properties.remove(EquationProperty::StrictlyMaximal);
  }

  pub fn set_maximal(&mut self, maximal: bool, strictly: bool) {
    if maximal {
      self.properties.insert(EquationProperty::Maximal);
    } else {
      self.properties.remove(EquationProperty::Maximal);
    }
    if strictly {
      self.properties.insert(EquationProperty::StrictlyMaximal);
    } else {
      self.properties.remove(EquationProperty::StrictlyMaximal);
    }
    self.properties.insert(EquationProperty::MaxIsUpToDate);
  }
}

/// Maps a literal to the multiset of terms the literal-ordering extension compares, following the
/// refined Bachmair-Ganzinger encoding: a positive literal `s ≈ t` contributes `{s, t}`, a negative
/// literal `s ≉ t` contributes `{s, s, t, t}`, so that under the multiset extension of any term
/// ordering a negative literal always outranks the positive literal built from the same two sides,
/// while two literals of the same polarity compare exactly as their `{s, t}` pairs would.
fn literal_multiset(eq: &Equation) -> Vec<TermId> {
  if eq.is_positive() {
    vec![eq.lterm, eq.rterm]
  } else {
    vec![eq.lterm, eq.lterm, eq.rterm, eq.rterm]
  }
}

/// The standard Dershowitz-Manna multiset extension of the partial order `ocb.compare` induces on
/// terms: `m1 > m2` iff, after cancelling elements common to both (by identity, since terms are
/// hash-consed), every element remaining in `m2` is dominated by some element remaining in `m1`.
fn multiset_compare(ocb: &dyn Ocb, bank: &TermBank, m1: &[TermId], m2: &[TermId]) -> Option<Ordering> {
  let mut a = m1.to_vec();
  let mut b = m2.to_vec();
  for i in (0..a.len()).rev() {
    if let Some(j) = b.iter().position(|&x| x == a[i]) {
      a.remove(i);
      b.remove(j);
    }
  }
  if a.is_empty() && b.is_empty() {
    return PartialOrdering::Equal;
  }
  if a.is_empty() {
    return PartialOrdering::Less;
  }
  if b.is_empty() {
    return PartialOrdering::Greater;
  }
  let dominates = |xs: &[TermId], y: TermId| xs.iter().any(|&x| ocb.compare(bank, x, y) == PartialOrdering::Greater);
  let a_dominates_b = b.iter().all(|&y| dominates(&a, y));
  let b_dominates_a = a.iter().all(|&y| dominates(&b, y));
  match (a_dominates_b, b_dominates_a) {
    (true, false) => PartialOrdering::Greater,
    (false, true) => PartialOrdering::Less,
    _ => PartialOrdering::Incomparable,
  }
}

/// Literal comparison per spec §4.7: pseudo-literals (split markers) sort strictly below every
/// regular literal; among regular literals of matching polarity, whichever carries `Selected`
/// dominates; a selected/unselected pair of *opposite* polarity never compares (selection only
/// dominates within a polarity); otherwise literals compare via [`multiset_compare`] over
/// [`literal_multiset`], the refined Bachmair-Ganzinger representation.
pub fn compare_literal(ocb: &dyn Ocb, bank: &TermBank, l1: &Equation, l2: &Equation) -> Option<Ordering> {
  let l1_pseudo = l1.properties.contains(EquationProperty::SplitLiteral);
  let l2_pseudo = l2.properties.contains(EquationProperty::SplitLiteral);
  if l1_pseudo != l2_pseudo {
    return if l1_pseudo { PartialOrdering::Less } else { PartialOrdering::Greater };
  }

  let l1_sel = l1.properties.contains(EquationProperty::Selected);
  let l2_sel = l2.properties.contains(EquationProperty::Selected);
  if l1_sel != l2_sel {
    if l1.is_positive() != l2.is_positive() {
      return PartialOrdering::Incomparable;
    }
    return if l1_sel { PartialOrdering::Greater } else { PartialOrdering::Less };
  }

  multiset_compare(ocb, bank, &literal_multiset(l1), &literal_multiset(l2))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::term::TermId;
  use crate::types::TypeId;

  #[test]
  fn positive_and_negative_are_distinguished() {
    let eq = Equation::positive(TermId(0), TermId(1));
    assert!(eq.is_positive());
    let neq = Equation::negative(TermId(0), TermId(1));
    assert!(neq.is_negative());
  }

  #[test]
  fn flip_swaps_sides_and_keeps_sign() {
    let eq = Equation::positive(TermId(0), TermId(1));
    let flipped = eq.flip();
    assert_eq!(flipped.lterm, TermId(1));
    assert_eq!(flipped.rterm, TermId(0));
    assert!(flipped.is_positive());
  }

  #[test]
  fn swap_sides_mutates_in_place_and_clears_cached_bits() {
    let mut eq = Equation::positive(TermId(0), TermId(1));
    eq.properties.insert(EquationProperty::Oriented);
    eq.set_maximal(true, true);
    eq.swap_sides();
    assert_eq!(eq.lterm, TermId(1));
    assert_eq!(eq.rterm, TermId(0));
    assert!(!eq.properties.contains(EquationProperty::Oriented));
    assert!(!eq.properties.contains(EquationProperty::MaxIsUpToDate));
    assert!(!eq.properties.contains(EquationProperty::Maximal));
    assert!(!eq.properties.contains(EquationProperty::StrictlyMaximal));
    assert!(eq.is_positive());
  }

  fn fixture() -> (TermBank, crate::signature::Signature, TypeId) {
    let mut types = crate::types::TypeTable::new();
    let individual = types.individual();
    let sig = crate::signature::Signature::new(&mut types);
    let bank = TermBank::new(&mut types);
    (bank, sig, individual)
  }

  #[test]
  fn split_pseudo_literal_is_strictly_below_regular_literal() {
    use crate::unify::ocb::WeightOcb;
    let (bank, _sig, _individual) = fixture();
    let mut pseudo = Equation::positive(TermId(0), TermId(1));
    pseudo.properties.insert(EquationProperty::SplitLiteral);
    let regular = Equation::positive(TermId(0), TermId(1));
    assert_eq!(compare_literal(&WeightOcb, &bank, &pseudo, &regular), PartialOrdering::Less);
    assert_eq!(compare_literal(&WeightOcb, &bank, &regular, &pseudo), PartialOrdering::Greater);
  }

  #[test]
  fn selected_literal_dominates_unselected_of_same_polarity() {
    use crate::unify::ocb::WeightOcb;
    let (bank, _sig, _individual) = fixture();
    let mut selected = Equation::positive(TermId(0), TermId(1));
    selected.properties.insert(EquationProperty::Selected);
    let unselected = Equation::positive(TermId(0), TermId(1));
    assert_eq!(compare_literal(&WeightOcb, &bank, &selected, &unselected), PartialOrdering::Greater);
  }

  #[test]
  fn mixed_polarity_selection_is_incomparable() {
    use crate::unify::ocb::WeightOcb;
    let (bank, _sig, _individual) = fixture();
    let mut selected_pos = Equation::positive(TermId(0), TermId(1));
    selected_pos.properties.insert(EquationProperty::Selected);
    let unselected_neg = Equation::negative(TermId(0), TermId(1));
    assert_eq!(compare_literal(&WeightOcb, &bank, &selected_pos, &unselected_neg), PartialOrdering::Incomparable);
  }

  #[test]
  fn negative_literal_outranks_positive_literal_over_same_sides() {
    use crate::unify::ocb::WeightOcb;
    let (mut bank, mut sig, individual) = fixture();
    let trail = crate::trail::Trail::new();
    let f = sig.declare("f", 0, individual, Default::default()).unwrap();
    let g = sig.declare("g", 0, individual, Default::default()).unwrap();
    let f_term = bank.insert(
      &crate::term::Build::app(f, vec![]),
      crate::term::DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let g_term = bank.insert(
      &crate::term::Build::app(g, vec![]),
      crate::term::DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let pos = Equation::positive(f_term, g_term);
    let neg = Equation::negative(f_term, g_term);
    assert_eq!(compare_literal(&WeightOcb, &bank, &neg, &pos), PartialOrdering::Greater);
    assert_eq!(compare_literal(&WeightOcb, &bank, &pos, &neg), PartialOrdering::Less);
  }
}
