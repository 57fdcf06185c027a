/*!

A feature-vector index for subsumption candidate retrieval: every clause is reduced to a short
vector of cheap-to-compute integer features (literal counts and per-symbol occurrence counts),
and one clause can only subsume another if its feature vector is component-wise `<=` the other's —
a necessary (not sufficient) condition that prunes the vast majority of non-subsuming pairs before
the expensive literal-matching check runs. Grounded on the retrieval contract the original
implementation's `CLAUSES/ccl_fcvindexing.c` describes (not present in the retrieval pack this was
distilled from): feature vectors bucket clauses, and subsumption queries walk only
component-wise-compatible buckets.

*/

use eqsat_abs::HashMap;

use crate::clause::{Clause, ClauseId};
use crate::equation::Equation;
use crate::signature::FunctionCode;
use crate::term::{TermBank, TermId, TermShape};

pub type FeatureVector = Vec<u32>;

/// The function codes this index tracks a per-symbol occurrence count for. A real deployment
/// would choose these adaptively from the problem's signature; a fixed small set kept here
/// keeps the vector length bounded and the index simple to reason about.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
  tracked_codes: Vec<FunctionCode>,
}

impl FeatureSchema {
  pub fn new(tracked_codes: Vec<FunctionCode>) -> Self {
    FeatureSchema { tracked_codes }
  }

  /// Vector layout: `[literal_count, pos_count, neg_count, depth_max, occurrences(code_0), ..]`.
  pub fn len(&self) -> usize {
    4 + self.tracked_codes.len()
  }

  pub fn vector_of(&self, bank: &TermBank, clause: &Clause) -> FeatureVector {
    let mut v = vec![0u32; self.len()];
    v[0] = clause.literals.len() as u32;
    v[1] = clause.pos_count() as u32;
    v[2] = clause.neg_count() as u32;
    let mut depth_max = 0u32;
    let mut occurrences = vec![0u32; self.tracked_codes.len()];
    for lit in &clause.literals {
      depth_max = depth_max.max(term_depth(bank, lit.lterm));
      depth_max = depth_max.max(term_depth(bank, lit.rterm));
      count_occurrences(bank, lit.lterm, &self.tracked_codes, &mut occurrences);
      count_occurrences(bank, lit.rterm, &self.tracked_codes, &mut occurrences);
    }
    v[3] = depth_max;
    v[4..].copy_from_slice(&occurrences);
    v
  }
}

fn term_depth(bank: &TermBank, term: TermId) -> u32 {
  match bank.shape(term) {
    TermShape::App { args, .. } => 1 + args.iter().map(|&a| term_depth(bank, a)).max().unwrap_or(0),
    _ => 0,
  }
}

fn count_occurrences(bank: &TermBank, term: TermId, tracked: &[FunctionCode], out: &mut [u32]) {
  if let TermShape::App { head, args } = bank.shape(term) {
    if let Some(i) = tracked.iter().position(|c| c == head) {
      out[i] += 1;
    }
    for &a in args {
      count_occurrences(bank, a, tracked, out);
    }
  }
}

fn dominates(a: &[u32], b: &[u32]) -> bool {
  a.iter().zip(b.iter()).all(|(x, y)| x <= y)
}

#[derive(Debug, Default)]
pub struct FvIndex {
  entries: HashMap<ClauseId, FeatureVector>,
}

impl FvIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, clause: ClauseId, vector: FeatureVector) {
    self.entries.insert(clause, vector);
  }

  pub fn remove(&mut self, clause: ClauseId) {
    self.entries.remove(&clause);
  }

  /// Clauses whose feature vector is component-wise `<=` `query`: candidates that *might*
  /// subsume the clause `query` was computed from.
  pub fn candidate_subsumers(&self, query: &[u32]) -> Vec<ClauseId> {
    self
      .entries
      .iter()
      .filter(|(_, v)| dominates(v, query))
      .map(|(&id, _)| id)
      .collect()
  }

  /// Clauses whose feature vector is component-wise `>=` `query`: candidates that `query`'s
  /// clause *might* subsume.
  pub fn candidate_subsumed(&self, query: &[u32]) -> Vec<ClauseId> {
    self
      .entries
      .iter()
      .filter(|(_, v)| dominates(query, v))
      .map(|(&id, _)| id)
      .collect()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clause::ClauseProperties;
  use crate::term::{Build, DerefType};
  use crate::trail::Trail;
  use crate::types::TypeTable;

  #[test]
  fn lighter_clause_is_a_candidate_subsumer_of_a_heavier_one() {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let mut sig = crate::signature::Signature::new(&mut types);
    let mut bank = TermBank::new(&mut types);
    let trail = Trail::new();
    let f = sig.declare("f", 0, individual, Default::default()).unwrap();

    let t = bank.insert(&Build::app(f, vec![]), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);
    let small = Clause::new(ClauseId(1), vec![Equation::positive(t, t)], ClauseProperties::empty(), 0);
    let big = Clause::new(
      ClauseId(2),
      vec![Equation::positive(t, t), Equation::negative(t, t)],
      ClauseProperties::empty(),
      0,
    );

    let schema = FeatureSchema::new(vec![f]);
    let small_vec = schema.vector_of(&bank, &small);
    let big_vec = schema.vector_of(&bank, &big);

    let mut index = FvIndex::new();
    index.insert(small.id, small_vec);
    let candidates = index.candidate_subsumers(&big_vec);
    assert_eq!(candidates, vec![small.id]);
  }
}
