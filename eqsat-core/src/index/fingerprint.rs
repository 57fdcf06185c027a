/*!

A fingerprint index: a short vector of symbols sampled at a fixed set of tree positions, used as a
cheap pre-filter before running the real unifier. Grounded on the retrieval contract the original
implementation's fingerprint indexing is known for (the source file itself wasn't present in the
retrieval pack this was distilled from): at each of a handful of canonical positions, a term either
has a concrete symbol there, is below a variable there (so a substitution could put anything
there), or doesn't reach that deep at all. Two fingerprints are compatible, entry-wise, only if
every position could possibly unify; incompatible fingerprints prove the terms can't unify without
ever building them.

*/

use eqsat_abs::HashMap;

use crate::index::ClausePosition;
use crate::signature::FunctionCode;
use crate::term::{TermBank, TermId, TermShape};

/// A fixed position in a term, given as a path of child indices from the root (empty = root
/// itself).
pub type Path = Vec<u32>;

/// The 7-position sample the index probes by default: the root, its first two children, and each
/// of the first two children's first two children.
pub fn default_probe_paths() -> Vec<Path> {
  vec![
    vec![],
    vec![0],
    vec![1],
    vec![0, 0],
    vec![0, 1],
    vec![1, 0],
    vec![1, 1],
  ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FpEntry {
  /// A concrete function symbol occurs exactly at this position.
  Symbol(FunctionCode),
  /// A variable occurs at or above this position: any symbol could appear here after
  /// substitution.
  Variable,
  /// Neither term reaches this deep along this path (an ancestor had too few arguments here).
  Absent,
}

/// `true` if a term with fingerprint entry `a` at some position could unify with a term with
/// entry `b` at the same position.
pub fn compatible(a: FpEntry, b: FpEntry) -> bool {
  match (a, b) {
    (FpEntry::Symbol(x), FpEntry::Symbol(y)) => x == y,
    (FpEntry::Variable, _) | (_, FpEntry::Variable) => true,
    (FpEntry::Absent, FpEntry::Absent) => true,
    (FpEntry::Absent, FpEntry::Symbol(_)) | (FpEntry::Symbol(_), FpEntry::Absent) => false,
  }
}

fn entry_at(bank: &TermBank, term: TermId, path: &[u32]) -> FpEntry {
  match bank.shape(term) {
    TermShape::FreeVar(_) => FpEntry::Variable,
    TermShape::DbVar(_) => FpEntry::Variable,
    TermShape::App { head, args } => match path.split_first() {
      None => FpEntry::Symbol(*head),
      Some((&i, rest)) => match args.get(i as usize) {
        Some(&child) => entry_at(bank, child, rest),
        None => FpEntry::Absent,
      },
    },
  }
}

pub fn fingerprint_of(bank: &TermBank, term: TermId, probes: &[Path]) -> Vec<FpEntry> {
  probes.iter().map(|p| entry_at(bank, term, p)).collect()
}

#[derive(Debug, Default)]
struct FpNode {
  children: HashMap<FpEntry, FpNode>,
  leaf: Vec<ClausePosition>,
}

#[derive(Debug)]
pub struct FingerprintIndex {
  probes: Vec<Path>,
  root: FpNode,
}

impl FingerprintIndex {
  pub fn new(probes: Vec<Path>) -> Self {
    FingerprintIndex { probes, root: FpNode::default() }
  }

  pub fn with_default_probes() -> Self {
    Self::new(default_probe_paths())
  }

  pub fn insert(&mut self, bank: &TermBank, term: TermId, position: ClausePosition) {
    let fp = fingerprint_of(bank, term, &self.probes);
    let mut node = &mut self.root;
    for entry in fp {
      node = node.children.entry(entry).or_default();
    }
    node.leaf.push(position);
  }

  pub fn delete(&mut self, bank: &TermBank, term: TermId, position: ClausePosition) {
    let fp = fingerprint_of(bank, term, &self.probes);
    let mut node = &mut self.root;
    for entry in fp {
      match node.children.get_mut(&entry) {
        Some(next) => node = next,
        None => return,
      }
    }
    node.leaf.retain(|p| *p != position);
  }

  /// Candidate positions whose fingerprint is entry-wise compatible with `query`'s; a term not
  /// returned here provably cannot unify with `query`.
  pub fn retrieve_unifiable(&self, bank: &TermBank, query: TermId) -> Vec<ClausePosition> {
    let fp = fingerprint_of(bank, query, &self.probes);
    let mut out = Vec::new();
    Self::collect(&self.root, &fp, 0, &mut out);
    out
  }

  fn collect(node: &FpNode, fp: &[FpEntry], depth: usize, out: &mut Vec<ClausePosition>) {
    if depth == fp.len() {
      out.extend_from_slice(&node.leaf);
      return;
    }
    for (entry, child) in &node.children {
      if compatible(*entry, fp[depth]) {
        Self::collect(child, fp, depth + 1, out);
      }
    }
  }

  pub fn probes(&self) -> &[Path] {
    &self.probes
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::index::Side;
  use crate::clause::ClauseId;
  use crate::signature::Signature;
  use crate::term::{Build, DerefType};
  use crate::trail::Trail;
  use crate::types::TypeTable;
  use crate::variable_bank::{Bank, VariableBank};

  fn pos(n: i64) -> ClausePosition {
    ClausePosition { clause: ClauseId(n), literal: 0, side: Side::Left }
  }

  #[test]
  fn incompatible_root_symbols_are_filtered_out() {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let mut sig = Signature::new(&mut types);
    let mut bank = TermBank::new(&mut types);
    let trail = Trail::new();
    let f = sig.declare("f", 0, individual, Default::default()).unwrap();
    let g = sig.declare("g", 0, individual, Default::default()).unwrap();

    let ft = bank.insert(&Build::app(f, vec![]), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);
    let gt = bank.insert(&Build::app(g, vec![]), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);

    let mut index = FingerprintIndex::with_default_probes();
    index.insert(&bank, ft, pos(1));
    assert!(index.retrieve_unifiable(&bank, gt).is_empty());
    assert_eq!(index.retrieve_unifiable(&bank, ft), vec![pos(1)]);
  }

  #[test]
  fn variable_query_is_compatible_with_everything() {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let mut sig = Signature::new(&mut types);
    let mut bank = TermBank::new(&mut types);
    let mut vars = VariableBank::new();
    let trail = Trail::new();
    let f = sig.declare("f", 0, individual, Default::default()).unwrap();
    let ft = bank.insert(&Build::app(f, vec![]), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);
    let x = vars.fresh(Bank::A, individual);
    let xt = bank.insert(&Build::var(x), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);

    let mut index = FingerprintIndex::with_default_probes();
    index.insert(&bank, ft, pos(1));
    assert_eq!(index.retrieve_unifiable(&bank, xt), vec![pos(1)]);
  }
}
