/*!

A perfect discrimination tree keyed on a term's linearized preorder traversal: at every position
the path branches either on a concrete function symbol or on a "variable" wildcard token, the way
a discrimination-tree path is described generically (rather than E's specific
`cte_pdt.c`/`cte_pdt.h`, not present in the retrieval pack this was distilled from) — "perfect" in
the sense that retrieval returns exactly the indexed positions compatible with the query's shape,
though callers must still run the real unifier/matcher on each candidate since a wildcard branch
only promises *some* substitution exists, not which one.

*/

use eqsat_abs::HashMap;

use crate::index::ClausePosition;
use crate::signature::FunctionCode;
use crate::term::{TermBank, TermId, TermShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Token {
  Sym(FunctionCode),
  Var,
}

fn token_of(bank: &TermBank, term: TermId) -> Token {
  match bank.shape(term) {
    TermShape::FreeVar(_) => Token::Var,
    TermShape::DbVar(_) => Token::Var,
    TermShape::App { head, .. } => Token::Sym(*head),
  }
}

#[derive(Debug, Default)]
struct PdtNode {
  children: HashMap<Token, PdtNode>,
  leaf: Vec<ClausePosition>,
}

#[derive(Debug, Default)]
pub struct Pdt {
  root: PdtNode,
}

impl Pdt {
  pub fn new() -> Self {
    Self::default()
  }

  fn path(bank: &TermBank, term: TermId, out: &mut Vec<Token>) {
    out.push(token_of(bank, term));
    if let TermShape::App { args, .. } = bank.shape(term) {
      for &a in args {
        Self::path(bank, a, out);
      }
    }
  }

  pub fn insert(&mut self, bank: &TermBank, term: TermId, position: ClausePosition) {
    let mut path = Vec::new();
    Self::path(bank, term, &mut path);
    let mut node = &mut self.root;
    for token in path {
      node = node.children.entry(token).or_default();
    }
    node.leaf.push(position);
  }

  pub fn delete(&mut self, bank: &TermBank, term: TermId, position: ClausePosition) {
    let mut path = Vec::new();
    Self::path(bank, term, &mut path);
    let mut node = &mut self.root;
    for token in path {
      match node.children.get_mut(&token) {
        Some(next) => node = next,
        None => return,
      }
    }
    node.leaf.retain(|p| *p != position);
  }

  /// Candidate positions whose indexed term might unify with `query`: at a `Var` branch in the
  /// tree the corresponding subtree of the query is skipped wholesale (a variable can bind to
  /// anything), and a query variable matches every branch (it could be instantiated to anything
  /// the tree indexed).
  pub fn retrieve_unifiable(&self, bank: &TermBank, query: TermId) -> Vec<ClausePosition> {
    let mut out = Vec::new();
    self.collect_unifiable(bank, &self.root, query, &mut out);
    out
  }

  fn collect_unifiable(&self, bank: &TermBank, node: &PdtNode, query: TermId, out: &mut Vec<ClausePosition>) {
    let query_token = token_of(bank, query);

    if let Token::Var = query_token {
      // A query variable is compatible with every indexed branch; descend into all of them,
      // using each branch's own query-independent subtree rather than `query`'s children.
      for child in node.children.values() {
        self.collect_unifiable_any(bank, child, out);
      }
      return;
    }

    if let Some(var_child) = node.children.get(&Token::Var) {
      out.extend_from_slice(&var_child.leaf);
    }
    if let Some(sym_child) = node.children.get(&query_token) {
      if let TermShape::App { args, .. } = bank.shape(query) {
        self.collect_unifiable_args(bank, sym_child, args, out);
      } else {
        out.extend_from_slice(&sym_child.leaf);
      }
    }
  }

  fn collect_unifiable_args(
    &self,
    bank: &TermBank,
    node: &PdtNode,
    args: &[TermId],
    out: &mut Vec<ClausePosition>,
  ) {
    match args.split_first() {
      None => out.extend_from_slice(&node.leaf),
      Some((first, rest)) => {
        let first_token = token_of(bank, *first);
        if let Token::Var = first_token {
          for child in node.children.values() {
            self.collect_unifiable_args_skipping(bank, child, rest, out);
          }
          return;
        }
        if let Some(var_child) = node.children.get(&Token::Var) {
          self.collect_unifiable_args(bank, var_child, rest, out);
        }
        if let Some(sym_child) = node.children.get(&first_token) {
          if let TermShape::App { args: inner_args, .. } = bank.shape(*first) {
            let mut combined: Vec<TermId> = inner_args.to_vec();
            combined.extend_from_slice(rest);
            self.collect_unifiable_args(bank, sym_child, &combined, out);
          } else {
            self.collect_unifiable_args(bank, sym_child, rest, out);
          }
        }
      }
    }
  }

  fn collect_unifiable_args_skipping(
    &self,
    bank: &TermBank,
    node: &PdtNode,
    rest: &[TermId],
    out: &mut Vec<ClausePosition>,
  ) {
    // The query's first argument is itself a variable: it's compatible with whatever subtree
    // `node` roots, so every leaf reachable below `node` restricted to the remaining siblings is
    // a candidate. We conservatively walk every descendant leaf rather than tracking the tree's
    // exact arity-driven skip distance, trading some precision for a much simpler traversal.
    if node.children.is_empty() {
      self.collect_unifiable_args(bank, node, rest, out);
      return;
    }
    for child in node.children.values() {
      self.collect_unifiable_args_skipping(bank, child, rest, out);
    }
    out.extend_from_slice(&node.leaf);
  }

  /// Descends into `node` unconditionally, collecting every leaf beneath it; used when the query
  /// side offered a variable and so is compatible with anything this branch represents.
  fn collect_unifiable_any(&self, bank: &TermBank, node: &PdtNode, out: &mut Vec<ClausePosition>) {
    out.extend_from_slice(&node.leaf);
    for child in node.children.values() {
      self.collect_unifiable_any(bank, child, out);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clause::ClauseId;
  use crate::index::Side;
  use crate::signature::Signature;
  use crate::term::{Build, DerefType};
  use crate::trail::Trail;
  use crate::types::TypeTable;
  use crate::variable_bank::{Bank, VariableBank};

  fn pos(n: i64) -> ClausePosition {
    ClausePosition { clause: ClauseId(n), literal: 0, side: Side::Left }
  }

  #[test]
  fn exact_symbol_match_is_retrieved() {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let mut sig = Signature::new(&mut types);
    let mut bank = TermBank::new(&mut types);
    let mut vars = VariableBank::new();
    let trail = Trail::new();

    let f = sig.declare("f", 1, individual, Default::default()).unwrap();
    let c = sig.declare("c", 0, individual, Default::default()).unwrap();
    let x = vars.fresh(Bank::A, individual);

    let fc = bank.insert(
      &Build::app(f, vec![Build::app(c, vec![])]),
      DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );
    let fx = bank.insert(
      &Build::app(f, vec![Build::var(x)]),
      DerefType::Never,
      &trail,
      |_| individual,
      |_| individual,
      |_, _| individual,
    );

    let mut pdt = Pdt::new();
    pdt.insert(&bank, fc, pos(1));

    let candidates = pdt.retrieve_unifiable(&bank, fx);
    assert_eq!(candidates, vec![pos(1)]);
  }

  #[test]
  fn delete_removes_entry() {
    let mut types = TypeTable::new();
    let individual = types.individual();
    let mut sig = Signature::new(&mut types);
    let mut bank = TermBank::new(&mut types);
    let trail = Trail::new();
    let c = sig.declare("c", 0, individual, Default::default()).unwrap();
    let cc = bank.insert(&Build::app(c, vec![]), DerefType::Never, &trail, |_| individual, |_| individual, |_, _| individual);

    let mut pdt = Pdt::new();
    pdt.insert(&bank, cc, pos(1));
    pdt.delete(&bank, cc, pos(1));
    assert!(pdt.retrieve_unifiable(&bank, cc).is_empty());
  }
}
