/*!

The term cell itself, generalized from the teacher's `mod2-lib/src/core/term_core.rs` `TermCore`
(symbol + occurs-set + attributes + cached size) down to the three shapes a hash-consed DAG node
needs in this engine: a free variable, a de Bruijn bound variable, or an application.

Following the redesign called for by a shared, cyclic-free DAG under an owning arena (see
`crate::term::bank::TermBank`), a cell holds no pointer to its owning bank and no binding: a free
variable's current binding lives in [`crate::trail::Trail`], not on the (hash-consed, shared) cell
itself, so that binding a variable never mutates a cell two unrelated terms might be pointing at.

*/

use std::cell::Cell;

use eqsat_abs::SmallVec;

use crate::signature::FunctionCode;
use crate::types::TypeId;
use crate::variable_bank::{DbVarId, VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

/// The structural shape of a term cell. `App` covers ordinary function application as well as
/// the two reserved heads [`crate::signature::reserved::PHONY_APP`] (head is itself a term: a
/// variable or a lambda) and [`crate::signature::reserved::LAMBDA`] (exactly two arguments: the
/// de Bruijn-0 placeholder carrying the bound variable's type, and the body).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermShape {
  FreeVar(VarId),
  DbVar(DbVarId),
  App { head: FunctionCode, args: SmallVec<[TermId; 4]> },
}

impl TermShape {
  pub fn is_var(&self) -> bool {
    matches!(self, TermShape::FreeVar(_))
  }

  pub fn is_lambda(&self) -> bool {
    matches!(self, TermShape::App { head, .. } if *head == crate::signature::reserved::LAMBDA)
  }

  pub fn is_phony_app(&self) -> bool {
    matches!(self, TermShape::App { head, .. } if *head == crate::signature::reserved::PHONY_APP)
  }
}

#[derive(Debug)]
pub struct TermCell {
  pub shape: TermShape,
  pub ty:    TypeId,

  /// Symbol-weight of the term under the signature's default weighting, cached at construction
  /// since it only depends on already-shared (hence already-weighed) children.
  pub weight: u32,
  /// Count of free-variable occurrences (with repetition), used by subsumption and the
  /// feature-vector index the way E's `EqnProperties` precompute a term's `vars` count.
  pub var_occurrences: u32,
  pub is_ground: bool,
  /// `true` if a de Bruijn index free at depth 0 occurs anywhere in the term (i.e. the term is
  /// not closed under its own top-level binder); consulted by `shift`/beta-reduction so they can
  /// skip subtrees with no loose bound variable at all.
  pub has_loose_db: bool,

  /// Memoised weak-head-normal-form, invalidated on GC sweep. `None` means "not yet computed",
  /// not "has no normal form" (every term in this calculus is weakly normalizing under beta).
  pub whnf_cache: Cell<Option<TermId>>,
  pub beta_nf_cache: Cell<Option<TermId>>,

  pub(crate) mark: Cell<bool>,
}

impl TermCell {
  pub fn is_var(&self) -> bool {
    self.shape.is_var()
  }

  pub fn is_lambda(&self) -> bool {
    self.shape.is_lambda()
  }

  pub fn is_phony_app(&self) -> bool {
    self.shape.is_phony_app()
  }

  /// The function code at the head of an application, or `None` for a variable.
  pub fn head(&self) -> Option<FunctionCode> {
    match &self.shape {
      TermShape::App { head, .. } => Some(*head),
      _ => None,
    }
  }

  pub fn args(&self) -> &[TermId] {
    match &self.shape {
      TermShape::App { args, .. } => args.as_slice(),
      _ => &[],
    }
  }
}
