/*!

A single struct bundling every piece of process-wide mutable state a saturation prover otherwise
keeps as globals: the signature, type table, variable banks, term bank, substitution trail, and
the η-normalisation policy hook. Grounded on spec §9's redesign flag ("Global mutable state ...
Strategy: encapsulate in a single context struct threaded explicitly through every entry point;
tests instantiate their own context"), and on the teacher's own preference for an explicit state
struct (`mod2-lib`'s `Context`/`Substitution` carried by reference rather than accessed through a
`static`).

[`EngineContext`] is deliberately thin: it owns the pieces, exposes field access to each, and
supplies a handful of cross-cutting conveniences (sharing a [`crate::term::Build`] tree into the
bank with types inferred from the signature, minting fresh higher-order variables in the bank
reserved for unification-introduced terms) that every other module would otherwise have to
re-derive from the same five pieces.

*/

use crate::equation::Equation;
use crate::lambda::EtaPolicy;
use crate::signature::{FunctionCode, Signature};
use crate::term::{Build, DerefType, TermBank, TermId, TermShape};
use crate::trail::Trail;
use crate::types::{TypeId, TypeTable};
use crate::variable_bank::{Bank, DbVarId, DbVariableBank, VarId, VariableBank};

/// Tunables that would be CLI/option-file settings in the teacher's original; collected here
/// rather than threaded as separate arguments per spec §11.3.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Function codes the feature-vector index tracks per-occurrence counts for; see
  /// [`crate::index::fv_index::FeatureSchema`].
  pub fv_tracked_codes: Vec<FunctionCode>,
  /// Probe paths the fingerprint index samples; defaults to
  /// [`crate::index::fingerprint::default_probe_paths`]'s 7 positions.
  pub fingerprint_probes: Vec<crate::index::fingerprint::Path>,
  /// Which η-normal form [`crate::lambda::lambda_normalize`] produces when the engine calls it
  /// without an explicit override.
  pub eta_policy: EtaPolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    EngineConfig {
      fv_tracked_codes: Vec::new(),
      fingerprint_probes: crate::index::fingerprint::default_probe_paths(),
      eta_policy: EtaPolicy::Reduce,
    }
  }
}

/// Everything a saturation loop's entry points need, bundled so no module reaches for a process
/// global. Every field is `pub`: this is a plain aggregate, not an encapsulation boundary: callers
/// are expected to borrow the specific pieces a function needs (`&mut ctx.bank, &ctx.trail`)
/// rather than threading `&mut EngineContext` everywhere, the way the teacher's own multi-field
/// contexts are destructured at call sites.
#[derive(Debug)]
pub struct EngineContext {
  pub types: TypeTable,
  pub signature: Signature,
  pub vars: VariableBank,
  pub db_vars: DbVariableBank,
  pub bank: TermBank,
  pub trail: Trail,
  pub config: EngineConfig,

  /// Monotonic counter handed out to freshly created clauses as their `date`, the way the
  /// original's global clause clock advances once per `ClauseSetInsert`/inference step.
  next_clause_date: u64,
}

impl EngineContext {
  pub fn new(config: EngineConfig) -> Self {
    let mut types = TypeTable::new();
    let signature = Signature::new(&mut types);
    let bank = TermBank::new(&mut types);
    EngineContext {
      types,
      signature,
      vars: VariableBank::new(),
      db_vars: DbVariableBank::new(),
      bank,
      trail: Trail::new(),
      config,
      next_clause_date: 0,
    }
  }

  pub fn next_date(&mut self) -> u64 {
    let date = self.next_clause_date;
    self.next_clause_date += 1;
    date
  }

  /// Mints a fresh ordinary (clause-scope) free variable of type `ty`, from variable bank `A` the
  /// way user/parsed clause variables are; see [`Self::fresh_ho_var`] for the bank reserved for
  /// unification-introduced variables.
  pub fn fresh_var(&mut self, ty: TypeId) -> VarId {
    self.vars.fresh(Bank::A, ty)
  }

  /// Mints a fresh variable from bank `B`, reserved for variables a unification/matching
  /// algorithm introduces on the fly (imitation/projection/identification bindings, pattern
  /// flex-flex solutions): keeping these in a separate bank from ordinary clause variables means
  /// a clause copy that renames bank `A` apart can never collide with one of these.
  pub fn fresh_ho_var(&mut self, ty: TypeId) -> VarId {
    self.vars.fresh(Bank::B, ty)
  }

  /// The type an application `head(args)` has, inferring it the way the signature/term-bank
  /// split requires: an ordinary symbol's result type comes straight from the signature; a
  /// phony-application's comes from peeling its head's arrow type once per extra argument; a
  /// lambda's is reconstructed from its bound variable's type and its body's type.
  pub fn infer_app_type(&mut self, head: FunctionCode, args: &[TermId]) -> TypeId {
    use crate::signature::reserved;
    if head == reserved::LAMBDA {
      let arg_ty = self.bank.ty(args[0]);
      let body_ty = self.bank.ty(args[1]);
      return self.types.prepend_arg(arg_ty, body_ty);
    }
    if head == reserved::PHONY_APP {
      let mut ty = self.bank.ty(args[0]);
      for _ in 1..args.len() {
        ty = self.types.result_after_one_arg(ty);
      }
      return ty;
    }
    // An ordinary symbol's declared type is already its *result* type (see
    // `Signature::declare`'s convention: `ty` is the result sort, `arity` is tracked
    // separately) so a fully-applied symbol's type is just that result type, unpeeled.
    self.signature.ty(head)
  }

  /// Shares a [`Build`] tree into [`Self::bank`], dereferencing free variables per `deref` and
  /// inferring every application's type via [`Self::infer_app_type`]. The one entry point most
  /// callers outside `term::bank` itself should use instead of calling `TermBank::insert`
  /// directly with hand-rolled type closures.
  pub fn insert(&mut self, raw: &Build, deref: DerefType) -> TermId {
    self.insert_inner(raw, deref)
  }

  fn insert_inner(&mut self, raw: &Build, deref: DerefType) -> TermId {
    match raw {
      Build::Var(v) => {
        let ty = self.vars.ty(*v);
        match deref {
          DerefType::Never => self.bank.free_var_term(*v, ty),
          DerefType::Once => match self.trail.value(*v) {
            Some(bound) => bound,
            None => self.bank.free_var_term(*v, ty),
          },
          DerefType::Always => {
            let mut current = *v;
            loop {
              match self.trail.value(current) {
                Some(bound) => {
                  if let TermShape::FreeVar(next) = self.bank.shape(bound) {
                    current = *next;
                    continue;
                  }
                  return bound;
                }
                None => return self.bank.free_var_term(current, self.vars.ty(current)),
              }
            }
          }
        }
      }
      Build::Db(v) => self.db_var(*v),
      Build::App(head, args) => {
        let shared: eqsat_abs::SmallVec<[TermId; 4]> =
          args.iter().map(|a| self.insert_inner(a, deref)).collect();
        let ty = self.infer_app_type(*head, &shared);
        self.bank.app(*head, shared, ty)
      }
    }
  }

  fn db_var(&mut self, v: DbVarId) -> TermId {
    let ty = self.db_vars.ty(v);
    self.bank.db_var_term(v, ty)
  }

  /// Interns the de Bruijn variable at `index` with type `ty`, for callers building abstraction
  /// bodies directly rather than through a [`Build`] tree.
  pub fn db_at(&mut self, ty: TypeId, index: u32) -> TermId {
    let v = self.db_vars.intern(ty, index);
    self.bank.db_var_term(v, ty)
  }

  /// `lambda_normalize` using [`EngineConfig::eta_policy`].
  pub fn lambda_normalize(&mut self, term: TermId) -> TermId {
    crate::lambda::lambda_normalize(
      &mut self.bank,
      &mut self.db_vars,
      &mut self.types,
      &self.trail,
      term,
      self.config.eta_policy,
    )
  }

  /// The designated minimal ground term of type `ty`, minting it on first request. See
  /// [`crate::term::TermBank::min_term`].
  pub fn min_term(&mut self, ty: TypeId) -> TermId {
    self.bank.min_term(ty, &mut self.signature)
  }

  /// Builds the equation `lterm = rterm` (or `lterm != rterm`), inferring the `Equational`
  /// property from whether `rterm` is the designated `$true` term (see
  /// [`crate::equation::Equation::from_atom`] for predicate literals built straight from an
  /// atom). When `rterm` *is* `$true` this is a non-equational literal `lterm ≈ $true`, so per
  /// spec §4.7 `lterm`'s head symbol is declared a predicate in the signature as a side effect.
  pub fn make_equation(&mut self, lterm: TermId, rterm: TermId, positive: bool) -> Equation {
    let mut eq = if positive { Equation::positive(lterm, rterm) } else { Equation::negative(lterm, rterm) };
    if rterm == self.bank.true_term() {
      crate::equation::mark_predicate_head(&self.bank, &mut self.signature, &mut self.types, lterm);
    } else {
      eq.properties.insert(crate::equation::EquationProperty::Equational);
    }
    eq
  }
}
