/*!

Unification and matching: first-order MGU/matcher ([`fo`]), the higher-order pattern fragment's
unifier/matcher ([`pattern`]), a cheap sufficient-unifiability oracle for the general higher-order
case ([`fixpoint`]), explicit constraint-store binding enumeration for terms outside the pattern
fragment ([`enumerate`]), and the ordering-callback interface inference code calls back into
([`ocb`]). Grounded on spec §4.6 and, for the parts the distilled spec only names, on the original
implementation's `TERMS/cte_pattern_match_mgu.c` and `TERMS/cte_fixpoint_unif.c`.

Every routine here takes `&mut TermBank`/`&mut Trail` explicitly (per [`crate::context`]'s
redesign of process-wide state into an explicit context) and follows the teacher's backtracking
convention: on failure, bindings already pushed to the trail are **not** unwound by the callee —
the caller is expected to have taken a [`crate::trail::Trail::mark`] before attempting a
unification/match and to call [`crate::trail::Trail::backtrack_to`] on failure, exactly as spec §7
prescribes ("Unification/matching return a tri-state enum or boolean; they never raise").

*/

pub mod ocb;
pub mod fo;
pub mod fixpoint;
pub mod pattern;
pub mod enumerate;

pub use fixpoint::FixpointStatus;
pub use pattern::FragmentStatus;

/// Shared by [`fixpoint::FixpointStatus`] and [`pattern::FragmentStatus`]: both higher-order
/// oracles can decline to commit, handing the caller back to whatever fallback it has (the other
/// oracle, or [`enumerate`]'s explicit constraint-store enumeration).
pub trait MaybeInFragment {
  fn not_in_fragment(&self) -> bool;
}
