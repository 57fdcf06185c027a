/*!

The shared term DAG: see [`cell`] for the node representation and [`bank`] for the owning,
hash-consing arena.

*/

pub mod cell;
pub mod bank;

pub use cell::{TermCell, TermId, TermShape};
pub use bank::{Build, DerefType, TermBank};
