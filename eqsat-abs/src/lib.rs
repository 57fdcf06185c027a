#![allow(unused)]
/*!

Types/type aliases that abstract over the implementing backing type.

# Background and Motivation

A motivating example is the `IString` type, an interned string type. A number of external crates
could provide this functionality. This module redirects to whatever chosen implementation we want.
To use the [`string_cache` crate](https://crates.io/crates/string_cache), we just define `IString`
as an alias for `string_cache::DefaultAtom`:

```ignore
pub use string_cache::DefaultAtom as IString;
```

For types or infrastructure with very different backing implementations, we define an abstraction
layer over the implementation. The `log` module, for example, could use any of a number of logging
frameworks. Its (crate) public interface consists only of the macros `critical!`, `error!`,
`warning!`, `info!`, `debug!`, and `trace!`, plus `init_logging()`. The backing implementation
(`tracing`) is encapsulated in the `log` module.

*/

mod nat_set;
mod memory;
mod string_util;
mod partial_ordering;
mod index_set;

// Aliases and utility
pub use partial_ordering::*;

// Arbitrary precision arithmetic
pub mod numeric;

pub mod special_index;

// region Hashing data structures
pub use std::collections::HashSet;
pub use std::collections::HashMap;

// For vectors that are expected to have few or zero elements.
pub use smallvec::{SmallVec, smallvec};

/// A hash set used for membership testing without needing to recover the original value.
pub type Set<T> = HashSet<T>;
// endregion

// Logging
pub use tracing;
pub mod log;

// Interned string. Backed by a global cache usable across threads.
pub use string_cache::DefaultAtom as IString;

// Generic memory utilities
pub use memory::as_bytes;

// Hash-consing store: maps a key (or a value that is its own key) to a stable index.
pub use index_set::IndexSet;

// A set of (small) natural numbers.
pub use nat_set::NatSet;

// Join sequences with a separator; render an integer as Unicode subscript digits.
pub use string_util::{join_string, join_iter, int_to_subscript};
