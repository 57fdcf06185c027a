/*!

Arbitrary precision arithmetic and number traits.

*/



// Arbitrary precision arithmetic
pub use num_bigint::{
  BigInt,
  BigUint,
  ParseBigIntError,
  ToBigInt,
  ToBigUint,
  Sign
};

pub use num_traits as traits;
