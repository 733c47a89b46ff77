//! Core data types: pair identifiers, order sides, order requests, fills
//! and account snapshots.

pub mod enums;
pub mod pair;
pub mod trading;

pub use enums::*;
pub use pair::*;
pub use trading::*;
