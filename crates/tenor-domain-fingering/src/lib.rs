//! Static fingering model of a tenor saxophone: playable range, which keys each
//! note engages, which keys act as single-press triggers, and note naming.
//!
//! Everything here is pure data and total functions; unknown notes and keys
//! resolve to empty results rather than errors.

pub mod fingering;
pub mod keys;
pub mod names;
pub mod range;

pub use fingering::*;
pub use keys::*;
pub use names::*;
pub use range::*;
