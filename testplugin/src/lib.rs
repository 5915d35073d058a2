//! Reference plugins for the nsplug framework.
//!
//! - [`suffix`]: a shared root namespace; every key resolves to the key with
//!   a configurable suffix appended.
//! - [`session`]: a per-execution root; each execution owns a running tally
//!   that functions mutate and lookups read back.

pub mod session;
pub mod suffix;

pub use session::{SessionRoot, Tally};
pub use suffix::SuffixRoot;
