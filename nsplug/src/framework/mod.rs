//! Plugin framework: capability traits plus the engine that resolves key
//! chains against them.
//!
//! A plugin author implements [`Root`] and some set of [`Namespace`]s. The
//! [`Engine`] adapts that tree to the host-facing [`Plugin`](crate::Plugin)
//! contract.

mod engine;
mod exec_cache;
mod flatten;
mod func;
mod namespace;
mod root;

pub use engine::Engine;
pub use exec_cache::ExecutionCache;
pub use flatten::flatten;
pub use func::{CallResult, Func, IntoFunc};
pub use namespace::{Callable, Constructible, Context, Fields, Mappable, Namespace, Object};
pub use root::{NamespaceCreator, Root};
