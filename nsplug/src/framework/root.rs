use super::namespace::{Context, Namespace};
use std::sync::Arc;

/// The object a plugin author hands to the engine.
///
/// A root is either a shared [`Namespace`] used for every execution, or a
/// [`NamespaceCreator`] that builds a fresh namespace per execution. Roots
/// providing neither are rejected at configure time.
pub trait Root: Send + Sync {
    /// Receives the plugin configuration exactly once, before any lookup.
    fn configure(&self, config: &Context) -> anyhow::Result<()>;

    /// Releases resources when the plugin instance shuts down.
    fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The shared namespace, for roots that are themselves a namespace.
    /// Implementations return `Some(self)`.
    fn as_namespace(self: Arc<Self>) -> Option<Arc<dyn Namespace>> {
        None
    }

    fn as_creator(&self) -> Option<&dyn NamespaceCreator> {
        None
    }
}

/// Builds the per-execution namespace.
pub trait NamespaceCreator: Send + Sync {
    /// Called at most once per execution id while that execution is live.
    fn namespace(&self) -> Arc<dyn Namespace>;
}
