//! Host-facing refresh callbacks.

/// Callbacks the host registers to run its actual refresh/load work.
///
/// Registered as `Rc<dyn RefreshListener>`; invoked on the engine's thread.
pub trait RefreshListener {
    /// An ordinary (single-stage) refresh has started.
    fn on_refreshing(&self);

    /// A load-more has started.
    fn on_loading_more(&self) {}
}
