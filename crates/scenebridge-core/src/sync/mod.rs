// ── Synchronization handlers ──
//
// ChangeHandler (scene -> state) and WriteHandler (state -> scene) are
// live subscriptions. Both implement `Disposable`; whoever receives them
// from the binder owns their teardown.

mod change;
mod write;

pub use change::ChangeHandler;
pub use write::WriteHandler;

use tracing::debug;

/// A live subscription resource.
///
/// `dispose` releases the underlying subscription exactly once; later
/// calls are no-ops.
pub trait Disposable: Send + Sync {
    fn dispose(&self);

    fn is_disposed(&self) -> bool;

    /// Short description for logs, e.g. `change(IsRunning) on scene 3`.
    fn label(&self) -> String;
}

/// Owned collection of handlers torn down together.
///
/// Dropping the set drops, and so disposes, every handler in it.
#[derive(Default)]
#[must_use = "dropping the set disposes every handler"]
pub struct DisposableSet {
    items: Vec<Box<dyn Disposable>>,
}

impl DisposableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Disposable + 'static) {
        self.items.push(Box::new(item));
    }

    /// Move every handler of `other` into this set.
    pub fn append(&mut self, mut other: DisposableSet) {
        self.items.append(&mut other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handlers not yet disposed.
    pub fn active(&self) -> usize {
        self.items.iter().filter(|h| !h.is_disposed()).count()
    }

    pub fn labels(&self) -> Vec<String> {
        self.items.iter().map(|h| h.label()).collect()
    }

    /// Dispose every handler, skipping those already disposed.
    /// Returns how many were released by this call.
    pub fn dispose_all(&self) -> usize {
        let mut released = 0;
        for item in &self.items {
            if !item.is_disposed() {
                item.dispose();
                released += 1;
            }
        }
        debug!(released, total = self.items.len(), "disposed handlers");
        released
    }
}

impl std::fmt::Debug for DisposableSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposableSet")
            .field("len", &self.items.len())
            .field("active", &self.active())
            .finish()
    }
}
