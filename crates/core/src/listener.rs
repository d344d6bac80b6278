use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

/// Return type of event and config-change listeners.
pub type CallbackResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Callback<E> = Box<dyn Fn(&E) -> CallbackResult + Send>;

/// Ordered list of synchronous listeners for events of type `E`.
///
/// A listener that returns `Err` or panics is logged and skipped; the
/// remaining listeners still run and the publisher never sees the failure.
pub struct Listeners<E> {
    callbacks: Vec<Callback<E>>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

impl<E: fmt::Debug> Listeners<E> {
    pub fn register(&mut self, callback: impl Fn(&E) -> CallbackResult + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Deliver `event` to every listener in registration order.
    pub fn emit(&self, event: &E) {
        for (index, callback) in self.callbacks.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Listener #{index} failed on {event:?}: {e}"),
                Err(_) => warn!("Listener #{index} panicked on {event:?}"),
            }
        }
    }
}
