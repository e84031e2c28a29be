//! Render store: the single current [`RenderModel`] and its subscribers.
//!
//! The scheduler pipeline is the only writer. Readers either poll
//! [`RenderStore::current`], stream through [`RenderStore::watch`], or
//! register a [`PresentationAdapter`] that is pushed every change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use firewatch_types::RenderModel;
use tokio::sync::watch;
use tracing::debug;

/// Translates a render model into draw calls.
///
/// Adapters run synchronously on the publishing task and must not block.
/// An adapter must not call back into the store it is registered with.
pub trait PresentationAdapter: Send {
    /// Draw the given model.
    fn render(&mut self, model: &RenderModel);
}

impl<F> PresentationAdapter for F
where
    F: FnMut(&RenderModel) + Send,
{
    fn render(&mut self, model: &RenderModel) {
        self(model);
    }
}

/// Handle returned by [`RenderStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscribers = Vec<(SubscriptionId, Box<dyn PresentationAdapter>)>;

/// Holder of the current render model.
pub struct RenderStore {
    sender: watch::Sender<Arc<RenderModel>>,
    adapters: Mutex<Subscribers>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RenderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderStore")
            .field("cycle", &self.sender.borrow().cycle)
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl RenderStore {
    /// Create a store seeded with `initial`.
    pub fn new(initial: RenderModel) -> Self {
        let (sender, _) = watch::channel(Arc::new(initial));
        Self {
            sender,
            adapters: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// The current render model.
    pub fn current(&self) -> Arc<RenderModel> {
        Arc::clone(&self.sender.borrow())
    }

    /// A receiver that observes every published model.
    ///
    /// The receiver starts with the current model marked as seen.
    pub fn watch(&self) -> watch::Receiver<Arc<RenderModel>> {
        self.sender.subscribe()
    }

    /// Register an adapter. It is rendered immediately with the current
    /// model and then on every change until unsubscribed.
    pub fn subscribe<A>(&self, mut adapter: A) -> SubscriptionId
    where
        A: PresentationAdapter + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut adapters = self.adapters.lock().unwrap_or_else(PoisonError::into_inner);
        adapter.render(&self.current());
        adapters.push((id, Box::new(adapter)));
        debug!(subscription = id.0, "presentation adapter subscribed");
        id
    }

    /// Remove an adapter. Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut adapters = self.adapters.lock().unwrap_or_else(PoisonError::into_inner);
        let before = adapters.len();
        adapters.retain(|(existing, _)| *existing != id);
        adapters.len() != before
    }

    /// Number of registered adapters.
    pub fn subscriber_count(&self) -> usize {
        self.adapters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Replace the current model and notify subscribers.
    ///
    /// Returns `false` (and notifies nobody) if `model` equals the current
    /// one.
    pub(crate) fn publish(&self, model: RenderModel) -> bool {
        // Held across the swap so a concurrent subscribe sees either the
        // old model plus this render, or the new model only.
        let mut adapters = self.adapters.lock().unwrap_or_else(PoisonError::into_inner);
        if **self.sender.borrow() == model {
            return false;
        }
        let model = Arc::new(model);
        self.sender.send_replace(Arc::clone(&model));
        for (_, adapter) in adapters.iter_mut() {
            adapter.render(&model);
        }
        true
    }
}
