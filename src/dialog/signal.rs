//! Resettable single-shot signal.
//!
//! Each pass of a signal resolves at most once. `reset` starts a new
//! pending pass, so `wait` always refers to the current pass and
//! `wait_next` always refers to a resolution that has not happened yet.

use tokio::sync::watch;

#[derive(Debug, Clone)]
struct SignalState<T> {
    /// Number of resolutions so far
    generation: u64,
    /// Value of the current pass, `None` while pending
    value: Option<T>,
    /// Most recent resolved value, kept across resets
    last: Option<T>,
}

pub struct Signal<T> {
    tx: watch::Sender<SignalState<T>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync,
{
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SignalState {
            generation: 0,
            value: None,
            last: None,
        });
        Self { tx }
    }

    /// Resolve the current pass. Returns false if it was already resolved.
    pub fn resolve(&self, value: T) -> bool {
        self.tx.send_if_modified(|state| {
            if state.value.is_some() {
                return false;
            }
            state.generation += 1;
            state.value = Some(value.clone());
            state.last = Some(value);
            true
        })
    }

    /// Replace a resolved pass with a fresh pending one
    pub fn reset(&self) -> bool {
        self.tx.send_if_modified(|state| state.value.take().is_some())
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().value.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.tx.borrow().generation
    }

    /// Value of the current pass, if it has resolved
    pub fn peek(&self) -> Option<T> {
        self.tx.borrow().value.clone()
    }

    /// Wait for the current pass; returns immediately if it already resolved
    pub async fn wait(&self) -> Option<T> {
        let mut rx = self.tx.subscribe();
        let seen = rx.borrow().generation;
        let state = rx
            .wait_for(|state| state.value.is_some() || state.generation > seen)
            .await
            .ok()?;
        state.last.clone()
    }

    /// Wait for the next resolution after this call, never a stale one
    pub async fn wait_next(&self) -> Option<T> {
        let mut rx = self.tx.subscribe();
        let seen = rx.borrow().generation;
        let state = rx.wait_for(|state| state.generation > seen).await.ok()?;
        state.last.clone()
    }
}

impl<T> Default for Signal<T>
where
    T: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.tx.borrow();
        f.debug_struct("Signal")
            .field("generation", &state.generation)
            .field("resolved", &state.value.is_some())
            .finish()
    }
}
