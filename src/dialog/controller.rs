//! Dialog controller driving a single modal surface through its lifecycle
//!
//! The controller is responsible for:
//! - Creating, attaching and detaching the one live surface
//! - Ordering hooks, the first-paint frame, native show and animation waits
//! - Publishing lifecycle events and resolving the `opened`/`closed` signals
//! - Turning the surface's native close notification into the closing sequence
//!
//! Phases run strictly in order for a pass:
//! opening → frame → show → entry animations → opened → … →
//! closing → exit animations → closed → detach.

use super::{
    events::{DialogEvent, EventBus, LifecycleEvent},
    hooks::{DialogHooks, HookRegistry},
    signal::Signal,
    surface::{CloseNotifier, PointerTarget, SurfaceFactory, SurfaceHandle, SurfaceId},
    types::*,
};
use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Default capacity of the lifecycle event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 32;

/// The dialog currently bound to the controller
struct ActiveDialog {
    kind: DialogKind,
    surface: SurfaceHandle,
    hooks: Arc<dyn DialogHooks>,
    /// Task waiting for this surface's native close
    listener: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct ControllerState {
    active: Option<ActiveDialog>,
    /// Set while `open` creates a surface outside the lock
    reserved: bool,
    is_open: bool,
    close_error: Option<DialogError>,
}

struct ControllerInner {
    registry: HookRegistry,
    factory: Arc<dyn SurfaceFactory>,
    state: Mutex<ControllerState>,
    events: EventBus,
    opened: Signal<SurfaceHandle>,
    closed: Signal<SurfaceHandle>,
}

/// Lifecycle controller for one modal surface.
///
/// Cloning is cheap and every clone drives the same surface. Requires a
/// tokio runtime: each opened surface gets a task listening for its
/// native close.
#[derive(Clone)]
pub struct DialogController {
    inner: Arc<ControllerInner>,
}

impl DialogController {
    pub fn new(registry: HookRegistry, factory: impl SurfaceFactory + 'static) -> Self {
        Self::with_event_capacity(registry, factory, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(
        registry: HookRegistry,
        factory: impl SurfaceFactory + 'static,
        capacity: usize,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                registry,
                factory: Arc::new(factory),
                state: Mutex::new(ControllerState::default()),
                events: EventBus::new(capacity),
                opened: Signal::new(),
                closed: Signal::new(),
            }),
        }
    }

    /// Open a dialog of `kind`.
    ///
    /// Fails with [`DialogError::UnknownKind`] before touching any state if
    /// the kind is not registered. Does nothing while a surface is already
    /// held. A failing opening or opened hook is returned as
    /// [`DialogError::Hook`] and leaves the surface where the sequence stopped.
    ///
    /// A native close that fires before this returns is held back until the
    /// opened phase has run, so the closing sequence never overlaps it.
    pub async fn open(&self, kind: impl Into<DialogKind>, params: DialogParams) -> DialogResult<()> {
        let kind = kind.into();
        let hooks = self.inner.registry.get(&kind).ok_or_else(|| {
            warn!(kind = %kind, "open requested for unregistered dialog kind");
            DialogError::UnknownKind(kind.clone())
        })?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| DialogError::NoRuntime)?;

        {
            let mut state = self.inner.state.lock();
            if state.active.is_some() || state.reserved {
                let current = state.active.as_ref().map(|active| active.kind.to_string());
                warn!(
                    kind = %kind,
                    current = ?current,
                    "dialog already open, ignoring open request"
                );
                return Ok(());
            }
            state.reserved = true;
        }

        // The factory and the surface may call back into the controller
        let (notifier, close_rx) = CloseNotifier::channel();
        let surface = self.inner.factory.create(notifier);
        surface.attach();

        // Closing waits until this pass has finished its opened phase
        let (entry_tx, entry_rx) = watch::channel(false);
        let _entry = EntryGuard(entry_tx);

        let listener = runtime.spawn(listen_for_close(
            Arc::downgrade(&self.inner),
            surface.id(),
            close_rx,
            entry_rx,
        ));
        {
            let mut state = self.inner.state.lock();
            state.reserved = false;
            state.active = Some(ActiveDialog {
                kind: kind.clone(),
                surface: surface.clone(),
                hooks: hooks.clone(),
                listener: Some(listener),
            });
        }
        debug!(kind = %kind, surface = %surface.id(), "dialog surface attached");

        surface.set_phase(Some(DialogPhase::Opening));
        self.emit(LifecycleEvent::Opening, &kind, &surface);
        run_hook(&kind, DialogPhase::Opening, hooks.opening(&surface, &params)).await?;

        // Let whatever the opening hook rendered reach the screen before showing
        surface.next_frame().await;
        surface.show_modal();
        settle_animations(&kind, &surface).await;

        if !self.is_current(surface.id()) {
            debug!(kind = %kind, "dialog surface replaced during entry, abandoning open");
            return Ok(());
        }

        self.inner.state.lock().is_open = true;
        self.inner.closed.reset();
        surface.set_phase(Some(DialogPhase::Opened));
        self.inner.opened.resolve(surface.clone());
        self.emit(LifecycleEvent::Opened, &kind, &surface);
        info!(kind = %kind, "dialog opened");
        run_hook(&kind, DialogPhase::Opened, hooks.opened(&surface, &params)).await
    }

    /// Trigger the native close, recording `reason` as the return value
    pub fn close(&self, reason: &str) {
        match self.surface() {
            Some(surface) => {
                debug!(reason, surface = %surface.id(), "closing dialog surface");
                surface.close(reason);
            }
            None => debug!(reason, "close requested with no dialog surface"),
        }
    }

    /// `close` with the default `"programmatic"` reason
    pub fn close_programmatic(&self) {
        self.close(PROGRAMMATIC_REASON);
    }

    /// Light-dismiss: a pointer-down on the shown surface itself closes with
    /// `"dismiss"`; a pointer-down on content does nothing. Returns whether a
    /// close was triggered.
    pub fn pointer_down(&self, target: PointerTarget) -> bool {
        if target != PointerTarget::Surface {
            return false;
        }
        match self.surface() {
            Some(surface) if surface.is_shown() => {
                debug!(surface = %surface.id(), "pointer-down on backdrop");
                surface.close(DISMISS_REASON);
                true
            }
            _ => false,
        }
    }

    /// Run `f` against the current surface without any lifecycle effect
    pub fn modify<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<&SurfaceHandle>) -> R,
    {
        let surface = self.surface();
        f(surface.as_ref())
    }

    /// Forcefully drop the current surface without running hooks.
    ///
    /// Recovery path for a lifecycle interrupted by a failing hook: detaches
    /// the surface, stops its close listener and resets the controller so the
    /// next `open` starts fresh. Returns false if nothing was held.
    pub fn discard(&self) -> bool {
        let active = {
            let mut state = self.inner.state.lock();
            state.is_open = false;
            state.active.take()
        };
        let Some(active) = active else {
            return false;
        };

        if let Some(listener) = active.listener {
            listener.abort();
        }
        active.surface.set_phase(None);
        active.surface.detach();
        self.inner.opened.reset();
        warn!(kind = %active.kind, "dialog surface discarded");
        true
    }

    pub fn is_open(&self) -> bool {
        self.inner.state.lock().is_open
    }

    pub fn current_kind(&self) -> Option<DialogKind> {
        self.inner.state.lock().active.as_ref().map(|active| active.kind.clone())
    }

    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.inner.state.lock().active.as_ref().map(|active| active.surface.clone())
    }

    /// Phase marker of the current surface
    pub fn phase(&self) -> Option<DialogPhase> {
        self.surface().and_then(|surface| surface.phase())
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.inner.registry
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DialogEvent> {
        self.inner.events.subscribe()
    }

    pub fn opened_signal(&self) -> &Signal<SurfaceHandle> {
        &self.inner.opened
    }

    pub fn closed_signal(&self) -> &Signal<SurfaceHandle> {
        &self.inner.closed
    }

    /// Wait for the current `opened` pass
    pub async fn opened(&self) -> Option<SurfaceHandle> {
        self.inner.opened.wait().await
    }

    /// Wait for the current `closed` pass
    pub async fn closed(&self) -> Option<SurfaceHandle> {
        self.inner.closed.wait().await
    }

    /// Error raised by the most recent closing sequence, if any
    pub fn take_close_error(&self) -> Option<DialogError> {
        self.inner.state.lock().close_error.take()
    }

    fn is_current(&self, id: SurfaceId) -> bool {
        self.inner
            .state
            .lock()
            .active
            .as_ref()
            .is_some_and(|active| active.surface.id() == id)
    }

    fn emit(&self, event: LifecycleEvent, kind: &DialogKind, surface: &SurfaceHandle) {
        self.inner
            .events
            .publish(DialogEvent::new(event, kind.clone(), surface.clone()));
    }

    /// Closing sequence, run once per surface after its native close.
    ///
    /// A failing closing or closed hook skips the hooks left in the pass,
    /// but the teardown still happens: the surface always ends up closed,
    /// detached and released, and `closed` always resolves.
    async fn run_close_sequence(&self, id: SurfaceId) -> DialogResult<()> {
        let (kind, surface, hooks) = {
            let state = self.inner.state.lock();
            match &state.active {
                Some(active) if active.surface.id() == id => (
                    active.kind.clone(),
                    active.surface.clone(),
                    active.hooks.clone(),
                ),
                _ => return Ok(()),
            }
        };

        surface.set_phase(Some(DialogPhase::Closing));
        self.emit(LifecycleEvent::Closing, &kind, &surface);
        let mut failure = run_hook(&kind, DialogPhase::Closing, hooks.closing(&surface))
            .await
            .err();

        settle_animations(&kind, &surface).await;

        self.inner.state.lock().is_open = false;
        surface.set_phase(Some(DialogPhase::Closed));
        self.inner.closed.resolve(surface.clone());
        self.emit(LifecycleEvent::Closed, &kind, &surface);
        if failure.is_none() {
            failure = run_hook(&kind, DialogPhase::Closed, hooks.closed(&surface))
                .await
                .err();
        }

        surface.detach();
        {
            let mut state = self.inner.state.lock();
            if state.active.as_ref().is_some_and(|active| active.surface.id() == id) {
                state.active = None;
            }
        }
        self.inner.opened.reset();
        info!(kind = %kind, reason = ?surface.return_value(), "dialog closed");

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for DialogController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogController")
            .field("kinds", &self.inner.registry.kinds())
            .field("current_kind", &self.current_kind())
            .field("is_open", &self.is_open())
            .finish()
    }
}

/// Marks the opening pass of a surface as finished when dropped, including
/// when `open` returns early or its future is cancelled
struct EntryGuard(watch::Sender<bool>);

impl Drop for EntryGuard {
    fn drop(&mut self) {
        self.0.send_replace(true);
    }
}

/// Waits for the native close of surface `id`, then runs the closing sequence
/// once the opening pass of that surface has finished
async fn listen_for_close(
    inner: Weak<ControllerInner>,
    id: SurfaceId,
    mut close_rx: mpsc::UnboundedReceiver<SurfaceId>,
    mut entry_rx: watch::Receiver<bool>,
) {
    while let Some(closed_id) = close_rx.recv().await {
        if closed_id != id {
            continue;
        }
        if !*entry_rx.borrow() {
            debug!(surface = %id, "close requested during opening, deferring closing sequence");
            let _ = entry_rx.wait_for(|finished| *finished).await;
        }
        let Some(inner) = inner.upgrade() else {
            return;
        };
        let controller = DialogController { inner };
        if let Err(err) = controller.run_close_sequence(id).await {
            controller.inner.state.lock().close_error = Some(err);
        }
        return;
    }
}

async fn run_hook<F>(kind: &DialogKind, phase: DialogPhase, hook: F) -> DialogResult<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    hook.await.map_err(|source| {
        error!(kind = %kind, phase = %phase, error = %source, "dialog hook failed");
        DialogError::Hook {
            kind: kind.clone(),
            phase,
            source,
        }
    })
}

/// Wait for every running animation to finish, successful or not
async fn settle_animations(kind: &DialogKind, surface: &SurfaceHandle) {
    let outcomes = join_all(surface.running_animations()).await;
    for err in outcomes.into_iter().filter_map(Result::err) {
        debug!(kind = %kind, error = %err, "animation settled with failure");
    }
}
