//! Modal surface abstraction
//!
//! The controller never renders anything itself. It drives a `Surface`,
//! the platform's modal primitive, through show/close/attach calls and
//! waits on its frame and animation futures. Implementations are expected
//! to behave like a native modal: `close` on a shown surface hides it and
//! emits exactly one close notification.

use super::types::DialogPhase;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier of a surface instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure reported by a single running animation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Animation '{name}' did not finish: {reason}")]
pub struct AnimationError {
    pub name: String,
    pub reason: String,
}

/// A running animation; resolves once it finishes or is cancelled
pub type AnimationFuture = BoxFuture<'static, Result<(), AnimationError>>;

/// Where a pointer-down landed relative to the modal surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The surface element itself, i.e. the backdrop outside the content
    Surface,
    /// Anything inside the dialog content
    Content,
}

/// Channel a surface uses to report its native close
#[derive(Debug, Clone)]
pub struct CloseNotifier {
    sender: mpsc::UnboundedSender<SurfaceId>,
}

impl CloseNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SurfaceId>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Report that the surface closed. Returns false once the listener is gone.
    pub fn notify(&self, id: SurfaceId) -> bool {
        self.sender.send(id).is_ok()
    }
}

/// Platform modal primitive driven by the controller
pub trait Surface: Send + Sync + fmt::Debug {
    fn id(&self) -> SurfaceId;

    /// Insert the surface into the document
    fn attach(&self);

    /// Remove the surface from the document
    fn detach(&self);

    fn is_attached(&self) -> bool;

    /// Native "show as modal"; sets the open marker
    fn show_modal(&self);

    /// Whether the native open marker is present
    fn is_shown(&self) -> bool;

    /// Native close. Records `reason` as the return value; when shown, hides
    /// the surface and sends one close notification.
    fn close(&self, reason: &str);

    /// Return value recorded by the last close
    fn return_value(&self) -> Option<String>;

    fn phase(&self) -> Option<DialogPhase>;

    /// Replace the phase marker; `None` clears it
    fn set_phase(&self, phase: Option<DialogPhase>);

    /// Resolves after the next rendering frame has been painted
    fn next_frame(&self) -> BoxFuture<'static, ()>;

    /// Animations currently running on the surface
    fn running_animations(&self) -> Vec<AnimationFuture>;
}

/// Shared handle to the live surface
pub type SurfaceHandle = Arc<dyn Surface>;

/// Creates fresh surfaces for the controller
pub trait SurfaceFactory: Send + Sync {
    fn create(&self, notifier: CloseNotifier) -> SurfaceHandle;
}

impl<F> SurfaceFactory for F
where
    F: Fn(CloseNotifier) -> SurfaceHandle + Send + Sync,
{
    fn create(&self, notifier: CloseNotifier) -> SurfaceHandle {
        self(notifier)
    }
}
