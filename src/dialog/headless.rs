//! In-memory document and surface.
//!
//! Behaves like a native modal element: showing and closing start
//! timed animations, closing a shown surface notifies the controller once,
//! and the document suppresses scrolling while any surface is shown. Used
//! by the demo binary and the test suite.

use super::{
    surface::{
        AnimationError, AnimationFuture, CloseNotifier, Surface, SurfaceFactory, SurfaceHandle,
        SurfaceId,
    },
    types::DialogPhase,
};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct DocumentState {
    attached: Vec<SurfaceId>,
    shown: HashSet<SurfaceId>,
    stylesheet: Option<String>,
}

/// Shared document root
#[derive(Debug, Clone, Default)]
pub struct Document {
    state: Arc<Mutex<DocumentState>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.state.lock().attached.contains(&id)
    }

    pub fn attached_count(&self) -> usize {
        self.state.lock().attached.len()
    }

    /// True while any attached surface is shown
    pub fn scroll_suppressed(&self) -> bool {
        !self.state.lock().shown.is_empty()
    }

    /// Install a stylesheet unless one is already present
    pub fn install_stylesheet(&self, css: &str) -> bool {
        let mut state = self.state.lock();
        if state.stylesheet.is_some() {
            return false;
        }
        state.stylesheet = Some(css.to_string());
        true
    }

    pub fn has_stylesheet(&self) -> bool {
        self.state.lock().stylesheet.is_some()
    }

    fn attach(&self, id: SurfaceId) {
        let mut state = self.state.lock();
        if !state.attached.contains(&id) {
            state.attached.push(id);
        }
    }

    fn detach(&self, id: SurfaceId) {
        let mut state = self.state.lock();
        state.attached.retain(|attached| *attached != id);
        state.shown.remove(&id);
    }

    fn set_shown(&self, id: SurfaceId, shown: bool) {
        let mut state = self.state.lock();
        if shown {
            state.shown.insert(id);
        } else {
            state.shown.remove(&id);
        }
    }
}

/// Frame and animation timing of a headless surface
#[derive(Debug, Clone)]
pub struct SurfaceTiming {
    pub frame: Duration,
    pub entry_animation: Duration,
    pub exit_animation: Duration,
    /// Extra animation started alongside entry and exit that always fails
    pub failing_animation: Option<Duration>,
}

impl Default for SurfaceTiming {
    fn default() -> Self {
        Self {
            frame: Duration::from_millis(16),
            entry_animation: Duration::from_millis(150),
            exit_animation: Duration::from_millis(150),
            failing_animation: None,
        }
    }
}

impl SurfaceTiming {
    /// No frame delay and no animations
    pub fn instant() -> Self {
        Self {
            frame: Duration::ZERO,
            entry_animation: Duration::ZERO,
            exit_animation: Duration::ZERO,
            failing_animation: None,
        }
    }

    pub fn with_failing_animation(mut self, duration: Duration) -> Self {
        self.failing_animation = Some(duration);
        self
    }
}

#[derive(Debug, Clone)]
struct ScheduledAnimation {
    name: &'static str,
    ends_at: Instant,
    fails: bool,
}

#[derive(Debug, Default)]
struct SurfaceState {
    attached: bool,
    shown: bool,
    return_value: Option<String>,
    phase: Option<DialogPhase>,
    phase_history: Vec<DialogPhase>,
    animations: Vec<ScheduledAnimation>,
    frames_painted: u64,
    close_notifications: u32,
}

/// In-memory modal surface
#[derive(Debug)]
pub struct HeadlessSurface {
    id: SurfaceId,
    document: Document,
    notifier: CloseNotifier,
    timing: SurfaceTiming,
    state: Arc<Mutex<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new(document: Document, notifier: CloseNotifier) -> Self {
        Self::with_timing(document, notifier, SurfaceTiming::instant())
    }

    pub fn with_timing(document: Document, notifier: CloseNotifier, timing: SurfaceTiming) -> Self {
        Self {
            id: SurfaceId::new(),
            document,
            notifier,
            timing,
            state: Arc::new(Mutex::new(SurfaceState::default())),
        }
    }

    /// Platform-level dismissal such as the escape key; keeps the return value
    pub fn dismiss(&self) {
        self.hide(None);
    }

    /// Phase markers in the order they were applied
    pub fn phase_history(&self) -> Vec<DialogPhase> {
        self.state.lock().phase_history.clone()
    }

    pub fn frames_painted(&self) -> u64 {
        self.state.lock().frames_painted
    }

    pub fn close_notifications(&self) -> u32 {
        self.state.lock().close_notifications
    }

    fn start_animations(&self, state: &mut SurfaceState, name: &'static str, duration: Duration) {
        let now = Instant::now();
        state.animations.push(ScheduledAnimation {
            name,
            ends_at: now + duration,
            fails: false,
        });
        if let Some(failing) = self.timing.failing_animation {
            state.animations.push(ScheduledAnimation {
                name: "flourish",
                ends_at: now + failing,
                fails: true,
            });
        }
    }

    fn hide(&self, reason: Option<&str>) {
        {
            let mut state = self.state.lock();
            if !state.shown {
                return;
            }
            if let Some(reason) = reason {
                state.return_value = Some(reason.to_string());
            }
            state.shown = false;
            state.close_notifications += 1;
            let exit = self.timing.exit_animation;
            self.start_animations(&mut state, "exit", exit);
        }
        self.document.set_shown(self.id, false);
        debug!(surface = %self.id, ?reason, "surface closed");
        self.notifier.notify(self.id);
    }
}

impl Surface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn attach(&self) {
        self.state.lock().attached = true;
        self.document.attach(self.id);
    }

    fn detach(&self) {
        {
            let mut state = self.state.lock();
            state.attached = false;
            state.shown = false;
        }
        self.document.detach(self.id);
    }

    fn is_attached(&self) -> bool {
        self.state.lock().attached
    }

    fn show_modal(&self) {
        {
            let mut state = self.state.lock();
            if state.shown {
                return;
            }
            state.shown = true;
            state.return_value = None;
            let entry = self.timing.entry_animation;
            self.start_animations(&mut state, "entry", entry);
        }
        self.document.set_shown(self.id, true);
    }

    fn is_shown(&self) -> bool {
        self.state.lock().shown
    }

    fn close(&self, reason: &str) {
        self.hide(Some(reason));
    }

    fn return_value(&self) -> Option<String> {
        self.state.lock().return_value.clone()
    }

    fn phase(&self) -> Option<DialogPhase> {
        self.state.lock().phase
    }

    fn set_phase(&self, phase: Option<DialogPhase>) {
        let mut state = self.state.lock();
        state.phase = phase;
        if let Some(phase) = phase {
            state.phase_history.push(phase);
        }
    }

    fn next_frame(&self) -> BoxFuture<'static, ()> {
        let frame = self.timing.frame;
        let state = self.state.clone();
        Box::pin(async move {
            if frame.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(frame).await;
            }
            state.lock().frames_painted += 1;
        })
    }

    fn running_animations(&self) -> Vec<AnimationFuture> {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.animations.retain(|animation| animation.ends_at > now || animation.fails);
        let running: Vec<_> = state.animations.drain(..).collect();

        running
            .into_iter()
            .map(|animation| -> AnimationFuture {
                Box::pin(async move {
                    tokio::time::sleep_until(animation.ends_at).await;
                    if animation.fails {
                        Err(AnimationError {
                            name: animation.name.to_string(),
                            reason: "cancelled".to_string(),
                        })
                    } else {
                        Ok(())
                    }
                })
            })
            .collect()
    }
}

/// Creates headless surfaces on a shared document
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    document: Document,
    timing: SurfaceTiming,
    created: Arc<Mutex<Vec<Arc<HeadlessSurface>>>>,
}

impl HeadlessFactory {
    pub fn new(document: Document, timing: SurfaceTiming) -> Self {
        Self {
            document,
            timing,
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Every surface this factory has created, oldest first
    pub fn created(&self) -> Vec<Arc<HeadlessSurface>> {
        self.created.lock().clone()
    }

    pub fn last(&self) -> Option<Arc<HeadlessSurface>> {
        self.created.lock().last().cloned()
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create(&self, notifier: CloseNotifier) -> SurfaceHandle {
        let surface = Arc::new(HeadlessSurface::with_timing(
            self.document.clone(),
            notifier,
            self.timing.clone(),
        ));
        self.created.lock().push(surface.clone());
        surface
    }
}
