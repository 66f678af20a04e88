//! Modal dialog lifecycle
//!
//! One `DialogController` owns at most one modal surface at a time and moves
//! it through opening, opened, closing and closed, running the per-kind
//! hooks registered at construction and publishing an event for each phase.
//!
//! Rendering is left to the hooks and the native modal behaviour to the
//! `Surface` implementation; `headless` provides an in-memory one.

pub mod controller;
pub mod events;
pub mod headless;
pub mod hooks;
pub mod signal;
pub mod styles;
pub mod surface;
pub mod types;

pub use controller::DialogController;
pub use events::{DialogEvent, EventBus, LifecycleEvent};
pub use hooks::{DialogHooks, HookRegistry, HookSet};
pub use signal::Signal;
pub use surface::{PointerTarget, Surface, SurfaceFactory, SurfaceHandle};
pub use types::*;
