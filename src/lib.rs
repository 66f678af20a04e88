//! Lifecycle controller for a single modal dialog surface.
//!
//! See [`dialog::DialogController`] for the entry point.

pub mod config;
pub mod dialog;

pub use config::Config;
pub use dialog::{
    DialogController, DialogError, DialogEvent, DialogHooks, DialogKind, DialogParams,
    DialogPhase, DialogResult, HookRegistry, HookSet, LifecycleEvent, PointerTarget, Signal,
    Surface, SurfaceFactory, SurfaceHandle,
};
