//! Styling contract for the modal surface.
//!
//! The surface covers the whole viewport and lets pointers through until it
//! is fully open. While any surface is open the document root stops
//! scrolling. The stylesheet is installed by an explicit startup call.

use super::{headless::Document, types::DialogPhase};
use tracing::debug;

pub const STYLESHEET: &str = r#"dialog.modal-surface {
  position: fixed;
  inset: 0;
  width: 100vw;
  height: 100vh;
  max-width: none;
  max-height: none;
  margin: 0;
  padding: 0;
  border: none;
  pointer-events: none;
}
dialog.modal-surface[opened] {
  pointer-events: auto;
}
:root:has(dialog.modal-surface[open]) {
  overflow: hidden;
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleInstall {
    Installed,
    AlreadyInstalled,
}

/// Install the surface stylesheet into `document`. Safe to call repeatedly.
pub fn install(document: &Document) -> StyleInstall {
    if document.install_stylesheet(STYLESHEET) {
        debug!("modal surface stylesheet installed");
        StyleInstall::Installed
    } else {
        StyleInstall::AlreadyInstalled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPolicy {
    /// Pointer events pass through the surface
    Transparent,
    /// The surface receives pointer events
    Opaque,
}

/// Pointer policy implied by the current markers
pub fn pointer_policy(phase: Option<DialogPhase>, shown: bool) -> PointerPolicy {
    match phase {
        Some(DialogPhase::Opened) if shown => PointerPolicy::Opaque,
        _ => PointerPolicy::Transparent,
    }
}
