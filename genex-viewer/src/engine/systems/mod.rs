//! Desktop-only runtime systems.
//!
//! The browser build renders its controls in the host page, so these only
//! exist on native targets.

/// Status line, enabled-action hints and selected image thumbnail.
pub mod status_overlay;
