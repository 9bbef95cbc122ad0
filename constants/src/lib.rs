//! Shared constants for the GenEx viewer.
//!
//! Grouped by concern so the viewer crate can pull in only what a module needs.

/// Camera, lighting and layer colour defaults for the viewport.
pub mod viewport;

/// Server endpoint paths and network defaults.
pub mod endpoints;

/// User-facing status messages for each pipeline stage.
pub mod status;
