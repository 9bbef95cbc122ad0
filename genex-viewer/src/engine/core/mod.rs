//! Application assembly, configuration and window setup.
//!
//! Handles plugin wiring for both native and WASM targets.

/// Builds the app: default plugins, viewport, pipeline and host bridge.
///
/// The stage client is constructed here from [`config::ViewerConfig`].
pub mod app_setup;

/// Runtime configuration from the environment or the hosting page.
pub mod config;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
