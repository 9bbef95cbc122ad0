//! Viewport camera for scene navigation.
//!
//! Orbit, pan and zoom around a focus point with damped easing. Camera state
//! lives outside the scene layers, so the user's viewpoint survives every
//! pipeline stage.

/// Viewport camera resource and controller system.
pub mod viewport_camera;
