//! Viewport runtime: render surface, camera, lighting and the scene layers.
//!
//! The runtime knows nothing about the pipeline. It consumes
//! [`ViewportUpdate`] events, each of which replaces one visual layer, and
//! keeps the perspective projection in step with the container size.

/// Layer bookkeeping and the system applying viewport updates.
pub mod layers;

/// Container resize handling for the perspective projection.
pub mod resize;

/// Camera, lighting and plugin wiring.
pub mod runtime;

use crate::pipeline::artifacts::{Environment, MapArtifact, Trajectory};
use bevy::prelude::*;

pub use runtime::ViewportPlugin;

/// The narrow contract through which artifacts reach the viewport.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ViewportUpdate {
    Environment(Environment),
    Trajectory(Trajectory),
    Map(MapArtifact),
    /// Remove every layer, leaving camera and lighting untouched.
    Clear,
}
