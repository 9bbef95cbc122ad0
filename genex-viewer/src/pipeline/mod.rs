//! Image-to-map pipeline: state machine, stage client and the Bevy glue
//! that connects them.
//!
//! The [`controller::PipelineController`] owns all pipeline state. It never
//! performs IO itself; it queues stage requests and viewport updates which
//! the systems in [`dispatch`] carry out, one frame at a time.

/// Stage and pipeline state enums with the transition helpers.
pub mod state;

/// Artifacts exchanged with the stage server.
pub mod artifacts;

/// Error taxonomy surfaced through the status channel.
pub mod errors;

/// Last-write-wins status line.
pub mod status;

/// File selection, MIME detection and preview.
pub mod input;

/// Stage client trait and its HTTP implementation.
pub mod client;

/// Transition table and staleness tracking.
pub mod controller;

/// Systems running actions, stage calls and viewport forwarding.
pub mod dispatch;

/// Desktop keyboard, drop and startup bindings.
#[cfg(not(target_arch = "wasm32"))]
pub mod bindings;

use crate::engine::viewport::ViewportUpdate;
use bevy::prelude::*;
use controller::PipelineController;
use dispatch::{
    InFlightStages, PipelineAction, dispatch_stage_requests, forward_viewport_updates,
    handle_pipeline_actions, poll_stage_tasks,
};
use input::ImagePreviewState;
use status::StatusReporter;

/// Runs once per frame after anything that emits [`PipelineAction`]s.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineSet;

/// Controller, status and the frame-by-frame stage dispatch.
///
/// The stage client is not installed here; insert a
/// [`client::StageClientHandle`] alongside the plugin.
pub struct PipelinePlugin;

impl Plugin for PipelinePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PipelineController>()
            .init_resource::<StatusReporter>()
            .init_resource::<ImagePreviewState>()
            .init_resource::<InFlightStages>()
            .add_event::<PipelineAction>()
            .add_event::<ViewportUpdate>()
            .add_systems(
                Update,
                (
                    handle_pipeline_actions,
                    dispatch_stage_requests,
                    poll_stage_tasks,
                    forward_viewport_updates,
                )
                    .chain()
                    .in_set(PipelineSet),
            );
    }
}
