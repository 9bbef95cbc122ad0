use super::client::{StageClient, StageClientHandle};
use super::controller::{PipelineController, StageOutcome, StageRequest, StageResult};
use super::errors::{PipelineError, StageFailure, TransportError};
use super::input::{ImagePreviewState, SelectedFile, on_file_selected};
use super::state::Stage;
use super::status::StatusReporter;
use crate::engine::viewport::ViewportUpdate;
use bevy::prelude::*;
use bevy::tasks::{IoTaskPool, Task, block_on, futures_lite::future};
use serde_json::Value;

/// Everything a user (or the host page) can ask the pipeline to do.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum PipelineAction {
    /// `None` is a cancelled or empty picker.
    SelectImage(Option<SelectedFile>),
    Generate,
    Explore { goal: Option<Value> },
    Map,
}

impl PipelineAction {
    /// The stage this action dispatches. Image selection is always allowed.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::SelectImage(_) => None,
            Self::Generate => Some(Stage::Generate),
            Self::Explore { .. } => Some(Stage::Explore),
            Self::Map => Some(Stage::Map),
        }
    }
}

/// Stage calls currently running on the IO pool.
#[derive(Resource, Default)]
pub struct InFlightStages {
    tasks: Vec<Task<StageOutcome>>,
}

impl InFlightStages {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Run queued actions against the controller. Rejections go to the status
/// channel and leave the state untouched.
pub fn handle_pipeline_actions(
    mut actions: EventReader<PipelineAction>,
    mut controller: ResMut<PipelineController>,
    mut status: ResMut<StatusReporter>,
    mut preview: ResMut<ImagePreviewState>,
) {
    for action in actions.read() {
        let result = match action.clone() {
            PipelineAction::SelectImage(file) => {
                select_image(file, &mut controller, &mut status, &mut preview)
            }
            PipelineAction::Generate => controller.request_generate(&mut status),
            PipelineAction::Explore { goal } => controller.request_explore(goal, &mut status),
            PipelineAction::Map => controller.request_map(&mut status),
        };

        if let Err(error) = result {
            warn!("Rejected pipeline action: {}", error);
            status.report_error(error);
        }
    }
}

fn select_image(
    file: Option<SelectedFile>,
    controller: &mut PipelineController,
    status: &mut StatusReporter,
    preview: &mut ImagePreviewState,
) -> Result<(), PipelineError> {
    let selection = on_file_selected(file)?;
    controller.select_image(selection.payload, status)?;
    preview.current = Some(selection.preview);
    Ok(())
}

/// Hand the controller's queued requests to the stage client.
pub fn dispatch_stage_requests(
    mut controller: ResMut<PipelineController>,
    client: Option<Res<StageClientHandle>>,
    mut in_flight: ResMut<InFlightStages>,
) {
    let requests = controller.take_requests();
    if requests.is_empty() {
        return;
    }

    let pool = IoTaskPool::get();
    for request in requests {
        let ticket = request.ticket();
        info!("Dispatching {} request (epoch {})", ticket.stage, ticket.epoch);

        let task = match client.as_deref() {
            Some(handle) => start_request(pool, handle.0.as_ref(), request),
            None => {
                error!("No stage client available for {}", ticket.stage);
                let failure = StageFailure::new(
                    ticket.stage,
                    TransportError::Unreachable("no HTTP client available".to_string()),
                );
                pool.spawn(async move {
                    StageOutcome {
                        ticket,
                        result: failed_result(failure),
                    }
                })
            }
        };
        in_flight.tasks.push(task);
    }
}

fn start_request(
    pool: &IoTaskPool,
    client: &dyn StageClient,
    request: StageRequest,
) -> Task<StageOutcome> {
    let ticket = request.ticket();
    match request {
        StageRequest::Generate { payload, .. } => {
            let call = client.generate(payload);
            pool.spawn(async move {
                StageOutcome {
                    ticket,
                    result: StageResult::Generated(call.await),
                }
            })
        }
        StageRequest::Explore {
            environment_id,
            goal,
            ..
        } => {
            let call = client.explore(&environment_id, goal);
            pool.spawn(async move {
                StageOutcome {
                    ticket,
                    result: StageResult::Explored(call.await),
                }
            })
        }
        StageRequest::Map {
            environment_id,
            exploration_data,
            ..
        } => {
            let call = client.map(&environment_id, exploration_data);
            pool.spawn(async move {
                StageOutcome {
                    ticket,
                    result: StageResult::Mapped(call.await),
                }
            })
        }
    }
}

fn failed_result(failure: StageFailure) -> StageResult {
    match failure.stage {
        Stage::Generate => StageResult::Generated(Err(failure)),
        Stage::Explore => StageResult::Explored(Err(failure)),
        Stage::Map => StageResult::Mapped(Err(failure)),
    }
}

/// Collect finished stage calls without blocking the frame.
pub fn poll_stage_tasks(
    mut in_flight: ResMut<InFlightStages>,
    mut controller: ResMut<PipelineController>,
    mut status: ResMut<StatusReporter>,
) {
    in_flight
        .tasks
        .retain_mut(|task| match block_on(future::poll_once(task)) {
            Some(outcome) => {
                let stage = outcome.ticket.stage;
                if controller.complete(outcome, &mut status) {
                    info!("{} call finished", stage);
                }
                false
            }
            None => true,
        });
}

pub fn forward_viewport_updates(
    mut controller: ResMut<PipelineController>,
    mut updates: EventWriter<ViewportUpdate>,
) {
    for update in controller.take_viewport_updates() {
        updates.write(update);
    }
}
