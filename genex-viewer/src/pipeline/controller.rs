use super::artifacts::{Environment, ImagePayload, MapArtifact, Trajectory};
use super::errors::{InputError, PipelineError, PreconditionError, StageFailure};
use super::state::{ActionSet, PipelineState, Stage};
use super::status::StatusReporter;
use crate::engine::viewport::ViewportUpdate;
use bevy::prelude::*;
use constants::status::{EXPLORED, EXPLORING, GENERATED, GENERATING, MAPPED, MAPPING};
use serde_json::Value;

/// Identifies one issued stage call. Selecting a new file bumps the epoch,
/// so results issued before it no longer match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageTicket {
    pub stage: Stage,
    pub epoch: u64,
}

/// A network call the controller wants issued.
#[derive(Debug, Clone, PartialEq)]
pub enum StageRequest {
    Generate {
        ticket: StageTicket,
        payload: ImagePayload,
    },
    Explore {
        ticket: StageTicket,
        environment_id: String,
        goal: Option<Value>,
    },
    Map {
        ticket: StageTicket,
        environment_id: String,
        exploration_data: Value,
    },
}

impl StageRequest {
    pub fn ticket(&self) -> StageTicket {
        match self {
            Self::Generate { ticket, .. }
            | Self::Explore { ticket, .. }
            | Self::Map { ticket, .. } => *ticket,
        }
    }
}

/// Typed result of a completed stage call.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResult {
    Generated(Result<Environment, StageFailure>),
    Explored(Result<Trajectory, StageFailure>),
    Mapped(Result<MapArtifact, StageFailure>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageOutcome {
    pub ticket: StageTicket,
    pub result: StageResult,
}

/// Finite-state machine gating user actions and owning every artifact.
///
/// Outgoing network calls and viewport updates are queued rather than
/// performed, so the controller never suspends and never touches rendering.
#[derive(Resource, Debug, Default)]
pub struct PipelineController {
    state: PipelineState,
    epoch: u64,
    payload: Option<ImagePayload>,
    environment: Option<Environment>,
    map: Option<MapArtifact>,
    in_flight: Option<StageTicket>,
    outgoing_requests: Vec<StageRequest>,
    outgoing_updates: Vec<ViewportUpdate>,
}

impl PipelineController {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn map(&self) -> Option<&MapArtifact> {
        self.map.as_ref()
    }

    pub fn in_flight(&self) -> Option<StageTicket> {
        self.in_flight
    }

    /// Actions whose guards currently hold.
    pub fn actions(&self) -> ActionSet {
        if self.in_flight.is_some() {
            return ActionSet::default();
        }

        let resume = self.state.resume_state();
        ActionSet {
            generate: resume == PipelineState::ImageSelected && self.payload.is_some(),
            explore: resume == PipelineState::Generated && self.environment.is_some(),
            map: resume == PipelineState::Explored && self.exploration_data().is_some(),
        }
    }

    /// Accept a new image from any state, discarding everything derived from the previous one.
    pub fn select_image(
        &mut self,
        payload: ImagePayload,
        status: &mut StatusReporter,
    ) -> Result<(), PipelineError> {
        if payload.is_empty() {
            return Err(InputError::EmptyFile(payload.name).into());
        }

        if let Some(stale) = self.in_flight.take() {
            info!("Marking in-flight {} result as stale", stale.stage);
        }

        self.epoch += 1;
        self.environment = None;
        self.map = None;
        self.outgoing_updates.push(ViewportUpdate::Clear);
        status.report(format!("Image selected: {}", payload.name));
        self.payload = Some(payload);
        self.transition(PipelineState::ImageSelected);
        Ok(())
    }

    pub fn request_generate(&mut self, status: &mut StatusReporter) -> Result<(), PipelineError> {
        self.check_dispatch(Stage::Generate)?;
        let payload = self.payload.clone().ok_or(PreconditionError::NoImage)?;

        let ticket = self.issue(Stage::Generate);
        self.outgoing_requests
            .push(StageRequest::Generate { ticket, payload });
        status.report(GENERATING);
        Ok(())
    }

    pub fn request_explore(
        &mut self,
        goal: Option<Value>,
        status: &mut StatusReporter,
    ) -> Result<(), PipelineError> {
        self.check_dispatch(Stage::Explore)?;
        let environment_id = self
            .environment
            .as_ref()
            .map(|environment| environment.id.clone())
            .ok_or(PreconditionError::NoEnvironment)?;

        let ticket = self.issue(Stage::Explore);
        self.outgoing_requests.push(StageRequest::Explore {
            ticket,
            environment_id,
            goal,
        });
        status.report(EXPLORING);
        Ok(())
    }

    pub fn request_map(&mut self, status: &mut StatusReporter) -> Result<(), PipelineError> {
        self.check_dispatch(Stage::Map)?;
        let environment = self
            .environment
            .as_ref()
            .ok_or(PreconditionError::NoEnvironment)?;
        let exploration_data = environment
            .exploration_data
            .clone()
            .ok_or(PreconditionError::NoExplorationData)?;
        let environment_id = environment.id.clone();

        let ticket = self.issue(Stage::Map);
        self.outgoing_requests.push(StageRequest::Map {
            ticket,
            environment_id,
            exploration_data,
        });
        status.report(MAPPING);
        Ok(())
    }

    /// Apply a finished stage call. Returns `false` when the outcome was stale and discarded.
    pub fn complete(&mut self, outcome: StageOutcome, status: &mut StatusReporter) -> bool {
        let ticket = outcome.ticket;
        if self.in_flight != Some(ticket) || self.state != ticket.stage.pending_state() {
            info!(
                "Discarding stale {} result (epoch {}, current epoch {})",
                ticket.stage, ticket.epoch, self.epoch
            );
            return false;
        }
        self.in_flight = None;

        match outcome.result {
            StageResult::Generated(Ok(environment)) => {
                // Server holds the durable copy from here on.
                self.payload = None;
                self.outgoing_updates
                    .push(ViewportUpdate::Environment(environment.clone()));
                self.environment = Some(environment);
                self.transition(PipelineState::Generated);
                status.report(GENERATED);
            }
            StageResult::Explored(Ok(trajectory)) => {
                let Some(environment) = self.environment.as_mut() else {
                    self.fail(Stage::Explore, PreconditionError::NoEnvironment, status);
                    return true;
                };
                environment.exploration_data = Some(trajectory.exploration_data());
                self.outgoing_updates
                    .push(ViewportUpdate::Trajectory(trajectory));
                self.transition(PipelineState::Explored);
                status.report(EXPLORED);
            }
            StageResult::Mapped(Ok(map)) => {
                self.outgoing_updates.push(ViewportUpdate::Map(map.clone()));
                self.map = Some(map);
                self.transition(PipelineState::Mapped);
                status.report(MAPPED);
            }
            StageResult::Generated(Err(failure))
            | StageResult::Explored(Err(failure))
            | StageResult::Mapped(Err(failure)) => {
                self.fail(ticket.stage, failure, status);
            }
        }
        true
    }

    /// Network calls queued since the last drain.
    pub fn take_requests(&mut self) -> Vec<StageRequest> {
        std::mem::take(&mut self.outgoing_requests)
    }

    /// Viewport updates queued since the last drain, in the order they were produced.
    pub fn take_viewport_updates(&mut self) -> Vec<ViewportUpdate> {
        std::mem::take(&mut self.outgoing_updates)
    }

    fn exploration_data(&self) -> Option<&Value> {
        self.environment.as_ref()?.exploration_data.as_ref()
    }

    /// Guard shared by every dispatch: nothing in flight and the stage's
    /// predecessor is the current (or resumable) state.
    fn check_dispatch(&self, stage: Stage) -> Result<(), PreconditionError> {
        if let Some(in_flight) = self.in_flight {
            return Err(PreconditionError::StageBusy(in_flight.stage));
        }
        if self.state.resume_state() != stage.retry_state() {
            return Err(PreconditionError::WrongState {
                action: stage,
                state: self.state,
            });
        }
        Ok(())
    }

    fn issue(&mut self, stage: Stage) -> StageTicket {
        let ticket = StageTicket {
            stage,
            epoch: self.epoch,
        };
        self.in_flight = Some(ticket);
        self.transition(stage.pending_state());
        ticket
    }

    fn fail(&mut self, stage: Stage, error: impl Into<PipelineError>, status: &mut StatusReporter) {
        let error = error.into();
        self.transition(PipelineState::Failed(stage));
        status.report_error(&error);
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            info!("Pipeline: {} → {}", self.state, next);
        }
        self.state = next;
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: PipelineState) {
        self.state = state;
    }
}
