use super::state::{PipelineState, Stage};
use thiserror::Error;

/// Problems with the user's file selection. No transition happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("no file selected")]
    NoFile,
    #[error("selected file `{0}` is empty")]
    EmptyFile(String),
    #[error("could not read `{name}`: {reason}")]
    Unreadable { name: String, reason: String },
}

/// Network unreachable, non-2xx status or a body that does not match the contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("server unreachable: {0}")]
    Unreachable(String),
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error("malformed response body: {0}")]
    MalformedBody(String),
}

/// Typed failure of a single stage call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} ({error})", .stage.failure_label())]
pub struct StageFailure {
    pub stage: Stage,
    pub error: TransportError,
}

impl StageFailure {
    pub fn new(stage: Stage, error: TransportError) -> Self {
        Self { stage, error }
    }
}

/// An action was invoked without the artifact or state it needs.
///
/// The UI disables such actions, so reaching one of these means the
/// disablement was bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("generate needs a selected image")]
    NoImage,
    #[error("explore needs a generated environment")]
    NoEnvironment,
    #[error("map needs exploration data")]
    NoExplorationData,
    #[error("a {0} request is already in flight")]
    StageBusy(Stage),
    #[error("{action} is not available while {state}")]
    WrongState { action: Stage, state: PipelineState },
}

/// Everything the controller boundary can surface to the status channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Transport(#[from] StageFailure),
    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failures_lead_with_the_stage_label() {
        let failure = StageFailure::new(Stage::Generate, TransportError::Status(500));
        assert_eq!(
            failure.to_string(),
            "Generation failed (server responded with HTTP 500)"
        );
    }

    #[test]
    fn pipeline_errors_display_their_source() {
        let error = PipelineError::from(PreconditionError::WrongState {
            action: Stage::Map,
            state: PipelineState::Failed(Stage::Explore),
        });
        assert_eq!(error.to_string(), "map is not available while failed (explore)");
    }
}
