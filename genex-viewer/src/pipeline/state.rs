use serde::Serialize;
use std::fmt;

/// The three server-side pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Generate,
    Explore,
    Map,
}

impl Stage {
    /// State the controller sits in while this stage's call is in flight.
    pub fn pending_state(self) -> PipelineState {
        match self {
            Self::Generate => PipelineState::Generating,
            Self::Explore => PipelineState::Exploring,
            Self::Map => PipelineState::Mapping,
        }
    }

    /// State a failed stage resumes from when the user retries it.
    pub fn retry_state(self) -> PipelineState {
        match self {
            Self::Generate => PipelineState::ImageSelected,
            Self::Explore => PipelineState::Generated,
            Self::Map => PipelineState::Explored,
        }
    }

    /// Short failure text shown to the user before the transport detail.
    pub fn failure_label(self) -> &'static str {
        match self {
            Self::Generate => "Generation failed",
            Self::Explore => "Exploration failed",
            Self::Map => "Map generation failed",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Explore => "explore",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly one of these is active at any time.
///
/// `Failed` carries the stage that failed, which fixes the state it can be
/// retried from (see [`Stage::retry_state`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    ImageSelected,
    Generating,
    Generated,
    Exploring,
    Explored,
    Mapping,
    Mapped,
    Failed(Stage),
}

impl PipelineState {
    /// State preceding a failure, `None` for every other state.
    pub fn predecessor(self) -> Option<PipelineState> {
        match self {
            Self::Failed(stage) => Some(stage.retry_state()),
            _ => None,
        }
    }

    /// State that action guards are evaluated against.
    pub fn resume_state(self) -> PipelineState {
        self.predecessor().unwrap_or(self)
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::Generating | Self::Exploring | Self::Mapping)
    }

    /// Stable identifier used in host notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ImageSelected => "image_selected",
            Self::Generating => "generating",
            Self::Generated => "generated",
            Self::Exploring => "exploring",
            Self::Explored => "explored",
            Self::Mapping => "mapping",
            Self::Mapped => "mapped",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(stage) => write!(f, "failed ({stage})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Which user actions are currently enabled. Mirrors the controller guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ActionSet {
    pub generate: bool,
    pub explore: bool,
    pub map: bool,
}

impl ActionSet {
    pub fn allows(&self, stage: Stage) -> bool {
        match stage {
            Stage::Generate => self.generate,
            Stage::Explore => self.explore,
            Stage::Map => self.map,
        }
    }
}
