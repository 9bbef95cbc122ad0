use bevy::prelude::*;
use constants::status::ERROR_PREFIX;
use std::fmt::Display;

/// Single-channel, last-write-wins status text.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct StatusReporter {
    message: String,
    is_error: bool,
}

impl StatusReporter {
    pub fn report(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.is_error = false;
        info!("Status: {}", self.message);
    }

    pub fn report_error(&mut self, error: impl Display) {
        self.message = format!("{ERROR_PREFIX}{error}");
        self.is_error = true;
        warn!("Status: {}", self.message);
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }
}
