// src/ui.rs

//! User-interaction channels injected into backends and operations.
//!
//! Rendering is not this crate's concern: backends only ever talk to the
//! [`UiInput`] / [`UiOutput`] they are handed. Tests substitute scripted
//! implementations.

use std::fmt::Debug;

use anyhow::Result;

/// A single prompt for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRequest {
    /// Stable identifier of the value being asked for (e.g. a config key).
    pub id: String,
    /// Short question shown to the user.
    pub query: String,
    pub description: Option<String>,
}

impl InputRequest {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Prompt/response channel.
pub trait UiInput: Send + Sync + Debug {
    /// Ask for a value.
    ///
    /// `Ok(None)` means the prompt was declined (e.g. non-interactive mode);
    /// callers must treat that as "no value", never retry or wait.
    fn input(&self, request: &InputRequest) -> Result<Option<String>>;
}

/// Progress / message channel.
pub trait UiOutput: Send + Sync + Debug {
    fn output(&self, line: &str);
}

/// Input that declines every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl UiInput for NonInteractive {
    fn input(&self, _request: &InputRequest) -> Result<Option<String>> {
        Ok(None)
    }
}
