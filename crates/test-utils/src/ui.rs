use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use infra_backend::ui::{InputRequest, UiInput, UiOutput};

/// Input that answers prompts from a fixed script keyed by request id and
/// declines anything not in the script. Records every prompt it saw.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: HashMap<String, String>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, id: &str, value: &str) -> Self {
        self.answers.insert(id.to_string(), value.to_string());
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl UiInput for ScriptedInput {
    fn input(&self, request: &InputRequest) -> Result<Option<String>> {
        self.asked.lock().unwrap().push(request.id.clone());
        Ok(self.answers.get(&request.id).cloned())
    }
}

/// Output that keeps every line.
#[derive(Debug, Default)]
pub struct RecordingOutput {
    lines: Mutex<Vec<String>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl UiOutput for RecordingOutput {
    fn output(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}
