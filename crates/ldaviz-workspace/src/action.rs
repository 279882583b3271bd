use ldaviz_core::error::LdavizError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::generate::ParameterSweep;
use crate::task::{Completion, Continuation, ProgressSink};

/// Everything a caller can ask a workspace to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    CollectMetadata,
    LoadRawData,
    LoadDistances,
    LoadCoordinates,
    CalculateDistances,
    CalculateCoordinates,
    GenerateParameterList,
    GenerateData,
    SwitchDirectory,
    Reset,
    None,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::CollectMetadata,
        Action::LoadRawData,
        Action::LoadDistances,
        Action::LoadCoordinates,
        Action::CalculateDistances,
        Action::CalculateCoordinates,
        Action::GenerateParameterList,
        Action::GenerateData,
        Action::SwitchDirectory,
        Action::Reset,
        Action::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::CollectMetadata => "collect-metadata",
            Action::LoadRawData => "load-raw-data",
            Action::LoadDistances => "load-distances",
            Action::LoadCoordinates => "load-coordinates",
            Action::CalculateDistances => "calculate-distances",
            Action::CalculateCoordinates => "calculate-coordinates",
            Action::GenerateParameterList => "generate-parameter-list",
            Action::GenerateData => "generate-data",
            Action::SwitchDirectory => "switch-directory",
            Action::Reset => "reset",
            Action::None => "none",
        }
    }

    /// Whether the action runs inline instead of as a task
    pub fn is_synchronous(&self) -> bool {
        matches!(self, Action::Reset | Action::None)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = LdavizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == name)
            .ok_or_else(|| LdavizError::UnknownAction { name: s.to_string() })
    }
}

/// Caller-supplied bindings and arguments for one request
#[derive(Default)]
pub struct ActionOptions {
    /// Receives progress of the requested action's task only
    pub progress: Option<Arc<dyn ProgressSink>>,

    /// Runs once when the requested action completes
    pub continuation: Option<Continuation>,

    /// Target of `switch-directory`
    pub directory: Option<PathBuf>,

    /// Grid for `generate-parameter-list`
    pub sweep: Option<ParameterSweep>,
}

impl ActionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_continuation<F>(mut self, continuation: F) -> Self
    where
        F: FnOnce(&Completion) + Send + 'static,
    {
        self.continuation = Some(Box::new(continuation));
        self
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn with_sweep(mut self, sweep: ParameterSweep) -> Self {
        self.sweep = Some(sweep);
        self
    }
}

impl fmt::Debug for ActionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionOptions")
            .field("progress", &self.progress.is_some())
            .field("continuation", &self.continuation.is_some())
            .field("directory", &self.directory)
            .field("sweep", &self.sweep)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_form_round_trips() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Calculate-Distances".parse::<Action>().unwrap(), Action::CalculateDistances);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        match "compute-everything".parse::<Action>() {
            Err(LdavizError::UnknownAction { name }) => assert_eq!(name, "compute-everything"),
            other => panic!("expected UnknownAction, got {:?}", other),
        }
    }
}
