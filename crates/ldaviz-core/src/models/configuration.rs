use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigurationId(pub u32);

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One parameterized run of the topic model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Unique identifier
    pub id: ConfigurationId,

    /// Number of topics requested from the model
    pub kappa: f64,

    /// Document-topic prior
    pub alpha: f64,

    /// Topic-word prior
    pub eta: f64,
}

impl Configuration {
    pub fn new(id: u32, kappa: f64, alpha: f64, eta: f64) -> Self {
        Self { id: ConfigurationId(id), kappa, alpha, eta }
    }

    /// Whitespace-free label used in artifact header lines
    pub fn label(&self) -> String {
        format!("{}:{},{},{}", self.id, self.kappa, self.alpha, self.eta)
    }

    /// Labels for an ordered configuration list
    pub fn labels(configurations: &[Configuration]) -> Vec<String> {
        configurations.iter().map(Configuration::label).collect()
    }
}
