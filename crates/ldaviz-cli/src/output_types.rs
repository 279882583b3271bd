use ldaviz_core::config::ConfigSource;
use ldaviz_core::models::{Configuration, CoordinateMatrix, IntegrityStatus, WorkspaceState};
use ldaviz_workspace::Completion;
use serde::Serialize;
use tabled::Tabled;

fn fmt_float(value: &f64) -> String {
    format!("{:.4}", value)
}

/// One configuration row
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigurationRow {
    #[tabled(rename = "ID")]
    pub id: u32,
    #[tabled(rename = "Kappa")]
    pub kappa: f64,
    #[tabled(rename = "Alpha")]
    pub alpha: f64,
    #[tabled(rename = "Eta")]
    pub eta: f64,
}

impl From<&Configuration> for ConfigurationRow {
    fn from(c: &Configuration) -> Self {
        Self { id: c.id.0, kappa: c.kappa, alpha: c.alpha, eta: c.eta }
    }
}

/// One projected configuration
#[derive(Debug, Serialize, Tabled)]
pub struct CoordinateRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "X", display_with = "fmt_float")]
    pub x: f64,
    #[tabled(rename = "Y", display_with = "fmt_float")]
    pub y: f64,
}

impl CoordinateRow {
    /// Pair points with configuration ids; positions past the list get their index
    pub fn collect(configurations: &[Configuration], coordinates: &CoordinateMatrix) -> Vec<Self> {
        (0..coordinates.len())
            .map(|i| {
                let (x, y) = coordinates.point(i);
                let id = configurations
                    .get(i)
                    .map(|c| c.id.to_string())
                    .unwrap_or_else(|| format!("#{}", i));
                Self { id, x, y }
            })
            .collect()
    }
}

/// Configuration value with its source, for status output
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source", display_with = "fmt_source")]
    pub source: ConfigSource,
}

fn fmt_source(source: &ConfigSource) -> String {
    format!("{:?}", source)
}

/// Output for status command
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub directory: String,
    pub configurations: usize,
    pub parameter_list: usize,
    pub state: WorkspaceState,
    pub distance_matrix: Option<usize>,
    pub coordinate_matrix: Option<usize>,
    pub integrity: IntegrityStatus,
    pub config: Vec<ConfigEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_list: Option<Vec<ConfigurationRow>>,
}

/// Output for run command
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub completion: Completion,
    /// Loading actions that ran first, in completion order
    pub chained: Vec<Completion>,
}

/// Output for pipeline command
#[derive(Debug, Serialize)]
pub struct PipelineOutput {
    pub configurations: usize,
    pub max_distance: f64,
    pub coordinates: Vec<CoordinateRow>,
}

/// Output for sweep command
#[derive(Debug, Serialize)]
pub struct SweepOutput {
    pub configurations: Vec<ConfigurationRow>,
    pub generated: bool,
}

/// Output for generate command
#[derive(Debug, Serialize)]
pub struct GenerateOutput {
    pub generated: usize,
    pub collected: Option<usize>,
}

/// Output for compare command
#[derive(Debug, Serialize)]
pub struct CompareOutput {
    pub first: u32,
    pub second: u32,
    pub metric: String,
    pub aggregation: String,
    pub distance: f64,
    /// Row r, column c: topic r of the first to topic c of the second
    pub topic_distances: Vec<Vec<f64>>,
}
