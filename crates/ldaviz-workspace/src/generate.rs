//! Parameter sweeps and external data generation

use async_trait::async_trait;
use ldaviz_core::error::{LdavizError, Result};
use ldaviz_core::models::Configuration;
use ldaviz_store::files::{render_parameters, PARAMETERS_FILE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tokio::process::Command;

/// Slack when deciding whether the end of a range is reached
const RANGE_EPSILON: f64 = 1e-9;

/// Largest parameter grid a sweep may expand to
pub const MAX_SWEEP_CONFIGURATIONS: usize = 100_000;

/// Inclusive `start:end:step` range of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl SweepRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    /// A range holding exactly one value
    pub fn single(value: f64) -> Self {
        Self { start: value, end: value, step: 1.0 }
    }

    /// Values from `start` up to and including `end`
    ///
    /// Each value is computed as `start + i * step` so rounding does not
    /// accumulate along the range.
    pub fn values(&self, name: &str) -> Result<Vec<f64>> {
        let invalid = |reason: &str| LdavizError::ConfigInvalid {
            key: name.to_string(),
            reason: reason.to_string(),
        };

        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Err(invalid("range bounds must be finite"));
        }
        if self.end < self.start {
            return Err(invalid("range end is below its start"));
        }
        if self.end == self.start {
            return Ok(vec![self.start]);
        }
        if self.step <= 0.0 {
            return Err(invalid("step must be positive"));
        }

        let steps = ((self.end - self.start) / self.step + RANGE_EPSILON).floor();
        if !steps.is_finite() || steps >= MAX_SWEEP_CONFIGURATIONS as f64 {
            return Err(invalid(&format!(
                "range has more than {} values",
                MAX_SWEEP_CONFIGURATIONS
            )));
        }
        let count = steps as usize + 1;
        Ok((0..count).map(|i| self.start + i as f64 * self.step).collect())
    }
}

impl FromStr for SweepRange {
    type Err = LdavizError;

    /// Accepts `start:end:step` or a single value
    fn from_str(s: &str) -> Result<Self> {
        let parse = |token: &str| {
            token.trim().parse::<f64>().map_err(|e| LdavizError::ConfigInvalid {
                key: "range".to_string(),
                reason: format!("'{}' is not a number: {}", token, e),
            })
        };

        let parts: Vec<&str> = s.split(':').collect();
        match *parts.as_slice() {
            [value] => Ok(SweepRange::single(parse(value)?)),
            [start, end, step] => Ok(SweepRange::new(parse(start)?, parse(end)?, parse(step)?)),
            _ => Err(LdavizError::ConfigInvalid {
                key: "range".to_string(),
                reason: format!("expected start:end:step, got '{}'", s),
            }),
        }
    }
}

/// Grid over the three model parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSweep {
    pub kappa: SweepRange,
    pub alpha: SweepRange,
    pub eta: SweepRange,
}

impl ParameterSweep {
    pub fn new(kappa: SweepRange, alpha: SweepRange, eta: SweepRange) -> Self {
        Self { kappa, alpha, eta }
    }

    /// Cartesian product in kappa-major order, ids assigned from 1
    pub fn expand(&self) -> Result<Vec<Configuration>> {
        let kappas = self.kappa.values("kappa")?;
        let alphas = self.alpha.values("alpha")?;
        let etas = self.eta.values("eta")?;

        let size = kappas
            .len()
            .checked_mul(alphas.len())
            .and_then(|n| n.checked_mul(etas.len()))
            .filter(|&n| n <= MAX_SWEEP_CONFIGURATIONS)
            .ok_or_else(|| LdavizError::ConfigInvalid {
                key: "sweep".to_string(),
                reason: format!("grid has more than {} configurations", MAX_SWEEP_CONFIGURATIONS),
            })?;

        let mut configurations = Vec::with_capacity(size);
        let mut id = 1;
        for &kappa in &kappas {
            for &alpha in &alphas {
                for &eta in &etas {
                    configurations.push(Configuration::new(id, kappa, alpha, eta));
                    id += 1;
                }
            }
        }

        Ok(configurations)
    }
}

/// Port for producing topic data for a parameter list
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce raw data for `configurations` inside `directory`
    async fn generate(&self, directory: &Path, configurations: &[Configuration]) -> Result<()>;
}

/// Runs an external command that trains the models
///
/// The command runs inside the workspace directory with the parameter
/// file name as its last argument.
#[derive(Debug, Clone)]
pub struct ScriptGenerator {
    program: String,
    args: Vec<String>,
}

impl ScriptGenerator {
    /// Split a command line on whitespace into program and arguments
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| LdavizError::ConfigInvalid {
            key: "generator_command".to_string(),
            reason: "command is empty".to_string(),
        })?;
        Ok(Self { program, args: parts.collect() })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Generator for ScriptGenerator {
    async fn generate(&self, directory: &Path, configurations: &[Configuration]) -> Result<()> {
        tokio::fs::write(directory.join(PARAMETERS_FILE), render_parameters(configurations)).await?;

        tracing::info!(
            program = %self.program,
            configurations = configurations.len(),
            dir = %directory.display(),
            "Running data generator"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(PARAMETERS_FILE)
            .current_dir(directory)
            .output()
            .await
            .map_err(|e| LdavizError::Generation {
                reason: format!("failed to start '{}': {}", self.program, e),
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!(program = %self.program, "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LdavizError::Generation {
                reason: format!("'{}' exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_includes_end() {
        let values = SweepRange::new(0.1, 0.3, 0.1).values("alpha").unwrap();
        assert_eq!(values.len(), 3);
        assert!((values[2] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_range() {
        assert_eq!(SweepRange::single(5.0).values("kappa").unwrap(), vec![5.0]);
        assert_eq!("7".parse::<SweepRange>().unwrap(), SweepRange::single(7.0));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(SweepRange::new(3.0, 1.0, 1.0).values("kappa").is_err());
        assert!(SweepRange::new(1.0, 3.0, 0.0).values("kappa").is_err());
        assert!("1:2".parse::<SweepRange>().is_err());
        assert!("a:2:1".parse::<SweepRange>().is_err());
    }

    #[test]
    fn test_expand_is_kappa_major() {
        let sweep = ParameterSweep::new(
            "2:3:1".parse().unwrap(),
            "0.1:0.2:0.1".parse().unwrap(),
            SweepRange::single(0.01),
        );
        let grid = sweep.expand().unwrap();

        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0].id.0, 1);
        assert_eq!((grid[0].kappa, grid[1].kappa, grid[2].kappa), (2.0, 2.0, 3.0));
        assert!((grid[1].alpha - 0.2).abs() < 1e-12);
        assert_eq!(grid[3].id.0, 4);
    }

    #[test]
    fn test_huge_range_is_rejected() {
        let err = "0:1e30:1".parse::<SweepRange>().unwrap().values("kappa").unwrap_err();
        assert!(matches!(err, LdavizError::ConfigInvalid { ref key, .. } if key == "kappa"));
        assert!(SweepRange::new(0.0, 1.0, 1e-300).values("alpha").is_err());
        assert!(SweepRange::new(0.0, 1.0, f64::MIN_POSITIVE).values("eta").is_err());
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let sweep = ParameterSweep::new(
            SweepRange::new(1.0, 1000.0, 1.0),
            SweepRange::new(1.0, 1000.0, 1.0),
            SweepRange::single(0.01),
        );
        let err = sweep.expand().unwrap_err();
        assert!(matches!(err, LdavizError::ConfigInvalid { ref key, .. } if key == "sweep"));

        let largest = ParameterSweep::new(
            SweepRange::new(1.0, 1000.0, 1.0),
            SweepRange::new(1.0, 100.0, 1.0),
            SweepRange::single(0.01),
        );
        assert_eq!(largest.expand().unwrap().len(), MAX_SWEEP_CONFIGURATIONS);
    }

    #[test]
    fn test_empty_command_is_rejected() {
        assert!(ScriptGenerator::from_command_line("   ").is_err());
        let generator = ScriptGenerator::from_command_line("python train.py --fast").unwrap();
        assert_eq!(generator.program(), "python");
    }
}
