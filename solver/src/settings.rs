//! Run settings, read from an optional YAML file and overridden from the command line.

use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::ValueEnum;
use hashiwokakero::Strategy;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::VariantArray;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Strategy names, or `all`.
    pub strategies: Vec<String>,
    /// How long each strategy may run before it is abandoned.
    pub timeout_seconds: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategies: vec!["all".into()],
            timeout_seconds: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Draw each solution under the results table.
    pub render: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            render: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Command line values which take precedence over the settings file.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub strategies: Vec<String>,
    pub timeout_seconds: Option<f64>,
    pub format: Option<OutputFormat>,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn merge_with_cli(&mut self, overrides: &CliOverrides) {
        if !overrides.strategies.is_empty() {
            self.solver.strategies = overrides.strategies.clone();
        }
        if let Some(timeout_seconds) = overrides.timeout_seconds {
            self.solver.timeout_seconds = timeout_seconds;
        }
        if let Some(format) = overrides.format {
            self.output.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.strategies()?;
        self.timeout()?;
        Ok(())
    }

    /// The configured strategies in the order given, `all` expanded and duplicates dropped.
    pub fn strategies(&self) -> Result<Vec<Strategy>> {
        let mut resolved = Vec::new();
        for name in &self.solver.strategies {
            if name.eq_ignore_ascii_case("all") {
                resolved.extend(Strategy::VARIANTS.iter().copied());
            } else {
                let strategy = name.parse::<Strategy>()
                    .with_context(|| format!(
                        "Unknown strategy \"{name}\", expected one of: all, {}",
                        Strategy::VARIANTS.iter().join(", "),
                    ))?;
                resolved.push(strategy);
            }
        }

        ensure!(!resolved.is_empty(), "No strategies configured");
        Ok(resolved.into_iter().unique().collect_vec())
    }

    pub fn timeout(&self) -> Result<Duration> {
        let seconds = self.solver.timeout_seconds;
        ensure!(seconds.is_finite() && seconds > 0.0, "Timeout must be a positive number of seconds, got {seconds}");
        Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("Timeout of {seconds} seconds is out of range"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use hashiwokakero::Strategy;
    use tempfile::NamedTempFile;

    use crate::settings::{CliOverrides, OutputFormat, Settings};

    #[test]
    fn defaults_run_everything_for_five_seconds() {
        let settings = Settings::default();
        assert_eq!(settings.strategies().unwrap(), vec![
            Strategy::Sat,
            Strategy::AStar,
            Strategy::Backtracking,
            Strategy::BruteForce,
        ]);
        assert_eq!(settings.timeout().unwrap(), Duration::from_secs(5));
        assert_eq!(settings.output.format, OutputFormat::Text);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "solver:\n  strategies: [backtracking, SAT, sat]\n  timeout_seconds: 1.5").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.strategies().unwrap(), vec![Strategy::Backtracking, Strategy::Sat]);
        assert_eq!(settings.timeout().unwrap(), Duration::from_millis(1500));
        assert!(settings.output.render);
    }

    #[test]
    fn unknown_strategy_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "solver:\n  strategies: [dijkstra]").unwrap();

        let err = Settings::from_file(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("dijkstra"));
    }

    #[test]
    fn cli_overrides_file() {
        let mut settings = Settings::default();
        settings.merge_with_cli(&CliOverrides {
            strategies: vec!["a-star".into()],
            timeout_seconds: Some(0.25),
            format: Some(OutputFormat::Json),
        });

        assert_eq!(settings.strategies().unwrap(), vec![Strategy::AStar]);
        assert_eq!(settings.timeout().unwrap(), Duration::from_millis(250));
        assert_eq!(settings.output.format, OutputFormat::Json);

        settings.solver.timeout_seconds = -1.0;
        assert!(settings.validate().is_err());
    }
}
