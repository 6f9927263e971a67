use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::helper_functions::resolve_path;

pub const CONFIG_ENV: &str = "FINETIME_CONFIG";
pub const CONFIG_FILE: &str = "finetime.json";

/// Paths and parameters for every routine. Missing keys take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_csv: PathBuf,
    pub samples_csv: PathBuf,
    pub pa_csv: PathBuf,
    pub prob_a_png: PathBuf,
    pub dpi: u32,
    pub pres: PresConfig,
    pub samples: SamplesConfig,
    pub simulation: SimulationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_csv: "data.csv".into(),
            samples_csv: "samples.csv".into(),
            pa_csv: "pa.csv".into(),
            prob_a_png: "prob_a.png".into(),
            dpi: 400,
            pres: PresConfig::default(),
            samples: SamplesConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresConfig {
    pub entry_n: f64,
    pub prob_b: f64,
    pub curve_points: usize,
}

impl Default for PresConfig {
    fn default() -> Self {
        Self { entry_n: 100000.0, prob_b: 0.01, curve_points: 400 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplesConfig {
    pub prob_b: f64,
    pub skip_rows: usize,
}

impl Default for SamplesConfig {
    fn default() -> Self {
        Self { prob_b: 0.1, skip_rows: 250 }
    }
}

/// What `simulate` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SimMode {
    #[serde(rename = "none")]
    #[value(name = "none")]
    None,
    /// Scan the probability of the bin before the central one
    #[serde(rename = "pa")]
    #[value(name = "pa")]
    Pa,
    /// Scan the number of entries per draw
    #[serde(rename = "entryN")]
    #[value(name = "entryN")]
    EntryN,
    /// One run on a fixed distribution, drawn as a histogram
    #[serde(rename = "fix")]
    #[value(name = "fix")]
    Fix,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub threads: u32,
    pub mode: SimMode,
    pub entry_n: u32,
    pub e_min: u32,
    pub e_max: u32,
    pub r_num: u32,
    pub pb: f64,
    pub pa: f64,
    pub pa_size: u32,
    pub seed: u64,
    pub entry_n_csv: PathBuf,
    pub pa_csv: PathBuf,
    pub distribution_png: PathBuf,
    pub distribution_dpi: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            mode: SimMode::Pa,
            entry_n: 400,
            e_min: 10,
            e_max: 20,
            r_num: 1000,
            pb: 0.01,
            pa: 0.0,
            pa_size: 200,
            seed: 0,
            entry_n_csv: "entryN.csv".into(),
            pa_csv: "pa.csv".into(),
            distribution_png: "distri.png".into(),
            distribution_dpi: 150,
        }
    }
}

impl Config {
    /// Load from `$FINETIME_CONFIG`, else `<root>/finetime.json`, else defaults.
    /// Relative paths in the result are resolved against `root`.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let candidate = explicit
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE));

        let config = if candidate.exists() {
            info!("Loading configuration from {}", candidate.display());
            Self::from_file(&candidate)?
        } else if let Some(path) = explicit {
            bail!("{} points to {}, which does not exist", CONFIG_ENV, path.display());
        } else {
            info!("No {} found, using defaults", CONFIG_FILE);
            Self::default()
        };

        Ok(config.resolved(root))
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    fn resolved(mut self, root: &Path) -> Self {
        for path in [
            &mut self.data_csv,
            &mut self.samples_csv,
            &mut self.pa_csv,
            &mut self.prob_a_png,
            &mut self.simulation.entry_n_csv,
            &mut self.simulation.pa_csv,
            &mut self.simulation.distribution_png,
        ] {
            *path = resolve_path(root, path.as_path());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "dpi": 200, "simulation": { "mode": "entryN", "threads": 4 } }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.dpi, 200);
        assert_eq!(config.simulation.mode, SimMode::EntryN);
        assert_eq!(config.simulation.threads, 4);
        assert_eq!(config.simulation.r_num, 1000);
        assert_eq!(config.pres.entry_n, 100000.0);
        assert_eq!(config.samples.skip_rows, 250);
    }

    #[test]
    fn relative_paths_resolve_against_root() {
        let config = Config::default().resolved(Path::new("/data/run1"));
        assert_eq!(config.pa_csv, PathBuf::from("/data/run1/pa.csv"));
        assert_eq!(config.simulation.distribution_png, PathBuf::from("/data/run1/distri.png"));
    }

    #[test]
    fn mode_names() {
        assert_eq!(SimMode::from_str("entryN", false).unwrap(), SimMode::EntryN);
        assert_eq!(SimMode::from_str("fix", false).unwrap(), SimMode::Fix);
        assert!(SimMode::from_str("pre", false).is_err());
    }
}
