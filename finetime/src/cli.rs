use clap::{Parser, ValueEnum};

use crate::config::{SimMode, SimulationConfig};

/// Error estimates for a hit placed inside the central bin of a multinomial
#[derive(Parser, Debug)]
#[command(name = "finetime")]
#[command(version, about, long_about = None)]
#[command(after_help = "Configuration is read from $FINETIME_CONFIG or <PROJECT_ROOT>/finetime.json; \
flags given here override it.")]
pub struct Cli {
    /// Routine to run
    #[arg(value_enum, default_value_t = Routine::Pres)]
    pub routine: Routine,

    #[command(flatten)]
    pub simulation: SimulationArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Routine {
    /// Scatter stderr against bin size from data.csv and show it
    Prob,
    /// Fit stderr against sample size from samples.csv
    Samples,
    /// Compare pa.csv with the predictions, saved to prob_a.png
    Pres,
    /// Run the Monte-Carlo simulator
    Simulate,
}

/// Simulator options. Unset flags keep the configured value (defaults in brackets).
#[derive(clap::Args, Debug, Default, Clone)]
pub struct SimulationArgs {
    /// Thread numbers [1]
    #[arg(short = 't', long = "thread")]
    pub threads: Option<u32>,

    /// Simulation mode [pa]
    #[arg(short, long, value_enum)]
    pub mode: Option<SimMode>,

    /// Number of entries per draw [400]
    #[arg(short = 'e', long = "entryN")]
    pub entry_n: Option<u32>,

    /// Smallest entry count of the entryN scan [10]
    #[arg(long = "e_min")]
    pub e_min: Option<u32>,

    /// End (exclusive) of the entryN scan [20]
    #[arg(long = "e_max")]
    pub e_max: Option<u32>,

    /// Number of random draws per run [1000]
    #[arg(short = 'r', long = "r_num")]
    pub r_num: Option<u32>,

    /// Probability of the central bin [0.01]
    #[arg(long)]
    pub pb: Option<f64>,

    /// Probability of the previous bin in the fix distribution [0]
    #[arg(long)]
    pub pa: Option<f64>,

    /// Number of pa steps [200]
    #[arg(long = "pa_size")]
    pub pa_size: Option<u32>,

    /// Base seed of the random generators [0]
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SimulationArgs {
    /// Overwrite every option of `config` that was given on the command line.
    pub fn apply(&self, config: &mut SimulationConfig) {
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(entry_n) = self.entry_n {
            config.entry_n = entry_n;
        }
        if let Some(e_min) = self.e_min {
            config.e_min = e_min;
        }
        if let Some(e_max) = self.e_max {
            config.e_max = e_max;
        }
        if let Some(r_num) = self.r_num {
            config.r_num = r_num;
        }
        if let Some(pb) = self.pb {
            config.pb = pb;
        }
        if let Some(pa) = self.pa {
            config.pa = pa;
        }
        if let Some(pa_size) = self.pa_size {
            config.pa_size = pa_size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_pres() {
        let cli = Cli::try_parse_from(["finetime"]).unwrap();
        assert_eq!(cli.routine, Routine::Pres);
        assert!(cli.simulation.mode.is_none());
    }

    #[test]
    fn simulator_flags_override_config() {
        let cli = Cli::try_parse_from([
            "finetime", "simulate", "-t", "4", "-m", "entryN", "--e_min", "5", "--e_max", "9", "--pb", "0.02",
        ])
        .unwrap();
        assert_eq!(cli.routine, Routine::Simulate);

        let mut config = SimulationConfig::default();
        cli.simulation.apply(&mut config);
        assert_eq!(config.threads, 4);
        assert_eq!(config.mode, SimMode::EntryN);
        assert_eq!((config.e_min, config.e_max), (5, 9));
        assert_eq!(config.pb, 0.02);
        // Untouched options keep their configured value
        assert_eq!(config.r_num, 1000);
        assert_eq!(config.pa_size, 200);
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from(["finetime", "simulate", "-e", "800", "-r", "50", "-m", "fix"]).unwrap();
        assert_eq!(cli.simulation.entry_n, Some(800));
        assert_eq!(cli.simulation.r_num, Some(50));
        assert_eq!(cli.simulation.mode, Some(SimMode::Fix));
    }

    #[test]
    fn rejects_unknown_routine_and_mode() {
        assert!(Cli::try_parse_from(["finetime", "plot"]).is_err());
        assert!(Cli::try_parse_from(["finetime", "simulate", "-m", "pre"]).is_err());
    }
}
