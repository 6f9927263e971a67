use std::sync::Mutex;
use std::time::Instant;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::analysis::pres::plot_pres;
use crate::analysis::prob::plot_prob;
use crate::analysis::samples::plot_samples;
use crate::cli::{Cli, Routine};
use crate::config::{Config, SimMode, SimulationConfig};
use crate::data_handling::bin_sizes::BinSizeDataset;
use crate::data_handling::pa_scan::PaScanDataset;
use crate::data_handling::samples::SampleSizeDataset;
use crate::helper_functions::project_root;
use crate::plotting::renderer::{OutputMode, Renderer};
use crate::plotting::theme::PlotTheme;
use crate::simulation::sink::{CsvKey, CsvSink, HistSink, Sink};
use crate::simulation::FineTimeMc;

mod analysis;
mod cli;
mod config;
mod data_handling;
mod formulas;
mod helper_functions;
mod models;
mod plotting;
mod regression;
mod simulation;

fn main() -> anyhow::Result<()> {
    // Setup logging and project configuration
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let root = project_root();
    let mut config = Config::load(&root)?;
    cli.simulation.apply(&mut config.simulation);
    let renderer = Renderer::new(PlotTheme::darkgrid());
    info!("Running `{:?}` in {}", cli.routine, root.display());

    match cli.routine {
        Routine::Prob => {
            let dataset = BinSizeDataset { path: config.data_csv.clone() };
            plot_prob(&dataset, &renderer, &OutputMode::Show).context("plot_prob")?;
        }
        Routine::Samples => {
            let dataset = SampleSizeDataset { path: config.samples_csv.clone() };
            plot_samples(&dataset, config.samples.skip_rows, config.samples.prob_b)
                .context("plot_samples")?;
        }
        Routine::Pres => {
            let dataset = PaScanDataset { path: config.pa_csv.clone() };
            let mode = OutputMode::Save { path: config.prob_a_png.clone(), dpi: config.dpi };
            plot_pres(
                &dataset,
                &renderer,
                config.pres.entry_n,
                config.pres.prob_b,
                config.pres.curve_points,
                &mode,
            )
            .context("plot_pres")?;
        }
        Routine::Simulate => {
            run_simulation(&config.simulation, renderer.theme())?;
        }
    }

    Ok(())
}

fn run_simulation(config: &SimulationConfig, theme: &PlotTheme) -> anyhow::Result<()> {
    let begin = Instant::now();

    let mut fine_time_mc = FineTimeMc::new(config.seed);
    fine_time_mc.set_entry_n(config.entry_n);
    fine_time_mc.set_threads_num(config.threads);
    fine_time_mc.set_rnd_number(config.r_num);

    info!("Simulating {:?} with {} thread(s)", config.mode, config.threads);
    match config.mode {
        SimMode::Pa => {
            let sink = Mutex::new(CsvSink::new(&config.pa_csv, CsvKey::Pa));
            fine_time_mc.run_fixed_pb_all_pa(config.pb, 0.0, 1.0, config.pa_size, &sink)?;
            write_sink(sink)?;
        }
        SimMode::EntryN => {
            let sink = Mutex::new(CsvSink::new(&config.entry_n_csv, CsvKey::EntryN));
            fine_time_mc.run_fixed_pb_all_entry_n(config.pb, config.e_min, config.e_max, &sink)?;
            write_sink(sink)?;
        }
        SimMode::Fix => {
            let sink = Mutex::new(HistSink::new(
                &config.distribution_png,
                config.distribution_dpi,
                theme.clone(),
            ));
            let distribution = [config.pa, config.pb, 1.0 - config.pa - config.pb];
            fine_time_mc.run_with_all_fixed(distribution, &sink)?;
            write_sink(sink)?;
        }
        SimMode::None => {}
    }

    info!("Execution time: {}[ms]", begin.elapsed().as_millis());
    Ok(())
}

fn write_sink<S: Sink>(sink: Mutex<S>) -> anyhow::Result<()> {
    let sink = sink.into_inner().map_err(|_| anyhow!("sink lock poisoned"))?;
    sink.write()?;
    Ok(())
}
