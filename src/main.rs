use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use simplelog::ColorChoice;
use simplelog::ConfigBuilder;
use simplelog::LevelPadding;
use simplelog::TermLogger;
use simplelog::TerminalMode;

use riptide::command_line_options::CommandLineOptions;
use riptide::ics;
use riptide::parameters::ParameterFileContents;
use riptide::parameters::RunParameters;
use riptide::simulation::Simulation;

fn main() -> anyhow::Result<()> {
    let options = CommandLineOptions::parse();
    init_logging(options.verbosity)?;
    if let Some(num_worker_threads) = options.num_worker_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_worker_threads)
            .build_global()
            .context("failed to configure the worker thread pool")?;
    }
    let mut contents = ParameterFileContents::from_file(&options.parameter_file_path)?;
    for override_ in options.parameter_overrides.iter() {
        contents.apply_override(override_)?;
    }
    let parameters = RunParameters::load(&contents)?;
    let initial_conditions = ics::build(
        &parameters.initial_conditions,
        &parameters.boundary,
        &parameters.physics,
    )?;
    let mut simulation = Simulation::new(parameters, initial_conditions)?;
    simulation.run()?;
    Ok(())
}

fn init_logging(verbosity: usize) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let config = ConfigBuilder::default()
        .set_level_padding(LevelPadding::Right)
        .set_thread_level(LevelFilter::Off)
        .build();
    TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto)
        .context("failed to initialize logging")
}
