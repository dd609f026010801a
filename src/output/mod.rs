mod snapshot;
mod time_series;

use std::path::PathBuf;

use log::info;
use serde::Deserialize;

use crate::error::Result;
use crate::particle::Particle;
use crate::prelude::Float;

pub use self::time_series::EnergyRecord;

#[derive(Clone, Debug, Deserialize)]
pub struct OutputParameters {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Simulated time between particle snapshots.
    pub particle_interval: Float,
    /// Simulated time between energy/momentum records.
    pub energy_interval: Float,
}

fn default_output_dir() -> PathBuf {
    "output".into()
}

/// Emits snapshots and the energy time series whenever the simulated
/// time passes the respective output times. Directories are created on
/// first use, so a run whose intervals never trigger touches no
/// files.
pub struct OutputManager {
    parameters: OutputParameters,
    next_particle_output_time: Float,
    next_energy_output_time: Float,
    snapshot_index: usize,
}

impl OutputManager {
    pub fn new(parameters: OutputParameters, start_time: Float) -> Self {
        Self {
            parameters,
            next_particle_output_time: start_time,
            next_energy_output_time: start_time,
            snapshot_index: 0,
        }
    }

    pub fn update(&mut self, time: Float, reals: &[Particle]) -> Result<()> {
        if time >= self.next_particle_output_time {
            let path = snapshot::write_snapshot(
                &self.parameters.output_dir,
                self.snapshot_index,
                time,
                reals,
            )?;
            info!("wrote snapshot {:?}", path);
            self.snapshot_index += 1;
            self.next_particle_output_time += self.parameters.particle_interval;
        }
        if time >= self.next_energy_output_time {
            let record = EnergyRecord::measure(time, reals);
            time_series::append_energy_record(&self.parameters.output_dir, &record)?;
            self.next_energy_output_time += self.parameters.energy_interval;
        }
        Ok(())
    }
}
