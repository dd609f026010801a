use std::fs;
use std::fs::OpenOptions;
use std::path::Path;

use serde::Serialize;

use crate::config::NUM_DIMENSIONS;
use crate::error::Error;
use crate::particle::Particle;
use crate::prelude::Float;

/// One entry of the energy/momentum time series. Appended to
/// `time_series/energy.yml` as a growing YAML list.
#[derive(Clone, Debug, Serialize)]
pub struct EnergyRecord {
    pub time: Float,
    pub kinetic: Float,
    pub thermal: Float,
    pub total: Float,
    pub linear_momentum: Vec<Float>,
    /// The `D (D - 1) / 2` independent angular momentum components;
    /// empty in one dimension.
    pub angular_momentum: Vec<Float>,
}

impl EnergyRecord {
    pub fn measure(time: Float, reals: &[Particle]) -> Self {
        let mut kinetic = 0.0;
        let mut thermal = 0.0;
        let mut linear_momentum = vec![0.0; NUM_DIMENSIONS];
        for particle in reals.iter() {
            kinetic += particle.kinetic_energy();
            thermal += particle.thermal_energy();
            let momentum = particle.momentum();
            for d in 0..NUM_DIMENSIONS {
                linear_momentum[d] += momentum[d];
            }
        }
        Self {
            time,
            kinetic,
            thermal,
            total: kinetic + thermal,
            linear_momentum,
            angular_momentum: angular_momentum(reals),
        }
    }
}

#[cfg(feature = "1d")]
fn angular_momentum(_reals: &[Particle]) -> Vec<Float> {
    vec![]
}

#[cfg(feature = "2d")]
fn angular_momentum(reals: &[Particle]) -> Vec<Float> {
    let mut z = 0.0;
    for particle in reals.iter() {
        z += particle.mass * particle.pos.perp_dot(particle.vel);
    }
    vec![z]
}

#[cfg(feature = "3d")]
fn angular_momentum(reals: &[Particle]) -> Vec<Float> {
    let mut total = glam::DVec3::ZERO;
    for particle in reals.iter() {
        total += particle.mass * particle.pos.cross(particle.vel);
    }
    vec![total.x, total.y, total.z]
}

pub fn append_energy_record(output_dir: &Path, record: &EnergyRecord) -> crate::error::Result<()> {
    let time_series_dir = output_dir.join("time_series");
    fs::create_dir_all(&time_series_dir)?;
    let path = time_series_dir.join("energy.yml");
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_yaml::to_writer(file, &[record])
        .map_err(|e| Error::Output(format!("failed to write time series: {}", e)))
}
