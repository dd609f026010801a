use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::config::NUM_DIMENSIONS;
use crate::error::Result;
use crate::particle::Particle;
use crate::prelude::Float;

const AXIS_NAMES: [&str; 3] = ["x", "y", "z"];

/// Write one snapshot as `snapshot_{index}.csv` in the snapshot
/// directory. Units are whatever the initial conditions carried.
pub fn write_snapshot(
    output_dir: &Path,
    index: usize,
    time: Float,
    reals: &[Particle],
) -> Result<PathBuf> {
    let snapshot_dir = output_dir.join("snapshots");
    fs::create_dir_all(&snapshot_dir)?;
    let path = snapshot_dir.join(format!("snapshot_{:04}.csv", index));
    let mut writer = BufWriter::new(File::create(&path)?);
    writeln!(writer, "# time = {}", time)?;
    let mut header = vec!["id".to_owned()];
    for field in ["pos", "vel", "acc"] {
        for axis in AXIS_NAMES.iter().take(NUM_DIMENSIONS) {
            header.push(format!("{}_{}", field, axis));
        }
    }
    for field in ["mass", "dens", "pres", "ene", "sound", "sml", "neighbor"] {
        header.push(field.to_owned());
    }
    writeln!(writer, "{}", header.join(","))?;
    for particle in reals.iter() {
        let mut row = vec![particle.id.to_string()];
        for vector in [particle.pos, particle.vel, particle.acc] {
            for d in 0..NUM_DIMENSIONS {
                row.push(format!("{:e}", vector[d]));
            }
        }
        for value in [
            particle.mass,
            particle.dens,
            particle.pres,
            particle.ene,
            particle.sound,
            particle.sml,
        ] {
            row.push(format!("{:e}", value));
        }
        row.push(particle.neighbor.to_string());
        writeln!(writer, "{}", row.join(","))?;
    }
    Ok(path)
}
