use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::boundary::BoundaryParameters;
use crate::error::Error;
use crate::error::Result;
use crate::ics::InitialConditionsParameters;
use crate::kernel::Kernel;
use crate::output::OutputParameters;
use crate::prelude::Float;
use crate::timestep::CflParameters;
use crate::tree::TreeParameters;

/// A `section/key:value` assignment given on the command line, applied
/// onto the parameter file before deserialization.
#[derive(Clone, Debug)]
pub struct Override {
    pub section: String,
    pub keys: Vec<String>,
    pub value: serde_yaml::Value,
}

/// The raw contents of the parameter file. Each parameter struct is
/// deserialized from its own named top-level section.
pub struct ParameterFileContents {
    raw: serde_yaml::Value,
}

impl ParameterFileContents {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::ParameterFile(format!("failed to read {:?}: {}", path, e))
        })?;
        Self::from_str(&contents)
    }

    pub fn from_str(contents: &str) -> Result<Self> {
        let raw = serde_yaml::from_str(contents)
            .map_err(|e| Error::ParameterFile(format!("invalid yaml: {}", e)))?;
        Ok(Self { raw })
    }

    pub fn apply_override(&mut self, override_: &Override) -> Result<()> {
        let mut target = self
            .raw
            .as_mapping_mut()
            .ok_or_else(|| Error::ParameterFile("parameter file is not a mapping".into()))?
            .entry(override_.section.clone().into())
            .or_insert(serde_yaml::Value::Mapping(Default::default()));
        for key in override_.keys.iter() {
            target = target
                .as_mapping_mut()
                .ok_or_else(|| {
                    Error::ParameterFile(format!(
                        "cannot descend into '{}' of section '{}'",
                        key, override_.section
                    ))
                })?
                .entry(key.clone().into())
                .or_insert(serde_yaml::Value::Null);
        }
        *target = override_.value.clone();
        Ok(())
    }

    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let section = self.raw.get(name).ok_or_else(|| {
            Error::ParameterFile(format!("parameter section missing for '{}'", name))
        })?;
        serde_yaml::from_value(section.clone())
            .map_err(|e| Error::ParameterFile(format!("section '{}': {}", name, e)))
    }

    pub fn section_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        match self.raw.get(name) {
            Some(section) => serde_yaml::from_value(section.clone())
                .map_err(|e| Error::ParameterFile(format!("section '{}': {}", name, e))),
            None => Ok(T::default()),
        }
    }
}

/// Start and end of the simulated time span.
#[derive(Clone, Debug, Deserialize)]
pub struct TimeParameters {
    #[serde(default)]
    pub start: Float,
    pub end: Float,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SphType {
    Ssph,
    Disph,
    Gsph,
}

/// Parameters of the Monaghan artificial viscosity with the Balsara
/// shear limiter. Only meaningful for the `ssph` and `disph` schemes;
/// configuring it together with `gsph` is rejected.
#[derive(Clone, Debug, Deserialize)]
pub struct ViscosityParameters {
    pub alpha: Float,
    /// Apply the Balsara shear switch.
    #[serde(default = "default_true")]
    pub balsara: bool,
    /// Evolve a per-particle viscosity amplitude with the
    /// Morris & Monaghan source/decay equation.
    #[serde(default)]
    pub time_dependent: bool,
    #[serde(default = "default_alpha_min")]
    pub alpha_min: Float,
    #[serde(default = "default_alpha_max")]
    pub alpha_max: Float,
    /// Softening of the pairwise velocity divergence estimate.
    #[serde(default = "default_av_epsilon")]
    pub epsilon: Float,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConductivityParameters {
    pub alpha: Float,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GsphParameters {
    /// MUSCL reconstruction of the interface states from the stored
    /// per-particle gradients. First order when disabled.
    #[serde(default)]
    pub second_order: bool,
}

/// What to do when the Newton iteration on the smoothing length does
/// not converge within its iteration budget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonConvergencePolicy {
    Abort,
    #[default]
    KeepLast,
}

/// The physics section of the parameter file.
#[derive(Clone, Debug, Deserialize)]
pub struct PhysicsParameters {
    /// The number of neighbours that the adaptive smoothing length
    /// tries to aim for.
    pub neighbor_number: usize,
    /// Adiabatic index of the ideal gas equation of state.
    pub gamma: Float,
    pub kernel: Kernel,
    pub sph_type: SphType,
    #[serde(default = "default_true")]
    pub iterative_smoothing_length: bool,
    #[serde(default)]
    pub on_nonconvergence: NonConvergencePolicy,
    #[serde(default)]
    pub gsph: GsphParameters,
    #[serde(default)]
    pub artificial_viscosity: Option<ViscosityParameters>,
    #[serde(default)]
    pub artificial_conductivity: Option<ConductivityParameters>,
}

impl PhysicsParameters {
    pub fn validate(&self) -> Result<()> {
        if self.gamma <= 1.0 {
            return Err(Error::configuration(format!(
                "gamma must be greater than one, got {}",
                self.gamma
            )));
        }
        if self.neighbor_number == 0 {
            return Err(Error::configuration("neighbor_number must be positive"));
        }
        if self.sph_type == SphType::Gsph {
            if self.artificial_viscosity.is_some() {
                return Err(Error::configuration(
                    "gsph provides shock dissipation through the riemann solver; \
                     artificial_viscosity must not be set",
                ));
            }
            if self.artificial_conductivity.is_some() {
                return Err(Error::configuration(
                    "artificial_conductivity must not be set for gsph",
                ));
            }
        }
        if let Some(viscosity) = &self.artificial_viscosity {
            if viscosity.alpha < 0.0 || viscosity.epsilon <= 0.0 {
                return Err(Error::configuration(
                    "artificial_viscosity requires alpha >= 0 and epsilon > 0",
                ));
            }
            if viscosity.time_dependent && viscosity.alpha_min > viscosity.alpha_max {
                return Err(Error::configuration(
                    "artificial_viscosity requires alpha_min <= alpha_max",
                ));
            }
        }
        Ok(())
    }

    /// The viscosity amplitude particles start from.
    pub fn initial_alpha(&self) -> Float {
        self.artificial_viscosity
            .as_ref()
            .map(|v| v.alpha)
            .unwrap_or(0.0)
    }
}

/// All parameter sections of a run.
pub struct RunParameters {
    pub time: TimeParameters,
    pub cfl: CflParameters,
    pub physics: PhysicsParameters,
    pub boundary: BoundaryParameters,
    pub tree: TreeParameters,
    pub output: OutputParameters,
    pub initial_conditions: InitialConditionsParameters,
}

impl RunParameters {
    pub fn load(contents: &ParameterFileContents) -> Result<Self> {
        let parameters = Self {
            time: contents.section("time")?,
            cfl: contents.section_or_default("cfl")?,
            physics: contents.section("physics")?,
            boundary: contents.section("boundary")?,
            tree: contents.section_or_default("tree")?,
            output: contents.section("output")?,
            initial_conditions: contents.section("initial_conditions")?,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn validate(&self) -> Result<()> {
        if self.time.end < self.time.start {
            return Err(Error::configuration("time.end must not precede time.start"));
        }
        self.physics.validate()?;
        self.boundary.validate()?;
        self.tree.validate()?;
        Ok(())
    }
}

pub(crate) fn default_true() -> bool {
    true
}

fn default_alpha_min() -> Float {
    0.1
}

fn default_alpha_max() -> Float {
    2.0
}

fn default_av_epsilon() -> Float {
    0.01
}
