use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::parameters::Override;

#[derive(Debug)]
pub struct ParseParameterOverrideError(String);

impl fmt::Display for ParseParameterOverrideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Error for ParseParameterOverrideError {}

impl FromStr for Override {
    type Err = ParseParameterOverrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split: Vec<_> = s.split(':').collect();
        if split.len() != 2 {
            return Err(ParseParameterOverrideError(format!(
                "Expected key and value separated by `:`, found `{s}`",
            )));
        }
        let mut keys: Vec<String> = split[0].split('/').map(|x| x.to_owned()).collect();
        let section = keys.remove(0);
        let value = serde_yaml::from_str(split[1]).map_err(|e| {
            ParseParameterOverrideError(format!(
                "Failed to parse parameter value `{}`: {}",
                split[1], e
            ))
        })?;
        Ok(Override {
            section,
            keys,
            value,
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CommandLineOptions {
    /// `section/key:value` assignments applied onto the parameter file.
    pub parameter_overrides: Vec<Override>,
    #[clap(long)]
    pub parameter_file_path: PathBuf,
    #[clap(short, parse(from_occurrences))]
    pub verbosity: usize,
    #[clap(long)]
    pub num_worker_threads: Option<usize>,
}
