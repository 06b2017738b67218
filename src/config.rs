use crate::args::Args;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SOLVER: &str = "gecode";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub minizinc_exe: PathBuf,
    pub solver: String,
    pub timeout: Duration,
    pub force: bool,
    pub model_filter: Option<Regex>,
}

impl Config {
    pub fn new(input_dir: &Path, output_dir: &Path, minizinc_exe: PathBuf) -> Result<Self> {
        Ok(Self {
            input_dir: absolute(input_dir)?,
            output_dir: absolute(output_dir)?,
            minizinc_exe,
            solver: DEFAULT_SOLVER.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            force: false,
            model_filter: None,
        })
    }

    pub fn from_args(args: &Args, minizinc_exe: PathBuf) -> Result<Self> {
        let model_filter = args
            .filter
            .as_deref()
            .map(Regex::new)
            .transpose()?;

        Ok(Self {
            solver: args.solver.clone(),
            timeout: Duration::from_secs(args.timeout),
            force: args.force,
            model_filter,
            ..Self::new(&args.input, &args.output, minizinc_exe)?
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::Absolute(path.to_path_buf(), e))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid model filter: {0}")]
    InvalidFilter(#[from] regex::Error),
    #[error("could not make '{}' absolute", .0.display())]
    Absolute(PathBuf, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_come_from_constants() {
        let args = Args::parse_from(["mzn-flatten", "in", "out"]);
        let config = Config::from_args(&args, PathBuf::from("/usr/bin/minizinc")).unwrap();

        assert_eq!(config.solver, DEFAULT_SOLVER);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.input_dir.is_absolute());
        assert!(config.output_dir.ends_with("out"));
        assert!(!config.force);
        assert!(config.model_filter.is_none());
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let args = Args::parse_from(["mzn-flatten", "in", "out", "--filter", "("]);
        let result = Config::from_args(&args, PathBuf::from("minizinc"));
        assert!(matches!(result, Err(Error::InvalidFilter(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let result = Args::try_parse_from(["mzn-flatten", "in", "out", "--timeout", "0"]);
        assert!(result.is_err());

        let args = Args::try_parse_from(["mzn-flatten", "in", "out", "--timeout", "1"]).unwrap();
        assert_eq!(args.timeout, 1);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "mzn-flatten",
            "in",
            "out",
            "--solver",
            "chuffed",
            "--timeout",
            "5",
            "--force",
            "--filter",
            "^golomb/",
        ]);
        let config = Config::from_args(&args, PathBuf::from("minizinc")).unwrap();

        assert_eq!(config.solver, "chuffed");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.force);
        assert!(config.model_filter.unwrap().is_match("golomb/golomb.mzn"));
    }
}
