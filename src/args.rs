use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{DEFAULT_SOLVER, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Verbosity {
    Quiet = 0,
    Error = 1,
    Warning = 2,
    Info = 3,
    Debug = 4,
}

/// Flatten every MiniZinc model/data pairing under a directory tree into FlatZinc.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Directory searched recursively for models (.mzn) and data files (.dzn, .json)
    pub input: PathBuf,

    /// Directory the flattened files are written to, mirroring the input tree
    pub output: PathBuf,

    /// Solver backend the models are flattened for
    #[arg(long, default_value = DEFAULT_SOLVER)]
    pub solver: String,

    /// Seconds a single flattening may take before it is killed
    #[arg(
        long,
        value_name = "SECONDS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Path to the MiniZinc executable. Looked up on PATH when omitted
    #[arg(long)]
    pub minizinc_exe: Option<PathBuf>,

    /// Only flatten models whose path relative to INPUT matches this regex
    #[arg(long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Flatten again even if the output file already exists
    #[arg(long)]
    pub force: bool,

    /// Print the planned pairings as JSON lines instead of flattening
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value = "info")]
    pub verbosity: Verbosity,
}
