mod compilation;

pub use compilation::*;

use std::path::Path;
use std::process::ExitStatus;

/// A single model/data pairing and the FlatZinc file it should be flattened into.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub model: &'a Path,
    pub data: Option<&'a Path>,
    pub fzn: &'a Path,
}

#[derive(Debug)]
pub enum Conversion {
    Done,
    Failed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    TimedOut,
    Cancelled,
}
