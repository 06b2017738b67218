use crate::discovery::WorkItem;
use std::path::{Path, PathBuf};

pub const FZN_EXTENSION: &str = "fzn";
pub const LOG_EXTENSION: &str = "log";

/// Where the flattened artifact of a work item and its failure log go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLocation {
    pub dir: PathBuf,
    pub fzn: PathBuf,
    pub log: PathBuf,
}

impl OutputLocation {
    pub fn new(input_root: &Path, output_root: &Path, item: &WorkItem) -> Result<Self> {
        let relative = item
            .dir
            .strip_prefix(input_root)
            .map_err(|_| Error::OutsideInputRoot(item.dir.clone()))?;
        let dir = output_root.join(relative);

        let model_stem = stem(&item.model)?;
        let prefix = match &item.data {
            Some(data) => format!("{model_stem}_{}", stem(data)?),
            None => model_stem,
        };

        // Appended rather than set with `with_extension`, which would eat dotted stems.
        Ok(Self {
            fzn: dir.join(format!("{prefix}.{FZN_EXTENSION}")),
            log: dir.join(format!("{prefix}.{LOG_EXTENSION}")),
            dir,
        })
    }
}

fn stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| Error::NoFileName(path.to_path_buf()))
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("'{}' is not inside the input directory", .0.display())]
    OutsideInputRoot(PathBuf),
    #[error("'{}' has no file name", .0.display())]
    NoFileName(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
