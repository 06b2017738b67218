use crate::logging::{self, Logger};
use itertools::Itertools;
use regex::Regex;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MODEL_EXTENSION: &str = "mzn";
pub const DATA_EXTENSIONS: [&str; 2] = ["dzn", "json"];
pub const DATA_DIR_NAME: &str = "data";

/// One model/data pairing to flatten. Ordered by directory, then model, then data,
/// with "no data" sorting before any data file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkItem {
    pub dir: PathBuf,
    pub model: PathBuf,
    pub data: Option<PathBuf>,
}

/// Only a failure on `input_root` itself is an error. Unreadable directories
/// below it are logged and left out.
pub fn discover(
    input_root: &Path,
    model_filter: Option<&Regex>,
    logger: &Logger,
) -> Result<Vec<WorkItem>> {
    let mut items = Vec::new();
    let mut unreadable = BTreeSet::new();

    for entry in WalkDir::new(input_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                // The walk reports a directory we already failed to list a second time.
                if !e.path().is_some_and(|path| unreadable.contains(path)) {
                    logging::warning!(logger, "skipping part of the input tree: {e}");
                }
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let listing = match Listing::read(entry.path()) {
            Ok(listing) => listing,
            Err(e) if entry.depth() == 0 => return Err(e),
            Err(e) => {
                logging::warning!(logger, "skipping {e:#}");
                unreadable.insert(entry.path().to_path_buf());
                continue;
            }
        };
        let models: Vec<_> = listing
            .files
            .iter()
            .filter(|file| is_model(file))
            .filter(|file| matches_filter(input_root, file, model_filter))
            .cloned()
            .collect();
        if models.is_empty() {
            continue;
        }

        let data = data_files(&listing, logger);
        items.extend(pairings(entry.path(), &models, data));
    }

    items.sort();
    Ok(items)
}

fn pairings(dir: &Path, models: &[PathBuf], data: BTreeSet<PathBuf>) -> Vec<WorkItem> {
    let data: Vec<Option<PathBuf>> = if data.is_empty() {
        vec![None]
    } else {
        data.into_iter().map(Some).collect()
    };

    models
        .iter()
        .cartesian_product(data.iter())
        .map(|(model, data)| WorkItem {
            dir: dir.to_path_buf(),
            model: model.clone(),
            data: data.clone(),
        })
        .collect()
}

/// Data files next to the models, or failing that, those of the designated
/// data subdirectory.
fn data_files(listing: &Listing, logger: &Logger) -> BTreeSet<PathBuf> {
    let local: BTreeSet<_> = listing.files.iter().filter(|f| is_data(f)).cloned().collect();
    if !local.is_empty() {
        return local;
    }

    let Some(data_dir) = data_subdirectory(&listing.subdirs) else {
        return local;
    };

    match Listing::read(data_dir) {
        Ok(data_listing) => data_listing.files.into_iter().filter(|f| is_data(f)).collect(),
        Err(e) => {
            logging::warning!(logger, "no data files for {}: {e:#}", listing.dir.display());
            local
        }
    }
}

/// A subdirectory named `data`, or the only subdirectory if there is exactly one.
fn data_subdirectory(subdirs: &[PathBuf]) -> Option<&PathBuf> {
    subdirs
        .iter()
        .find(|dir| dir.file_name() == Some(OsStr::new(DATA_DIR_NAME)))
        .or(match subdirs {
            [only] => Some(only),
            _ => None,
        })
}

fn matches_filter(input_root: &Path, model: &Path, filter: Option<&Regex>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    let relative = model.strip_prefix(input_root).unwrap_or(model);
    filter.is_match(&relative.to_string_lossy())
}

fn is_model(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(MODEL_EXTENSION))
}

fn is_data(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| DATA_EXTENSIONS.iter().any(|data_ext| ext == *data_ext))
}

/// Direct children of a single directory, split into files and subdirectories.
struct Listing {
    dir: PathBuf,
    files: Vec<PathBuf>,
    subdirs: Vec<PathBuf>,
}

impl Listing {
    fn read(dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        let mut subdirs = Vec::new();

        let entries = fs::read_dir(dir).map_err(|e| Error::ReadDir(dir.to_path_buf(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::ReadDir(dir.to_path_buf(), e))?;
            let path = entry.path();
            // Follows symlinks, unlike the walk itself.
            if path.is_dir() {
                subdirs.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        subdirs.sort();
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            subdirs,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to walk the input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to read directory '{}'", .0.display())]
    ReadDir(PathBuf, #[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
