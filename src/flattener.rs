use crate::config::Config;
use crate::discovery::{self, WorkItem};
use crate::logging::{self, Logger};
use crate::mzn_to_fzn::{self, Conversion, Request};
use crate::output::OutputLocation;
use anyhow::Context;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Flattened,
    Skipped,
    Failed,
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub flattened: usize,
    pub skipped: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub cancelled: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: ItemOutcome) {
        let counter = match outcome {
            ItemOutcome::Flattened => &mut self.flattened,
            ItemOutcome::Skipped => &mut self.skipped,
            ItemOutcome::Failed => &mut self.failed,
            ItemOutcome::TimedOut => &mut self.timed_out,
            ItemOutcome::Cancelled => &mut self.cancelled,
        };
        *counter += 1;
    }

    pub fn attempted(&self) -> usize {
        self.flattened + self.skipped + self.failed + self.timed_out + self.cancelled
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pairings: {} flattened, {} already flattened, {} failed, {} timed out",
            self.total, self.flattened, self.skipped, self.failed, self.timed_out
        )?;
        if self.cancelled > 0 || self.attempted() < self.total {
            write!(f, ", {} not finished", self.total - self.attempted() + self.cancelled)?;
        }
        Ok(())
    }
}

/// Position of an item in the run, printed as "i of N".
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub index: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {}", self.index, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedItem {
    pub model: PathBuf,
    pub data: Option<PathBuf>,
    pub fzn: PathBuf,
    pub flattened: bool,
}

pub struct Flattener {
    config: Config,
    logger: Logger,
    cancellation_token: CancellationToken,
}

impl Flattener {
    pub fn new(config: Config, logger: Logger, cancellation_token: CancellationToken) -> Self {
        logging::debug!(logger, "input dir: {}", config.input_dir.display());
        logging::debug!(logger, "output dir: {}", config.output_dir.display());
        logging::debug!(logger, "minizinc path: {}", config.minizinc_exe.display());
        Self {
            config,
            logger,
            cancellation_token,
        }
    }

    pub fn discover(&self) -> discovery::Result<Vec<WorkItem>> {
        let items = discovery::discover(
            &self.config.input_dir,
            self.config.model_filter.as_ref(),
            &self.logger,
        )?;
        for item in &items {
            logging::debug!(self.logger, "found {}", describe(item));
        }
        Ok(items)
    }

    pub fn plan(&self) -> anyhow::Result<Vec<PlannedItem>> {
        self.discover()?
            .into_iter()
            .map(|item| -> anyhow::Result<PlannedItem> {
                let location = self.location(&item)?;
                Ok(PlannedItem {
                    flattened: location.fzn.exists(),
                    fzn: location.fzn,
                    model: item.model,
                    data: item.data,
                })
            })
            .collect()
    }

    /// Flattens every discovered pairing in order. Individual failures are
    /// logged and counted, only cancellation ends the run early.
    pub async fn run(&self) -> discovery::Result<RunSummary> {
        let items = self.discover()?;
        let mut summary = RunSummary {
            total: items.len(),
            ..RunSummary::default()
        };
        logging::info!(
            self.logger,
            "found {} pairings under {}",
            items.len(),
            self.config.input_dir.display()
        );

        for (index, item) in items.iter().enumerate() {
            if self.cancellation_token.is_cancelled() {
                logging::warning!(
                    self.logger,
                    "cancelled, {} pairings were not attempted",
                    items.len() - index
                );
                break;
            }

            let progress = Progress {
                index: index + 1,
                total: items.len(),
            };
            summary.record(self.flatten_one(item, progress).await);
        }

        Ok(summary)
    }

    pub async fn flatten_one(&self, item: &WorkItem, progress: Progress) -> ItemOutcome {
        let location = match self.location(item) {
            Ok(location) => location,
            Err(e) => {
                logging::error!(self.logger, e);
                return ItemOutcome::Failed;
            }
        };

        if !self.config.force && location.fzn.exists() {
            logging::debug!(
                self.logger,
                "skipping {}: {} already exists ({progress})",
                describe(item),
                location.fzn.display()
            );
            return ItemOutcome::Skipped;
        }

        if let Err(e) = tokio::fs::create_dir_all(&location.dir).await {
            let e = anyhow::Error::new(e)
                .context(format!("failed to create {}", location.dir.display()));
            logging::error!(self.logger, e);
            return ItemOutcome::Failed;
        }
        self.remove_file(&location.log).await;

        logging::debug!(
            self.logger,
            "flattening {} into {}",
            describe(item),
            location.fzn.display()
        );
        let request = Request {
            model: &item.model,
            data: item.data.as_deref(),
            fzn: &location.fzn,
        };
        let conversion =
            mzn_to_fzn::convert_mzn(&self.config, request, &self.cancellation_token).await;

        match conversion {
            Ok(Conversion::Done) => {
                logging::info!(self.logger, "created {} ({progress})", location.fzn.display());
                ItemOutcome::Flattened
            }
            Ok(Conversion::Failed {
                status,
                stdout,
                stderr,
            }) => {
                logging::error_msg!(
                    self.logger,
                    "failed to flatten {} ({progress}): {status}",
                    describe(item)
                );
                if !stdout.trim().is_empty() {
                    logging::error_msg!(self.logger, "stdout: {}", stdout.trim_end());
                }
                self.remove_file(&location.fzn).await;
                if !stderr.trim().is_empty() {
                    self.write_log(&location.log, &stderr).await;
                }
                ItemOutcome::Failed
            }
            Ok(Conversion::TimedOut) => {
                let timeout = self.config.timeout;
                logging::error_msg!(
                    self.logger,
                    "timed out after {timeout:?} flattening {} ({progress})",
                    describe(item)
                );
                self.remove_file(&location.fzn).await;
                self.write_log(&location.log, &format!("timed out after {timeout:?}\n"))
                    .await;
                ItemOutcome::TimedOut
            }
            Ok(Conversion::Cancelled) => {
                logging::warning!(self.logger, "cancelled flattening {}", describe(item));
                self.remove_file(&location.fzn).await;
                ItemOutcome::Cancelled
            }
            Err(e) => {
                let e = anyhow::Error::new(e)
                    .context(format!("failed to flatten {} ({progress})", describe(item)));
                logging::error!(self.logger, e);
                self.remove_file(&location.fzn).await;
                ItemOutcome::Failed
            }
        }
    }

    fn location(&self, item: &WorkItem) -> anyhow::Result<OutputLocation> {
        OutputLocation::new(&self.config.input_dir, &self.config.output_dir, item)
            .with_context(|| format!("no output location for {}", describe(item)))
    }

    async fn remove_file(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => logging::warning!(self.logger, "could not remove {}: {e}", path.display()),
        }
    }

    async fn write_log(&self, path: &Path, contents: &str) {
        if let Err(e) = tokio::fs::write(path, contents).await {
            logging::warning!(self.logger, "could not write {}: {e}", path.display());
        }
    }
}

fn describe(item: &WorkItem) -> String {
    match &item.data {
        Some(data) => format!("{} with {}", item.model.display(), data.display()),
        None => item.model.display().to_string(),
    }
}
