use crate::args::Verbosity;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Leveled log handle. Cloning shares the underlying sink.
#[derive(Clone)]
pub struct Logger {
    verbosity: Verbosity,
    sink: Sink,
}

impl Logger {
    pub fn stderr(verbosity: Verbosity) -> Self {
        Self::with_sink(verbosity, io::stderr())
    }

    pub fn with_sink(verbosity: Verbosity, sink: impl Write + Send + 'static) -> Self {
        Self {
            verbosity,
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    pub fn enabled(&self, level: Verbosity) -> bool {
        level != Verbosity::Quiet && self.verbosity >= level
    }

    pub(crate) fn log_msg_impl(
        &self,
        level: Verbosity,
        args: fmt::Arguments,
        file: &str,
        line: u32,
    ) {
        if !self.enabled(level) {
            return;
        }

        let label = label(level);
        // A poisoned sink only means another thread panicked mid-write.
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(sink, "{label}: [{file}:{line}] {args}");
        let _ = sink.flush();
    }

    // This function is purely used to force the anyhow::Error type
    // to avoid forgetting to convert it to that type before printing
    pub(crate) fn log_error_impl(&self, e: &anyhow::Error, file: &str, line: u32) {
        self.log_msg_impl(Verbosity::Error, format_args!("{e:#}"), file, line);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("verbosity", &self.verbosity)
            .finish_non_exhaustive()
    }
}

fn label(level: Verbosity) -> &'static str {
    match level {
        Verbosity::Quiet => "",
        Verbosity::Error => "ERROR",
        Verbosity::Warning => "WARNING",
        Verbosity::Info => "INFO",
        Verbosity::Debug => "DEBUG",
    }
}

macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_msg_impl(
            $crate::args::Verbosity::Debug,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

macro_rules! info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_msg_impl(
            $crate::args::Verbosity::Info,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

macro_rules! warning {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_msg_impl(
            $crate::args::Verbosity::Warning,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

macro_rules! error_msg {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log_msg_impl(
            $crate::args::Verbosity::Error,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

macro_rules! error {
    ($logger:expr, $e:expr) => {
        $logger.log_error_impl(&$e, file!(), line!())
    };
}

pub(crate) use debug;
pub(crate) use error;
pub(crate) use error_msg;
pub(crate) use info;
pub(crate) use warning;


#[cfg(test)]
mod tests {
    use super::test_sink::SharedBuffer;
    use super::*;

    #[test]
    fn messages_above_verbosity_are_dropped() {
        let buffer = SharedBuffer::default();
        let logger = Logger::with_sink(Verbosity::Warning, buffer.clone());

        info!(logger, "not shown");
        warning!(logger, "shown {}", 1);

        let contents = buffer.contents();
        assert!(!contents.contains("not shown"));
        assert!(contents.contains("WARNING: [src/logging.rs:"));
        assert!(contents.contains("shown 1"));
    }

    #[test]
    fn quiet_logs_nothing() {
        let buffer = SharedBuffer::default();
        let logger = Logger::with_sink(Verbosity::Quiet, buffer.clone());

        error!(logger, anyhow::anyhow!("boom"));
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn errors_print_their_context_chain() {
        let buffer = SharedBuffer::default();
        let logger = Logger::with_sink(Verbosity::Error, buffer.clone());

        let e = anyhow::anyhow!("root cause").context("outer");
        error!(logger, e);
        assert!(buffer.contents().contains("ERROR: "));
        assert!(buffer.contents().contains("outer: root cause"));
    }
}
