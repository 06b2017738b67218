use crate::logging::{self, Logger};
use tokio_util::sync::CancellationToken;

/// Cancels `cancel_token` on the first termination signal. The running
/// compiler is killed and no further pairings are started. The listeners stay
/// registered for the rest of the process, so later signals are ignored.
#[cfg(unix)]
pub fn spawn_signal_handler(cancel_token: CancellationToken, logger: Logger) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        macro_rules! register_signal {
            ($kind:expr) => {
                match signal($kind) {
                    Ok(s) => s,
                    Err(e) => {
                        logging::error_msg!(logger, "Failed to register signal handler: {e}");
                        return;
                    }
                }
            };
        }

        let mut sigint = register_signal!(SignalKind::interrupt());
        let mut sigterm = register_signal!(SignalKind::terminate());
        let mut sighup = register_signal!(SignalKind::hangup());
        let mut sigquit = register_signal!(SignalKind::quit());

        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
            _ = sighup.recv() => "SIGHUP",
            _ = sigquit.recv() => "SIGQUIT",
        };
        logging::warning!(logger, "received {name}, stopping");
        cancel_token.cancel();
    });
}

#[cfg(not(unix))]
pub fn spawn_signal_handler(cancel_token: CancellationToken, logger: Logger) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logging::error_msg!(logger, "Failed to register signal handler: {e}");
            return;
        }
        logging::warning!(logger, "received Ctrl-C, stopping");
        cancel_token.cancel();
    });
}
