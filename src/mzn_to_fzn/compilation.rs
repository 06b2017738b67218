use super::{Conversion, Request};
use crate::config::Config;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub async fn convert_mzn(
    config: &Config,
    request: Request<'_>,
    cancellation_token: &CancellationToken,
) -> Result<Conversion> {
    let mut cmd = get_mzn_to_fzn_cmd(config, request);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let child = cmd
        .spawn()
        .map_err(|e| ConversionError::Spawn(config.minizinc_exe.clone(), e))?;
    let pid = child.id();

    // Dropping the child kills it, so both early returns leave nothing running.
    let output = tokio::select! {
        _ = cancellation_token.cancelled() => {
            kill_process_group(pid);
            return Ok(Conversion::Cancelled);
        }
        result = tokio::time::timeout(config.timeout, child.wait_with_output()) => result,
    };

    let Ok(output) = output else {
        kill_process_group(pid);
        return Ok(Conversion::TimedOut);
    };
    let output = output?;

    if !output.status.success() {
        return Ok(Conversion::Failed {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(Conversion::Done)
}

fn get_mzn_to_fzn_cmd(config: &Config, request: Request<'_>) -> Command {
    let mut cmd = Command::new(&config.minizinc_exe);
    cmd.kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);
    cmd.arg("-c");
    cmd.arg(request.model);
    cmd.args(["--solver", config.solver.as_str()]);
    if let Some(data) = request.data {
        cmd.arg(data);
    }
    cmd.arg("--fzn").arg(request.fzn);
    cmd.arg("--no-output-ozn");

    cmd
}

/// MiniZinc may start helper processes of its own; they share its process group.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("failed to start '{}'", .0.display())]
    Spawn(PathBuf, #[source] std::io::Error),
    #[error("IO error while waiting for MiniZinc")]
    Io(#[from] std::io::Error),
}
