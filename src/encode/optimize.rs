use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::OptimizerOpts;
use crate::foundation::error::{LoopcompError, LoopcompResult};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Run the external lossless optimizer over `bytes`.
///
/// Returns the optimized bytes on success. When the optimizer is disabled, missing, fails,
/// produces nothing, or exceeds its timeout, the input is returned unchanged.
pub fn optimize_gif(bytes: Vec<u8>, opts: &OptimizerOpts) -> Vec<u8> {
    if !opts.enabled || bytes.is_empty() {
        return bytes;
    }
    match run_optimizer(&bytes, opts) {
        Ok(out) if !out.is_empty() => {
            tracing::debug!(
                program = %opts.program,
                before = bytes.len(),
                after = out.len(),
                "optimizer pass done"
            );
            out
        }
        Ok(_) => {
            tracing::warn!(program = %opts.program, "optimizer produced no output; keeping input");
            bytes
        }
        Err(e) => {
            tracing::warn!(program = %opts.program, error = %e, "optimizer failed; keeping input");
            bytes
        }
    }
}

fn run_optimizer(input: &[u8], opts: &OptimizerOpts) -> LoopcompResult<Vec<u8>> {
    let mut child = Command::new(&opts.program)
        .args(&opts.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            LoopcompError::encode(format!("failed to spawn '{}': {e}", opts.program))
        })?;

    let (Some(mut stdin), Some(mut stdout), Some(mut stderr)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(LoopcompError::encode("failed to open optimizer pipes"));
    };

    let input = input.to_vec();
    let writer = thread::spawn(move || stdin.write_all(&input));
    let out_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });
    let err_reader = thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        buf
    });

    let status = match wait_with_deadline(&mut child, opts.timeout) {
        Ok(status) => status,
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = writer.join();
            let _ = out_reader.join();
            let _ = err_reader.join();
            return Err(e);
        }
    };

    let write_result = writer
        .join()
        .map_err(|_| LoopcompError::encode("optimizer stdin thread panicked"))?;
    let stdout = out_reader
        .join()
        .map_err(|_| LoopcompError::encode("optimizer stdout thread panicked"))?
        .map_err(|e| LoopcompError::encode(format!("failed to read optimizer output: {e}")))?;
    let stderr = err_reader.join().unwrap_or_default();

    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr);
        return Err(LoopcompError::encode(format!(
            "'{}' exited with status {status}: {}",
            opts.program,
            stderr.trim()
        )));
    }
    write_result
        .map_err(|e| LoopcompError::encode(format!("failed to write optimizer input: {e}")))?;

    Ok(stdout)
}

fn wait_with_deadline(
    child: &mut std::process::Child,
    timeout: Duration,
) -> LoopcompResult<ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                return Err(LoopcompError::encode(format!(
                    "optimizer timed out after {timeout:?}"
                )));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(LoopcompError::encode(format!(
                    "failed to wait for optimizer: {e}"
                )));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/optimize.rs"]
mod tests;
