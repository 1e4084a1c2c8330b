//! Shell command runner with streamed output

use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::errors::ProcessError;

const READ_BUFFER_SIZE: usize = 4096;

/// Which pipe a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One piece of process output plus everything received so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub data: String,
    pub accumulated: String,
}

/// Runs commands through `<shell> -c`
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: String,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl ProcessRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Run `command` in `working_dir`.
    ///
    /// Every stdout/stderr chunk is sent on `chunks` in arrival order,
    /// together with the accumulated output. Returns the accumulated output
    /// on exit code 0. A closed `chunks` receiver does not stop the process.
    pub async fn run(
        &self,
        command: &str,
        working_dir: &Path,
        chunks: mpsc::UnboundedSender<OutputChunk>,
    ) -> Result<String, ProcessError> {
        debug!("Running `{}` in {}", command, working_dir.display());

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProcessError::Spawn(format!("{} -c: {}", self.shell, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessError::Io("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProcessError::Io("stderr was not captured".to_string()))?;

        let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(stdout, OutputStream::Stdout, raw_tx.clone()));
        tokio::spawn(pump(stderr, OutputStream::Stderr, raw_tx));

        let mut accumulated = String::new();
        while let Some((stream, data)) = raw_rx.recv().await {
            accumulated.push_str(&data);
            let _ = chunks.send(OutputChunk {
                stream,
                data,
                accumulated: accumulated.clone(),
            });
        }

        let status = child
            .wait()
            .await
            .map_err(|e| ProcessError::Io(e.to_string()))?;

        if status.success() {
            Ok(accumulated)
        } else {
            Err(ProcessError::Exited {
                code: status.code(),
                output: accumulated,
            })
        }
    }
}

/// Forward one pipe into the merge channel until EOF
async fn pump<R>(
    mut reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<(OutputStream, String)>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let text = take_decodable(&mut pending);
                if !text.is_empty() && tx.send((stream, text)).is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to read {:?}: {}", stream, e);
                break;
            }
        }
    }

    if !pending.is_empty() {
        let _ = tx.send((stream, String::from_utf8_lossy(&pending).into_owned()));
    }
}

/// Decode as much of `pending` as possible, keeping an incomplete trailing
/// UTF-8 sequence for the next read.
fn take_decodable(pending: &mut Vec<u8>) -> String {
    let keep = match std::str::from_utf8(pending) {
        Ok(_) => 0,
        Err(e) if e.error_len().is_none() => pending.len() - e.valid_up_to(),
        Err(_) => 0,
    };
    let tail = pending.split_off(pending.len() - keep);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = tail;
    text
}
