//! Subprocess execution of the snippet tool.
//!
//! The tool is always spawned directly, never through a shell, so snippet
//! slugs and queries cannot be used for injection. A missing executable is a
//! configuration problem and gets its own error variant; every other spawn or
//! IO fault is reported with the underlying detail. A non-zero exit with
//! stderr noise is diagnostic only: the tool legitimately emits structured
//! error payloads on stdout alongside a failing status, so stdout is still
//! handed to the parser.

use std::ffi::{OsStr, OsString};
use std::io::{self, ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error(
        "snippet tool '{program}' not found. Install the CLI or point the tool path setting at it."
    )]
    NotFound { program: String },
    #[error("error running snippet tool '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Spawns the configured tool executable and captures its output.
#[derive(Debug, Clone)]
pub struct Invoker {
    program: OsString,
}

impl Invoker {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    /// Runs the tool with `args`, piping `input` to stdin when present, and
    /// returns trimmed stdout.
    pub fn invoke<I, S>(&self, args: I, input: Option<&str>) -> Result<String, InvokeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|err| self.classify(err))?;

        // Feed stdin from a helper thread so a tool that fills its stdout
        // pipe before draining stdin cannot deadlock the invocation.
        let writer = match (input, child.stdin.take()) {
            (Some(text), Some(mut pipe)) => {
                let payload = text.to_string();
                Some(thread::spawn(move || {
                    if let Err(err) = pipe.write_all(payload.as_bytes()) {
                        // The tool may exit without reading its input.
                        if err.kind() != ErrorKind::BrokenPipe {
                            log::warn!("failed to write snippet tool stdin: {err}");
                        }
                    }
                }))
            }
            _ => None,
        };

        let output = child.wait_with_output().map_err(|err| self.classify(err))?;
        if let Some(handle) = writer {
            let _ = handle.join();
        }

        if !output.status.success() && !output.stderr.is_empty() {
            log::warn!(
                "snippet tool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn classify(&self, err: io::Error) -> InvokeError {
        let program = self.program_name();
        if err.kind() == ErrorKind::NotFound {
            InvokeError::NotFound { program }
        } else {
            InvokeError::Io {
                program,
                source: err,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_executable_maps_to_not_found() {
        let invoker = Invoker::new("sniprunner-no-such-tool");
        let err = invoker
            .invoke(["list", "--json"], None)
            .expect_err("spawn should fail");
        assert!(matches!(err, InvokeError::NotFound { ref program } if program.contains("no-such-tool")));
    }

    #[cfg(unix)]
    #[test]
    fn stdout_is_trimmed_and_stdin_is_piped() {
        let invoker = Invoker::new("cat");
        let output = invoker
            .invoke::<[&str; 0], &str>([], Some("  payload  \n"))
            .expect("cat succeeds");
        assert_eq!(output, "payload");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_still_returns_stdout() {
        let invoker = Invoker::new("sh");
        let output = invoker
            .invoke(["-c", "echo on-stdout; echo on-stderr >&2; exit 3"], None)
            .expect("invocation itself succeeds");
        assert_eq!(output, "on-stdout");
    }
}
