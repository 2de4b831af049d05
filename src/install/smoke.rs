// src/install/smoke.rs

//! Post-install smoke test
//!
//! Runs the installed executable once with fixed arguments and checks its
//! combined output for an expected marker. stdin is nulled so a tool that
//! prompts cannot hang the install; stdout and stderr are drained on helper
//! threads so a chatty tool cannot fill its pipes and stall.

use crate::error::{Error, Result};
use crate::recipe::TestSection;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};
use wait_timeout::ChildExt;

/// Default bound on the smoke test child (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const SPAWN_RETRIES: u32 = 5;

/// A single invocation plus the marker its output must contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeTest {
    args: Vec<String>,
    expect: String,
    timeout: Duration,
}

impl SmokeTest {
    /// Run `<executable> version` and expect `expect` in the output
    pub fn new(expect: impl Into<String>) -> Self {
        Self {
            args: vec!["version".to_string()],
            expect: expect.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Build from a recipe's `[test]` section
    pub fn from_recipe(test: &TestSection) -> Self {
        Self {
            args: test.args.clone(),
            expect: test.expect.clone(),
            timeout: Duration::from_secs(test.timeout_secs),
        }
    }

    /// Replace the arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set custom timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Expected output marker
    pub fn expect(&self) -> &str {
        &self.expect
    }

    /// Run against `executable`, returning the combined output on success
    pub fn run(&self, executable: &Path) -> Result<String> {
        let failed = |reason: String| Error::SmokeTestFailed {
            executable: executable.to_path_buf(),
            reason,
        };

        info!("Smoke testing {} {}", executable.display(), self.args.join(" "));

        let mut child = spawn(executable, &self.args)
            .map_err(|e| failed(format!("failed to spawn: {}", e)))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                // Reader threads are left detached: a grandchild may still
                // hold the pipes open after the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::SmokeTestTimeout {
                    executable: executable.to_path_buf(),
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let mut output = collect(stdout);
        output.push_str(&collect(stderr));
        debug!("Smoke test output: {}", output.trim_end());

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "a signal".to_string(), |c| format!("code {}", c));
            return Err(failed(format!(
                "exited with {}: {}",
                code,
                output.trim_end()
            )));
        }

        if !output.contains(&self.expect) {
            return Err(failed(format!(
                "output did not contain '{}': {}",
                self.expect,
                output.trim_end()
            )));
        }

        info!("Smoke test passed");
        Ok(output)
    }
}

/// Spawn the child, retrying briefly on ETXTBSY
///
/// A just-written executable can still be open for writing in a forked but
/// not yet exec'd sibling process.
fn spawn(executable: &Path, args: &[String]) -> std::io::Result<Child> {
    let mut attempts = 0;
    loop {
        let result = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        match result {
            Err(e) if e.raw_os_error() == Some(libc::ETXTBSY) && attempts < SPAWN_RETRIES => {
                attempts += 1;
                thread::sleep(Duration::from_millis(50));
            }
            other => return other,
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
