use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

/// Errors raised while handing a test case to a target.
#[derive(Error, Debug)]
pub enum TargetError {
    /// The test case could not be staged on disk before delivery.
    #[error("failed to stage test case for delivery: {0}")]
    Staging(String),
    /// The target process could not be launched.
    #[error("failed to launch target process {0:?}: {1}")]
    Launch(PathBuf, String),
}

/// Capability interface implemented by process-based targets only.
///
/// The operator queries for this capability via [`Target::as_process`]
/// instead of inspecting concrete target types.
pub trait ProcessControl {
    /// Overrides the executable launched for each delivered test case.
    fn set_path(&mut self, path: PathBuf);
}

/// A fuzzing target: something that consumes test-case bytes and exposes a
/// feedback channel plus liveness/damage flags for the health probe.
pub trait Target: Send {
    fn name(&self) -> &'static str;

    /// Hands one test case to the target.
    fn deliver(&mut self, data: &[u8]) -> Result<(), TargetError>;

    /// Raw bytes captured from the target's feedback channel since the last
    /// delivery. An unreadable channel yields an empty payload; it is never
    /// an error at this boundary.
    fn get_feedback(&mut self) -> Vec<u8>;

    fn is_alive(&mut self) -> bool;

    fn is_damaged(&mut self) -> bool;

    /// Tears the target down (kills a running process, drops staged files).
    /// The transport layer brings it back up before the next cycle.
    fn stop(&mut self);

    /// Returns the process-control capability if this target is
    /// process-based, `None` otherwise.
    fn as_process(&mut self) -> Option<&mut dyn ProcessControl> {
        None
    }
}

/// A local image-viewer process fed through a temp file.
///
/// Each delivery writes the test case to a fresh temp file (with the
/// configured extension, so the viewer picks the right decoder) and launches
/// the viewer on it with stderr piped. Whatever the viewer writes to stderr
/// becomes the feedback payload; a non-zero or signaled exit marks the target
/// as not alive.
pub struct LocalViewerTarget {
    path: PathBuf,
    tmpfile_ext: String,
    child: Option<Child>,
    staged: Option<NamedTempFile>,
    stderr_buf: Vec<u8>,
    exited_clean: Option<bool>,
}

impl LocalViewerTarget {
    pub fn new(path: impl Into<PathBuf>, tmpfile_ext: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tmpfile_ext: tmpfile_ext.into(),
            child: None,
            staged: None,
            stderr_buf: Vec::new(),
            exited_clean: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reaps the child if it has exited, draining its stderr into the
    /// feedback buffer. Non-blocking.
    fn reap(&mut self) {
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    self.exited_clean = Some(status.success());
                    if let Some(mut stderr) = child.stderr.take() {
                        let _ = stderr.read_to_end(&mut self.stderr_buf);
                    }
                    self.child = None;
                }
                Ok(None) => {}
                Err(_) => {
                    self.exited_clean = Some(false);
                    self.child = None;
                }
            }
        }
    }
}

impl Target for LocalViewerTarget {
    fn name(&self) -> &'static str {
        "LocalViewerTarget"
    }

    fn deliver(&mut self, data: &[u8]) -> Result<(), TargetError> {
        self.stop();
        self.stderr_buf.clear();
        self.exited_clean = None;

        let mut staged = tempfile::Builder::new()
            .suffix(&self.tmpfile_ext)
            .tempfile()
            .map_err(|e| TargetError::Staging(e.to_string()))?;
        staged
            .write_all(data)
            .map_err(|e| TargetError::Staging(e.to_string()))?;

        let child = Command::new(&self.path)
            .arg(staged.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TargetError::Launch(self.path.clone(), e.to_string()))?;

        debug!(viewer = ?self.path, staged = ?staged.path(), "launched viewer on test case");
        self.staged = Some(staged);
        self.child = Some(child);
        Ok(())
    }

    fn get_feedback(&mut self) -> Vec<u8> {
        self.reap();
        self.stderr_buf.clone()
    }

    fn is_alive(&mut self) -> bool {
        self.reap();
        // Still running, exited cleanly, or never launched: all count as alive.
        self.child.is_some() || self.exited_clean.unwrap_or(true)
    }

    fn is_damaged(&mut self) -> bool {
        self.reap();
        !self.stderr_buf.is_empty()
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.staged = None;
    }

    fn as_process(&mut self) -> Option<&mut dyn ProcessControl> {
        Some(self)
    }
}

impl ProcessControl for LocalViewerTarget {
    fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }
}

/// A network printer consuming print jobs.
///
/// Only the addressing and per-run job accounting live here; actual spooler
/// interaction belongs to the transport layer. A printer exposes no health
/// signal, so it always reports alive and undamaged with an empty feedback
/// channel.
#[derive(Debug, Clone)]
pub struct PrinterTarget {
    ip: String,
    printer_name: Option<String>,
    tmpfile_ext: String,
    jobs_sent: usize,
}

impl PrinterTarget {
    pub fn new(ip: impl Into<String>, tmpfile_ext: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            printer_name: None,
            tmpfile_ext: tmpfile_ext.into(),
            jobs_sent: 0,
        }
    }

    pub fn with_printer_name(mut self, name: impl Into<String>) -> Self {
        self.printer_name = Some(name.into());
        self
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn printer_name(&self) -> Option<&str> {
        self.printer_name.as_deref()
    }

    pub fn jobs_sent(&self) -> usize {
        self.jobs_sent
    }
}

impl Target for PrinterTarget {
    fn name(&self) -> &'static str {
        "PrinterTarget"
    }

    fn deliver(&mut self, data: &[u8]) -> Result<(), TargetError> {
        self.jobs_sent += 1;
        debug!(
            ip = %self.ip,
            queue = self.printer_name.as_deref().unwrap_or("<default>"),
            ext = %self.tmpfile_ext,
            bytes = data.len(),
            job = self.jobs_sent,
            "queueing print job"
        );
        Ok(())
    }

    fn get_feedback(&mut self) -> Vec<u8> {
        Vec::new()
    }

    fn is_alive(&mut self) -> bool {
        true
    }

    fn is_damaged(&mut self) -> bool {
        false
    }

    fn stop(&mut self) {}
}
