//! Process pool for compile batches.
//!
//! Jobs are spawned without blocking and joined by [`ProcessPool::wait_all`].
//! Every job runs to completion even after a sibling failed, so one run shows
//! all diagnostics of the batch and no child outlives the pool.

use super::command::ToolCommand;
use super::error::BuildError;
use colored::*;
use indicatif::ProgressBar;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
}

/// A running compile and the file it writes.
#[derive(Debug)]
pub struct Job {
    child: Option<Child>,
    output: PathBuf,
    source: PathBuf,
    state: JobState,
}

impl Job {
    /// Start `command` in the background. `source` only labels diagnostics.
    pub fn spawn(command: &ToolCommand, source: &Path, output: &Path) -> Result<Job, BuildError> {
        let child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| BuildError::Spawn {
                program: command.program().display().to_string(),
                source,
            })?;

        Ok(Job {
            child: Some(child),
            output: output.to_path_buf(),
            source: source.to_path_buf(),
            state: JobState::Running,
        })
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Block until the process exits. Terminal states never change.
    fn wait(&mut self, pb: &ProgressBar, diagnostics: &mut dyn Write) -> JobState {
        let Some(child) = self.child.take() else {
            return self.state;
        };

        self.state = match child.wait_with_output() {
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                if out.status.success() {
                    if !stderr.trim().is_empty() {
                        report(
                            pb,
                            diagnostics,
                            format!("{} Warning in {}:\n{}", "!".yellow(), self.source.display(), stderr),
                        );
                    }
                    JobState::Succeeded
                } else {
                    report(
                        pb,
                        diagnostics,
                        format!(
                            "{} Error compiling {}:\n{}{}",
                            "x".red(),
                            self.source.display(),
                            String::from_utf8_lossy(&out.stdout),
                            stderr
                        ),
                    );
                    JobState::Failed
                }
            }
            Err(e) => {
                report(
                    pb,
                    diagnostics,
                    format!(
                        "{} Lost track of compiler for {}: {}",
                        "x".red(),
                        self.source.display(),
                        e
                    ),
                );
                JobState::Failed
            }
        };

        if self.state == JobState::Failed {
            self.discard_output();
        }
        pb.inc(1);
        self.state
    }

    /// Kill and reap without waiting for the compile to finish.
    fn abort(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            self.state = JobState::Failed;
            self.discard_output();
        }
    }

    // A failed job may leave a partial object behind that would look fresh.
    fn discard_output(&self) {
        if self.output.exists() {
            let _ = fs::remove_file(&self.output);
        }
    }
}

/// Compiler output goes out even when the bar is hidden (no TTY, `> log`),
/// and never interleaves with a bar that is drawing.
fn report(pb: &ProgressBar, diagnostics: &mut dyn Write, message: String) {
    pb.suspend(|| {
        let _ = writeln!(diagnostics, "{}", message.trim_end());
        let _ = diagnostics.flush();
    });
}

/// Jobs of one batch, in dispatch order.
pub struct ProcessPool {
    jobs: Vec<Job>,
    limit: Option<usize>,
    spawn_failed: bool,
    progress: ProgressBar,
    diagnostics: Box<dyn Write + Send>,
}

impl Default for ProcessPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessPool {
    /// No cap: every stale file of the batch compiles at once.
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            limit: None,
            spawn_failed: false,
            progress: ProgressBar::hidden(),
            diagnostics: Box::new(io::stderr()),
        }
    }

    /// At most `limit` jobs running at a time (a limit of 0 acts as 1).
    pub fn with_limit(limit: usize) -> Self {
        let mut pool = Self::new();
        pool.limit = Some(limit.max(1));
        pool
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Where compiler errors and warnings are written, stderr by default.
    pub fn with_diagnostics(mut self, diagnostics: impl Write + Send + 'static) -> Self {
        self.diagnostics = Box::new(diagnostics);
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn running(&self) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.state == JobState::Running)
            .count()
    }

    /// Dispatch a job. Returns false if it could not be started; the pool is
    /// then failed and ignores further spawns.
    pub fn spawn(&mut self, command: &ToolCommand, source: &Path, output: &Path) -> bool {
        if self.spawn_failed {
            return false;
        }

        if let Some(limit) = self.limit {
            while self.running() >= limit {
                let pb = self.progress.clone();
                if let Some(oldest) = self
                    .jobs
                    .iter_mut()
                    .find(|job| job.state == JobState::Running)
                {
                    oldest.wait(&pb, &mut *self.diagnostics);
                }
            }
        }

        match Job::spawn(command, source, output) {
            Ok(job) => {
                self.jobs.push(job);
                true
            }
            Err(e) => {
                report(&self.progress, &mut *self.diagnostics, format!("{} {}", "x".red(), e));
                self.spawn_failed = true;
                false
            }
        }
    }

    /// Barrier: true iff every job succeeded and nothing failed to spawn.
    pub fn wait_all(mut self) -> bool {
        if self.spawn_failed {
            for job in &mut self.jobs {
                job.abort();
            }
            self.progress.finish_and_clear();
            return false;
        }

        let pb = self.progress.clone();
        let mut ok = true;
        for job in &mut self.jobs {
            if job.wait(&pb, &mut *self.diagnostics) != JobState::Succeeded {
                ok = false;
            }
        }
        pb.finish_and_clear();
        ok
    }
}

impl Drop for ProcessPool {
    fn drop(&mut self) {
        for job in &mut self.jobs {
            job.abort();
        }
    }
}
