//! The pipeline coordinator.
//!
//! Stages are launched strictly left to right. A stage closed by `|` is started
//! as soon as the scanner hands it over, before the rest of the line is looked at;
//! only the rightmost stage of a foreground pipeline is waited for. Everything
//! else that was started is kept aside and reaped later, so finished children do
//! not linger as zombies.

use crate::command::ExitCode;
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::external::{self, LaunchError};
use crate::parser::{Pipeline, Scanner, Stage, Step};
use crate::redirect::{self, Pipes, RedirectError};
use log::{debug, info, trace, warn};
use std::fmt::Display;
use std::io::{self, Write};
use std::process::Child;

/// Status of a line rejected by the scanner.
pub const SYNTAX_ERROR_STATUS: ExitCode = 2;

/// Status of a stage whose redirection could not be opened.
pub const REDIRECT_ERROR_STATUS: ExitCode = 1;

/// What became of one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The line is done: the last stage exited, or the line failed with this status.
    Finished(ExitCode),
    /// The last stage runs in the background under this pid.
    Detached(u32),
    /// The quit word was read.
    Quit,
}

/// Reasons a single stage was not started.
#[derive(Debug)]
enum StageError {
    Redirect(RedirectError),
    Launch(LaunchError),
}

/// Launches the stages of each line and decides whether to wait for them.
pub struct Coordinator {
    config: ShellConfig,
    env: Environment,
    /// Children nobody waits for: background last stages and every upstream stage.
    detached: Vec<Child>,
    diagnostics: Box<dyn Write>,
}

impl Coordinator {
    /// Create a coordinator that reports to standard error.
    pub fn new(config: ShellConfig, env: Environment) -> Self {
        Self {
            config,
            env,
            detached: Vec::new(),
            diagnostics: Box::new(io::stderr()),
        }
    }

    /// Send diagnostics somewhere else than standard error.
    pub fn with_diagnostics(mut self, diagnostics: Box<dyn Write>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Print one diagnostic line.
    pub fn report(&mut self, message: &dyn Display) {
        let _ = writeln!(self.diagnostics, "{message}");
        let _ = self.diagnostics.flush();
    }

    /// Scan `tokens` and run them, launching each stage as soon as it is known.
    ///
    /// A syntax error stops the line where it is found. Stages to its left have
    /// already been started by then; they are left to finish on their own.
    pub fn run_line(&mut self, tokens: &[String]) -> Completion {
        let mut scanner = Scanner::new(tokens);
        let mut pipes = Pipes::new();
        loop {
            match scanner.next_step() {
                Ok(Some(Step::Piped(stage))) => self.launch_upstream(&stage, &mut pipes),
                Ok(Some(Step::Last { stage, background })) => {
                    return self.launch_last(&stage, background, &mut pipes);
                }
                Ok(Some(Step::Quit)) => return Completion::Quit,
                Ok(None) => return Completion::Finished(0),
                Err(err) => {
                    self.report(&err);
                    return Completion::Finished(SYNTAX_ERROR_STATUS);
                }
            }
        }
    }

    /// Run an already scanned pipeline.
    pub fn run(&mut self, pipeline: &Pipeline) -> Completion {
        let mut pipes = Pipes::new();
        let Some((last, upstream)) = pipeline.stages.split_last() else {
            return Completion::Finished(0);
        };
        for stage in upstream {
            self.launch_upstream(stage, &mut pipes);
        }
        self.launch_last(last, pipeline.background, &mut pipes)
    }

    /// Collect the exit status of detached children that have finished.
    ///
    /// Never blocks. Returns how many children were collected.
    pub fn reap(&mut self) -> usize {
        let before = self.detached.len();
        self.detached.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!("reaped pid {} ({})", child.id(), status);
                false
            }
            Ok(None) => true,
            Err(err) => {
                warn!("can't poll pid {}: {}", child.id(), err);
                false
            }
        });
        before - self.detached.len()
    }

    /// Number of started children not yet reaped.
    pub fn detached(&self) -> usize {
        self.detached.len()
    }

    fn launch_upstream(&mut self, stage: &Stage, pipes: &mut Pipes) {
        // A failed upstream stage drops its pipe ends, so its neighbours see end
        // of stream instead of hanging.
        if let Ok(child) = self.launch(stage, pipes) {
            trace!("write end closed in parent after pid {}", child.id());
            self.detached.push(child);
        }
    }

    fn launch_last(&mut self, stage: &Stage, background: bool, pipes: &mut Pipes) -> Completion {
        let mut child = match self.launch(stage, pipes) {
            Ok(child) => child,
            Err(status) => return Completion::Finished(status),
        };
        pipes.close_all();

        if background {
            let pid = child.id();
            info!("pid {pid} runs in the background");
            self.detached.push(child);
            return Completion::Detached(pid);
        }

        match child.wait() {
            Ok(status) => {
                debug!("pid {} exited ({})", child.id(), status);
                Completion::Finished(external::status_code(status))
            }
            Err(err) => {
                self.report(&format_args!("Cannot wait for {}: {}", stage.program(), err));
                Completion::Finished(self.config.exec_failure_status)
            }
        }
    }

    /// Resolve both bindings of `stage` and start it.
    ///
    /// On failure the problem is reported and the status to record is returned.
    fn launch(&mut self, stage: &Stage, pipes: &mut Pipes) -> Result<Child, ExitCode> {
        match self.try_launch(stage, pipes) {
            Ok(child) => Ok(child),
            Err(StageError::Redirect(err)) => {
                self.report(&err);
                Err(REDIRECT_ERROR_STATUS)
            }
            Err(StageError::Launch(err)) => {
                self.report(&err);
                Err(err.status(&self.config))
            }
        }
    }

    fn try_launch(&self, stage: &Stage, pipes: &mut Pipes) -> Result<Child, StageError> {
        let stdin = redirect::resolve_input(&stage.input, pipes).map_err(StageError::Redirect)?;
        let stdout = redirect::resolve_output(&stage.output, pipes).map_err(StageError::Redirect)?;
        external::spawn(stage, stdin, stdout, &self.env).map_err(StageError::Launch)
    }
}
