use crate::command::ExitCode;
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::lexer;
use crate::pipeline::{Completion, Coordinator};
use anyhow::{Context, Result};
use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;

/// Where the interpreter gets its lines from.
pub trait LineSource {
    /// Show `prompt` and read one line, without its line terminator.
    ///
    /// Returns `Ok(None)` once there is no more input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive line editor with history.
pub struct LineEditor {
    editor: DefaultEditor,
}

impl LineEditor {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("can't set up the line editor")?;
        Ok(Self { editor })
    }
}

impl LineSource for LineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(line.as_str())?;
                    }
                    return Ok(Some(line));
                }
                // Ctrl-C drops the line being typed.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(None),
                Err(err) => return Err(err).context("can't read input line"),
            }
        }
    }
}

/// A fixed list of lines, for driving the interpreter without a terminal.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
    /// How many prompts were shown.
    pub prompts: usize,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: 0,
        }
    }
}

impl LineSource for ScriptedLines {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.prompts += 1;
        Ok(self.lines.pop_front())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    Terminated,
}

/// The read-evaluate loop.
///
/// Nothing carries over from one line to the next except whether the quit word
/// was seen, and children still to be reaped.
///
/// Example
/// ```
/// use pipesh::{Interpreter, ScriptedLines};
/// use pipesh::config::ShellConfig;
/// let mut sh = Interpreter::new(ShellConfig::default());
/// sh.repl(&mut ScriptedLines::new(["true", "q", "false"])).unwrap();
/// assert!(sh.is_terminated());
/// assert_eq!(sh.last_status(), 0);
/// ```
pub struct Interpreter {
    coordinator: Coordinator,
    state: State,
    last_status: ExitCode,
}

impl Interpreter {
    /// Create an interpreter launching programs in the current process environment.
    pub fn new(config: ShellConfig) -> Self {
        Self::with_coordinator(Coordinator::new(config, Environment::new()))
    }

    pub fn with_coordinator(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            state: State::Running,
            last_status: 0,
        }
    }

    /// Read and run lines until the quit word or the end of input.
    pub fn repl(&mut self, source: &mut dyn LineSource) -> Result<()> {
        while self.state == State::Running {
            self.coordinator.reap();
            let prompt = self.coordinator.config().prompt.clone();
            match source.read_line(&prompt)? {
                Some(line) => {
                    self.eval(&line);
                }
                None => {
                    self.coordinator.report(&"Program terminated");
                    self.state = State::Terminated;
                }
            }
        }
        debug!("leaving with {} unreaped children", self.coordinator.detached());
        Ok(())
    }

    /// Run one line.
    pub fn eval(&mut self, line: &str) -> Completion {
        let limit = self.coordinator.config().max_tokens;
        let words = lexer::split_into_words(line, limit);
        if words.is_truncated() {
            self.coordinator
                .report(&format_args!("WARNING: line contains more than {limit} words!"));
        }

        let completion = self.coordinator.run_line(&words.tokens);
        match completion {
            Completion::Finished(status) => self.last_status = status,
            Completion::Detached(_) => self.last_status = 0,
            Completion::Quit => self.state = State::Terminated,
        }
        completion
    }

    pub fn is_terminated(&self) -> bool {
        self.state == State::Terminated
    }

    /// Status of the most recent line that ran to completion.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemWriter;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    fn interpreter(config: ShellConfig) -> (Interpreter, Rc<RefCell<Vec<u8>>>) {
        let (writer, handle) = MemWriter::with_handle();
        let coordinator =
            Coordinator::new(config, Environment::new()).with_diagnostics(Box::new(writer));
        (Interpreter::with_coordinator(coordinator), handle)
    }

    fn text(handle: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8(handle.borrow().clone()).unwrap()
    }

    #[test]
    fn test_quit_stops_reading() {
        let dir = tempfile::tempdir().unwrap();
        let before = dir.path().join("before.txt");
        let after = dir.path().join("after.txt");
        let (mut sh, _) = interpreter(ShellConfig::default());
        let mut lines = ScriptedLines::new([
            format!("echo one > {}", before.display()),
            "q".to_string(),
            format!("echo two > {}", after.display()),
        ]);

        sh.repl(&mut lines).unwrap();

        assert!(sh.is_terminated());
        assert_eq!(lines.prompts, 2);
        assert_eq!(fs::read_to_string(&before).unwrap(), "one\n");
        assert!(!after.exists());
    }

    #[test]
    fn test_end_of_input_terminates_with_message() {
        let (mut sh, diag) = interpreter(ShellConfig::default());
        sh.repl(&mut ScriptedLines::new(["true"])).unwrap();
        assert!(sh.is_terminated());
        assert_eq!(text(&diag), "Program terminated\n");
    }

    #[test]
    fn test_errors_return_to_prompt() {
        let (mut sh, diag) = interpreter(ShellConfig::default());
        let mut lines = ScriptedLines::new(["echo bad#", "|", "", "false"]);

        sh.repl(&mut lines).unwrap();

        assert_eq!(lines.prompts, 5);
        assert_eq!(sh.last_status(), 1);
        assert_eq!(
            text(&diag),
            "# is not an allowed character\nSyntax error: missing command\nProgram terminated\n"
        );
    }

    #[test]
    fn test_long_sessions_keep_constant_stack() {
        let (mut sh, _) = interpreter(ShellConfig::default());
        let mut lines = ScriptedLines::new(std::iter::repeat_n("bad#", 100_000));
        sh.repl(&mut lines).unwrap();
        assert_eq!(lines.prompts, 100_001);
    }

    #[test]
    fn test_too_many_words_warns_and_runs_truncated_line() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let config = ShellConfig {
            max_tokens: 4,
            ..ShellConfig::default()
        };
        let (mut sh, diag) = interpreter(config);

        let done = sh.eval(&format!("echo a > {} ignored words", out.display()));

        assert_eq!(done, Completion::Finished(0));
        assert_eq!(fs::read_to_string(&out).unwrap(), "a\n");
        assert_eq!(text(&diag), "WARNING: line contains more than 4 words!\n");
    }

    #[test]
    fn test_background_line_does_not_block() {
        let (mut sh, _) = interpreter(ShellConfig::default());
        let done = sh.eval("sleep 2 &");
        assert!(matches!(done, Completion::Detached(_)));
        assert_eq!(sh.last_status(), 0);
    }
}
