//! The operator scanner.
//!
//! Walks the words of one line left to right and cuts them into [`Stage`]s at
//! every `|`. The scanner can be driven one stage at a time through
//! [`Scanner::next_step`], which is what the coordinator does so that a stage is
//! launched as soon as its `|` is seen, or all at once through [`scan`].

use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Anything outside letters, digits and `- . / _`.
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9./_-]").expect("character class is valid"));

/// Identifies one pipe between two adjacent stages of the same line.
///
/// Ids are handed out in order, starting at 0 for the leftmost `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipeId(pub usize);

/// How a redirection file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Read only; the file must exist.
    Read,
    /// Write only, created with `rw-r--r--` when absent, truncated when present.
    WriteTruncate,
}

/// Where one standard stream of a stage comes from or goes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IOBinding {
    /// Whatever the interpreter itself has.
    #[default]
    Inherited,
    /// A named file.
    File { path: PathBuf, mode: FileMode },
    /// One end of a pipe shared with the neighbouring stage.
    Pipe(PipeId),
}

/// One program invocation within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Program name followed by its arguments, never empty.
    pub argv: Vec<String>,
    pub input: IOBinding,
    pub output: IOBinding,
}

impl Stage {
    /// The program name as typed.
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }
}

/// All stages of one line, in data-flow order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
    pub background: bool,
}

/// Result of scanning a whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// The line had no words.
    Empty,
    /// The quit word was reached.
    Quit,
    Pipeline(Pipeline),
}

/// One step of incremental scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A stage closed by `|`; at least one more stage follows.
    Piped(Stage),
    /// The rightmost stage of the line.
    Last { stage: Stage, background: bool },
    /// The quit word was reached.
    Quit,
}

/// Malformed operator usage or an invalid word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// `>` or `<` was the last word of the line.
    MissingRedirectTarget(char),
    /// Some word follows `&`.
    TrailingAfterBackground,
    /// A word contains a character outside the allowed set.
    DisallowedCharacter(char),
    /// A stage has no program name, e.g. a line made of `|` alone.
    MissingCommand,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::MissingRedirectTarget(op) => {
                write!(f, "Syntax error: missing redirect target after {op}")
            }
            SyntaxError::TrailingAfterBackground => {
                write!(f, "Syntax error: no characters allowed after &")
            }
            SyntaxError::DisallowedCharacter(c) => write!(f, "{c} is not an allowed character"),
            SyntaxError::MissingCommand => write!(f, "Syntax error: missing command"),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Incremental scanner over the words of one line.
pub struct Scanner<'a> {
    tokens: &'a [String],
    pos: usize,
    next_pipe: usize,
    /// Input binding of the stage that starts at `pos`.
    carried_input: IOBinding,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(tokens: &'a [String]) -> Self {
        Scanner {
            tokens,
            pos: 0,
            next_pipe: 0,
            carried_input: IOBinding::Inherited,
            done: false,
        }
    }

    /// Scan up to the end of the next stage.
    ///
    /// Returns `Ok(None)` once the line is exhausted, and for a line without words.
    /// After an error or [`Step::Quit`] the scanner stays exhausted.
    pub fn next_step(&mut self) -> Result<Option<Step>, SyntaxError> {
        if self.done {
            return Ok(None);
        }
        if self.tokens.is_empty() {
            self.done = true;
            return Ok(None);
        }
        let step = self.scan_stage();
        if !matches!(step, Ok(Step::Piped(_))) {
            self.done = true;
        }
        step.map(Some)
    }

    fn scan_stage(&mut self) -> Result<Step, SyntaxError> {
        let mut argv = Vec::new();
        let mut input = std::mem::take(&mut self.carried_input);
        let mut output = IOBinding::Inherited;
        let mut background = false;

        while let Some(token) = self.consume() {
            match token {
                "q" => return Ok(Step::Quit),
                ">" => {
                    let path = self.redirect_target('>')?;
                    output = IOBinding::File {
                        path,
                        mode: FileMode::WriteTruncate,
                    };
                }
                "<" => {
                    let path = self.redirect_target('<')?;
                    input = IOBinding::File {
                        path,
                        mode: FileMode::Read,
                    };
                }
                "|" => {
                    if argv.is_empty() {
                        return Err(SyntaxError::MissingCommand);
                    }
                    let pipe = PipeId(self.next_pipe);
                    self.next_pipe += 1;
                    self.carried_input = IOBinding::Pipe(pipe);
                    return Ok(Step::Piped(Stage {
                        argv,
                        input,
                        output: IOBinding::Pipe(pipe),
                    }));
                }
                "&" => {
                    if self.pos < self.tokens.len() {
                        return Err(SyntaxError::TrailingAfterBackground);
                    }
                    background = true;
                }
                word => {
                    check_allowed(word)?;
                    argv.push(word.to_string());
                }
            }
        }

        if argv.is_empty() {
            return Err(SyntaxError::MissingCommand);
        }
        Ok(Step::Last {
            stage: Stage {
                argv,
                input,
                output,
            },
            background,
        })
    }

    fn consume(&mut self) -> Option<&'a str> {
        let tokens = self.tokens;
        let token = tokens.get(self.pos)?;
        self.pos += 1;
        Some(token.as_str())
    }

    fn redirect_target(&mut self, op: char) -> Result<PathBuf, SyntaxError> {
        let target = self
            .consume()
            .ok_or(SyntaxError::MissingRedirectTarget(op))?;
        check_allowed(target)?;
        Ok(PathBuf::from(target))
    }
}

/// Fail on the first character outside letters, digits and `- . / _`.
pub fn check_allowed(word: &str) -> Result<(), SyntaxError> {
    match DISALLOWED.find(word) {
        Some(m) => {
            let c = m.as_str().chars().next().unwrap_or_default();
            Err(SyntaxError::DisallowedCharacter(c))
        }
        None => Ok(()),
    }
}

/// Scan a whole line at once.
pub fn scan(tokens: &[String]) -> Result<Scan, SyntaxError> {
    let mut scanner = Scanner::new(tokens);
    let mut stages = Vec::new();
    while let Some(step) = scanner.next_step()? {
        match step {
            Step::Piped(stage) => stages.push(stage),
            Step::Last { stage, background } => {
                stages.push(stage);
                return Ok(Scan::Pipeline(Pipeline { stages, background }));
            }
            Step::Quit => return Ok(Scan::Quit),
        }
    }
    Ok(Scan::Empty)
}
