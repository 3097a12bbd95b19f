//! The descriptor resolver: turns [`IOBinding`]s into handles a child can use.

use crate::command::{InheritedStdin, InheritedStdout, Stdin, Stdout};
use crate::io_adapters::ClosedInput;
use crate::parser::{FileMode, IOBinding, PipeId};
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, PipeReader, PipeWriter};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Permissions of files created by output redirection, before the umask.
pub const CREATE_MODE: u32 = 0o644;

/// Read ends of the pipes created so far on the current line, waiting for their
/// consuming stage.
///
/// The write end of each pipe is handed straight to the producing stage and never
/// stored here, so it is closed in the interpreter as soon as that stage is spawned.
#[derive(Debug, Default)]
pub struct Pipes {
    readers: HashMap<PipeId, PipeReader>,
}

impl Pipes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the OS pipe behind `id`, keep its read end and return its write end.
    pub fn open(&mut self, id: PipeId) -> io::Result<PipeWriter> {
        let (reader, writer) = io::pipe()?;
        debug!("opened pipe {}", id.0);
        self.readers.insert(id, reader);
        Ok(writer)
    }

    /// Hand out the read end of `id`, if that pipe was ever created.
    pub fn take_reader(&mut self, id: PipeId) -> Option<PipeReader> {
        self.readers.remove(&id)
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.readers.len()
    }

    /// Drop every remaining read end, e.g. when a line is abandoned.
    pub fn close_all(&mut self) {
        for (id, _) in self.readers.drain() {
            trace!("dropped unread pipe {}", id.0);
        }
    }
}

/// A redirection that could not be set up.
#[derive(Debug)]
pub enum RedirectError {
    Open { path: PathBuf, source: io::Error },
    Pipe(io::Error),
}

impl fmt::Display for RedirectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectError::Open { path, source } => {
                write!(f, "Cannot open {}: {}", path.display(), source)
            }
            RedirectError::Pipe(source) => write!(f, "Cannot create pipe: {}", source),
        }
    }
}

impl std::error::Error for RedirectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RedirectError::Open { source, .. } | RedirectError::Pipe(source) => Some(source),
        }
    }
}

/// Open `path` the way a redirection with `mode` requires.
///
/// Reading never creates the file. Writing creates it with [`CREATE_MODE`] and
/// truncates whatever was there.
pub fn open_file(path: &Path, mode: FileMode) -> Result<File, RedirectError> {
    let mut options = OpenOptions::new();
    match mode {
        FileMode::Read => options.read(true),
        FileMode::WriteTruncate => options
            .write(true)
            .create(true)
            .truncate(true)
            .mode(CREATE_MODE),
    };
    options.open(path).map_err(|source| RedirectError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the standard input of a stage.
///
/// A pipe that was never created (its producer failed to launch) reads as empty.
pub fn resolve_input(binding: &IOBinding, pipes: &mut Pipes) -> Result<Box<dyn Stdin>, RedirectError> {
    let input: Box<dyn Stdin> = match binding {
        IOBinding::Inherited => Box::new(InheritedStdin(io::stdin())),
        IOBinding::File { path, mode } => Box::new(open_file(path, *mode)?),
        IOBinding::Pipe(id) => match pipes.take_reader(*id) {
            Some(reader) => Box::new(reader),
            None => {
                debug!("pipe {} has no producer, reading nothing", id.0);
                Box::new(ClosedInput)
            }
        },
    };
    Ok(input)
}

/// Resolve the standard output of a stage, creating its outgoing pipe if any.
pub fn resolve_output(binding: &IOBinding, pipes: &mut Pipes) -> Result<Box<dyn Stdout>, RedirectError> {
    let output: Box<dyn Stdout> = match binding {
        IOBinding::Inherited => Box::new(InheritedStdout(io::stdout())),
        IOBinding::File { path, mode } => Box::new(open_file(path, *mode)?),
        IOBinding::Pipe(id) => Box::new(pipes.open(*id).map_err(RedirectError::Pipe)?),
    };
    Ok(output)
}
