//! A tiny pipeline shell.
//!
//! Each input line is split into words, scanned for the `<`, `>`, `|`, `&` and `q`
//! operators, and turned into a chain of external processes whose standard streams
//! are wired to files, pipes or the terminal. The interesting part lives in
//! [`pipeline`], which launches stages one by one as soon as each of them is fully
//! known and decides whether to wait for the last one.
//!
//! The main entry point is [`Interpreter`], which runs the read-evaluate loop on top
//! of any [`LineSource`]. The public modules expose the scanner, the data model and
//! the coordinator so they can be driven without a terminal.

pub mod command;
pub mod config;
pub mod env;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod redirect;

/// Just a convenient re-export of the interactive loop and its input abstraction.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::{Interpreter, LineEditor, LineSource, ScriptedLines};
