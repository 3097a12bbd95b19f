//! Command-line configuration.

use crate::command::ExitCode;
use argh::FromArgs;
use log::LevelFilter;
use std::path::PathBuf;

/// Token bound used when none is given on the command line.
pub const DEFAULT_MAX_TOKENS: usize = 51;

#[derive(FromArgs, Debug)]
/// A small interactive shell with redirections, pipes and background pipelines.
pub struct Args {
    #[argh(option, default = "String::from(\">>> \")")]
    /// text printed before every line is read.
    pub prompt: String,

    #[argh(option, default = "DEFAULT_MAX_TOKENS")]
    /// maximum number of words per line; extra words are dropped with a warning. 0 disables the bound.
    pub max_tokens: usize,

    #[argh(option, default = "127")]
    /// status recorded when a program cannot be found.
    pub not_found_status: ExitCode,

    #[argh(option, default = "126")]
    /// status recorded when a program exists but cannot be started.
    pub exec_failure_status: ExitCode,

    #[argh(switch)]
    /// do not print the startup banner.
    pub no_banner: bool,

    #[argh(option, default = "LevelFilter::Off", from_str_fn(parse_level))]
    /// log verbosity: off, error, warn, info, debug or trace.
    pub log_level: LevelFilter,

    #[argh(option)]
    /// write the log to this file instead of standard error.
    pub log_file: Option<PathBuf>,
}

fn parse_level(value: &str) -> Result<LevelFilter, String> {
    value
        .parse()
        .map_err(|_| format!("unknown log level `{value}`"))
}

/// Settings the interpreter runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    /// 0 means unbounded.
    pub max_tokens: usize,
    pub not_found_status: ExitCode,
    pub exec_failure_status: ExitCode,
    pub banner: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: ">>> ".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            not_found_status: 127,
            exec_failure_status: 126,
            banner: true,
        }
    }
}

impl From<&Args> for ShellConfig {
    fn from(args: &Args) -> Self {
        Self {
            prompt: args.prompt.clone(),
            max_tokens: args.max_tokens,
            not_found_status: args.not_found_status,
            exec_failure_status: args.exec_failure_status,
            banner: !args.no_banner,
        }
    }
}
