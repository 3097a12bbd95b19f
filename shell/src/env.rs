use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsString;
use std::path::PathBuf;

/// Searched for programs when `PATH` is not set at all.
pub const DEFAULT_PATH: &str = "/bin:/usr/bin";

/// The part of the process environment handed to every launched stage.
///
/// The environment contains:
/// - `vars`: variables that will be visible to executed programs.
/// - `current_dir`: the working directory programs start in.
///
/// Nothing here changes while the interpreter runs; it is captured once at startup.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The working directory for launched programs.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of a variable as the launched programs will see it.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The directories searched for programs named without a path separator.
    ///
    /// An unset `PATH` means [`DEFAULT_PATH`]; a `PATH` set to the empty string
    /// is kept as it is.
    pub fn search_path(&self) -> OsString {
        OsString::from(self.get_var("PATH").unwrap_or(DEFAULT_PATH))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::{DEFAULT_PATH, Environment};
    use std::collections::HashMap;
    use std::env as stdenv;

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        };

        // initially absent
        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE"));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert!(env.get_var("PATH").is_some());
    }

    #[test]
    fn test_search_path_follows_overrides() {
        let mut env = Environment::new();
        env.set_var("PATH", "/opt/one:/opt/two");
        assert_eq!(env.search_path(), "/opt/one:/opt/two");
    }

    #[test]
    fn test_search_path_defaults_when_path_is_unset() {
        let env = Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        };
        assert_eq!(env.search_path(), DEFAULT_PATH);
    }
}
