use crate::jobs::{JobTable, StageRegistry};
use crate::path::PathResolver;
use crate::signal::SignalGateway;
use std::collections::HashMap;
use std::env as stdenv;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Everything one interpreter session mutates while running lines.
///
/// The session is passed by `&mut` into the router, coordinator, launcher and
/// builtins. Nothing here is global, so several sessions can live in one process;
/// only the delivery of SIGINT itself is process-wide (see [`SignalGateway`]).
#[derive(Debug)]
pub struct Session {
    /// Variables handed to every spawned command (e.g. PATH, HOME).
    pub vars: HashMap<String, String>,
    /// Working directory for spawned commands, redirection paths and `cd`.
    pub current_dir: PathBuf,
    pub paths: PathResolver,
    pub jobs: JobTable,
    pub stages: StageRegistry,
    pub signals: SignalGateway,
    /// Set by `exit`; the read loop stops once the current line is abandoned.
    pub should_exit: bool,
}

impl Session {
    /// Capture the current process environment and working directory.
    ///
    /// `PATH` is scanned here, once.
    pub fn new(signals: SignalGateway) -> Self {
        let vars: HashMap<String, String> = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::with_vars(vars, current_dir, signals)
    }

    /// Build a session from explicit variables, e.g. for tests.
    pub fn with_vars(
        vars: HashMap<String, String>,
        current_dir: PathBuf,
        signals: SignalGateway,
    ) -> Self {
        let paths = vars
            .get("PATH")
            .map(|p| PathResolver::scan(OsStr::new(p)))
            .unwrap_or_default();
        Self {
            vars,
            current_dir,
            paths,
            jobs: JobTable::new(),
            stages: StageRegistry::new(),
            signals,
            should_exit: false,
        }
    }

    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Resolve a user-supplied path against the session's working directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.current_dir.join(path)
    }

    /// Interrupt every remaining job before the interpreter goes away.
    pub fn shutdown(&mut self) {
        if !self.jobs.is_empty() {
            log::debug!("interrupting {} remaining jobs", self.jobs.len());
        }
        self.jobs.interrupt_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_var() {
        let mut session = Session::with_vars(
            HashMap::new(),
            PathBuf::from("/"),
            SignalGateway::detached(),
        );
        assert_eq!(session.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        session.set_var("KEY", "VALUE");
        assert_eq!(session.get_var("KEY"), Some("VALUE"));
    }

    #[test]
    fn test_reads_from_process_env_and_scans_path() {
        let session = Session::new(SignalGateway::detached());
        assert!(session.get_var("PATH").is_some());
        assert!(session.paths.resolve("sh", &session.current_dir).is_some());
    }

    #[test]
    fn test_without_path_nothing_resolves_by_name() {
        let session = Session::with_vars(
            HashMap::new(),
            PathBuf::from("/"),
            SignalGateway::detached(),
        );
        assert!(session.paths.is_empty());
    }

    #[test]
    fn test_relative_paths_join_the_session_dir() {
        let session = Session::with_vars(
            HashMap::new(),
            PathBuf::from("/tmp"),
            SignalGateway::detached(),
        );
        assert_eq!(session.resolve_path("f.txt"), PathBuf::from("/tmp/f.txt"));
        assert_eq!(session.resolve_path("/etc/hosts"), PathBuf::from("/etc/hosts"));
    }
}
