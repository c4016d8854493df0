use std::path::PathBuf;
use thiserror::Error;

/// Errors reported to the user while executing a line.
///
/// None of these abort the interpreter. Each is printed where it occurs and the
/// rest of the line keeps running; the `Display` text is the exact message the user
/// sees.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The command name is neither a builtin nor found on `PATH`.
    #[error("{0}: Command not found")]
    CommandNotFound(String),

    /// The target of `<` does not exist.
    #[error("Wsh: {}: No such file or directory", .0.display())]
    NoSuchFile(PathBuf),

    /// The target of `>` could not be created or truncated.
    #[error("Wsh: {}: {source}", path.display())]
    Redirect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to create the child process.
    #[error("wsh: {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A pipe between two stages could not be created.
    #[error("wsh: pipe: {0}")]
    Pipe(#[from] nix::Error),

    /// `cd` target missing or not a directory.
    #[error("cd: {0}: No such file or directory.")]
    NoSuchDirectory(String),

    /// `kill` named a job id that is not in the job table.
    #[error("No such process")]
    NoSuchJob,

    /// Writing a report or waiting on a child failed.
    #[error("wsh: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Exit status a failed segment contributes to the line.
    pub fn exit_code(&self) -> crate::command::ExitCode {
        match self {
            ShellError::CommandNotFound(_) => 127,
            ShellError::Spawn { .. } => 126,
            _ => 1,
        }
    }
}
