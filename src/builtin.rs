use crate::command::{CommandSegment, ExitCode};
use crate::error::ShellError;
use crate::jobs::JobId;
use crate::session::Session;
use anyhow::Result;
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    const KIND: BuiltinKind;

    /// Executes the command, writing to the segment's effective output.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

/// The closed set of builtins, resolved once per segment by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Cd,
    Exit,
    Help,
    Jobs,
    Kill,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 5] = [
        BuiltinKind::Cd,
        BuiltinKind::Exit,
        BuiltinKind::Help,
        BuiltinKind::Jobs,
        BuiltinKind::Kill,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Cd => "cd",
            BuiltinKind::Exit => "exit",
            BuiltinKind::Help => "help",
            BuiltinKind::Jobs => "jobs",
            BuiltinKind::Kill => "kill",
        }
    }

    /// Trailing words a builtin consumes; anything past this is ignored.
    fn max_args(self) -> usize {
        match self {
            BuiltinKind::Cd | BuiltinKind::Help | BuiltinKind::Kill => 1,
            BuiltinKind::Exit | BuiltinKind::Jobs => 0,
        }
    }

    fn usage(self) -> &'static str {
        match self {
            BuiltinKind::Cd => {
                "cd: cd [dir]\n\n\tChange the shell working directory to DIR.\n\
                 \tThe default DIR is the value of the HOME variable.\n"
            }
            BuiltinKind::Exit => {
                "exit: exit\n\n\tInterrupt every background job and exit the shell.\n"
            }
            BuiltinKind::Help => {
                "help: help [command]\n\n\tDisplay brief summaries of builtin commands.\n\
                 \tIf COMMAND is given, show detailed help for that builtin.\n"
            }
            BuiltinKind::Jobs => "jobs: jobs\n\n\tList the active background jobs.\n",
            BuiltinKind::Kill => {
                "kill: kill jobid\n\n\tSend an interrupt signal to the background job\n\
                 \tidentified by JOBID, as shown by `jobs`.\n"
            }
        }
    }

    /// Run this builtin for `segment`, writing to `stdout`.
    ///
    /// Argument errors and command failures are written to `stdout` and turned into
    /// a non-zero status; only a failure to write is returned as an error.
    pub fn run(
        self,
        segment: &CommandSegment,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        // Words such as `-1` or `-x` are operands, not flags; only a leading
        // `--help` reaches argh as an option.
        let args: Vec<&str> = match segment.args().first().map(String::as_str) {
            Some("--help") => vec!["--help"],
            _ => std::iter::once("--")
                .chain(
                    segment
                        .args()
                        .iter()
                        .take(self.max_args())
                        .map(String::as_str),
                )
                .collect(),
        };
        log::trace!("builtin {} {:?}", self.name(), args);
        let code = match self {
            BuiltinKind::Cd => run_parsed::<Cd>(&args, stdout, session),
            BuiltinKind::Exit => run_parsed::<Exit>(&args, stdout, session),
            BuiltinKind::Help => run_parsed::<Help>(&args, stdout, session),
            BuiltinKind::Jobs => run_parsed::<Jobs>(&args, stdout, session),
            BuiltinKind::Kill => run_parsed::<Kill>(&args, stdout, session),
        }?;
        stdout.flush()?;
        Ok(code)
    }
}

fn run_parsed<T: BuiltinCommand>(
    args: &[&str],
    stdout: &mut dyn Write,
    session: &mut Session,
) -> Result<ExitCode> {
    match T::from_args(&[T::KIND.name()], args) {
        Ok(cmd) => match cmd.execute(stdout, session) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{e}")?;
                Ok(1)
            }
        },
        Err(EarlyExit { output, status }) => {
            stdout.write_all(output.as_bytes())?;
            Ok(if status.is_err() { 1 } else { 0 })
        }
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    const KIND: BuiltinKind = BuiltinKind::Cd;

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let target = match self.target {
            Some(t) if !t.is_empty() => t,
            _ => match session.get_var("HOME") {
                Some(home) => home.to_string(),
                None => anyhow::bail!("cd: HOME not set"),
            },
        };

        let new_dir = fs::canonicalize(session.resolve_path(&target))
            .ok()
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| ShellError::NoSuchDirectory(target))?;
        log::debug!("cd {}", new_dir.display());
        session.current_dir = new_dir;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Interrupt every background job and exit the shell.
pub struct Exit {}

impl BuiltinCommand for Exit {
    const KIND: BuiltinKind = BuiltinKind::Exit;

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        session.shutdown();
        session.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Display information about builtin commands.
pub struct Help {
    #[argh(positional)]
    /// builtin to describe; lists every builtin when omitted.
    pub topic: Option<String>,
}

impl BuiltinCommand for Help {
    const KIND: BuiltinKind = BuiltinKind::Help;

    fn execute(self, stdout: &mut dyn Write, _session: &mut Session) -> Result<ExitCode> {
        let Some(topic) = self.topic else {
            writeln!(
                stdout,
                "These shell commands are defined internally.\n\
                 Type 'help name' to find out more about the builtin 'name'.\n"
            )?;
            for kind in BuiltinKind::ALL {
                writeln!(stdout, "\t-{}", kind.name())?;
            }
            return Ok(0);
        };

        match BuiltinKind::from_name(&topic) {
            Some(kind) => {
                stdout.write_all(kind.usage().as_bytes())?;
                Ok(0)
            }
            None => {
                writeln!(stdout, "help: no help topics match '{topic}'.")?;
                Ok(1)
            }
        }
    }
}

#[derive(FromArgs)]
/// List the active background jobs.
pub struct Jobs {}

impl BuiltinCommand for Jobs {
    const KIND: BuiltinKind = BuiltinKind::Jobs;

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        session.jobs.list(stdout)?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Send an interrupt signal to a background job.
pub struct Kill {
    #[argh(positional)]
    /// job id as shown by `jobs`.
    pub job: String,
}

impl BuiltinCommand for Kill {
    const KIND: BuiltinKind = BuiltinKind::Kill;

    fn execute(self, _stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let id: JobId = self.job.trim().parse().map_err(|_| ShellError::NoSuchJob)?;
        session.jobs.interrupt(id)?;
        log::debug!("sent SIGINT to job [{id}]");
        Ok(0)
    }
}
