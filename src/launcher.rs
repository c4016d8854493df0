use crate::command::{CommandSegment, ExecutionContext, ExitCode, StageIo};
use crate::error::ShellError;
use crate::jobs::JobId;
use crate::session::Session;
use std::io::{self, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Command, ExitStatus};

/// What a successful launch produced, per execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launched {
    /// Foreground command ran to completion.
    Exited(ExitCode),
    /// Background command is now tracked as a job.
    Job { id: JobId, pid: u32 },
    /// Pipeline stage is now tracked until the pipeline drains.
    Stage { pid: u32 },
}

impl Launched {
    /// Status the launch contributes to the line; only foreground commands have one.
    pub fn exit_code(self) -> ExitCode {
        match self {
            Launched::Exited(code) => code,
            Launched::Job { .. } | Launched::Stage { .. } => 0,
        }
    }
}

/// Spawn one external command.
///
/// `segment[0]` is resolved through the session's [`PathResolver`]; a miss is a
/// [`ShellError::CommandNotFound`] and nothing is spawned. The child runs in the
/// session's working directory with the session's variables and the given
/// stdin/stdout. Background jobs are reported on `out` as `[id] pid`.
///
/// A failed spawn never touches the job table or stage registry.
///
/// [`PathResolver`]: crate::path::PathResolver
pub fn launch(
    segment: &CommandSegment,
    context: ExecutionContext,
    io: StageIo,
    session: &mut Session,
    out: &mut dyn Write,
) -> Result<Launched, ShellError> {
    let program = session
        .paths
        .resolve(segment.name(), &session.current_dir)
        .ok_or_else(|| ShellError::CommandNotFound(segment.name().to_string()))?;

    // Anything we printed must reach the terminal before the child does.
    out.flush()?;
    io::stdout().flush()?;

    let (stdin, stdout) = io.into_stdio();
    let mut child = {
        let mut command = Command::new(&program);
        command
            .arg0(segment.name())
            .args(segment.args())
            .envs(session.vars.iter())
            .current_dir(&session.current_dir)
            .stdin(stdin)
            .stdout(stdout);
        if context == ExecutionContext::Background {
            // Keep terminal interrupts away from background jobs.
            command.process_group(0);
        }
        // The command owns the parent's copies of any pipe ends; they close when it
        // goes out of scope here.
        command.spawn().map_err(|source| ShellError::Spawn {
            name: segment.name().to_string(),
            source,
        })?
    };
    let pid = child.id();
    log::debug!("spawned {} as pid {pid} ({context:?})", program.display());

    match context {
        ExecutionContext::Foreground => {
            let status = child.wait()?;
            log::debug!("pid {pid} exited: {status}");
            Ok(Launched::Exited(exit_code(status)))
        }
        ExecutionContext::Background => {
            let id = session.jobs.insert(child, segment.display_name()).id();
            writeln!(out, "[{id}] {pid}")?;
            Ok(Launched::Job { id, pid })
        }
        ExecutionContext::PipelineStage => {
            session.stages.push(child);
            Ok(Launched::Stage { pid })
        }
    }
}

/// Shell-style status: the exit code, or 128 + signal for a killed process.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    if let Some(code) = status.code() {
        code
    } else if let Some(signal) = status.signal() {
        128 + signal
    } else if status.core_dumped() {
        255
    } else {
        -1
    }
}
