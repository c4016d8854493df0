//! Execution of composite statements: pipes, redirections and background jobs.
//!
//! The coordinator walks a statement's tokens left to right, accumulating words into
//! the current segment. Operators decide how and when that segment is launched and
//! which descriptors it receives:
//!
//! ```text
//! cat < in.txt | sort | uniq > out.txt &
//! ^^^ source=in.txt
//!              ^ stage, stdout=pipe#1 write end
//!                ^^^^ source=pipe#1 read end, stdout=pipe#2 write end
//!                       ^^^^ source=pipe#2 read end, dest=out.txt, background
//! ```
//!
//! Pending descriptors belong to the coordinator until the next launch takes them,
//! so the interpreter's own stdin/stdout are never touched.

use crate::command::{CommandSegment, ExecutionContext, ExitCode, StageIo};
use crate::error::ShellError;
use crate::lexer::{Operator, Token};
use crate::router::dispatch;
use crate::session::Session;
use anyhow::Result;
use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::iter::Peekable;
use std::os::fd::OwnedFd;
use std::os::unix::fs::OpenOptionsExt;
use std::slice::Iter;

/// Mode for files created by `>`: rw-r--r--.
const REDIRECT_FILE_MODE: u32 = 0o644;

pub struct PipelineCoordinator<'s, 'o> {
    session: &'s mut Session,
    out: &'o mut dyn Write,
    args: Vec<String>,
    source: Option<OwnedFd>,
    dest: Option<OwnedFd>,
    status: ExitCode,
}

impl<'s, 'o> PipelineCoordinator<'s, 'o> {
    pub fn new(session: &'s mut Session, out: &'o mut dyn Write) -> Self {
        Self {
            session,
            out,
            args: Vec::new(),
            source: None,
            dest: None,
            status: 0,
        }
    }

    /// Execute one composite statement and wait for all of its pipeline stages.
    ///
    /// Returns the status of the last segment dispatched. Background jobs are left
    /// running in the job table; pipeline stages are always reaped before this
    /// returns, whether the statement completed, was interrupted or failed.
    pub fn run(mut self, tokens: &[Token]) -> Result<ExitCode> {
        debug_assert!(self.session.stages.is_empty());
        let result = self.walk(tokens);
        self.finish();
        result.map(|()| self.status)
    }

    fn walk(&mut self, tokens: &[Token]) -> Result<()> {
        let mut tokens = tokens.iter().peekable();
        while let Some(token) = tokens.next() {
            if self.abandoned() {
                return Ok(());
            }
            match token {
                Token::Word(word) => self.args.push(word.clone()),
                Token::Operator(Operator::Comment) => break,
                Token::Operator(Operator::RedirectIn) => match target(&mut tokens) {
                    Some(path) => self.redirect_in(path)?,
                    None => log::warn!("`<` without a file name ignored"),
                },
                Token::Operator(Operator::RedirectOut) => match target(&mut tokens) {
                    Some(path) => self.redirect_out(path)?,
                    None => log::warn!("`>` without a file name ignored"),
                },
                Token::Operator(Operator::Pipe) => self.pipe()?,
                Token::Operator(Operator::Background) => {
                    self.launch(ExecutionContext::Background)?
                }
                // The router hands over one statement at a time; a terminator
                // reaching here ends the statement like the end of input does.
                Token::Operator(Operator::Semicolon | Operator::Newline) => break,
            }
        }
        if !self.abandoned() {
            self.launch(ExecutionContext::Foreground)?;
        }
        Ok(())
    }

    fn abandoned(&self) -> bool {
        if self.session.signals.is_interrupted() {
            log::debug!("interrupted; abandoning the rest of the statement");
            return true;
        }
        self.session.should_exit
    }

    /// Launch the accumulated segment, handing it the pending descriptors.
    fn launch(&mut self, context: ExecutionContext) -> Result<()> {
        let Some(segment) = CommandSegment::new(std::mem::take(&mut self.args)) else {
            return Ok(());
        };
        let io = StageIo::new(self.source.take(), self.dest.take());
        self.status = dispatch(&segment, context, io, self.session, self.out)?;
        Ok(())
    }

    /// Launch the accumulated segment as a pipeline stage writing into a new pipe,
    /// whose read end becomes the source of the next segment.
    fn pipe(&mut self) -> Result<()> {
        let Some(segment) = CommandSegment::new(std::mem::take(&mut self.args)) else {
            log::debug!("`|` with no command before it ignored");
            return Ok(());
        };
        // Close-on-exec, so no other child inherits a stray end and keeps the pipe
        // open after its reader or writer exits.
        let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC).map_err(ShellError::Pipe)?;
        if self.dest.take().is_some() {
            log::debug!("output redirection of {} superseded by pipe", segment.name());
        }
        let io = StageIo::new(self.source.take(), Some(write_end));
        // The stage's write end is closed in this process once dispatch returns.
        self.status = dispatch(
            &segment,
            ExecutionContext::PipelineStage,
            io,
            self.session,
            self.out,
        )?;
        log::trace!("{} wired into pipe", segment.name());
        self.source = Some(read_end);
        Ok(())
    }

    /// Any failure to open the source reads as a missing file to the user.
    fn redirect_in(&mut self, path: &str) -> Result<()> {
        match File::open(self.session.resolve_path(path)) {
            Ok(file) => {
                log::debug!("stdin of next segment from {path}");
                self.source = Some(OwnedFd::from(file));
            }
            Err(e) => {
                log::debug!("open {path} for reading: {e}");
                writeln!(self.out, "{}", ShellError::NoSuchFile(path.into()))?;
            }
        }
        Ok(())
    }

    fn redirect_out(&mut self, path: &str) -> Result<()> {
        let opened = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(REDIRECT_FILE_MODE)
            .open(self.session.resolve_path(path));
        match opened {
            Ok(file) => {
                log::debug!("stdout of next segment to {path}");
                self.dest = Some(OwnedFd::from(file));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                writeln!(self.out, "{}", ShellError::NoSuchFile(path.into()))?;
            }
            Err(source) => {
                let err = ShellError::Redirect {
                    path: path.into(),
                    source,
                };
                writeln!(self.out, "{err}")?;
            }
        }
        Ok(())
    }

    /// Drop whatever was never launched, then wait for every pipeline stage.
    fn finish(&mut self) {
        // A read end left over from a trailing `|` must close before the drain, or
        // its writer could block forever.
        self.source = None;
        self.dest = None;
        self.args.clear();
        if !self.session.stages.is_empty() {
            log::trace!("draining {} pipeline stages", self.session.stages.len());
        }
        self.session.stages.drain();
    }
}

/// Consume the word following a redirection operator, if there is one.
fn target<'t>(tokens: &mut Peekable<Iter<'t, Token>>) -> Option<&'t str> {
    tokens.next_if(|t| t.as_word().is_some())?.as_word()
}
