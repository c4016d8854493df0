//! Splitting a token stream into statements and segments, and routing each
//! statement to the pipeline coordinator, a builtin, or the process launcher.

use crate::builtin::BuiltinKind;
use crate::command::{CommandSegment, ExecutionContext, ExitCode, StageIo};
use crate::launcher;
use crate::lexer::{Operator, Token};
use crate::pipeline::PipelineCoordinator;
use crate::session::Session;
use anyhow::Result;
use std::io::Write;

/// The part of a line between two terminators (`;` or newline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statement<'a> {
    tokens: &'a [Token],
}

/// How a statement is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// Only words: one segment, run directly in the foreground.
    Simple(CommandSegment),
    /// Contains `< > & |`: handed to the pipeline coordinator.
    Composite(&'a [Token]),
}

impl<'a> Statement<'a> {
    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    pub fn is_composite(&self) -> bool {
        self.tokens.iter().any(|t| t.as_operator().is_some())
    }

    /// `None` for a statement with no tokens at all.
    pub fn route(&self) -> Option<Route<'a>> {
        if self.is_composite() {
            Some(Route::Composite(self.tokens))
        } else {
            let words = self
                .tokens
                .iter()
                .filter_map(Token::as_word)
                .map(str::to_string)
                .collect();
            CommandSegment::new(words).map(Route::Simple)
        }
    }
}

/// Split a line's tokens into statements. A `#` ends the line: nothing after it,
/// including later statements, is returned.
pub fn statements(tokens: &[Token]) -> Vec<Statement<'_>> {
    let end = tokens
        .iter()
        .position(|t| t.as_operator() == Some(Operator::Comment))
        .unwrap_or(tokens.len());
    tokens[..end]
        .split(|t| t.as_operator().is_some_and(Operator::is_terminator))
        .filter(|run| !run.is_empty())
        .map(|run| Statement { tokens: run })
        .collect()
}

/// The command segments of a token run, split at every operator. Redirection targets
/// show up as segments of their own.
pub fn segments(tokens: &[Token]) -> Vec<CommandSegment> {
    tokens
        .split(|t| t.as_operator().is_some())
        .filter_map(|run| {
            let words = run.iter().filter_map(Token::as_word).map(str::to_string);
            CommandSegment::new(words.collect())
        })
        .collect()
}

/// The operators of a token run, in order, excluding terminators.
pub fn operators(tokens: &[Token]) -> Vec<Operator> {
    tokens
        .iter()
        .filter_map(Token::as_operator)
        .filter(|op| !op.is_terminator())
        .collect()
}

/// Execute every statement of a tokenized line.
///
/// Failures of individual segments are reported on `out` and do not stop the line.
/// The line is abandoned when the interrupt flag is raised or `exit` has run.
/// Returns the status of the last statement that ran.
pub fn route(tokens: &[Token], session: &mut Session, out: &mut dyn Write) -> Result<ExitCode> {
    let mut status = 0;
    for statement in statements(tokens) {
        if session.should_exit {
            break;
        }
        if session.signals.is_interrupted() {
            log::debug!("interrupted; dropping the rest of the line");
            break;
        }
        status = match statement.route() {
            Some(Route::Simple(segment)) => dispatch(
                &segment,
                ExecutionContext::Foreground,
                StageIo::inherit(),
                session,
                out,
            )?,
            Some(Route::Composite(tokens)) => {
                PipelineCoordinator::new(session, out).run(tokens)?
            }
            None => continue,
        };
    }
    Ok(status)
}

/// Run one segment: in-process when it names a builtin, otherwise through the
/// launcher in `context`.
///
/// Builtins ignore the context and always run synchronously. Launch failures are
/// reported on `out` and mapped to a status. A builtin that cannot write to its
/// redirected or piped output fails with status 1; only errors writing to `out`
/// itself are returned.
pub fn dispatch(
    segment: &CommandSegment,
    context: ExecutionContext,
    io: StageIo,
    session: &mut Session,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    if let Some(kind) = BuiltinKind::from_name(segment.name()) {
        let redirected = io.stdout.is_some();
        let mut writer = io.into_writer(out);
        return match kind.run(segment, &mut *writer, session) {
            // A full disk or a closed pipe only fails this segment.
            Err(err) if redirected => {
                log::warn!("{}: output not written: {err:#}", segment.name());
                Ok(1)
            }
            result => result,
        };
    }
    match launcher::launch(segment, context, io, session, out) {
        Ok(launched) => Ok(launched.exit_code()),
        Err(err) => {
            log::debug!("{} failed to launch: {err:?}", segment.name());
            writeln!(out, "{err}")?;
            Ok(err.exit_code())
        }
    }
}
