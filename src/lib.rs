//! wsh: the execution engine of a small interactive Unix shell.
//!
//! A line is split into tokens by the [`lexer`], cut into statements and routed by
//! the [`router`], and run either directly or through the [`pipeline`] coordinator,
//! which wires pipes and redirections per segment. External programs are spawned by
//! the [`launcher`]; `cd`, `exit`, `help`, `jobs` and `kill` run in-process.
//! Background jobs and pipeline stages are tracked in [`jobs`], and SIGINT is
//! observed through [`signal`].
//!
//! The main entry point is [`Interpreter`], which owns a [`Session`] holding all
//! mutable state.

mod builtin;
pub mod command;
pub mod config;
pub mod error;
mod interpreter;
pub mod jobs;
pub mod launcher;
pub mod lexer;
pub mod path;
pub mod pipeline;
pub mod router;
pub mod session;
pub mod signal;

pub use error::ShellError;
pub use interpreter::Interpreter;
pub use session::Session;
pub use signal::SignalGateway;
