use argh::FromArgs;
use std::io::IsTerminal;

#[derive(FromArgs, Debug, Default)]
/// wsh: a small interactive shell with pipes, redirection and background jobs.
pub struct Config {
    /// run a single line, then exit with its status.
    #[argh(option, short = 'c')]
    pub command: Option<String>,

    /// never color the prompt.
    #[argh(switch)]
    pub plain: bool,

    /// log debug output to stderr (overridden by RUST_LOG).
    #[argh(switch, short = 'v')]
    pub verbose: bool,
}

impl Config {
    /// Default filter for `env_logger` when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }

    /// Green prompt only when stdout is a terminal and `--plain` was not given.
    pub fn colored_prompt(&self) -> bool {
        !self.plain && std::io::stdout().is_terminal()
    }
}
