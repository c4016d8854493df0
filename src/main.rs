use anyhow::Context;
use env_logger::Env;
use std::io;
use std::process::ExitCode;
use wsh::config::Config;
use wsh::{Interpreter, Session, SignalGateway};

fn main() -> ExitCode {
    let config: Config = argh::from_env();
    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_filter())).init();

    match run(&config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("wsh: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> anyhow::Result<ExitCode> {
    let signals = SignalGateway::install().context("installing SIGINT handler")?;
    let session = Session::new(signals);
    let mut sh = Interpreter::new(session).with_color(config.colored_prompt());

    if let Some(line) = &config.command {
        let status = sh.execute_line(&format!("{line}\n"), &mut io::stdout())?;
        sh.shutdown();
        // Statuses outside 0..=255 (e.g. -1) wrap like a real exit(2).
        return Ok(ExitCode::from(status as u8));
    }

    sh.repl()?;
    Ok(ExitCode::SUCCESS)
}
