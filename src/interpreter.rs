use crate::command::ExitCode;
use crate::lexer;
use crate::router;
use crate::session::Session;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// The interactive shell: reads lines, routes them, and reports finished jobs.
///
/// All state lives in the [`Session`]; the interpreter only adds the prompt and the
/// read loop on top of it.
///
/// Example
/// ```no_run
/// use wsh::{Interpreter, Session, SignalGateway};
/// let mut sh = Interpreter::new(Session::new(SignalGateway::detached()));
/// let code = sh.execute_line("echo hello world\n", &mut std::io::stdout()).unwrap();
/// assert_eq!(code, 0);
/// ```
pub struct Interpreter {
    session: Session,
    color: bool,
}

impl Interpreter {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            color: false,
        }
    }

    /// Print the prompt's working directory in green.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// `<cwd>$ `.
    pub fn prompt(&self) -> String {
        let cwd = self.session.current_dir.display();
        if self.color {
            format!("\x1b[32m{cwd}\x1b[0m$ ")
        } else {
            format!("{cwd}$ ")
        }
    }

    /// Run one input line, then report background jobs that have finished since.
    ///
    /// Returns the status of the line's last statement.
    pub fn execute_line(&mut self, line: &str, out: &mut dyn Write) -> anyhow::Result<ExitCode> {
        let tokens = lexer::split_into_tokens(line);
        log::trace!("tokens: {tokens:?}");
        let status = router::route(&tokens, &mut self.session, out)?;
        if !self.session.jobs.is_empty() {
            self.session.jobs.poll_finished(out)?;
        }
        out.flush()?;
        Ok(status)
    }

    /// Read-eval-print loop on the terminal, until `exit` or end of input.
    ///
    /// Ctrl-C at the prompt abandons the line being typed; while a line runs it
    /// stops further launches (see [`SignalGateway`]). Either way the loop goes on.
    ///
    /// [`SignalGateway`]: crate::signal::SignalGateway
    pub fn repl(&mut self) -> anyhow::Result<()> {
        let result = self.read_loop();
        // Jobs are interrupted however the loop ended.
        self.shutdown();
        result
    }

    fn read_loop(&mut self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut stdout = io::stdout();

        while !self.session.should_exit {
            if self.session.signals.take() {
                // The interrupted command left the cursor mid-line.
                writeln!(stdout)?;
            }
            match rl.readline(&self.prompt()) {
                Ok(line) => {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        log::warn!("history not updated: {e}");
                    }
                    let status = self.execute_line(&format!("{line}\n"), &mut stdout)?;
                    log::debug!("line finished with status {status}");
                }
                Err(ReadlineError::Interrupted) => {
                    log::debug!("input line interrupted");
                    self.session.signals.raise();
                }
                Err(ReadlineError::Eof) => {
                    log::debug!("end of input");
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Interrupt every remaining background job.
    pub fn shutdown(&mut self) {
        self.session.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalGateway;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, Instant};

    fn interpreter_in(dir: &Path) -> Interpreter {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let session = Session::with_vars(vars, dir.to_path_buf(), SignalGateway::detached());
        Interpreter::new(session)
    }

    fn run(sh: &mut Interpreter, line: &str) -> (ExitCode, String) {
        let mut out = Vec::new();
        let code = sh.execute_line(line, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prompt_shows_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sh = interpreter_in(dir.path());
        assert_eq!(sh.prompt(), format!("{}$ ", dir.path().display()));

        let sh = sh.with_color(true);
        assert!(sh.prompt().starts_with("\x1b[32m"));
        assert!(sh.prompt().ends_with("\x1b[0m$ "));
    }

    #[test]
    fn test_cd_changes_prompt_but_not_process_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let mut sh = interpreter_in(dir.path());
        let process_dir = std::env::current_dir().unwrap();

        let (code, _) = run(&mut sh, "cd sub\n");
        assert_eq!(code, 0);
        let sub = fs::canonicalize(dir.path().join("sub")).unwrap();
        assert_eq!(sh.session().current_dir, sub);
        assert_eq!(sh.prompt(), format!("{}$ ", sub.display()));
        assert_eq!(std::env::current_dir().unwrap(), process_dir);

        run(&mut sh, "echo here > marker\n");
        assert!(sub.join("marker").exists());
    }

    #[test]
    fn test_finished_jobs_are_reported_after_a_later_line() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let (_, out) = run(&mut sh, "true &\n");
        assert!(out.starts_with("[0] "), "{out}");

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut report = String::new();
        while report.is_empty() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
            report = run(&mut sh, "\n").1;
        }
        assert_eq!(report, "[0]: finished true \n");
        assert!(sh.session().jobs.is_empty());
    }

    #[test]
    fn test_jobs_lists_running_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        run(&mut sh, "sleep 5 &\n");
        let (_, out) = run(&mut sh, "jobs\n");
        assert!(out.starts_with("[0] sleep 5 "), "{out}");
        assert_eq!(out.lines().count(), 1);

        let (code, out) = run(&mut sh, "kill 0\n");
        assert_eq!(code, 0);
        assert!(out.is_empty());
        sh.shutdown();
    }

    #[test]
    fn test_exit_stops_the_line_and_sets_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        let (_, out) = run(&mut sh, "exit; echo never > never.txt\n");
        assert!(out.is_empty());
        assert!(sh.session().should_exit);
        assert!(!dir.path().join("never.txt").exists());
    }

    #[test]
    fn test_status_is_that_of_the_last_statement() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());

        assert_eq!(run(&mut sh, "true; false\n").0, 1);
        assert_eq!(run(&mut sh, "false; true\n").0, 0);
        assert_eq!(run(&mut sh, "no-such-command-xyz\n").0, 127);
    }
}
