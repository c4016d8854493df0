//! End-to-end runs of the `wsh` binary with piped input.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::thread::sleep;
use std::time::Duration;

fn wsh(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_wsh"));
    cmd.current_dir(dir)
        .arg("--plain")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Feed `lines` one at a time, pausing `gap` after each, then close stdin.
fn session(dir: &std::path::Path, lines: &[&str], gap: Duration) -> Output {
    let mut child = wsh(dir).spawn().unwrap();
    let mut stdin = child.stdin.take().unwrap();
    for line in lines {
        match writeln!(stdin, "{line}").and_then(|()| stdin.flush()) {
            Ok(()) => {}
            // The shell has already exited (e.g. after `exit`); stop feeding input.
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => break,
            Err(e) => panic!("{e}"),
        }
        sleep(gap);
    }
    drop(stdin);
    child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_redirected_output_can_be_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let output = session(
        dir.path(),
        &["echo hi > file", "cat < file"],
        Duration::from_millis(50),
    );
    assert!(output.status.success());
    assert_eq!(std::fs::read_to_string(dir.path().join("file")).unwrap(), "hi\n");
    assert!(stdout(&output).contains("hi\n"));
}

#[test]
fn test_background_job_is_announced_and_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let output = session(
        dir.path(),
        &["sleep 1 &", "echo tick", "echo tock"],
        Duration::from_millis(1500),
    );
    let text = stdout(&output);
    assert!(output.status.success());
    assert!(text.contains("[0] "), "{text}");
    assert_eq!(text.matches("[0]: finished sleep 1 \n").count(), 1, "{text}");
}

#[test]
fn test_pipeline_output_reaches_the_terminal() {
    let dir = tempfile::tempdir().unwrap();
    let output = session(
        dir.path(),
        &["echo one two three | wc -w"],
        Duration::from_millis(50),
    );
    assert!(stdout(&output).contains("3\n"));
}

#[test]
fn test_exit_ends_the_session_before_later_lines() {
    let dir = tempfile::tempdir().unwrap();
    let output = session(
        dir.path(),
        &["exit", "echo late > late.txt"],
        Duration::from_millis(50),
    );
    assert!(output.status.success());
    assert!(!dir.path().join("late.txt").exists());
}

#[test]
fn test_unknown_command_is_reported_and_session_continues() {
    let dir = tempfile::tempdir().unwrap();
    let output = session(
        dir.path(),
        &["no-such-command-xyz", "echo after"],
        Duration::from_millis(50),
    );
    let text = stdout(&output);
    assert!(text.contains("no-such-command-xyz: Command not found\n"), "{text}");
    assert!(text.contains("after\n"), "{text}");
}

#[test]
fn test_single_line_mode_returns_its_status() {
    let dir = tempfile::tempdir().unwrap();
    let output = wsh(dir.path())
        .args(["-c", "true; false"])
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let output = wsh(dir.path())
        .args(["-c", "help cd"])
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("cd: cd [dir]"));
}

#[test]
fn test_unwritable_builtin_output_does_not_end_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let output = session(
        dir.path(),
        &["help > /dev/full", "echo after"],
        Duration::from_millis(50),
    );
    let text = stdout(&output);
    assert!(output.status.success(), "{:?}", output.status);
    assert!(text.contains("after\n"), "{text}");
}
