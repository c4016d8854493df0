use std::fs::File;
use std::io::Write;
use std::os::fd::OwnedFd;
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// One command and its arguments, prior to launch. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSegment {
    argv: Vec<String>,
}

impl CommandSegment {
    /// Build a segment from its words, or `None` when there are no words.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() {
            None
        } else {
            Some(Self { argv })
        }
    }

    /// `argv[0]`.
    pub fn name(&self) -> &str {
        &self.argv[0]
    }

    /// Everything after `argv[0]`.
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Name shown by `jobs` and in completion reports: every word followed by a
    /// single space, so `sleep 1` becomes `"sleep 1 "`.
    pub fn display_name(&self) -> String {
        self.argv.iter().fold(String::new(), |mut acc, word| {
            acc.push_str(word);
            acc.push(' ');
            acc
        })
    }
}

/// How a launched process relates to the interpreter's control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// The caller blocks until the process exits.
    Foreground,
    /// Tracked in the job table; the caller does not block.
    Background,
    /// Tracked until the current pipeline drains; the caller does not block.
    PipelineStage,
}

/// Standard input and output for one segment.
///
/// `None` means the interpreter's own descriptor is inherited. Redirection files and
/// pipe ends are handed over as owned descriptors, so a child gets them through its
/// [`Stdio`] and a builtin writes straight into them; the interpreter's descriptors 0
/// and 1 are never rebound.
#[derive(Debug, Default)]
pub struct StageIo {
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
}

impl StageIo {
    /// Inherit both streams from the interpreter.
    pub fn inherit() -> Self {
        Self::default()
    }

    pub fn new(stdin: Option<OwnedFd>, stdout: Option<OwnedFd>) -> Self {
        Self { stdin, stdout }
    }

    /// Convert into handles suitable for `std::process::Command`.
    pub fn into_stdio(self) -> (Stdio, Stdio) {
        let stdin = self.stdin.map_or_else(Stdio::inherit, Stdio::from);
        let stdout = self.stdout.map_or_else(Stdio::inherit, Stdio::from);
        (stdin, stdout)
    }

    /// Writer for a builtin running in-process: the redirected or piped descriptor,
    /// or `inherited` when there is none. Dropping it closes the descriptor.
    pub fn into_writer<'a>(self, inherited: &'a mut dyn Write) -> Box<dyn Write + 'a> {
        match self.stdout {
            Some(fd) => Box::new(File::from(fd)),
            None => Box::new(inherited),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(words: &[&str]) -> CommandSegment {
        CommandSegment::new(words.iter().map(|w| w.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_empty_segment_is_rejected() {
        assert!(CommandSegment::new(Vec::new()).is_none());
    }

    #[test]
    fn test_name_and_args() {
        let seg = segment(&["ls", "-l", "/tmp"]);
        assert_eq!(seg.name(), "ls");
        assert_eq!(seg.args(), ["-l".to_string(), "/tmp".to_string()]);
        assert_eq!(seg.argv().len(), 3);
    }

    #[test]
    fn test_display_name_has_trailing_space() {
        assert_eq!(segment(&["sleep", "1"]).display_name(), "sleep 1 ");
        assert_eq!(segment(&["jobs"]).display_name(), "jobs ");
    }

    #[test]
    fn test_builtin_writer_reaches_the_redirected_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let file = File::create(&path).unwrap();

        let mut terminal = Vec::new();
        let io = StageIo::new(None, Some(OwnedFd::from(file)));
        let mut writer = io.into_writer(&mut terminal);
        writeln!(writer, "hello").unwrap();
        drop(writer);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(terminal.is_empty());
    }

    #[test]
    fn test_builtin_writer_defaults_to_inherited_stream() {
        let mut terminal = Vec::new();
        let mut writer = StageIo::inherit().into_writer(&mut terminal);
        write!(writer, "hi").unwrap();
        drop(writer);
        assert_eq!(terminal, b"hi");
    }
}
