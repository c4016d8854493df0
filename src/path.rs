use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Name → executable lookup built once from `PATH`.
///
/// Directories are scanned at construction time; the first directory containing a
/// name wins, as with a normal `PATH` search. Programs installed afterwards are not
/// seen until a new resolver is built.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    executables: HashMap<String, PathBuf>,
}

impl PathResolver {
    /// Scan every directory of a `PATH`-style list.
    pub fn scan(search_paths: &OsStr) -> Self {
        let mut executables = HashMap::new();
        for dir in std::env::split_paths(search_paths) {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    log::debug!("skipping PATH entry {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if executables.contains_key(&name) {
                    continue;
                }
                let path = entry.path();
                if is_executable(&path) {
                    executables.insert(name, path);
                }
            }
        }
        log::debug!("path resolver indexed {} executables", executables.len());
        Self { executables }
    }

    /// Number of indexed names.
    pub fn len(&self) -> usize {
        self.executables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executables.is_empty()
    }

    /// Resolve a command name the way a typical shell would.
    ///
    /// - A bare name (no `/`) is looked up in the scanned `PATH` index.
    /// - An absolute path is returned if it exists.
    /// - A relative path with a `/` (e.g. `./foo`, `bin/sh`) is resolved against `cwd`.
    /// - An empty name never resolves.
    pub fn resolve(&self, name: &str, cwd: &Path) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }
        if !name.contains('/') {
            return self.executables.get(name).cloned();
        }
        let path = Path::new(name);
        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        if candidate.exists() {
            Some(candidate)
        } else {
            None
        }
    }
}

fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn make_executable(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).expect("touch");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[test]
    fn test_absolute_existing_true() {
        let resolver = PathResolver::default();
        let found = resolver.resolve("/bin/sh", Path::new("/"));
        assert_eq!(found.as_deref(), Some(Path::new("/bin/sh")));
    }

    #[test]
    fn test_absolute_nonexisting() {
        let resolver = PathResolver::default();
        assert!(resolver.resolve("/bin/nonexisting", Path::new("/")).is_none());
    }

    #[test]
    fn test_single_component_found_in_path() {
        let resolver = PathResolver::scan(OsStr::new("/bin"));
        let found = resolver
            .resolve("sh", Path::new("/"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert!(found.starts_with("/bin"));
        assert!(found.ends_with("sh"));
    }

    #[test]
    fn test_single_component_not_found_in_path() {
        let resolver = PathResolver::scan(OsStr::new("/bin"));
        assert!(resolver.resolve("nonexisting-cmd-xyz", Path::new("/")).is_none());
    }

    #[test]
    fn test_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let expected = make_executable(first.path(), "tool");
        make_executable(second.path(), "tool");

        let paths = std::env::join_paths([first.path(), second.path()]).unwrap();
        let resolver = PathResolver::scan(&paths);
        assert_eq!(resolver.resolve("tool", Path::new("/")), Some(expected));
    }

    #[test]
    fn test_non_executable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        let resolver = PathResolver::scan(dir.path().as_os_str());
        assert!(resolver.is_empty());
    }

    #[test]
    fn test_relative_path_resolves_against_cwd() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        let expected = make_executable(&dir.path().join("bin"), "run");

        let resolver = PathResolver::default();
        assert_eq!(resolver.resolve("bin/run", dir.path()), Some(expected.clone()));
        assert_eq!(
            resolver.resolve("./bin/run", dir.path()),
            Some(dir.path().join("./bin/run"))
        );
    }

    #[test]
    fn test_missing_directories_are_ignored() {
        let resolver = PathResolver::scan(OsStr::new("/does/not/exist:/bin"));
        assert!(resolver.resolve("sh", Path::new("/")).is_some());
    }

    #[test]
    fn test_empty_name_is_none() {
        let resolver = PathResolver::scan(OsStr::new("/bin"));
        assert!(resolver.resolve("", Path::new("/")).is_none());
    }
}
