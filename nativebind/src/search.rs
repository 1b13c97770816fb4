//! Library discovery: turns a logical library name such as `example` into a file on disk.
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::error::{BindError, Result};

/// Environment variable holding extra library directories, separated like `PATH`.
pub const LIBRARY_PATH_ENV: &str = "NATIVEBIND_LIBRARY_PATH";

/// Platform file name for a logical library name.
///
/// ```
/// let file = nativebind::search::map_library_name("example");
/// # #[cfg(target_os = "linux")]
/// assert_eq!(file, "libexample.so");
/// ```
pub fn map_library_name(name: &str) -> String {
    format!("{}{}{}", env::consts::DLL_PREFIX, name, env::consts::DLL_SUFFIX)
}

/// Ordered list of directories probed for a library.
#[derive(Debug, Clone)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
    system_fallback: bool,
}

impl Default for SearchPath {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            system_fallback: true,
        }
    }
}

impl SearchPath {
    /// Only the given directories, in order.
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut path = Self::default();
        for dir in dirs {
            path.push(dir);
        }
        path
    }

    /// Explicit directories first, then [`LIBRARY_PATH_ENV`], then the
    /// directory of the running executable and its `deps/` subdirectory.
    /// An executable that itself lives in `deps/` also gets the parent
    /// directory, where cargo puts the cdylibs.
    pub fn from_env(explicit: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut path = Self::new(explicit);

        if let Some(value) = env::var_os(LIBRARY_PATH_ENV) {
            for dir in env::split_paths(&value) {
                if !dir.as_os_str().is_empty() {
                    path.push(dir);
                }
            }
        }

        if let Ok(exe) = env::current_exe() {
            path.push_exe_dirs(&exe);
        }

        path
    }

    fn push_exe_dirs(&mut self, exe: &Path) {
        let Some(exe_dir) = exe.parent() else {
            return;
        };
        self.push(exe_dir.to_path_buf());
        self.push(exe_dir.join("deps"));
        if exe_dir.ends_with("deps") {
            if let Some(parent) = exe_dir.parent() {
                self.push(parent.to_path_buf());
            }
        }
    }

    pub fn push(&mut self, dir: PathBuf) {
        if !self.dirs.contains(&dir) {
            self.dirs.push(dir);
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Whether the platform loader may search its own locations
    /// (`LD_LIBRARY_PATH`, system directories, ...) when no directory matches.
    pub fn with_system_fallback(mut self, enabled: bool) -> Self {
        self.system_fallback = enabled;
        self
    }

    pub fn system_fallback(&self) -> bool {
        self.system_fallback
    }

    /// File name probed for `name`. Names that already carry the platform
    /// suffix (`libc.so.6`) are kept as they are.
    pub fn file_name_for(&self, name: &str) -> String {
        if name.contains(env::consts::DLL_SUFFIX) {
            name.to_string()
        } else {
            map_library_name(name)
        }
    }

    /// Finds the file for `name`.
    ///
    /// A name containing a path separator is treated as a path and used as-is.
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        let as_path = Path::new(name);
        if as_path.components().count() > 1 {
            if as_path.is_file() {
                return Ok(as_path.to_path_buf());
            }
            return Err(BindError::LibraryNotFound {
                name: name.to_string(),
                searched: vec![as_path.to_path_buf()],
            });
        }

        let file_name = self.file_name_for(name);
        let found = self
            .dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => {
                tracing::debug!(library = name, path = %path.display(), "located library");
                Ok(path)
            }
            None => Err(BindError::LibraryNotFound {
                name: name.to_string(),
                searched: self.dirs.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let file_name = map_library_name("example");
        fs::write(first.path().join(&file_name), b"").unwrap();
        fs::write(second.path().join(&file_name), b"").unwrap();

        let search = SearchPath::new([second.path().to_path_buf(), first.path().to_path_buf()]);

        assert_eq!(search.locate("example").unwrap(), second.path().join(&file_name));
    }

    #[test]
    fn missing_library_lists_searched_directories() {
        let dir = tempfile::tempdir().unwrap();
        let search = SearchPath::new([dir.path().to_path_buf()]);

        match search.locate("does_not_exist") {
            Err(BindError::LibraryNotFound { name, searched }) => {
                assert_eq!(name, "does_not_exist");
                assert_eq!(searched, vec![dir.path().to_path_buf()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn directories_are_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let search = SearchPath::new([dir.path().to_path_buf(), dir.path().to_path_buf()]);

        assert_eq!(search.dirs().len(), 1);
    }

    #[test]
    fn explicit_path_is_used_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.lib");
        fs::write(&path, b"").unwrap();

        let search = SearchPath::default();

        assert_eq!(search.locate(path.to_str().unwrap()).unwrap(), path);
        assert!(search.locate(dir.path().join("missing.lib").to_str().unwrap()).is_err());
    }

    #[test]
    fn file_names_with_suffix_are_kept() {
        let search = SearchPath::default();
        let versioned = format!("libfoo{}.1", env::consts::DLL_SUFFIX);

        assert_eq!(search.file_name_for(&versioned), versioned);
        assert_eq!(search.file_name_for("foo"), map_library_name("foo"));
        assert!(search.system_fallback());
        assert!(!search.with_system_fallback(false).system_fallback());
    }

    #[test]
    fn executable_directory_comes_before_deps() {
        let mut search = SearchPath::default();
        search.push_exe_dirs(Path::new("/opt/app/bin/nativebind"));

        assert_eq!(
            search.dirs(),
            [PathBuf::from("/opt/app/bin"), PathBuf::from("/opt/app/bin/deps")]
        );
    }

    #[test]
    fn test_binary_in_deps_also_searches_parent() {
        let mut search = SearchPath::default();
        search.push_exe_dirs(Path::new("/work/target/debug/deps/dynamic_load-1234"));

        assert_eq!(
            search.dirs(),
            [
                PathBuf::from("/work/target/debug/deps"),
                PathBuf::from("/work/target/debug/deps/deps"),
                PathBuf::from("/work/target/debug"),
            ]
        );
    }

    #[test]
    fn directory_named_like_library_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(map_library_name("example"))).unwrap();

        let search = SearchPath::new([dir.path().to_path_buf()]);

        assert!(search.locate("example").is_err());
    }
}
