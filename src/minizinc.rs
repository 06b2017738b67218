use directories::BaseDirs;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const MINIZINC_EXE: &str = "minizinc";

/// Where to look for the MiniZinc executable, in order: an explicit path,
/// the `PATH` environment variable, then a fixed fallback location.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    pub explicit: Option<PathBuf>,
    pub fallback: Option<PathBuf>,
}

impl Locator {
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            fallback: home_fallback(),
        }
    }

    pub fn resolve(&self) -> Result<PathBuf> {
        self.resolve_with_path(env::var_os("PATH").as_deref())
    }

    pub fn resolve_with_path(&self, path_var: Option<&OsStr>) -> Result<PathBuf> {
        if let Some(explicit) = &self.explicit {
            return if explicit.is_file() {
                Ok(explicit.clone())
            } else {
                Err(Error::ExplicitNotFound(explicit.clone()))
            };
        }

        if let Some(found) = path_var.and_then(|path_var| find_in_path(&exe_name(), path_var)) {
            return Ok(found);
        }

        match &self.fallback {
            Some(fallback) if is_executable(fallback) => Ok(fallback.clone()),
            _ => Err(Error::NotFound),
        }
    }
}

/// `~/MiniZincIDE/bin/minizinc`, the layout of the unpacked MiniZinc IDE bundle.
pub fn home_fallback() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new()?;
    Some(
        base_dirs
            .home_dir()
            .join("MiniZincIDE")
            .join("bin")
            .join(exe_name()),
    )
}

pub fn find_in_path(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn exe_name() -> String {
    format!("{MINIZINC_EXE}{}", env::consts::EXE_SUFFIX)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MiniZinc executable '{}' does not exist", .0.display())]
    ExplicitNotFound(PathBuf),
    #[error("could not find '{MINIZINC_EXE}' on PATH, pass its location with --minizinc-exe")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn make_file(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn finds_first_executable_on_path() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        make_file(&first.path().join("minizinc"), 0o644);
        make_file(&second.path().join("minizinc"), 0o755);

        let path_var = env::join_paths([first.path(), second.path()]).unwrap();
        let found = find_in_path("minizinc", &path_var).unwrap();
        assert_eq!(found, second.path().join("minizinc"));
    }

    #[test]
    fn explicit_path_wins_and_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("my-minizinc");
        make_file(&exe, 0o755);

        let locator = Locator {
            explicit: Some(exe.clone()),
            fallback: None,
        };
        assert_eq!(locator.resolve_with_path(None).unwrap(), exe);

        let missing = Locator {
            explicit: Some(dir.path().join("missing")),
            fallback: None,
        };
        assert!(matches!(
            missing.resolve_with_path(None),
            Err(Error::ExplicitNotFound(_))
        ));
    }

    #[test]
    fn falls_back_when_not_on_path() {
        let empty = tempfile::tempdir().unwrap();
        let bundle = tempfile::tempdir().unwrap();
        let fallback = bundle.path().join("minizinc");
        make_file(&fallback, 0o755);

        let locator = Locator {
            explicit: None,
            fallback: Some(fallback.clone()),
        };
        let path_var = env::join_paths([empty.path()]).unwrap();
        assert_eq!(locator.resolve_with_path(Some(&path_var)).unwrap(), fallback);

        let no_fallback = Locator::default();
        assert!(matches!(
            no_fallback.resolve_with_path(Some(&path_var)),
            Err(Error::NotFound)
        ));
    }
}
