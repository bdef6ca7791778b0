//! Temporary output directories and lookup of external programs.

use std::path::{Path, PathBuf};

/// Locate an executable.
///
/// A name with a directory part is checked as given; a bare name is searched
/// in every directory of `PATH`.
pub fn find_program(name: &str) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// A scratch directory removed when the guard is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("gerda_")
        .tempdir()
        .expect("cannot create a temporary directory")
}
