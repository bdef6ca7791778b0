//! File-level verification: flatten-and-check and reference comparison.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::checker::{run_checker, CheckOutcome};
use crate::compare::assert_trees_match;
use crate::error::NetCdfResult;
use crate::flatten::{flatten_encoding, flatten_tree, strip_flattener_attrs};
use crate::reader::read_tree;
use crate::writer::write_tree;

/// Flatten the groups of `input` into a single namespace and write the
/// result to `output`, without the flattener's reserved attributes.
pub fn flatten_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> NetCdfResult<()> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let loaded = read_tree(input)?;
    let mut flat = flatten_tree(&loaded.tree)?;
    let stripped = strip_flattener_attrs(&mut flat);
    write_tree(&flat, &flatten_encoding(&loaded.encoding), output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        stripped,
        "Flattened file"
    );
    Ok(())
}

/// Default location of the flattened copy: `<stem>.flat.nc` next to `input`.
pub fn default_flat_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}.flat.nc", stem))
}

/// Flatten `input` into `flat` and run the checker on the flat copy.
pub fn check_file(input: &Path, flat: &Path, checker: &str) -> NetCdfResult<CheckOutcome> {
    flatten_file(input, flat)?;
    run_checker(checker, flat)
}

/// Compare two files; fails with the first difference found.
pub fn compare_files(test: impl AsRef<Path>, reference: impl AsRef<Path>) -> NetCdfResult<()> {
    let test = read_tree(test)?;
    let reference = read_tree(reference)?;
    assert_trees_match(&test.tree, &reference.tree)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flat_path() {
        assert_eq!(
            default_flat_path(Path::new("/tmp/out/TSTdm.nc")),
            PathBuf::from("/tmp/out/TSTdm.flat.nc")
        );
    }
}
