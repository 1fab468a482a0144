//! Custom-tests directory validation.

use std::env;
use std::fs;
use std::path::Path;

/// Validate a configured custom-tests directory against the current directory.
///
/// Returns the candidate unchanged when it names an existing directory and
/// `None` otherwise; a missing candidate (or one that was not a string in the
/// configuration) is `None` as well.
pub fn validate_custom_tests_path(candidate: Option<&str>) -> Option<String> {
    let cwd = env::current_dir().ok()?;
    validate_custom_tests_path_in(&cwd, candidate)
}

/// Same as [`validate_custom_tests_path`], probing relative to `base`.
pub fn validate_custom_tests_path_in(base: &Path, candidate: Option<&str>) -> Option<String> {
    let candidate = candidate?;
    let absolute = base.join(candidate);
    match fs::metadata(&absolute) {
        Ok(meta) if meta.is_dir() => Some(candidate.to_string()),
        Ok(_) => {
            tracing::debug!(path = %absolute.display(), "custom tests path is not a directory");
            None
        }
        Err(err) => {
            tracing::debug!(
                path = %absolute.display(),
                error = %err,
                "custom tests path unavailable"
            );
            None
        }
    }
}
