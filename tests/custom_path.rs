// Custom-tests directory validation against a project directory.
mod support;

use anyhow::Result;
use detect_bundler::validate_custom_tests_path_in;
use support::TempProject;

#[test]
fn existing_directory_round_trips() -> Result<()> {
    let project = TempProject::new()?;
    project.mkdir("my-feature-detects/custom-tests")?;

    for candidate in [
        "my-feature-detects/custom-tests",
        "./my-feature-detects/custom-tests",
        "./my-feature-detects/custom-tests/",
    ] {
        assert_eq!(
            validate_custom_tests_path_in(project.root(), Some(candidate)).as_deref(),
            Some(candidate)
        );
    }
    Ok(())
}

#[test]
fn file_in_place_of_directory_is_rejected() -> Result<()> {
    let project = TempProject::new()?;
    project.write("my-feature-detects/custom-tests", "not a directory")?;
    assert_eq!(
        validate_custom_tests_path_in(project.root(), Some("my-feature-detects/custom-tests")),
        None
    );
    Ok(())
}

#[test]
fn missing_or_absent_candidate_is_rejected() -> Result<()> {
    let project = TempProject::new()?;
    assert_eq!(validate_custom_tests_path_in(project.root(), Some("nowhere")), None);
    assert_eq!(validate_custom_tests_path_in(project.root(), None), None);
    Ok(())
}
