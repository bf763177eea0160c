use std::path::{Path, PathBuf};

use dupe_media_core::DeduplicationResult;
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::errors::{AppError, AppResult};

/// spec.md §9.6 (`dupe_media_app::report`): textual and JSON rendering
/// of a `DeduplicationResult`, grounded on the teacher's
/// `app_fns::do_app_outputs` (text: one group per line; JSON: a
/// `serde_json::json!`-built structure) but over this tool's own
/// result shape rather than `SearchOutput`/`MatchGroup`.
pub fn render(
    format: OutputFormat,
    result: &DeduplicationResult<PathBuf>,
    errors: &[(PathBuf, String)],
) -> AppResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result, errors)),
        OutputFormat::Json => render_json(result, errors),
    }
}

fn render_text(result: &DeduplicationResult<PathBuf>, errors: &[(PathBuf, String)]) -> String {
    let mut out = String::new();

    for set in &result.duplicate_sets {
        out.push_str(&format!("{}\n", set.best_file.display()));
        for rep in set.representatives.iter().filter(|r| **r != set.best_file) {
            out.push_str(&format!("  = {}\n", rep.display()));
        }
        for dup in &set.duplicates {
            out.push_str(&format!("  - {}\n", dup.display()));
        }
        out.push('\n');
    }

    if !result.unique_files.is_empty() {
        out.push_str("unique:\n");
        for unique in &result.unique_files {
            out.push_str(&format!("  {}\n", unique.display()));
        }
        out.push('\n');
    }

    if !errors.is_empty() {
        out.push_str("errors:\n");
        for (path, reason) in errors {
            out.push_str(&format!("  {}: {reason}\n", path.display()));
        }
    }

    out
}

#[derive(Serialize)]
struct JsonDuplicateSet<'a> {
    best_file: &'a Path,
    representatives: &'a [PathBuf],
    duplicates: &'a [PathBuf],
}

#[derive(Serialize)]
struct JsonError<'a> {
    path: &'a Path,
    reason: &'a str,
}

fn render_json(result: &DeduplicationResult<PathBuf>, errors: &[(PathBuf, String)]) -> AppResult<String> {
    let duplicate_sets: Vec<JsonDuplicateSet> = result
        .duplicate_sets
        .iter()
        .map(|set| JsonDuplicateSet {
            best_file: &set.best_file,
            representatives: &set.representatives,
            duplicates: &set.duplicates,
        })
        .collect();

    let json_errors: Vec<JsonError> = errors
        .iter()
        .map(|(path, reason)| JsonError { path, reason })
        .collect();

    let value = json!({
        "unique_files": result.unique_files,
        "duplicate_sets": duplicate_sets,
        "errors": json_errors,
    });

    serde_json::to_string_pretty(&value).map_err(AppError::ReportSerialize)
}

#[allow(clippy::print_stdout)]
pub fn write_report(text: &str, output: Option<&Path>) -> AppResult<()> {
    match output {
        Some(path) => std::fs::write(path, text).map_err(|e| AppError::ReportIo {
            path: path.to_path_buf(),
            src: e,
        }),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use dupe_media_core::DuplicateSet;

    fn sample_result() -> DeduplicationResult<PathBuf> {
        DeduplicationResult {
            unique_files: vec![PathBuf::from("/a/unique.jpg")],
            duplicate_sets: vec![DuplicateSet {
                best_file: PathBuf::from("/a/best.mp4"),
                representatives: vec![PathBuf::from("/a/best.mp4")],
                duplicates: vec![PathBuf::from("/a/dup.jpg")],
            }],
        }
    }

    #[test]
    fn text_report_lists_best_file_then_duplicates_then_unique() {
        let text = render_text(&sample_result(), &[]);
        assert!(text.contains("/a/best.mp4"));
        assert!(text.contains("- /a/dup.jpg"));
        assert!(text.contains("unique:"));
        assert!(text.contains("/a/unique.jpg"));
    }

    #[test]
    fn json_report_round_trips_through_serde_json_value() {
        let text = render_json(&sample_result(), &[(PathBuf::from("/bad.jpg"), "boom".to_string())]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["unique_files"][0], "/a/unique.jpg");
        assert_eq!(value["duplicate_sets"][0]["best_file"], "/a/best.mp4");
        assert_eq!(value["errors"][0]["reason"], "boom");
    }
}
