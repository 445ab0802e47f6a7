//! Result-file lookup: glob patterns over the files a tool run produced.
//!
//! Supported syntax: `**/` (any number of directories, including none),
//! `*` (anything but `/`), `?` (one character but `/`). Everything else is
//! literal. Patterns match the path relative to the run's output directory.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

use coveriteam_contracts::{
    error::{CoveriError, CoveriResult},
    tool::ToolRun,
};

/// Translate a glob into an anchored regular expression.
pub fn glob_to_regex(pattern: &str) -> CoveriResult<Regex> {
    let mut re = String::from("^");
    let mut rest = pattern;
    while let Some(c) = rest.chars().next() {
        if let Some(tail) = rest.strip_prefix("**/") {
            re.push_str("(?:.*/)?");
            rest = tail;
            continue;
        }
        if let Some(tail) = rest.strip_prefix("**") {
            re.push_str(".*");
            rest = tail;
            continue;
        }
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
        rest = &rest[c.len_utf8()..];
    }
    re.push('$');
    Regex::new(&re).map_err(|e| CoveriError::Config {
        reason: format!("invalid result-file pattern '{pattern}': {e}"),
    })
}

/// Every file of `run` whose path relative to the output directory matches `pattern`.
pub fn matching_files(run: &ToolRun, pattern: &str) -> CoveriResult<Vec<PathBuf>> {
    let re = glob_to_regex(pattern)?;
    let mut matches: Vec<PathBuf> = run
        .result_files
        .iter()
        .filter(|file| re.is_match(&relative_slash_path(&run.output_dir, file)))
        .cloned()
        .collect();
    matches.sort();
    Ok(matches)
}

/// The single result file for `output`.
///
/// Zero matches is not an error (`Ok(None)`); more than one is
/// [`CoveriError::AmbiguousResult`].
pub fn find_result(run: &ToolRun, output: &str, pattern: &str) -> CoveriResult<Option<PathBuf>> {
    let mut matches = matching_files(run, pattern)?;
    match matches.len() {
        0 => {
            debug!(tool_id = %run.tool_id, output = %output, pattern = %pattern, "no result file");
            Ok(None)
        }
        1 => Ok(matches.pop()),
        n => {
            warn!(tool_id = %run.tool_id, output = %output, candidates = n, "ambiguous result files");
            Err(CoveriError::AmbiguousResult {
                output: output.to_string(),
                pattern: pattern.to_string(),
                candidates: n,
            })
        }
    }
}

fn relative_slash_path(base: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(base).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
