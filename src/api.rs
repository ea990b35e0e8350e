use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, SqlstyleError};
use crate::formatter;
use crate::lexer::tokenize;
use crate::mode::Mode;
use crate::report::{FileResult, Report};
use crate::token::{Token, TokenType};

/// Format a SQL string according to the given mode, verifying the result
/// unless the mode skips the safety check.
pub fn format_string(source: &str, mode: &Mode) -> Result<String> {
    let result = formatter::format(source, &mode.formatter);

    if mode.should_safety_check() {
        safety_check(source, &result)?;
    }

    Ok(result)
}

/// Run the formatter on a collection of files and directories.
pub fn run(files: &[PathBuf], mode: &Mode) -> Report {
    let matching_paths = get_matching_paths(files, mode);
    debug!(files = matching_paths.len(), "collected input files");

    let mut report = Report::new();
    for path in &matching_paths {
        report.add(format_file(path, mode));
    }
    report
}

/// File contents for formatted SQL: a non-empty result ends with one newline.
fn file_contents(formatted: String) -> String {
    if formatted.is_empty() {
        formatted
    } else {
        formatted + "\n"
    }
}

fn format_file(path: &Path, mode: &Mode) -> FileResult {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return FileResult::error(path, format!("Read error: {}", e)),
    };

    let formatted = match format_string(&source, mode) {
        Ok(f) => file_contents(f),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "leaving file untouched");
            return FileResult::error(path, e.to_string());
        }
    };

    if source == formatted {
        return FileResult::unchanged(path);
    }

    if mode.check || mode.diff {
        if mode.diff {
            print_diff(path, &source, &formatted);
        }
        return FileResult::changed(path);
    }

    match std::fs::write(path, &formatted) {
        Ok(()) => {
            info!(path = %path.display(), "reformatted");
            FileResult::changed(path)
        }
        Err(e) => FileResult::error(path, format!("Write error: {}", e)),
    }
}

/// Get all SQL file paths that match the given inputs, sorted.
pub fn get_matching_paths(paths: &[PathBuf], mode: &Mode) -> Vec<PathBuf> {
    let extensions = mode.sql_extensions();
    let mut result = HashSet::new();

    for path in paths {
        if path.is_file() {
            if is_sql_file(path, extensions) {
                result.insert(path.clone());
            }
        } else if path.is_dir() {
            collect_sql_files(path, extensions, &mode.exclude, &mut result);
        } else {
            warn!(path = %path.display(), "no such file or directory");
        }
    }

    let mut sorted: Vec<PathBuf> = result.into_iter().collect();
    sorted.sort();
    sorted
}

fn is_sql_file(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

fn collect_sql_files(
    dir: &Path,
    extensions: &[&str],
    exclude: &[String],
    result: &mut HashSet<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if name.starts_with('.') {
            continue;
        }
        if exclude.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(&name) || p.matches_path(&path))
                .unwrap_or(false)
        }) {
            debug!(path = %path.display(), "excluded");
            continue;
        }

        if path.is_dir() {
            collect_sql_files(&path, extensions, exclude, result);
        } else if is_sql_file(&path, extensions) {
            result.insert(path);
        }
    }
}

/// Whether `tokens[i]` is an `INTO`/`FROM` the formatter adds after
/// `INSERT`/`DELETE`.
fn is_inserted_keyword(tokens: &[Token], i: usize) -> bool {
    let Some(prev) = i.checked_sub(1).map(|p| &tokens[p]) else {
        return false;
    };
    let token = &tokens[i];
    (token.is_keyword("INTO") && prev.is_keyword("INSERT"))
        || (token.is_keyword("FROM") && prev.is_keyword("DELETE"))
}

fn same_token(a: &Token, b: &Token) -> bool {
    if a.token_type != b.token_type {
        return false;
    }
    if a.token_type == TokenType::Keyword {
        a.text.eq_ignore_ascii_case(&b.text)
    } else {
        a.text == b.text
    }
}

/// Re-tokenize the formatted output and verify it carries the same tokens
/// as the source: keywords compared case-insensitively, canonical
/// `INTO`/`FROM` insertions skipped.
pub fn safety_check(original: &str, formatted: &str) -> Result<()> {
    let source = tokenize(original);
    let output = tokenize(formatted);

    let mut s = 0;
    for (o, token) in output.iter().enumerate() {
        match source.get(s) {
            Some(expected) if same_token(expected, token) => s += 1,
            _ if is_inserted_keyword(&output, o) => continue,
            Some(expected) => {
                return Err(SqlstyleError::Equivalence(format!(
                    "Token mismatch at {}:{}: original {:?} '{}', formatted {:?} '{}'",
                    expected.line, expected.col, expected.token_type, expected.text, token.token_type,
                    token.text
                )));
            }
            None => {
                return Err(SqlstyleError::Equivalence(format!(
                    "Formatted output has extra token {:?} '{}'",
                    token.token_type, token.text
                )));
            }
        }
    }

    if s < source.len() {
        return Err(SqlstyleError::Equivalence(format!(
            "Token count mismatch: original has {} tokens, formatted matched {}",
            source.len(),
            s
        )));
    }
    Ok(())
}

/// Print a unified diff between original and formatted content to stderr.
pub fn print_diff(path: &Path, original: &str, formatted: &str) {
    use similar::TextDiff;

    let name = path.display().to_string();
    let diff = TextDiff::from_lines(original, formatted);
    eprint!(
        "{}",
        diff.unified_diff()
            .context_radius(3)
            .header(&name, &name)
    );
}
