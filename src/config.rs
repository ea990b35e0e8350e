use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SqlstyleError};
use crate::mode::Mode;

/// Three-way layout axis: all on one line, one item per line, or one item
/// per line with the first item also moved to its own line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListStyle {
    Inline,
    Stacked,
    StackedIndent,
}

impl ListStyle {
    pub fn is_inline(self) -> bool {
        self == Self::Inline
    }
}

/// Two-way layout axis for lists that have no "indent first item" form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Inline,
    Stacked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AndOrPosition {
    Leading,
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MergeStyle {
    Compact,
    Expanded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum KeywordCase {
    Upper,
    Lower,
    Preserve,
}

/// Formatting options, built once per call and read-only during the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    pub where_newline: bool,
    pub and_or_position: AndOrPosition,
    /// Indent units for WHERE continuation lines.
    pub where_and_or_indent: usize,
    pub where_condition_style: ListStyle,
    pub where_between_style: ListStyle,
    /// Overrides `in_list_style` inside WHERE when set.
    pub where_in_list_style: Option<ListStyle>,
    pub in_list_style: ListStyle,
    pub insert_columns_style: Layout,
    pub insert_values_style: Layout,
    pub insert_multi_row_style: Layout,
    pub insert_into_keyword: bool,
    pub update_set_style: Layout,
    pub update_set_align: bool,
    pub delete_from_keyword: bool,
    pub merge_style: MergeStyle,
    pub merge_when_newline: bool,
    pub align_aliases: bool,
    pub subquery_indent: usize,
    pub case_indent: usize,
    pub keyword_case: KeywordCase,
    /// Spaces per indent unit.
    pub indent_width: usize,
    pub select_list_style: Layout,
    /// A single VALUES row with more values than this is laid out stacked.
    pub values_stack_threshold: usize,
    /// GROUP BY / ORDER BY lists with more items than this are stacked.
    pub list_stack_threshold: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            where_newline: true,
            and_or_position: AndOrPosition::Leading,
            where_and_or_indent: 1,
            where_condition_style: ListStyle::Stacked,
            where_between_style: ListStyle::Inline,
            where_in_list_style: None,
            in_list_style: ListStyle::Inline,
            insert_columns_style: Layout::Inline,
            insert_values_style: Layout::Inline,
            insert_multi_row_style: Layout::Stacked,
            insert_into_keyword: true,
            update_set_style: Layout::Stacked,
            update_set_align: false,
            delete_from_keyword: true,
            merge_style: MergeStyle::Expanded,
            merge_when_newline: true,
            align_aliases: false,
            subquery_indent: 1,
            case_indent: 1,
            keyword_case: KeywordCase::Upper,
            indent_width: 4,
            select_list_style: Layout::Stacked,
            values_stack_threshold: 3,
            list_stack_threshold: 5,
        }
    }
}

impl FormatterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// IN-list layout inside WHERE.
    pub fn effective_where_in_list_style(&self) -> ListStyle {
        self.where_in_list_style.unwrap_or(self.in_list_style)
    }

    pub fn with_keyword_case(mut self, case: KeywordCase) -> Self {
        self.keyword_case = case;
        self
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn with_align_aliases(mut self, align: bool) -> Self {
        self.align_aliases = align;
        self
    }

    pub fn with_and_or_position(mut self, position: AndOrPosition) -> Self {
        self.and_or_position = position;
        self
    }

    pub fn with_where_condition_style(mut self, style: ListStyle) -> Self {
        self.where_condition_style = style;
        self
    }

    pub fn with_where_in_list_style(mut self, style: ListStyle) -> Self {
        self.where_in_list_style = Some(style);
        self
    }

    pub fn with_where_between_style(mut self, style: ListStyle) -> Self {
        self.where_between_style = style;
        self
    }

    /// Apply a `[format]` table. Values of the wrong type or with an unknown
    /// variant leave the option at its current value.
    pub fn apply_format_table(&mut self, table: &HashMap<String, toml::Value>) {
        for (key, value) in table {
            match key.as_str() {
                "where_newline" => set_bool(key, value, &mut self.where_newline),
                "and_or_position" => set_enum(key, value, &mut self.and_or_position),
                "where_and_or_indent" => set_usize(key, value, &mut self.where_and_or_indent),
                "where_condition_style" => set_enum(key, value, &mut self.where_condition_style),
                "where_between_style" => set_enum(key, value, &mut self.where_between_style),
                "where_in_list_style" => {
                    let mut style = self.effective_where_in_list_style();
                    let applied = set_enum(key, value, &mut style);
                    if applied {
                        self.where_in_list_style = Some(style);
                    }
                    applied
                }
                "in_list_style" => set_enum(key, value, &mut self.in_list_style),
                "insert_columns_style" => set_enum(key, value, &mut self.insert_columns_style),
                "insert_values_style" => set_enum(key, value, &mut self.insert_values_style),
                "insert_multi_row_style" => set_enum(key, value, &mut self.insert_multi_row_style),
                "insert_into_keyword" => set_bool(key, value, &mut self.insert_into_keyword),
                "update_set_style" => set_enum(key, value, &mut self.update_set_style),
                "update_set_align" => set_bool(key, value, &mut self.update_set_align),
                "delete_from_keyword" => set_bool(key, value, &mut self.delete_from_keyword),
                "merge_style" => set_enum(key, value, &mut self.merge_style),
                "merge_when_newline" => set_bool(key, value, &mut self.merge_when_newline),
                "align_aliases" => set_bool(key, value, &mut self.align_aliases),
                "subquery_indent" => set_usize(key, value, &mut self.subquery_indent),
                "case_indent" => set_usize(key, value, &mut self.case_indent),
                "keyword_case" => set_enum(key, value, &mut self.keyword_case),
                "indent_width" => set_usize(key, value, &mut self.indent_width),
                "select_list_style" => set_enum(key, value, &mut self.select_list_style),
                "values_stack_threshold" => set_usize(key, value, &mut self.values_stack_threshold),
                "list_stack_threshold" => set_usize(key, value, &mut self.list_stack_threshold),
                _ => {
                    warn!(option = %key, "ignoring unknown format option");
                    false
                }
            };
        }
    }
}

fn set_bool(key: &str, value: &toml::Value, slot: &mut bool) -> bool {
    if let toml::Value::Boolean(b) = value {
        *slot = *b;
        return true;
    }
    warn!(option = key, %value, "expected a boolean, keeping default");
    false
}

fn set_usize(key: &str, value: &toml::Value, slot: &mut usize) -> bool {
    if let Some(n) = value.as_integer().and_then(|n| usize::try_from(n).ok()) {
        *slot = n;
        return true;
    }
    warn!(option = key, %value, "expected a non-negative integer, keeping default");
    false
}

fn set_enum<T>(key: &str, value: &toml::Value, slot: &mut T) -> bool
where
    T: for<'de> Deserialize<'de>,
{
    match value.clone().try_into::<T>() {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => {
            warn!(option = key, %value, "unrecognized value, keeping default");
            false
        }
    }
}

/// Load sqlstyle configuration for the given input paths. Searches parent
/// directories for sqlstyle.toml or pyproject.toml if no config path is given.
pub fn load_config(files: &[PathBuf], config_path: Option<&Path>) -> Result<Mode> {
    let mut mode = Mode::default();

    let config_file = match config_path {
        Some(path) => {
            if path.exists() {
                Some(path.to_path_buf())
            } else {
                return Err(SqlstyleError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }
        None => find_config_file(files),
    };

    if let Some(path) = config_file {
        debug!(path = %path.display(), "loading config");
        let raw = load_config_from_path(&path)?;
        apply_config(&mut mode, &raw)?;
    }

    Ok(mode)
}

fn find_config_file(files: &[PathBuf]) -> Option<PathBuf> {
    for parent in get_common_parents(files) {
        for name in ["sqlstyle.toml", "pyproject.toml"] {
            let config = parent.join(name);
            if config.is_file() && (name == "sqlstyle.toml" || has_tool_section(&config)) {
                return Some(config);
            }
        }
    }
    None
}

fn has_tool_section(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|c| c.parse::<toml::Value>().ok())
        .is_some_and(|v| v.get("tool").and_then(|t| t.get("sqlstyle")).is_some())
}

/// Parent directories of the given paths, most specific first.
fn get_common_parents(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut parents = Vec::new();

    for file in files {
        let parent = if file.is_dir() {
            file.clone()
        } else {
            file.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        };
        let parent = parent.canonicalize().unwrap_or(parent);

        let mut current = Some(parent.as_path());
        while let Some(dir) = current {
            let dir_buf = dir.to_path_buf();
            if !parents.contains(&dir_buf) {
                parents.push(dir_buf);
            }
            current = dir.parent();
        }
    }

    parents
}

fn load_config_from_path(path: &Path) -> Result<HashMap<String, toml::Value>> {
    let content = std::fs::read_to_string(path)?;
    let parsed: toml::Value = content
        .parse()
        .map_err(|e| SqlstyleError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    let is_pyproject = path
        .file_name()
        .is_some_and(|n| n == "pyproject.toml");
    let section = if is_pyproject {
        parsed.get("tool").and_then(|t| t.get("sqlstyle"))
    } else {
        Some(&parsed)
    };

    match section {
        Some(toml::Value::Table(table)) => Ok(table
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect()),
        _ => Ok(HashMap::new()),
    }
}

fn apply_config(mode: &mut Mode, config: &HashMap<String, toml::Value>) -> Result<()> {
    for key in config.keys() {
        if !["exclude", "fast", "format"].contains(&key.as_str()) {
            return Err(SqlstyleError::Config(format!("Unknown config option: {}", key)));
        }
    }

    if let Some(toml::Value::Array(arr)) = config.get("exclude") {
        mode.exclude = arr
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
    }

    if let Some(toml::Value::Boolean(b)) = config.get("fast") {
        mode.fast = *b;
    }

    match config.get("format") {
        Some(toml::Value::Table(table)) => {
            let table: HashMap<String, toml::Value> = table
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect();
            mode.formatter.apply_format_table(&table);
        }
        Some(_) => {
            return Err(SqlstyleError::Config("`format` must be a table".to_string()));
        }
        None => {}
    }

    Ok(())
}
