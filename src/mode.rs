use crate::config::FormatterConfig;

/// Runner options for one sqlstyle invocation plus the formatter options
/// applied to every file.
#[derive(Debug, Clone, Default)]
pub struct Mode {
    pub check: bool,

    pub diff: bool,

    /// Skip the token equivalence check.
    pub fast: bool,

    /// Glob patterns to exclude.
    pub exclude: Vec<String>,

    pub verbose: bool,

    pub quiet: bool,

    pub formatter: FormatterConfig,
}

impl Mode {
    /// Whether the safety check should be performed.
    pub fn should_safety_check(&self) -> bool {
        !self.fast && !self.check && !self.diff
    }

    /// SQL file extensions to process.
    pub fn sql_extensions(&self) -> &[&str] {
        &["sql", "ddl", "dml"]
    }
}
