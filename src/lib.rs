pub mod align;
pub mod annotation;
pub mod api;
pub mod clause;
pub mod config;
pub mod error;
pub mod formatter;
pub mod keywords;
pub mod lexer;
pub mod mode;
pub mod output;
pub mod report;
pub mod rules;
pub mod segment;
pub mod state;
pub mod token;

// Re-export the main public API
pub use api::{format_string, get_matching_paths, run};
pub use config::{load_config, FormatterConfig};
pub use formatter::format;
pub use lexer::tokenize;
pub use mode::Mode;
