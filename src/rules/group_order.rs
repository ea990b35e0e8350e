use crate::annotation::{Hint, Role};
use crate::config::FormatterConfig;
use crate::state::FormatterState;
use crate::token::Token;

/// GROUP BY and ORDER BY: long lists stack one item per line.
pub fn apply(_token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    if state.role == Role::ListComma && state.metrics.items > config.list_stack_threshold {
        return Hint::break_after(state.base_indent + 1);
    }
    Hint::default()
}
