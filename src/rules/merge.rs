use crate::annotation::{Hint, Role};
use crate::config::{FormatterConfig, MergeStyle};
use crate::state::FormatterState;
use crate::token::Token;

pub fn apply(_token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    match state.role {
        Role::MergeWhen if config.merge_when_newline => Hint::break_before(state.base_indent),
        Role::MergeThen if config.merge_style == MergeStyle::Expanded => {
            Hint::break_after(state.base_indent + 1)
        }
        _ => Hint::default(),
    }
}
