//! WHERE layout. Four axes are decided independently: placement of the
//! WHERE keyword, condition stacking with AND/OR position, BETWEEN layout
//! and IN-list layout. Nested BETWEEN and IN lines sit one unit deeper than
//! the condition lines so they never collide with connective lines.

use crate::annotation::{Hint, Role};
use crate::config::{AndOrPosition, FormatterConfig, ListStyle};
use crate::state::FormatterState;
use crate::token::Token;

pub fn apply(_token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    let condition_indent = state.base_indent + config.where_and_or_indent;
    let conditions = config.where_condition_style;
    let between = config.where_between_style;
    let in_list = config.effective_where_in_list_style();

    match state.role {
        Role::ClauseKeyword => {
            let mut hint = Hint::default();
            if config.where_newline {
                hint.break_before = Some(state.base_indent);
            }
            if conditions == ListStyle::StackedIndent {
                hint.break_after = Some(condition_indent);
            }
            hint
        }
        Role::Connective if !conditions.is_inline() => match config.and_or_position {
            AndOrPosition::Leading => Hint::break_before(condition_indent),
            AndOrPosition::Trailing => Hint::break_after(condition_indent),
        },
        Role::BetweenLower if between == ListStyle::StackedIndent => {
            Hint::break_before(state.between_indent.max(condition_indent) + 1)
        }
        Role::BetweenAnd if !between.is_inline() => {
            Hint::break_before(state.between_indent.max(condition_indent) + 1)
        }
        Role::InListOpen if in_list == ListStyle::StackedIndent => {
            Hint::break_after(state.line_indent.max(condition_indent) + 1)
        }
        Role::InListComma if !in_list.is_inline() => {
            Hint::break_after(state.paren_line_indent().max(condition_indent) + 1)
        }
        Role::InListClose if in_list == ListStyle::StackedIndent => {
            Hint::break_before(state.paren_line_indent().max(condition_indent))
        }
        _ => Hint::default(),
    }
}
