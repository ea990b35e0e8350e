use crate::annotation::{Hint, Role};
use crate::clause::Clause;
use crate::config::{FormatterConfig, Layout};
use crate::state::FormatterState;
use crate::token::Token;

/// Whether a single VALUES row is laid out one value per line.
fn single_row_stacked(state: &FormatterState, config: &FormatterConfig) -> bool {
    state.metrics.rows == 1
        && (config.insert_values_style == Layout::Stacked
            || state.metrics.row_width > config.values_stack_threshold)
}

pub fn apply(_token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    let base = state.base_indent;
    let stacked_columns = config.insert_columns_style == Layout::Stacked;
    match state.role {
        Role::InsertMissingInto if config.insert_into_keyword => Hint {
            insert_after: Some("INTO"),
            ..Hint::default()
        },
        Role::ColumnListOpen | Role::ColumnListComma if stacked_columns => {
            Hint::break_after(base + 1)
        }
        Role::ColumnListClose if stacked_columns => Hint::break_before(base),
        Role::ClauseKeyword
            if state.clause == Clause::Values
                && state.metrics.rows > 1
                && config.insert_multi_row_style == Layout::Stacked =>
        {
            Hint::break_after(base + 1)
        }
        Role::ValueRowSeparator => Hint::break_after(base + 1),
        Role::ValueRowOpen | Role::ValueComma if single_row_stacked(state, config) => {
            Hint::break_after(base + 1)
        }
        Role::ValueRowClose if single_row_stacked(state, config) => Hint::break_before(base),
        _ => Hint::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::test_support::*;
    use crate::token::TokenType;

    fn values_state(role: Role, rows: usize, row_width: usize) -> FormatterState {
        let mut s = state(Clause::Values, role);
        s.metrics.rows = rows;
        s.metrics.row_width = row_width;
        s
    }

    #[test]
    fn test_missing_into_inserted() {
        let s = state(Clause::Insert, Role::InsertMissingInto);
        let hint = apply(&keyword("insert"), &s, &FormatterConfig::default());
        assert_eq!(hint.insert_after, Some("INTO"));

        let config = FormatterConfig {
            insert_into_keyword: false,
            ..FormatterConfig::default()
        };
        assert_eq!(apply(&keyword("insert"), &s, &config).insert_after, None);
    }

    #[test]
    fn test_stacked_columns() {
        let config = FormatterConfig {
            insert_columns_style: Layout::Stacked,
            ..FormatterConfig::default()
        };
        let open = punct(TokenType::ParenOpen, "(");
        let s = state(Clause::Insert, Role::ColumnListOpen);
        assert_eq!(apply(&open, &s, &config).break_after, Some(1));
        assert_eq!(apply(&open, &s, &FormatterConfig::default()), Hint::default());

        let close = punct(TokenType::ParenClose, ")");
        let s = state(Clause::Insert, Role::ColumnListClose);
        assert_eq!(apply(&close, &s, &config).break_before, Some(0));
    }

    #[test]
    fn test_multi_row_always_breaks_between_rows() {
        let comma = punct(TokenType::Comma, ",");
        let s = values_state(Role::ValueRowSeparator, 2, 2);
        for style in [Layout::Inline, Layout::Stacked] {
            let config = FormatterConfig {
                insert_values_style: style,
                insert_multi_row_style: style,
                ..FormatterConfig::default()
            };
            assert_eq!(apply(&comma, &s, &config).break_after, Some(1));
        }
    }

    #[test]
    fn test_values_keyword_alone_when_multi_row_stacked() {
        let s = values_state(Role::ClauseKeyword, 2, 1);
        let hint = apply(&keyword("VALUES"), &s, &FormatterConfig::default());
        assert_eq!(hint.break_after, Some(1));

        let config = FormatterConfig {
            insert_multi_row_style: Layout::Inline,
            ..FormatterConfig::default()
        };
        assert_eq!(apply(&keyword("VALUES"), &s, &config).break_after, None);

        let single = values_state(Role::ClauseKeyword, 1, 1);
        assert_eq!(apply(&keyword("VALUES"), &single, &FormatterConfig::default()).break_after, None);
    }

    #[test]
    fn test_wide_single_row_stacks() {
        let comma = punct(TokenType::Comma, ",");
        let config = FormatterConfig::default();
        let narrow = values_state(Role::ValueComma, 1, 3);
        assert_eq!(apply(&comma, &narrow, &config).break_after, None);

        let wide = values_state(Role::ValueComma, 1, 4);
        assert_eq!(apply(&comma, &wide, &config).break_after, Some(1));

        let close = values_state(Role::ValueRowClose, 1, 4);
        let paren = punct(TokenType::ParenClose, ")");
        assert_eq!(apply(&paren, &close, &config).break_before, Some(0));
    }
}
