use crate::annotation::{AlignGroup, AlignKind, Hint, Role};
use crate::config::{FormatterConfig, Layout};
use crate::state::FormatterState;
use crate::token::Token;

pub fn apply(_token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    match state.role {
        Role::SelectComma if config.select_list_style == Layout::Stacked => {
            Hint::break_after(state.base_indent + 1)
        }
        Role::AliasAs if config.align_aliases => Hint {
            align_group: Some(AlignGroup {
                kind: AlignKind::Alias,
                id: state.metrics.keyword,
            }),
            ..Hint::default()
        },
        _ => Hint::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Clause;
    use crate::rules::test_support::*;
    use crate::token::TokenType;

    #[test]
    fn test_stacked_select_comma() {
        let mut s = state(Clause::Select, Role::SelectComma);
        s.base_indent = 1;
        let comma = punct(TokenType::Comma, ",");
        let hint = apply(&comma, &s, &FormatterConfig::default());
        assert_eq!(hint.break_after, Some(2));

        let config = FormatterConfig {
            select_list_style: Layout::Inline,
            ..FormatterConfig::default()
        };
        assert_eq!(apply(&comma, &s, &config), Hint::default());
    }

    #[test]
    fn test_alias_alignment_group() {
        let s = state(Clause::Select, Role::AliasAs);
        let as_kw = keyword("AS");
        assert_eq!(apply(&as_kw, &s, &FormatterConfig::default()).align_group, None);

        let config = FormatterConfig::default().with_align_aliases(true);
        let group = apply(&as_kw, &s, &config).align_group.unwrap();
        assert_eq!(group.kind, AlignKind::Alias);
        assert_eq!(group.id, 7);
    }
}
