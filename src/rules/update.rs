use crate::annotation::{AlignGroup, AlignKind, Hint, Role};
use crate::config::{FormatterConfig, Layout};
use crate::state::FormatterState;
use crate::token::Token;

pub fn apply(_token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    match state.role {
        Role::SetComma if config.update_set_style == Layout::Stacked => {
            Hint::break_after(state.base_indent + 1)
        }
        Role::SetEquals if config.update_set_align => Hint {
            align_group: Some(AlignGroup {
                kind: AlignKind::Assignment,
                id: state.metrics.keyword,
            }),
            ..Hint::default()
        },
        _ => Hint::default(),
    }
}
