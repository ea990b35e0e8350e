use crate::annotation::{Hint, Role};
use crate::config::FormatterConfig;
use crate::state::FormatterState;
use crate::token::Token;

pub fn apply(_token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    if state.role == Role::DeleteMissingFrom && config.delete_from_keyword {
        return Hint {
            insert_after: Some("FROM"),
            ..Hint::default()
        };
    }
    Hint::default()
}
