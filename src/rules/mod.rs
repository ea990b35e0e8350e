//! Rule engine. Each rule is a pure function of the current token, the
//! driver's read-only state and the configuration, returning a partial
//! [`Hint`]. Rules never look at neighbouring tokens; anything they need
//! about the surrounding clause was recorded by the segmenter as a role or
//! as clause metrics.

pub mod delete;
pub mod group_order;
pub mod insert;
pub mod merge;
pub mod select;
pub mod update;
pub mod where_clause;

use crate::annotation::{Hint, Role, SpaceHint};
use crate::clause::Clause;
use crate::config::FormatterConfig;
use crate::state::FormatterState;
use crate::token::{Token, TokenType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Indentation,
    Spacing,
    Casing,
    Select,
    Insert,
    Update,
    Delete,
    Merge,
    Where,
    GroupOrder,
}

/// Rules applied to every token, in order.
pub const BASE_RULES: [Rule; 3] = [Rule::Indentation, Rule::Spacing, Rule::Casing];

impl Rule {
    /// Statement-specific rule for the clause the driver is in.
    pub fn for_clause(clause: Clause) -> Option<Rule> {
        match clause {
            Clause::Select => Some(Rule::Select),
            Clause::Insert | Clause::Values => Some(Rule::Insert),
            Clause::Update | Clause::Set => Some(Rule::Update),
            Clause::Delete => Some(Rule::Delete),
            Clause::Merge | Clause::Using | Clause::On => Some(Rule::Merge),
            Clause::Where => Some(Rule::Where),
            Clause::GroupBy | Clause::OrderBy => Some(Rule::GroupOrder),
            _ => None,
        }
    }

    pub fn apply(self, token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
        match self {
            Rule::Indentation => indentation(state, config),
            Rule::Spacing => spacing(token, state),
            Rule::Casing => casing(token, config),
            Rule::Select => select::apply(token, state, config),
            Rule::Insert => insert::apply(token, state, config),
            Rule::Update => update::apply(token, state, config),
            Rule::Delete => delete::apply(token, state, config),
            Rule::Merge => merge::apply(token, state, config),
            Rule::Where => where_clause::apply(token, state, config),
            Rule::GroupOrder => group_order::apply(token, state, config),
        }
    }
}

/// Compose the base rules with the clause rule; later rules win.
pub fn apply_rules(token: &Token, state: &FormatterState, config: &FormatterConfig) -> Hint {
    let base = BASE_RULES
        .iter()
        .fold(Hint::default(), |hint, rule| hint.then(rule.apply(token, state, config)));
    match Rule::for_clause(state.clause) {
        Some(rule) => base.then(rule.apply(token, state, config)),
        None => base,
    }
}

fn indentation(state: &FormatterState, config: &FormatterConfig) -> Hint {
    match state.role {
        // WHERE placement belongs to the WHERE rule.
        role if role.starts_clause() && state.clause != Clause::Where => {
            Hint::break_before(state.base_indent)
        }
        Role::SubqueryOpen => Hint::break_after(state.line_indent + config.subquery_indent),
        Role::SubqueryClose => Hint::break_before(state.paren_line_indent()),
        Role::CaseBranch => Hint::break_before(state.case_line_indent() + config.case_indent),
        Role::CaseEnd => Hint::break_before(state.case_line_indent()),
        Role::StatementEnd => Hint {
            blank_line_after: true,
            ..Hint::break_after(0)
        },
        _ => Hint::default(),
    }
}

fn spacing(token: &Token, state: &FormatterState) -> Hint {
    if state.role == Role::ColumnListOpen {
        return Hint {
            space_before: Some(SpaceHint::Always),
            ..Hint::default()
        };
    }
    if token.token_type == TokenType::Operator && token.text == "::" {
        return Hint {
            space_before: Some(SpaceHint::Never),
            space_after: Some(SpaceHint::Never),
            ..Hint::default()
        };
    }
    Hint::default()
}

fn casing(token: &Token, config: &FormatterConfig) -> Hint {
    if token.token_type != TokenType::Keyword {
        return Hint::default();
    }
    Hint {
        keyword_case: Some(config.keyword_case),
        ..Hint::default()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::config::KeywordCase;

    #[test]
    fn test_clause_keyword_breaks_at_base() {
        let mut s = state(Clause::From, Role::ClauseKeyword);
        s.base_indent = 2;
        let hint = apply_rules(&keyword("from"), &s, &FormatterConfig::default());
        assert_eq!(hint.break_before, Some(2));
        assert_eq!(hint.keyword_case, Some(KeywordCase::Upper));
    }

    #[test]
    fn test_where_keyword_left_to_where_rule() {
        let s = state(Clause::Where, Role::ClauseKeyword);
        let config = FormatterConfig {
            where_newline: false,
            ..FormatterConfig::default()
        };
        assert_eq!(indentation(&s, &config).break_before, None);
        assert_eq!(apply_rules(&keyword("WHERE"), &s, &config).break_before, None);
    }

    #[test]
    fn test_subquery_parens() {
        let mut s = state(Clause::From, Role::SubqueryOpen);
        s.line_indent = 1;
        let config = FormatterConfig::default();
        assert_eq!(indentation(&s, &config).break_after, Some(2));

        s.role = Role::SubqueryClose;
        assert_eq!(indentation(&s, &config).break_before, Some(1));
    }

    #[test]
    fn test_case_branches() {
        let mut s = state(Clause::Select, Role::CaseBranch);
        s.cases.push(1);
        let config = FormatterConfig {
            case_indent: 2,
            ..FormatterConfig::default()
        };
        assert_eq!(indentation(&s, &config).break_before, Some(3));
        s.role = Role::CaseEnd;
        assert_eq!(indentation(&s, &config).break_before, Some(1));
    }

    #[test]
    fn test_statement_end() {
        let s = state(Clause::Select, Role::StatementEnd);
        let hint = indentation(&s, &FormatterConfig::default());
        assert_eq!(hint.break_after, Some(0));
        assert!(hint.blank_line_after);
    }

    #[test]
    fn test_cast_operator_spacing() {
        let s = state(Clause::Select, Role::None);
        let hint = spacing(&punct(TokenType::Operator, "::"), &s);
        assert_eq!(hint.space_before, Some(SpaceHint::Never));
        assert_eq!(hint.space_after, Some(SpaceHint::Never));
        let hint = spacing(&punct(TokenType::Operator, "="), &s);
        assert_eq!(hint, Hint::default());
    }

    #[test]
    fn test_casing_only_keywords() {
        let config = FormatterConfig::default().with_keyword_case(KeywordCase::Lower);
        assert_eq!(casing(&keyword("Select"), &config).keyword_case, Some(KeywordCase::Lower));
        let ident = punct(TokenType::Identifier, "Select");
        assert_eq!(casing(&ident, &config).keyword_case, None);
    }

    #[test]
    fn test_rule_for_clause() {
        assert_eq!(Rule::for_clause(Clause::Values), Some(Rule::Insert));
        assert_eq!(Rule::for_clause(Clause::Set), Some(Rule::Update));
        assert_eq!(Rule::for_clause(Clause::On), Some(Rule::Merge));
        assert_eq!(Rule::for_clause(Clause::OrderBy), Some(Rule::GroupOrder));
        assert_eq!(Rule::for_clause(Clause::From), None);
    }
}
