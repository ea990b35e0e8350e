use tracing::debug;

use crate::align;
use crate::annotation::{Annotation, Role, SpaceHint};
use crate::clause::Clause;
use crate::config::FormatterConfig;
use crate::lexer::tokenize;
use crate::output;
use crate::rules;
use crate::segment::{self, Segmentation};
use crate::state::{ClauseMetrics, FormatterState, ParenFrame};
use crate::token::{Token, TokenType};

/// Format SQL source text. Total: malformed input is formatted as far as
/// its tokens allow and never produces an error.
///
/// The pipeline:
///   1. Tokenize
///   2. Segment clauses and assign token roles
///   3. Annotate each token through the rule engine
///   4. Emit lines
///   5. Align alias and assignment columns
pub fn format(source: &str, config: &FormatterConfig) -> String {
    let tokens = tokenize(source);
    debug!(tokens = tokens.len(), "tokenized");
    if tokens.is_empty() {
        return String::new();
    }

    let segmentation = segment::analyze(&tokens);
    debug!(clauses = segmentation.clauses.len(), "segmented");

    let annotations = annotate(&tokens, &segmentation, config);
    let mut lines = output::emit(&tokens, &annotations);
    align::align(&mut lines, config.indent_width);
    debug!(lines = lines.len(), "emitted");

    output::render(&lines, config.indent_width)
}

/// Run the rule engine over every token, threading the driver state and
/// resolving break-after hints into the next token's line break.
pub fn annotate(
    tokens: &[Token],
    segmentation: &Segmentation,
    config: &FormatterConfig,
) -> Vec<Annotation> {
    let mut driver = Driver {
        config,
        segmentation,
        state: FormatterState::new(),
        pending: None,
        pending_blank: false,
        prev_end_line: None,
    };
    tokens
        .iter()
        .enumerate()
        .map(|(i, token)| driver.annotate(i, token))
        .collect()
}

struct Driver<'a> {
    config: &'a FormatterConfig,
    segmentation: &'a Segmentation,
    state: FormatterState,
    /// Indent for the next token's line, from a break-after hint.
    pending: Option<usize>,
    pending_blank: bool,
    /// Last source line of the previous token.
    prev_end_line: Option<usize>,
}

impl Driver<'_> {
    fn annotate(&mut self, i: usize, token: &Token) -> Annotation {
        let role = self
            .segmentation
            .roles
            .get(i)
            .copied()
            .unwrap_or(Role::None);
        let first = self.prev_end_line.is_none();
        let annotation = if token.token_type.is_comment() {
            self.comment(token, role, first)
        } else {
            self.code(i, token, role, first)
        };
        self.prev_end_line = Some(token.end_line());
        annotation
    }

    fn start_line(&mut self, annotation: &mut Annotation, indent: usize) {
        annotation.break_before = true;
        annotation.indent = indent;
        annotation.blank_line_before = std::mem::take(&mut self.pending_blank);
        self.state.line_indent = indent;
    }

    /// Comments follow the layout around them and never trigger rules.
    fn comment(&mut self, token: &Token, role: Role, first: bool) -> Annotation {
        let mut annotation = Annotation {
            role,
            ..Annotation::default()
        };
        let own_line = self.prev_end_line.map_or(true, |prev| token.line > prev);
        if own_line && !first {
            let indent = self.pending.take().unwrap_or(self.state.line_indent);
            self.start_line(&mut annotation, indent);
        }
        if token.token_type == TokenType::LineComment {
            annotation.break_after = true;
            if self.pending.is_none() {
                let continuation = if own_line { 0 } else { 1 };
                self.pending = Some(self.state.line_indent + continuation);
            }
        }
        annotation
    }

    fn code(&mut self, i: usize, token: &Token, role: Role, first: bool) -> Annotation {
        self.enter(i, role);

        let hint = rules::apply_rules(token, &self.state, self.config);
        let mut annotation = Annotation {
            role,
            align_group: hint.align_group,
            space_before: hint.space_before.unwrap_or(SpaceHint::Auto),
            space_after: hint.space_after.unwrap_or(SpaceHint::Auto),
            keyword_case: hint.keyword_case,
            insert_after: hint.insert_after,
            break_after: hint.break_after.is_some(),
            ..Annotation::default()
        };

        let pending = self.pending.take();
        match hint.break_before.or(pending) {
            Some(indent) if !first => self.start_line(&mut annotation, indent),
            _ => self.pending_blank = false,
        }
        if hint.break_after.is_some() {
            self.pending = hint.break_after;
        }
        if hint.blank_line_after {
            self.pending_blank = true;
        }

        self.leave(token, role);
        annotation
    }

    /// State changes that the token's own rules must see.
    fn enter(&mut self, i: usize, role: Role) {
        let state = &mut self.state;
        state.role = role;
        if role.starts_clause() {
            if let Some(metrics) = self.segmentation.clauses.get(&i) {
                state.clause = metrics.clause;
                state.metrics = *metrics;
            }
        }
        if role == Role::BetweenKeyword {
            state.between_indent = state.line_indent;
        }
    }

    /// State changes that take effect after the token.
    fn leave(&mut self, token: &Token, role: Role) {
        let config = self.config;
        let state = &mut self.state;
        match token.token_type {
            TokenType::ParenOpen => {
                state.parens.push(ParenFrame {
                    role,
                    line_indent: state.line_indent,
                    outer_clause: state.clause,
                    outer_base: state.base_indent,
                    outer_metrics: state.metrics,
                });
                if role == Role::SubqueryOpen {
                    state.base_indent = state.line_indent + config.subquery_indent;
                    state.clause = Clause::None;
                    state.metrics = ClauseMetrics::default();
                }
            }
            TokenType::ParenClose => {
                if let Some(frame) = state.parens.pop() {
                    if frame.role == Role::SubqueryOpen {
                        state.clause = frame.outer_clause;
                        state.base_indent = frame.outer_base;
                        state.metrics = frame.outer_metrics;
                    }
                }
            }
            TokenType::Semicolon => state.reset_statement(),
            _ => match role {
                Role::CaseOpen => state.cases.push(state.line_indent),
                Role::CaseEnd => {
                    state.cases.pop();
                }
                _ => {}
            },
        }
    }
}
