use smallvec::SmallVec;

use crate::annotation::{AlignGroup, Annotation, SpaceHint};
use crate::config::KeywordCase;
use crate::keywords;
use crate::lexer;
use crate::token::{Token, TokenType};

/// Column anchor recorded while emitting: the byte offset in `Line::text`
/// where an aligned token starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub group: AlignGroup,
    pub offset: usize,
}

/// One output line before indentation is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub indent: usize,
    pub text: String,
    pub anchors: SmallVec<[Anchor; 2]>,
}

impl Line {
    fn new(indent: usize) -> Self {
        Self {
            indent,
            ..Self::default()
        }
    }

    /// Display column of a byte offset, counting the rendered indent.
    pub fn column(&self, offset: usize, indent_width: usize) -> usize {
        self.indent * indent_width + self.text[..offset].chars().count()
    }
}

/// What the spacing table needs to know about the previously emitted token.
#[derive(Debug, Clone, Copy)]
struct Adjacent<'a> {
    token_type: TokenType,
    text: &'a str,
    space_after: SpaceHint,
    /// Emitted where the lexer expects an operand, so a `.` here followed
    /// by a digit would re-lex as a fraction.
    operand_slot: bool,
}

/// Plain integer literal: a following `.` must be separated or it would
/// lex as a fraction.
fn is_integer_literal(token_type: TokenType, text: &str) -> bool {
    token_type == TokenType::Number
        && !text.contains(['.', 'e', 'E'])
}

fn starts_with_digit(token: &Token) -> bool {
    token.token_type == TokenType::Number && token.text.starts_with(|c: char| c.is_ascii_digit())
}

fn needs_space(prev: &Adjacent<'_>, cur: &Token, ann: &Annotation) -> bool {
    if ann.space_before == SpaceHint::Never || prev.space_after == SpaceHint::Never {
        return false;
    }
    if ann.space_before == SpaceHint::Always || prev.space_after == SpaceHint::Always {
        return true;
    }
    if prev.token_type == TokenType::Dot && prev.operand_slot && starts_with_digit(cur) {
        return true;
    }
    if cur.token_type == TokenType::Dot && prev.token_type == TokenType::Operator {
        return true;
    }
    if cur.token_type == TokenType::Dot && is_integer_literal(prev.token_type, prev.text) {
        return true;
    }
    if cur.token_type.is_never_preceded_by_space() || prev.token_type.is_never_followed_by_space() {
        return false;
    }
    if cur.token_type == TokenType::ParenOpen {
        let call = prev.token_type.is_name()
            || (prev.token_type == TokenType::Keyword && keywords::is_function_keyword(prev.text));
        return !call;
    }
    true
}

/// Re-case a keyword token's text.
pub fn keyword_text(text: &str, case: Option<KeywordCase>) -> String {
    match case {
        Some(KeywordCase::Upper) => text.to_ascii_uppercase(),
        Some(KeywordCase::Lower) => text.to_ascii_lowercase(),
        Some(KeywordCase::Preserve) | None => text.to_string(),
    }
}

/// Case an inserted keyword (`INTO`, `FROM`). Under `preserve` it follows
/// the token it is inserted after.
pub fn apply_case(word: &str, case: Option<KeywordCase>, anchor: &str) -> String {
    match case {
        Some(KeywordCase::Lower) => word.to_ascii_lowercase(),
        Some(KeywordCase::Preserve) if anchor.chars().any(|c| c.is_lowercase()) => {
            word.to_ascii_lowercase()
        }
        _ => word.to_ascii_uppercase(),
    }
}

/// Walk annotated tokens once, starting a new line on every
/// `break_before` and joining everything else with the spacing table.
pub fn emit(tokens: &[Token], annotations: &[Annotation]) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut current = Line::new(0);
    let mut prev: Option<Adjacent<'_>> = None;
    let mut last_code: Option<(TokenType, &str)> = None;

    for (token, ann) in tokens.iter().zip(annotations) {
        let text = if token.token_type == TokenType::Keyword {
            keyword_text(&token.text, ann.keyword_case)
        } else {
            token.text.to_string()
        };

        match &prev {
            Some(_) if ann.break_before => {
                lines.push(std::mem::replace(&mut current, Line::new(ann.indent)));
                if ann.blank_line_before {
                    lines.push(Line::default());
                }
            }
            Some(p) if needs_space(p, token, ann) => current.text.push(' '),
            _ => {}
        }

        if let Some(group) = ann.align_group {
            current.anchors.push(Anchor {
                group,
                offset: current.text.len(),
            });
        }
        current.text.push_str(&text);
        prev = Some(Adjacent {
            token_type: token.token_type,
            text: &token.text,
            space_after: ann.space_after,
            operand_slot: lexer::operand_slot_after(last_code),
        });
        if !token.token_type.is_comment() {
            last_code = Some((token.token_type, token.text.as_str()));
        }

        if let Some(word) = ann.insert_after {
            current.text.push(' ');
            current.text.push_str(&apply_case(word, ann.keyword_case, &token.text));
            prev = Some(Adjacent {
                token_type: TokenType::Keyword,
                text: word,
                space_after: SpaceHint::Auto,
                operand_slot: lexer::operand_slot_after(last_code),
            });
            last_code = Some((TokenType::Keyword, word));
        }
    }

    if prev.is_some() {
        lines.push(current);
    }
    lines
}

/// Join lines with `\n`, indenting non-empty lines. No trailing newline.
pub fn render(lines: &[Line], indent_width: usize) -> String {
    let capacity = lines
        .iter()
        .map(|l| l.indent * indent_width + l.text.len() + 1)
        .sum();
    let mut out = String::with_capacity(capacity);
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.text.is_empty() {
            out.extend(std::iter::repeat(' ').take(line.indent * indent_width));
            out.push_str(&line.text);
        }
    }
    out
}
