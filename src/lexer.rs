use memchr::{memchr, memchr_iter, memrchr};

use crate::keywords;
use crate::token::{Token, TokenType};

/// Tokenize SQL source. Never fails: anything the scanners do not
/// recognize becomes a one-character `Unknown` token, and unterminated
/// strings, identifiers and comments run to end of input.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    lexer.run();
    lexer.tokens
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    line_start: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            line_start: 0,
            tokens: Vec::with_capacity(source.len() / 4),
        }
    }

    fn run(&mut self) {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == b'\n' {
                self.pos += 1;
                self.line += 1;
                self.line_start = self.pos;
                continue;
            }
            if b.is_ascii_whitespace() {
                self.pos += skip_prefix_whitespace(&self.bytes[self.pos..]);
                continue;
            }
            if b >= 0x80 {
                let c = self.source[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                if c.is_whitespace() {
                    self.pos += c.len_utf8();
                    continue;
                }
            }

            let (token_type, len) = self.next_token();
            self.push(token_type, len);
        }
    }

    /// Classify the token starting at `self.pos` and return its byte length.
    fn next_token(&self) -> (TokenType, usize) {
        let rest = &self.bytes[self.pos..];
        let b = rest[0];
        let next = rest.get(1).copied();

        match b {
            b'-' if next == Some(b'-') => (TokenType::LineComment, scan_line_comment(rest)),
            b'/' if next == Some(b'*') => (TokenType::BlockComment, scan_block_comment(rest)),
            b'0'..=b'9' => scan_numeric(rest),
            b'.' if starts_fraction(rest) && self.operand_expected() => {
                (TokenType::Number, scan_number(rest))
            }
            b'-' if self.operand_expected() && starts_unsigned_number(&rest[1..]) => {
                let n = scan_number(&rest[1..]);
                if is_digit_run_into_word(&rest[1..], n) {
                    (TokenType::Operator, 1)
                } else {
                    (TokenType::Number, n + 1)
                }
            }
            b'\'' => (TokenType::String, scan_quoted(rest, b'\'')),
            b'N' | b'n' if next == Some(b'\'') => {
                (TokenType::String, 1 + scan_quoted(&rest[1..], b'\''))
            }
            b'"' => (TokenType::QuotedIdentifier, scan_quoted(rest, b'"')),
            b'`' => (TokenType::QuotedIdentifier, scan_quoted(rest, b'`')),
            b'[' => (TokenType::BracketedIdentifier, scan_bracketed(rest)),
            b'(' => (TokenType::ParenOpen, 1),
            b')' => (TokenType::ParenClose, 1),
            b',' => (TokenType::Comma, 1),
            b';' => (TokenType::Semicolon, 1),
            b'.' => (TokenType::Dot, 1),
            b'@' | b'#' | b'$' | b':' if sigil_starts_name(rest) => {
                let sigils = rest.iter().take_while(|&&c| c == b).count();
                let word = scan_word(&self.source[self.pos + sigils..]);
                (TokenType::Identifier, sigils + word)
            }
            _ => {
                let c = self.source[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                if c.is_alphabetic() || c == '_' {
                    let len = scan_word(&self.source[self.pos..]);
                    let word = &self.source[self.pos..self.pos + len];
                    if keywords::is_keyword(word) {
                        (TokenType::Keyword, len)
                    } else {
                        (TokenType::Identifier, len)
                    }
                } else if let Some(len) = scan_operator(rest) {
                    (TokenType::Operator, len)
                } else {
                    (TokenType::Unknown, c.len_utf8())
                }
            }
        }
    }

    /// True when the previous significant token leaves an operand slot
    /// open, so `-5` and `.5` are literals rather than operator/member access.
    fn operand_expected(&self) -> bool {
        let prev = self
            .tokens
            .iter()
            .rev()
            .find(|t| !t.token_type.is_comment());
        operand_slot_after(prev.map(|t| (t.token_type, t.text.as_str())))
    }

    fn push(&mut self, token_type: TokenType, len: usize) {
        let start = self.pos;
        let end = (start + len).min(self.bytes.len());
        let text = &self.source[start..end];
        let col = self.source[self.line_start..start].chars().count() + 1;
        self.tokens.push(Token::new(token_type, text, self.line, col));

        let newlines = memchr_iter(b'\n', text.as_bytes()).count();
        if newlines > 0 {
            self.line += newlines;
            if let Some(last) = memrchr(b'\n', text.as_bytes()) {
                self.line_start = start + last + 1;
            }
        }
        self.pos = end;
    }
}

/// Whether an operand may start after the given significant token (`None`
/// at the start of input). The output stage uses the same test to keep
/// `.` and a following digit apart.
pub(crate) fn operand_slot_after(prev: Option<(TokenType, &str)>) -> bool {
    match prev {
        None => true,
        Some((TokenType::Keyword, text)) => !keywords::is_operand_keyword(text),
        Some((token_type, _)) => !token_type.ends_operand(),
    }
}

// ---- Helper: skip leading non-newline whitespace ----

/// Returns the byte length of leading non-newline ASCII whitespace.
#[inline]
fn skip_prefix_whitespace(bytes: &[u8]) -> usize {
    let mut i = 0;
    while i < bytes.len() && bytes[i] != b'\n' && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '#' || c == '@'
}

/// Scan an identifier or keyword. Returns byte length.
#[inline]
fn scan_word(s: &str) -> usize {
    s.char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// `@var`, `@@ROWCOUNT`, `#temp`, `$1`, `:bind`.
fn sigil_starts_name(bytes: &[u8]) -> bool {
    let sigil = bytes[0];
    let mut i = 1;
    if sigil == b'@' && bytes.get(1) == Some(&b'@') {
        i = 2;
    }
    match bytes.get(i) {
        Some(&c) => c.is_ascii_alphanumeric() || c == b'_' || c >= 0x80,
        None => false,
    }
}

#[inline]
fn starts_fraction(bytes: &[u8]) -> bool {
    bytes.len() > 1 && bytes[0] == b'.' && bytes[1].is_ascii_digit()
}

#[inline]
fn starts_unsigned_number(bytes: &[u8]) -> bool {
    match bytes.first() {
        Some(b) if b.is_ascii_digit() => true,
        Some(b'.') => starts_fraction(bytes),
        _ => false,
    }
}

/// Scan a number: digits, at most one `.` that is followed by a digit,
/// and an optional exponent. A leading `.` is allowed when a digit follows.
/// Returns byte length.
fn scan_number(bytes: &[u8]) -> usize {
    let len = bytes.len();
    let mut i = 0;

    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }

    if i + 1 < len && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
        i += 1;
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }

    if i > 0 && i < len && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < len && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < len && bytes[j].is_ascii_digit() {
            i = j;
            while i < len && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    i
}

/// A plain digit run glued to a word character (`123table`) is a name.
fn is_digit_run_into_word(bytes: &[u8], n: usize) -> bool {
    let digits_only = bytes[..n].iter().all(u8::is_ascii_digit);
    let glued = match bytes.get(n) {
        Some(&c) => c.is_ascii_alphabetic() || c == b'_' || c >= 0x80,
        None => false,
    };
    digits_only && glued
}

/// Scan at a leading digit: a number, or an identifier when the digits run
/// straight into letters.
fn scan_numeric(bytes: &[u8]) -> (TokenType, usize) {
    let n = scan_number(bytes);
    if is_digit_run_into_word(bytes, n) {
        // Digits and word bytes are ASCII or complete UTF-8 sequences, so
        // the byte scan ends on a char boundary.
        let mut i = n;
        while i < bytes.len() {
            let c = bytes[i];
            if c.is_ascii_alphanumeric() || c == b'_' || c == b'$' || c == b'#' || c == b'@' {
                i += 1;
            } else if c >= 0x80 {
                i += utf8_len(c);
            } else {
                break;
            }
        }
        (TokenType::Identifier, i.min(bytes.len()))
    } else {
        (TokenType::Number, n)
    }
}

#[inline]
fn utf8_len(lead: u8) -> usize {
    match lead {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

/// Scan a quoted run (`'...'`, `"..."`, `` `...` ``) where a doubled
/// delimiter escapes itself. Returns byte length including delimiters.
fn scan_quoted(bytes: &[u8], quote: u8) -> usize {
    let mut i = 1;
    while i < bytes.len() {
        match memchr(quote, &bytes[i..]) {
            Some(offset) => {
                let pos = i + offset;
                if bytes.get(pos + 1) == Some(&quote) {
                    i = pos + 2;
                    continue;
                }
                return pos + 1;
            }
            None => return bytes.len(),
        }
    }
    bytes.len()
}

/// Scan `[name]`, where `]]` escapes a closing bracket.
fn scan_bracketed(bytes: &[u8]) -> usize {
    let mut i = 1;
    while i < bytes.len() {
        match memchr(b']', &bytes[i..]) {
            Some(offset) => {
                let pos = i + offset;
                if bytes.get(pos + 1) == Some(&b']') {
                    i = pos + 2;
                    continue;
                }
                return pos + 1;
            }
            None => return bytes.len(),
        }
    }
    bytes.len()
}

/// Scan a `--` comment up to (not including) the line break.
fn scan_line_comment(bytes: &[u8]) -> usize {
    let end = memchr(b'\n', bytes).unwrap_or(bytes.len());
    if end > 0 && bytes[end - 1] == b'\r' {
        end - 1
    } else {
        end
    }
}

/// Scan a block comment. `bytes` starts at `/*`. Returns byte length including delimiters.
fn scan_block_comment(bytes: &[u8]) -> usize {
    let mut i = 2;
    while i < bytes.len() {
        match memchr(b'*', &bytes[i..]) {
            Some(offset) => {
                let pos = i + offset;
                if bytes.get(pos + 1) == Some(&b'/') {
                    return pos + 2;
                }
                i = pos + 1;
            }
            None => return bytes.len(),
        }
    }
    bytes.len()
}

const THREE_CHAR_OPERATORS: &[&[u8]] = &[b"->>", b"<=>"];
const TWO_CHAR_OPERATORS: &[&[u8]] = &[
    b"<=", b">=", b"<>", b"!=", b"!<", b"!>", b"==", b"||", b"::", b"->", b"=>", b"<<", b">>",
];

fn scan_operator(bytes: &[u8]) -> Option<usize> {
    if THREE_CHAR_OPERATORS.iter().any(|op| bytes.starts_with(op)) {
        return Some(3);
    }
    if TWO_CHAR_OPERATORS.iter().any(|op| bytes.starts_with(op)) {
        return Some(2);
    }
    match bytes[0] {
        b'+' | b'-' | b'*' | b'/' | b'%' | b'=' | b'<' | b'>' | b'!' | b'~' | b'^' | b'&'
        | b'|' | b'?' | b':' | b'@' => Some(1),
        _ => None,
    }
}
