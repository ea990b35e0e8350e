use compact_str::CompactString;

/// All token types recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Keyword,
    Identifier,
    /// `[Name]`, delimiters included.
    BracketedIdentifier,
    /// `"Name"` or `` `Name` ``, delimiters included.
    QuotedIdentifier,
    String,
    Number,
    Operator,
    Comma,
    Dot,
    ParenOpen,
    ParenClose,
    Semicolon,
    LineComment,
    BlockComment,
    Unknown,
}

impl TokenType {
    pub fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment)
    }

    pub fn is_name(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::BracketedIdentifier | Self::QuotedIdentifier
        )
    }

    /// Tokens that never have a space before them.
    pub fn is_never_preceded_by_space(self) -> bool {
        matches!(
            self,
            Self::Comma | Self::Dot | Self::Semicolon | Self::ParenClose
        )
    }

    /// Tokens that never have a space after them.
    pub fn is_never_followed_by_space(self) -> bool {
        matches!(self, Self::Dot | Self::ParenOpen)
    }

    /// Whether a token of this type can end an operand, which decides
    /// if a following `-` or `.` may start a signed or fractional number.
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::BracketedIdentifier
                | Self::QuotedIdentifier
                | Self::String
                | Self::Number
                | Self::ParenClose
                | Self::Unknown
        )
    }
}

/// An immutable token produced by the lexer. `line` and `col` are 1-based
/// and count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub text: CompactString,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(token_type: TokenType, text: &str, line: usize, col: usize) -> Self {
        Self {
            token_type,
            text: CompactString::from(text),
            line,
            col,
        }
    }

    /// Case-insensitive keyword test.
    #[inline]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.token_type == TokenType::Keyword && self.text.eq_ignore_ascii_case(word)
    }

    /// Whether this token is any of the given keywords.
    pub fn is_any_keyword(&self, words: &[&str]) -> bool {
        self.token_type == TokenType::Keyword
            && words.iter().any(|w| self.text.eq_ignore_ascii_case(w))
    }

    /// Line of the last character of this token; differs from `line` only
    /// for block comments and strings spanning several lines.
    pub fn end_line(&self) -> usize {
        self.line + self.text.matches('\n').count()
    }
}
