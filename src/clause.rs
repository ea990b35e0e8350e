use crate::token::Token;

/// The clause region a token belongs to. `GROUP` and `GROUP BY` (likewise
/// `ORDER`/`ORDER BY`) both map to the single two-word variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Clause {
    #[default]
    None,
    With,
    Select,
    From,
    Join,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
    Fetch,
    SetOperator,
    Insert,
    Values,
    Update,
    Set,
    Delete,
    Merge,
    Using,
    On,
    Returning,
}

impl Clause {
    /// Parse a clause name such as `"group by"`, `"GROUP"` or `"where"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut words = name.split_whitespace();
        let first = words.next()?.to_ascii_uppercase();
        let second = words.next().map(str::to_ascii_uppercase);
        if words.next().is_some() {
            return None;
        }
        let clause = match (first.as_str(), second.as_deref()) {
            ("GROUP", None | Some("BY")) => Self::GroupBy,
            ("ORDER", None | Some("BY")) => Self::OrderBy,
            (_, Some(_)) => return None,
            ("WITH", None) => Self::With,
            ("SELECT", None) => Self::Select,
            ("FROM", None) => Self::From,
            ("JOIN", None) => Self::Join,
            ("WHERE", None) => Self::Where,
            ("HAVING", None) => Self::Having,
            ("LIMIT", None) => Self::Limit,
            ("OFFSET", None) => Self::Offset,
            ("FETCH", None) => Self::Fetch,
            ("UNION" | "INTERSECT" | "EXCEPT", None) => Self::SetOperator,
            ("INSERT", None) => Self::Insert,
            ("VALUES", None) => Self::Values,
            ("UPDATE", None) => Self::Update,
            ("SET", None) => Self::Set,
            ("DELETE", None) => Self::Delete,
            ("MERGE", None) => Self::Merge,
            ("USING", None) => Self::Using,
            ("ON", None) => Self::On,
            ("RETURNING", None) => Self::Returning,
            _ => return None,
        };
        Some(clause)
    }

    /// Clause introduced by a keyword token, ignoring context.
    pub fn from_token(token: &Token) -> Option<Self> {
        if token.token_type != crate::token::TokenType::Keyword {
            return None;
        }
        Self::from_name(&token.text)
    }

    /// Whether this clause begins a new statement kind.
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            Self::With | Self::Select | Self::Insert | Self::Update | Self::Delete | Self::Merge
        )
    }

    /// Keywords that end this clause at nesting depth zero. A bare `;`,
    /// an unmatched `)` and end of input end every clause.
    pub fn terminators(self) -> &'static [&'static str] {
        match self {
            Self::Select => &[
                "FROM", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "FETCH", "UNION",
                "INTERSECT", "EXCEPT", "WINDOW", "FOR",
            ],
            Self::Where => &[
                "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "FETCH", "UNION", "INTERSECT",
                "EXCEPT", "WINDOW", "FOR", "RETURNING", "OUTPUT",
            ],
            Self::GroupBy => &[
                "HAVING", "ORDER", "UNION", "INTERSECT", "EXCEPT", "FOR", "LIMIT", "OFFSET",
                "FETCH", "WINDOW",
            ],
            Self::OrderBy => &[
                "UNION", "INTERSECT", "EXCEPT", "FOR", "LIMIT", "OFFSET", "FETCH",
            ],
            Self::Set => &["FROM", "WHERE", "RETURNING", "OUTPUT", "WHEN"],
            Self::Values => &[
                "ON", "RETURNING", "OUTPUT", "WHEN", "ORDER", "LIMIT", "UNION", "INTERSECT",
                "EXCEPT",
            ],
            Self::Insert => &["VALUES", "SELECT", "WITH", "DEFAULT", "OUTPUT"],
            _ => &[],
        }
    }
}
