use crate::config::KeywordCase;

/// Structural role of a token inside its clause, assigned by the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    #[default]
    None,
    /// First keyword of a clause at statement depth.
    ClauseKeyword,
    /// `INSERT` whose target is not preceded by `INTO`.
    InsertMissingInto,
    /// `DELETE` with no `FROM` anywhere in its statement.
    DeleteMissingFrom,
    /// Remaining words of a multi-word clause keyword (`BY`, `ALL`, `JOIN`).
    ClauseKeywordTail,
    SelectComma,
    AliasAs,
    ColumnListOpen,
    ColumnListComma,
    ColumnListClose,
    ValueRowOpen,
    ValueComma,
    ValueRowClose,
    ValueRowSeparator,
    SetComma,
    SetEquals,
    ListComma,
    Connective,
    BetweenKeyword,
    BetweenLower,
    BetweenAnd,
    InListOpen,
    InListComma,
    InListClose,
    MergeWhen,
    MergeThen,
    SubqueryOpen,
    SubqueryClose,
    CaseOpen,
    CaseBranch,
    CaseEnd,
    StatementEnd,
}

impl Role {
    pub fn starts_clause(self) -> bool {
        matches!(
            self,
            Self::ClauseKeyword | Self::InsertMissingInto | Self::DeleteMissingFrom
        )
    }
}

/// Spacing override for one side of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpaceHint {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlignKind {
    Alias,
    Assignment,
}

/// Alignment group: every anchor with the same group lines up in one column.
/// `id` is the token index of the clause keyword that owns the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlignGroup {
    pub kind: AlignKind,
    pub id: usize,
}

/// A partial annotation produced by one rule. Unset fields leave the
/// decision to other rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hint {
    pub break_before: Option<usize>,
    pub break_after: Option<usize>,
    pub blank_line_after: bool,
    pub align_group: Option<AlignGroup>,
    pub space_before: Option<SpaceHint>,
    pub space_after: Option<SpaceHint>,
    pub keyword_case: Option<KeywordCase>,
    pub insert_after: Option<&'static str>,
}

impl Hint {
    pub fn break_before(indent: usize) -> Self {
        Self {
            break_before: Some(indent),
            ..Self::default()
        }
    }

    pub fn break_after(indent: usize) -> Self {
        Self {
            break_after: Some(indent),
            ..Self::default()
        }
    }

    /// Combine with a later rule's hint; the later rule wins every field it sets.
    pub fn then(self, later: Hint) -> Hint {
        Hint {
            break_before: later.break_before.or(self.break_before),
            break_after: later.break_after.or(self.break_after),
            blank_line_after: later.blank_line_after || self.blank_line_after,
            align_group: later.align_group.or(self.align_group),
            space_before: later.space_before.or(self.space_before),
            space_after: later.space_after.or(self.space_after),
            keyword_case: later.keyword_case.or(self.keyword_case),
            insert_after: later.insert_after.or(self.insert_after),
        }
    }
}

/// Final formatting record for one token, stored in a vector parallel to
/// the token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub role: Role,
    /// Indent level of the line this token starts, when `break_before` is set.
    pub indent: usize,
    pub break_before: bool,
    pub break_after: bool,
    pub blank_line_before: bool,
    pub align_group: Option<AlignGroup>,
    pub space_before: SpaceHint,
    pub space_after: SpaceHint,
    pub keyword_case: Option<KeywordCase>,
    /// Keyword emitted right after this token (`INTO`, `FROM`).
    pub insert_after: Option<&'static str>,
}
