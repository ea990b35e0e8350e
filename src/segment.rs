use std::collections::HashMap;
use std::ops::Range;

use smallvec::SmallVec;

use crate::annotation::Role;
use crate::clause::Clause;
use crate::state::ClauseMetrics;
use crate::token::{Token, TokenType};

/// Half-open range of token indices.
pub type Span = Range<usize>;

/// Paren and CASE nesting, tracked independently so `END` inside a CASE is
/// never taken for a clause boundary.
#[derive(Debug, Clone, Copy, Default)]
struct Depth {
    paren: usize,
    case: usize,
}

impl Depth {
    #[inline]
    fn at_top(&self) -> bool {
        self.paren == 0 && self.case == 0
    }

    /// Account for `token`. Returns false on a `)` that closes a paren
    /// opened before the scan started.
    fn enter(&mut self, token: &Token) -> bool {
        match token.token_type {
            TokenType::ParenOpen => self.paren += 1,
            TokenType::ParenClose => {
                if self.paren == 0 {
                    return false;
                }
                self.paren -= 1;
            }
            TokenType::Keyword if token.is_keyword("CASE") => self.case += 1,
            TokenType::Keyword if self.case > 0 && token.is_keyword("END") => self.case -= 1,
            _ => {}
        }
        true
    }
}

pub fn next_significant(tokens: &[Token], from: usize) -> Option<usize> {
    (from..tokens.len()).find(|&i| !tokens[i].token_type.is_comment())
}

pub fn prev_significant(tokens: &[Token], before: usize) -> Option<usize> {
    (0..before.min(tokens.len()))
        .rev()
        .find(|&i| !tokens[i].token_type.is_comment())
}

/// Index of the `)` matching the `(` at `open`, stopping at `;`.
pub fn matching_paren(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.token_type {
            TokenType::ParenOpen => depth += 1,
            TokenType::ParenClose => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            TokenType::Semicolon => return None,
            _ => {}
        }
    }
    None
}

/// Whether the `(` at `open` begins a subquery.
pub fn starts_subquery(tokens: &[Token], open: usize) -> bool {
    next_significant(tokens, open + 1)
        .is_some_and(|i| tokens[i].is_any_keyword(&["SELECT", "WITH"]))
}

/// First index at or after `from` where `clause` ends: a terminator keyword
/// at depth zero, a `;`, an unmatched `)`, or end of input.
pub fn clause_end(tokens: &[Token], from: usize, clause: Clause) -> usize {
    let terminators = clause.terminators();
    let mut depth = Depth::default();
    for (i, token) in tokens.iter().enumerate().skip(from) {
        if token.token_type == TokenType::Semicolon {
            return i;
        }
        if depth.at_top() && token.is_any_keyword(terminators) {
            return i;
        }
        if !depth.enter(token) {
            return i;
        }
    }
    tokens.len()
}

/// Split `span` on commas at depth zero. Returns the item spans and the
/// comma indices between them.
pub fn split_top_level(tokens: &[Token], span: Span) -> (Vec<Span>, Vec<usize>) {
    let mut items = Vec::new();
    let mut commas = Vec::new();
    let mut start = span.start;
    let mut depth = Depth::default();
    for i in span.clone() {
        let token = &tokens[i];
        if token.token_type == TokenType::Comma && depth.at_top() {
            items.push(start..i);
            commas.push(i);
            start = i + 1;
            continue;
        }
        depth.enter(token);
    }
    if start < span.end || !commas.is_empty() {
        items.push(start..span.end);
    }
    (items, commas)
}

fn find_top_level(tokens: &[Token], span: Span, pred: impl Fn(&Token) -> bool) -> Option<usize> {
    let mut depth = Depth::default();
    for i in span {
        let token = &tokens[i];
        if depth.at_top() && pred(token) {
            return Some(i);
        }
        depth.enter(token);
    }
    None
}

/// Source text of a span with comments dropped and no separators.
pub fn span_text(tokens: &[Token], span: Span) -> String {
    tokens[span]
        .iter()
        .filter(|t| !t.token_type.is_comment())
        .map(|t| t.text.as_str())
        .collect()
}

// ---- Clause structures ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub span: Span,
    /// The item's top-level `AS`.
    pub alias_as: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectList {
    pub keyword: usize,
    pub items: Vec<SelectItem>,
    pub commas: Vec<usize>,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnList {
    pub open: usize,
    pub close: Option<usize>,
    pub names: Vec<String>,
    pub items: Vec<Span>,
    pub commas: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTarget {
    pub keyword: usize,
    pub into: Option<usize>,
    pub table: Span,
    pub columns: Option<ColumnList>,
    pub end: usize,
}

impl InsertTarget {
    pub fn missing_into(&self) -> bool {
        self.into.is_none() && !self.table.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRow {
    pub open: usize,
    pub close: Option<usize>,
    pub values: Vec<Span>,
    pub commas: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuesClause {
    pub keyword: usize,
    pub rows: Vec<ValueRow>,
    /// Commas between rows.
    pub separators: Vec<usize>,
    pub end: usize,
}

impl ValuesClause {
    pub fn widest_row(&self) -> usize {
        self.rows.iter().map(|r| r.values.len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub target: Span,
    pub equals: Option<usize>,
    pub value: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetClause {
    pub keyword: usize,
    pub assignments: Vec<Assignment>,
    pub commas: Vec<usize>,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderColumn {
    pub expr: Span,
    /// `ASC` or `DESC`.
    pub direction: Option<usize>,
    /// `NULLS FIRST` / `NULLS LAST`.
    pub nulls: Option<Span>,
}

/// GROUP BY or ORDER BY list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListClause {
    pub clause: Clause,
    pub keyword: usize,
    pub items: Vec<OrderColumn>,
    pub commas: Vec<usize>,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereCondition {
    pub span: Span,
    /// The `AND`/`OR` preceding this condition.
    pub connective: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Between {
    pub keyword: usize,
    pub lower: Option<usize>,
    pub and: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InList {
    pub keyword: usize,
    pub open: usize,
    pub close: Option<usize>,
    pub items: Vec<Span>,
    pub commas: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub keyword: usize,
    pub conditions: Vec<WhereCondition>,
    pub betweens: Vec<Between>,
    pub in_lists: Vec<InList>,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub keyword: usize,
    pub from: Option<usize>,
    pub target: Option<usize>,
    pub end: usize,
}

impl DeleteTarget {
    pub fn missing_from(&self) -> bool {
        self.from.is_none() && self.target.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeArm {
    pub when: usize,
    pub then: Option<usize>,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStatement {
    pub keyword: usize,
    pub using: Option<usize>,
    pub on: Option<usize>,
    pub arms: Vec<MergeArm>,
    pub end: usize,
}

// ---- Clause segmenters ----

pub fn segment_select(tokens: &[Token], keyword: usize) -> SelectList {
    let start = keyword + 1;
    let end = clause_end(tokens, start, Clause::Select);
    let (spans, commas) = split_top_level(tokens, start..end);
    let items = spans
        .into_iter()
        .map(|span| SelectItem {
            alias_as: find_top_level(tokens, span.clone(), |t| t.is_keyword("AS")),
            span,
        })
        .collect();
    SelectList {
        keyword,
        items,
        commas,
        end,
    }
}

pub fn segment_insert(tokens: &[Token], keyword: usize) -> InsertTarget {
    let mut cursor = next_significant(tokens, keyword + 1);
    let mut into = None;
    if let Some(i) = cursor.filter(|&i| tokens[i].is_keyword("INTO")) {
        into = Some(i);
        cursor = next_significant(tokens, i + 1);
    }

    let table_start = cursor.unwrap_or(tokens.len());
    let mut table_end = table_start;
    while table_end < tokens.len()
        && (tokens[table_end].token_type.is_name() || tokens[table_end].token_type == TokenType::Dot)
    {
        table_end += 1;
    }

    let mut columns = None;
    let mut end = table_end;
    if table_end > table_start {
        if let Some(open) = next_significant(tokens, table_end)
            .filter(|&o| tokens[o].token_type == TokenType::ParenOpen && !starts_subquery(tokens, o))
        {
            let close = matching_paren(tokens, open);
            let inner_end = close.unwrap_or_else(|| clause_end(tokens, open + 1, Clause::Insert));
            let (items, commas) = split_top_level(tokens, open + 1..inner_end);
            let names = items.iter().map(|s| span_text(tokens, s.clone())).collect();
            end = close.map(|c| c + 1).unwrap_or(inner_end);
            columns = Some(ColumnList {
                open,
                close,
                names,
                items,
                commas,
            });
        }
    }

    InsertTarget {
        keyword,
        into,
        table: table_start..table_end,
        columns,
        end,
    }
}

pub fn segment_values(tokens: &[Token], keyword: usize) -> ValuesClause {
    let start = keyword + 1;
    let end = clause_end(tokens, start, Clause::Values);
    let (items, separators) = split_top_level(tokens, start..end);

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let Some(open) = next_significant(tokens, item.start).filter(|&o| o < item.end) else {
            continue;
        };
        if tokens[open].token_type != TokenType::ParenOpen {
            continue;
        }
        let close = matching_paren(tokens, open).filter(|&c| c < item.end);
        let (values, commas) = split_top_level(tokens, open + 1..close.unwrap_or(item.end));
        rows.push(ValueRow {
            open,
            close,
            values,
            commas,
        });
    }

    ValuesClause {
        keyword,
        rows,
        separators,
        end,
    }
}

pub fn segment_set(tokens: &[Token], keyword: usize) -> SetClause {
    let start = keyword + 1;
    let end = clause_end(tokens, start, Clause::Set);
    let (items, commas) = split_top_level(tokens, start..end);
    let assignments = items
        .into_iter()
        .map(|item| {
            let equals = find_top_level(tokens, item.clone(), |t| {
                t.token_type == TokenType::Operator && t.text == "="
            });
            match equals {
                Some(eq) => Assignment {
                    target: item.start..eq,
                    equals,
                    value: eq + 1..item.end,
                },
                None => Assignment {
                    target: item.clone(),
                    equals: None,
                    value: item.end..item.end,
                },
            }
        })
        .collect();
    SetClause {
        keyword,
        assignments,
        commas,
        end,
    }
}

/// GROUP BY / ORDER BY. `keyword` is the index of `GROUP` or `ORDER`.
pub fn segment_list(tokens: &[Token], keyword: usize) -> ListClause {
    let clause = Clause::from_token(&tokens[keyword]).unwrap_or(Clause::GroupBy);
    let mut start = keyword + 1;
    if let Some(by) = next_significant(tokens, start).filter(|&b| tokens[b].is_keyword("BY")) {
        start = by + 1;
    }
    let end = clause_end(tokens, start, clause);
    let (spans, commas) = split_top_level(tokens, start..end);
    let items = spans.into_iter().map(|s| order_column(tokens, s)).collect();
    ListClause {
        clause,
        keyword,
        items,
        commas,
        end,
    }
}

fn order_column(tokens: &[Token], span: Span) -> OrderColumn {
    let significant: SmallVec<[usize; 8]> = span
        .clone()
        .filter(|&i| !tokens[i].token_type.is_comment())
        .collect();
    let mut k = significant.len();
    let mut nulls = None;
    let mut direction = None;

    if k >= 2
        && tokens[significant[k - 2]].is_keyword("NULLS")
        && tokens[significant[k - 1]].is_any_keyword(&["FIRST", "LAST"])
    {
        nulls = Some(significant[k - 2]..significant[k - 1] + 1);
        k -= 2;
    }
    if k >= 1 && tokens[significant[k - 1]].is_any_keyword(&["ASC", "DESC"]) {
        direction = Some(significant[k - 1]);
        k -= 1;
    }

    let expr_end = if k < significant.len() {
        significant[k]
    } else {
        span.end
    };
    OrderColumn {
        expr: span.start..expr_end,
        direction,
        nulls,
    }
}

fn in_list_at(tokens: &[Token], keyword: usize, end: usize) -> Option<InList> {
    let open = next_significant(tokens, keyword + 1).filter(|&o| o < end)?;
    if tokens[open].token_type != TokenType::ParenOpen || starts_subquery(tokens, open) {
        return None;
    }
    let close = matching_paren(tokens, open).filter(|&c| c < end);
    let (items, commas) = split_top_level(tokens, open + 1..close.unwrap_or(end));
    Some(InList {
        keyword,
        open,
        close,
        items,
        commas,
    })
}

pub fn segment_where(tokens: &[Token], keyword: usize) -> WhereClause {
    let start = keyword + 1;
    let end = clause_end(tokens, start, Clause::Where);

    let mut conditions = Vec::new();
    let mut betweens = Vec::new();
    let mut in_lists = Vec::new();
    let mut condition_start = start;
    let mut connective = None;
    let mut open_between: Option<(usize, Option<usize>)> = None;
    let mut depth = Depth::default();

    let mut i = start;
    while i < end {
        let token = &tokens[i];
        if depth.at_top() && token.token_type == TokenType::Keyword {
            if token.is_keyword("BETWEEN") {
                let lower = next_significant(tokens, i + 1).filter(|&l| l < end);
                open_between = Some((i, lower));
            } else if token.is_keyword("AND") && open_between.is_some() {
                if let Some((between, lower)) = open_between.take() {
                    betweens.push(Between {
                        keyword: between,
                        lower,
                        and: i,
                    });
                }
            } else if token.is_any_keyword(&["AND", "OR"]) {
                open_between = None;
                conditions.push(WhereCondition {
                    span: condition_start..i,
                    connective,
                });
                connective = Some(i);
                condition_start = i + 1;
            } else if token.is_keyword("IN") {
                if let Some(list) = in_list_at(tokens, i, end) {
                    i = list.close.map(|c| c + 1).unwrap_or(end);
                    in_lists.push(list);
                    continue;
                }
            }
        }
        depth.enter(token);
        i += 1;
    }
    conditions.push(WhereCondition {
        span: condition_start..end,
        connective,
    });

    WhereClause {
        keyword,
        conditions,
        betweens,
        in_lists,
        end,
    }
}

pub fn segment_delete(tokens: &[Token], keyword: usize) -> DeleteTarget {
    let end = clause_end(tokens, keyword + 1, Clause::Delete);
    let from = find_top_level(tokens, keyword + 1..end, |t| t.is_keyword("FROM"));
    let target = next_significant(tokens, keyword + 1)
        .filter(|&i| i < end && tokens[i].token_type.is_name());
    DeleteTarget {
        keyword,
        from,
        target,
        end,
    }
}

pub fn segment_merge(tokens: &[Token], keyword: usize) -> MergeStatement {
    let end = clause_end(tokens, keyword + 1, Clause::Merge);
    let mut using = None;
    let mut on = None;
    let mut arms: Vec<MergeArm> = Vec::new();
    let mut depth = Depth::default();

    for i in keyword + 1..end {
        let token = &tokens[i];
        if depth.at_top() && token.token_type == TokenType::Keyword {
            if token.is_keyword("WHEN") {
                if let Some(last) = arms.last_mut() {
                    last.end = i;
                }
                arms.push(MergeArm {
                    when: i,
                    then: None,
                    end,
                });
            } else if token.is_keyword("THEN") {
                if let Some(arm) = arms.last_mut().filter(|a| a.then.is_none()) {
                    arm.then = Some(i);
                }
            } else if arms.is_empty() {
                if token.is_keyword("USING") && using.is_none() {
                    using = Some(i);
                } else if token.is_keyword("ON") && using.is_some() && on.is_none() {
                    on = Some(i);
                }
            }
        }
        depth.enter(token);
    }

    MergeStatement {
        keyword,
        using,
        on,
        arms,
        end,
    }
}

// ---- Whole-input analysis ----

/// Roles for every token plus clause measurements keyed by the index of
/// each clause keyword.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub roles: Vec<Role>,
    pub clauses: HashMap<usize, ClauseMetrics>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    /// Paren depth of the statement's own tokens.
    paren_depth: usize,
    statement: Option<Clause>,
    has_clause: bool,
    /// Tokens before this index belong to a MERGE whose roles are set.
    merge_until: usize,
}

#[derive(Debug, Clone, Copy)]
struct CaseFrame {
    paren_depth: usize,
    laid_out: bool,
}

const JOIN_WORDS: &[&str] = &["INNER", "LEFT", "RIGHT", "FULL", "CROSS", "NATURAL", "OUTER"];

struct Walker<'a> {
    tokens: &'a [Token],
    roles: Vec<Role>,
    clauses: HashMap<usize, ClauseMetrics>,
    scopes: Vec<Scope>,
    /// One entry per open paren: whether it opened a subquery.
    parens: SmallVec<[bool; 8]>,
    cases: SmallVec<[CaseFrame; 4]>,
}

/// Walk the token sequence once, classifying clause keywords per statement
/// scope and delegating each clause to its segmenter.
pub fn analyze(tokens: &[Token]) -> Segmentation {
    let mut walker = Walker {
        tokens,
        roles: vec![Role::None; tokens.len()],
        clauses: HashMap::new(),
        scopes: vec![Scope::default()],
        parens: SmallVec::new(),
        cases: SmallVec::new(),
    };
    for i in 0..tokens.len() {
        walker.visit(i);
    }
    Segmentation {
        roles: walker.roles,
        clauses: walker.clauses,
    }
}

impl Walker<'_> {
    fn scope(&self) -> Scope {
        self.scopes.last().copied().unwrap_or_default()
    }

    fn scope_mut(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn visit(&mut self, i: usize) {
        let token = &self.tokens[i];
        match token.token_type {
            TokenType::Semicolon => {
                self.roles[i] = Role::StatementEnd;
                self.scopes.clear();
                self.scopes.push(Scope::default());
                self.parens.clear();
                self.cases.clear();
            }
            TokenType::ParenOpen => {
                let subquery = starts_subquery(self.tokens, i);
                self.parens.push(subquery);
                if subquery {
                    self.roles[i] = Role::SubqueryOpen;
                    self.scopes.push(Scope {
                        paren_depth: self.parens.len(),
                        ..Scope::default()
                    });
                }
            }
            TokenType::ParenClose => {
                let depth = self.parens.len();
                self.cases.retain(|c| c.paren_depth < depth);
                if let Some(subquery) = self.parens.pop() {
                    if subquery {
                        self.roles[i] = Role::SubqueryClose;
                        if self.scopes.len() > 1 {
                            self.scopes.pop();
                        }
                    }
                }
            }
            TokenType::Keyword => self.keyword(i),
            _ => {}
        }
    }

    fn keyword(&mut self, i: usize) {
        let token = &self.tokens[i];
        let depth = self.parens.len();
        let scope = self.scope();

        if token.is_keyword("CASE") {
            let laid_out = depth == scope.paren_depth;
            self.cases.push(CaseFrame {
                paren_depth: depth,
                laid_out,
            });
            if laid_out {
                self.roles[i] = Role::CaseOpen;
            }
            return;
        }
        if let Some(case) = self.cases.last().copied().filter(|c| c.paren_depth == depth) {
            if token.is_any_keyword(&["WHEN", "ELSE"]) {
                if case.laid_out {
                    self.roles[i] = Role::CaseBranch;
                }
            } else if token.is_keyword("END") {
                self.cases.pop();
                if case.laid_out {
                    self.roles[i] = Role::CaseEnd;
                }
            }
            return;
        }

        if depth != scope.paren_depth || i < scope.merge_until {
            return;
        }
        if let Some((clause, tail)) = self.clause_start(i, scope) {
            self.start_clause(i, clause, tail);
        }
    }

    /// Clause begun by the keyword at `i`, with the number of following
    /// keywords that belong to it.
    fn clause_start(&self, i: usize, scope: Scope) -> Option<(Clause, usize)> {
        if self.roles[i] == Role::ClauseKeywordTail {
            return None;
        }
        let tokens = self.tokens;
        let token = &tokens[i];
        let next = next_significant(tokens, i + 1).map(|n| &tokens[n]);
        let prev = prev_significant(tokens, i).map(|p| &tokens[p]);
        let upper = token.text.to_ascii_uppercase();

        match upper.as_str() {
            "GROUP" | "ORDER" => {
                let clause = Clause::from_name(&upper)?;
                next.filter(|n| n.is_keyword("BY")).map(|_| (clause, 1))
            }
            "UNION" | "INTERSECT" | "EXCEPT" => {
                let tail = usize::from(next.is_some_and(|n| n.is_any_keyword(&["ALL", "DISTINCT"])));
                Some((Clause::SetOperator, tail))
            }
            "JOIN" => Some((Clause::Join, 0)),
            "INNER" | "LEFT" | "RIGHT" | "FULL" | "CROSS" | "NATURAL" => {
                let mut tail = 0;
                let mut k = i;
                while let Some(n) = next_significant(tokens, k + 1) {
                    tail += 1;
                    if tokens[n].is_keyword("JOIN") {
                        return Some((Clause::Join, tail));
                    }
                    if !tokens[n].is_any_keyword(JOIN_WORDS) {
                        return None;
                    }
                    k = n;
                }
                None
            }
            "WITH" if scope.has_clause => None,
            "SET" if scope.has_clause && scope.statement != Some(Clause::Update) => None,
            "UPDATE"
                if prev.is_some_and(|p| p.is_keyword("FOR") || p.text.eq_ignore_ascii_case("DO")) =>
            {
                None
            }
            "USING" | "ON" => None,
            "VALUES" if prev.is_some_and(|p| p.is_keyword("DEFAULT")) => None,
            _ => Clause::from_name(&upper).map(|c| (c, 0)),
        }
    }

    fn mark_tail(&mut self, i: usize, tail: usize) {
        let mut k = i;
        for _ in 0..tail {
            match next_significant(self.tokens, k + 1) {
                Some(n) => {
                    self.roles[n] = Role::ClauseKeywordTail;
                    k = n;
                }
                None => break,
            }
        }
    }

    fn start_clause(&mut self, i: usize, clause: Clause, tail: usize) {
        let tokens = self.tokens;
        self.roles[i] = Role::ClauseKeyword;
        self.mark_tail(i, tail);
        {
            let scope = self.scope_mut();
            scope.has_clause = true;
            if clause.is_statement() {
                scope.statement = Some(clause);
            }
        }

        let mut metrics = ClauseMetrics {
            clause,
            keyword: i,
            ..ClauseMetrics::default()
        };
        match clause {
            Clause::Select => {
                let list = segment_select(tokens, i);
                for &c in &list.commas {
                    self.roles[c] = Role::SelectComma;
                }
                for alias in list.items.iter().filter_map(|item| item.alias_as) {
                    self.roles[alias] = Role::AliasAs;
                }
                metrics.items = list.items.len();
            }
            Clause::Insert => {
                let target = segment_insert(tokens, i);
                if target.missing_into() {
                    self.roles[i] = Role::InsertMissingInto;
                }
                if let Some(columns) = &target.columns {
                    self.roles[columns.open] = Role::ColumnListOpen;
                    for &c in &columns.commas {
                        self.roles[c] = Role::ColumnListComma;
                    }
                    if let Some(close) = columns.close {
                        self.roles[close] = Role::ColumnListClose;
                    }
                    metrics.items = columns.items.len();
                }
            }
            Clause::Values => {
                let values = segment_values(tokens, i);
                for row in &values.rows {
                    self.roles[row.open] = Role::ValueRowOpen;
                    for &c in &row.commas {
                        self.roles[c] = Role::ValueComma;
                    }
                    if let Some(close) = row.close {
                        self.roles[close] = Role::ValueRowClose;
                    }
                }
                for &s in &values.separators {
                    self.roles[s] = Role::ValueRowSeparator;
                }
                metrics.rows = values.rows.len();
                metrics.row_width = values.widest_row();
            }
            Clause::Set => {
                let set = segment_set(tokens, i);
                for &c in &set.commas {
                    self.roles[c] = Role::SetComma;
                }
                for eq in set.assignments.iter().filter_map(|a| a.equals) {
                    self.roles[eq] = Role::SetEquals;
                }
                metrics.items = set.assignments.len();
            }
            Clause::Where => {
                let clause = segment_where(tokens, i);
                for connective in clause.conditions.iter().filter_map(|c| c.connective) {
                    self.roles[connective] = Role::Connective;
                }
                for between in &clause.betweens {
                    self.roles[between.keyword] = Role::BetweenKeyword;
                    if let Some(lower) = between.lower.filter(|&l| l != between.and) {
                        self.roles[lower] = Role::BetweenLower;
                    }
                    self.roles[between.and] = Role::BetweenAnd;
                }
                for list in &clause.in_lists {
                    self.roles[list.open] = Role::InListOpen;
                    for &c in &list.commas {
                        self.roles[c] = Role::InListComma;
                    }
                    if let Some(close) = list.close {
                        self.roles[close] = Role::InListClose;
                    }
                }
                metrics.items = clause.conditions.len();
            }
            Clause::GroupBy | Clause::OrderBy => {
                let list = segment_list(tokens, i);
                for &c in &list.commas {
                    self.roles[c] = Role::ListComma;
                }
                metrics.items = list.items.len();
            }
            Clause::Delete => {
                let target = segment_delete(tokens, i);
                if target.missing_from() {
                    self.roles[i] = Role::DeleteMissingFrom;
                }
                if let Some(from) = target.from {
                    if next_significant(tokens, i + 1) == Some(from) {
                        self.roles[from] = Role::ClauseKeywordTail;
                    }
                }
            }
            Clause::Merge => {
                let merge = segment_merge(tokens, i);
                for (idx, sub) in [(merge.using, Clause::Using), (merge.on, Clause::On)] {
                    if let Some(idx) = idx {
                        self.roles[idx] = Role::ClauseKeyword;
                        self.clauses.insert(
                            idx,
                            ClauseMetrics {
                                clause: sub,
                                keyword: idx,
                                ..ClauseMetrics::default()
                            },
                        );
                    }
                }
                for arm in &merge.arms {
                    self.roles[arm.when] = Role::MergeWhen;
                    if let Some(then) = arm.then {
                        self.roles[then] = Role::MergeThen;
                    }
                }
                metrics.items = merge.arms.len();
                self.scope_mut().merge_until = merge.end;
            }
            _ => {}
        }
        self.clauses.insert(i, metrics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn texts(tokens: &[Token], span: Span) -> Vec<String> {
        tokens[span].iter().map(|t| t.text.to_string()).collect()
    }

    fn index_of(tokens: &[Token], text: &str) -> usize {
        tokens
            .iter()
            .position(|t| t.text.eq_ignore_ascii_case(text))
            .unwrap()
    }

    #[test]
    fn test_group_by_terminates_on_having() {
        let tokens = tokenize("SELECT a FROM t GROUP BY a, b HAVING count(*) > 1");
        let group = index_of(&tokens, "GROUP");
        let list = segment_list(&tokens, group);
        assert_eq!(list.clause, Clause::GroupBy);
        assert_eq!(list.items.len(), 2);
        assert_eq!(tokens[list.end].text, "HAVING");
    }

    #[test]
    fn test_nested_commas_do_not_split() {
        let tokens = tokenize("SELECT coalesce(a, b), (SELECT max(x) FROM y), c");
        let list = segment_select(&tokens, 0);
        assert_eq!(list.items.len(), 3);
        assert_eq!(list.end, tokens.len());
    }

    #[test]
    fn test_case_end_is_not_a_terminator() {
        let tokens =
            tokenize("SELECT CASE WHEN a THEN 1 ELSE 2 END AS x, CASE b WHEN 1 THEN 'y' END FROM t");
        let list = segment_select(&tokens, 0);
        assert_eq!(list.items.len(), 2);
        assert_eq!(tokens[list.end].text, "FROM");
        let alias = list.items[0].alias_as.unwrap();
        assert_eq!(tokens[alias].text, "AS");
    }

    #[test]
    fn test_cast_as_is_not_alias() {
        let tokens = tokenize("SELECT CAST(a AS int), b FROM t");
        let list = segment_select(&tokens, 0);
        assert_eq!(list.items[0].alias_as, None);
    }

    #[test]
    fn test_insert_column_list() {
        let tokens = tokenize("INSERT INTO dbo.[Orders] ([Order ID], qty) VALUES (1, 2)");
        let target = segment_insert(&tokens, 0);
        assert_eq!(target.into, Some(1));
        assert_eq!(texts(&tokens, target.table.clone()), vec!["dbo", ".", "[Orders]"]);
        let columns = target.columns.unwrap();
        assert_eq!(columns.names, vec!["[Order ID]", "qty"]);
        assert!(!segment_insert(&tokens, 0).missing_into());
    }

    #[test]
    fn test_insert_without_into() {
        let tokens = tokenize("INSERT t VALUES (1)");
        let target = segment_insert(&tokens, 0);
        assert!(target.missing_into());
        assert!(target.columns.is_none());
    }

    #[test]
    fn test_values_rows() {
        let tokens = tokenize("VALUES (1, 'a'), (2, f(3, 4)), (3, 'c') RETURNING id");
        let values = segment_values(&tokens, 0);
        assert_eq!(values.rows.len(), 3);
        assert_eq!(values.separators.len(), 2);
        assert_eq!(values.rows[1].values.len(), 2);
        assert_eq!(values.widest_row(), 2);
        assert_eq!(tokens[values.end].text, "RETURNING");
    }

    #[test]
    fn test_set_assignments_fold_qualified_names() {
        let tokens = tokenize("UPDATE t SET s.col = 1, b = (SELECT 1), c = x WHERE id = 1");
        let set = segment_set(&tokens, 2);
        assert_eq!(set.assignments.len(), 3);
        assert_eq!(texts(&tokens, set.assignments[0].target.clone()), vec!["s", ".", "col"]);
        assert_eq!(texts(&tokens, set.assignments[0].value.clone()), vec!["1"]);
        assert_eq!(tokens[set.end].text, "WHERE");
    }

    #[test]
    fn test_order_columns_capture_direction_and_nulls() {
        let tokens = tokenize("ORDER BY a DESC NULLS LAST, b, c ASC");
        let list = segment_list(&tokens, 0);
        assert_eq!(list.clause, Clause::OrderBy);
        assert_eq!(list.items.len(), 3);
        let first = &list.items[0];
        assert_eq!(texts(&tokens, first.expr.clone()), vec!["a"]);
        assert_eq!(tokens[first.direction.unwrap()].text, "DESC");
        assert_eq!(texts(&tokens, first.nulls.clone().unwrap()), vec!["NULLS", "LAST"]);
        assert_eq!(list.items[1].direction, None);
        assert_eq!(tokens[list.items[2].direction.unwrap()].text, "ASC");
    }

    #[test]
    fn test_where_conditions_between_and_in() {
        let tokens = tokenize(
            "WHERE d BETWEEN 1 AND 5 AND id IN (1, 2, 3) OR (x = 1 AND y = 2) ORDER BY d",
        );
        let clause = segment_where(&tokens, 0);
        assert_eq!(clause.conditions.len(), 3);
        assert_eq!(clause.betweens.len(), 1);
        assert_eq!(tokens[clause.betweens[0].lower.unwrap()].text, "1");
        assert_eq!(clause.betweens[0].and, 4);
        assert_eq!(clause.in_lists.len(), 1);
        assert_eq!(clause.in_lists[0].items.len(), 3);
        assert_eq!(tokens[clause.end].text, "ORDER");
    }

    #[test]
    fn test_not_between() {
        let tokens = tokenize("WHERE a NOT BETWEEN 1 AND 2 AND b = 1");
        let clause = segment_where(&tokens, 0);
        assert_eq!(clause.betweens.len(), 1);
        assert_eq!(clause.conditions.len(), 2);
    }

    #[test]
    fn test_in_subquery_is_not_list() {
        let tokens = tokenize("WHERE id IN (SELECT id FROM t)");
        assert!(segment_where(&tokens, 0).in_lists.is_empty());
    }

    #[test]
    fn test_merge_arms() {
        let tokens = tokenize(
            "MERGE INTO t USING s ON t.id = s.id \
             WHEN MATCHED THEN UPDATE SET v = CASE WHEN s.v > 0 THEN s.v END \
             WHEN NOT MATCHED THEN INSERT (id) VALUES (s.id);",
        );
        let merge = segment_merge(&tokens, 0);
        assert_eq!(merge.arms.len(), 2);
        assert_eq!(tokens[merge.using.unwrap()].text, "USING");
        assert_eq!(tokens[merge.on.unwrap()].text, "ON");
        assert!(merge.arms.iter().all(|a| a.then.is_some()));
        assert_eq!(merge.arms[0].end, merge.arms[1].when);
        assert_eq!(tokens[merge.end].text, ";");
    }

    #[test]
    fn test_delete_from_detection() {
        let tokens = tokenize("DELETE t WHERE x = 1");
        assert!(segment_delete(&tokens, 0).missing_from());
        let tokens = tokenize("DELETE t FROM t JOIN u ON t.id = u.id");
        assert!(!segment_delete(&tokens, 0).missing_from());
        let tokens = tokenize("DELETE FROM t");
        assert!(!segment_delete(&tokens, 0).missing_from());
    }

    #[test]
    fn test_unbalanced_parens_end_at_input_end() {
        let tokens = tokenize("SELECT a FROM t WHERE id IN (1, 2");
        let clause = segment_where(&tokens, index_of(&tokens, "WHERE"));
        assert_eq!(clause.end, tokens.len());
        assert_eq!(clause.in_lists[0].close, None);
        assert_eq!(clause.in_lists[0].items.len(), 2);
    }

    #[test]
    fn test_spans_cover_tokens_in_order() {
        let tokens = tokenize("SELECT a, f(b, c) AS d, e FROM t");
        let list = segment_select(&tokens, 0);
        let mut cursor = 1;
        for (n, item) in list.items.iter().enumerate() {
            assert_eq!(item.span.start, cursor);
            cursor = item.span.end;
            if n < list.commas.len() {
                assert_eq!(list.commas[n], cursor);
                cursor += 1;
            }
        }
        assert_eq!(cursor, list.end);
    }

    #[test]
    fn test_analyze_roles() {
        let tokens = tokenize(
            "SELECT a AS x, b FROM t LEFT OUTER JOIN u ON t.id = u.id \
             WHERE a = 1 AND b IN (1, 2) GROUP BY a ORDER BY b",
        );
        let seg = analyze(&tokens);
        let role = |text: &str| seg.roles[index_of(&tokens, text)];
        assert_eq!(role("SELECT"), Role::ClauseKeyword);
        assert_eq!(role("AS"), Role::AliasAs);
        assert_eq!(role(","), Role::SelectComma);
        assert_eq!(role("LEFT"), Role::ClauseKeyword);
        assert_eq!(role("OUTER"), Role::ClauseKeywordTail);
        assert_eq!(role("JOIN"), Role::ClauseKeywordTail);
        assert_eq!(role("ON"), Role::None);
        assert_eq!(role("AND"), Role::Connective);
        assert_eq!(role("("), Role::InListOpen);
        assert_eq!(role("BY"), Role::ClauseKeywordTail);
        assert_eq!(seg.clauses[&index_of(&tokens, "GROUP")].clause, Clause::GroupBy);
        assert_eq!(seg.clauses[&index_of(&tokens, "LEFT")].clause, Clause::Join);
    }

    #[test]
    fn test_analyze_subquery_scopes() {
        let tokens = tokenize("SELECT a FROM (SELECT b FROM c WHERE d = 1) x WHERE e = 2");
        let seg = analyze(&tokens);
        let open = index_of(&tokens, "(");
        assert_eq!(seg.roles[open], Role::SubqueryOpen);
        let inner_select = open + 1;
        assert_eq!(seg.roles[inner_select], Role::ClauseKeyword);
        let close = tokens.iter().position(|t| t.text == ")").unwrap();
        assert_eq!(seg.roles[close], Role::SubqueryClose);
        let wheres: Vec<_> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_keyword("WHERE"))
            .map(|(i, _)| seg.roles[i])
            .collect();
        assert_eq!(wheres, vec![Role::ClauseKeyword, Role::ClauseKeyword]);
    }

    #[test]
    fn test_default_values_is_not_a_clause() {
        let tokens = tokenize("INSERT INTO t DEFAULT VALUES");
        let seg = analyze(&tokens);
        assert_eq!(seg.roles[4], Role::None);
        assert_eq!(seg.clauses.len(), 1);
    }

    #[test]
    fn test_left_function_is_not_join() {
        let tokens = tokenize("SELECT LEFT(name, 3) FROM t");
        let seg = analyze(&tokens);
        assert_eq!(seg.roles[1], Role::None);
    }

    #[test]
    fn test_analyze_case_roles() {
        let tokens = tokenize("SELECT CASE WHEN a THEN 1 ELSE 2 END, f(CASE WHEN b THEN 1 END)");
        let seg = analyze(&tokens);
        assert_eq!(seg.roles[1], Role::CaseOpen);
        assert_eq!(seg.roles[2], Role::CaseBranch);
        assert_eq!(seg.roles[6], Role::CaseBranch);
        assert_eq!(seg.roles[8], Role::CaseEnd);
        let inner_case = 12;
        assert!(tokens[inner_case].is_keyword("CASE"));
        assert_eq!(seg.roles[inner_case], Role::None);
        assert_eq!(seg.roles[inner_case + 1], Role::None);
    }

    #[test]
    fn test_analyze_merge_suppresses_arm_clauses() {
        let tokens = tokenize(
            "MERGE INTO t USING s ON t.id = s.id WHEN MATCHED THEN UPDATE SET v = 1",
        );
        let seg = analyze(&tokens);
        assert_eq!(seg.roles[index_of(&tokens, "USING")], Role::ClauseKeyword);
        assert_eq!(seg.roles[index_of(&tokens, "ON")], Role::ClauseKeyword);
        assert_eq!(seg.roles[index_of(&tokens, "WHEN")], Role::MergeWhen);
        assert_eq!(seg.roles[index_of(&tokens, "THEN")], Role::MergeThen);
        assert_eq!(seg.roles[index_of(&tokens, "UPDATE")], Role::None);
        assert_eq!(seg.roles[index_of(&tokens, "SET")], Role::None);
    }

    #[test]
    fn test_analyze_delete_and_insert_insertions() {
        let tokens = tokenize("DELETE t WHERE a = 1; INSERT t (a) VALUES (1); DELETE FROM u");
        let seg = analyze(&tokens);
        assert_eq!(seg.roles[0], Role::DeleteMissingFrom);
        let insert = index_of(&tokens, "INSERT");
        assert_eq!(seg.roles[insert], Role::InsertMissingInto);
        assert_eq!(seg.roles[insert + 2], Role::ColumnListOpen);
        let last_from = tokens.len() - 2;
        assert!(tokens[last_from].is_keyword("FROM"));
        assert_eq!(seg.roles[last_from], Role::ClauseKeywordTail);
    }
}
