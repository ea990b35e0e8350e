use smallvec::SmallVec;

use crate::annotation::Role;
use crate::clause::Clause;

/// One open parenthesis on the driver's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParenFrame {
    pub role: Role,
    /// Indent of the line holding the `(`.
    pub line_indent: usize,
    /// Clause and base indent of the enclosing statement, restored on `)`.
    pub outer_clause: Clause,
    pub outer_base: usize,
    pub outer_metrics: ClauseMetrics,
}

/// Measurements of the clause the driver is currently inside, copied from
/// the segmenter's clause structure when the clause keyword is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClauseMetrics {
    pub clause: Clause,
    /// Token index of the clause keyword; doubles as alignment group id.
    pub keyword: usize,
    /// Number of top-level items (select items, assignments, list entries).
    pub items: usize,
    /// Number of VALUES rows.
    pub rows: usize,
    /// Value count of the widest VALUES row.
    pub row_width: usize,
}

/// Single-pass formatting context threaded through the rule modules.
/// The driver owns every mutation; rules only read it.
#[derive(Debug, Clone, Default)]
pub struct FormatterState {
    pub clause: Clause,
    /// Role of the token being annotated.
    pub role: Role,
    /// Indent of the current statement's clause lines.
    pub base_indent: usize,
    /// Indent of the output line currently being filled.
    pub line_indent: usize,
    pub metrics: ClauseMetrics,
    /// Line indent at the most recent BETWEEN.
    pub between_indent: usize,
    pub parens: SmallVec<[ParenFrame; 8]>,
    /// Line indent at each open laid-out CASE.
    pub cases: SmallVec<[usize; 4]>,
}

impl FormatterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line indent of the innermost open parenthesis, or the current line.
    pub fn paren_line_indent(&self) -> usize {
        self.parens
            .last()
            .map(|f| f.line_indent)
            .unwrap_or(self.line_indent)
    }

    /// Line indent of the innermost laid-out CASE, or the current line.
    pub fn case_line_indent(&self) -> usize {
        self.cases.last().copied().unwrap_or(self.line_indent)
    }

    /// Forget all nesting; used at `;` so one unbalanced statement cannot
    /// skew the next.
    pub fn reset_statement(&mut self) {
        self.clause = Clause::None;
        self.base_indent = 0;
        self.metrics = ClauseMetrics::default();
        self.parens.clear();
        self.cases.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_indents() {
        let mut state = FormatterState::new();
        state.line_indent = 2;
        assert_eq!(state.paren_line_indent(), 2);
        assert_eq!(state.case_line_indent(), 2);

        state.cases.push(1);
        assert_eq!(state.case_line_indent(), 1);
    }

    #[test]
    fn test_reset_statement() {
        let mut state = FormatterState::new();
        state.clause = Clause::Where;
        state.base_indent = 3;
        state.parens.push(ParenFrame {
            role: Role::SubqueryOpen,
            line_indent: 1,
            outer_clause: Clause::Where,
            outer_base: 0,
            outer_metrics: ClauseMetrics::default(),
        });
        state.cases.push(0);
        state.reset_statement();
        assert_eq!(state.clause, Clause::None);
        assert_eq!(state.base_indent, 0);
        assert!(state.parens.is_empty());
        assert!(state.cases.is_empty());
    }
}
