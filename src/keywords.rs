use phf::phf_set;

/// Reserved words recognized by the lexer, stored uppercase.
static KEYWORDS: phf::Set<&'static str> = phf_set! {
    "ADD", "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "AVG", "BETWEEN", "BY",
    "CASE", "CAST", "CHECK", "COALESCE", "COLUMN", "CONSTRAINT", "CONVERT",
    "COUNT", "CREATE", "CROSS", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXISTS", "FALSE", "FETCH", "FIRST",
    "FOR", "FOREIGN", "FROM", "FULL", "GROUP", "HAVING", "IF", "ILIKE", "IN",
    "INDEX", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCHED", "MAX", "MERGE", "MIN",
    "NATURAL", "NEXT", "NOT", "NULL", "NULLIF", "NULLS", "OFFSET", "ON",
    "ONLY", "OR", "ORDER", "OUTER", "OUTPUT", "OVER", "PARTITION", "PRIMARY",
    "RECURSIVE", "REFERENCES", "RETURNING", "RIGHT", "ROW", "ROWS", "SELECT",
    "SET", "SOME", "SUM", "TABLE", "THEN", "TOP", "TRUE", "TRY_CAST", "UNION",
    "UNIQUE", "UPDATE", "USING", "VALUES", "VIEW", "WHEN", "WHERE", "WINDOW",
    "WITH",
};

/// Keywords written like functions: no space before their `(`.
static FUNCTION_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "AVG", "CAST", "COALESCE", "CONVERT", "COUNT", "IF", "ISNULL", "LEFT",
    "MAX", "MIN", "NULLIF", "RIGHT", "SUM", "TRY_CAST",
};

/// Keywords that complete an operand (`NULL - 1`, `END - 1`).
static OPERAND_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "END", "FALSE", "NULL", "TRUE",
};

// Longest entry in any set; longer words skip the uppercase copy.
const MAX_KEYWORD_LEN: usize = 10;

#[inline]
fn lookup(set: &phf::Set<&'static str>, word: &str) -> bool {
    if word.len() > MAX_KEYWORD_LEN || !word.is_ascii() {
        return false;
    }
    set.contains(word.to_ascii_uppercase().as_str())
}

pub fn is_keyword(word: &str) -> bool {
    lookup(&KEYWORDS, word)
}

pub fn is_function_keyword(word: &str) -> bool {
    lookup(&FUNCTION_KEYWORDS, word)
}

pub fn is_operand_keyword(word: &str) -> bool {
    lookup(&OPERAND_KEYWORDS, word)
}
