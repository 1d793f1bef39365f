//! Reserved words that must be quoted when used as identifiers.
//!
//! The list is the union of the words reserved by the built-in dialects, so
//! an identifier left unquoted by one dialect is safe in all of them.

/// Reserved words, uppercase and sorted for binary search.
static RESERVED: [&str; 102] = [
    "ALL", "ALTER", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC", "AUTHORIZATION", "BETWEEN",
    "BINARY", "BOTH", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "CONSTRAINT", "CREATE",
    "CROSS", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT",
    "DEFERRABLE", "DELETE", "DESC", "DISTINCT", "DO", "DROP", "ELSE", "END", "EXCEPT", "EXISTS",
    "FALSE", "FETCH", "FOR", "FOREIGN", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "ILIKE", "IN",
    "INITIALLY", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "LATERAL",
    "LEADING", "LEFT", "LIKE", "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "NATURAL", "NOT", "NULL",
    "OFFSET", "ON", "ONLY", "OR", "ORDER", "OUTER", "OVER", "PARTITION", "PLACING", "PRIMARY",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "RETURNING", "RIGHT", "ROW", "ROWS", "SELECT",
    "SESSION_USER", "SET", "SOME", "SYMMETRIC", "TABLE", "THEN", "TO", "TRAILING", "TRUE",
    "UNION", "UNIQUE", "UPDATE", "USER", "USING", "VALUES", "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Returns whether `identifier` is a reserved word, ignoring case.
#[must_use]
pub fn is_reserved(identifier: &str) -> bool {
    let upper = identifier.to_ascii_uppercase();
    RESERVED.binary_search(&upper.as_str()).is_ok()
}
