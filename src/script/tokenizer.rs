//! Statement splitting that respects quoting.
//!
//! A `;` ends a statement only outside string literals, quoted identifiers
//! (including SQLite's `[name]` form), comments and the `BEGIN ... END` body
//! of a `CREATE TRIGGER`. Fragments made of nothing but whitespace and
//! comments are dropped.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Quoted(char),
    Bracket,
    LineComment,
    BlockComment,
}

/// Keyword bookkeeping for the statement being collected.
#[derive(Debug, Default)]
struct Words {
    word: String,
    leading: Vec<String>,
    trigger: bool,
    depth: usize,
}

impl Words {
    fn push(&mut self, c: char) {
        self.word.push(c);
    }

    fn flush(&mut self) {
        if self.word.is_empty() {
            return;
        }
        let word = self.word.to_ascii_uppercase();
        self.word.clear();

        if self.leading.len() < 3 {
            self.leading.push(word.clone());
            let lead: Vec<&str> = self.leading.iter().map(String::as_str).collect();
            self.trigger = matches!(
                lead.as_slice(),
                ["CREATE", "TRIGGER", ..] | ["CREATE", "TEMP" | "TEMPORARY", "TRIGGER"]
            );
        }
        if self.trigger {
            match word.as_str() {
                "BEGIN" | "CASE" => self.depth += 1,
                "END" => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    fn in_body(&self) -> bool {
        self.trigger && self.depth > 0
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Split a script into executable statements, without their terminators.
///
/// `backslash_escapes` makes `\` inside single or double quotes escape the
/// next character, for dialects that read literals that way. Doubled quote
/// characters are always treated as an escaped quote.
pub fn split_statements(script: &str, backslash_escapes: bool) -> Result<Vec<String>> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut words = Words::default();
    let mut state = State::Code;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => {
                if is_word_char(c) {
                    words.push(c);
                    has_code = true;
                    current.push(c);
                    continue;
                }
                words.flush();
                match c {
                    ';' if !words.in_body() => {
                        if has_code {
                            statements.push(current.trim().to_string());
                        }
                        current.clear();
                        has_code = false;
                        words = Words::default();
                        continue;
                    }
                    '\'' | '"' | '`' => {
                        state = State::Quoted(c);
                        has_code = true;
                    }
                    '[' => {
                        state = State::Bracket;
                        has_code = true;
                    }
                    '-' if chars.peek() == Some(&'-') => {
                        current.push(c);
                        current.push('-');
                        chars.next();
                        state = State::LineComment;
                        continue;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        current.push(c);
                        current.push('*');
                        chars.next();
                        state = State::BlockComment;
                        continue;
                    }
                    c if !c.is_whitespace() => has_code = true,
                    _ => {}
                }
            }
            State::Quoted(q) => {
                if c == '\\' && backslash_escapes && q != '`' {
                    current.push(c);
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    continue;
                }
                if c == q {
                    if chars.peek() == Some(&q) {
                        current.push(c);
                        current.push(q);
                        chars.next();
                        continue;
                    }
                    state = State::Code;
                }
            }
            State::Bracket => {
                if c == ']' {
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    current.push(c);
                    current.push('/');
                    chars.next();
                    state = State::Code;
                    continue;
                }
            }
        }
        current.push(c);
    }

    match state {
        State::Quoted('\'') => {
            return Err(Error::Format("unterminated string literal at end of script".into()));
        }
        State::Quoted(_) | State::Bracket => {
            return Err(Error::Format("unterminated quoted identifier at end of script".into()));
        }
        _ => {}
    }

    if has_code {
        statements.push(current.trim().to_string());
    }

    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_simple_statements() {
        let stmts = split_statements("CREATE TABLE t (x);\nINSERT INTO t VALUES (1);", false).unwrap();
        assert_eq!(stmts, vec!["CREATE TABLE t (x)", "INSERT INTO t VALUES (1)"]);
    }

    #[test]
    fn test_semicolon_inside_literal() {
        let stmts = split_statements("INSERT INTO t VALUES ('a;b');SELECT 1;", false).unwrap();
        assert_eq!(stmts, vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]);
    }

    #[test]
    fn test_doubled_quote_stays_inside_literal() {
        let stmts = split_statements("INSERT INTO t VALUES ('it''s; fine');", false).unwrap();
        assert_eq!(stmts, vec!["INSERT INTO t VALUES ('it''s; fine')"]);
    }

    #[test]
    fn test_backslash_escape_only_when_enabled() {
        let sql = r"INSERT INTO t VALUES ('a\';b');";
        let stmts = split_statements(sql, true).unwrap();
        assert_eq!(stmts, vec![r"INSERT INTO t VALUES ('a\';b')"]);

        // Without backslash escapes the literal closes after `\`.
        let stmts = split_statements(sql, false);
        assert!(stmts.is_err());
    }

    #[test]
    fn test_quoted_identifiers() {
        let stmts = split_statements("CREATE TABLE `a;b` (\"c;d\" INT);", false).unwrap();
        assert_eq!(stmts, vec!["CREATE TABLE `a;b` (\"c;d\" INT)"]);
    }

    #[test]
    fn test_bracket_identifiers() {
        let sql = "CREATE TABLE k (id INTEGER, [o'clock] TEXT, [a;b] INT);INSERT INTO k VALUES (1, 'x', 2);";
        let stmts = split_statements(sql, false).unwrap();
        assert_eq!(
            stmts,
            vec![
                "CREATE TABLE k (id INTEGER, [o'clock] TEXT, [a;b] INT)",
                "INSERT INTO k VALUES (1, 'x', 2)",
            ]
        );
        assert!(split_statements("SELECT [open", false).is_err());
    }

    #[test]
    fn test_trigger_body_kept_whole() {
        let sql = "CREATE TRIGGER log_insert AFTER INSERT ON t BEGIN \
                   INSERT INTO log VALUES (new.id, CASE WHEN new.x > 0 THEN 'pos' ELSE 'neg' END); \
                   UPDATE t SET seen = 1 WHERE id = new.id; \
                   END;\nSELECT 1;";
        let stmts = split_statements(sql, false).unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("CREATE TRIGGER log_insert"));
        assert!(stmts[0].ends_with("END"));
        assert_eq!(stmts[1], "SELECT 1");
    }

    #[test]
    fn test_begin_outside_trigger_still_splits() {
        let stmts = split_statements("BEGIN;CREATE TEMP TABLE begin_end (x);COMMIT;", false).unwrap();
        assert_eq!(stmts, vec!["BEGIN", "CREATE TEMP TABLE begin_end (x)", "COMMIT"]);
    }

    #[test]
    fn test_comments_hide_semicolons_and_are_dropped_alone() {
        let sql = "-- header; still a comment\n/* block; comment */\nSELECT 1;\n-- End of database backup process\n";
        let stmts = split_statements(sql, false).unwrap();
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].ends_with("SELECT 1"));
        assert!(stmts[0].starts_with("-- header"));
    }

    #[test]
    fn test_trailing_statement_without_terminator() {
        let stmts = split_statements("SELECT 1;\nSELECT 2", false).unwrap();
        assert_eq!(stmts, vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn test_unterminated_literal() {
        let err = split_statements("INSERT INTO t VALUES ('oops);", false).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_blank_input() {
        assert!(split_statements("  \n\n -- nothing\n", false).unwrap().is_empty());
    }
}
