//! SQL statement chunker
//!
//! Splits a script into statements on `;` terminators while respecting
//! single/double-quoted literals and `--` line comments. Line numbers are
//! carried through the single forward scan, so repeated statements get
//! correct spans. Each statement is classified by its leading keyword.

use crate::chunking::lines::LineChunker;
use crate::types::{Chunk, SourceFile};

/// One statement extracted from a SQL script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub text: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum ScanState {
    Normal,
    SingleQuote,
    DoubleQuote,
    LineComment,
}

/// Split a SQL script into statements, tracking 1-based line spans.
///
/// Quote and comment state keeps `;` inside literals or comments from
/// terminating a statement. Malformed input (unterminated quotes) degrades
/// to a single trailing statement; this never fails.
pub fn split_statements(source: &str) -> Vec<SqlStatement> {
    let mut statements = Vec::new();
    let mut buffer = String::new();
    let mut state = ScanState::Normal;
    let mut line = 1usize;
    let mut start_line: Option<usize> = None;
    let mut prev_char = '\0';

    for ch in source.chars() {
        match state {
            ScanState::Normal => match ch {
                ';' => {
                    flush_statement(&mut statements, &mut buffer, &mut start_line, line);
                    prev_char = '\0';
                    continue;
                }
                '\'' => state = ScanState::SingleQuote,
                '"' => state = ScanState::DoubleQuote,
                '-' if prev_char == '-' => state = ScanState::LineComment,
                _ => {}
            },
            ScanState::SingleQuote => {
                if ch == '\'' {
                    state = ScanState::Normal;
                }
            }
            ScanState::DoubleQuote => {
                if ch == '"' {
                    state = ScanState::Normal;
                }
            }
            ScanState::LineComment => {
                if ch == '\n' {
                    state = ScanState::Normal;
                }
            }
        }

        if start_line.is_none() && !ch.is_whitespace() {
            start_line = Some(line);
        }
        buffer.push(ch);
        prev_char = ch;
        if ch == '\n' {
            line += 1;
        }
    }

    // Whatever trails the last terminator is still a statement
    flush_statement(&mut statements, &mut buffer, &mut start_line, line);
    statements
}

fn flush_statement(
    statements: &mut Vec<SqlStatement>,
    buffer: &mut String,
    start_line: &mut Option<usize>,
    end_line: usize,
) {
    let text = buffer.trim().to_string();
    if !text.is_empty() {
        statements.push(SqlStatement {
            text,
            start_line: start_line.unwrap_or(end_line),
            end_line,
        });
    }
    buffer.clear();
    *start_line = None;
}

/// Classify a statement by its leading keyword, case-insensitively
pub fn classify_statement(sql: &str) -> &'static str {
    let mut body = sql.trim_start();
    // Leading line comments do not participate in classification
    while body.starts_with("--") {
        body = body.split_once('\n').map_or("", |(_, rest)| rest).trim_start();
    }

    let head: String = body
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    if head.starts_with("CREATE TABLE") {
        "table-definition"
    } else if head.starts_with("CREATE PROCEDURE") {
        "stored-procedure"
    } else if head.starts_with("CREATE FUNCTION") {
        "function"
    } else if head.starts_with("CREATE VIEW") {
        "view"
    } else if head.starts_with("CREATE INDEX") {
        "index"
    } else if head.starts_with("ALTER TABLE") {
        "table-modification"
    } else if head.starts_with("INSERT INTO") {
        "data-insert"
    } else if head.starts_with("UPDATE") {
        "data-update"
    } else if head.starts_with("DELETE FROM") {
        "data-delete"
    } else if head.starts_with("SELECT") {
        "query"
    } else if head.starts_with("DROP") {
        "drop-statement"
    } else if head.starts_with("EXEC") {
        "execution"
    } else {
        "sql-statement"
    }
}

pub struct SqlChunker {
    target_size: usize,
}

impl SqlChunker {
    pub fn new(target_size: usize) -> Self {
        Self { target_size }
    }

    /// Chunk a SQL file into one chunk per statement.
    ///
    /// Statements longer than the target size are sub-split by the line
    /// chunker; every piece keeps the statement's classification tag.
    pub fn chunk_file(&self, file: &SourceFile) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for statement in split_statements(&file.content) {
            let tag = classify_statement(&statement.text);

            if statement.text.len() > self.target_size {
                let sub_chunker = LineChunker::new(self.target_size);
                for mut chunk in
                    sub_chunker.chunk_lines(file, &statement.text, statement.start_line, "sql")
                {
                    chunk.tags = vec![tag.to_string()];
                    chunks.push(chunk);
                }
            } else {
                let mut chunk = Chunk::new(
                    file,
                    statement.text,
                    statement.start_line,
                    statement.end_line,
                    "sql",
                );
                chunk.tags = vec![tag.to_string()];
                chunks.push(chunk);
            }
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::Path;

    fn source(content: &str) -> SourceFile {
        SourceFile::new(Path::new("/db/schema.sql"), content.to_string(), Utc::now())
    }

    #[test]
    fn test_split_simple_statements() {
        let stmts = split_statements("SELECT 1;\nSELECT 2;");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].text, "SELECT 1");
        assert_eq!(stmts[0].start_line, 1);
        assert_eq!(stmts[0].end_line, 1);
        assert_eq!(stmts[1].text, "SELECT 2");
        assert_eq!(stmts[1].start_line, 2);
        assert_eq!(stmts[1].end_line, 2);
    }

    #[test]
    fn test_semicolon_in_string_literal() {
        let stmts = split_statements("INSERT INTO t VALUES ('a;b');\nSELECT 1;");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].text, "INSERT INTO t VALUES ('a;b')");
    }

    #[test]
    fn test_semicolon_in_double_quoted_identifier() {
        let stmts = split_statements("SELECT \"weird;name\" FROM t;");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].text, "SELECT \"weird;name\" FROM t");
    }

    #[test]
    fn test_semicolon_in_line_comment() {
        let stmts = split_statements("SELECT 1 -- trailing; not a terminator\nFROM t;");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].end_line, 2);
    }

    #[test]
    fn test_multi_line_statement_span() {
        let stmts = split_statements("CREATE TABLE t (\n  id INT,\n  name TEXT\n);");
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].start_line, 1);
        assert_eq!(stmts[0].end_line, 4);
    }

    #[test]
    fn test_repeated_statements_get_distinct_spans() {
        let stmts = split_statements("SELECT 1;\nSELECT 1;\nSELECT 1;");
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].start_line, 1);
        assert_eq!(stmts[1].start_line, 2);
        assert_eq!(stmts[2].start_line, 3);
    }

    #[test]
    fn test_missing_final_terminator() {
        let stmts = split_statements("SELECT 1;\nSELECT 2");
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[1].text, "SELECT 2");
    }

    #[test]
    fn test_unterminated_quote_never_panics() {
        let stmts = split_statements("SELECT 'oops;\nSELECT 2;");
        // The dangling quote swallows the rest; best-effort single statement
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(split_statements("").is_empty());
        assert!(split_statements("  \n;\n  ;").is_empty());
    }

    #[test]
    fn test_round_trip_reconstruction() {
        let input = "CREATE TABLE t(id int); INSERT INTO t VALUES(1);";
        let stmts = split_statements(input);
        let rebuilt = stmts
            .iter()
            .map(|s| format!("{};", s.text))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt, input);
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(classify_statement("CREATE TABLE t(id int)"), "table-definition");
        assert_eq!(
            classify_statement("create procedure usp_Get as select 1"),
            "stored-procedure"
        );
        assert_eq!(classify_statement("CREATE FUNCTION f() RETURNS INT"), "function");
        assert_eq!(classify_statement("CREATE VIEW v AS SELECT 1"), "view");
        assert_eq!(classify_statement("CREATE INDEX ix ON t(id)"), "index");
        assert_eq!(classify_statement("ALTER TABLE t ADD c INT"), "table-modification");
        assert_eq!(classify_statement("INSERT INTO t VALUES(1)"), "data-insert");
        assert_eq!(classify_statement("UPDATE t SET c = 1"), "data-update");
        assert_eq!(classify_statement("DELETE FROM t WHERE id = 1"), "data-delete");
        assert_eq!(classify_statement("SELECT * FROM t"), "query");
        assert_eq!(classify_statement("DROP TABLE t"), "drop-statement");
        assert_eq!(classify_statement("EXEC usp_Get"), "execution");
        assert_eq!(classify_statement("GRANT ALL ON t TO app"), "sql-statement");
    }

    #[test]
    fn test_classification_skips_leading_comments() {
        assert_eq!(
            classify_statement("-- users table\nCREATE TABLE users(id int)"),
            "table-definition"
        );
    }

    #[test]
    fn test_chunk_file_tags_and_spans() {
        let file = source("CREATE TABLE t(id int);\nINSERT INTO t VALUES(1);");
        let chunks = SqlChunker::new(3000).chunk_file(&file);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].tags, vec!["table-definition"]);
        assert_eq!(chunks[1].tags, vec!["data-insert"]);
        assert_eq!(chunks[0].language, "sql");
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 1));
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (2, 2));
    }

    #[test]
    fn test_oversized_statement_is_sub_split_with_tag() {
        let rows: String = (0..200)
            .map(|i| format!("  ({i}, 'name_{i}'),\n"))
            .collect();
        let script = format!("INSERT INTO t VALUES\n{rows}  (999, 'last');");
        let file = source(&script);

        let chunks = SqlChunker::new(500).chunk_file(&file);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.tags == vec!["data-insert"]));
        assert!(chunks.iter().all(|c| c.language == "sql"));
        assert_eq!(chunks[0].start_line, 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        }
    }
}
