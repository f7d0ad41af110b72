//! Generic size-bounded line chunker
//!
//! Walks lines in order, accumulating into the current chunk; when appending
//! the next line would exceed the target size and the current chunk is
//! non-empty, the chunk is emitted and a new one starts at the next line.
//! Chunks never overlap.

use crate::chunking::language::language_for_extension;
use crate::types::{Chunk, SourceFile};

pub struct LineChunker {
    target_size: usize,
}

impl LineChunker {
    pub fn new(target_size: usize) -> Self {
        Self { target_size }
    }

    /// Chunk a file into size-bounded line ranges
    pub fn chunk_file(&self, file: &SourceFile) -> Vec<Chunk> {
        let language = language_for_extension(&file.extension());
        self.chunk_lines(file, &file.content, 1, language)
    }

    /// Chunk `text` belonging to `file`, with line numbers starting at
    /// `first_line`. Used directly for sub-splitting oversized SQL statements.
    pub(crate) fn chunk_lines(
        &self,
        file: &SourceFile,
        text: &str,
        first_line: usize,
        language: &str,
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_start = first_line;

        for (offset, line) in text.lines().enumerate() {
            let line_no = first_line + offset;
            // +1 for the newline that joins the buffered lines
            let projected = buffer.len() + line.len() + if buffer.is_empty() { 0 } else { 1 };

            if projected > self.target_size && !buffer.is_empty() {
                self.push_chunk(&mut chunks, file, &buffer, buffer_start, line_no - 1, language);
                buffer.clear();
                buffer_start = line_no;
            }

            if !buffer.is_empty() {
                buffer.push('\n');
            }
            buffer.push_str(line);
        }

        if !buffer.is_empty() {
            let end_line = first_line + text.lines().count().saturating_sub(1);
            self.push_chunk(&mut chunks, file, &buffer, buffer_start, end_line, language);
        }

        chunks
    }

    fn push_chunk(
        &self,
        chunks: &mut Vec<Chunk>,
        file: &SourceFile,
        content: &str,
        start_line: usize,
        end_line: usize,
        language: &str,
    ) {
        // Whitespace-only spans carry no retrievable content
        if content.trim().is_empty() {
            return;
        }
        chunks.push(Chunk::new(
            file,
            content.to_string(),
            start_line,
            end_line,
            language,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::Path;

    fn source(name: &str, content: &str) -> SourceFile {
        SourceFile::new(Path::new(name), content.to_string(), Utc::now())
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        let chunker = LineChunker::new(100);
        assert!(chunker.chunk_file(&source("/a.txt", "")).is_empty());
    }

    #[test]
    fn test_whitespace_only_file_yields_no_chunks() {
        let chunker = LineChunker::new(100);
        assert!(chunker.chunk_file(&source("/a.txt", "  \n\n\t\n")).is_empty());
    }

    #[test]
    fn test_small_file_is_one_chunk() {
        let chunker = LineChunker::new(100);
        let chunks = chunker.chunk_file(&source("/a.py", "def f():\n    return 1\n"));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 2);
        assert_eq!(chunks[0].language, "python");
        assert_eq!(chunks[0].content, "def f():\n    return 1");
    }

    #[test]
    fn test_double_target_size_yields_two_contiguous_chunks() {
        // 20 uniform lines of 9 chars + newline; target fits exactly half
        let line = "aaaaaaaaa";
        let content: String = (0..20).map(|_| format!("{line}\n")).collect();
        let target = 10 * line.len() + 9; // ten lines joined by nine newlines

        let chunker = LineChunker::new(target);
        let chunks = chunker.chunk_file(&source("/a.txt", &content));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 10);
        assert_eq!(chunks[1].start_line, 11);
        assert_eq!(chunks[1].end_line, 20);
    }

    #[test]
    fn test_oversized_single_line_still_emitted() {
        let chunker = LineChunker::new(10);
        let chunks = chunker.chunk_file(&source("/a.txt", &"x".repeat(50)));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 1);
    }

    #[test]
    fn test_no_overlap_between_chunks() {
        let content: String = (1..=30).map(|i| format!("line number {i}\n")).collect();
        let chunker = LineChunker::new(60);
        let chunks = chunker.chunk_file(&source("/a.txt", &content));

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        }
        assert_eq!(chunks.last().unwrap().end_line, 30);
    }

    #[test]
    fn test_chunk_lines_respects_first_line_offset() {
        let file = source("/q.sql", "unused");
        let chunker = LineChunker::new(1000);
        let chunks = chunker.chunk_lines(&file, "SELECT 1\nFROM t", 42, "sql");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 42);
        assert_eq!(chunks[0].end_line, 43);
        assert_eq!(chunks[0].language, "sql");
    }
}
