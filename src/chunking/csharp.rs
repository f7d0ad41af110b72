//! Structured C# chunker backed by tree-sitter
//!
//! Emits one chunk per method or constructor declaration, carrying the
//! method name, the enclosing type name, and the exact 1-based line span.
//! Files without any method declarations collapse into a single file-level
//! chunk. Parse failures yield an error so the caller can fall back to the
//! line chunker.

use crate::error::ChunkingError;
use crate::types::{Chunk, SourceFile};
use tree_sitter::{Node, Parser};

/// Node kinds that terminate the enclosing-type lookup
const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
];

pub struct CSharpChunker;

impl CSharpChunker {
    pub fn new() -> Self {
        Self
    }

    /// Chunk a C# file into one chunk per method declaration
    pub fn chunk_file(&self, file: &SourceFile) -> Result<Vec<Chunk>, ChunkingError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .map_err(|e| ChunkingError::ParseFailed(format!("Failed to set language: {}", e)))?;

        let tree = parser.parse(&file.content, None).ok_or_else(|| {
            ChunkingError::ParseFailed(format!("Parser produced no tree for {:?}", file.path))
        })?;

        let mut chunks = Vec::new();
        collect_methods(tree.root_node(), file, &mut chunks);

        if chunks.is_empty() {
            let end_line = file.content.lines().count().max(1);
            let mut chunk = Chunk::new(file, file.content.clone(), 1, end_line, "csharp");
            chunk.tags = vec!["file-level".to_string()];
            chunks.push(chunk);
        }

        Ok(chunks)
    }
}

impl Default for CSharpChunker {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_methods(node: Node, file: &SourceFile, result: &mut Vec<Chunk>) {
    let kind = node.kind();
    if kind == "method_declaration" || kind == "constructor_declaration" {
        let content = file.content[node.start_byte()..node.end_byte()].to_string();
        // Tree-sitter rows are 0-indexed
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;

        let mut chunk = Chunk::new(file, content, start_line, end_line, "csharp");
        chunk.function_name = named_child_text(node, file);
        chunk.class_name = enclosing_type_name(node, file);
        chunk.tags = vec!["method".to_string()];
        result.push(chunk);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_methods(child, file, result);
    }
}

fn named_child_text(node: Node, file: &SourceFile) -> Option<String> {
    node.child_by_field_name("name")
        .and_then(|n| n.utf8_text(file.content.as_bytes()).ok())
        .map(|s| s.to_string())
}

fn enclosing_type_name(node: Node, file: &SourceFile) -> Option<String> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if TYPE_KINDS.contains(&parent.kind()) {
            return named_child_text(parent, file);
        }
        current = parent.parent();
    }
    None
}
