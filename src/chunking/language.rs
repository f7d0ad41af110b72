//! Language tag detection from file extensions

/// Map a file extension (without the dot, case handled by the caller) to a
/// language tag. Unknown extensions are tagged `text`.
pub fn language_for_extension(extension: &str) -> &'static str {
    match extension {
        "cs" => "csharp",
        "cshtml" | "razor" => "razor",
        "html" | "htm" => "html",
        "css" => "css",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "sql" | "ddl" | "dml" => "sql",
        "json" => "json",
        "xml" | "config" | "csproj" | "sln" => "xml",
        "yaml" | "yml" => "yaml",
        "md" | "markdown" => "markdown",
        _ => "text",
    }
}
