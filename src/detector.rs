//! Project archetype detection from marker files
//!
//! Collects every matching archetype before deciding, then resolves
//! conflicts by a fixed priority order.

use crate::types::ProjectType;
use ignore::WalkBuilder;
use std::path::Path;

/// SQL file count above which a tree is classified as a database project
const SQL_FILE_THRESHOLD: usize = 5;

/// Detect the project archetype for a root directory.
///
/// Marker checks are collected first; when more than one archetype matches,
/// the priority order is WebForms > DotNetCore > Angular > React, and any
/// other combination resolves to `Mixed`. No match yields `Unknown`, as do
/// I/O errors while probing the tree.
pub fn detect_project_type(root: &Path) -> ProjectType {
    if !root.is_dir() {
        tracing::warn!("Project detection failed, not a directory: {:?}", root);
        return ProjectType::Unknown;
    }

    let mut matches = Vec::new();

    if root.join("Properties").is_dir() && root.join("Program.cs").is_file() {
        matches.push(ProjectType::DotNetCore);
    }

    if root.join("packages.config").is_file() || root.join("App.config").is_file() {
        matches.push(ProjectType::DotNetFramework);
    }

    if root.join("App_Code").is_dir()
        || root.join("App_Data").is_dir()
        || root.join("Web.config").is_file()
    {
        matches.push(ProjectType::WebForms);
    }

    if root.join("requirements.txt").is_file()
        || root.join("setup.py").is_file()
        || root.join("Pipfile").is_file()
    {
        matches.push(ProjectType::Python);
    }

    let has_package_json = root.join("package.json").is_file();
    let has_angular_json = root.join("angular.json").is_file();
    let has_vue_config = root.join("vue.config.js").is_file();

    if has_package_json && !has_angular_json && !has_vue_config {
        matches.push(ProjectType::NodeJs);
    }

    if has_angular_json {
        matches.push(ProjectType::Angular);
    }

    if has_package_json && package_json_mentions_react(root) {
        matches.push(ProjectType::React);
    }

    if has_vue_config || root.join("nuxt.config.js").is_file() {
        matches.push(ProjectType::Vue);
    }

    if root.join("pom.xml").is_file() || root.join("build.gradle").is_file() {
        matches.push(ProjectType::Java);
    }

    if is_sql_database_tree(root) {
        matches.push(ProjectType::SqlDatabase);
    }

    let detected = resolve(&matches);
    tracing::debug!(
        "Detected project type {} for {:?} (candidates: {:?})",
        detected,
        root,
        matches
    );
    detected
}

fn resolve(matches: &[ProjectType]) -> ProjectType {
    match matches {
        [] => ProjectType::Unknown,
        [single] => *single,
        _ => {
            // Priority order for ambiguous trees
            for preferred in [
                ProjectType::WebForms,
                ProjectType::DotNetCore,
                ProjectType::Angular,
                ProjectType::React,
            ] {
                if matches.contains(&preferred) {
                    return preferred;
                }
            }
            ProjectType::Mixed
        }
    }
}

fn package_json_mentions_react(root: &Path) -> bool {
    match std::fs::read_to_string(root.join("package.json")) {
        Ok(content) => content.contains("react") || content.contains("react-dom"),
        Err(e) => {
            tracing::warn!("Failed to read package.json under {:?}: {}", root, e);
            false
        }
    }
}

/// A tree is a database project when it holds more than [`SQL_FILE_THRESHOLD`]
/// `.sql` files, or contains a `database.sql`/`schema.sql` anywhere.
fn is_sql_database_tree(root: &Path) -> bool {
    let walker = WalkBuilder::new(root)
        .standard_filters(true)
        .hidden(false)
        .require_git(false)
        .build();

    let mut sql_count = 0usize;
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Error while probing {:?} for SQL files: {}", root, e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name == "database.sql" || name == "schema.sql" {
            return true;
        }
        if name.ends_with(".sql") {
            sql_count += 1;
            if sql_count > SQL_FILE_THRESHOLD {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_directory_is_unknown() {
        let dir = TempDir::new().unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Unknown);
    }

    #[test]
    fn test_nonexistent_directory_is_unknown() {
        assert_eq!(
            detect_project_type(Path::new("/no/such/dir")),
            ProjectType::Unknown
        );
    }

    #[test]
    fn test_dotnet_core_needs_both_markers() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Properties")).unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Unknown);

        fs::write(dir.path().join("Program.cs"), "class Program {}").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::DotNetCore);
    }

    #[test]
    fn test_dotnet_framework() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("packages.config"), "<packages/>").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::DotNetFramework);
    }

    #[test]
    fn test_webforms() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Web.config"), "<configuration/>").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::WebForms);
    }

    #[test]
    fn test_python() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask\n").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Python);
    }

    #[test]
    fn test_plain_node() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name":"app"}"#).unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::NodeJs);
    }

    #[test]
    fn test_angular_beats_node() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name":"app"}"#).unwrap();
        fs::write(dir.path().join("angular.json"), "{}").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Angular);
    }

    #[test]
    fn test_react_beats_node() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"dependencies":{"react":"^18.0.0"}}"#,
        )
        .unwrap();
        // Matches NodeJs and React; React wins by priority
        assert_eq!(detect_project_type(dir.path()), ProjectType::React);
    }

    #[test]
    fn test_vue() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("vue.config.js"), "module.exports = {}").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Vue);
    }

    #[test]
    fn test_java() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Java);
    }

    #[test]
    fn test_sql_by_marker_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("schema.sql"), "CREATE TABLE t(id int);").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::SqlDatabase);
    }

    #[test]
    fn test_sql_by_file_count() {
        let dir = TempDir::new().unwrap();
        for i in 0..6 {
            fs::write(dir.path().join(format!("migration_{i}.sql")), "SELECT 1;").unwrap();
        }
        assert_eq!(detect_project_type(dir.path()), ProjectType::SqlDatabase);
    }

    #[test]
    fn test_five_sql_files_is_not_enough() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("migration_{i}.sql")), "SELECT 1;").unwrap();
        }
        assert_eq!(detect_project_type(dir.path()), ProjectType::Unknown);
    }

    #[test]
    fn test_webforms_wins_over_dotnet_core() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Properties")).unwrap();
        fs::write(dir.path().join("Program.cs"), "class Program {}").unwrap();
        fs::write(dir.path().join("Web.config"), "<configuration/>").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::WebForms);
    }

    #[test]
    fn test_unrelated_combination_is_mixed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask\n").unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        assert_eq!(detect_project_type(dir.path()), ProjectType::Mixed);
    }
}
