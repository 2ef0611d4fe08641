//! Source file table and common-prefix shortening.

use std::collections::HashMap;

/// One source file referenced by the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Path as recorded in doclet metadata.
    pub resolved: String,
    /// Path relative to the common prefix of all sources, `/`-separated.
    pub shortened: String,
}

/// Distinct source paths in first-seen order.
#[derive(Debug, Default)]
pub struct SourceTable {
    files: Vec<SourceFile>,
    index: HashMap<String, usize>,
}

impl SourceTable {
    pub fn add(&mut self, resolved: String) {
        if self.index.contains_key(&resolved) {
            return;
        }
        self.index.insert(resolved.clone(), self.files.len());
        self.files.push(SourceFile {
            shortened: resolved.clone(),
            resolved,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Strip the common directory prefix from every path.
    pub fn shorten(&mut self) {
        let resolved: Vec<String> = self.files.iter().map(|f| f.resolved.clone()).collect();
        let prefix = common_prefix(&resolved);
        for file in &mut self.files {
            let normalized = file.resolved.replace('\\', "/");
            file.shortened = normalized
                .strip_prefix(&prefix)
                .unwrap_or(&normalized)
                .to_string();
        }
    }

    pub fn shortened(&self, resolved: &str) -> Option<&str> {
        self.index
            .get(resolved)
            .map(|&i| self.files[i].shortened.as_str())
    }

    pub fn into_vec(self) -> Vec<SourceFile> {
        self.files
    }
}

/// Longest common directory prefix, `/`-separated and ending in `/`.
/// Empty when the paths share no directory.
pub fn common_prefix(paths: &[String]) -> String {
    let split: Vec<Vec<&str>> = paths.iter().map(|p| p.split(['/', '\\']).collect()).collect();
    let Some(first) = split.first() else {
        return String::new();
    };
    // the last segment is the file name
    let mut depth = first.len().saturating_sub(1);
    for segments in &split[1..] {
        depth = first
            .iter()
            .zip(segments.iter())
            .take(depth.min(segments.len().saturating_sub(1)))
            .take_while(|(a, b)| a == b)
            .count();
    }
    if depth == 0 {
        return String::new();
    }
    format!("{}/", first[..depth].join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_of_sibling_and_nested_files() {
        let paths = vec![
            "/src/demo/bookstore-module.js".to_string(),
            "/src/demo/src/goods.js".to_string(),
        ];
        assert_eq!(common_prefix(&paths), "/src/demo/");
    }

    #[test]
    fn single_file_keeps_its_name() {
        let mut table = SourceTable::default();
        table.add("/a/b/c.js".into());
        table.shorten();
        assert_eq!(table.shortened("/a/b/c.js"), Some("c.js"));
    }

    #[test]
    fn backslashes_become_forward_slashes() {
        let mut table = SourceTable::default();
        table.add(r"C:\proj\src\a.js".into());
        table.add(r"C:\proj\lib\b.js".into());
        table.shorten();
        assert_eq!(table.shortened(r"C:\proj\src\a.js"), Some("src/a.js"));
        assert_eq!(table.shortened(r"C:\proj\lib\b.js"), Some("lib/b.js"));
    }

    #[test]
    fn no_shared_directory() {
        let paths = vec!["a.js".to_string(), "b/c.js".to_string()];
        assert_eq!(common_prefix(&paths), "");
    }

    #[test]
    fn duplicates_are_recorded_once() {
        let mut table = SourceTable::default();
        table.add("x.js".into());
        table.add("x.js".into());
        assert_eq!(table.into_vec().len(), 1);
    }
}
