//! Tutorial tree.
//!
//! Tutorials live in an arena; a node records at most one parent and
//! [`TutorialTree::attach`] refuses any link that would give a node a
//! second parent or close a cycle, so the pre-order walk always terminates.

use crate::error::{PublishError, Result};
use crate::markdown;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Markdown,
}

impl ContentType {
    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "md" | "markdown" => Some(ContentType::Markdown),
            "html" | "htm" | "xhtml" | "xml" => Some(ContentType::Html),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tutorial {
    pub name: String,
    pub title: String,
    pub content: String,
    pub content_type: ContentType,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Tutorial {
    pub fn new(name: &str, content: &str, content_type: ContentType) -> Self {
        Tutorial {
            name: name.to_string(),
            title: name.to_string(),
            content: content.to_string(),
            content_type,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Content rendered to HTML.
    pub fn parse(&self) -> String {
        match self.content_type {
            ContentType::Markdown => markdown::to_html(&self.content),
            ContentType::Html => self.content.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TreeError {
    #[error("unknown tutorial {0}")]
    Unknown(String),
    #[error("tutorial {child} already has parent {parent}")]
    HasParent { child: String, parent: String },
    #[error("making {child} a child of {parent} would create a cycle")]
    Cycle { child: String, parent: String },
}

#[derive(Debug, Default)]
pub struct TutorialTree {
    nodes: Vec<Tutorial>,
    by_name: HashMap<String, usize>,
}

impl TutorialTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a parentless tutorial. A duplicate name is ignored.
    pub fn add(&mut self, mut tutorial: Tutorial) -> bool {
        if self.by_name.contains_key(&tutorial.name) {
            tracing::warn!("duplicate tutorial {} ignored", tutorial.name);
            return false;
        }
        tutorial.parent = None;
        tutorial.children.clear();
        self.by_name.insert(tutorial.name.clone(), self.nodes.len());
        self.nodes.push(tutorial);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Tutorial> {
        self.by_name.get(name).map(|&i| &self.nodes[i])
    }

    fn index(&self, name: &str) -> std::result::Result<usize, TreeError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| TreeError::Unknown(name.to_string()))
    }

    /// Make `child` the last child of `parent`.
    pub fn attach(&mut self, parent: &str, child: &str) -> std::result::Result<(), TreeError> {
        let p = self.index(parent)?;
        let c = self.index(child)?;
        if let Some(existing) = self.nodes[c].parent {
            return Err(TreeError::HasParent {
                child: child.to_string(),
                parent: self.nodes[existing].name.clone(),
            });
        }
        let mut cursor = Some(p);
        while let Some(i) = cursor {
            if i == c {
                return Err(TreeError::Cycle {
                    child: child.to_string(),
                    parent: parent.to_string(),
                });
            }
            cursor = self.nodes[i].parent;
        }
        self.nodes[c].parent = Some(p);
        self.nodes[p].children.push(c);
        Ok(())
    }

    pub fn set_title(&mut self, name: &str, title: &str) {
        if let Some(&i) = self.by_name.get(name) {
            self.nodes[i].title = title.to_string();
        }
    }

    /// Parentless tutorials in insertion order.
    pub fn top_level(&self) -> impl Iterator<Item = &Tutorial> + '_ {
        self.nodes.iter().filter(|t| t.parent.is_none())
    }

    pub fn children<'a>(&'a self, tutorial: &'a Tutorial) -> impl Iterator<Item = &'a Tutorial> + 'a {
        tutorial.children.iter().map(move |&i| &self.nodes[i])
    }

    /// Parents before children, siblings in declaration order.
    pub fn preorder(&self) -> Vec<&Tutorial> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, t)| t.parent.is_none())
            .map(|(i, _)| i)
            .rev()
            .collect();
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    // -- loading ------------------------------------------------------------------

    /// Read every tutorial file and JSON descriptor under `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut tree = TutorialTree::new();
        let mut confs: Vec<(String, TutorialConf)> = Vec::new();

        let files: Vec<_> = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let ext = path
                .extension()
                .and_then(|s| s.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            let content_type = ContentType::from_extension(&ext);
            if ext != "json" && content_type.is_none() {
                continue;
            }
            let content =
                fs::read_to_string(&path).map_err(|e| PublishError::io(&path, e))?;
            match content_type {
                Some(content_type) => {
                    tree.add(Tutorial::new(stem, &content, content_type));
                }
                None => {
                    let value: serde_json::Value = serde_json::from_str(&content)?;
                    collect_confs(stem, value, &mut confs)?;
                }
            }
        }

        for (name, conf) in &confs {
            tree.configure(name, conf);
        }
        tracing::info!("loaded {} tutorials", tree.nodes.len());
        Ok(tree)
    }

    fn configure(&mut self, name: &str, conf: &TutorialConf) {
        if self.get(name).is_none() {
            tracing::warn!("metadata for unknown tutorial {}", name);
            return;
        }
        if let Some(ref title) = conf.title {
            self.set_title(name, title);
        }
        let children: Vec<&str> = match conf.children {
            Some(Children::Names(ref names)) => names.iter().map(String::as_str).collect(),
            Some(Children::Nested(ref nested)) => nested.keys().map(String::as_str).collect(),
            None => Vec::new(),
        };
        for child in children {
            if let Err(e) = self.attach(name, child) {
                tracing::warn!("{}", e);
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TutorialConf {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    children: Option<Children>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Children {
    Names(Vec<String>),
    Nested(serde_json::Map<String, serde_json::Value>),
}

/// A descriptor either configures the tutorial it is named after, or maps
/// several tutorial names to their configuration.
fn collect_confs(
    stem: &str,
    value: serde_json::Value,
    out: &mut Vec<(String, TutorialConf)>,
) -> Result<()> {
    let is_single = value
        .as_object()
        .map(|o| o.contains_key("title") || o.contains_key("children"))
        .unwrap_or(false);
    if is_single {
        let conf: TutorialConf = serde_json::from_value(value)?;
        push_conf(stem.to_string(), conf, out)?;
    } else {
        let many: serde_json::Map<String, serde_json::Value> = serde_json::from_value(value)?;
        for (name, conf) in many {
            push_conf(name, serde_json::from_value(conf)?, out)?;
        }
    }
    Ok(())
}

/// Nested children are configured before their parent, in declaration order.
fn push_conf(
    name: String,
    conf: TutorialConf,
    out: &mut Vec<(String, TutorialConf)>,
) -> Result<()> {
    if let Some(Children::Nested(ref nested)) = conf.children {
        for (child, child_conf) in nested {
            push_conf(child.clone(), serde_json::from_value(child_conf.clone())?, out)?;
        }
    }
    out.push((name, conf));
    Ok(())
}
