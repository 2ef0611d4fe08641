//! Run configuration.
//!
//! The JSON file keeps the host's key names (`opts`, `templates`,
//! `templates.default`) so an existing configuration file can be reused
//! as is. Unknown keys are ignored.

use crate::error::{PublishError, Result};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default scan depth for user static files.
pub const STATIC_SCAN_DEPTH: usize = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub opts: Opts,
    pub templates: Templates,
}

/// Run options; every field can also come from the command line, which
/// takes precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Opts {
    pub destination: Option<PathBuf>,
    pub encoding: Option<String>,
    pub readme: Option<PathBuf>,
    pub template: Option<PathBuf>,
    pub tutorials: Option<PathBuf>,
    pub mainpagetitle: Option<String>,
    pub private: Option<bool>,
}

impl Opts {
    /// Fields set in `over` replace ours.
    pub fn overlay(self, over: Opts) -> Opts {
        Opts {
            destination: over.destination.or(self.destination),
            encoding: over.encoding.or(self.encoding),
            readme: over.readme.or(self.readme),
            template: over.template.or(self.template),
            tutorials: over.tutorials.or(self.tutorials),
            mainpagetitle: over.mainpagetitle.or(self.mainpagetitle),
            private: over.private.or(self.private),
        }
    }

    pub fn destination(&self) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| PathBuf::from("./out/"))
    }

    pub fn encoding(&self) -> &str {
        self.encoding.as_deref().unwrap_or("utf8")
    }

    pub fn keep_private(&self) -> bool {
        self.private.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Templates {
    pub separate_members: bool,
    pub use_collapsibles: bool,
    pub use_versionning: bool,
    pub search_index: bool,
    pub default: TemplateDefaults,
}

impl Default for Templates {
    fn default() -> Self {
        Templates {
            separate_members: true,
            use_collapsibles: true,
            use_versionning: false,
            search_index: true,
            default: TemplateDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateDefaults {
    pub layout_file: Option<PathBuf>,
    pub use_longname_in_nav: bool,
    pub output_source_files: bool,
    pub static_files: Option<StaticFiles>,
}

impl Default for TemplateDefaults {
    fn default() -> Self {
        TemplateDefaults {
            layout_file: None,
            use_longname_in_nav: false,
            output_source_files: true,
            static_files: None,
        }
    }
}

/// User static files copied next to the template's own.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaticFiles {
    pub include: Vec<PathBuf>,
    /// Older spelling of `include`.
    pub paths: Vec<PathBuf>,
    pub exclude: Vec<PathBuf>,
    pub include_pattern: Option<String>,
    pub exclude_pattern: Option<String>,
    pub depth: usize,
}

impl Default for StaticFiles {
    fn default() -> Self {
        StaticFiles {
            include: Vec::new(),
            paths: Vec::new(),
            exclude: Vec::new(),
            include_pattern: None,
            exclude_pattern: None,
            depth: STATIC_SCAN_DEPTH,
        }
    }
}

impl StaticFiles {
    pub fn include_paths(&self) -> &[PathBuf] {
        if self.include.is_empty() {
            &self.paths
        } else {
            &self.include
        }
    }

    /// Compile the include/exclude patterns.
    pub fn filter(&self) -> Result<FileFilter> {
        Ok(FileFilter {
            include: compile(self.include_pattern.as_deref(), "includePattern")?,
            exclude: compile(self.exclude_pattern.as_deref(), "excludePattern")?,
            excluded_paths: self.exclude.clone(),
        })
    }
}

fn compile(pattern: Option<&str>, key: &str) -> Result<Option<Regex>> {
    pattern
        .map(|p| {
            Regex::new(p).map_err(|e| PublishError::Config(format!("invalid {}: {}", key, e)))
        })
        .transpose()
}

/// Path filter for user static files.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
    excluded_paths: Vec<PathBuf>,
}

impl FileFilter {
    pub fn accepts(&self, path: &Path) -> bool {
        if self.excluded_paths.iter().any(|ex| path.starts_with(ex)) {
            return false;
        }
        let text = path.to_string_lossy();
        if let Some(ref include) = self.include {
            if !include.is_match(&text) {
                return false;
            }
        }
        if let Some(ref exclude) = self.exclude {
            if exclude.is_match(&text) {
                return false;
            }
        }
        true
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Config> {
        serde_json::from_str(json)
            .map_err(|e| PublishError::Config(format!("invalid configuration: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Config> {
        let json = fs::read_to_string(path).map_err(|e| PublishError::io(path, e))?;
        Self::from_json(&json)
    }
}

/// Only UTF-8 source listings are supported.
pub fn check_encoding(encoding: &str) -> Result<()> {
    match encoding.to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => Ok(()),
        other => Err(PublishError::Config(format!(
            "unsupported encoding {}",
            other
        ))),
    }
}
