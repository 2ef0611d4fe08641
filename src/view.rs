//! Template view.
//!
//! Wraps a handlebars registry holding the `container`, `tutorial` and
//! `layout` templates plus any partials. Every `*.hbs` file is registered
//! under its file stem, so any template can be pulled in as a partial with
//! `{{> name}}`. Pages are rendered in two steps: the page template first,
//! then the layout with the page HTML as `content`.

use crate::error::{PublishError, Result};
use handlebars::Handlebars;
use include_dir::{include_dir, Dir, DirEntry};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The default template, compiled into the binary.
pub static BUNDLED_TEMPLATE: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/template");

const LAYOUT: &str = "layout";
const REQUIRED: &[&str] = &["container", "tutorial", LAYOUT];

/// Data every page layout receives.
#[derive(Debug, Serialize)]
pub struct LayoutData<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub nav: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<&'a crate::model::Doclet>,
    pub generator: &'static str,
}

pub const GENERATOR: &str = concat!("vuexdoc ", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct View {
    hbs: Handlebars<'static>,
}

impl View {
    fn empty() -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(false);
        View { hbs }
    }

    /// Templates bundled with the crate.
    pub fn bundled() -> Result<Self> {
        let mut view = Self::empty();
        let templates = BUNDLED_TEMPLATE
            .get_dir("templates")
            .ok_or_else(|| PublishError::Config("bundled template has no templates/".into()))?;
        for entry in templates.entries() {
            if let DirEntry::File(file) = entry {
                let Some(name) = hbs_stem(file.path()) else {
                    continue;
                };
                let source = file.contents_utf8().ok_or_else(|| {
                    PublishError::Config(format!("{} is not UTF-8", file.path().display()))
                })?;
                view.register(&name, source)?;
            }
        }
        view.check()?;
        Ok(view)
    }

    /// Templates from `<template_dir>/templates`.
    pub fn from_dir(template_dir: &Path) -> Result<Self> {
        let dir = template_dir.join("templates");
        let entries = fs::read_dir(&dir).map_err(|e| {
            PublishError::Config(format!("template directory {}: {}", dir.display(), e))
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut view = Self::empty();
        for path in paths {
            let Some(name) = hbs_stem(&path) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|e| PublishError::io(&path, e))?;
            view.register(&name, &source)?;
        }
        view.check()?;
        Ok(view)
    }

    fn register(&mut self, name: &str, source: &str) -> Result<()> {
        self.hbs
            .register_template_string(name, source)
            .map_err(|e| PublishError::Template {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    fn check(&self) -> Result<()> {
        for name in REQUIRED {
            if !self.hbs.has_template(name) {
                return Err(PublishError::Config(format!(
                    "template {} is missing",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Replace the layout with a user-supplied file.
    pub fn set_layout_file(&mut self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path).map_err(|e| {
            PublishError::Config(format!("layout file {}: {}", path.display(), e))
        })?;
        self.register(LAYOUT, &source)
    }

    /// Render one template on its own.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.hbs
            .render(name, data)
            .map_err(|e| PublishError::Render {
                name: name.to_string(),
                source: Box::new(e),
            })
    }

    /// Render a page template and wrap it in the layout.
    pub fn render_page<T: Serialize>(
        &self,
        name: &str,
        data: &T,
        layout: LayoutData<'_>,
    ) -> Result<String> {
        let content = self.render(name, data)?;
        self.render(
            LAYOUT,
            &LayoutData {
                title: layout.title,
                content: &content,
                nav: layout.nav,
                package: layout.package,
                generator: layout.generator,
            },
        )
    }
}

fn hbs_stem(path: &Path) -> Option<String> {
    if path.extension()? != "hbs" {
        return None;
    }
    path.file_stem()?.to_str().map(String::from)
}

/// Locate a configured layout file: absolute, relative to the template
/// directory, then relative to the working directory.
pub fn resolve_layout(layout: &Path, template_dir: Option<&Path>) -> Result<PathBuf> {
    if layout.is_absolute() {
        if layout.is_file() {
            return Ok(layout.to_path_buf());
        }
    } else {
        if let Some(dir) = template_dir {
            let candidate = dir.join(layout);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        if layout.is_file() {
            return Ok(layout.to_path_buf());
        }
    }
    Err(PublishError::Config(format!(
        "layout file {} not found",
        layout.display()
    )))
}
