//! Page emitter.
//!
//! Builds the typed page data each template receives, renders it through
//! the [`View`] and writes one file per page. URLs come from the link
//! registry; they are percent-decoded back into filenames on write.

use crate::docset::{DocSet, Query};
use crate::error::{PublishError, Result};
use crate::link::{htmlsafe, LinkRegistry, GLOBAL};
use crate::model::{Category, Deprecated, Doclet, Kind, Param};
use crate::nav::{self, Section};
use crate::normalize::SourceFile;
use crate::tutorial::TutorialTree;
use crate::view::{LayoutData, View, GENERATOR};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RE_HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Emission switches taken from the `templates` configuration.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub separate_members: bool,
    pub output_source_files: bool,
    pub search_index: bool,
    pub mainpagetitle: Option<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            separate_members: true,
            output_source_files: true,
            search_index: true,
            mainpagetitle: None,
        }
    }
}

/// Entity categories with their page title prefix, in emission order.
const ENTITY_PAGES: &[(&str, Kind, Option<Category>)] = &[
    ("Module", Kind::Module, None),
    ("Store", Kind::Module, Some(Category::Store)),
    ("Component", Kind::Module, Some(Category::Component)),
    ("Class", Kind::Class, None),
    ("Namespace", Kind::Namespace, None),
    ("Mixin", Kind::Mixin, None),
    ("External", Kind::External, None),
    ("Interface", Kind::Interface, None),
    ("Model", Kind::Module, Some(Category::Model)),
];

// -- Page data ------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamRow {
    pub name: String,
    pub type_html: String,
    pub attributes: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ParamRow {
    fn new(param: &Param, links: &LinkRegistry) -> Self {
        let mut attributes = Vec::new();
        if param.optional {
            attributes.push("&lt;optional&gt;");
        }
        if param.nullable == Some(true) {
            attributes.push("&lt;nullable&gt;");
        }
        if param.variable {
            attributes.push("&lt;repeatable&gt;");
        }
        ParamRow {
            name: param.name.clone().unwrap_or_default(),
            type_html: type_html(param.type_.as_ref().map(|t| &t.names[..]), links),
            attributes,
            default: param.defaultvalue.as_ref().map(value_text),
            description: param.description.clone(),
        }
    }
}

fn type_html(names: Option<&[String]>, links: &LinkRegistry) -> String {
    names
        .unwrap_or_default()
        .iter()
        .map(|n| links.linkto_type(n))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A doclet plus the markup its templates need.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocletView<'a> {
    #[serde(flatten)]
    pub doclet: &'a Doclet,
    pub type_html: String,
    pub param_rows: Vec<ParamRow>,
    pub property_rows: Vec<ParamRow>,
    pub return_rows: Vec<ParamRow>,
    pub exception_rows: Vec<ParamRow>,
    pub fires_links: Vec<String>,
    pub listens_links: Vec<String>,
    pub listener_links: Vec<String>,
    pub is_deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,
}

impl<'a> DocletView<'a> {
    pub fn new(doclet: &'a Doclet, links: &LinkRegistry) -> Self {
        let rows = |params: &[Param]| -> Vec<ParamRow> {
            params.iter().map(|p| ParamRow::new(p, links)).collect()
        };
        let returns = if doclet.yields.is_empty() {
            &doclet.returns
        } else {
            &doclet.yields
        };
        let link_all = |names: &[String]| -> Vec<String> {
            names.iter().map(|n| links.linkto(n, None)).collect()
        };
        DocletView {
            doclet,
            type_html: type_html(doclet.type_.as_ref().map(|t| &t.names[..]), links),
            param_rows: rows(&doclet.params),
            property_rows: rows(&doclet.properties),
            return_rows: rows(returns),
            exception_rows: rows(&doclet.exceptions),
            fires_links: link_all(&doclet.fires),
            listens_links: link_all(&doclet.listens),
            listener_links: link_all(&doclet.listeners),
            is_deprecated: doclet.is_deprecated(),
            deprecated_note: match doclet.deprecated {
                Some(Deprecated::Note(ref note)) => Some(note.clone()),
                _ => None,
            },
            default_text: doclet.defaultvalue.as_ref().map(value_text),
            source_link: source_link(doclet, links),
        }
    }
}

/// `<a href="file.js.html#line12">file.js</a>, line 12`
fn source_link(doclet: &Doclet, links: &LinkRegistry) -> Option<String> {
    let meta = doclet.meta.as_ref()?;
    let short = meta.shortpath.as_deref()?;
    let url = links.url(short)?;
    Some(match meta.lineno {
        Some(line) => format!(
            "<a href=\"{}#line{}\">{}</a>, line {}",
            url,
            line,
            htmlsafe(short),
            line
        ),
        None => format!("<a href=\"{}\">{}</a>", url, htmlsafe(short)),
    })
}

#[derive(Debug, Serialize)]
pub struct SectionView<'a> {
    pub title: &'static str,
    pub id: String,
    pub items: Vec<DocletView<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView<'a> {
    pub doclet: DocletView<'a>,
    pub kind_title: &'static str,
    pub nested: Vec<String>,
    pub exports: Vec<DocletView<'a>>,
    pub sections: Vec<SectionView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SourceLine {
    pub number: usize,
    pub code: String,
}

/// Data handed to the `container` template.
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum PageDoc<'a> {
    Mainpage {
        heading: String,
        packages: Vec<DocletView<'a>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        readme: Option<String>,
    },
    Globals {
        sections: Vec<SectionView<'a>>,
    },
    Entity {
        entities: Vec<EntityView<'a>>,
    },
    Source {
        path: String,
        lines: Vec<SourceLine>,
    },
}

#[derive(Debug, Serialize)]
struct TutorialPage {
    header: String,
    content: String,
    children: Vec<String>,
}

// -- Sections -------------------------------------------------------------------

const MEMBER_SECTIONS: &[&str] = &["Props", "Members", "Computed members"];
const METHOD_SECTIONS: &[&str] = &["Getters", "Watchers", "Mutations", "Actions", "Methods"];

/// Fold the vocabulary partitions into plain Members and Methods.
pub fn merge_sections(sections: Vec<Section<'_>>) -> Vec<Section<'_>> {
    let mut members = Section {
        title: "Members",
        items: Vec::new(),
    };
    let mut methods = Section {
        title: "Methods",
        items: Vec::new(),
    };
    let mut rest = Vec::new();
    for section in sections {
        if MEMBER_SECTIONS.contains(&section.title) {
            members.items.extend(section.items);
        } else if METHOD_SECTIONS.contains(&section.title) {
            methods.items.extend(section.items);
        } else {
            rest.push(section);
        }
    }
    let mut out: Vec<Section<'_>> = [members, methods]
        .into_iter()
        .filter(|s| !s.items.is_empty())
        .collect();
    out.extend(rest);
    out
}

fn section_id(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

// -- Emitter --------------------------------------------------------------------

pub struct Emitter<'a> {
    docs: &'a DocSet,
    links: &'a LinkRegistry,
    view: &'a View,
    nav: &'a str,
    outdir: PathBuf,
    options: EmitOptions,
    written: HashSet<String>,
}

impl<'a> Emitter<'a> {
    pub fn new(
        docs: &'a DocSet,
        links: &'a LinkRegistry,
        view: &'a View,
        nav: &'a str,
        outdir: &Path,
        options: EmitOptions,
    ) -> Self {
        Emitter {
            docs,
            links,
            view,
            nav,
            outdir: outdir.to_path_buf(),
            options,
            written: HashSet::new(),
        }
    }

    fn package(&self) -> Option<&'a Doclet> {
        self.docs.first(&Query::new().kind(Kind::Package))
    }

    /// Render `data` through `template`, wrap it in the layout and write it
    /// to the file `url` points at.
    pub fn generate<T: Serialize>(
        &mut self,
        title: &str,
        template: &str,
        data: &T,
        url: &str,
        resolve_links: bool,
    ) -> Result<PathBuf> {
        let mut html = self.view.render_page(
            template,
            data,
            LayoutData {
                title,
                content: "",
                nav: self.nav,
                package: self.package(),
                generator: GENERATOR,
            },
        )?;
        if resolve_links {
            html = self.links.resolve_links(&html);
        }
        let filename = percent_decode_str(url.split('#').next().unwrap_or(url))
            .decode_utf8_lossy()
            .into_owned();
        if !self.written.insert(filename.to_lowercase()) {
            tracing::warn!("{} written more than once, last write wins", filename);
        }
        let path = self.outdir.join(&filename);
        fs::write(&path, html).map_err(|e| PublishError::io(&path, e))?;
        tracing::debug!("wrote {}", path.display());
        Ok(path)
    }

    /// Pretty-printed listings. An unreadable file is logged and skipped.
    pub fn source_files(&mut self, sources: &[SourceFile]) -> Result<()> {
        if !self.options.output_source_files {
            return Ok(());
        }
        for source in sources {
            let Some(url) = self.links.url(&source.shortened).map(String::from) else {
                continue;
            };
            let text = match fs::read_to_string(&source.resolved) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("unable to read source file {}: {}", source.resolved, e);
                    continue;
                }
            };
            let lines = text
                .lines()
                .enumerate()
                .map(|(i, code)| SourceLine {
                    number: i + 1,
                    code: code.to_string(),
                })
                .collect();
            let page = PageDoc::Source {
                path: source.shortened.clone(),
                lines,
            };
            self.generate(
                &format!("Source: {}", source.shortened),
                "container",
                &page,
                &url,
                false,
            )?;
        }
        Ok(())
    }

    /// The page listing global symbols, when there are any.
    pub fn global_page(&mut self, has_globals: bool) -> Result<()> {
        if !has_globals {
            return Ok(());
        }
        let url = self.links.require_url(GLOBAL)?.to_string();
        let mut sections = nav::global_sections(self.docs);
        if !self.options.separate_members {
            sections = merge_sections(sections);
        }
        let page = PageDoc::Globals {
            sections: self.section_views(sections),
        };
        self.generate("Global", "container", &page, &url, true)?;
        Ok(())
    }

    /// The home page: package metadata plus the rendered README.
    pub fn index_page(&mut self, url: &str, readme: Option<String>) -> Result<()> {
        let packages = self
            .docs
            .find(&Query::new().kind(Kind::Package))
            .into_iter()
            .map(|d| DocletView::new(d, self.links))
            .collect();
        let page = PageDoc::Mainpage {
            heading: self
                .options
                .mainpagetitle
                .clone()
                .unwrap_or_else(|| "Main Page".to_string()),
            packages,
            readme,
        };
        self.generate("Home", "container", &page, url, true)?;
        Ok(())
    }

    /// One page per registered container, category by category.
    pub fn entity_pages(&mut self) -> Result<usize> {
        let mut count = 0;
        let longnames: Vec<String> = self.links.longnames().to_vec();
        for longname in &longnames {
            for &(title, kind, category) in ENTITY_PAGES {
                let query = Query::new().kind(kind).longname(longname);
                let query = match (kind, category) {
                    (_, Some(c)) => query.category(c),
                    (Kind::Module, None) => query.no_category(),
                    _ => query,
                };
                let mut found = self.docs.find(&query);
                if kind == Kind::Class {
                    // a class exported as a module is shown on the module page
                    let module_exists = self
                        .docs
                        .first(&Query::new().kind(Kind::Module).longname(longname))
                        .is_some();
                    if module_exists {
                        found.retain(|d| !d.is_module_exports());
                    }
                }
                let Some(first) = found.first() else {
                    continue;
                };
                let url = self.links.require_url(longname)?.to_string();
                let page_title = format!("{}: {}", title, first.name);
                let entities = found
                    .iter()
                    .map(|&d| self.entity_view(d, title))
                    .collect();
                self.generate(
                    &page_title,
                    "container",
                    &PageDoc::Entity { entities },
                    &url,
                    true,
                )?;
                count += 1;
            }
        }
        Ok(count)
    }

    fn entity_view(&self, doclet: &'a Doclet, kind_title: &'static str) -> EntityView<'a> {
        let mut sections = nav::sections(self.docs, &doclet.longname);
        if !self.options.separate_members {
            sections = merge_sections(sections);
        }
        let nested = self
            .docs
            .find(
                &Query::new()
                    .kinds(&[
                        Kind::Class,
                        Kind::Namespace,
                        Kind::Mixin,
                        Kind::Interface,
                        Kind::Module,
                    ])
                    .memberof(&doclet.longname),
            )
            .into_iter()
            .map(|d| self.links.linkto(&d.longname, Some(&d.name)))
            .collect();
        EntityView {
            doclet: DocletView::new(doclet, self.links),
            kind_title,
            nested,
            exports: doclet
                .module_symbols
                .iter()
                .map(|d| DocletView::new(d, self.links))
                .collect(),
            sections: self.section_views(sections),
        }
    }

    fn section_views(&self, sections: Vec<Section<'a>>) -> Vec<SectionView<'a>> {
        sections
            .into_iter()
            .map(|s| SectionView {
                title: s.title,
                id: section_id(s.title),
                items: s
                    .items
                    .into_iter()
                    .map(|d| DocletView::new(d, self.links))
                    .collect(),
            })
            .collect()
    }

    /// Tutorial pages, parents before children.
    pub fn tutorials(&mut self, tree: &TutorialTree) -> Result<usize> {
        let mut count = 0;
        for tutorial in tree.preorder() {
            let Some(url) = self.links.tutorial_url(&tutorial.name).map(String::from) else {
                continue;
            };
            let page = TutorialPage {
                header: tutorial.title.clone(),
                content: tutorial.parse(),
                children: tree
                    .children(tutorial)
                    .map(|c| self.links.tutorial_link(&c.name, None))
                    .collect(),
            };
            self.generate(
                &format!("Tutorial: {}", tutorial.title),
                "tutorial",
                &page,
                &url,
                true,
            )?;
            count += 1;
        }
        Ok(count)
    }

    /// `search-index.json` for the client-side filter.
    pub fn search_index(&self) -> Result<Option<PathBuf>> {
        if !self.options.search_index {
            return Ok(None);
        }
        let entries = search_entries(self.docs, self.links);
        let path = self.outdir.join("search-index.json");
        let json = serde_json::to_string(&entries)?;
        fs::write(&path, json).map_err(|e| PublishError::io(&path, e))?;
        tracing::debug!("wrote {} search entries", entries.len());
        Ok(Some(path))
    }
}

// -- Search index -----------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SearchEntry<'a> {
    pub longname: &'a str,
    pub name: &'a str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memberof: Option<&'a str>,
    pub url: &'a str,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

pub fn search_entries<'a>(docs: &'a DocSet, links: &'a LinkRegistry) -> Vec<SearchEntry<'a>> {
    docs.iter()
        .filter(|d| !matches!(d.kind, Kind::Package | Kind::File | Kind::Other))
        .filter_map(|d| {
            let url = links.url(&d.longname)?;
            Some(SearchEntry {
                longname: &d.longname,
                name: &d.name,
                kind: d.kind.as_str(),
                is: d.is,
                memberof: d.memberof.as_deref(),
                url,
                description: first_line(d.description.as_deref().unwrap_or("")),
            })
        })
        .collect()
}

fn first_line(html: &str) -> String {
    let text = RE_HTML_TAG.replace_all(html, "");
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}
