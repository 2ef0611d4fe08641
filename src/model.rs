//! Doclet model: the records handed over by the extraction host.
//!
//! Field names follow the host's JSON dump so a dump deserializes directly;
//! the derived fields at the bottom of [`Doclet`] are filled in by
//! [`crate::normalize`].

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fixed doclet kind assigned by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Module,
    Function,
    Member,
    Constant,
    Event,
    Typedef,
    Class,
    Namespace,
    Mixin,
    Interface,
    External,
    Package,
    File,
    #[default]
    #[serde(other)]
    Other,
}

impl Kind {
    /// Kinds that get an output page of their own.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            Kind::Class
                | Kind::Module
                | Kind::External
                | Kind::Namespace
                | Kind::Mixin
                | Kind::Interface
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Module => "module",
            Kind::Function => "function",
            Kind::Member => "member",
            Kind::Constant => "constant",
            Kind::Event => "event",
            Kind::Typedef => "typedef",
            Kind::Class => "class",
            Kind::Namespace => "namespace",
            Kind::Mixin => "mixin",
            Kind::Interface => "interface",
            Kind::External => "external",
            Kind::Package => "package",
            Kind::File => "file",
            Kind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Static,
    Instance,
    Inner,
}

impl Scope {
    /// Punctuation joining a member to its parent in a longname.
    pub fn punctuation(self) -> &'static str {
        match self {
            Scope::Global => "",
            Scope::Static => ".",
            Scope::Instance => "#",
            Scope::Inner => "~",
        }
    }
}

/// Secondary classification (`is`) set by the custom tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Store,
    Action,
    Mutation,
    Getter,
    Watcher,
    Component,
    Model,
}

/// `@deprecated` is either a bare flag or carries a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Deprecated {
    Flag(bool),
    Note(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeExpr {
    #[serde(default)]
    pub names: Vec<String>,
}

impl TypeExpr {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeExpr {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// A parameter, property, return or yield declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Param {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeExpr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    /// Rest parameter (`...args`).
    pub variable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaultvalue: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// Source provenance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    /// Path relative to the common source prefix, set during normalization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortpath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeMeta>,
}

/// A raw annotation the host did not interpret itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub title: String,
    #[serde(rename = "originalTitle", skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// `@lifecycle` entry: hook name plus optional note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedValue {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An `@example` split into its caption and body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub caption: String,
    pub code: String,
}

/// A single documentation record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Doclet {
    pub kind: Kind,
    pub name: String,
    pub longname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memberof: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<Deprecated>,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub generator: bool,
    pub readonly: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    pub optional: bool,
    pub undocumented: bool,
    pub ignore: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classdesc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeExpr>,
    pub params: Vec<Param>,
    pub returns: Vec<Param>,
    pub yields: Vec<Param>,
    pub properties: Vec<Param>,
    pub exceptions: Vec<Param>,
    pub examples: Vec<String>,
    pub see: Vec<String>,
    pub fires: Vec<String>,
    pub listens: Vec<String>,
    pub listeners: Vec<String>,
    pub author: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaultvalue: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    /// Raw custom annotations still to be applied by the tag registry.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    // -- vocabulary markers (set by the tag registry) -------------------------
    #[serde(rename = "vuexModule", skip_serializing_if = "Option::is_none")]
    pub vuex_module: Option<String>,
    pub namespaced: bool,
    pub computed: bool,
    #[serde(rename = "isProp")]
    pub is_prop: bool,
    pub lifecycles: Vec<NamedValue>,
    pub routes: Vec<String>,

    // -- derived (set by the normalizer) --------------------------------------
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub attribs: String,
    pub ancestors: Vec<String>,
    #[serde(rename = "exampleBlocks")]
    pub example_blocks: Vec<Example>,
    /// Classes or functions exported as the whole module.
    #[serde(rename = "modules", skip_serializing_if = "Vec::is_empty")]
    pub module_symbols: Vec<Doclet>,
}

impl Doclet {
    /// Shorthand used by tests and fixtures.
    pub fn new(kind: Kind, name: &str, longname: &str) -> Self {
        Doclet {
            kind,
            name: name.to_string(),
            longname: longname.to_string(),
            ..Default::default()
        }
    }

    /// Nav entries without a longname are anonymous groups.
    pub fn is_anonymous(&self) -> bool {
        self.longname.is_empty()
    }

    /// A class or function that is itself the export of a module.
    pub fn is_module_exports(&self) -> bool {
        self.longname.starts_with("module:")
            && self.longname == self.name
            && self.kind != Kind::Module
    }

    /// Resolved source file this doclet came from, if any.
    pub fn source_path(&self) -> Option<String> {
        let meta = self.meta.as_ref()?;
        let filename = meta.filename.as_deref()?;
        match meta.path.as_deref() {
            Some(dir) if dir != "null" && !dir.is_empty() => {
                Some(Path::new(dir).join(filename).to_string_lossy().into_owned())
            }
            _ => Some(filename.to_string()),
        }
    }

    pub fn is_deprecated(&self) -> bool {
        !matches!(self.deprecated, None | Some(Deprecated::Flag(false)))
    }
}
