//! Link registry: longname → URL mapping, unique output filenames, fragment
//! ids and inline `{@link}` / `{@tutorial}` resolution.
//!
//! Filenames are claimed case-insensitively for the whole run, so two pages
//! never land on names that collide on a case-folding filesystem.

use crate::error::{PublishError, Result};
use crate::model::{Doclet, Kind, Scope};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Reserved longname of the page holding global symbols.
pub const GLOBAL: &str = "global";
/// Reserved seed of the home page.
pub const INDEX: &str = "index";

const EXTENSION: &str = ".html";

/// Namespaces the host itself defines; custom ones are added by the tag
/// registry.
const BUILTIN_NAMESPACES: &[&str] = &["module", "external", "event"];

/// Characters `encodeURI` leaves alone.
const URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

static RE_UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/?*:|'"<>]"#).unwrap());

static RE_VARIATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([\s\S]*\)$").unwrap());

static RE_LEADING_DOT_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[.-]").unwrap());

static RE_CONTAINER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+?):").unwrap());

static RE_GENERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w$.]+?)\.?<(.+)>$").unwrap());

// [text]{@link target}, {@link target|text}, {@link target text}, {@tutorial name}
static RE_INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\[([^\]]+)\])?\{@(link|linkcode|linkplain|tutorial)\s+([^}]*)\}").unwrap()
});

/// Escape text for HTML element content and attribute values.
pub fn htmlsafe(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn is_url(s: &str) -> bool {
    s.contains("://") || s.starts_with("mailto:")
}

fn encode_uri(s: &str) -> String {
    utf8_percent_encode(s, URI).to_string()
}

/// Run-scoped link state.
#[derive(Debug, Default)]
pub struct LinkRegistry {
    namespaces: Vec<String>,
    /// Claimed filenames, lowercased, mapped to the seed that claimed them.
    files: HashMap<String, String>,
    longname_to_url: HashMap<String, String>,
    /// Registration order of `longname_to_url`.
    order: Vec<String>,
    /// Fragment ids per longname.
    ids: HashMap<String, String>,
    /// Claimed fragment ids per output file, lowercased.
    unique_ids: HashMap<String, HashSet<String>>,
    tutorials: HashMap<String, (String, String)>,
}

impl LinkRegistry {
    pub fn new<'a, I>(custom_namespaces: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut namespaces: Vec<String> =
            BUILTIN_NAMESPACES.iter().map(|s| s.to_string()).collect();
        namespaces.extend(custom_namespaces.into_iter().map(String::from));
        LinkRegistry {
            namespaces,
            ..Default::default()
        }
    }

    // -- filenames --------------------------------------------------------------

    /// Allocate an output filename derived from `seed`, unique for the run.
    pub fn unique_filename(&mut self, seed: &str) -> String {
        let mut basename = seed.to_string();
        if let Some((prefix, rest)) = seed.split_once(':') {
            if self.namespaces.iter().any(|ns| ns == prefix) {
                basename = format!("{}-{}", prefix, rest);
            }
        }
        let basename = RE_UNSAFE_CHARS.replace_all(&basename, "_");
        let basename = basename.replace('~', "-").replace('#', "_");
        let basename = RE_VARIATION.replace(&basename, "");
        let basename = RE_LEADING_DOT_DASH.replace(&basename, "");
        let basename = if basename.is_empty() {
            "_".to_string()
        } else {
            basename.into_owned()
        };
        self.make_unique_filename(basename, seed) + EXTENSION
    }

    fn make_unique_filename(&mut self, mut filename: String, seed: &str) -> String {
        // no leading underscores
        if filename.starts_with('_') {
            filename.insert(0, '-');
        }
        let mut key = filename.to_lowercase();
        while self.files.contains_key(&key) {
            filename.push('_');
            key = filename.to_lowercase();
        }
        self.files.insert(key, seed.to_string());
        filename
    }

    // -- longname → url -----------------------------------------------------------

    /// Record `url` for `longname`. An existing entry is never replaced.
    pub fn register(&mut self, longname: &str, url: &str) -> bool {
        if self.longname_to_url.contains_key(longname) {
            return false;
        }
        self.longname_to_url
            .insert(longname.to_string(), url.to_string());
        self.order.push(longname.to_string());
        true
    }

    pub fn url(&self, longname: &str) -> Option<&str> {
        self.longname_to_url.get(longname).map(String::as_str)
    }

    /// Lookup that treats a missing entry as a data-consistency failure.
    pub fn require_url(&self, longname: &str) -> Result<&str> {
        self.url(longname)
            .ok_or_else(|| PublishError::UnregisteredLink(longname.to_string()))
    }

    /// Registered longnames in registration order.
    pub fn longnames(&self) -> &[String] {
        &self.order
    }

    fn filename_for(&mut self, longname: &str) -> String {
        if let Some(url) = self.url(longname) {
            return url.split('#').next().unwrap_or(url).to_string();
        }
        let filename = self.unique_filename(longname);
        self.register(longname, &filename);
        filename
    }

    /// Compute the URL a doclet is documented at.
    pub fn create_link(&mut self, doclet: &Doclet) -> String {
        let longname = doclet.longname.as_str();
        let fake_container = !doclet.kind.is_container()
            && RE_CONTAINER_PREFIX
                .captures(longname)
                .map(|caps| is_container_name(&caps[1]))
                .unwrap_or(false);

        let mut fragment = String::new();
        let filename;
        if doclet.kind.is_container() || doclet.is_module_exports() {
            filename = self.filename_for(longname);
        } else if fake_container {
            filename = self.filename_for(doclet.memberof.as_deref().unwrap_or(longname));
            if doclet.name != doclet.longname {
                fragment = self.id_for(&filename, longname, &format_name_for_link(doclet));
            }
        } else {
            filename = self.filename_for(doclet.memberof.as_deref().unwrap_or(GLOBAL));
            if doclet.name != doclet.longname || doclet.scope == Some(Scope::Global) {
                fragment = self.id_for(&filename, longname, &format_name_for_link(doclet));
            }
        }

        if fragment.is_empty() {
            encode_uri(&filename)
        } else {
            encode_uri(&format!("{}#{}", filename, fragment))
        }
    }

    fn id_for(&mut self, file: &str, longname: &str, id: &str) -> String {
        if let Some(existing) = self.ids.get(longname) {
            return existing.clone();
        }
        if id.is_empty() {
            return String::new();
        }
        let mut id: String = id.chars().filter(|c| !c.is_whitespace()).collect();
        let taken = self.unique_ids.entry(file.to_string()).or_default();
        while taken.contains(&id.to_lowercase()) {
            id.push('_');
        }
        taken.insert(id.to_lowercase());
        self.ids.insert(longname.to_string(), id.clone());
        id
    }

    // -- link markup ----------------------------------------------------------------

    /// Anchor to `longname` labelled `text`; plain escaped text when the
    /// longname has no page.
    pub fn linkto(&self, longname: &str, text: Option<&str>) -> String {
        let label = text.unwrap_or(longname);
        if let Some(url) = self.url(longname) {
            return format!("<a href=\"{}\">{}</a>", url, htmlsafe(label));
        }
        if is_url(longname) {
            return format!("<a href=\"{}\">{}</a>", htmlsafe(longname), htmlsafe(label));
        }
        htmlsafe(label)
    }

    /// Link every named type inside a type expression such as
    /// `Array.<Item>` or `Item[]`.
    pub fn linkto_type(&self, name: &str) -> String {
        let name = name.trim();
        if self.url(name).is_some() {
            return self.linkto(name, None);
        }
        if let Some(inner) = name.strip_suffix("[]") {
            return format!("{}[]", self.linkto_type(inner));
        }
        if let Some(caps) = RE_GENERIC.captures(name) {
            let args: Vec<String> = split_type_args(&caps[2])
                .into_iter()
                .map(|arg| self.linkto_type(arg))
                .collect();
            return format!(
                "{}.&lt;{}&gt;",
                self.linkto_type(&caps[1]),
                args.join(", ")
            );
        }
        self.linkto(name, None)
    }

    /// Replace inline `{@link}` and `{@tutorial}` tags in rendered HTML.
    pub fn resolve_links(&self, html: &str) -> String {
        RE_INLINE_TAG
            .replace_all(html, |caps: &Captures| {
                let prefix_text = caps.get(1).map(|m| m.as_str());
                let tag = &caps[2];
                let body = caps[3].trim();
                if tag == "tutorial" {
                    return self.tutorial_link(body, prefix_text);
                }
                let (target, text) = split_link_body(body);
                let text = prefix_text.or(text);
                let link = self.linkto(target, text);
                if tag == "linkcode" {
                    wrap_code(&link)
                } else {
                    link
                }
            })
            .into_owned()
    }

    // -- tutorials ----------------------------------------------------------------------

    /// Allocate the page of a tutorial; repeated calls return the same URL.
    pub fn register_tutorial(&mut self, name: &str, title: &str) -> String {
        if let Some((url, _)) = self.tutorials.get(name) {
            return url.clone();
        }
        let url = self.unique_filename(&format!("tutorial-{}", name));
        self.tutorials
            .insert(name.to_string(), (url.clone(), title.to_string()));
        url
    }

    pub fn tutorial_url(&self, name: &str) -> Option<&str> {
        self.tutorials.get(name).map(|(url, _)| url.as_str())
    }

    pub fn tutorial_link(&self, name: &str, text: Option<&str>) -> String {
        match self.tutorials.get(name) {
            Some((url, title)) => format!(
                "<a href=\"{}\">{}</a>",
                url,
                htmlsafe(text.unwrap_or(title))
            ),
            None => format!(
                "<em class=\"disabled\">Tutorial: {}</em>",
                htmlsafe(text.unwrap_or(name))
            ),
        }
    }
}

fn is_container_name(name: &str) -> bool {
    matches!(
        name,
        "class" | "module" | "external" | "namespace" | "mixin" | "interface"
    )
}

/// Fragment id for a doclet documented inside another page.
fn format_name_for_link(doclet: &Doclet) -> String {
    let namespace = match doclet.kind {
        Kind::Module | Kind::External | Kind::Event => format!("{}:", doclet.kind.as_str()),
        _ => String::new(),
    };
    let name = format!(
        "{}{}{}",
        namespace,
        doclet.name,
        doclet.variation.as_deref().unwrap_or("")
    );
    match doclet.scope.map(Scope::punctuation) {
        Some(punc) if punc != "#" => format!("{}{}", punc, name),
        _ => name,
    }
}

fn split_link_body(body: &str) -> (&str, Option<&str>) {
    if let Some((target, text)) = body.split_once('|') {
        return (target.trim(), Some(text.trim()));
    }
    match body.split_once(char::is_whitespace) {
        Some((target, text)) if !text.trim().is_empty() => (target, Some(text.trim())),
        _ => (body, None),
    }
}

fn wrap_code(link: &str) -> String {
    match link.find('>') {
        Some(pos) if link.starts_with("<a ") => {
            let (open, rest) = link.split_at(pos + 1);
            let inner = rest.strip_suffix("</a>").unwrap_or(rest);
            format!("{}<code>{}</code></a>", open, inner)
        }
        _ => format!("<code>{}</code>", link),
    }
}

/// Split generic arguments on top-level commas.
fn split_type_args(args: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in args.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                out.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(args[start..].trim());
    out
}
