//! Doclet normalization: collection preparation followed by the enrichment
//! passes that make the collection renderable.
//!
//! Each pass runs over the whole collection before the next starts: ids and
//! signatures read URLs that pass 3 registers, ancestors read every
//! doclet's URL.

mod paths;
pub mod signature;

pub use paths::{common_prefix, SourceFile, SourceTable};

use crate::docset::{DocSet, Query};
use crate::error::Result;
use crate::link::LinkRegistry;
use crate::model::{Doclet, Example, Kind};
use regex::{NoExpand, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static RE_EXAMPLE_CAPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*<caption>([\s\S]+?)</caption>(\s*[\n\r])([\s\S]+)$").unwrap()
});

static RE_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#.+$").unwrap());

// -- Preparation ----------------------------------------------------------------

/// Prune, sort and cross-reference the raw collection.
pub fn prepare(docs: &mut DocSet, keep_private: bool) {
    docs.prune(keep_private);
    docs.sort();
    add_event_listeners(docs);
    docs.update(|d| {
        if d.kind == Kind::External {
            d.name = d.name.trim_matches('"').to_string();
        }
    });
}

/// Each doclet that `listens` to an event is recorded on that event.
fn add_event_listeners(docs: &mut DocSet) {
    let mut by_event: HashMap<usize, Vec<String>> = HashMap::new();
    for listener in docs.iter() {
        for event in &listener.listens {
            for i in docs.find_indices(&Query::new().kind(Kind::Event).longname(event)) {
                by_event
                    .entry(i)
                    .or_default()
                    .push(listener.longname.clone());
            }
        }
    }
    if by_event.is_empty() {
        return;
    }
    let mut i = 0;
    docs.update(|d| {
        if let Some(listeners) = by_event.remove(&i) {
            for l in listeners {
                if !d.listeners.contains(&l) {
                    d.listeners.push(l);
                }
            }
        }
        i += 1;
    });
}

// -- Enrichment -------------------------------------------------------------------

/// Run every enrichment pass. Returns the source file table with shortened
/// paths, in first-seen order.
pub fn normalize(docs: &mut DocSet, links: &mut LinkRegistry) -> Result<Vec<SourceFile>> {
    // 1. examples, see-references, source table
    let mut sources = SourceTable::default();
    docs.update(|d| {
        d.attribs.clear();
        d.example_blocks = d.examples.iter().map(|e| split_example(e)).collect();
        let see = std::mem::take(&mut d.see);
        d.see = see.into_iter().map(|s| hash_to_link(d, &s, links)).collect();
        if let Some(path) = d.source_path() {
            sources.add(path);
        }
    });

    // 2. shortened source paths
    if !sources.is_empty() {
        sources.shorten();
    }

    // 3. link registration
    docs.update(|d| {
        let url = links.create_link(d);
        links.register(&d.longname, &url);
        if let Some(path) = d.source_path() {
            if let (Some(short), Some(meta)) = (sources.shortened(&path), d.meta.as_mut()) {
                meta.shortpath = Some(short.to_string());
            }
        }
    });
    tracing::debug!("registered {} links", links.longnames().len());

    // 4. ids and signatures
    let ids = docs
        .iter()
        .map(|d| links.require_url(&d.longname).map(|url| id_from_url(url, d)))
        .collect::<Result<Vec<_>>>()?;
    let mut ids = ids.into_iter();
    docs.update(|d| {
        if let Some(id) = ids.next() {
            d.id = id;
        }
        signature::synthesize(d, links);
    });

    // 5. ancestors, then 6. constants render as members
    let ancestors: Vec<Vec<String>> = docs
        .iter()
        .map(|d| ancestor_links(docs, d, links))
        .collect();
    let mut ancestors = ancestors.into_iter();
    docs.update(|d| {
        d.ancestors = ancestors.next().unwrap_or_default();
        if d.kind == Kind::Constant {
            d.kind = Kind::Member;
        }
    });

    attach_module_symbols(docs);
    Ok(sources.into_vec())
}

/// Split `<caption>..</caption>` off an example body.
pub fn split_example(example: &str) -> Example {
    match RE_EXAMPLE_CAPTION.captures(example) {
        Some(caps) => Example {
            caption: caps[1].to_string(),
            code: caps[3].to_string(),
        },
        None => Example {
            caption: String::new(),
            code: example.to_string(),
        },
    }
}

/// Rewrite a `#fragment` reference into a link on the doclet's own page.
fn hash_to_link(doclet: &Doclet, see: &str, links: &mut LinkRegistry) -> String {
    if !see.starts_with('#') || see.len() < 2 {
        return see.to_string();
    }
    let url = links.create_link(doclet);
    let url = if RE_FRAGMENT.is_match(&url) {
        RE_FRAGMENT.replace(&url, NoExpand(see)).into_owned()
    } else {
        format!("{}{}", url, see)
    };
    format!("<a href=\"{}\">{}</a>", url, see)
}

fn id_from_url(url: &str, doclet: &Doclet) -> String {
    match url.split_once('#') {
        Some((_, fragment)) => fragment.to_string(),
        None => doclet.name.clone(),
    }
}

/// Links to each enclosing scope, outermost first. The innermost link
/// carries the doclet's own scope punctuation.
pub fn ancestor_links(docs: &DocSet, doclet: &Doclet, links: &LinkRegistry) -> Vec<String> {
    let mut chain: Vec<&Doclet> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::from([doclet.longname.as_str()]);
    let mut current = doclet;
    while let Some(parent) = current.memberof.as_deref() {
        let Some(ancestor) = docs.first(&Query::new().longname(parent)) else {
            break;
        };
        // duplicated module definitions can point back down the chain
        if !visited.insert(ancestor.longname.as_str()) {
            break;
        }
        chain.push(ancestor);
        current = ancestor;
    }
    chain.reverse();

    let mut out: Vec<String> = chain
        .iter()
        .map(|a| {
            let text = format!("{}{}", punctuation(a), a.name);
            links.linkto(&a.longname, Some(&text))
        })
        .collect();
    if let Some(last) = out.last_mut() {
        last.push_str(punctuation(doclet));
    }
    out
}

fn punctuation(doclet: &Doclet) -> &'static str {
    doclet.scope.map(|s| s.punctuation()).unwrap_or("")
}

/// Attach classes and functions exported as a whole module to that module,
/// renamed to how they are imported.
pub fn attach_module_symbols(docs: &mut DocSet) {
    let mut symbols: HashMap<String, Vec<Doclet>> = HashMap::new();
    for d in docs.find(
        &Query::new()
            .kinds(&[Kind::Class, Kind::Function])
            .longname_prefix("module:"),
    ) {
        if d.description.is_none() && d.kind != Kind::Class {
            continue;
        }
        let mut symbol = d.clone();
        if let Some(module) = symbol.name.strip_prefix("module:") {
            symbol.name = format!("(require(\"{}\"))", module);
        }
        symbols.entry(d.longname.clone()).or_default().push(symbol);
    }
    if symbols.is_empty() {
        return;
    }
    docs.update(|d| {
        if d.kind == Kind::Module && d.is.is_none() {
            if let Some(attached) = symbols.remove(&d.longname) {
                d.module_symbols = attached;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::GLOBAL;
    use crate::model::{Category, Meta, Scope, TypeExpr};

    fn meta(path: &str, file: &str, line: u32) -> Option<Meta> {
        Some(Meta {
            path: Some(path.into()),
            filename: Some(file.into()),
            lineno: Some(line),
            ..Default::default()
        })
    }

    fn bookstore() -> DocSet {
        let mut store = Doclet::new(Kind::Module, "Bookstore", "store:Bookstore");
        store.is = Some(Category::Store);
        store.scope = Some(Scope::Static);
        store.meta = meta("/src/demo", "bookstore-module.js", 1);

        let mut action = Doclet::new(
            Kind::Function,
            "getBooksByAuthor",
            "store:Bookstore.getBooksByAuthor",
        );
        action.memberof = Some("store:Bookstore".into());
        action.scope = Some(Scope::Static);
        action.is = Some(Category::Action);
        action.is_async = true;
        action.meta = meta("/src/demo", "bookstore-module.js", 20);
        action.see = vec!["#books".into(), "other".into()];
        action.examples = vec!["<caption>Fetch</caption>\nstore.dispatch('x')".into()];

        let mut limit = Doclet::new(Kind::Constant, "LIMIT", "store:Bookstore.LIMIT");
        limit.memberof = Some("store:Bookstore".into());
        limit.scope = Some(Scope::Static);
        limit.type_ = Some(TypeExpr::new(["Number"]));
        limit.meta = meta("/src/demo/src", "limits.js", 3);

        DocSet::new(vec![action, limit, store])
    }

    fn run(docs: &mut DocSet) -> (LinkRegistry, Vec<SourceFile>) {
        let mut links = LinkRegistry::new(["store", "component", "model"]);
        links.unique_filename("index");
        let global = links.unique_filename(GLOBAL);
        links.register(GLOBAL, &global);
        prepare(docs, false);
        let sources = normalize(docs, &mut links).unwrap();
        (links, sources)
    }

    fn get<'a>(docs: &'a DocSet, longname: &str) -> &'a Doclet {
        docs.first(&Query::new().longname(longname)).unwrap()
    }

    #[test]
    fn registers_urls_and_ids() {
        let mut docs = bookstore();
        let (links, _) = run(&mut docs);
        assert_eq!(links.url("store:Bookstore"), Some("store-Bookstore.html"));
        assert_eq!(
            links.url("store:Bookstore.getBooksByAuthor"),
            Some("store-Bookstore.html#.getBooksByAuthor")
        );
        assert_eq!(get(&docs, "store:Bookstore.getBooksByAuthor").id, ".getBooksByAuthor");
        assert_eq!(get(&docs, "store:Bookstore").id, "Bookstore");
    }

    #[test]
    fn source_paths_are_shortened() {
        let mut docs = bookstore();
        let (_, sources) = run(&mut docs);
        let short: Vec<_> = sources.iter().map(|s| s.shortened.as_str()).collect();
        assert_eq!(short, ["bookstore-module.js", "src/limits.js"]);
        let limit = get(&docs, "store:Bookstore.LIMIT");
        assert_eq!(
            limit.meta.as_ref().unwrap().shortpath.as_deref(),
            Some("src/limits.js")
        );
    }

    #[test]
    fn constants_fold_into_members_after_signatures() {
        let mut docs = bookstore();
        run(&mut docs);
        let limit = get(&docs, "store:Bookstore.LIMIT");
        assert_eq!(limit.kind, Kind::Member);
        assert_eq!(
            limit.signature.as_deref(),
            Some("<span class=\"type-signature\"> Number</span>")
        );
        assert!(limit.attribs.contains(">constant<"));
    }

    #[test]
    fn examples_and_see_references() {
        let mut docs = bookstore();
        run(&mut docs);
        let action = get(&docs, "store:Bookstore.getBooksByAuthor");
        assert_eq!(action.example_blocks[0].caption, "Fetch");
        assert_eq!(action.example_blocks[0].code, "store.dispatch('x')");
        assert_eq!(
            action.see,
            ["<a href=\"store-Bookstore.html#books\">#books</a>", "other"]
        );
    }

    #[test]
    fn ancestors_link_outward() {
        let mut docs = bookstore();
        run(&mut docs);
        let action = get(&docs, "store:Bookstore.getBooksByAuthor");
        assert_eq!(
            action.ancestors,
            ["<a href=\"store-Bookstore.html\">.Bookstore</a>."]
        );
        assert!(get(&docs, "store:Bookstore").ancestors.is_empty());
    }

    #[test]
    fn ancestor_cycle_terminates() {
        let mut a = Doclet::new(Kind::Namespace, "a", "a");
        a.memberof = Some("b".into());
        let mut b = Doclet::new(Kind::Namespace, "b", "b");
        b.memberof = Some("a".into());
        let docs = DocSet::new(vec![a.clone(), b]);
        let links = LinkRegistry::default();
        assert_eq!(ancestor_links(&docs, &a, &links), ["b"]);
    }

    #[test]
    fn listeners_recorded_on_events() {
        let event = Doclet::new(Kind::Event, "added", "event:added");
        let mut handler = Doclet::new(Kind::Function, "onAdded", "onAdded");
        handler.listens = vec!["event:added".into()];
        let mut docs = DocSet::new(vec![handler, event]);
        prepare(&mut docs, false);
        assert_eq!(get(&docs, "event:added").listeners, ["onAdded"]);
    }

    #[test]
    fn module_exports_attach_to_module() {
        let module = Doclet::new(Kind::Module, "cart", "module:cart");
        let mut class = Doclet::new(Kind::Class, "module:cart", "module:cart");
        class.description = None;
        let mut docs = DocSet::new(vec![module, class]);
        attach_module_symbols(&mut docs);
        let module = docs
            .first(&Query::new().kind(Kind::Module).longname("module:cart"))
            .unwrap();
        assert_eq!(module.module_symbols.len(), 1);
        assert_eq!(module.module_symbols[0].name, "(require(\"cart\"))");
    }

    #[test]
    fn external_quotes_are_stripped() {
        let ext = Doclet::new(Kind::External, "\"Vue\"", "external:\"Vue\"");
        let mut docs = DocSet::new(vec![ext]);
        prepare(&mut docs, false);
        assert_eq!(docs.get(0).unwrap().name, "Vue");
    }
}
