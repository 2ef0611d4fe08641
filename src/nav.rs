//! Navigation sidebar.
//!
//! Categories are rendered in a fixed order and share one "seen" set: once
//! a doclet has been listed, either at the top level or inside another
//! entry's sub-navigation, it is not listed at the top level again.
//! Tutorials keep a seen set of their own.

use crate::docset::{DocSet, Query};
use crate::link::{LinkRegistry, GLOBAL};
use crate::model::{Category, Doclet, Kind, Scope};
use crate::tutorial::TutorialTree;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static RE_NAMESPACE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(module|event):").unwrap());

const TOGGLE: &str =
    "<button type=\"button\" class=\"toggle-subnav\">  <span class=\"toggler\">+</span></button>";

const FUNCTION_CATEGORIES: &[Category] = &[
    Category::Getter,
    Category::Watcher,
    Category::Mutation,
    Category::Action,
];

#[derive(Debug, Clone, Copy)]
pub struct NavOptions {
    pub use_collapsibles: bool,
    pub use_longname_in_nav: bool,
}

impl Default for NavOptions {
    fn default() -> Self {
        NavOptions {
            use_collapsibles: true,
            use_longname_in_nav: false,
        }
    }
}

// -- Members ------------------------------------------------------------------

/// Top-level doclets grouped by category, in collection order.
#[derive(Debug, Default)]
pub struct Members<'a> {
    pub components: Vec<&'a Doclet>,
    pub stores: Vec<&'a Doclet>,
    pub models: Vec<&'a Doclet>,
    pub modules: Vec<&'a Doclet>,
    pub externals: Vec<&'a Doclet>,
    pub classes: Vec<&'a Doclet>,
    pub events: Vec<&'a Doclet>,
    pub namespaces: Vec<&'a Doclet>,
    pub mixins: Vec<&'a Doclet>,
    pub interfaces: Vec<&'a Doclet>,
    pub globals: Vec<&'a Doclet>,
}

impl<'a> Members<'a> {
    pub fn collect(docs: &'a DocSet) -> Self {
        let modules_of = |category: Option<Category>| {
            let query = Query::new().kind(Kind::Module);
            let query = match category {
                Some(c) => query.category(c),
                None => query.no_category(),
            };
            docs.find(&query)
        };
        Members {
            components: modules_of(Some(Category::Component)),
            stores: modules_of(Some(Category::Store)),
            models: modules_of(Some(Category::Model)),
            modules: modules_of(None),
            externals: docs.find(&Query::new().kind(Kind::External)),
            classes: docs.find(&Query::new().kind(Kind::Class)),
            events: docs.find(&Query::new().kind(Kind::Event)),
            namespaces: docs.find(&Query::new().kind(Kind::Namespace)),
            mixins: docs.find(&Query::new().kind(Kind::Mixin)),
            interfaces: docs.find(&Query::new().kind(Kind::Interface)),
            globals: docs
                .find(
                    &Query::new()
                        .kinds(&[Kind::Member, Kind::Function, Kind::Constant, Kind::Typedef])
                        .no_memberof(),
                )
                .into_iter()
                .filter(|d| !d.is_module_exports())
                .collect(),
        }
    }
}

// -- Sections -----------------------------------------------------------------

/// One partition of a container's children.
#[derive(Debug)]
pub struct Section<'a> {
    pub title: &'static str,
    pub items: Vec<&'a Doclet>,
}

/// Children of `longname`, partitioned in display order. Empty partitions
/// are omitted.
pub fn sections<'a>(docs: &'a DocSet, longname: &str) -> Vec<Section<'a>> {
    let member = || Query::new().kind(Kind::Member).memberof(longname);
    let function = || Query::new().kind(Kind::Function).memberof(longname);
    let partitions = [
        ("Props", member().prop(true)),
        ("Members", member().prop(false).computed(false)),
        ("Computed members", member().computed(true)),
        ("Getters", function().category(Category::Getter)),
        ("Watchers", function().category(Category::Watcher)),
        ("Mutations", function().category(Category::Mutation)),
        ("Actions", function().category(Category::Action)),
        ("Methods", function().except_categories(FUNCTION_CATEGORIES)),
        ("Events", Query::new().kind(Kind::Event).memberof(longname)),
        ("Typedef", Query::new().kind(Kind::Typedef).memberof(longname)),
    ];
    partitions
        .into_iter()
        .map(|(title, query)| Section {
            title,
            items: docs.find(&query),
        })
        .filter(|s| !s.items.is_empty())
        .collect()
}

/// Global-scope doclets grouped for the global page and nav entry.
pub fn global_sections(docs: &DocSet) -> Vec<Section<'_>> {
    let global = |kind| Query::new().kind(kind).scope(Scope::Global);
    [
        ("Members", global(Kind::Member)),
        ("Methods", global(Kind::Function)),
        ("Events", global(Kind::Event)),
        ("Typedef", global(Kind::Typedef)),
    ]
    .into_iter()
    .map(|(title, query)| Section {
        title,
        items: docs.find(&query),
    })
    .filter(|s| !s.items.is_empty())
    .collect()
}

// -- Builder --------------------------------------------------------------------

#[derive(Clone, Copy)]
enum LinkStyle {
    Doclet,
    External,
    Tutorial,
}

/// A navigable item; tutorials and doclets share the rendering path.
struct Entry<'a> {
    longname: &'a str,
    name: &'a str,
    kind: Kind,
}

impl<'a> From<&'a Doclet> for Entry<'a> {
    fn from(d: &'a Doclet) -> Self {
        Entry {
            longname: &d.longname,
            name: &d.name,
            kind: d.kind,
        }
    }
}

pub struct NavBuilder<'a> {
    docs: &'a DocSet,
    links: &'a LinkRegistry,
    options: NavOptions,
    seen: HashSet<String>,
    seen_tutorials: HashSet<String>,
}

impl<'a> NavBuilder<'a> {
    pub fn new(docs: &'a DocSet, links: &'a LinkRegistry, options: NavOptions) -> Self {
        NavBuilder {
            docs,
            links,
            options,
            seen: HashSet::new(),
            seen_tutorials: HashSet::new(),
        }
    }

    /// Whether `longname` has been listed anywhere in the sidebar.
    pub fn is_seen(&self, longname: &str) -> bool {
        self.seen.contains(longname)
    }

    /// Render the whole sidebar.
    pub fn build(&mut self, members: &Members<'_>, tutorials: &TutorialTree) -> String {
        let mut nav = String::from("<br>");
        nav += &self.category(&members.components, "Components", LinkStyle::Doclet);
        nav += &self.category(&members.stores, "Stores", LinkStyle::Doclet);
        nav += &self.category(&members.modules, "Modules", LinkStyle::Doclet);
        nav += &self.category(&members.externals, "Externals", LinkStyle::External);
        nav += &self.category(&members.classes, "Classes", LinkStyle::Doclet);
        nav += &self.category(&members.events, "Events", LinkStyle::Doclet);
        nav += &self.category(&members.namespaces, "Namespaces", LinkStyle::Doclet);
        nav += &self.category(&members.mixins, "Mixins", LinkStyle::Doclet);
        let tutorial_entries: Vec<Entry> = tutorials
            .top_level()
            .map(|t| Entry {
                longname: &t.name,
                name: &t.name,
                kind: Kind::Other,
            })
            .collect();
        nav += &self.entries(tutorial_entries, "Tutorials", LinkStyle::Tutorial);
        nav += &self.category(&members.interfaces, "Interfaces", LinkStyle::Doclet);
        nav += &self.category(&members.models, "Models", LinkStyle::Doclet);
        nav += &self.global(&members.globals);
        nav
    }

    fn category(&mut self, items: &[&Doclet], heading: &str, style: LinkStyle) -> String {
        let entries = items.iter().map(|&d| Entry::from(d)).collect();
        self.entries(entries, heading, style)
    }

    fn entries(&mut self, items: Vec<Entry<'_>>, heading: &str, style: LinkStyle) -> String {
        let mut items_nav = String::new();
        for item in items {
            if item.longname.is_empty() {
                items_nav.push_str("<li>");
                items_nav.push_str(&self.links.linkto("", Some(item.name)));
                items_nav.push_str(&self.subnav(item.longname));
                items_nav.push_str("</li>");
            } else if !self.is_listed(item.longname, style) {
                let display = if self.options.use_longname_in_nav || item.kind == Kind::Namespace {
                    item.longname
                } else {
                    item.name
                };
                let display = RE_NAMESPACE_PREFIX.replace_all(display, "").into_owned();
                let link = match style {
                    LinkStyle::Doclet => self.links.linkto(item.longname, Some(display.as_str())),
                    LinkStyle::External => self
                        .links
                        .linkto(item.longname, Some(display.trim_matches('"'))),
                    LinkStyle::Tutorial => self.links.tutorial_link(&display, None),
                };
                let subnav = self.subnav(item.longname);
                items_nav.push_str("<li>");
                if self.options.use_collapsibles {
                    items_nav.push_str(TOGGLE);
                }
                items_nav.push_str(&link);
                items_nav.push_str(&subnav);
                items_nav.push_str("</li>");
            }
            self.mark(item.longname, style);
        }
        if items_nav.is_empty() {
            String::new()
        } else {
            format!("<h3>{}</h3><ul>{}</ul>", heading, items_nav)
        }
    }

    fn is_listed(&self, longname: &str, style: LinkStyle) -> bool {
        match style {
            LinkStyle::Tutorial => self.seen_tutorials.contains(longname),
            _ => self.seen.contains(longname),
        }
    }

    fn mark(&mut self, longname: &str, style: LinkStyle) {
        match style {
            LinkStyle::Tutorial => self.seen_tutorials.insert(longname.to_string()),
            _ => self.seen.insert(longname.to_string()),
        };
    }

    /// Hidden sub-list of a container's children.
    fn subnav(&mut self, longname: &str) -> String {
        let mut html = format!("<div class=\"hidden\" id=\"{}_sub\">", longname.replace('"', "_"));
        for section in sections(self.docs, longname) {
            html.push_str(&self.member_list(&section));
        }
        html.push_str("</div>");
        html
    }

    fn member_list(&mut self, section: &Section<'_>) -> String {
        let mut html = format!(
            "<div class=\"member-type\">{}</div><ul class=\"inner\">",
            section.title
        );
        html.push_str(&self.inner_items(&section.items));
        html.push_str("</ul>");
        html
    }

    fn inner_items(&mut self, items: &[&Doclet]) -> String {
        let mut html = String::new();
        for item in items {
            html.push_str("<li>");
            html.push_str(&self.links.linkto(&item.longname, Some(&item.name)));
            html.push_str("</li>");
            self.seen.insert(item.longname.clone());
        }
        html
    }

    /// The Global entry, rendered once when any global is still unlisted.
    fn global(&mut self, globals: &[&Doclet]) -> String {
        if globals.iter().all(|g| self.seen.contains(&g.longname)) {
            return String::new();
        }
        let mut items_nav = String::new();
        for section in global_sections(self.docs) {
            if self.options.use_collapsibles {
                items_nav.push_str("<li>");
                items_nav.push_str(TOGGLE);
                items_nav.push_str(&format!(
                    "<a>{}</a><div class=\"hidden\" id=\"global:{}_sub\"><ul class=\"inner\">",
                    section.title,
                    section.title.to_lowercase()
                ));
                items_nav.push_str(&self.inner_items(&section.items));
                items_nav.push_str("</ul></div></li>");
            } else {
                items_nav.push_str(&self.member_list(&section));
            }
        }
        for g in globals {
            self.seen.insert(g.longname.clone());
        }
        if items_nav.is_empty() {
            return String::new();
        }
        format!(
            "<h3>{}</h3><ul>{}</ul>",
            self.links.linkto(GLOBAL, Some("Global")),
            items_nav
        )
    }
}

/// Render the sidebar for a normalized collection.
pub fn build_nav(
    docs: &DocSet,
    links: &LinkRegistry,
    tutorials: &TutorialTree,
    options: NavOptions,
) -> String {
    let members = Members::collect(docs);
    NavBuilder::new(docs, links, options).build(&members, tutorials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutorial::{ContentType, Tutorial};

    fn child(kind: Kind, name: &str, parent: &str) -> Doclet {
        let mut d = Doclet::new(kind, name, &format!("{}.{}", parent, name));
        d.memberof = Some(parent.into());
        d.scope = Some(Scope::Static);
        d
    }

    fn bookstore() -> (DocSet, LinkRegistry) {
        let mut store = Doclet::new(Kind::Module, "Bookstore", "store:Bookstore");
        store.is = Some(Category::Store);
        let mut action = child(Kind::Function, "getBooksByAuthor", "store:Bookstore");
        action.is = Some(Category::Action);
        let docs = DocSet::new(vec![store, action]);
        let mut links = LinkRegistry::new(["store", "component", "model"]);
        links.register("store:Bookstore", "store-Bookstore.html");
        links.register(
            "store:Bookstore.getBooksByAuthor",
            "store-Bookstore.html#.getBooksByAuthor",
        );
        (docs, links)
    }

    #[test]
    fn store_with_action() {
        let (docs, links) = bookstore();
        let nav = build_nav(&docs, &links, &TutorialTree::new(), NavOptions::default());
        assert_eq!(
            nav,
            "<br><h3>Stores</h3><ul><li>\
             <button type=\"button\" class=\"toggle-subnav\">  <span class=\"toggler\">+</span></button>\
             <a href=\"store-Bookstore.html\">Bookstore</a>\
             <div class=\"hidden\" id=\"store:Bookstore_sub\">\
             <div class=\"member-type\">Actions</div><ul class=\"inner\">\
             <li><a href=\"store-Bookstore.html#.getBooksByAuthor\">getBooksByAuthor</a></li>\
             </ul></div></li></ul>"
        );
    }

    #[test]
    fn action_is_not_a_method() {
        let (docs, _) = bookstore();
        let sections = sections(&docs, "store:Bookstore");
        let titles: Vec<_> = sections.iter().map(|s| s.title).collect();
        assert_eq!(titles, ["Actions"]);
        assert_eq!(sections[0].items.len(), 1);
    }

    #[test]
    fn unknown_discriminator_falls_into_methods() {
        let mut odd = child(Kind::Function, "odd", "store:Bookstore");
        odd.is = Some(Category::Model);
        let docs = DocSet::new(vec![odd]);
        let sections = sections(&docs, "store:Bookstore");
        assert_eq!(sections[0].title, "Methods");
    }

    #[test]
    fn partition_order() {
        let parent = "component:BookList";
        let mut prop = child(Kind::Member, "title", parent);
        prop.is_prop = true;
        let mut computed = child(Kind::Member, "total", parent);
        computed.computed = true;
        let plain = child(Kind::Member, "state", parent);
        let mut getter = child(Kind::Function, "count", parent);
        getter.is = Some(Category::Getter);
        let mut watcher = child(Kind::Function, "onTitle", parent);
        watcher.is = Some(Category::Watcher);
        let mut mutation = child(Kind::Function, "SET", parent);
        mutation.is = Some(Category::Mutation);
        let method = child(Kind::Function, "helper", parent);
        let event = child(Kind::Event, "changed", parent);
        let typedef = child(Kind::Typedef, "Row", parent);
        let docs = DocSet::new(vec![
            typedef, event, method, mutation, watcher, getter, plain, computed, prop,
        ]);
        let titles: Vec<_> = sections(&docs, parent).iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            [
                "Props",
                "Members",
                "Computed members",
                "Getters",
                "Watchers",
                "Mutations",
                "Methods",
                "Events",
                "Typedef"
            ]
        );
    }

    #[test]
    fn nested_entity_is_not_repeated_at_top_level() {
        let mut store = Doclet::new(Kind::Module, "Bookstore", "store:Bookstore");
        store.is = Some(Category::Store);
        let event = child(Kind::Event, "loaded", "store:Bookstore");
        let other = Doclet::new(Kind::Event, "free", "event:free");
        let docs = DocSet::new(vec![store, event, other]);
        let links = LinkRegistry::default();
        let mut builder = NavBuilder::new(&docs, &links, NavOptions::default());
        let nav = builder.build(&Members::collect(&docs), &TutorialTree::new());
        assert!(builder.is_seen("store:Bookstore.loaded"));
        assert!(builder.is_seen("event:free"));
        // listed once, inside the store's sub-navigation
        assert_eq!(nav.matches("loaded").count(), 1);
        assert!(nav.contains(&format!(
            "<h3>Events</h3><ul><li>{}free<div class=\"hidden\" id=\"event:free_sub\"></div></li></ul>",
            TOGGLE
        )));
    }

    #[test]
    fn flat_items_without_collapsibles() {
        let (docs, links) = bookstore();
        let options = NavOptions {
            use_collapsibles: false,
            ..Default::default()
        };
        let nav = build_nav(&docs, &links, &TutorialTree::new(), options);
        assert!(nav.starts_with("<br><h3>Stores</h3><ul><li><a href=\"store-Bookstore.html\">"));
        assert!(!nav.contains("toggle-subnav"));
    }

    #[test]
    fn namespaces_show_longname_without_prefix() {
        let ns = Doclet::new(Kind::Namespace, "util", "module:app.util");
        let docs = DocSet::new(vec![ns]);
        let nav = build_nav(&docs, &LinkRegistry::default(), &TutorialTree::new(), NavOptions::default());
        assert!(nav.contains("<h3>Namespaces</h3>"));
        assert!(nav.contains("app.util"));
        assert!(!nav.contains(">module:app.util<"));
    }

    #[test]
    fn global_entry_links_to_global_page() {
        let mut f = Doclet::new(Kind::Function, "util", "util");
        f.scope = Some(Scope::Global);
        let docs = DocSet::new(vec![f]);
        let mut links = LinkRegistry::default();
        links.register(GLOBAL, "global.html");
        links.register("util", "global.html#util");
        let nav = build_nav(&docs, &links, &TutorialTree::new(), NavOptions::default());
        assert!(nav.contains("<h3><a href=\"global.html\">Global</a></h3>"));
        assert!(nav.contains("<a>Methods</a><div class=\"hidden\" id=\"global:methods_sub\">"));
        assert!(nav.contains("<li><a href=\"global.html#util\">util</a></li>"));
    }

    #[test]
    fn no_global_entry_when_all_seen() {
        let (docs, links) = bookstore();
        let nav = build_nav(&docs, &links, &TutorialTree::new(), NavOptions::default());
        assert!(!nav.contains("Global"));
    }

    #[test]
    fn tutorials_category() {
        let mut tutorials = TutorialTree::new();
        tutorials.add(Tutorial::new("setup", "", ContentType::Markdown));
        tutorials.add(Tutorial::new("advanced", "", ContentType::Markdown));
        tutorials.attach("setup", "advanced").unwrap();
        let mut links = LinkRegistry::default();
        links.register_tutorial("setup", "Getting set up");
        let docs = DocSet::new(vec![]);
        let nav = build_nav(&docs, &links, &tutorials, NavOptions::default());
        assert!(nav.contains("<h3>Tutorials</h3>"));
        assert!(nav.contains("<a href=\"tutorial-setup.html\">Getting set up</a>"));
        assert!(!nav.contains("advanced"));
    }
}
