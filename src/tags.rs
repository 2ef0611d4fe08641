//! Custom tag vocabulary: stores, components, models and their members.
//!
//! Each tag maps to a [`TagDef`]: the host-side validation flags plus a
//! plain transition function applied to the doclet carrying the tag. Tags
//! are applied in the order they appear in the comment, so `@namespaced`
//! after `@store` sees the `vuexModule` marker and `@route` after
//! `@component` sees `is == component`.

use crate::model::{Category, Doclet, Kind, NamedValue, Scope, Tag, TypeExpr};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// `{Type} name description` convention for raw tag text.
static RE_TAG_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:\{([^}]*)\}\s*)?(\S+)?\s*([\s\S]*?)\s*$").unwrap()
});

/// Transition applied when a tag is encountered.
pub type OnTagged = fn(&mut Doclet, &TagValue);

/// Declaration of one custom tag.
#[derive(Debug, Clone, Copy)]
pub struct TagDef {
    pub must_have_value: bool,
    pub can_have_type: bool,
    pub can_have_name: bool,
    /// The tag introduces a longname namespace (`store:Name`).
    pub is_namespace: bool,
    pub on_tagged: OnTagged,
}

impl TagDef {
    const fn new(on_tagged: OnTagged) -> Self {
        TagDef {
            must_have_value: false,
            can_have_type: false,
            can_have_name: false,
            is_namespace: false,
            on_tagged,
        }
    }

    const fn required(mut self) -> Self {
        self.must_have_value = true;
        self
    }

    const fn named(mut self) -> Self {
        self.can_have_name = true;
        self
    }

    const fn typed(mut self) -> Self {
        self.can_have_type = true;
        self
    }

    const fn namespace(mut self) -> Self {
        self.is_namespace = true;
        self
    }
}

/// Decoded tag value.
///
/// Record payloads may only carry these fields; anything else is rejected
/// instead of being merged onto the doclet.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagValue {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<TypeExpr>,
    #[serde(default)]
    pub defaultvalue: Option<serde_json::Value>,
    #[serde(default)]
    pub optional: Option<bool>,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub readonly: Option<bool>,
    /// Raw text as written after the tag.
    #[serde(skip)]
    pub text: String,
}

impl TagValue {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
            && self.name.is_none()
            && self.description.is_none()
            && self.type_.is_none()
    }

    /// Parse free text according to what the tag accepts.
    fn from_text(text: &str, def: &TagDef) -> Self {
        let mut value = TagValue {
            text: text.trim().to_string(),
            ..Default::default()
        };
        if !def.can_have_name && !def.can_have_type {
            if !value.text.is_empty() {
                value.description = Some(value.text.clone());
            }
            return value;
        }
        if let Some(caps) = RE_TAG_TEXT.captures(text) {
            if def.can_have_type {
                if let Some(ty) = caps.get(1) {
                    value.type_ = Some(TypeExpr::new(
                        ty.as_str().split('|').map(str::trim).filter(|s| !s.is_empty()),
                    ));
                }
            }
            let name = caps.get(2).map(|m| m.as_str().to_string());
            let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");
            if def.can_have_name {
                value.name = name;
                if !rest.is_empty() {
                    value.description = Some(rest.to_string());
                }
            } else {
                let joined = [name.as_deref().unwrap_or(""), rest].join(" ");
                if !joined.trim().is_empty() {
                    value.description = Some(joined.trim().to_string());
                }
            }
        }
        value
    }
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("the @{0} tag requires a value")]
    MissingValue(String),
    #[error("malformed @{title} payload: {source}")]
    Malformed {
        title: String,
        #[source]
        source: serde_json::Error,
    },
}

// -- transitions ---------------------------------------------------------------

fn set_container(doclet: &mut Doclet, value: &TagValue, category: Category, prefix: &str) {
    if let Some(ref name) = value.name {
        doclet.name = name.clone();
        doclet.longname = format!("{}:{}", prefix, name);
    }
    doclet.scope = Some(Scope::Static);
    doclet.is = Some(category);
    doclet.kind = Kind::Module;
}

fn on_store(doclet: &mut Doclet, value: &TagValue) {
    set_container(doclet, value, Category::Store, "store");
    doclet.vuex_module = Some(doclet.name.clone());
}

fn on_component(doclet: &mut Doclet, value: &TagValue) {
    set_container(doclet, value, Category::Component, "component");
    doclet.vuex_module = Some(doclet.name.clone());
}

fn on_model(doclet: &mut Doclet, value: &TagValue) {
    set_container(doclet, value, Category::Model, "model");
}

fn set_function(doclet: &mut Doclet, value: &TagValue, category: Category) {
    if let Some(ref name) = value.name {
        doclet.name = name.clone();
    }
    doclet.is = Some(category);
    doclet.scope = Some(Scope::Static);
    doclet.kind = Kind::Function;
}

fn on_mutation(doclet: &mut Doclet, value: &TagValue) {
    set_function(doclet, value, Category::Mutation);
}

fn on_getter(doclet: &mut Doclet, value: &TagValue) {
    set_function(doclet, value, Category::Getter);
}

fn on_action(doclet: &mut Doclet, value: &TagValue) {
    set_function(doclet, value, Category::Action);
    doclet.is_async = true;
}

fn on_watch(doclet: &mut Doclet, value: &TagValue) {
    merge_payload(doclet, value);
    doclet.is = Some(Category::Watcher);
    doclet.scope = Some(Scope::Static);
    doclet.kind = Kind::Function;
}

fn on_namespaced(doclet: &mut Doclet, _value: &TagValue) {
    if doclet.vuex_module.is_some() {
        doclet.namespaced = true;
    }
}

fn on_computed(doclet: &mut Doclet, value: &TagValue) {
    doclet.computed = true;
    merge_payload(doclet, value);
    doclet.kind = Kind::Member;
}

fn on_vprop(doclet: &mut Doclet, value: &TagValue) {
    doclet.is_prop = true;
    doclet.readonly = true;
    merge_payload(doclet, value);
    doclet.kind = Kind::Member;
}

fn on_lifecycle(doclet: &mut Doclet, value: &TagValue) {
    doclet.lifecycles.push(NamedValue {
        name: value.name.clone().unwrap_or_else(|| value.text.clone()),
        description: value.description.clone(),
    });
}

fn on_route(doclet: &mut Doclet, value: &TagValue) {
    if doclet.is == Some(Category::Component) {
        doclet.routes.push(value.text.clone());
    }
}

/// Copy the allow-listed payload fields onto the doclet.
fn merge_payload(doclet: &mut Doclet, value: &TagValue) {
    if let Some(ref name) = value.name {
        doclet.name = name.clone();
    }
    if let Some(ref description) = value.description {
        doclet.description = Some(description.clone());
    }
    if let Some(ref ty) = value.type_ {
        doclet.type_ = Some(ty.clone());
    }
    if let Some(ref default) = value.defaultvalue {
        doclet.defaultvalue = Some(default.clone());
    }
    if let Some(optional) = value.optional {
        doclet.optional = optional;
    }
    if let Some(nullable) = value.nullable {
        doclet.nullable = Some(nullable);
    }
    if let Some(readonly) = value.readonly {
        doclet.readonly = readonly;
    }
}

// -- registry -------------------------------------------------------------------

/// Tag name → definition lookup.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    defs: BTreeMap<&'static str, TagDef>,
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::vuex()
    }
}

impl TagRegistry {
    /// The full store/component/model vocabulary.
    pub fn vuex() -> Self {
        let defs = BTreeMap::from([
            // stores
            ("store", TagDef::new(on_store).required().named().namespace()),
            ("mutation", TagDef::new(on_mutation).named()),
            ("getter", TagDef::new(on_getter).named()),
            ("action", TagDef::new(on_action).named()),
            ("namespaced", TagDef::new(on_namespaced)),
            // models
            ("model", TagDef::new(on_model).required().named().namespace()),
            // components
            ("component", TagDef::new(on_component).required().named().namespace()),
            ("lifecycle", TagDef::new(on_lifecycle).required().named()),
            ("route", TagDef::new(on_route).required()),
            ("computed", TagDef::new(on_computed).named().typed()),
            ("vprop", TagDef::new(on_vprop).named().typed()),
            ("watch", TagDef::new(on_watch).named()),
        ]);
        TagRegistry { defs }
    }

    pub fn get(&self, title: &str) -> Option<&TagDef> {
        self.defs.get(title.to_ascii_lowercase().as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.defs.keys().copied()
    }

    /// Tags that introduce a longname namespace.
    pub fn namespaces(&self) -> Vec<&'static str> {
        self.defs
            .iter()
            .filter(|(_, def)| def.is_namespace)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Decode the tag's value the way its definition allows.
    pub fn decode(&self, def: &TagDef, tag: &Tag) -> Result<TagValue, TagError> {
        let text = tag.text.clone().unwrap_or_default();
        let value = match tag.value {
            Some(serde_json::Value::Object(ref map)) => {
                let mut value: TagValue =
                    serde_json::from_value(serde_json::Value::Object(map.clone())).map_err(
                        |source| TagError::Malformed {
                            title: tag.title.clone(),
                            source,
                        },
                    )?;
                value.text = text;
                value
            }
            Some(serde_json::Value::String(ref s)) => TagValue::from_text(s, def),
            _ => TagValue::from_text(&text, def),
        };
        if def.must_have_value && value.is_empty() {
            return Err(TagError::MissingValue(tag.title.clone()));
        }
        Ok(value)
    }

    /// Apply one tag. Returns `Ok(false)` when the tag is not registered.
    pub fn apply(&self, doclet: &mut Doclet, tag: &Tag) -> Result<bool, TagError> {
        let Some(def) = self.get(&tag.title) else {
            return Ok(false);
        };
        let value = self.decode(def, tag)?;
        (def.on_tagged)(doclet, &value);
        Ok(true)
    }

    /// Apply every registered raw tag on the doclet, in order, and drop them
    /// from its tag list. Rejected tags are logged and skipped.
    pub fn apply_all(&self, doclet: &mut Doclet) -> usize {
        let mut applied = 0;
        let mut remaining = Vec::new();
        for tag in std::mem::take(&mut doclet.tags) {
            match self.apply(doclet, &tag) {
                Ok(true) => applied += 1,
                Ok(false) => remaining.push(tag),
                Err(e) => {
                    tracing::warn!("{} ({})", e, describe(doclet));
                }
            }
        }
        doclet.tags = remaining;
        applied
    }
}

fn describe(doclet: &Doclet) -> String {
    match doclet.meta.as_ref().and_then(|m| m.filename.as_deref()) {
        Some(file) => format!("{} in {}", doclet.longname, file),
        None => doclet.longname.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(title: &str, text: &str) -> Tag {
        Tag {
            title: title.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    fn tagged(tags: Vec<Tag>) -> Doclet {
        let mut doclet = Doclet::new(Kind::Member, "exports", "module.exports");
        doclet.tags = tags;
        TagRegistry::vuex().apply_all(&mut doclet);
        doclet
    }

    #[test]
    fn store_becomes_static_module() {
        let d = tagged(vec![tag("store", "Bookstore")]);
        assert_eq!(d.longname, "store:Bookstore");
        assert_eq!(d.name, "Bookstore");
        assert_eq!(d.scope, Some(Scope::Static));
        assert_eq!(d.kind, Kind::Module);
        assert_eq!(d.is, Some(Category::Store));
        assert_eq!(d.vuex_module.as_deref(), Some("Bookstore"));
        assert!(d.tags.is_empty());
    }

    #[test]
    fn store_accepts_record_value() {
        let d = tagged(vec![Tag {
            title: "store".into(),
            value: Some(json!({"name": "Warehouse", "description": "main store"})),
            ..Default::default()
        }]);
        assert_eq!(d.longname, "store:Warehouse");
    }

    #[test]
    fn component_and_model_longnames() {
        let c = tagged(vec![tag("component", "BookList")]);
        assert_eq!(c.longname, "component:BookList");
        assert_eq!(c.is, Some(Category::Component));
        assert_eq!(c.vuex_module.as_deref(), Some("BookList"));
        let m = tagged(vec![tag("model", "Goods")]);
        assert_eq!(m.longname, "model:Goods");
        assert_eq!(m.kind, Kind::Module);
        assert!(m.vuex_module.is_none());
    }

    #[test]
    fn namespaced_requires_store_marker() {
        let d = tagged(vec![tag("namespaced", "")]);
        assert!(!d.namespaced);

        let d = tagged(vec![tag("store", "Bookstore"), tag("namespaced", "")]);
        assert!(d.namespaced);

        let d = tagged(vec![tag("component", "BookList"), tag("namespaced", "")]);
        assert!(d.namespaced);

        // marker must already be present when the tag is applied
        let d = tagged(vec![tag("namespaced", ""), tag("store", "Bookstore")]);
        assert!(!d.namespaced);
    }

    #[test]
    fn action_is_async_static_function() {
        let d = tagged(vec![tag("action", "getBooksByAuthor")]);
        assert_eq!(d.kind, Kind::Function);
        assert_eq!(d.is, Some(Category::Action));
        assert_eq!(d.scope, Some(Scope::Static));
        assert_eq!(d.name, "getBooksByAuthor");
        assert!(d.is_async);
    }

    #[test]
    fn mutation_and_getter_are_not_async() {
        let m = tagged(vec![tag("mutation", "ADD_TO_CART")]);
        assert_eq!(m.is, Some(Category::Mutation));
        assert!(!m.is_async);
        let g = tagged(vec![tag("getter", "items")]);
        assert_eq!(g.is, Some(Category::Getter));
    }

    #[test]
    fn computed_merges_typed_name() {
        let d = tagged(vec![tag("computed", "{Number|null} total sum of the cart")]);
        assert!(d.computed);
        assert_eq!(d.kind, Kind::Member);
        assert_eq!(d.name, "total");
        assert_eq!(d.type_, Some(TypeExpr::new(["Number", "null"])));
        assert_eq!(d.description.as_deref(), Some("sum of the cart"));
    }

    #[test]
    fn vprop_is_readonly_prop() {
        let d = tagged(vec![tag("vprop", "{String} title")]);
        assert!(d.is_prop);
        assert!(d.readonly);
        assert_eq!(d.kind, Kind::Member);
    }

    #[test]
    fn payload_outside_allow_list_is_rejected() {
        let d = tagged(vec![Tag {
            title: "computed".into(),
            value: Some(json!({"name": "total", "longname": "hijacked"})),
            ..Default::default()
        }]);
        assert!(!d.computed);
        assert_eq!(d.longname, "module.exports");
    }

    #[test]
    fn lifecycles_accumulate_in_order() {
        let d = tagged(vec![
            tag("lifecycle", "created fetch books"),
            tag("lifecycle", "destroyed"),
        ]);
        let names: Vec<_> = d.lifecycles.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["created", "destroyed"]);
        assert_eq!(d.lifecycles[0].description.as_deref(), Some("fetch books"));
    }

    #[test]
    fn routes_only_apply_to_components() {
        let d = tagged(vec![tag("route", "/books")]);
        assert!(d.routes.is_empty());

        let d = tagged(vec![
            tag("component", "BookList"),
            tag("route", "/books"),
            tag("route", "/books/:id"),
        ]);
        assert_eq!(d.routes, ["/books", "/books/:id"]);
    }

    #[test]
    fn required_value_missing_is_rejected() {
        let registry = TagRegistry::vuex();
        let mut d = Doclet::new(Kind::Member, "x", "x");
        let err = registry.apply(&mut d, &tag("store", "  ")).unwrap_err();
        assert!(matches!(err, TagError::MissingValue(ref t) if t == "store"));
        assert_eq!(d.kind, Kind::Member);
    }

    #[test]
    fn unknown_tags_are_kept() {
        let d = tagged(vec![tag("fancy", "x"), tag("getter", "items")]);
        assert_eq!(d.tags.len(), 1);
        assert_eq!(d.tags[0].title, "fancy");
    }

    #[test]
    fn namespace_tags() {
        assert_eq!(
            TagRegistry::vuex().namespaces(),
            ["component", "model", "store"]
        );
    }
}
