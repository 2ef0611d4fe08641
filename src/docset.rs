//! Indexed in-memory doclet collection with a typed query builder.
//!
//! Doclets keep their collection order; every query returns matches in that
//! order. Indexes on `kind`, `memberof` and `longname` are rebuilt whenever
//! the collection is mutated through [`DocSet::update`].

use crate::model::{Category, Doclet, Kind, Scope};
use std::collections::HashMap;

/// Predicate over doclets. Unset fields match anything.
#[derive(Debug, Clone, Default)]
pub struct Query<'q> {
    kinds: Vec<Kind>,
    /// `Some(None)` matches doclets without a `memberof`.
    memberof: Option<Option<&'q str>>,
    longname: Option<&'q str>,
    longname_prefix: Option<&'q str>,
    scope: Option<Scope>,
    /// `Some(None)` matches doclets without a discriminator.
    category: Option<Option<Category>>,
    except: Vec<Category>,
    prop: Option<bool>,
    computed: Option<bool>,
}

impl<'q> Query<'q> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kinds = vec![kind];
        self
    }

    pub fn kinds(mut self, kinds: &[Kind]) -> Self {
        self.kinds = kinds.to_vec();
        self
    }

    pub fn memberof(mut self, longname: &'q str) -> Self {
        self.memberof = Some(Some(longname));
        self
    }

    pub fn no_memberof(mut self) -> Self {
        self.memberof = Some(None);
        self
    }

    pub fn longname(mut self, longname: &'q str) -> Self {
        self.longname = Some(longname);
        self
    }

    pub fn longname_prefix(mut self, prefix: &'q str) -> Self {
        self.longname_prefix = Some(prefix);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(Some(category));
        self
    }

    pub fn no_category(mut self) -> Self {
        self.category = Some(None);
        self
    }

    /// Reject doclets whose discriminator is one of `categories`; doclets
    /// without one still match.
    pub fn except_categories(mut self, categories: &[Category]) -> Self {
        self.except = categories.to_vec();
        self
    }

    pub fn prop(mut self, prop: bool) -> Self {
        self.prop = Some(prop);
        self
    }

    pub fn computed(mut self, computed: bool) -> Self {
        self.computed = Some(computed);
        self
    }

    pub fn matches(&self, doclet: &Doclet) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&doclet.kind) {
            return false;
        }
        if let Some(memberof) = self.memberof {
            if doclet.memberof.as_deref() != memberof {
                return false;
            }
        }
        if let Some(longname) = self.longname {
            if doclet.longname != longname {
                return false;
            }
        }
        if let Some(prefix) = self.longname_prefix {
            if !doclet.longname.starts_with(prefix) {
                return false;
            }
        }
        if let Some(scope) = self.scope {
            if doclet.scope != Some(scope) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if doclet.is != category {
                return false;
            }
        }
        if let Some(category) = doclet.is {
            if self.except.contains(&category) {
                return false;
            }
        }
        if let Some(prop) = self.prop {
            if doclet.is_prop != prop {
                return false;
            }
        }
        if let Some(computed) = self.computed {
            if doclet.computed != computed {
                return false;
            }
        }
        true
    }
}

/// The document collection.
#[derive(Debug, Default)]
pub struct DocSet {
    doclets: Vec<Doclet>,
    by_kind: HashMap<Kind, Vec<usize>>,
    by_memberof: HashMap<String, Vec<usize>>,
    by_longname: HashMap<String, Vec<usize>>,
}

impl DocSet {
    pub fn new(doclets: Vec<Doclet>) -> Self {
        let mut set = DocSet {
            doclets,
            ..Default::default()
        };
        set.reindex();
        set
    }

    fn reindex(&mut self) {
        self.by_kind.clear();
        self.by_memberof.clear();
        self.by_longname.clear();
        for (i, doclet) in self.doclets.iter().enumerate() {
            self.by_kind.entry(doclet.kind).or_default().push(i);
            if let Some(ref memberof) = doclet.memberof {
                self.by_memberof.entry(memberof.clone()).or_default().push(i);
            }
            self.by_longname
                .entry(doclet.longname.clone())
                .or_default()
                .push(i);
        }
    }

    pub fn len(&self) -> usize {
        self.doclets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doclets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Doclet> {
        self.doclets.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Doclet> {
        self.doclets.get(index)
    }

    pub fn as_slice(&self) -> &[Doclet] {
        &self.doclets
    }

    /// Mutate every doclet in collection order, then rebuild the indexes.
    pub fn update<F: FnMut(&mut Doclet)>(&mut self, f: F) {
        self.doclets.iter_mut().for_each(f);
        self.reindex();
    }

    /// Indices of matching doclets, in collection order.
    pub fn find_indices(&self, query: &Query) -> Vec<usize> {
        let candidates: Option<&Vec<usize>> = if let Some(longname) = query.longname {
            Some(self.by_longname.get(longname).unwrap_or(&EMPTY))
        } else if let Some(Some(memberof)) = query.memberof {
            Some(self.by_memberof.get(memberof).unwrap_or(&EMPTY))
        } else if query.kinds.len() == 1 {
            Some(self.by_kind.get(&query.kinds[0]).unwrap_or(&EMPTY))
        } else {
            None
        };
        match candidates {
            Some(indices) => indices
                .iter()
                .copied()
                .filter(|&i| query.matches(&self.doclets[i]))
                .collect(),
            None => (0..self.doclets.len())
                .filter(|&i| query.matches(&self.doclets[i]))
                .collect(),
        }
    }

    pub fn find(&self, query: &Query) -> Vec<&Doclet> {
        self.find_indices(query)
            .into_iter()
            .map(|i| &self.doclets[i])
            .collect()
    }

    pub fn first(&self, query: &Query) -> Option<&Doclet> {
        self.find_indices(query)
            .first()
            .map(|&i| &self.doclets[i])
    }

    /// Drop doclets that never get published.
    pub fn prune(&mut self, keep_private: bool) {
        let before = self.doclets.len();
        self.doclets.retain(|d| {
            !d.undocumented
                && !d.ignore
                && d.memberof.as_deref() != Some("<anonymous>")
                && (keep_private || d.access.as_deref() != Some("private"))
        });
        tracing::debug!("pruned {} doclets", before - self.doclets.len());
        self.reindex();
    }

    /// Stable sort by (longname, version, since).
    pub fn sort(&mut self) {
        self.doclets.sort_by(|a, b| {
            a.longname
                .cmp(&b.longname)
                .then_with(|| a.version.cmp(&b.version))
                .then_with(|| a.since.cmp(&b.since))
        });
        self.reindex();
    }

    pub fn into_vec(self) -> Vec<Doclet> {
        self.doclets
    }
}

static EMPTY: Vec<usize> = Vec::new();
