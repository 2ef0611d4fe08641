//! Signature and attribute synthesis.
//!
//! Every function here builds its output from the doclet's declared fields
//! alone, so running synthesis again yields the same strings.

use crate::link::LinkRegistry;
use crate::model::{Doclet, Kind, Param, Scope, TypeExpr};

/// Functions, classes, function typedefs and function-valued namespaces.
pub fn needs_signature(doclet: &Doclet) -> bool {
    match doclet.kind {
        Kind::Function | Kind::Class => true,
        Kind::Typedef => doclet
            .type_
            .as_ref()
            .map(|t| t.names.iter().any(|n| n.eq_ignore_ascii_case("function")))
            .unwrap_or(false),
        Kind::Namespace => doclet
            .meta
            .as_ref()
            .and_then(|m| m.code.as_ref())
            .and_then(|c| c.type_.as_deref())
            .map(|t| t.contains("Function") || t.contains("function"))
            .unwrap_or(false),
        _ => false,
    }
}

/// Attribute words for a doclet: modifiers, access level, scope and
/// nullability.
pub fn attribs(doclet: &Doclet) -> Vec<String> {
    let mut out = Vec::new();
    if doclet.is_async {
        out.push("async".to_string());
    }
    if doclet.generator {
        out.push("generator".to_string());
    }
    if doclet.is_virtual {
        out.push("abstract".to_string());
    }
    if let Some(ref access) = doclet.access {
        if access != "public" {
            out.push(access.clone());
        }
    }
    if let Some(scope) = doclet.scope {
        if !matches!(scope, Scope::Instance | Scope::Global)
            && matches!(doclet.kind, Kind::Function | Kind::Member | Kind::Constant)
        {
            out.push(scope_word(scope).to_string());
        }
    }
    if doclet.readonly && doclet.kind == Kind::Member {
        out.push("readonly".to_string());
    }
    if doclet.kind == Kind::Constant {
        out.push("constant".to_string());
    }
    match doclet.nullable {
        Some(true) => out.push("nullable".to_string()),
        Some(false) => out.push("non-null".to_string()),
        None => {}
    }
    out
}

fn scope_word(scope: Scope) -> &'static str {
    match scope {
        Scope::Global => "global",
        Scope::Static => "static",
        Scope::Instance => "instance",
        Scope::Inner => "inner",
    }
}

fn param_attribs(param: &Param) -> Vec<&'static str> {
    let mut out = Vec::new();
    if param.optional {
        out.push("opt");
    }
    match param.nullable {
        Some(true) => out.push("nullable"),
        Some(false) => out.push("non-null"),
        None => {}
    }
    out
}

/// Rendered attribute tags, empty when there are none.
pub fn attribs_html(attribs: &[String]) -> String {
    attribs
        .iter()
        .map(|a| format!("<span class=\"type-tag\">{}</span>", a))
        .collect()
}

fn param_name(param: &Param) -> String {
    let mut name = param.name.clone().unwrap_or_default();
    if param.variable {
        name.insert_str(0, "&hellip;");
    }
    let attributes = param_attribs(param);
    if !attributes.is_empty() {
        name.push_str(&format!(
            "<span class=\"signature-attributes\">{}</span>",
            attributes.join(", ")
        ));
    }
    name
}

fn type_links(param_type: Option<&TypeExpr>, links: &LinkRegistry) -> Vec<String> {
    param_type
        .map(|t| t.names.iter().map(|n| links.linkto_type(n)).collect())
        .unwrap_or_default()
}

/// `(a, b) → {T}` signature of a callable.
pub fn function_signature(doclet: &Doclet, links: &LinkRegistry) -> String {
    let params: Vec<String> = doclet
        .params
        .iter()
        .filter(|p| p.name.as_deref().is_some_and(|n| !n.is_empty() && !n.contains('.')))
        .map(param_name)
        .collect();

    let source = if doclet.yields.is_empty() {
        &doclet.returns
    } else {
        &doclet.yields
    };
    let mut return_attribs: Vec<&str> = Vec::new();
    for item in source {
        for attrib in param_attribs(item) {
            if attrib != "opt" && !return_attribs.contains(&attrib) {
                return_attribs.push(attrib);
            }
        }
    }
    let return_types: Vec<String> = source
        .iter()
        .flat_map(|item| type_links(item.type_.as_ref(), links))
        .collect();

    let returns = if return_types.is_empty() {
        String::new()
    } else {
        let attribs = if return_attribs.is_empty() {
            String::new()
        } else {
            format!("({}) ", return_attribs.join(", "))
        };
        format!(" &rarr; {}{{{}}}", attribs, return_types.join(" | "))
    };

    format!(
        "<span class=\"signature\">({})</span><span class=\"type-signature\">{}</span>",
        params.join(", "),
        returns
    )
}

/// ` T1 | T2` type annotation of a member.
pub fn type_signature(doclet: &Doclet, links: &LinkRegistry) -> String {
    let types = type_links(doclet.type_.as_ref(), links);
    let types = if types.is_empty() {
        String::new()
    } else {
        format!(" {}", types.join(" | "))
    };
    format!("<span class=\"type-signature\">{}</span>", types)
}

/// Fill `signature` and `attribs` for the doclets that carry them.
pub fn synthesize(doclet: &mut Doclet, links: &LinkRegistry) {
    if needs_signature(doclet) {
        doclet.signature = Some(function_signature(doclet, links));
        doclet.attribs = attribs_html(&attribs(doclet));
    } else if matches!(doclet.kind, Kind::Member | Kind::Constant) {
        doclet.signature = Some(type_signature(doclet, links));
        doclet.attribs = attribs_html(&attribs(doclet));
    }
}
