// src/utils/annotate.rs
//! Writes a parsed page back out with grade marks applied.
//!
//! Marks from a previous run are always stripped first, so annotating an already
//! annotated page gives the same result as annotating the original.

use ego_tree::{NodeId, Tree};
use html5ever::{LocalName, Namespace, QualName};
use once_cell::sync::Lazy;
use scraper::node::{Element, Node, Text};
use scraper::{Html, Selector, StrTendril};

use crate::document::html::EXPLICIT_BODY_ATTR;
use crate::document::{HtmlDocument, TableId};
use crate::pipeline::SummaryReport;

pub const LOW_GRADE_CLASS: &str = "gradex-low-grade";
pub const PRINT_TARGET_CLASS: &str = "gradex-print-target";
pub const SUMMARY_CLASS: &str = "gradex-summary";
const PRINT_STYLE_ATTR: &str = "data-gradex-print";

// Hides everything but the print target when printing
const PRINT_STYLE: &str = "@media print { body * { visibility: hidden; } \
.gradex-print-target, .gradex-print-target * { visibility: visible; } }";

static HEAD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("head").expect("Failed to compile HEAD_SELECTOR")
});

/// What stripping does to one element of the copied tree.
enum Fix {
    Drop,
    Unwrap,
    Replace(Element),
}

/// Serializes the page with flagged rows, print targets and a summary line above
/// each summarized table.
pub fn annotate_html(doc: &HtmlDocument, report: &SummaryReport) -> String {
    let mut html = stripped(doc);

    for row in &report.flagged_rows {
        if let Some(node) = doc.row_node(*row) {
            add_class(&mut html.tree, node, LOW_GRADE_CLASS);
        }
    }
    for table in report.print_targets() {
        if let Some(node) = doc.table_node(table) {
            add_class(&mut html.tree, node, PRINT_TARGET_CLASS);
        }
    }
    for summary in report.summaries() {
        if let Some(node) = doc.table_node(summary.table) {
            insert_summary(&mut html.tree, node, &summary.to_string());
        }
    }

    tracing::debug!(
        "Annotated {} flagged rows and {} tables",
        report.flagged_rows.len(),
        report.candidates.len()
    );

    html.html()
}

/// Serializes the page with only `table` marked for printing, plus a print stylesheet.
pub fn print_page(doc: &HtmlDocument, table: TableId) -> String {
    let mut html = stripped(doc);

    if let Some(node) = doc.table_node(table) {
        add_class(&mut html.tree, node, PRINT_TARGET_CLASS);
    }
    let head = html.select(&HEAD_SELECTOR).next().map(|h| h.id());
    if let Some(head) = head {
        insert_print_style(&mut html.tree, head);
    }

    html.html()
}

/// Serializes the page with every grade mark removed.
pub fn clear_marks(doc: &HtmlDocument) -> String {
    stripped(doc).html()
}

/// A copy of the page tree without marks, explicit-body tags or parser-invented
/// bodies. Node ids stay valid for the copy.
fn stripped(doc: &HtmlDocument) -> Html {
    let mut html = doc.html().clone();
    let ids: Vec<NodeId> = html.tree.nodes().map(|n| n.id()).collect();

    for id in ids {
        let fix = match html.tree.get(id) {
            Some(node) if node.parent().is_some() => match node.value() {
                Node::Element(element) => strip_fix(element),
                _ => None,
            },
            _ => None,
        };
        let (Some(fix), Some(mut node)) = (fix, html.tree.get_mut(id)) else {
            continue;
        };

        match fix {
            Fix::Drop => node.detach(),
            Fix::Unwrap => {
                // a re-parse invents the body again around the bare rows
                let children: Vec<NodeId> = node
                    .tree()
                    .get(id)
                    .map(|n| n.children().map(|c| c.id()).collect())
                    .unwrap_or_default();
                for child in children {
                    node.insert_id_before(child);
                }
                node.detach();
            }
            Fix::Replace(element) => *node.value() = Node::Element(element),
        }
    }

    html
}

fn strip_fix(element: &Element) -> Option<Fix> {
    if element.classes().any(|c| c == SUMMARY_CLASS) {
        return Some(Fix::Drop); // stale summary from an earlier run
    }
    if element.name() == "style" && element.attr(PRINT_STYLE_ATTR).is_some() {
        return Some(Fix::Drop);
    }
    if element.name() == "tbody" && element.attr(EXPLICIT_BODY_ATTR).is_none() {
        return Some(Fix::Unwrap);
    }

    let marked = element.classes().any(|c| c == LOW_GRADE_CLASS || c == PRINT_TARGET_CLASS);
    if !marked && element.attr(EXPLICIT_BODY_ATTR).is_none() {
        return None;
    }

    let mut attrs = element.attrs.clone();
    attrs.retain(|name, _| name.local.as_ref() != EXPLICIT_BODY_ATTR);
    for (name, value) in attrs.iter_mut() {
        if name.local.as_ref() == "class" {
            let kept = value
                .split_whitespace()
                .filter(|c| *c != LOW_GRADE_CLASS && *c != PRINT_TARGET_CLASS)
                .collect::<Vec<_>>()
                .join(" ");
            *value = StrTendril::from(kept.as_str());
        }
    }
    attrs.retain(|name, value| name.local.as_ref() != "class" || !value.is_empty());

    let mut fresh = Element::new(element.name.clone(), Vec::new());
    fresh.attrs = attrs;
    Some(Fix::Replace(fresh))
}

fn attr_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

fn new_element(ns: Namespace, name: &str, attrs: &[(&str, &str)]) -> Element {
    let mut element = Element::new(QualName::new(None, ns, LocalName::from(name)), Vec::new());
    for (key, value) in attrs {
        element.attrs.insert(attr_name(key), StrTendril::from(*value));
    }
    element
}

fn add_class(tree: &mut Tree<Node>, id: NodeId, class: &str) {
    let Some(mut node) = tree.get_mut(id) else { return };
    let Node::Element(element) = node.value() else { return };

    let mut attrs = element.attrs.clone();
    let class_attr = attr_name("class");
    let joined = match attrs.get(&class_attr) {
        Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class),
        _ => class.to_string(),
    };
    attrs.insert(class_attr, StrTendril::from(joined.as_str()));

    let mut fresh = Element::new(element.name.clone(), Vec::new());
    fresh.attrs = attrs;
    *node.value() = Node::Element(fresh);
}

fn insert_summary(tree: &mut Tree<Node>, table: NodeId, line: &str) {
    let Some(mut node) = tree.get_mut(table) else { return };
    if node.parent().is_none() {
        return;
    }
    let Node::Element(element) = node.value() else { return };

    let div = new_element(element.name.ns.clone(), "div", &[("class", SUMMARY_CLASS)]);
    node.insert_before(Node::Element(div))
        .append(Node::Text(Text { text: StrTendril::from(line) }));
    tracing::trace!("Summary inserted: {}", line);
}

fn insert_print_style(tree: &mut Tree<Node>, head: NodeId) {
    let Some(mut node) = tree.get_mut(head) else { return };
    let Node::Element(element) = node.value() else { return };

    let style = new_element(element.name.ns.clone(), "style", &[(PRINT_STYLE_ATTR, "")]);
    node.prepend(Node::Element(style))
        .append(Node::Text(Text { text: StrTendril::from(PRINT_STYLE) }));
}
