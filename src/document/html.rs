// src/document/html.rs

// --- Imports ---
use std::borrow::Cow;
use std::collections::HashMap;

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector, StrTendril};

use super::{Cell, Document, Row, RowId, RowSection, Table, TableId};

// --- Constants ---
/// Attribute planted on body sections that were written in the source. html5ever
/// invents a `tbody` for bare rows, so this is the only way to tell them apart.
pub const EXPLICIT_BODY_ATTR: &str = "data-gradex-tbody";

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});

static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

// Ancestors that mark the page's main content area
static MAIN_CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("main, [role='main'], #content")
        .expect("Failed to compile MAIN_CONTENT_SELECTOR")
});

// --- Regex Patterns (Lazy Static) ---
// `<tbody` followed by whitespace, `/` or `>`, so `<tbody-x>` custom elements are left alone
static TBODY_OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<tbody)([\s/>])").expect("Failed to compile TBODY_OPEN_RE")
});

// The rewrite as it shows up in text, comments and attribute values
static TAGGED_TBODY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("(?i)(<tbody) {}", EXPLICIT_BODY_ATTR))
        .expect("Failed to compile TAGGED_TBODY_RE")
});

// id/class hints on a table's direct parent
static MAIN_HINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)content|main|app").expect("Failed to compile MAIN_HINT_RE")
});

/// A parsed HTML page together with the table snapshot taken from it.
pub struct HtmlDocument {
    html: Html,
    document: Document,
    table_nodes: Vec<NodeId>,
    row_nodes: HashMap<RowId, NodeId>,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        let replacement = format!("${{1}} {}${{2}}", EXPLICIT_BODY_ATTR);
        let tagged = TBODY_OPEN_RE.replace_all(source, replacement.as_str());
        let mut html = Html::parse_document(&tagged);
        untag_source_text(&mut html);

        let mut tables = Vec::new();
        let mut table_nodes = Vec::new();
        let mut row_nodes = HashMap::new();

        for (index, table_el) in html.select(&TABLE_SELECTOR).enumerate() {
            let id = TableId(index);
            let mut rows = Vec::new();

            for row_el in table_el.select(&ROW_SELECTOR) {
                if owning_table(row_el).map(|t| t.id()) != Some(table_el.id()) {
                    continue; // belongs to a nested table
                }
                let row_id = RowId { table: id, row: rows.len() };
                row_nodes.insert(row_id, row_el.id());
                rows.push(Row {
                    id: row_id,
                    section: row_section(row_el),
                    cells: row_cells(row_el),
                });
            }

            let text = table_el.text().collect::<Vec<_>>().join(" ").to_lowercase();
            let in_main_content = is_in_main_content(table_el);

            tracing::trace!(
                "Table {}: {} rows, main content: {}",
                id.number(),
                rows.len(),
                in_main_content
            );
            tables.push(Table { id, rows, text, in_main_content });
            table_nodes.push(table_el.id());
        }

        tracing::debug!("Parsed document with {} tables", tables.len());

        Self {
            html,
            document: Document { tables },
            table_nodes,
            row_nodes,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn table_node(&self, id: TableId) -> Option<NodeId> {
        self.table_nodes.get(id.0).copied()
    }

    pub fn row_node(&self, id: RowId) -> Option<NodeId> {
        self.row_nodes.get(&id).copied()
    }
}

/// Undoes the `<tbody` rewrite everywhere except real body tags: script and style
/// text, comments and attribute values.
fn untag_source_text(html: &mut Html) {
    for node in html.tree.values_mut() {
        match node {
            Node::Text(text) => untag(&mut text.text),
            Node::Comment(comment) => untag(&mut comment.comment),
            Node::Element(element) => {
                for value in element.attrs.values_mut() {
                    untag(value);
                }
            }
            _ => {}
        }
    }
}

fn untag(value: &mut StrTendril) {
    let restored = match TAGGED_TBODY_RE.replace_all(&**value, "${1}") {
        Cow::Owned(restored) => restored,
        Cow::Borrowed(_) => return,
    };
    *value = StrTendril::from(restored.as_str());
}

fn owning_table(row: ElementRef) -> Option<ElementRef> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn row_section(row: ElementRef) -> RowSection {
    let Some(parent) = row.parent().and_then(ElementRef::wrap) else {
        return RowSection::Unsectioned;
    };
    match parent.value().name() {
        "thead" => RowSection::Head,
        "tfoot" => RowSection::Foot,
        "tbody" if parent.value().attr(EXPLICIT_BODY_ATTR).is_some() => RowSection::Body,
        _ => RowSection::Unsectioned,
    }
}

fn row_cells(row: ElementRef) -> Vec<Cell> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| match cell.value().name() {
            "td" => Some(Cell { text: cell.text().collect(), is_header: false }),
            "th" => Some(Cell { text: cell.text().collect(), is_header: true }),
            _ => None,
        })
        .collect()
}

fn is_in_main_content(table: ElementRef) -> bool {
    if let Some(parent) = table.parent().and_then(ElementRef::wrap) {
        let hints = [parent.value().id(), parent.value().attr("class")];
        if hints.iter().flatten().any(|h| MAIN_HINT_RE.is_match(h)) {
            return true;
        }
    }

    table
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| MAIN_CONTENT_SELECTOR.matches(&ancestor))
}
