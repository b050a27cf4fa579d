//! HTML → `DomTree` loader backed by `scraper`.
//!
//! Only elements and text survive the copy; comments, doctypes and
//! processing instructions carry nothing the extractors look at.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use tradelog_core::{DomTree, NodeId};

/// Parse a full HTML document. Never fails; broken markup is repaired the way
/// browsers do it.
pub fn parse_document(html: &str) -> DomTree {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let mut tree = DomTree::new(root.value().name());
    let root_id = tree.root_id();
    copy_children(&mut tree, root_id, root);
    tree
}

/// Read and parse an HTML file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<DomTree> {
    let path = path.as_ref();
    let html = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_document(&html))
}

fn copy_children(tree: &mut DomTree, parent: NodeId, el: ElementRef<'_>) {
    // Explicit stack: document order without recursing per nesting level.
    let mut stack: Vec<_> = el.children().map(|c| (parent, c)).collect();
    stack.reverse();

    while let Some((parent, node)) = stack.pop() {
        match node.value() {
            scraper::Node::Text(text) => tree.append_text(parent, text),
            scraper::Node::Element(element) => {
                let attrs: Vec<(&str, &str)> = element.attrs().collect();
                let id = tree.append_element(parent, element.name(), &attrs);
                let first = stack.len();
                stack.extend(node.children().map(|c| (id, c)));
                stack[first..].reverse();
            }
            _ => {}
        }
    }
}
