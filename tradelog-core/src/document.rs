//! Capability interface over the observed page.
//!
//! The pipeline never touches a concrete host tree. It sees elements through
//! `Node` (inspection) and the page through `Document` (lookup by id, mutation
//! records, simulated activation). Structural queries are expressed as
//! `Pattern` lists and evaluated here on top of the `Node` primitives, so a
//! host only has to answer tag/class/attribute/child/parent questions.

use std::fmt::Debug;
use std::hash::Hash;

/// Read-only view of one element in a host tree.
pub trait Node: Clone {
    type Id: Copy + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;
    fn tag(&self) -> &str;
    fn has_class(&self, class: &str) -> bool;
    fn attr(&self, name: &str) -> Option<&str>;
    /// Concatenated text of the whole subtree (DOM `textContent`).
    fn text(&self) -> String;
    fn parent(&self) -> Option<Self>;
    /// Element children in document order.
    fn children(&self) -> Vec<Self>;
    /// Whether the element currently has a layout box.
    fn is_rendered(&self) -> bool;
}

/// A live, externally mutated page.
pub trait Document {
    type Id: Copy + Eq + Hash + Debug;
    type Node<'a>: Node<Id = Self::Id>
    where
        Self: 'a;

    fn root(&self) -> Self::Node<'_>;

    /// Resolve an id; `None` once the element has left the tree.
    fn node(&self, id: Self::Id) -> Option<Self::Node<'_>>;

    /// Simulate a user activation (click). Returns false if the element is gone.
    fn activate(&mut self, id: Self::Id) -> bool;

    /// Drain the mutation records queued since the last call.
    fn take_mutations(&mut self) -> Vec<MutationRecord>;
}

/// One batch entry of subtree-mutation notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationRecord {
    pub added_nodes: usize,
    pub removed_nodes: usize,
}

impl MutationRecord {
    pub fn added(n: usize) -> Self {
        Self {
            added_nodes: n,
            removed_nodes: 0,
        }
    }

    pub fn removed(n: usize) -> Self {
        Self {
            added_nodes: 0,
            removed_nodes: n,
        }
    }
}

/// Structural element pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// `.class`
    Class(&'static str),
    /// `tag.class`
    TagClass(&'static str, &'static str),
    /// `a[href*="needle"]`
    LinkHrefContains(&'static str),
}

impl Pattern {
    pub fn matches<N: Node>(&self, node: &N) -> bool {
        match *self {
            Pattern::Class(class) => node.has_class(class),
            Pattern::TagClass(tag, class) => {
                node.tag().eq_ignore_ascii_case(tag) && node.has_class(class)
            }
            Pattern::LinkHrefContains(needle) => {
                node.tag().eq_ignore_ascii_case("a")
                    && node.attr("href").is_some_and(|h| h.contains(needle))
            }
        }
    }
}

pub fn matches_any<N: Node>(node: &N, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(node))
}

/// All descendants of `root` (excluding `root`) matching any pattern, in
/// document order.
pub fn select_all<N: Node>(root: &N, patterns: &[Pattern]) -> Vec<N> {
    let mut out = Vec::new();
    let mut stack: Vec<N> = root.children().into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if matches_any(&node, patterns) {
            out.push(node.clone());
        }
        stack.extend(node.children().into_iter().rev());
    }
    out
}

/// First descendant of `root` in document order matching any pattern.
pub fn select_first<N: Node>(root: &N, patterns: &[Pattern]) -> Option<N> {
    let mut stack: Vec<N> = root.children().into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if matches_any(&node, patterns) {
            return Some(node);
        }
        stack.extend(node.children().into_iter().rev());
    }
    None
}

/// Nearest ancestor-or-self matching any pattern (DOM `closest`).
pub fn closest<N: Node>(node: &N, patterns: &[Pattern]) -> Option<N> {
    let mut cur = Some(node.clone());
    while let Some(n) = cur {
        if matches_any(&n, patterns) {
            return Some(n);
        }
        cur = n.parent();
    }
    None
}
