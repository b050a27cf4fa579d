//! DomTree: owned element arena implementing `Node`.
//!
//! Hosts copy whatever tree they observe into this arena (see `tradelog-dom`
//! for the HTML loader) and mutate it in place. Ids are `base + slot` and are
//! never handed out twice by one tree; a detached element simply stops
//! resolving through `get`. A host that swaps in a whole new tree rebases it
//! past `id_end()` of the old one, so ids held from before the swap stay dead.
//!
//! Every walk here uses an explicit stack; page markup can nest arbitrarily
//! deep.

use crate::document::Node;

pub type NodeId = usize;

/// Arena slot, local to one tree.
type Slot = usize;

#[derive(Debug, Clone)]
enum Content {
    Element(Slot),
    Text(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    parent: Option<Slot>,
    content: Vec<Content>,
}

#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Element>,
    base: NodeId,
}

const ROOT: Slot = 0;

impl DomTree {
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Element {
                tag: root_tag.to_ascii_lowercase(),
                attrs: Vec::new(),
                parent: None,
                content: Vec::new(),
            }],
            base: 0,
        }
    }

    /// Renumber this tree so its ids start at `base`.
    pub fn rebased(mut self, base: NodeId) -> Self {
        self.base = base;
        self
    }

    /// First id this tree has not handed out yet.
    pub fn id_end(&self) -> NodeId {
        self.base + self.nodes.len()
    }

    /// Slots held by the arena, detached ones included.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_id(&self) -> NodeId {
        self.base + ROOT
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            slot: ROOT,
        }
    }

    fn slot(&self, id: NodeId) -> Option<Slot> {
        id.checked_sub(self.base).filter(|&s| s < self.nodes.len())
    }

    /// Resolve an id still attached to the tree.
    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        let slot = self.slot(id)?;
        self.slot_attached(slot)
            .then_some(NodeRef { tree: self, slot })
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.slot(id).is_some_and(|s| self.slot_attached(s))
    }

    fn slot_attached(&self, slot: Slot) -> bool {
        let mut cur = slot;
        loop {
            if cur == ROOT {
                return true;
            }
            match self.nodes[cur].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    fn push(&mut self, parent: Slot, tag: String, attrs: Vec<(String, String)>) -> Slot {
        let slot = self.nodes.len();
        self.nodes.push(Element {
            tag,
            attrs,
            parent: Some(parent),
            content: Vec::new(),
        });
        self.nodes[parent].content.push(Content::Element(slot));
        slot
    }

    /// Append a new element under `parent`. Panics if `parent` is not an id of
    /// this tree.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let parent = self.slot_of(parent);
        let attrs = attrs
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();
        self.base + self.push(parent, tag.to_ascii_lowercase(), attrs)
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let parent = self.slot_of(parent);
        self.push_text(parent, text);
    }

    fn push_text(&mut self, parent: Slot, text: &str) {
        if text.is_empty() {
            return;
        }
        self.nodes[parent].content.push(Content::Text(text.to_string()));
    }

    fn slot_of(&self, id: NodeId) -> Slot {
        match self.slot(id) {
            Some(s) => s,
            None => panic!("node id {id} does not belong to this tree"),
        }
    }

    /// Unlink an element (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.slot(id) else {
            return false;
        };
        let Some(parent) = self.nodes[slot].parent else {
            return false;
        };
        self.nodes[parent]
            .content
            .retain(|c| !matches!(c, Content::Element(child) if *child == slot));
        self.nodes[slot].parent = None;
        true
    }

    /// Deep-copy `src_id` from another tree under `parent`; returns the new id.
    pub fn graft(&mut self, parent: NodeId, src: &DomTree, src_id: NodeId) -> NodeId {
        let parent = self.slot_of(parent);
        let from = src.slot_of(src_id);
        let el = &src.nodes[from];
        let top = self.push(parent, el.tag.clone(), el.attrs.clone());

        let mut stack: Vec<(Slot, &Content)> = el.content.iter().rev().map(|c| (top, c)).collect();
        while let Some((dst, content)) = stack.pop() {
            match content {
                Content::Text(t) => self.push_text(dst, t),
                Content::Element(child) => {
                    let el = &src.nodes[*child];
                    let copied = self.push(dst, el.tag.clone(), el.attrs.clone());
                    stack.extend(el.content.iter().rev().map(|c| (copied, c)));
                }
            }
        }
        self.base + top
    }

    fn collect_text(&self, slot: Slot) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Content> = self.nodes[slot].content.iter().rev().collect();
        while let Some(content) = stack.pop() {
            match content {
                Content::Text(t) => out.push_str(t),
                Content::Element(child) => stack.extend(self.nodes[*child].content.iter().rev()),
            }
        }
        out
    }

    fn hides_self(&self, slot: Slot) -> bool {
        self.nodes[slot].attrs.iter().any(|(k, v)| {
            k == "hidden"
                || (k == "style" && {
                    let style: String = v.chars().filter(|c| !c.is_whitespace()).collect();
                    style.to_ascii_lowercase().contains("display:none")
                })
        })
    }
}

/// Borrowed handle to one element of a `DomTree`.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a DomTree,
    slot: Slot,
}

impl<'a> NodeRef<'a> {
    fn at(&self, slot: Slot) -> NodeRef<'a> {
        NodeRef {
            tree: self.tree,
            slot,
        }
    }

    fn element(&self) -> &'a Element {
        &self.tree.nodes[self.slot]
    }
}

impl Node for NodeRef<'_> {
    type Id = NodeId;

    fn id(&self) -> NodeId {
        self.tree.base + self.slot
    }

    fn tag(&self) -> &str {
        &self.element().tag
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|name| name == class))
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.element()
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn text(&self) -> String {
        self.tree.collect_text(self.slot)
    }

    fn parent(&self) -> Option<Self> {
        self.element().parent.map(|p| self.at(p))
    }

    fn children(&self) -> Vec<Self> {
        self.element()
            .content
            .iter()
            .filter_map(|c| match c {
                Content::Element(slot) => Some(self.at(*slot)),
                Content::Text(_) => None,
            })
            .collect()
    }

    // Mirrors `offsetParent !== null`: no box when the element or an ancestor
    // is `hidden` / `display: none`, or when it is no longer attached.
    fn is_rendered(&self) -> bool {
        if !self.tree.slot_attached(self.slot) {
            return false;
        }
        let mut cur = Some(self.slot);
        while let Some(slot) = cur {
            if self.tree.hides_self(slot) {
                return false;
            }
            cur = self.tree.nodes[slot].parent;
        }
        true
    }
}
