//! PaginationDriver: periodically activates the page's "load more" control.
//!
//! The interval itself is owned by the runtime; the driver only answers what a
//! single tick should do. Binding is idempotent: initialising twice never
//! doubles up on the same control.

use std::collections::HashSet;
use std::hash::Hash;
use std::fmt::Debug;
use std::time::Duration;

use tracing::{debug, info};

use crate::document::{select_first, Document, Node, Pattern};
use crate::toggle::Toggle;

pub const DEFAULT_LOAD_MORE_INTERVAL: Duration = Duration::from_millis(3000);

pub const LOAD_MORE_PATTERNS: &[Pattern] = &[
    Pattern::TagClass("a", "load_more_history"),
    Pattern::Class("load_more_button"),
    Pattern::Class("btnv6_lightblue_blue"),
];

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No control was bound at init.
    Unbound,
    /// Enabled flag is off.
    Disabled,
    /// Control is in the tree but has no layout box.
    Hidden,
    /// Control has left the tree (all history loaded).
    Gone,
    Activated,
}

#[derive(Debug, Clone)]
pub struct PaginationDriver<Id> {
    interval: Duration,
    control: Option<Id>,
    bound: HashSet<Id>,
    activations: u64,
}

impl<Id: Copy + Eq + Hash + Debug> PaginationDriver<Id> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            control: None,
            bound: HashSet::new(),
            activations: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn control(&self) -> Option<Id> {
        self.control
    }

    pub fn is_bound(&self) -> bool {
        self.control.is_some()
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Look for a load-more control and bind it. Returns true on a fresh bind.
    pub fn init<D: Document<Id = Id>>(&mut self, doc: &D) -> bool {
        let Some(id) = select_first(&doc.root(), LOAD_MORE_PATTERNS).map(|n| n.id()) else {
            debug!("no load-more control on page");
            return false;
        };
        if !self.bound.insert(id) {
            return false;
        }
        info!(control = ?id, interval_ms = self.interval.as_millis() as u64, "bound load-more control");
        self.control = Some(id);
        true
    }

    /// One interval tick: activate the control if enabled and rendered.
    pub fn tick<D: Document<Id = Id>>(&mut self, doc: &mut D, toggle: &Toggle) -> TickOutcome {
        let Some(id) = self.control else {
            return TickOutcome::Unbound;
        };
        if !toggle.is_enabled() {
            return TickOutcome::Disabled;
        }

        let rendered = match doc.node(id) {
            Some(node) => node.is_rendered(),
            None => return TickOutcome::Gone,
        };
        if !rendered {
            return TickOutcome::Hidden;
        }

        if doc.activate(id) {
            self.activations += 1;
            debug!(control = ?id, activations = self.activations, "activated load-more");
            TickOutcome::Activated
        } else {
            TickOutcome::Gone
        }
    }
}

impl<Id: Copy + Eq + Hash + Debug> Default for PaginationDriver<Id> {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_MORE_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MutationRecord;
    use crate::tree::{DomTree, NodeId, NodeRef};

    struct FakePage {
        tree: DomTree,
        clicks: Vec<NodeId>,
    }

    impl FakePage {
        fn with_button(style: &str) -> (Self, NodeId) {
            let mut tree = DomTree::new("html");
            let root = tree.root_id();
            let btn = tree.append_element(
                root,
                "a",
                &[("class", "load_more_history"), ("style", style)],
            );
            (Self { tree, clicks: Vec::new() }, btn)
        }
    }

    impl Document for FakePage {
        type Id = NodeId;
        type Node<'a> = NodeRef<'a>;

        fn root(&self) -> NodeRef<'_> {
            self.tree.root()
        }

        fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
            self.tree.get(id)
        }

        fn activate(&mut self, id: NodeId) -> bool {
            self.clicks.push(id);
            self.tree.is_attached(id)
        }

        fn take_mutations(&mut self) -> Vec<MutationRecord> {
            Vec::new()
        }
    }

    #[test]
    fn binds_once_and_activates_when_enabled() {
        let (mut page, btn) = FakePage::with_button("");
        let mut driver = PaginationDriver::default();
        assert!(driver.init(&page));
        assert!(!driver.init(&page));
        assert_eq!(driver.control(), Some(btn));

        let mut toggle = Toggle::default();
        assert_eq!(driver.tick(&mut page, &toggle), TickOutcome::Activated);
        toggle.toggle();
        assert_eq!(driver.tick(&mut page, &toggle), TickOutcome::Disabled);
        assert_eq!(page.clicks, vec![btn]);
        assert_eq!(driver.activations(), 1);
    }

    #[test]
    fn hidden_or_removed_control_is_not_clicked() {
        let (mut page, btn) = FakePage::with_button("display: none");
        let mut driver = PaginationDriver::default();
        driver.init(&page);
        let toggle = Toggle::default();
        assert_eq!(driver.tick(&mut page, &toggle), TickOutcome::Hidden);

        page.tree.detach(btn);
        assert_eq!(driver.tick(&mut page, &toggle), TickOutcome::Gone);
        assert!(page.clicks.is_empty());
    }

    #[test]
    fn no_control_means_unbound() {
        let mut page = FakePage {
            tree: DomTree::new("html"),
            clicks: Vec::new(),
        };
        let mut driver = PaginationDriver::default();
        assert!(!driver.init(&page));
        assert_eq!(driver.tick(&mut page, &Toggle::default()), TickOutcome::Unbound);
    }
}
