//! HistoryPage: a live trade-history page over a `DomTree`.
//!
//! Plays the host side of the pipeline:
//! - the first document is what the user sees on load
//! - further pages sit behind the load-more control; each activation grafts the
//!   next page's trade blocks into the list and queues a mutation record
//! - once the queue is empty the control is removed from the tree
//! - `reload` swaps in a whole new document, like a structural re-render

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tradelog_core::document::{closest, select_all, Document, MutationRecord, Node};
use tradelog_core::scanner::BLOCK_PATTERNS;
use tradelog_core::{DomTree, NodeId, NodeRef};

use crate::html::parse_document;

#[derive(Debug, Clone)]
pub struct HistoryPage {
    tree: DomTree,
    pending: VecDeque<DomTree>,
    mutations: Vec<MutationRecord>,
    loaded_pages: usize,
}

impl HistoryPage {
    pub fn new(html: &str) -> Self {
        Self::from_tree(parse_document(html))
    }

    pub fn from_tree(tree: DomTree) -> Self {
        Self {
            tree,
            pending: VecDeque::new(),
            mutations: Vec::new(),
            loaded_pages: 1,
        }
    }

    /// Queue further pages to be revealed by the load-more control.
    pub fn with_more_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.pending
            .extend(pages.into_iter().map(|p| parse_document(p.as_ref())));
        self
    }

    /// First path is the initial document, the rest are lazy pages.
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let Some((first, rest)) = paths.split_first() else {
            bail!("no HTML files given");
        };
        let mut page = Self::from_tree(crate::html::parse_file(first)?);
        for p in rest {
            let tree = crate::html::parse_file(p)
                .with_context(|| format!("loading lazy page {}", p.as_ref().display()))?;
            page.pending.push_back(tree);
        }
        info!(
            initial = %first.as_ref().display(),
            lazy_pages = page.pending.len(),
            "opened history page"
        );
        Ok(page)
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn remaining_pages(&self) -> usize {
        self.pending.len()
    }

    pub fn loaded_pages(&self) -> usize {
        self.loaded_pages
    }

    /// Replace the whole document (a full re-render of the same page).
    ///
    /// The fresh tree is numbered past every id the old one handed out, so ids
    /// held from before the reload stop resolving while the old arena is freed.
    pub fn reload(&mut self, html: &str) {
        let fresh = parse_document(html).rebased(self.tree.id_end());
        let removed = self.tree.root().children().len();
        let added = fresh.root().children().len();
        self.tree = fresh;
        self.mutations.push(MutationRecord {
            added_nodes: added,
            removed_nodes: removed,
        });
        debug!(added, removed, arena = self.tree.arena_len(), "page reloaded");
    }

    /// Graft every top-level trade block of `src` under `parent`.
    pub fn append_blocks(&mut self, parent: NodeId, src: &DomTree) -> usize {
        let blocks = outermost_blocks(src);
        for &id in &blocks {
            self.tree.graft(parent, src, id);
        }
        if !blocks.is_empty() {
            self.mutations.push(MutationRecord::added(blocks.len()));
        }
        blocks.len()
    }

    /// Where lazily loaded blocks go: next to the last top-level block on the
    /// page, or beside the control when the page has none yet.
    fn list_container(&self, control: NodeId) -> NodeId {
        outermost_blocks(&self.tree)
            .last()
            .and_then(|&b| self.tree.get(b))
            .and_then(|b| b.parent())
            .or_else(|| self.tree.get(control).and_then(|c| c.parent()))
            .map(|n| n.id())
            .unwrap_or_else(|| self.tree.root_id())
    }
}

fn outermost_blocks(tree: &DomTree) -> Vec<NodeId> {
    select_all(&tree.root(), BLOCK_PATTERNS)
        .into_iter()
        .filter(|b| {
            b.parent()
                .and_then(|p| closest(&p, BLOCK_PATTERNS))
                .is_none()
        })
        .map(|b| b.id())
        .collect()
}

impl Document for HistoryPage {
    type Id = NodeId;
    type Node<'a> = NodeRef<'a>;

    fn root(&self) -> NodeRef<'_> {
        self.tree.root()
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.tree.get(id)
    }

    fn activate(&mut self, id: NodeId) -> bool {
        if !self.tree.is_attached(id) {
            return false;
        }

        if let Some(next) = self.pending.pop_front() {
            let container = self.list_container(id);
            let added = self.append_blocks(container, &next);
            self.loaded_pages += 1;
            debug!(added, remaining = self.pending.len(), "loaded next history page");
        }

        if self.pending.is_empty() {
            self.tree.detach(id);
            self.mutations.push(MutationRecord::removed(1));
            info!(pages = self.loaded_pages, "history fully loaded; load-more removed");
        }
        true
    }

    fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradelog_core::document::select_first;
    use tradelog_core::pagination::LOAD_MORE_PATTERNS;

    const FIRST: &str = r#"<html><body>
        <div class="tradehistory_events">
          <div class="tradehistory_event">You received <span class="history_item">Hat</span></div>
        </div>
        <a class="load_more_history" href="javascript:void(0)">Load more</a>
    </body></html>"#;

    const SECOND: &str = r#"<html><body>
        <div class="tradehistory_event">You received <span class="history_item">Key</span>
          <div class="tradehistory_event">nested</div>
        </div>
    </body></html>"#;

    fn control(page: &HistoryPage) -> NodeId {
        select_first(&page.root(), LOAD_MORE_PATTERNS).unwrap().id()
    }

    #[test]
    fn activation_appends_next_page_then_removes_control() {
        let mut page = HistoryPage::new(FIRST).with_more_pages([SECOND]);
        let btn = control(&page);

        assert!(page.activate(btn));
        assert_eq!(
            page.take_mutations(),
            vec![MutationRecord::added(1), MutationRecord::removed(1)]
        );
        assert_eq!(page.loaded_pages(), 2);
        assert!(page.node(btn).is_none());
        assert!(!page.activate(btn));

        let list = select_first(&page.root(), &[tradelog_core::Pattern::Class("tradehistory_events")]).unwrap();
        assert_eq!(list.children().len(), 2);
    }

    #[test]
    fn control_survives_while_pages_remain() {
        let mut page = HistoryPage::new(FIRST).with_more_pages([SECOND, SECOND]);
        let btn = control(&page);
        page.activate(btn);
        assert!(page.node(btn).is_some());
        assert_eq!(page.remaining_pages(), 1);
        assert_eq!(page.take_mutations(), vec![MutationRecord::added(1)]);
    }

    #[test]
    fn reload_reports_a_rerender_and_retires_old_ids() {
        let mut page = HistoryPage::new(FIRST);
        let old_btn = control(&page);
        page.take_mutations();

        page.reload(FIRST);
        let muts = page.take_mutations();
        assert_eq!(muts.len(), 1);
        assert!(muts[0].added_nodes > 0);
        assert!(page.node(old_btn).is_none());
        assert_ne!(control(&page), old_btn);
    }

    #[test]
    fn repeated_reloads_keep_the_arena_bounded() {
        let mut page = HistoryPage::new(FIRST);
        let size = page.tree().arena_len();
        let mut last_btn = control(&page);
        for _ in 0..50 {
            page.reload(FIRST);
            let btn = control(&page);
            assert!(btn > last_btn);
            last_btn = btn;
        }
        assert_eq!(page.tree().arena_len(), size);
    }

    #[test]
    fn load_files_requires_a_path() {
        let empty: [&str; 0] = [];
        assert!(HistoryPage::load_files(&empty).is_err());
    }
}
