use itertools::Itertools as _;

use crate::host::{GroupId, HostError, Tab, TabHost, TabQuery};

use super::TabSidebar;
use super::preferences::PinMode;
use super::tree::{GroupNode, Node, NodePath, TabNode};

/// Result of a full rebuild attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The new tree is in place.
    Built,

    /// A drag is in progress; nothing was touched.
    Skipped,

    /// A tab references a group the host no longer knows. Nothing was touched.
    MissingGroup(GroupId),

    /// The host reported a group's tabs in two separate runs. Nothing was touched.
    Inconsistent(GroupId),

    /// A host query failed. Nothing was touched.
    Failed,
}

/// Result of an incremental single-tab insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,

    /// The position cannot be derived from the current tree; a rebuild is needed.
    Ambiguous,
}

impl TabSidebar {
    fn lists_pinned(&self) -> bool {
        self.preferences.pin_mode == PinMode::Show
    }

    /// Whether `tab` is rendered at all under the current preferences.
    pub(super) fn is_listed(&self, tab: &Tab) -> bool {
        self.lists_pinned() || !tab.pinned
    }

    /// Host index of the tab at rendered flat index `flat`.
    pub(super) fn host_index(&self, flat: usize) -> usize {
        flat + self.hidden_pinned
    }

    /// Replace the whole tree with the host's current state of this window.
    pub(super) fn build_full(&mut self, host: &mut dyn TabHost) -> Result<BuildOutcome, HostError> {
        if self.session.is_dragging() {
            return Ok(BuildOutcome::Skipped);
        }

        let mut tabs = host.query_tabs(&TabQuery::window(self.session.window))?;
        tabs.sort_by_key(|t| t.index);

        let lists_pinned = self.lists_pinned();
        let hidden_pinned = tabs.iter().filter(|t| t.pinned && !lists_pinned).count();
        let mut root: Vec<Node> = Vec::new();
        let mut seen_groups: ahash::HashSet<GroupId> = ahash::HashSet::default();
        let mut active = None;

        let listed = tabs.iter().filter(|t| lists_pinned || !t.pinned);
        for (group, run) in &listed.chunk_by(|t| t.group_id) {
            let nodes = run.map(|t| {
                if t.active {
                    active = Some(t.id);
                }
                TabNode::from_tab(t)
            });
            match group {
                None => root.extend(nodes.map(Node::Tab)),
                Some(group) => {
                    if !seen_groups.insert(group) {
                        return Ok(BuildOutcome::Inconsistent(group));
                    }
                    let Some(meta) = self.registry.get(host, group)? else {
                        return Ok(BuildOutcome::MissingGroup(group));
                    };
                    let mut node = GroupNode::from_group(&meta);
                    node.tabs = nodes.collect();
                    root.push(Node::Group(node));
                }
            }
        }

        self.tree.replace_root(root);
        self.hidden_pinned = hidden_pinned;
        if active.is_some() {
            self.session.scroll_to = active;
        }
        Ok(BuildOutcome::Built)
    }

    /// Place one freshly created tab without a rebuild, when its position is unambiguous.
    pub(super) fn insert_one(&mut self, tab: &Tab) -> InsertOutcome {
        let Some(index) = tab.index.checked_sub(self.hidden_pinned) else {
            return InsertOutcome::Ambiguous;
        };
        let len = self.tree.flat_len();

        let path = match tab.group_id {
            None if index == len => NodePath::Root(self.tree.nodes().len()),
            None if index < len => match self.tree.path_at_flat_index(index) {
                Some(NodePath::Root(i) | NodePath::Grouped { group: i, .. }) => NodePath::Root(i),
                None => return InsertOutcome::Ambiguous,
            },
            None => return InsertOutcome::Ambiguous,
            Some(group) => {
                let Some(prev) = index
                    .checked_sub(1)
                    .and_then(|prev| self.tree.path_at_flat_index(prev))
                else {
                    return InsertOutcome::Ambiguous;
                };
                match prev {
                    NodePath::Grouped { group: g, tab: t }
                        if self.tree.parent_group(prev) == Some(group) =>
                    {
                        NodePath::Grouped { group: g, tab: t + 1 }
                    }
                    _ => return InsertOutcome::Ambiguous,
                }
            }
        };

        self.tree.insert_tab(path, TabNode::from_tab(tab));
        if tab.active {
            self.tree.set_active(tab.id);
        }
        InsertOutcome::Inserted
    }
}
