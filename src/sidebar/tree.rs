use crate::host::{Group, GroupColor, GroupId, Tab, TabId};

use super::session::{DragKind, DropTarget};

/// Where a tab's icon comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TabIcon {
    /// The page reported a favicon url.
    Url(String),

    /// No direct url: look the icon up by page url.
    PageFavicon(String),
}

impl TabIcon {
    pub fn for_tab(tab: &Tab) -> Self {
        match tab.fav_icon_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => Self::Url(url.to_owned()),
            None => Self::PageFavicon(tab.url.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AudioIndicator {
    #[default]
    None,
    Playing,
    Muted,
}

impl AudioIndicator {
    /// Muted wins over playing.
    pub fn for_state(audible: bool, muted: bool) -> Self {
        if muted {
            Self::Muted
        } else if audible {
            Self::Playing
        } else {
            Self::None
        }
    }
}

/// Transient drag-and-drop markers; only ever set during a drag session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragMarkers {
    pub drop_zone: bool,
    pub drag_over: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabNode {
    pub id: TabId,

    /// Denormalized copy of the parent's group, for fast membership checks.
    pub group_id: Option<GroupId>,

    pub title: String,
    pub url: String,
    pub icon: TabIcon,
    pub pinned: bool,
    pub active: bool,
    pub audio: AudioIndicator,
    pub markers: DragMarkers,
}

impl TabNode {
    pub fn from_tab(tab: &Tab) -> Self {
        Self {
            id: tab.id,
            group_id: tab.group_id,
            title: tab.title.clone(),
            url: tab.url.clone(),
            icon: TabIcon::for_tab(tab),
            pinned: tab.pinned,
            active: tab.active,
            audio: AudioIndicator::for_state(tab.audible, tab.muted),
            markers: DragMarkers::default(),
        }
    }

    pub fn tooltip(&self) -> String {
        format!("{}\n{}", self.title, self.url)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupNode {
    pub id: GroupId,
    pub title: String,
    pub color: GroupColor,
    pub collapsed: bool,
    pub tabs: Vec<TabNode>,
    pub markers: DragMarkers,
}

impl GroupNode {
    pub fn from_group(group: &Group) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            color: group.color,
            collapsed: group.collapsed,
            tabs: Vec::new(),
            markers: DragMarkers::default(),
        }
    }

    /// Mirror the registry's view of this group.
    pub fn apply(&mut self, group: &Group) {
        self.title.clone_from(&group.title);
        self.color = group.color;
        self.collapsed = group.collapsed;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Tab(TabNode),
    Group(GroupNode),
}

impl Node {
    pub fn key(&self) -> NodeKey {
        match self {
            Self::Tab(tab) => NodeKey::Tab(tab.id),
            Self::Group(group) => NodeKey::Group(group.id),
        }
    }
}

/// Identity of a rendered node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Tab(TabId),
    Group(GroupId),
}

/// Position of a tab node in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodePath {
    Root(usize),
    Grouped { group: usize, tab: usize },
}

/// The rendered tree: a root list of tab and group nodes, each group owning a run of tabs.
///
/// Order is implicit in position. The flattened tab order mirrors the host's window order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedTree {
    root: Vec<Node>,

    /// The synthetic "drop past the last item" zone; only present during a drag.
    end_zone: Option<DragMarkers>,
}

impl RenderedTree {
    pub fn nodes(&self) -> &[Node] {
        &self.root
    }

    pub fn end_zone(&self) -> Option<DragMarkers> {
        self.end_zone
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Swap in a freshly built root list in one step.
    pub(super) fn replace_root(&mut self, root: Vec<Node>) {
        self.root = root;
    }

    pub fn flat_tabs(&self) -> impl Iterator<Item = &TabNode> {
        self.root.iter().flat_map(|node| match node {
            Node::Tab(tab) => std::slice::from_ref(tab).iter(),
            Node::Group(group) => group.tabs.iter(),
        })
    }

    pub fn flat_tab_ids(&self) -> Vec<TabId> {
        self.flat_tabs().map(|t| t.id).collect()
    }

    pub fn flat_len(&self) -> usize {
        self.root
            .iter()
            .map(|node| match node {
                Node::Tab(_) => 1,
                Node::Group(group) => group.tabs.len(),
            })
            .sum()
    }

    pub fn groups(&self) -> impl Iterator<Item = &GroupNode> {
        self.root.iter().filter_map(|node| match node {
            Node::Group(group) => Some(group),
            Node::Tab(_) => None,
        })
    }

    fn groups_mut(&mut self) -> impl Iterator<Item = &mut GroupNode> {
        self.root.iter_mut().filter_map(|node| match node {
            Node::Group(group) => Some(group),
            Node::Tab(_) => None,
        })
    }

    pub fn group_position(&self, group: GroupId) -> Option<usize> {
        self.root
            .iter()
            .position(|node| matches!(node, Node::Group(g) if g.id == group))
    }

    pub fn group(&self, group: GroupId) -> Option<&GroupNode> {
        self.groups().find(|g| g.id == group)
    }

    pub fn group_mut(&mut self, group: GroupId) -> Option<&mut GroupNode> {
        self.groups_mut().find(|g| g.id == group)
    }

    pub fn find_tab(&self, tab: TabId) -> Option<NodePath> {
        self.root.iter().enumerate().find_map(|(i, node)| match node {
            Node::Tab(t) => (t.id == tab).then_some(NodePath::Root(i)),
            Node::Group(group) => group
                .tabs
                .iter()
                .position(|t| t.id == tab)
                .map(|t| NodePath::Grouped { group: i, tab: t }),
        })
    }

    pub fn tab_at(&self, path: NodePath) -> Option<&TabNode> {
        match path {
            NodePath::Root(i) => match self.root.get(i)? {
                Node::Tab(tab) => Some(tab),
                Node::Group(_) => None,
            },
            NodePath::Grouped { group, tab } => match self.root.get(group)? {
                Node::Group(g) => g.tabs.get(tab),
                Node::Tab(_) => None,
            },
        }
    }

    fn tab_at_mut(&mut self, path: NodePath) -> Option<&mut TabNode> {
        match path {
            NodePath::Root(i) => match self.root.get_mut(i)? {
                Node::Tab(tab) => Some(tab),
                Node::Group(_) => None,
            },
            NodePath::Grouped { group, tab } => match self.root.get_mut(group)? {
                Node::Group(g) => g.tabs.get_mut(tab),
                Node::Tab(_) => None,
            },
        }
    }

    pub fn tab(&self, tab: TabId) -> Option<&TabNode> {
        self.tab_at(self.find_tab(tab)?)
    }

    pub fn tab_mut(&mut self, tab: TabId) -> Option<&mut TabNode> {
        let path = self.find_tab(tab)?;
        self.tab_at_mut(path)
    }

    /// The group that owns the tab at `path`, if any.
    pub fn parent_group(&self, path: NodePath) -> Option<GroupId> {
        match path {
            NodePath::Root(_) => None,
            NodePath::Grouped { group, .. } => match self.root.get(group)? {
                Node::Group(g) => Some(g.id),
                Node::Tab(_) => None,
            },
        }
    }

    pub fn path_at_flat_index(&self, index: usize) -> Option<NodePath> {
        let mut remaining = index;
        for (i, node) in self.root.iter().enumerate() {
            match node {
                Node::Tab(_) => {
                    if remaining == 0 {
                        return Some(NodePath::Root(i));
                    }
                    remaining -= 1;
                }
                Node::Group(group) => {
                    if remaining < group.tabs.len() {
                        return Some(NodePath::Grouped {
                            group: i,
                            tab: remaining,
                        });
                    }
                    remaining -= group.tabs.len();
                }
            }
        }
        None
    }

    pub fn flat_index_of(&self, tab: TabId) -> Option<usize> {
        self.flat_tabs().position(|t| t.id == tab)
    }

    /// Flat index of the group's first tab. `None` for unknown or empty groups.
    pub fn first_flat_index_of_group(&self, group: GroupId) -> Option<usize> {
        let mut index = 0;
        for node in &self.root {
            match node {
                Node::Tab(_) => index += 1,
                Node::Group(g) if g.id == group => return (!g.tabs.is_empty()).then_some(index),
                Node::Group(g) => index += g.tabs.len(),
            }
        }
        None
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.flat_tabs().find(|t| t.active).map(|t| t.id)
    }

    /// Move the active marker to `tab`. Returns false if `tab` is not rendered.
    pub fn set_active(&mut self, tab: TabId) -> bool {
        if self.find_tab(tab).is_none() {
            return false;
        }
        self.for_each_tab_mut(|t| t.active = t.id == tab);
        true
    }

    fn for_each_tab_mut(&mut self, mut f: impl FnMut(&mut TabNode)) {
        for node in &mut self.root {
            match node {
                Node::Tab(tab) => f(tab),
                Node::Group(group) => group.tabs.iter_mut().for_each(&mut f),
            }
        }
    }

    pub(super) fn remove_tab(&mut self, tab: TabId) -> Option<TabNode> {
        match self.find_tab(tab)? {
            NodePath::Root(i) => match self.root.remove(i) {
                Node::Tab(node) => Some(node),
                Node::Group(_) => None,
            },
            NodePath::Grouped { group, tab } => match &mut self.root[group] {
                Node::Group(g) => Some(g.tabs.remove(tab)),
                Node::Tab(_) => None,
            },
        }
    }

    /// Insert `node` at `path`, retagging it with the group it lands in.
    pub(super) fn insert_tab(&mut self, path: NodePath, mut node: TabNode) {
        match path {
            NodePath::Root(i) => {
                node.group_id = None;
                let i = i.min(self.root.len());
                self.root.insert(i, Node::Tab(node));
            }
            NodePath::Grouped { group, tab } => match self.root.get_mut(group) {
                Some(Node::Group(g)) => {
                    node.group_id = Some(g.id);
                    let tab = tab.min(g.tabs.len());
                    g.tabs.insert(tab, node);
                }
                _ => {
                    node.group_id = None;
                    self.root.push(Node::Tab(node));
                }
            },
        }
    }

    /// Dissolve a group node in place: its tabs move to the root list where the group was.
    pub(super) fn unwrap_group(&mut self, group: GroupId) -> bool {
        let Some(pos) = self.group_position(group) else {
            return false;
        };
        let Node::Group(node) = self.root.remove(pos) else {
            return false;
        };
        let tabs = node.tabs.into_iter().map(|mut tab| {
            tab.group_id = None;
            Node::Tab(tab)
        });
        self.root.splice(pos..pos, tabs);
        true
    }

    /// The drop target that means "stay where you are" for the node at `key`.
    pub fn next_sibling_target(&self, key: NodeKey) -> Option<DropTarget> {
        let root_target = |i: usize| match self.root.get(i) {
            Some(Node::Tab(t)) => DropTarget::Tab(t.id),
            Some(Node::Group(g)) => DropTarget::Group(g.id),
            None => DropTarget::End,
        };
        match key {
            NodeKey::Tab(tab) => match self.find_tab(tab)? {
                NodePath::Root(i) => Some(root_target(i + 1)),
                NodePath::Grouped { group, tab } => match self.root.get(group)? {
                    Node::Group(g) => g.tabs.get(tab + 1).map(|t| DropTarget::Tab(t.id)),
                    Node::Tab(_) => None,
                },
            },
            NodeKey::Group(group) => Some(root_target(self.group_position(group)? + 1)),
        }
    }

    /// Provisionally move the dragged node in front of `target`. Returns false when either side
    /// is no longer rendered.
    pub(super) fn move_before(&mut self, kind: DragKind, target: DropTarget) -> bool {
        match kind {
            DragKind::Tab(tab) => {
                if target == DropTarget::Tab(tab) {
                    return false;
                }
                let Some(node) = self.remove_tab(tab) else {
                    return false;
                };
                let path = match target {
                    DropTarget::Tab(before) => self.find_tab(before),
                    DropTarget::Group(group) => self.group_position(group).map(NodePath::Root),
                    DropTarget::End => Some(NodePath::Root(self.root.len())),
                };
                match path {
                    Some(path) => {
                        self.insert_tab(path, node);
                        true
                    }
                    None => {
                        // Target vanished: leave the tab at the end so nothing is orphaned.
                        self.insert_tab(NodePath::Root(self.root.len()), node);
                        false
                    }
                }
            }
            DragKind::Group(group) => {
                let Some(from) = self.group_position(group) else {
                    return false;
                };
                let node = self.root.remove(from);
                let to = match target {
                    DropTarget::Tab(before) => match self.find_tab(before) {
                        Some(NodePath::Root(i) | NodePath::Grouped { group: i, .. }) => Some(i),
                        None => None,
                    },
                    DropTarget::Group(before) => self.group_position(before),
                    DropTarget::End => Some(self.root.len()),
                };
                match to {
                    Some(to) => {
                        self.root.insert(to, node);
                        true
                    }
                    None => {
                        self.root.insert(from, node);
                        false
                    }
                }
            }
        }
    }

    pub(super) fn collapse_all_groups(&mut self) {
        for group in self.groups_mut() {
            group.collapsed = true;
        }
    }

    /// Restore group collapse state from a remembered set of collapsed groups.
    pub(super) fn restore_collapsed(&mut self, collapsed: &ahash::HashSet<GroupId>) {
        for group in self.groups_mut() {
            group.collapsed = collapsed.contains(&group.id);
        }
    }

    pub(super) fn mark_drop_zones(&mut self) {
        for node in &mut self.root {
            match node {
                Node::Tab(tab) => tab.markers.drop_zone = true,
                Node::Group(group) => {
                    group.markers.drop_zone = true;
                    for tab in &mut group.tabs {
                        tab.markers.drop_zone = true;
                    }
                }
            }
        }
        self.end_zone = Some(DragMarkers {
            drop_zone: true,
            drag_over: false,
        });
    }

    /// Highlight exactly one zone (or none).
    pub(super) fn set_drag_over(&mut self, target: Option<DropTarget>) {
        for node in &mut self.root {
            match node {
                Node::Tab(tab) => {
                    tab.markers.drag_over = target == Some(DropTarget::Tab(tab.id));
                }
                Node::Group(group) => {
                    group.markers.drag_over = target == Some(DropTarget::Group(group.id));
                    for tab in &mut group.tabs {
                        tab.markers.drag_over = target == Some(DropTarget::Tab(tab.id));
                    }
                }
            }
        }
        if let Some(end) = &mut self.end_zone {
            end.drag_over = target == Some(DropTarget::End);
        }
    }

    pub(super) fn clear_drag_markers(&mut self) {
        for node in &mut self.root {
            match node {
                Node::Tab(tab) => tab.markers = DragMarkers::default(),
                Node::Group(group) => {
                    group.markers = DragMarkers::default();
                    for tab in &mut group.tabs {
                        tab.markers = DragMarkers::default();
                    }
                }
            }
        }
        self.end_zone = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WindowId;

    fn tab(id: i32, group: Option<i32>) -> TabNode {
        TabNode::from_tab(&Tab {
            id: TabId(id),
            group_id: group.map(GroupId),
            title: format!("T{id}"),
            ..Default::default()
        })
    }

    fn group(id: i32, tabs: Vec<TabNode>) -> Node {
        let mut node = GroupNode::from_group(&Group {
            id: GroupId(id),
            window_id: WindowId(1),
            title: format!("G{id}"),
            color: GroupColor::Blue,
            collapsed: false,
        });
        node.tabs = tabs;
        Node::Group(node)
    }

    /// `[T1, G1{T2, T3}, T4]`
    fn sample() -> RenderedTree {
        let mut tree = RenderedTree::default();
        tree.replace_root(vec![
            Node::Tab(tab(1, None)),
            group(1, vec![tab(2, Some(1)), tab(3, Some(1))]),
            Node::Tab(tab(4, None)),
        ]);
        tree
    }

    fn ids(raw: &[i32]) -> Vec<TabId> {
        raw.iter().copied().map(TabId).collect()
    }

    #[test]
    fn flat_indices_walk_into_groups() {
        let tree = sample();
        assert_eq!(tree.flat_len(), 4);
        assert_eq!(tree.path_at_flat_index(0), Some(NodePath::Root(0)));
        assert_eq!(
            tree.path_at_flat_index(2),
            Some(NodePath::Grouped { group: 1, tab: 1 })
        );
        assert_eq!(tree.path_at_flat_index(3), Some(NodePath::Root(2)));
        assert_eq!(tree.path_at_flat_index(4), None);
        assert_eq!(tree.first_flat_index_of_group(GroupId(1)), Some(1));
    }

    #[test]
    fn unwrap_group_reparents_tabs_in_place() {
        let mut tree = sample();
        assert!(tree.unwrap_group(GroupId(1)));
        assert_eq!(tree.flat_tab_ids(), ids(&[1, 2, 3, 4]));
        assert_eq!(tree.nodes().len(), 4);
        assert!(tree.flat_tabs().all(|t| t.group_id.is_none()));
    }

    #[test]
    fn moving_a_tab_into_a_group_retags_it() {
        let mut tree = sample();
        assert!(tree.move_before(DragKind::Tab(TabId(4)), DropTarget::Tab(TabId(3))));
        assert_eq!(tree.flat_tab_ids(), ids(&[1, 2, 4, 3]));
        assert_eq!(tree.tab(TabId(4)).unwrap().group_id, Some(GroupId(1)));
    }

    #[test]
    fn moving_a_group_carries_its_tabs() {
        let mut tree = sample();
        assert!(tree.move_before(DragKind::Group(GroupId(1)), DropTarget::End));
        assert_eq!(tree.flat_tab_ids(), ids(&[1, 4, 2, 3]));
        assert!(tree.move_before(DragKind::Group(GroupId(1)), DropTarget::Tab(TabId(1))));
        assert_eq!(tree.flat_tab_ids(), ids(&[2, 3, 1, 4]));
    }

    #[test]
    fn next_sibling_targets() {
        let tree = sample();
        assert_eq!(
            tree.next_sibling_target(NodeKey::Tab(TabId(1))),
            Some(DropTarget::Group(GroupId(1)))
        );
        assert_eq!(
            tree.next_sibling_target(NodeKey::Tab(TabId(2))),
            Some(DropTarget::Tab(TabId(3)))
        );
        assert_eq!(tree.next_sibling_target(NodeKey::Tab(TabId(3))), None);
        assert_eq!(
            tree.next_sibling_target(NodeKey::Tab(TabId(4))),
            Some(DropTarget::End)
        );
    }

    #[test]
    fn drag_over_marks_exactly_one_zone() {
        let mut tree = sample();
        tree.mark_drop_zones();
        tree.set_drag_over(Some(DropTarget::Tab(TabId(2))));
        let over: Vec<TabId> = tree
            .flat_tabs()
            .filter(|t| t.markers.drag_over)
            .map(|t| t.id)
            .collect();
        assert_eq!(over, ids(&[2]));
        assert!(tree.flat_tabs().all(|t| t.markers.drop_zone));

        tree.clear_drag_markers();
        assert!(tree.end_zone().is_none());
        assert!(tree.flat_tabs().all(|t| t.markers == DragMarkers::default()));
    }
}
