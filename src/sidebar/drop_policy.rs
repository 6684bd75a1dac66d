use super::session::{DragKind, DropTarget};
use super::tree::{NodeKey, RenderedTree};

/// Map the zone under the pointer to the node the dragged item will be placed in front of.
///
/// - A group header means the group container, for both drag kinds.
/// - A group cannot land inside another group: a tab of group `H` resolves to `H` itself.
/// - Dropping onto yourself (or onto a tab of the dragged group) resolves to nothing.
pub(super) fn resolve_target(
    tree: &RenderedTree,
    kind: DragKind,
    target: DropTarget,
) -> Option<DropTarget> {
    match (kind, target) {
        (_, DropTarget::End) => Some(DropTarget::End),
        (DragKind::Tab(dragged), DropTarget::Tab(tab)) => {
            (dragged != tab && tree.find_tab(tab).is_some()).then_some(target)
        }
        (DragKind::Tab(_), DropTarget::Group(group)) => tree.group(group).map(|_| target),
        (DragKind::Group(dragged), DropTarget::Tab(tab)) => {
            let path = tree.find_tab(tab)?;
            match tree.parent_group(path) {
                Some(parent) if parent == dragged => None,
                Some(parent) => Some(DropTarget::Group(parent)),
                None => Some(target),
            }
        }
        (DragKind::Group(dragged), DropTarget::Group(group)) => {
            (dragged != group && tree.group(group).is_some()).then_some(target)
        }
    }
}

/// True if dropping `kind` in front of `target` would leave everything where it is.
pub(super) fn is_noop(tree: &RenderedTree, kind: DragKind, target: DropTarget) -> bool {
    let key = match kind {
        DragKind::Tab(tab) => NodeKey::Tab(tab),
        DragKind::Group(group) => NodeKey::Group(group),
    };
    tree.next_sibling_target(key) == Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Group, GroupColor, GroupId, Tab, TabId, WindowId};
    use crate::sidebar::tree::{GroupNode, Node, TabNode};

    fn tab(id: i32) -> TabNode {
        TabNode::from_tab(&Tab {
            id: TabId(id),
            ..Default::default()
        })
    }

    fn group(id: i32, tabs: &[i32]) -> Node {
        let mut node = GroupNode::from_group(&Group {
            id: GroupId(id),
            window_id: WindowId(1),
            title: String::new(),
            color: GroupColor::Grey,
            collapsed: false,
        });
        node.tabs = tabs.iter().map(|&t| tab(t)).collect();
        Node::Group(node)
    }

    /// `[T1, G1{T2, T3}, G2{T4}, T5]`
    fn sample() -> RenderedTree {
        let mut tree = RenderedTree::default();
        tree.replace_root(vec![
            Node::Tab(tab(1)),
            group(1, &[2, 3]),
            group(2, &[4]),
            Node::Tab(tab(5)),
        ]);
        tree
    }

    #[test]
    fn group_drag_onto_another_groups_tab_targets_that_group() {
        let tree = sample();
        assert_eq!(
            resolve_target(&tree, DragKind::Group(GroupId(1)), DropTarget::Tab(TabId(4))),
            Some(DropTarget::Group(GroupId(2)))
        );
        assert_eq!(
            resolve_target(&tree, DragKind::Group(GroupId(1)), DropTarget::Tab(TabId(3))),
            None
        );
        assert_eq!(
            resolve_target(&tree, DragKind::Group(GroupId(2)), DropTarget::Tab(TabId(1))),
            Some(DropTarget::Tab(TabId(1)))
        );
    }

    #[test]
    fn self_and_unknown_targets_resolve_to_nothing() {
        let tree = sample();
        let t1 = DragKind::Tab(TabId(1));
        assert_eq!(resolve_target(&tree, t1, DropTarget::Tab(TabId(1))), None);
        assert_eq!(resolve_target(&tree, t1, DropTarget::Tab(TabId(99))), None);
        assert_eq!(resolve_target(&tree, t1, DropTarget::Group(GroupId(99))), None);
        assert_eq!(
            resolve_target(&tree, DragKind::Group(GroupId(1)), DropTarget::Group(GroupId(1))),
            None
        );
    }

    #[test]
    fn next_sibling_drops_are_noops() {
        let tree = sample();
        assert!(is_noop(&tree, DragKind::Tab(TabId(1)), DropTarget::Group(GroupId(1))));
        assert!(is_noop(&tree, DragKind::Tab(TabId(2)), DropTarget::Tab(TabId(3))));
        assert!(is_noop(&tree, DragKind::Tab(TabId(5)), DropTarget::End));
        assert!(is_noop(&tree, DragKind::Group(GroupId(1)), DropTarget::Group(GroupId(2))));

        // Last tab of a group dropped on the end zone leaves the group: a real move.
        assert!(!is_noop(&tree, DragKind::Tab(TabId(4)), DropTarget::End));
        assert!(!is_noop(&tree, DragKind::Tab(TabId(1)), DropTarget::Tab(TabId(2))));
    }
}
