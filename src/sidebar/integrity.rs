use std::hash::{Hash as _, Hasher as _};

use crate::host::{GroupId, Tab, TabId};

use super::tree::{Node, RenderedTree};

/// Structural problems visible from the tree alone.
pub(super) fn tree_integrity_issues(tree: &RenderedTree, dragging: bool) -> Vec<String> {
    let mut issues: Vec<String> = Vec::new();
    let mut tabs_seen: ahash::HashSet<TabId> = ahash::HashSet::default();
    let mut groups_seen: ahash::HashSet<GroupId> = ahash::HashSet::default();

    for node in tree.nodes() {
        match node {
            Node::Tab(tab) => {
                if let Some(tag) = tab.group_id {
                    issues.push(format!(
                        "integrity: root tab {} tagged with group {}",
                        tab.id.0, tag.0
                    ));
                }
            }
            Node::Group(group) => {
                if !groups_seen.insert(group.id) {
                    issues.push(format!("integrity: group {} rendered twice", group.id.0));
                }
                for tab in &group.tabs {
                    if tab.group_id != Some(group.id) {
                        issues.push(format!(
                            "integrity: tab {} in group {} tagged {:?}",
                            tab.id.0,
                            group.id.0,
                            tab.group_id.map(|g| g.0)
                        ));
                    }
                }
            }
        }
    }

    for tab in tree.flat_tabs() {
        if !tabs_seen.insert(tab.id) {
            issues.push(format!("integrity: tab {} rendered twice", tab.id.0));
        }
    }

    let active = tree.flat_tabs().filter(|t| t.active).count();
    if active > 1 {
        issues.push(format!("integrity: {active} tabs marked active"));
    }

    if !dragging {
        let marked = tree
            .flat_tabs()
            .filter(|t| t.markers.drop_zone || t.markers.drag_over)
            .count()
            + tree
                .groups()
                .filter(|g| g.markers.drop_zone || g.markers.drag_over)
                .count();
        if marked > 0 || tree.end_zone().is_some() {
            issues.push(format!("integrity: {marked} drag markers left outside a drag"));
        }
    }

    issues
}

/// Differences between the rendered order/containment and the host's `listed` tabs
/// (one window, already filtered to what is rendered).
pub(super) fn order_issues(tree: &RenderedTree, listed: &[Tab]) -> Vec<String> {
    let mut issues: Vec<String> = Vec::new();
    let mut host: Vec<&Tab> = listed.iter().collect();
    host.sort_by_key(|t| t.index);

    let rendered = tree.flat_tab_ids();
    let expected: Vec<TabId> = host.iter().map(|t| t.id).collect();
    if rendered != expected {
        issues.push(format!(
            "order: rendered {:?} != host {:?}",
            rendered.iter().map(|t| t.0).collect::<Vec<_>>(),
            expected.iter().map(|t| t.0).collect::<Vec<_>>()
        ));
    }

    for tab in host {
        let Some(path) = tree.find_tab(tab.id) else {
            continue;
        };
        let parent = tree.parent_group(path);
        if parent != tab.group_id {
            issues.push(format!(
                "containment: tab {} rendered under {:?}, host says {:?}",
                tab.id.0,
                parent.map(|g| g.0),
                tab.group_id.map(|g| g.0)
            ));
        }
    }

    issues
}

pub(super) fn hash_issues(lines: &[String]) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for line in lines {
        line.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Group, GroupColor, WindowId};
    use crate::sidebar::tree::{GroupNode, TabNode};

    fn host_tab(id: i32, index: usize, group: Option<i32>) -> Tab {
        Tab {
            id: TabId(id),
            index,
            group_id: group.map(GroupId),
            ..Default::default()
        }
    }

    fn tree_of(tabs: &[Tab]) -> RenderedTree {
        let mut root = Vec::new();
        for tab in tabs {
            let node = TabNode::from_tab(tab);
            match tab.group_id {
                None => root.push(Node::Tab(node)),
                Some(g) => match root.last_mut() {
                    Some(Node::Group(group)) if group.id == g => group.tabs.push(node),
                    _ => {
                        let mut group = GroupNode::from_group(&Group {
                            id: g,
                            window_id: WindowId(1),
                            title: String::new(),
                            color: GroupColor::Grey,
                            collapsed: false,
                        });
                        group.tabs.push(node);
                        root.push(Node::Group(group));
                    }
                },
            }
        }
        let mut tree = RenderedTree::default();
        tree.replace_root(root);
        tree
    }

    #[test]
    fn consistent_tree_has_no_issues() {
        let tabs = [host_tab(1, 0, None), host_tab(2, 1, Some(1)), host_tab(3, 2, None)];
        let tree = tree_of(&tabs);
        assert!(tree_integrity_issues(&tree, false).is_empty());
        assert!(order_issues(&tree, &tabs).is_empty());
    }

    #[test]
    fn order_and_containment_drift_is_reported() {
        let tabs = [host_tab(1, 0, None), host_tab(2, 1, Some(1))];
        let tree = tree_of(&tabs);
        let moved = [host_tab(2, 0, None), host_tab(1, 1, None)];
        let issues = order_issues(&tree, &moved);
        assert_eq!(issues.len(), 2, "{issues:?}");
        assert!(issues[0].starts_with("order:"));
        assert!(issues[1].starts_with("containment: tab 2"));
    }

    #[test]
    fn duplicate_groups_are_reported() {
        let tabs = [host_tab(1, 0, Some(1)), host_tab(2, 1, None), host_tab(3, 2, Some(1))];
        let issues = tree_integrity_issues(&tree_of(&tabs), false);
        assert_eq!(issues, vec!["integrity: group 1 rendered twice".to_owned()]);
    }

    #[test]
    fn issue_hash_is_order_sensitive() {
        let a = vec!["x".to_owned(), "y".to_owned()];
        let b = vec!["y".to_owned(), "x".to_owned()];
        assert_ne!(hash_issues(&a), hash_issues(&b));
        assert_eq!(hash_issues(&a), hash_issues(&a.clone()));
    }
}
