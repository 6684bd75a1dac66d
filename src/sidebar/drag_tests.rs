use crate::host::{
    EntityRef, GroupColor, GroupId, GroupUpdate, HostError, TabHost, TabId, TabPosition,
};
use crate::memory_host::{HostCall, MemoryHost};

use super::integrity;
use super::{DragKind, DropOutcome, DropTarget, MemoryPreferences, TabSidebar};

fn assert_tree_ok(sidebar: &TabSidebar) {
    let issues = integrity::tree_integrity_issues(sidebar.tree(), sidebar.is_dragging());
    assert!(
        issues.is_empty(),
        "tree integrity failed:\n{}",
        issues.join("\n")
    );
}

fn ids(raw: &[i32]) -> Vec<TabId> {
    raw.iter().copied().map(TabId).collect()
}

/// `[T1, G1{T2, T3}, T4]`; the host call log starts empty.
fn setup() -> (TabSidebar, MemoryHost, GroupId) {
    let mut host = MemoryHost::new();
    let t1 = host.add_tab("T1", "https://one.example/");
    let t2 = host.add_tab("T2", "https://two.example/");
    let t3 = host.add_tab("T3", "https://three.example/");
    host.add_tab("T4", "https://four.example/");
    let g1 = host.add_group(&[t2, t3], "G1", GroupColor::Blue);
    host.set_active(t1);

    let mut sidebar = TabSidebar::new();
    sidebar
        .initialize(&mut host, &MemoryPreferences::default())
        .unwrap();
    host.clear_calls();
    (sidebar, host, g1)
}

#[test]
fn tab_dropped_before_an_earlier_tab() {
    let (mut sidebar, mut host, _) = setup();
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(4))));
    let outcome = sidebar.drop_drag(&mut host, DropTarget::Tab(TabId(1)));

    assert_eq!(outcome, DropOutcome::Applied);
    assert_eq!(host.calls(), &[HostCall::MoveTab(TabId(4), TabPosition::At(0))]);
    assert_eq!(host.tab_ids(host.window()), ids(&[4, 1, 2, 3]));
    assert_eq!(sidebar.tree().flat_tab_ids(), ids(&[4, 1, 2, 3]));
    assert!(!sidebar.is_dragging());
    assert_tree_ok(&sidebar);
}

#[test]
fn tab_dropped_before_a_later_tab_lands_right_in_front_of_it() {
    let (mut sidebar, mut host, _) = setup();
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(1))));
    let outcome = sidebar.drop_drag(&mut host, DropTarget::Tab(TabId(4)));

    assert_eq!(outcome, DropOutcome::Applied);
    let dropped = host.tab(TabId(1)).unwrap().index;
    let target = host.tab(TabId(4)).unwrap().index;
    assert_eq!(dropped + 1, target);
    assert_eq!(host.tab(TabId(1)).unwrap().group_id, None);
    assert_eq!(sidebar.tree().flat_tab_ids(), ids(&[2, 3, 1, 4]));
    assert_tree_ok(&sidebar);
}

#[test]
fn tab_dropped_inside_a_group_joins_it() {
    let (mut sidebar, mut host, g1) = setup();
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(4))));
    let outcome = sidebar.drop_drag(&mut host, DropTarget::Tab(TabId(3)));

    assert_eq!(outcome, DropOutcome::Applied);
    assert_eq!(
        host.calls(),
        &[
            HostCall::GroupTabs(vec![TabId(4)], Some(g1)),
            HostCall::MoveTab(TabId(4), TabPosition::At(2)),
        ]
    );
    assert_eq!(host.tab_ids(host.window()), ids(&[1, 2, 4, 3]));
    let group = sidebar.tree().group(g1).unwrap();
    assert_eq!(group.tabs.iter().map(|t| t.id).collect::<Vec<_>>(), ids(&[2, 4, 3]));
    assert_tree_ok(&sidebar);
}

#[test]
fn tab_dropped_out_of_its_group_is_ungrouped_first() {
    let (mut sidebar, mut host, g1) = setup();
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(2))));
    let outcome = sidebar.drop_drag(&mut host, DropTarget::End);

    assert_eq!(outcome, DropOutcome::Applied);
    assert_eq!(
        host.calls(),
        &[
            HostCall::UngroupTabs(vec![TabId(2)]),
            HostCall::MoveTab(TabId(2), TabPosition::At(3)),
        ]
    );
    assert_eq!(host.tab_ids(host.window()), ids(&[1, 3, 4, 2]));
    assert_eq!(host.tab(TabId(2)).unwrap().group_id, None);
    assert_eq!(sidebar.tree().group(g1).map(|g| g.tabs.len()), Some(1));
    assert_tree_ok(&sidebar);
}

#[test]
fn group_removed_mid_drag_fails_the_drop_and_rebuilds() {
    let (mut sidebar, mut host, g1) = setup();
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(4))));
    host.remove_group_externally(g1);

    let outcome = sidebar.drop_drag(&mut host, DropTarget::Tab(TabId(3)));
    assert_eq!(
        outcome,
        DropOutcome::Failed(HostError::NotFound(EntityRef::Group(g1)))
    );
    assert!(!sidebar.is_dragging());
    assert_eq!(host.tab(TabId(4)).unwrap().group_id, None);
    assert_eq!(sidebar.tree().flat_tab_ids(), ids(&[1, 2, 3, 4]));
    assert!(sidebar.tree().groups().next().is_none());
    assert_tree_ok(&sidebar);
}

#[test]
fn group_moved_backwards_is_one_host_call() {
    let (mut sidebar, mut host, g1) = setup();
    assert!(sidebar.begin_drag(DragKind::Group(g1)));
    let outcome = sidebar.drop_drag(&mut host, DropTarget::Tab(TabId(1)));

    assert_eq!(outcome, DropOutcome::Applied);
    assert_eq!(host.calls(), &[HostCall::MoveGroup(g1, None, TabPosition::At(0))]);
    assert_eq!(host.tab_ids(host.window()), ids(&[2, 3, 1, 4]));
    assert_eq!(sidebar.tree().group_position(g1), Some(0));
    assert_tree_ok(&sidebar);
}

#[test]
fn group_moved_forwards_keeps_its_looks() {
    let mut host = MemoryHost::new();
    let t1 = host.add_tab("T1", "https://one.example/");
    let t2 = host.add_tab("T2", "https://two.example/");
    let t3 = host.add_tab("T3", "https://three.example/");
    let t4 = host.add_tab("T4", "https://four.example/");
    let g1 = host.add_group(&[t2, t3], "Research", GroupColor::Purple);
    host.set_group_collapsed(g1, true);
    let mut sidebar = TabSidebar::new();
    sidebar
        .initialize(&mut host, &MemoryPreferences::default())
        .unwrap();

    assert!(sidebar.begin_drag(DragKind::Group(g1)));
    let outcome = sidebar.drop_drag(&mut host, DropTarget::End);
    assert_eq!(outcome, DropOutcome::Applied);

    assert_eq!(host.tab_ids(host.window()), vec![t1, t4, t2, t3]);
    let regrouped = host.tab(t2).and_then(|t| t.group_id).unwrap();
    assert_eq!(host.tab(t3).and_then(|t| t.group_id), Some(regrouped));
    let group = host.group(regrouped).unwrap();
    assert_eq!(group.title, "Research");
    assert_eq!(group.color, GroupColor::Purple);
    assert!(group.collapsed);

    let node = sidebar.tree().group(regrouped).unwrap();
    assert_eq!(node.title, "Research");
    assert!(node.collapsed);
    assert_eq!(sidebar.tree().flat_tab_ids(), vec![t1, t4, t2, t3]);
    assert_tree_ok(&sidebar);
}

#[test]
fn group_member_closed_mid_forward_move_is_skipped() {
    let mut host = MemoryHost::new();
    let t1 = host.add_tab("T1", "https://one.example/");
    let t2 = host.add_tab("T2", "https://two.example/");
    let t3 = host.add_tab("T3", "https://three.example/");
    let t4 = host.add_tab("T4", "https://four.example/");
    let t5 = host.add_tab("T5", "https://five.example/");
    let g1 = host.add_group(&[t2, t3, t4], "Reading", GroupColor::Green);
    host.set_active(t1);
    let mut sidebar = TabSidebar::new();
    sidebar
        .initialize(&mut host, &MemoryPreferences::default())
        .unwrap();

    assert!(sidebar.begin_drag(DragKind::Group(g1)));
    host.close_tab_externally(t3);
    let outcome = sidebar.drop_drag(&mut host, DropTarget::End);

    assert_eq!(outcome, DropOutcome::Applied);
    assert_eq!(host.tab_ids(host.window()), vec![t1, t5, t2, t4]);
    let regrouped = host.tab(t2).and_then(|t| t.group_id).unwrap();
    assert_eq!(host.tab(t4).and_then(|t| t.group_id), Some(regrouped));
    let group = host.group(regrouped).unwrap();
    assert_eq!(group.title, "Reading");
    assert_eq!(group.color, GroupColor::Green);

    for now in [1.0, 2.0, 3.0] {
        sidebar.pump(&mut host, now);
    }
    assert!(!sidebar.is_rebuild_pending());
    assert_eq!(sidebar.tree().flat_tab_ids(), vec![t1, t5, t2, t4]);
    assert_eq!(sidebar.tree().group_position(regrouped), Some(2));
    assert_tree_ok(&sidebar);
}

#[test]
fn group_dissolved_mid_drag_makes_no_host_calls() {
    let (mut sidebar, mut host, g1) = setup();
    assert!(sidebar.begin_drag(DragKind::Group(g1)));
    host.remove_group_externally(g1);

    let outcome = sidebar.drop_drag(&mut host, DropTarget::End);
    assert_eq!(outcome, DropOutcome::Ignored);
    assert!(host.calls().is_empty());
    assert!(!sidebar.is_dragging());
    assert_eq!(sidebar.tree().flat_tab_ids(), ids(&[1, 2, 3, 4]));
    assert!(sidebar.tree().groups().next().is_none());
    assert_tree_ok(&sidebar);
}

#[test]
fn group_updates_during_a_group_drag_keep_headers_collapsed() {
    let (mut sidebar, mut host, g1) = setup();
    assert!(sidebar.begin_drag(DragKind::Group(g1)));
    assert!(sidebar.tree().group(g1).unwrap().collapsed);

    let rename = GroupUpdate {
        title: Some("Renamed".to_owned()),
        ..Default::default()
    };
    host.update_group(g1, rename).unwrap();
    assert!(!host.group(g1).unwrap().collapsed);
    sidebar.pump(&mut host, 0.1);

    let node = sidebar.tree().group(g1).unwrap();
    assert_eq!(node.title, "Renamed");
    assert!(node.collapsed, "drop-target geometry stays stable");

    sidebar.cancel_drag(&mut host);
    let node = sidebar.tree().group(g1).unwrap();
    assert_eq!(node.title, "Renamed");
    assert!(!node.collapsed);
}

#[test]
fn drops_that_change_nothing_make_no_host_calls() {
    let (mut sidebar, mut host, g1) = setup();
    let cases = [
        (DragKind::Tab(TabId(2)), DropTarget::Tab(TabId(3))),
        (DragKind::Tab(TabId(1)), DropTarget::Group(g1)),
        (DragKind::Tab(TabId(4)), DropTarget::End),
        (DragKind::Tab(TabId(4)), DropTarget::Tab(TabId(4))),
        (DragKind::Group(g1), DropTarget::Tab(TabId(4))),
        (DragKind::Group(g1), DropTarget::Tab(TabId(3))),
    ];
    for (kind, target) in cases {
        assert!(sidebar.begin_drag(kind));
        assert_eq!(
            sidebar.drop_drag(&mut host, target),
            DropOutcome::Ignored,
            "{kind:?} on {target:?}"
        );
    }
    assert!(host.calls().is_empty());
    assert_eq!(sidebar.tree().flat_tab_ids(), ids(&[1, 2, 3, 4]));
}

#[test]
fn drop_without_a_drag_is_rejected() {
    let (mut sidebar, mut host, _) = setup();
    assert_eq!(
        sidebar.drop_drag(&mut host, DropTarget::End),
        DropOutcome::NotDragging
    );
    assert!(!sidebar.begin_drag(DragKind::Tab(TabId(99))));
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(1))));
    assert!(!sidebar.begin_drag(DragKind::Tab(TabId(2))), "one drag at a time");
}

#[test]
fn rebuilds_wait_for_the_drag_to_end() {
    let (mut sidebar, mut host, _) = setup();
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(1))));

    host.move_tab(TabId(4), TabPosition::At(0)).unwrap();
    sidebar.pump(&mut host, 0.0);
    sidebar.pump(&mut host, 5.0);
    assert!(sidebar.is_rebuild_pending());
    assert_eq!(sidebar.rebuild_count(), 1);
    assert_eq!(sidebar.tree().flat_tab_ids(), ids(&[1, 2, 3, 4]));

    sidebar.cancel_drag(&mut host);
    assert!(!sidebar.is_dragging());
    assert!(!sidebar.is_rebuild_pending());
    assert_eq!(sidebar.rebuild_count(), 2);
    assert_eq!(sidebar.tree().flat_tab_ids(), ids(&[4, 1, 2, 3]));
    assert!(host.calls().iter().all(|c| matches!(c, HostCall::MoveTab(TabId(4), _))));
}

#[test]
fn drag_markers_live_only_as_long_as_the_drag() {
    let (mut sidebar, mut host, g1) = setup();
    assert!(sidebar.begin_drag(DragKind::Tab(TabId(1))));
    assert!(sidebar.tree().end_zone().is_some());
    assert!(sidebar.tree().tab(TabId(3)).unwrap().markers.drop_zone);

    sidebar.hover_drag(Some(DropTarget::Tab(TabId(3))));
    assert!(sidebar.tree().tab(TabId(3)).unwrap().markers.drag_over);
    sidebar.hover_drag(Some(DropTarget::Group(g1)));
    assert!(!sidebar.tree().tab(TabId(3)).unwrap().markers.drag_over);
    assert!(sidebar.tree().group(g1).unwrap().markers.drag_over);

    sidebar.cancel_drag(&mut host);
    assert!(host.calls().is_empty());
    assert!(sidebar.tree().end_zone().is_none());
    assert_tree_ok(&sidebar);
}

#[test]
fn group_drag_collapses_everything_then_restores() {
    let mut host = MemoryHost::new();
    let t1 = host.add_tab("T1", "https://one.example/");
    let t2 = host.add_tab("T2", "https://two.example/");
    let t3 = host.add_tab("T3", "https://three.example/");
    let g1 = host.add_group(&[t1], "A", GroupColor::Red);
    let g2 = host.add_group(&[t2], "B", GroupColor::Green);
    host.add_group(&[t3], "C", GroupColor::Cyan);
    host.set_group_collapsed(g2, true);
    let mut sidebar = TabSidebar::new();
    sidebar
        .initialize(&mut host, &MemoryPreferences::default())
        .unwrap();

    assert!(sidebar.begin_drag(DragKind::Group(g1)));
    assert!(sidebar.tree().groups().all(|g| g.collapsed));

    sidebar.cancel_drag(&mut host);
    assert!(!sidebar.tree().group(g1).unwrap().collapsed);
    assert!(sidebar.tree().group(g2).unwrap().collapsed);
}

#[test]
fn hidden_pinned_tabs_offset_drop_indices() {
    let mut host = MemoryHost::new();
    let pinned = host.add_tab("P", "https://pinned.example/");
    let t2 = host.add_tab("T2", "https://two.example/");
    let t3 = host.add_tab("T3", "https://three.example/");
    host.set_pinned(pinned, true);
    let mut prefs = MemoryPreferences::default();
    prefs.set("pinMode", "hide");
    let mut sidebar = TabSidebar::new();
    sidebar.initialize(&mut host, &prefs).unwrap();

    assert!(sidebar.begin_drag(DragKind::Tab(t3)));
    let outcome = sidebar.drop_drag(&mut host, DropTarget::Tab(t2));

    assert_eq!(outcome, DropOutcome::Applied);
    assert_eq!(host.calls(), &[HostCall::MoveTab(t3, TabPosition::At(1))]);
    assert_eq!(host.tab_ids(host.window()), vec![pinned, t3, t2]);
    assert_eq!(sidebar.tree().flat_tab_ids(), vec![t3, t2]);
}
