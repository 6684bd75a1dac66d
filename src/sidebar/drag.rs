use crate::host::{HostError, TabHost};

use super::TabSidebar;
use super::drop_policy;
use super::session::{DragKind, DropTarget};

/// What happened to a drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// No drag was in progress.
    NotDragging,

    /// The drop would not change anything, or what it referred to is gone. No host calls were
    /// made.
    Ignored,

    /// The host call sequence completed.
    Applied,

    /// A host call failed part-way; the follow-up rebuild shows whatever the host settled on.
    Failed(HostError),
}

impl TabSidebar {
    /// Start dragging a rendered tab or group header.
    ///
    /// Returns false if another drag is in progress or the node is not rendered.
    pub fn begin_drag(&mut self, kind: DragKind) -> bool {
        if self.session.is_dragging() {
            return false;
        }
        let origin_group = match kind {
            DragKind::Tab(tab) => match self.tree.tab(tab) {
                Some(node) => node.group_id,
                None => return false,
            },
            DragKind::Group(group) => {
                if self.tree.group(group).is_none() {
                    return false;
                }
                Some(group)
            }
        };

        let collapsed_before = self
            .tree
            .groups()
            .filter(|g| g.collapsed)
            .map(|g| g.id)
            .collect();
        let message = self
            .session
            .start_drag(kind, origin_group, collapsed_before);
        self.debug_log_event(message);

        self.tree.mark_drop_zones();
        if matches!(kind, DragKind::Group(_)) {
            self.tree.collapse_all_groups();
        }
        true
    }

    /// Track the zone under the pointer. No host calls.
    pub fn hover_drag(&mut self, target: Option<DropTarget>) {
        let Some(drag) = &mut self.session.drag else {
            return;
        };
        if drag.hovered == target {
            return;
        }
        drag.hovered = target;
        self.tree.set_drag_over(target);
    }

    /// Finish the drag by dropping in front of `target`.
    ///
    /// The tree is moved provisionally, the host is asked to make the same change, the drag
    /// ends, and a full rebuild from the host replaces the provisional tree.
    pub fn drop_drag(&mut self, host: &mut dyn TabHost, target: DropTarget) -> DropOutcome {
        let Some(drag) = &self.session.drag else {
            return DropOutcome::NotDragging;
        };
        let kind = drag.kind;
        let origin_group = drag.origin_group;

        let resolved = drop_policy::resolve_target(&self.tree, kind, target)
            .filter(|&resolved| !drop_policy::is_noop(&self.tree, kind, resolved));

        let outcome = match resolved {
            None => {
                self.debug_log_event(format!("drop {kind:?} on {target:?}: ignored"));
                DropOutcome::Ignored
            }
            Some(resolved) => {
                self.debug_log_event(format!("drop {kind:?} before {resolved:?}"));
                let applied = match kind {
                    DragKind::Tab(tab) => self.apply_tab_drop(host, tab, origin_group, resolved),
                    DragKind::Group(group) => self.apply_group_drop(host, group, resolved),
                };
                match applied {
                    Ok(true) => DropOutcome::Applied,
                    Ok(false) => {
                        self.debug_log_event("drop ignored: dragged node or target is gone");
                        DropOutcome::Ignored
                    }
                    Err(err) => {
                        log::warn!("drop of {kind:?} failed: {err}");
                        self.debug_log_event(format!("drop failed: {err}"));
                        DropOutcome::Failed(err)
                    }
                }
            }
        };

        self.end_drag();
        self.rebuild_now(host);
        outcome
    }

    /// Abandon the drag without touching the host.
    pub fn cancel_drag(&mut self, host: &mut dyn TabHost) {
        if !self.session.is_dragging() {
            return;
        }
        self.debug_log_event("drag cancelled");
        self.end_drag();
        self.rebuild_now(host);
    }

    /// Tear down the drag session. Safe to call when no drag is in progress.
    pub(super) fn end_drag(&mut self) {
        let Some((ended, message)) = self.session.finish_drag() else {
            return;
        };
        self.debug_log_event(message);
        self.tree.clear_drag_markers();
        if matches!(ended.kind, DragKind::Group(_)) {
            self.tree.restore_collapsed(&ended.collapsed_before);
        }
    }
}
