use std::time::Duration;

use crate::host::{GroupId, TabId, WindowId};

use super::debounce::DebouncedTask;
use super::dispatch::ContextTarget;

/// What is being dragged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragKind {
    Tab(TabId),

    /// A group header: the group and all its tabs move as a unit.
    Group(GroupId),
}

/// Where a dragged node is dropped. The dragged node lands in front of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropTarget {
    Tab(TabId),

    /// A group header. Resolves to the group container (i.e. in front of the whole group).
    Group(GroupId),

    /// The synthetic zone past the last item.
    End,
}

#[derive(Debug)]
pub struct DragSession {
    pub id: u64,
    pub kind: DragKind,

    /// The dragged tab's group when the drag started.
    pub origin_group: Option<GroupId>,

    /// Groups that were collapsed before the drag started; exactly these are collapsed again
    /// when it ends.
    pub collapsed_before: ahash::HashSet<GroupId>,

    pub hovered: Option<DropTarget>,
}

/// Everything the reconciler and drag engine share for one window.
#[derive(Debug)]
pub struct SessionState {
    pub window: WindowId,

    /// Clock of the last pump, in seconds.
    pub now: f64,

    pub drag: Option<DragSession>,
    pub rebuild: DebouncedTask,

    /// Tab to scroll into view on the next frame.
    pub scroll_to: Option<TabId>,

    pub context_target: Option<ContextTarget>,

    next_drag_id: u64,
}

impl SessionState {
    pub fn new(rebuild_debounce: Duration) -> Self {
        Self {
            window: WindowId::default(),
            now: 0.0,
            drag: None,
            rebuild: DebouncedTask::new(rebuild_debounce),
            scroll_to: None,
            context_target: None,
            next_drag_id: 1,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn schedule_rebuild(&mut self) {
        self.rebuild.schedule(self.now);
    }

    pub(super) fn start_drag(
        &mut self,
        kind: DragKind,
        origin_group: Option<GroupId>,
        collapsed_before: ahash::HashSet<GroupId>,
    ) -> String {
        let id = self.next_drag_id;
        self.next_drag_id = id.saturating_add(1);
        self.drag = Some(DragSession {
            id,
            kind,
            origin_group,
            collapsed_before,
            hovered: None,
        });
        format!("drag START id={id} kind={kind:?}")
    }

    pub(super) fn finish_drag(&mut self) -> Option<(DragSession, String)> {
        let ended = self.drag.take()?;
        let message = format!(
            "drag END id={} kind={:?} hovered={:?}",
            ended.id, ended.kind, ended.hovered
        );
        Some((ended, message))
    }
}
