use crate::host::{
    CreateTab, GroupId, GroupUpdate, HostError, Tab, TabHost, TabId, TabQuery, TabUpdate,
};

use super::TabSidebar;
use super::messaging::BackgroundRequest;
use super::tree::{AudioIndicator, NodeKey};

/// What a context menu was opened on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextTarget {
    pub tab: Option<TabId>,
    pub group: Option<GroupId>,
}

/// Which tabs a bulk close takes, relative to the target tab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseScope {
    This,

    /// Every other unpinned tab.
    Others,

    /// Unpinned tabs before the target.
    Left,

    /// Unpinned tabs after the target.
    Right,

    /// Tabs of the target's group that come before it.
    GroupAbove,

    /// Tabs of the target's group that come after it.
    GroupBelow,
}

/// A bulk close waiting for the user to confirm it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingClose {
    pub scope: CloseScope,
    pub tabs: Vec<TabId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// This many tabs were handed to the host for closing.
    Closed(usize),

    /// Too many tabs: nothing was closed yet, see [`TabSidebar::confirm_close`].
    NeedsConfirmation(PendingClose),
}

/// The tabs `scope` selects around `target`, in window order. Empty if `target` is not in `tabs`.
pub fn tabs_to_close(tabs: &[Tab], target: TabId, scope: CloseScope) -> Vec<TabId> {
    let mut ordered: Vec<&Tab> = tabs.iter().collect();
    ordered.sort_by_key(|t| t.index);
    let Some(pos) = ordered.iter().position(|t| t.id == target) else {
        return Vec::new();
    };
    let group = ordered[pos].group_id;
    let in_target_group = |t: &&&Tab| group.is_some() && t.group_id == group;

    let (before, rest) = ordered.split_at(pos);
    let after = &rest[1..];
    let selected: Vec<&Tab> = match scope {
        CloseScope::This => vec![ordered[pos]],
        CloseScope::Others => before
            .iter()
            .chain(after)
            .copied()
            .filter(|t| !t.pinned)
            .collect(),
        CloseScope::Left => before.iter().copied().filter(|t| !t.pinned).collect(),
        CloseScope::Right => after.iter().copied().filter(|t| !t.pinned).collect(),
        CloseScope::GroupAbove => before.iter().filter(in_target_group).copied().collect(),
        CloseScope::GroupBelow => after.iter().filter(in_target_group).copied().collect(),
    };
    selected.into_iter().map(|t| t.id).collect()
}

impl TabSidebar {
    /// Resolve the tab and/or group a context menu opened on `key` acts on, and remember it.
    pub fn open_context_menu(&mut self, key: NodeKey) -> ContextTarget {
        let target = match key {
            NodeKey::Tab(tab) => ContextTarget {
                tab: Some(tab),
                group: self.tree.tab(tab).and_then(|t| t.group_id),
            },
            NodeKey::Group(group) => ContextTarget {
                tab: None,
                group: Some(group),
            },
        };
        self.session.context_target = Some(target);
        target
    }

    pub fn close_context_menu(&mut self) {
        self.session.context_target = None;
    }

    /// Close the tabs `scope` selects around `target`, asking first when there are many.
    ///
    /// Selection works on a fresh host query, not on what is rendered.
    ///
    /// # Errors
    /// Fails if the host cannot list the window's tabs or rejects the close.
    pub fn close_tabs(
        &mut self,
        host: &mut dyn TabHost,
        target: TabId,
        scope: CloseScope,
    ) -> Result<CloseOutcome, HostError> {
        let tabs = host.query_tabs(&TabQuery::window(self.session.window))?;
        let selected = tabs_to_close(&tabs, target, scope);
        if self.options.needs_close_confirmation(selected.len()) {
            let pending = PendingClose {
                scope,
                tabs: selected,
            };
            self.debug_log_event(format!(
                "close {scope:?} of tab {}: {} tabs, confirmation needed",
                target.0,
                pending.tabs.len()
            ));
            self.pending_close = Some(pending.clone());
            return Ok(CloseOutcome::NeedsConfirmation(pending));
        }
        self.remove_tabs(host, &selected)
    }

    pub fn pending_close(&self) -> Option<&PendingClose> {
        self.pending_close.as_ref()
    }

    /// Carry out the pending bulk close.
    ///
    /// # Errors
    /// Fails if the host rejects the close.
    pub fn confirm_close(&mut self, host: &mut dyn TabHost) -> Result<CloseOutcome, HostError> {
        match self.pending_close.take() {
            Some(pending) => self.remove_tabs(host, &pending.tabs),
            None => Ok(CloseOutcome::Closed(0)),
        }
    }

    pub fn cancel_close(&mut self) {
        if self.pending_close.take().is_some() {
            self.debug_log_event("bulk close cancelled");
        }
    }

    fn remove_tabs(
        &mut self,
        host: &mut dyn TabHost,
        tabs: &[TabId],
    ) -> Result<CloseOutcome, HostError> {
        if tabs.is_empty() {
            return Ok(CloseOutcome::Closed(0));
        }
        match host.remove_tabs(tabs) {
            Ok(()) => Ok(CloseOutcome::Closed(tabs.len())),
            Err(err) if err.is_stale() => {
                // Some of them are gone already; close the rest.
                let survivors: Vec<TabId> = tabs
                    .iter()
                    .copied()
                    .filter(|&tab| host.get_tab(tab).is_ok())
                    .collect();
                host.remove_tabs(&survivors)?;
                Ok(CloseOutcome::Closed(survivors.len()))
            }
            Err(err) => Err(err),
        }
    }

    /// Log a failed single action and let a rebuild show the host's view of things.
    fn settle_action<T>(&mut self, action: &str, result: Result<T, HostError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) if err.is_stale() => {
                self.debug_log_event(format!("{action}: {err}"));
                self.session.schedule_rebuild();
                None
            }
            Err(err) => {
                log::warn!("{action} failed: {err}");
                self.debug_log_event(format!("{action} failed: {err}"));
                self.session.schedule_rebuild();
                None
            }
        }
    }

    pub fn activate_tab(&mut self, host: &mut dyn TabHost, tab: TabId) -> bool {
        let update = TabUpdate {
            active: Some(true),
            ..Default::default()
        };
        let result = host.update_tab(tab, update);
        self.settle_action("activate", result).is_some()
    }

    pub fn close_tab(&mut self, host: &mut dyn TabHost, tab: TabId) -> bool {
        let result = host.remove_tabs(&[tab]);
        self.settle_action("close", result).is_some()
    }

    pub fn toggle_pinned(&mut self, host: &mut dyn TabHost, tab: TabId) -> bool {
        let Some(pinned) = self.tree.tab(tab).map(|t| t.pinned) else {
            return false;
        };
        let update = TabUpdate {
            pinned: Some(!pinned),
            ..Default::default()
        };
        let result = host.update_tab(tab, update);
        self.settle_action("toggle pin", result).is_some()
    }

    pub fn toggle_muted(&mut self, host: &mut dyn TabHost, tab: TabId) -> bool {
        let Some(muted) = self.tree.tab(tab).map(|t| t.audio == AudioIndicator::Muted) else {
            return false;
        };
        let update = TabUpdate {
            muted: Some(!muted),
            ..Default::default()
        };
        let result = host.update_tab(tab, update);
        self.settle_action("toggle mute", result).is_some()
    }

    /// Open a new active tab, either at the end or right behind the last tab of `group`.
    pub fn new_tab(&mut self, host: &mut dyn TabHost, group: Option<GroupId>) -> Option<TabId> {
        let index = match group {
            Some(group) => {
                let tabs = host.query_tabs(&TabQuery::group(group));
                let tabs = self.settle_action("new tab in group", tabs)?;
                tabs.iter().map(|t| t.index + 1).max()
            }
            None => None,
        };
        let create = CreateTab {
            window: Some(self.session.window),
            index,
            url: None,
            active: true,
        };
        let created = host.create_tab(create);
        let tab = self.settle_action("new tab", created)?;
        if let Some(group) = group {
            let grouped = host.group_tabs(&[tab.id], Some(group));
            self.settle_action("new tab in group", grouped)?;
        }
        Some(tab.id)
    }

    pub fn close_group(&mut self, host: &mut dyn TabHost, group: GroupId) -> bool {
        let tabs = host.query_tabs(&TabQuery::group(group));
        let Some(tabs) = self.settle_action("close group", tabs) else {
            return false;
        };
        let ids: Vec<TabId> = tabs.into_iter().map(|t| t.id).collect();
        let result = self.remove_tabs(host, &ids);
        self.settle_action("close group", result).is_some()
    }

    pub fn ungroup(&mut self, host: &mut dyn TabHost, group: GroupId) -> bool {
        let tabs = host.query_tabs(&TabQuery::group(group));
        let Some(tabs) = self.settle_action("ungroup", tabs) else {
            return false;
        };
        let ids: Vec<TabId> = tabs.into_iter().map(|t| t.id).collect();
        let result = host.ungroup_tabs(&ids);
        self.settle_action("ungroup", result).is_some()
    }

    pub fn toggle_group_collapsed(&mut self, host: &mut dyn TabHost, group: GroupId) -> bool {
        let current = self.registry.get(host, group);
        let Some(Some(current)) = self.settle_action("toggle collapse", current) else {
            return false;
        };
        let update = GroupUpdate {
            collapsed: Some(!current.collapsed),
            ..Default::default()
        };
        let result = host.update_group(group, update);
        self.settle_action("toggle collapse", result).is_some()
    }

    /// Lift `tab` out into a window of its own.
    pub fn move_tab_to_new_window(&mut self, host: &mut dyn TabHost, tab: TabId) -> bool {
        let result = host.create_window(Some(tab));
        self.settle_action("move tab to new window", result).is_some()
    }

    /// Ask the background side to move the group into a new window.
    ///
    /// `tab` is the tab the request was made from; it stays active after the move.
    pub fn request_move_group_to_new_window(&mut self, tab: TabId, group: GroupId) {
        self.debug_log_event(format!("request: group {} to new window", group.0));
        self.outbound.push(BackgroundRequest::MoveGroupToNewWindow {
            tab_id: tab,
            group_id: group,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::WindowId;

    fn tab(id: i32, index: usize, group: Option<i32>, pinned: bool) -> Tab {
        Tab {
            id: TabId(id),
            window_id: WindowId(1),
            index,
            group_id: group.map(GroupId),
            pinned,
            ..Default::default()
        }
    }

    /// `P1(pinned), T2, G1{T3, T4, T5}, T6`
    fn strip() -> Vec<Tab> {
        vec![
            tab(1, 0, None, true),
            tab(2, 1, None, false),
            tab(3, 2, Some(1), false),
            tab(4, 3, Some(1), false),
            tab(5, 4, Some(1), false),
            tab(6, 5, None, false),
        ]
    }

    fn ids(raw: &[i32]) -> Vec<TabId> {
        raw.iter().copied().map(TabId).collect()
    }

    #[test]
    fn positional_scopes_skip_pinned_tabs() {
        let tabs = strip();
        assert_eq!(tabs_to_close(&tabs, TabId(4), CloseScope::Others), ids(&[2, 3, 5, 6]));
        assert_eq!(tabs_to_close(&tabs, TabId(4), CloseScope::Left), ids(&[2, 3]));
        assert_eq!(tabs_to_close(&tabs, TabId(4), CloseScope::Right), ids(&[5, 6]));
        assert_eq!(tabs_to_close(&tabs, TabId(1), CloseScope::This), ids(&[1]));
    }

    #[test]
    fn group_scopes_stay_inside_the_group() {
        let tabs = strip();
        assert_eq!(tabs_to_close(&tabs, TabId(4), CloseScope::GroupAbove), ids(&[3]));
        assert_eq!(tabs_to_close(&tabs, TabId(4), CloseScope::GroupBelow), ids(&[5]));
        assert!(tabs_to_close(&tabs, TabId(2), CloseScope::GroupBelow).is_empty());
    }

    #[test]
    fn unknown_target_selects_nothing() {
        assert!(tabs_to_close(&strip(), TabId(42), CloseScope::Others).is_empty());
    }
}
