use crate::host::{HostEvent, Tab, TabChange, TabId};

use super::TabSidebar;
use super::render::InsertOutcome;
use super::tree::{AudioIndicator, TabIcon};

impl TabSidebar {
    /// Apply one host notification to the rendered tree.
    ///
    /// Patches in place when that is safe; anything structural or surprising schedules a
    /// debounced rebuild instead. Never fails: a notification about something we do not render
    /// is either irrelevant or a sign of drift.
    pub(super) fn handle_event(&mut self, event: HostEvent) {
        let window = self.session.window;
        match event {
            HostEvent::TabCreated(tab) => {
                if tab.window_id != window || self.tree.find_tab(tab.id).is_some() {
                    return;
                }
                self.search.invalidate();
                if !self.is_listed(&tab) {
                    self.hidden_pinned += 1;
                    return;
                }
                match self.insert_one(&tab) {
                    InsertOutcome::Inserted => {
                        self.debug_log_event(format!("tab {} inserted at {}", tab.id.0, tab.index));
                    }
                    InsertOutcome::Ambiguous => {
                        self.schedule_rebuild_because(format!(
                            "tab {} created at ambiguous index {}",
                            tab.id.0, tab.index
                        ));
                    }
                }
            }
            HostEvent::TabRemoved { tab_id, window_id } => {
                self.search.invalidate();
                if self.tree.remove_tab(tab_id).is_some() {
                    self.debug_log_event(format!("tab {} removed", tab_id.0));
                } else if window_id == window && self.hidden_pinned > 0 {
                    // Possibly one of the hidden pinned tabs; recount.
                    self.schedule_rebuild_because(format!("unrendered tab {} removed", tab_id.0));
                }
            }
            HostEvent::TabUpdated { tab, change } => {
                if tab.window_id == window {
                    self.on_tab_updated(&tab, change);
                }
            }
            HostEvent::TabActivated { tab_id, window_id } => {
                if window_id != window {
                    return;
                }
                if self.tree.set_active(tab_id) {
                    self.session.scroll_to = Some(tab_id);
                } else if self.hidden_pinned == 0 {
                    self.report_drift(tab_id, "activated");
                }
            }
            HostEvent::TabMoved { window_id, .. } => {
                if window_id == window {
                    self.session.schedule_rebuild();
                }
            }
            HostEvent::TabAttached { window_id, .. } => {
                if window_id == window {
                    self.search.invalidate();
                    self.session.schedule_rebuild();
                }
            }
            HostEvent::TabDetached { old_window_id, .. } => {
                if old_window_id == window {
                    self.search.invalidate();
                    self.session.schedule_rebuild();
                }
            }
            HostEvent::TabReplaced { added, removed } => {
                self.search.invalidate();
                self.schedule_rebuild_because(format!("tab {} replaced by {}", removed.0, added.0));
            }
            HostEvent::GroupCreated(group) => self.on_group_created(&group),
            HostEvent::GroupUpdated(group) => self.on_group_updated(&group),
            HostEvent::GroupRemoved(group) => self.on_group_removed(&group),
            HostEvent::GroupMoved(group) => self.on_group_moved(&group),
        }
    }

    fn on_tab_updated(&mut self, tab: &Tab, change: TabChange) {
        if change.title || change.url {
            self.search.invalidate();
        }

        let listed = self.is_listed(tab);
        let Some(node) = self.tree.tab_mut(tab.id) else {
            if listed || change.pinned {
                self.report_drift(tab.id, "updated");
            }
            return;
        };

        if change.title || change.url {
            node.title.clone_from(&tab.title);
            node.url.clone_from(&tab.url);
        }
        if change.fav_icon {
            node.icon = TabIcon::for_tab(tab);
        }
        if change.pinned {
            node.pinned = tab.pinned;
        }
        if change.audible || change.muted {
            node.audio = AudioIndicator::for_state(tab.audible, tab.muted);
        }

        if change.group {
            node.group_id = tab.group_id;
            self.schedule_rebuild_because(format!(
                "tab {} group changed to {:?}",
                tab.id.0,
                tab.group_id.map(|g| g.0)
            ));
        } else if change.pinned && !listed {
            self.schedule_rebuild_because(format!("tab {} pinned while pins are hidden", tab.id.0));
        }
    }

    fn report_drift(&mut self, tab: TabId, what: &str) {
        log::debug!("notification for unrendered tab {} ({what}); rebuilding", tab.0);
        self.schedule_rebuild_because(format!("drift: tab {} {what} but not rendered", tab.0));
    }

    pub(super) fn schedule_rebuild_because(&mut self, reason: String) {
        self.debug_log_event(format!("rebuild scheduled: {reason}"));
        self.session.schedule_rebuild();
    }
}
