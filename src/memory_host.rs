use std::collections::{BTreeMap, VecDeque};

use crate::host::{
    CreateTab, EntityRef, Group, GroupColor, GroupId, GroupUpdate, HostError, HostEvent, Tab,
    TabChange, TabHost, TabId, TabPosition, TabQuery, TabUpdate, WindowId, WindowInfo,
};

/// A mutating call received by a [`MemoryHost`], in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCall {
    CreateTab(CreateTab),
    RemoveTabs(Vec<TabId>),
    UpdateTab(TabId, TabUpdate),
    MoveTab(TabId, TabPosition),
    GroupTabs(Vec<TabId>, Option<GroupId>),
    UngroupTabs(Vec<TabId>),
    CreateWindow(Option<TabId>),
    UpdateGroup(GroupId, GroupUpdate),
    MoveGroup(GroupId, Option<WindowId>, TabPosition),
}

/// An in-process [`TabHost`] that behaves like a browser's tab strip.
///
/// Groups stay contiguous: a tab moved between two members of a group joins it, a tab moved
/// away from the rest of its group leaves it, and a group that loses its last tab is removed.
/// Every mutation queues the notifications a real host would send.
///
/// The `add_*`/`set_*` helpers build an initial state without queuing notifications; the
/// `*_externally` helpers simulate the user acting in the host itself.
#[derive(Debug)]
pub struct MemoryHost {
    windows: BTreeMap<WindowId, Vec<Tab>>,
    groups: BTreeMap<GroupId, Group>,
    current: WindowId,
    next_tab: i32,
    next_group: i32,
    next_window: i32,
    events: VecDeque<HostEvent>,
    calls: Vec<HostCall>,
    rejecting_queries: Option<String>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A host with one empty, focused window.
    pub fn new() -> Self {
        let current = WindowId(1);
        let mut windows = BTreeMap::new();
        windows.insert(current, Vec::new());
        Self {
            windows,
            groups: BTreeMap::new(),
            current,
            next_tab: 1,
            next_group: 1,
            next_window: 2,
            events: VecDeque::new(),
            calls: Vec::new(),
            rejecting_queries: None,
        }
    }

    pub fn window(&self) -> WindowId {
        self.current
    }

    pub fn set_current_window(&mut self, window: WindowId) {
        self.current = window;
    }

    /// Append a tab to the current window.
    pub fn add_tab(&mut self, title: &str, url: &str) -> TabId {
        let id = TabId(self.next_tab);
        self.next_tab += 1;
        let window = self.current;
        let tabs = self.windows.entry(window).or_default();
        tabs.push(Tab {
            id,
            window_id: window,
            index: tabs.len(),
            title: title.to_owned(),
            url: url.to_owned(),
            ..Default::default()
        });
        id
    }

    /// Put already-adjacent `tabs` into a new group.
    pub fn add_group(&mut self, tabs: &[TabId], title: &str, color: GroupColor) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.groups.insert(
            id,
            Group {
                id,
                window_id: self.current,
                title: title.to_owned(),
                color,
                collapsed: false,
            },
        );
        for &tab in tabs {
            if let Some(tab) = self.tab_mut(tab) {
                tab.group_id = Some(id);
            }
        }
        id
    }

    pub fn set_active(&mut self, tab: TabId) {
        let Some((window, _)) = self.locate(tab) else {
            return;
        };
        if let Some(tabs) = self.windows.get_mut(&window) {
            for t in tabs {
                t.active = t.id == tab;
            }
        }
    }

    pub fn set_pinned(&mut self, tab: TabId, pinned: bool) {
        if let Some(tab) = self.tab_mut(tab) {
            tab.pinned = pinned;
        }
    }

    pub fn set_group_collapsed(&mut self, group: GroupId, collapsed: bool) {
        if let Some(group) = self.groups.get_mut(&group) {
            group.collapsed = collapsed;
        }
    }

    /// The user closed the tab in the host.
    pub fn close_tab_externally(&mut self, tab: TabId) {
        if let Err(err) = self.remove_tabs_inner(&[tab]) {
            log::debug!("close_tab_externally: {err}");
        }
    }

    /// The user dissolved the group in the host: its tabs stay where they are, ungrouped.
    pub fn remove_group_externally(&mut self, group: GroupId) {
        let members: Vec<TabId> = self
            .all_tabs()
            .filter(|t| t.group_id == Some(group))
            .map(|t| t.id)
            .collect();
        if let Err(err) = self.ungroup_inner(&members) {
            log::debug!("remove_group_externally: {err}");
        }
    }

    /// The page changed its title.
    pub fn set_title_externally(&mut self, tab: TabId, title: &str) {
        if let Some(t) = self.tab_mut(tab) {
            t.title = title.to_owned();
            let tab = t.clone();
            self.events.push_back(HostEvent::TabUpdated {
                tab,
                change: TabChange {
                    title: true,
                    ..Default::default()
                },
            });
        }
    }

    /// The page started or stopped playing sound, or the user toggled mute in the host.
    pub fn set_audio_externally(&mut self, tab: TabId, audible: bool, muted: bool) {
        if let Some(t) = self.tab_mut(tab) {
            let change = TabChange {
                audible: t.audible != audible,
                muted: t.muted != muted,
                ..Default::default()
            };
            t.audible = audible;
            t.muted = muted;
            let tab = t.clone();
            self.events.push_back(HostEvent::TabUpdated { tab, change });
        }
    }

    /// The page reported a new favicon, or dropped it.
    pub fn set_fav_icon_externally(&mut self, tab: TabId, url: Option<&str>) {
        if let Some(t) = self.tab_mut(tab) {
            t.fav_icon_url = url.map(str::to_owned);
            let tab = t.clone();
            self.events.push_back(HostEvent::TabUpdated {
                tab,
                change: TabChange {
                    fav_icon: true,
                    ..Default::default()
                },
            });
        }
    }

    /// While set, `query_tabs` is rejected with `reason`.
    pub fn reject_queries(&mut self, reason: Option<&str>) {
        self.rejecting_queries = reason.map(str::to_owned);
    }

    /// Flat tab order of a window.
    pub fn tab_ids(&self, window: WindowId) -> Vec<TabId> {
        self.windows
            .get(&window)
            .map(|tabs| tabs.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    pub fn tab(&self, tab: TabId) -> Option<&Tab> {
        self.all_tabs().find(|t| t.id == tab)
    }

    pub fn group(&self, group: GroupId) -> Option<&Group> {
        self.groups.get(&group)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    // ------------------------------------------------------------------------

    fn all_tabs(&self) -> impl Iterator<Item = &Tab> {
        self.windows.values().flatten()
    }

    fn locate(&self, tab: TabId) -> Option<(WindowId, usize)> {
        self.windows.iter().find_map(|(&window, tabs)| {
            tabs.iter().position(|t| t.id == tab).map(|pos| (window, pos))
        })
    }

    fn tab_mut(&mut self, tab: TabId) -> Option<&mut Tab> {
        self.windows.values_mut().flatten().find(|t| t.id == tab)
    }

    fn tabs_mut(&mut self, window: WindowId) -> Result<&mut Vec<Tab>, HostError> {
        self.windows
            .get_mut(&window)
            .ok_or(HostError::NotFound(EntityRef::Window(window)))
    }

    fn require_tabs(&self, tabs: &[TabId]) -> Result<(), HostError> {
        match tabs.iter().find(|&&id| self.locate(id).is_none()) {
            Some(&missing) => Err(HostError::NotFound(EntityRef::Tab(missing))),
            None => Ok(()),
        }
    }

    /// Rewrite `index`/`window_id`, reporting every tab whose index changed.
    fn reindex(&mut self, window: WindowId, report_moves: bool) {
        let Some(tabs) = self.windows.get_mut(&window) else {
            return;
        };
        for (index, tab) in tabs.iter_mut().enumerate() {
            tab.window_id = window;
            if tab.index != index {
                if report_moves {
                    self.events.push_back(HostEvent::TabMoved {
                        tab_id: tab.id,
                        window_id: window,
                        from_index: tab.index,
                        to_index: index,
                    });
                }
                tab.index = index;
            }
        }
    }

    fn set_tab_group(&mut self, tab: TabId, group: Option<GroupId>) {
        let Some(t) = self.tab_mut(tab) else {
            return;
        };
        if t.group_id == group {
            return;
        }
        t.group_id = group;
        let tab = t.clone();
        self.events.push_back(HostEvent::TabUpdated {
            tab,
            change: TabChange {
                group: true,
                ..Default::default()
            },
        });
    }

    fn drop_empty_groups(&mut self) {
        let empty: Vec<GroupId> = self
            .groups
            .keys()
            .copied()
            .filter(|&g| !self.all_tabs().any(|t| t.group_id == Some(g)))
            .collect();
        for id in empty {
            if let Some(group) = self.groups.remove(&id) {
                self.events.push_back(HostEvent::GroupRemoved(group));
            }
        }
    }

    /// Decide group membership for the tab at `pos` after it landed there.
    fn settle_membership(&mut self, window: WindowId, pos: usize) {
        let Some(tabs) = self.windows.get(&window) else {
            return;
        };
        let Some(tab) = tabs.get(pos) else {
            return;
        };
        let prev = pos.checked_sub(1).and_then(|p| tabs.get(p)).and_then(|t| t.group_id);
        let next = tabs.get(pos + 1).and_then(|t| t.group_id);

        let membership = if prev.is_some() && prev == next {
            prev
        } else if let Some(own) = tab.group_id {
            let has_others = tabs.iter().any(|t| t.id != tab.id && t.group_id == Some(own));
            (prev == Some(own) || next == Some(own) || !has_others).then_some(own)
        } else {
            None
        };

        let id = tab.id;
        self.set_tab_group(id, membership);
    }

    /// Position right after the last tab of `group`, ignoring `except`.
    fn after_group_run(tabs: &[Tab], group: GroupId, except: &[TabId]) -> Option<usize> {
        tabs.iter()
            .rposition(|t| t.group_id == Some(group) && !except.contains(&t.id))
            .map(|p| p + 1)
    }

    fn remove_tabs_inner(&mut self, ids: &[TabId]) -> Result<(), HostError> {
        self.require_tabs(ids)?;
        for &id in ids {
            let Some((window, pos)) = self.locate(id) else {
                continue;
            };
            let tabs = self.tabs_mut(window)?;
            let removed = tabs.remove(pos);
            let next_active = (removed.active && !tabs.is_empty())
                .then(|| tabs[pos.min(tabs.len() - 1)].id);
            self.reindex(window, false);
            self.events.push_back(HostEvent::TabRemoved {
                tab_id: id,
                window_id: window,
            });
            if let Some(next) = next_active {
                self.set_active(next);
                self.events.push_back(HostEvent::TabActivated {
                    tab_id: next,
                    window_id: window,
                });
            }
        }
        self.drop_empty_groups();
        Ok(())
    }

    fn ungroup_inner(&mut self, ids: &[TabId]) -> Result<(), HostError> {
        self.require_tabs(ids)?;
        for &id in ids {
            let Some((window, pos)) = self.locate(id) else {
                continue;
            };
            let Some(group) = self.windows[&window][pos].group_id else {
                continue;
            };
            self.set_tab_group(id, None);

            // Still sandwiched inside its old group: step out after the group's run.
            let tabs = self.tabs_mut(window)?;
            let prev = pos.checked_sub(1).and_then(|p| tabs[p].group_id);
            let next = tabs.get(pos + 1).and_then(|t| t.group_id);
            if prev == Some(group) && next == Some(group) {
                let tab = tabs.remove(pos);
                let to = Self::after_group_run(tabs, group, &[]).unwrap_or(tabs.len());
                tabs.insert(to, tab);
                self.reindex(window, true);
            }
        }
        self.drop_empty_groups();
        Ok(())
    }
}

impl TabHost for MemoryHost {
    fn current_window(&mut self) -> Result<WindowId, HostError> {
        Ok(self.current)
    }

    fn list_windows(&mut self) -> Result<Vec<WindowInfo>, HostError> {
        Ok(self
            .windows
            .iter()
            .map(|(&id, tabs)| WindowInfo {
                id,
                focused: id == self.current,
                tabs: tabs.clone(),
            })
            .collect())
    }

    fn query_tabs(&mut self, query: &TabQuery) -> Result<Vec<Tab>, HostError> {
        if let Some(reason) = &self.rejecting_queries {
            return Err(HostError::Rejected(reason.clone()));
        }
        Ok(self.all_tabs().filter(|t| query.matches(t)).cloned().collect())
    }

    fn get_tab(&mut self, tab: TabId) -> Result<Tab, HostError> {
        self.tab(tab)
            .cloned()
            .ok_or(HostError::NotFound(EntityRef::Tab(tab)))
    }

    fn get_group(&mut self, group: GroupId) -> Result<Group, HostError> {
        self.groups
            .get(&group)
            .cloned()
            .ok_or(HostError::NotFound(EntityRef::Group(group)))
    }

    fn query_groups(&mut self, window: Option<WindowId>) -> Result<Vec<Group>, HostError> {
        Ok(self
            .groups
            .values()
            .filter(|g| window.is_none_or(|w| w == g.window_id))
            .cloned()
            .collect())
    }

    fn create_tab(&mut self, create: CreateTab) -> Result<Tab, HostError> {
        self.calls.push(HostCall::CreateTab(create.clone()));
        let window = create.window.unwrap_or(self.current);
        let id = TabId(self.next_tab);
        self.next_tab += 1;

        let tabs = self.tabs_mut(window)?;
        let pos = create.index.unwrap_or(tabs.len()).min(tabs.len());
        tabs.insert(
            pos,
            Tab {
                id,
                window_id: window,
                index: pos,
                title: "New Tab".to_owned(),
                url: create.url.unwrap_or_default(),
                ..Default::default()
            },
        );
        self.reindex(window, false);

        // Born inside a group's run: joins that group.
        let tabs = self.tabs_mut(window)?;
        let prev = pos.checked_sub(1).and_then(|p| tabs[p].group_id);
        let next = tabs.get(pos + 1).and_then(|t| t.group_id);
        if prev.is_some() && prev == next {
            tabs[pos].group_id = prev;
        }
        let tab = tabs[pos].clone();
        self.events.push_back(HostEvent::TabCreated(tab));

        if create.active {
            self.set_active(id);
            self.events.push_back(HostEvent::TabActivated {
                tab_id: id,
                window_id: window,
            });
        }
        self.get_tab(id)
    }

    fn remove_tabs(&mut self, tabs: &[TabId]) -> Result<(), HostError> {
        self.calls.push(HostCall::RemoveTabs(tabs.to_vec()));
        self.remove_tabs_inner(tabs)
    }

    fn update_tab(&mut self, tab: TabId, update: TabUpdate) -> Result<Tab, HostError> {
        self.calls.push(HostCall::UpdateTab(tab, update));
        let (window, _) = self
            .locate(tab)
            .ok_or(HostError::NotFound(EntityRef::Tab(tab)))?;

        if update.active == Some(true) {
            self.set_active(tab);
            self.events.push_back(HostEvent::TabActivated {
                tab_id: tab,
                window_id: window,
            });
        }

        let mut change = TabChange::default();
        if let Some(t) = self.tab_mut(tab) {
            if let Some(pinned) = update.pinned {
                change.pinned = t.pinned != pinned;
                t.pinned = pinned;
            }
            if let Some(muted) = update.muted {
                change.muted = t.muted != muted;
                t.muted = muted;
            }
        }
        if change != TabChange::default() {
            let tab = self.get_tab(tab)?;
            self.events.push_back(HostEvent::TabUpdated { tab, change });
        }
        self.get_tab(tab)
    }

    fn move_tab(&mut self, tab: TabId, position: TabPosition) -> Result<Tab, HostError> {
        self.calls.push(HostCall::MoveTab(tab, position));
        let (window, from) = self
            .locate(tab)
            .ok_or(HostError::NotFound(EntityRef::Tab(tab)))?;

        let tabs = self.tabs_mut(window)?;
        let moving = tabs.remove(from);
        let to = match position {
            TabPosition::At(index) => index.min(tabs.len()),
            TabPosition::End => tabs.len(),
        };
        tabs.insert(to, moving);
        self.reindex(window, true);
        self.settle_membership(window, to);
        self.drop_empty_groups();
        self.get_tab(tab)
    }

    fn group_tabs(&mut self, ids: &[TabId], group: Option<GroupId>) -> Result<GroupId, HostError> {
        self.calls.push(HostCall::GroupTabs(ids.to_vec(), group));
        self.require_tabs(ids)?;
        let Some(&first) = ids.first() else {
            return Err(HostError::Rejected("no tabs to group".to_owned()));
        };
        let (window, _) = self
            .locate(first)
            .ok_or(HostError::NotFound(EntityRef::Tab(first)))?;

        let group_id = match group {
            Some(existing) => {
                if !self.groups.contains_key(&existing) {
                    return Err(HostError::NotFound(EntityRef::Group(existing)));
                }
                existing
            }
            None => {
                let id = GroupId(self.next_group);
                self.next_group += 1;
                let color = GroupColor::ALL[id.0.unsigned_abs() as usize % GroupColor::ALL.len()];
                let created = Group {
                    id,
                    window_id: window,
                    title: String::new(),
                    color,
                    collapsed: false,
                };
                self.groups.insert(id, created.clone());
                self.events.push_back(HostEvent::GroupCreated(created));
                id
            }
        };

        let tabs = self.tabs_mut(window)?;
        let anchor = ids
            .iter()
            .filter_map(|id| tabs.iter().position(|t| t.id == *id))
            .min()
            .unwrap_or(tabs.len());
        let existing_end = Self::after_group_run(tabs, group_id, ids);

        let mut block = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(pos) = tabs.iter().position(|t| t.id == *id) {
                block.push(tabs.remove(pos));
            }
        }
        let mut at = match existing_end {
            Some(end) => {
                let removed_before = block.iter().filter(|t| t.index < end).count();
                end - removed_before
            }
            None => anchor,
        }
        .min(tabs.len());

        // Never split someone else's group.
        let prev = at.checked_sub(1).and_then(|p| tabs[p].group_id);
        let next = tabs.get(at).and_then(|t| t.group_id);
        if let Some(other) = prev.filter(|&p| Some(p) == next && p != group_id) {
            at = Self::after_group_run(tabs, other, &[]).unwrap_or(tabs.len());
        }

        for (offset, tab) in block.into_iter().enumerate() {
            tabs.insert(at + offset, tab);
        }
        self.reindex(window, true);
        for &id in ids {
            self.set_tab_group(id, Some(group_id));
        }
        self.drop_empty_groups();
        Ok(group_id)
    }

    fn ungroup_tabs(&mut self, tabs: &[TabId]) -> Result<(), HostError> {
        self.calls.push(HostCall::UngroupTabs(tabs.to_vec()));
        self.ungroup_inner(tabs)
    }

    fn create_window(&mut self, tab: Option<TabId>) -> Result<WindowInfo, HostError> {
        self.calls.push(HostCall::CreateWindow(tab));
        let window = WindowId(self.next_window);
        self.next_window += 1;

        match tab {
            Some(lifted) => {
                let (old_window, pos) = self
                    .locate(lifted)
                    .ok_or(HostError::NotFound(EntityRef::Tab(lifted)))?;
                let mut moving = self.tabs_mut(old_window)?.remove(pos);
                self.reindex(old_window, false);
                self.events.push_back(HostEvent::TabDetached {
                    tab_id: lifted,
                    old_window_id: old_window,
                    old_position: pos,
                });
                if moving.group_id.take().is_some() {
                    self.events.push_back(HostEvent::TabUpdated {
                        tab: moving.clone(),
                        change: TabChange {
                            group: true,
                            ..Default::default()
                        },
                    });
                }
                moving.active = true;
                self.windows.insert(window, vec![moving]);
                self.reindex(window, false);
                self.events.push_back(HostEvent::TabAttached {
                    tab_id: lifted,
                    window_id: window,
                    position: 0,
                });
                self.drop_empty_groups();
            }
            None => {
                self.windows.insert(window, Vec::new());
                self.create_tab(CreateTab {
                    window: Some(window),
                    index: None,
                    url: None,
                    active: true,
                })?;
            }
        }

        Ok(WindowInfo {
            id: window,
            focused: false,
            tabs: self.tab_ids(window).iter().filter_map(|&id| self.tab(id).cloned()).collect(),
        })
    }

    fn update_group(&mut self, group: GroupId, update: GroupUpdate) -> Result<Group, HostError> {
        self.calls.push(HostCall::UpdateGroup(group, update.clone()));
        let entry = self
            .groups
            .get_mut(&group)
            .ok_or(HostError::NotFound(EntityRef::Group(group)))?;
        if let Some(title) = update.title {
            entry.title = title;
        }
        if let Some(color) = update.color {
            entry.color = color;
        }
        if let Some(collapsed) = update.collapsed {
            entry.collapsed = collapsed;
        }
        let updated = entry.clone();
        self.events.push_back(HostEvent::GroupUpdated(updated.clone()));
        Ok(updated)
    }

    fn move_group(
        &mut self,
        group: GroupId,
        window: Option<WindowId>,
        position: TabPosition,
    ) -> Result<Group, HostError> {
        self.calls.push(HostCall::MoveGroup(group, window, position));
        let source = self
            .groups
            .get(&group)
            .map(|g| g.window_id)
            .ok_or(HostError::NotFound(EntityRef::Group(group)))?;
        let target = window.unwrap_or(source);
        if !self.windows.contains_key(&target) {
            return Err(HostError::NotFound(EntityRef::Window(target)));
        }

        let source_tabs = self.tabs_mut(source)?;
        let run: Vec<Tab> = source_tabs
            .iter()
            .filter(|t| t.group_id == Some(group))
            .cloned()
            .collect();
        source_tabs.retain(|t| t.group_id != Some(group));

        let target_tabs = self.tabs_mut(target)?;
        let at = match position {
            TabPosition::At(index) => index.min(target_tabs.len()),
            TabPosition::End => target_tabs.len(),
        };
        let prev = at.checked_sub(1).and_then(|p| target_tabs[p].group_id);
        let next = target_tabs.get(at).and_then(|t| t.group_id);
        if prev.is_some() && prev == next {
            // Put everything back the way it was.
            let source_tabs = self.tabs_mut(source)?;
            let first = run.first().map_or(0, |t| t.index).min(source_tabs.len());
            for (offset, tab) in run.into_iter().enumerate() {
                source_tabs.insert(first + offset, tab);
            }
            return Err(HostError::Rejected(
                "cannot move the group into the middle of another group".to_owned(),
            ));
        }

        let old_positions: Vec<(TabId, usize)> = run.iter().map(|t| (t.id, t.index)).collect();
        for (offset, mut tab) in run.into_iter().enumerate() {
            tab.active &= source == target;
            target_tabs.insert(at + offset, tab);
        }

        if source == target {
            self.reindex(target, true);
        } else {
            self.reindex(source, false);
            self.reindex(target, false);
            for (offset, (tab_id, old_position)) in old_positions.into_iter().enumerate() {
                self.events.push_back(HostEvent::TabDetached {
                    tab_id,
                    old_window_id: source,
                    old_position,
                });
                self.events.push_back(HostEvent::TabAttached {
                    tab_id,
                    window_id: target,
                    position: at + offset,
                });
            }
        }

        let entry = self
            .groups
            .get_mut(&group)
            .ok_or(HostError::NotFound(EntityRef::Group(group)))?;
        entry.window_id = target;
        let moved = entry.clone();
        self.events.push_back(HostEvent::GroupMoved(moved.clone()));
        Ok(moved)
    }

    fn drain_events(&mut self) -> Vec<HostEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with(n: usize) -> (MemoryHost, Vec<TabId>) {
        let mut host = MemoryHost::new();
        let ids = (0..n)
            .map(|i| host.add_tab(&format!("T{}", i + 1), "about:blank"))
            .collect();
        (host, ids)
    }

    #[test]
    fn moving_into_a_group_run_joins_the_group() {
        let (mut host, t) = host_with(4);
        let g = host.add_group(&[t[1], t[2]], "G", GroupColor::Blue);

        host.move_tab(t[3], TabPosition::At(2)).unwrap();
        assert_eq!(host.tab_ids(host.window()), vec![t[0], t[1], t[3], t[2]]);
        assert_eq!(host.tab(t[3]).unwrap().group_id, Some(g));
    }

    #[test]
    fn moving_away_from_the_group_leaves_it() {
        let (mut host, t) = host_with(4);
        let g = host.add_group(&[t[1], t[2]], "G", GroupColor::Blue);

        host.move_tab(t[1], TabPosition::End).unwrap();
        assert_eq!(host.tab(t[1]).unwrap().group_id, None);
        assert_eq!(host.tab(t[2]).unwrap().group_id, Some(g));
    }

    #[test]
    fn ungrouping_a_middle_tab_steps_out_of_the_run() {
        let (mut host, t) = host_with(4);
        host.add_group(&[t[0], t[1], t[2]], "G", GroupColor::Red);

        host.ungroup_tabs(&[t[1]]).unwrap();
        assert_eq!(host.tab_ids(host.window()), vec![t[0], t[2], t[1], t[3]]);
    }

    #[test]
    fn ungrouping_every_member_removes_the_group_in_place() {
        let (mut host, t) = host_with(3);
        let g = host.add_group(&[t[0], t[1]], "G", GroupColor::Red);

        host.ungroup_tabs(&[t[0], t[1]]).unwrap();
        assert_eq!(host.tab_ids(host.window()), t);
        assert!(host.group(g).is_none());
        assert!(host
            .drain_events()
            .iter()
            .any(|e| matches!(e, HostEvent::GroupRemoved(group) if group.id == g)));
    }

    #[test]
    fn group_move_into_another_group_is_rejected() {
        let (mut host, t) = host_with(5);
        host.add_group(&[t[0], t[1]], "A", GroupColor::Red);
        let b = host.add_group(&[t[3], t[4]], "B", GroupColor::Blue);

        let err = host.move_group(b, None, TabPosition::At(1)).unwrap_err();
        assert!(matches!(err, HostError::Rejected(_)));
        assert_eq!(host.tab_ids(host.window()), t);
    }

    #[test]
    fn grouping_into_existing_group_appends_to_its_run() {
        let (mut host, t) = host_with(4);
        let g = host.add_group(&[t[1], t[2]], "G", GroupColor::Blue);

        host.group_tabs(&[t[0]], Some(g)).unwrap();
        assert_eq!(host.tab_ids(host.window()), vec![t[1], t[2], t[0], t[3]]);
        assert_eq!(host.tab(t[0]).unwrap().group_id, Some(g));
    }
}
