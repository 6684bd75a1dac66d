use crate::host::{GroupId, GroupUpdate, HostError, TabHost, TabId, TabPosition, TabQuery};

use super::TabSidebar;
use super::session::{DragKind, DropTarget};

/// `Ok(false)` for a stale reference, which a drop sequence skips over.
fn skip_stale<T>(result: Result<T, HostError>) -> Result<bool, HostError> {
    match result {
        Ok(_) => Ok(true),
        Err(err) if err.is_stale() => Ok(false),
        Err(err) => Err(err),
    }
}

impl TabSidebar {
    pub(super) fn apply_tab_drop(
        &mut self,
        host: &mut dyn TabHost,
        tab: TabId,
        origin_group: Option<GroupId>,
        target: DropTarget,
    ) -> Result<bool, HostError> {
        if !self.tree.move_before(DragKind::Tab(tab), target) {
            self.debug_log_event(format!("tab {} or {target:?} vanished before drop", tab.0));
            return Ok(false);
        }
        let Some(path) = self.tree.find_tab(tab) else {
            return Ok(false);
        };
        let new_parent = self.tree.parent_group(path);
        let Some(flat) = self.tree.flat_index_of(tab) else {
            return Ok(false);
        };
        let index = self.host_index(flat);

        if new_parent.is_none() && origin_group.is_some() {
            host.ungroup_tabs(&[tab])?;
        }
        if let Some(group) = new_parent.filter(|&g| Some(g) != origin_group) {
            host.group_tabs(&[tab], Some(group))?;
        }
        host.move_tab(tab, TabPosition::At(index))?;
        self.debug_log_event(format!(
            "tab {} -> index {index} group {:?}",
            tab.0,
            new_parent.map(|g| g.0)
        ));
        Ok(true)
    }

    pub(super) fn apply_group_drop(
        &mut self,
        host: &mut dyn TabHost,
        group: GroupId,
        target: DropTarget,
    ) -> Result<bool, HostError> {
        let Some(old) = self.tree.first_flat_index_of_group(group) else {
            return Ok(false);
        };
        if !self.tree.move_before(DragKind::Group(group), target) {
            self.debug_log_event(format!("group {} or {target:?} vanished before drop", group.0));
            return Ok(false);
        }
        let Some(new) = self.tree.first_flat_index_of_group(group) else {
            return Ok(false);
        };
        let (old, new) = (self.host_index(old), self.host_index(new));

        if new < old {
            self.debug_log_event(format!("group {} back {old} -> {new}", group.0));
            host.move_group(group, None, TabPosition::At(new))?;
            Ok(true)
        } else {
            self.debug_log_event(format!("group {} forward {old} -> {new}", group.0));
            self.move_group_forward(host, group, new)
        }
    }

    /// Move a group towards the end by taking it apart and putting it back together.
    ///
    /// Members are ungrouped, moved one at a time behind each other, regrouped, and the new group
    /// gets the old one's title, color and collapse state. `Ok(false)` if the group had nothing
    /// left to move.
    fn move_group_forward(
        &mut self,
        host: &mut dyn TabHost,
        group: GroupId,
        new_index: usize,
    ) -> Result<bool, HostError> {
        let Some(prior) = self.registry.get(host, group)? else {
            return Ok(false);
        };
        let mut members = host.query_tabs(&TabQuery::group(group))?;
        members.sort_by_key(|t| t.index);
        let members: Vec<TabId> = members.into_iter().map(|t| t.id).collect();
        if members.is_empty() {
            self.debug_log_event(format!("group {} has no members left to move", group.0));
            return Ok(false);
        }

        if !skip_stale(host.ungroup_tabs(&members))? {
            // Someone closed a member meanwhile: ungroup whoever is left.
            let left: Vec<TabId> = host
                .query_tabs(&TabQuery::group(group))?
                .into_iter()
                .map(|t| t.id)
                .collect();
            host.ungroup_tabs(&left)?;
        }

        // Every member lands on the same slot, pushing the ones before it back by one.
        let last = new_index + members.len() - 1;
        let mut vanished = 0;
        let mut moved = Vec::with_capacity(members.len());
        for &tab in &members {
            let to = last.saturating_sub(vanished);
            if skip_stale(host.move_tab(tab, TabPosition::At(to)))? {
                moved.push(tab);
            } else {
                vanished += 1;
                self.debug_log_event(format!("group member {} vanished mid-move", tab.0));
            }
        }
        if moved.is_empty() {
            return Ok(true);
        }

        let regrouped = host.group_tabs(&moved, None)?;
        host.update_group(regrouped, GroupUpdate::restoring(&prior))?;
        self.debug_log_event(format!("group {} re-created as {}", group.0, regrouped.0));
        Ok(true)
    }
}
