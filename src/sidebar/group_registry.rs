use crate::host::{Group, GroupId, HostError, TabHost};

use super::TabSidebar;
use super::session::DragKind;

/// Local cache of group metadata, keyed by group id.
///
/// Filled by a full query at startup, kept current by group notifications, and topped up on a
/// cache miss by [`Self::get`].
#[derive(Clone, Debug, Default)]
pub struct GroupRegistry {
    groups: ahash::HashMap<GroupId, Group>,
}

impl GroupRegistry {
    pub(super) fn populate(&mut self, groups: impl IntoIterator<Item = Group>) {
        self.groups
            .extend(groups.into_iter().map(|group| (group.id, group)));
    }

    pub(super) fn clear(&mut self) {
        self.groups.clear();
    }

    /// The cached group, or fetch and cache it.
    ///
    /// `Ok(None)` means the host no longer knows the group: a stale reference, not a failure.
    pub fn get(
        &mut self,
        host: &mut dyn TabHost,
        group: GroupId,
    ) -> Result<Option<Group>, HostError> {
        if let Some(cached) = self.groups.get(&group) {
            return Ok(Some(cached.clone()));
        }
        match host.get_group(group) {
            Ok(fetched) => {
                self.groups.insert(group, fetched.clone());
                Ok(Some(fetched))
            }
            Err(err) if err.is_stale() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn cached(&self, group: GroupId) -> Option<&Group> {
        self.groups.get(&group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn upsert(&mut self, group: &Group) {
        self.groups.insert(group.id, group.clone());
    }

    fn remove(&mut self, group: GroupId) -> Option<Group> {
        self.groups.remove(&group)
    }
}

impl TabSidebar {
    pub(super) fn on_group_created(&mut self, group: &Group) {
        self.registry.upsert(group);
    }

    /// Refresh the cache and patch the rendered group header in place.
    ///
    /// During a group drag every header stays collapsed; the rebuild after the drop picks up the
    /// host's collapse state.
    pub(super) fn on_group_updated(&mut self, group: &Group) {
        self.registry.upsert(group);
        let keep_collapsed = self
            .session
            .drag
            .as_ref()
            .is_some_and(|drag| matches!(drag.kind, DragKind::Group(_)));
        if let Some(node) = self.tree.group_mut(group.id) {
            let collapsed = node.collapsed;
            node.apply(group);
            if keep_collapsed {
                node.collapsed = collapsed;
            }
        }
    }

    /// Forget the group and hand its rendered tabs back to the root list, in place.
    pub(super) fn on_group_removed(&mut self, group: &Group) {
        self.registry.remove(group.id);
        if self.tree.unwrap_group(group.id) {
            self.debug_log_event(format!("group {} removed: tabs unwrapped", group.id.0));
        }
    }

    /// Position is structural: refresh the cache and let a rebuild place the group.
    pub(super) fn on_group_moved(&mut self, group: &Group) {
        self.registry.upsert(group);
        self.session.schedule_rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::GroupColor;
    use crate::memory_host::MemoryHost;

    #[test]
    fn miss_fetches_and_caches() {
        let mut host = MemoryHost::new();
        let t1 = host.add_tab("a", "https://a.example/");
        let g = host.add_group(&[t1], "Work", GroupColor::Red);

        let mut registry = GroupRegistry::default();
        assert!(registry.cached(g).is_none());
        let group = registry.get(&mut host, g).unwrap().unwrap();
        assert_eq!(group.title, "Work");
        assert_eq!(registry.cached(g).map(|g| g.color), Some(GroupColor::Red));
    }

    #[test]
    fn unknown_group_is_stale_not_an_error() {
        let mut host = MemoryHost::new();
        let mut registry = GroupRegistry::default();
        assert_eq!(registry.get(&mut host, GroupId(99)).unwrap(), None);
        assert!(registry.is_empty());
    }
}
