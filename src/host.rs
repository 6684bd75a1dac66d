//! The host's tab/window manager, seen from the sidebar.
//!
//! Everything in here is owned by the host: the sidebar never constructs a [`Tab`] or a [`Group`],
//! it only mirrors what [`TabHost`] reports and asks the host to change things.

/// Raw wire value the host uses for "this tab is not in a group".
pub const NO_GROUP: i32 = -1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TabId(pub i32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GroupId(pub i32);

impl GroupId {
    /// Map a raw wire value to a group id, treating [`NO_GROUP`] as "ungrouped".
    pub fn from_raw(raw: i32) -> Option<Self> {
        (raw != NO_GROUP).then_some(Self(raw))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WindowId(pub i32);

/// A tab as reported by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Tab {
    pub id: TabId,
    pub window_id: WindowId,

    /// Zero-based position within the window.
    pub index: usize,

    #[cfg_attr(feature = "serde", serde(with = "no_group", default))]
    pub group_id: Option<GroupId>,

    pub pinned: bool,
    pub active: bool,
    pub title: String,
    pub url: String,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub fav_icon_url: Option<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub audible: bool,

    #[cfg_attr(feature = "serde", serde(rename = "mutedInfo", with = "muted_info", default))]
    pub muted: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GroupColor {
    #[default]
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl GroupColor {
    pub const ALL: [Self; 9] = [
        Self::Grey,
        Self::Blue,
        Self::Red,
        Self::Yellow,
        Self::Green,
        Self::Pink,
        Self::Purple,
        Self::Cyan,
        Self::Orange,
    ];

    pub fn to_color32(self) -> egui::Color32 {
        match self {
            Self::Grey => egui::Color32::from_rgb(0x5f, 0x63, 0x68),
            Self::Blue => egui::Color32::from_rgb(0x1a, 0x73, 0xe8),
            Self::Red => egui::Color32::from_rgb(0xd9, 0x30, 0x25),
            Self::Yellow => egui::Color32::from_rgb(0xf9, 0xab, 0x00),
            Self::Green => egui::Color32::from_rgb(0x18, 0x80, 0x38),
            Self::Pink => egui::Color32::from_rgb(0xd0, 0x18, 0x84),
            Self::Purple => egui::Color32::from_rgb(0xa1, 0x42, 0xf4),
            Self::Cyan => egui::Color32::from_rgb(0x00, 0x7b, 0x83),
            Self::Orange => egui::Color32::from_rgb(0xfa, 0x90, 0x3e),
        }
    }
}

/// A tab group as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Group {
    pub id: GroupId,
    pub window_id: WindowId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub title: String,
    pub color: GroupColor,
    pub collapsed: bool,
}

/// A window with its tabs populated, ordered by index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub focused: bool,
    pub tabs: Vec<Tab>,
}

/// Predicate for [`TabHost::query_tabs`]. `None` fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TabQuery {
    pub window: Option<WindowId>,
    pub group: Option<GroupId>,
}

impl TabQuery {
    pub fn window(window: WindowId) -> Self {
        Self {
            window: Some(window),
            group: None,
        }
    }

    pub fn group(group: GroupId) -> Self {
        Self {
            window: None,
            group: Some(group),
        }
    }

    pub fn matches(&self, tab: &Tab) -> bool {
        self.window.is_none_or(|w| w == tab.window_id)
            && self.group.is_none_or(|g| tab.group_id == Some(g))
    }
}

/// Target position for a move. `End` is the host's "-1" index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabPosition {
    At(usize),
    End,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateTab {
    pub window: Option<WindowId>,
    pub index: Option<usize>,
    pub url: Option<String>,
    pub active: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TabUpdate {
    pub active: Option<bool>,
    pub pinned: Option<bool>,
    pub muted: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupUpdate {
    pub title: Option<String>,
    pub color: Option<GroupColor>,
    pub collapsed: Option<bool>,
}

impl GroupUpdate {
    /// An update that restores every visible property of `group`.
    pub fn restoring(group: &Group) -> Self {
        Self {
            title: Some(group.title.clone()),
            color: Some(group.color),
            collapsed: Some(group.collapsed),
        }
    }
}

/// Which fields of a tab an update notification touched. The new values are on the tab record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TabChange {
    pub title: bool,
    pub url: bool,
    pub fav_icon: bool,
    pub pinned: bool,
    pub audible: bool,
    pub muted: bool,
    pub group: bool,
}

/// One change notification from the host's event stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    TabCreated(Tab),
    TabRemoved {
        tab_id: TabId,
        window_id: WindowId,
    },
    TabUpdated {
        tab: Tab,
        change: TabChange,
    },
    TabMoved {
        tab_id: TabId,
        window_id: WindowId,
        from_index: usize,
        to_index: usize,
    },
    TabActivated {
        tab_id: TabId,
        window_id: WindowId,
    },
    TabAttached {
        tab_id: TabId,
        window_id: WindowId,
        position: usize,
    },
    TabDetached {
        tab_id: TabId,
        old_window_id: WindowId,
        old_position: usize,
    },
    TabReplaced {
        added: TabId,
        removed: TabId,
    },
    GroupCreated(Group),
    GroupUpdated(Group),
    GroupRemoved(Group),
    GroupMoved(Group),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityRef {
    Tab(TabId),
    Group(GroupId),
    Window(WindowId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostError {
    /// The referenced entity no longer exists (it was closed or removed since we last looked).
    NotFound(EntityRef),

    /// The host refused the call.
    Rejected(String),
}

impl HostError {
    /// A stale reference is not a failure: the thing we wanted to act on is simply gone.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(EntityRef::Tab(id)) => write!(f, "no tab with id {}", id.0),
            Self::NotFound(EntityRef::Group(id)) => write!(f, "no group with id {}", id.0),
            Self::NotFound(EntityRef::Window(id)) => write!(f, "no window with id {}", id.0),
            Self::Rejected(reason) => write!(f, "host rejected the call: {reason}"),
        }
    }
}

impl std::error::Error for HostError {}

/// The host's tab/window management capability.
///
/// Calls are synchronous from the sidebar's point of view, but the host is free to queue the
/// resulting change notifications: they are only observed when [`Self::drain_events`] is called.
/// Between a call and that drain, arbitrary other notifications may have been queued as well.
///
/// # Errors
/// Every call may fail with [`HostError::NotFound`] when it references something that no longer
/// exists, or [`HostError::Rejected`] when the host refuses the operation.
pub trait TabHost {
    fn current_window(&mut self) -> Result<WindowId, HostError>;

    fn list_windows(&mut self) -> Result<Vec<WindowInfo>, HostError>;

    /// Tabs matching `query`, ordered by window then index.
    fn query_tabs(&mut self, query: &TabQuery) -> Result<Vec<Tab>, HostError>;

    fn get_tab(&mut self, tab: TabId) -> Result<Tab, HostError>;

    fn get_group(&mut self, group: GroupId) -> Result<Group, HostError>;

    fn query_groups(&mut self, window: Option<WindowId>) -> Result<Vec<Group>, HostError>;

    fn create_tab(&mut self, create: CreateTab) -> Result<Tab, HostError>;

    fn remove_tabs(&mut self, tabs: &[TabId]) -> Result<(), HostError>;

    fn update_tab(&mut self, tab: TabId, update: TabUpdate) -> Result<Tab, HostError>;

    fn move_tab(&mut self, tab: TabId, position: TabPosition) -> Result<Tab, HostError>;

    /// Add `tabs` to `group`, or to a freshly created group when `group` is `None`.
    /// Returns the id of the group the tabs ended up in.
    fn group_tabs(&mut self, tabs: &[TabId], group: Option<GroupId>) -> Result<GroupId, HostError>;

    fn ungroup_tabs(&mut self, tabs: &[TabId]) -> Result<(), HostError>;

    /// Create a new window. With `tab`, the tab is lifted out of its window into the new one;
    /// otherwise the window starts with a single placeholder tab.
    fn create_window(&mut self, tab: Option<TabId>) -> Result<WindowInfo, HostError>;

    fn update_group(&mut self, group: GroupId, update: GroupUpdate) -> Result<Group, HostError>;

    /// Move a whole group. `window` moves it to another window (`None` keeps it in place).
    fn move_group(
        &mut self,
        group: GroupId,
        window: Option<WindowId>,
        position: TabPosition,
    ) -> Result<Group, HostError>;

    /// Take every change notification queued since the last call, oldest first.
    fn drain_events(&mut self) -> Vec<HostEvent>;
}

#[cfg(feature = "serde")]
mod no_group {
    use super::{GroupId, NO_GROUP};

    pub(super) fn serialize<S: serde::Serializer>(
        group: &Option<GroupId>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(group.map_or(NO_GROUP, |g| g.0))
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<GroupId>, D::Error> {
        let raw = <i32 as serde::Deserialize<'de>>::deserialize(deserializer)?;
        Ok(GroupId::from_raw(raw))
    }
}

#[cfg(feature = "serde")]
mod muted_info {
    #[derive(serde::Deserialize, serde::Serialize)]
    struct MutedInfo {
        muted: bool,
    }

    pub(super) fn serialize<S: serde::Serializer>(
        muted: &bool,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&MutedInfo { muted: *muted }, serializer)
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<bool, D::Error> {
        let info = <MutedInfo as serde::Deserialize<'de>>::deserialize(deserializer)?;
        Ok(info.muted)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn decodes_host_wire_shape() {
        let json = r#"{
            "id": 12,
            "windowId": 3,
            "index": 0,
            "groupId": -1,
            "pinned": false,
            "active": true,
            "title": "Inbox",
            "url": "https://mail.example.com/",
            "audible": true,
            "mutedInfo": { "muted": true }
        }"#;
        let tab: Tab = serde_json::from_str(json).unwrap();
        assert_eq!(tab.id, TabId(12));
        assert_eq!(tab.window_id, WindowId(3));
        assert_eq!(tab.group_id, None);
        assert!(tab.muted);
        assert_eq!(tab.fav_icon_url, None);

        let grouped: Tab =
            serde_json::from_str(&json.replace("\"groupId\": -1", "\"groupId\": 7")).unwrap();
        assert_eq!(grouped.group_id, Some(GroupId(7)));
    }

    #[test]
    fn encodes_ungrouped_as_sentinel() {
        let tab = Tab {
            id: TabId(1),
            ..Default::default()
        };
        let value = serde_json::to_value(&tab).unwrap();
        assert_eq!(value["groupId"], serde_json::json!(NO_GROUP));
        assert_eq!(value["mutedInfo"]["muted"], serde_json::json!(false));
    }

    #[test]
    fn decodes_group_color_names() {
        let group: Group = serde_json::from_str(
            r#"{ "id": 4, "windowId": 1, "title": "Work", "color": "cyan", "collapsed": true }"#,
        )
        .unwrap();
        assert_eq!(group.color, GroupColor::Cyan);
        assert!(group.collapsed);
    }
}
