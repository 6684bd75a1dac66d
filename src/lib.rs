//! A live, reorderable side panel of a host's tabs and tab groups, drawn with egui.
//!
//! The host (a browser, an editor, anything with a tab strip) implements [`TabHost`]; the
//! [`TabSidebar`] mirrors one of its windows and turns clicks, menus and drag-and-drop into host
//! calls. [`memory_host::MemoryHost`] is an in-process host for tests and demos.

#![forbid(unsafe_code)]

pub mod host;
pub mod memory_host;
pub mod sidebar;

pub use host::{
    CreateTab, EntityRef, Group, GroupColor, GroupId, GroupUpdate, HostError, HostEvent, Tab,
    TabChange, TabHost, TabId, TabPosition, TabQuery, TabUpdate, WindowId, WindowInfo,
};
pub use memory_host::{HostCall, MemoryHost};
pub use sidebar::{
    BackgroundRequest, CloseOutcome, CloseScope, DragKind, DropOutcome, DropTarget,
    MemoryPreferences, PreferenceStore, Preferences, TabSidebar, TabSidebarOptions,
    handle_background_request,
};
