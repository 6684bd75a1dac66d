use std::collections::VecDeque;

use crate::host::{HostError, TabHost, WindowId};

mod debounce;
mod debug;
mod dispatch;
mod drag;
mod drop_apply;
mod drop_policy;
mod group_registry;
mod integrity;
mod messaging;
mod options;
mod preferences;
mod reconcile;
mod render;
mod search;
mod session;
mod tree;
mod view;

#[cfg(test)]
mod drag_tests;

pub use debounce::DebouncedTask;
pub use dispatch::{CloseOutcome, CloseScope, ContextTarget, PendingClose, tabs_to_close};
pub use drag::DropOutcome;
pub use group_registry::GroupRegistry;
pub use messaging::{BackgroundRequest, handle_background_request};
pub use options::TabSidebarOptions;
pub use preferences::{
    FontSize, MemoryPreferences, PinMode, PreferenceStore, Preferences, SearchPosition, Theme,
};
pub use render::{BuildOutcome, InsertOutcome};
pub use search::{SearchHit, TabSearch};
pub use session::{DragKind, DropTarget};
pub use tree::{
    AudioIndicator, DragMarkers, GroupNode, Node, NodeKey, NodePath, RenderedTree, TabIcon,
    TabNode,
};

use session::SessionState;

/// A live side-panel view of one host window's tabs and tab groups.
///
/// The host is the source of truth. The sidebar mirrors it in a [`RenderedTree`], patches that
/// tree as change notifications arrive, falls back to debounced full rebuilds when a patch would
/// have to guess, and turns drag-and-drop gestures into host calls.
///
/// Typical use:
/// - call [`Self::initialize`] once,
/// - call [`Self::ui`] every frame (or [`Self::pump`] when driving it without egui).
#[derive(Debug)]
pub struct TabSidebar {
    pub options: TabSidebarOptions,

    preferences: Preferences,
    session: SessionState,
    registry: GroupRegistry,
    tree: RenderedTree,

    /// Pinned tabs left out of the tree (they always lead the host's order).
    hidden_pinned: usize,

    search: TabSearch,
    search_text: String,
    search_hits: Vec<SearchHit>,

    pending_close: Option<PendingClose>,
    outbound: Vec<BackgroundRequest>,

    rebuild_count: u64,

    debug_log: VecDeque<String>,
    debug_frame: u64,
    debug_last_integrity_hash: Option<u64>,
}

impl Default for TabSidebar {
    fn default() -> Self {
        Self::new()
    }
}

impl TabSidebar {
    pub fn new() -> Self {
        Self::new_with_options(TabSidebarOptions::default())
    }

    pub fn new_with_options(options: TabSidebarOptions) -> Self {
        Self {
            session: SessionState::new(options.rebuild_debounce),
            options,
            preferences: Preferences::default(),
            registry: GroupRegistry::default(),
            tree: RenderedTree::default(),
            hidden_pinned: 0,
            search: TabSearch::new(),
            search_text: String::new(),
            search_hits: Vec::new(),
            pending_close: None,
            outbound: Vec::new(),
            rebuild_count: 0,
            debug_log: VecDeque::new(),
            debug_frame: 0,
            debug_last_integrity_hash: None,
        }
    }

    /// Read preferences, fill the group registry and build the tree from scratch.
    ///
    /// # Errors
    /// Fails if the host cannot report the current window or its groups.
    pub fn initialize(
        &mut self,
        host: &mut dyn TabHost,
        preferences: &dyn PreferenceStore,
    ) -> Result<(), HostError> {
        self.preferences = Preferences::load(preferences);
        self.session.rebuild.set_quiet_period(self.options.rebuild_debounce);
        self.session.window = host.current_window()?;

        // Anything queued so far is already reflected in the queries below.
        let stale = host.drain_events().len();

        self.registry.clear();
        self.registry.populate(host.query_groups(None)?);
        self.search.invalidate();
        self.debug_log_event(format!(
            "initialize window={:?} groups={} dropped_events={stale}",
            self.session.window,
            self.registry.len()
        ));
        self.rebuild_now(host);
        Ok(())
    }

    /// Reload everything if the preference store reports a change.
    ///
    /// # Errors
    /// See [`Self::initialize`].
    pub fn reload_if_preferences_changed(
        &mut self,
        host: &mut dyn TabHost,
        preferences: &mut dyn PreferenceStore,
    ) -> Result<bool, HostError> {
        if !preferences.take_changed() {
            return Ok(false);
        }
        self.debug_log_event("preferences changed: full reload");
        self.session.rebuild.cancel();
        self.initialize(host, preferences)?;
        Ok(true)
    }

    /// Process queued change notifications, then run a due rebuild.
    ///
    /// `now` is a monotonic clock in seconds (e.g. `egui::InputState::time`).
    pub fn pump(&mut self, host: &mut dyn TabHost, now: f64) {
        self.debug_frame = self.debug_frame.wrapping_add(1);
        self.session.now = now;

        for event in host.drain_events() {
            self.handle_event(event);
        }

        // A rebuild that comes due mid-drag waits for the drag to end.
        if !self.session.is_dragging() && self.session.rebuild.take_due(now) {
            self.rebuild_now(host);
        }

        if !self.session.is_dragging() && !self.session.rebuild.is_pending() {
            self.debug_check_integrity(host);
        }
    }

    /// Rebuild from the host right away. Failures are logged and retried later.
    pub fn rebuild_now(&mut self, host: &mut dyn TabHost) -> BuildOutcome {
        self.session.rebuild.cancel();
        match self.build_full(host) {
            Ok(BuildOutcome::Built) => {
                self.rebuild_count += 1;
                self.debug_log_event(format!(
                    "rebuild #{} tabs={} nodes={}",
                    self.rebuild_count,
                    self.tree.flat_len(),
                    self.tree.nodes().len()
                ));
                BuildOutcome::Built
            }
            Ok(BuildOutcome::Skipped) => {
                self.debug_log_event("rebuild skipped: drag in progress");
                self.session.schedule_rebuild();
                BuildOutcome::Skipped
            }
            Ok(outcome @ (BuildOutcome::MissingGroup(_) | BuildOutcome::Inconsistent(_))) => {
                self.debug_log_event(format!("rebuild aborted: {outcome:?}; retrying"));
                self.session.schedule_rebuild();
                outcome
            }
            Ok(BuildOutcome::Failed) => {
                self.debug_log_event("rebuild failed; retrying");
                self.session.schedule_rebuild();
                BuildOutcome::Failed
            }
            Err(err) => {
                log::warn!("rebuild failed: {err}");
                self.debug_log_event(format!("rebuild failed: {err}; retrying"));
                self.session.schedule_rebuild();
                BuildOutcome::Failed
            }
        }
    }

    pub fn tree(&self) -> &RenderedTree {
        &self.tree
    }

    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn window(&self) -> WindowId {
        self.session.window
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_dragging()
    }

    pub fn is_rebuild_pending(&self) -> bool {
        self.session.rebuild.is_pending()
    }

    /// Number of completed full rebuilds so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    pub fn context_target(&self) -> Option<ContextTarget> {
        self.session.context_target
    }

    /// Requests for the host's messaging layer, oldest first.
    pub fn take_outbound(&mut self) -> Vec<BackgroundRequest> {
        std::mem::take(&mut self.outbound)
    }
}
