use std::time::Duration;

/// Options for [`super::TabSidebar`].
#[derive(Clone, Debug)]
pub struct TabSidebarOptions {
    /// Quiet period before a requested full rebuild runs.
    ///
    /// Every structural change notification (re)starts this timer, so a burst of notifications
    /// (e.g. a group move reporting every one of its tabs) produces a single rebuild.
    pub rebuild_debounce: Duration,

    /// Closing more than this many tabs at once asks for confirmation first.
    pub bulk_close_confirm_threshold: usize,

    /// Height of one tab or group row, in points, at the normal font size.
    pub row_height: f32,

    /// Indentation of tabs inside a group, in points.
    pub group_indent: f32,

    /// If true, record reconciliation and drag decisions in a small ring buffer
    /// (see [`super::TabSidebar::debug_log_text`]).
    pub debug_event_log: bool,

    /// Maximum number of debug log lines to keep (ring buffer).
    pub debug_event_log_capacity: usize,

    /// If true, check the rendered tree against the host after every settled frame (debug-only).
    pub debug_integrity: bool,

    /// If true, panic on integrity issues (debug-only).
    pub debug_integrity_panic: bool,
}

impl Default for TabSidebarOptions {
    fn default() -> Self {
        Self {
            rebuild_debounce: Duration::from_millis(400),
            bulk_close_confirm_threshold: 10,
            row_height: 24.0,
            group_indent: 10.0,
            debug_event_log: false,
            debug_event_log_capacity: 200,
            debug_integrity: false,
            debug_integrity_panic: false,
        }
    }
}

impl TabSidebarOptions {
    pub(crate) fn needs_close_confirmation(&self, count: usize) -> bool {
        count > self.bulk_close_confirm_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_starts_above_threshold() {
        let opt = TabSidebarOptions::default();
        assert!(!opt.needs_close_confirmation(10));
        assert!(opt.needs_close_confirmation(11));
    }

    #[test]
    fn threshold_is_configurable() {
        let opt = TabSidebarOptions {
            bulk_close_confirm_threshold: 2,
            ..Default::default()
        };
        assert!(opt.needs_close_confirmation(3));
    }
}
