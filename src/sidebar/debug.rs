use egui::Context;

use crate::host::{TabHost, TabQuery};

use super::TabSidebar;
use super::integrity;
use super::tree::{Node, RenderedTree};

fn debug_tree_summary(tree: &RenderedTree, max_lines: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for node in tree.nodes() {
        match node {
            Node::Tab(tab) => lines.push(format!(
                "tab {} group={:?} active={} pinned={}",
                tab.id.0,
                tab.group_id.map(|g| g.0),
                tab.active,
                tab.pinned
            )),
            Node::Group(group) => {
                lines.push(format!(
                    "group {} {:?} collapsed={} tabs={:?}",
                    group.id.0,
                    group.title,
                    group.collapsed,
                    group.tabs.iter().map(|t| t.id.0).collect::<Vec<_>>()
                ));
            }
        }
        if lines.len() >= max_lines {
            lines.push("...".to_owned());
            break;
        }
    }
    format!(
        "nodes={} tabs={}\n{}",
        tree.nodes().len(),
        tree.flat_len(),
        lines.join("\n")
    )
}

impl TabSidebar {
    pub(super) fn debug_log_event(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("{message}");
        if !self.options.debug_event_log {
            return;
        }
        self.push_debug_log_line(message);
    }

    fn debug_integrity_log_event(&mut self, message: impl Into<String>) {
        if !self.options.debug_integrity {
            return;
        }
        self.push_debug_log_line(message.into());
    }

    fn push_debug_log_line(&mut self, message: String) {
        let cap = self.options.debug_event_log_capacity.clamp(1, 10_000);
        while self.debug_log.len() >= cap {
            self.debug_log.pop_front();
        }
        self.debug_log
            .push_back(format!("[frame {}] {}", self.debug_frame, message));
    }

    pub fn debug_log_clear(&mut self) {
        self.debug_log.clear();
    }

    /// The debug event log, oldest line first.
    pub fn debug_log_text(&self) -> String {
        self.debug_log
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Compare the settled tree against the host, logging only when the set of issues changes.
    pub(super) fn debug_check_integrity(&mut self, host: &mut dyn TabHost) {
        if !self.options.debug_integrity {
            return;
        }

        let mut issues = integrity::tree_integrity_issues(&self.tree, self.session.is_dragging());
        match host.query_tabs(&TabQuery::window(self.session.window)) {
            Ok(tabs) => {
                let listed: Vec<_> = tabs.into_iter().filter(|t| self.is_listed(t)).collect();
                issues.extend(integrity::order_issues(&self.tree, &listed));
            }
            Err(err) => issues.push(format!("integrity: host query failed: {err}")),
        }
        let hash = integrity::hash_issues(&issues);

        let prev = self.debug_last_integrity_hash.replace(hash);
        if prev == Some(hash) {
            return;
        }

        if issues.is_empty() {
            if prev.is_some() {
                self.debug_integrity_log_event("integrity OK");
            }
            return;
        }

        log::warn!("tab sidebar integrity failure: {}", issues.join("; "));
        self.debug_integrity_log_event(format!("integrity FAIL issues={}", issues.len()));
        for issue in &issues {
            self.debug_integrity_log_event(issue.clone());
        }
        let summary = debug_tree_summary(&self.tree, 48);
        self.debug_integrity_log_event(format!("integrity tree_summary:\n{summary}"));

        if self.options.debug_integrity_panic && cfg!(debug_assertions) {
            panic!("tab sidebar integrity failure\n{}", issues.join("\n"));
        }
    }

    pub(super) fn ui_debug_window(&mut self, ctx: &Context) {
        if !(self.options.debug_event_log || self.options.debug_integrity) {
            return;
        }
        let log_text = self.debug_log_text();
        let summary = debug_tree_summary(&self.tree, 64);
        let mut clear = false;

        egui::Window::new("Tab Sidebar Debug")
            .id(egui::Id::new("egui_tab_sidebar_debug_window"))
            .default_pos(egui::Pos2::new(12.0, 12.0))
            .resizable(true)
            .show(ctx, |ui| {
                ui.label(format!(
                    "rebuilds={} pending={} dragging={}",
                    self.rebuild_count,
                    self.session.rebuild.is_pending(),
                    self.session.is_dragging()
                ));
                ui.horizontal(|ui| {
                    if ui.button("Copy tree").clicked() {
                        ctx.copy_text(summary.clone());
                    }
                    if ui.button("Copy event log").clicked() {
                        ctx.copy_text(log_text.clone());
                    }
                    if ui.button("Clear event log").clicked() {
                        clear = true;
                    }
                });

                ui.separator();
                egui::ScrollArea::vertical()
                    .id_salt("tree_summary")
                    .max_height(160.0)
                    .show(ui, |ui| {
                        ui.monospace(summary.as_str());
                    });

                ui.separator();
                egui::ScrollArea::vertical()
                    .id_salt("event_log")
                    .max_height(240.0)
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        ui.monospace(log_text.as_str());
                    });
            });

        if clear {
            self.debug_log_clear();
        }
    }
}
