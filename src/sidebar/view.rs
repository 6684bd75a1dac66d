use std::ops::Range;

use egui::text::{LayoutJob, TextFormat};
use egui::{Align, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2};

use crate::host::{GroupId, TabHost, TabId};

use super::TabSidebar;
use super::dispatch::{CloseOutcome, CloseScope};
use super::preferences::{PreferenceStore, SearchPosition};
use super::search::SearchHit;
use super::session::{DragKind, DropTarget};
use super::tree::{AudioIndicator, DragMarkers, GroupNode, Node, NodeKey, TabIcon, TabNode};

/// A gesture collected while drawing; applied once the frame's rows are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowAction {
    Activate(TabId),
    Close(TabId),
    CloseScope(TabId, CloseScope),
    TogglePinned(TabId),
    ToggleMuted(TabId),
    MoveToNewWindow(TabId),
    NewTab(Option<GroupId>),
    ToggleCollapsed(GroupId),
    CloseGroup(GroupId),
    Ungroup(GroupId),
    MoveGroupToNewWindow(TabId, GroupId),
    BeginDrag(DragKind),
    OpenContext(NodeKey),
}

#[derive(Clone, Debug)]
struct RowStyle {
    height: f32,
    indent: f32,
    font: FontId,
    close_by_double_click: bool,
}

impl RowStyle {
    fn row(&self, ui: &Ui) -> Vec2 {
        Vec2::new(ui.available_width(), self.height)
    }
}

impl TabSidebar {
    /// Run one frame: apply preference changes and host notifications, then draw the panel.
    pub fn ui(
        &mut self,
        ui: &mut Ui,
        host: &mut dyn TabHost,
        preferences: &mut dyn PreferenceStore,
    ) {
        if let Err(err) = self.reload_if_preferences_changed(host, preferences) {
            log::warn!("preference reload failed: {err}");
        }
        let now = ui.input(|i| i.time);
        self.pump(host, now);
        if self.search_needs_refresh() {
            self.refresh_search(host);
        }

        if let Some(visuals) = self.preferences.visuals() {
            ui.style_mut().visuals = visuals;
        }

        let text_size = self.preferences.text_size();
        let style = RowStyle {
            height: self.options.row_height * text_size / 13.0,
            indent: self.options.group_indent,
            font: FontId::proportional(text_size),
            close_by_double_click: self.preferences.close_by_double_click,
        };

        let mut actions: Vec<RowAction> = Vec::new();
        let search_position = self.preferences.search_position;

        if search_position == SearchPosition::Top {
            self.ui_search_box(ui, host);
            ui.separator();
        }

        let bottom_reserve = if search_position == SearchPosition::Bottom {
            style.height * 2.0
        } else {
            0.0
        };
        egui::ScrollArea::vertical()
            .id_salt("egui_tab_sidebar_rows")
            .auto_shrink([false, false])
            .max_height((ui.available_height() - bottom_reserve).max(style.height))
            .show(ui, |ui| {
                if self.search_text.trim().is_empty() {
                    self.ui_tree(ui, host, &style, &mut actions);
                } else {
                    self.ui_search_results(ui, &style, &mut actions);
                }
                if self.preferences.show_newtab_button
                    && !self.session.is_dragging()
                    && ui.button("+ New tab").clicked()
                {
                    actions.push(RowAction::NewTab(None));
                }
            });

        if search_position == SearchPosition::Bottom {
            ui.separator();
            self.ui_search_box(ui, host);
        }

        for action in actions {
            self.apply_row_action(host, action);
        }

        self.ui_close_confirmation(ui.ctx(), host);
        self.ui_debug_window(ui.ctx());

        if let Some(remaining) = self.session.rebuild.remaining(now) {
            ui.ctx().request_repaint_after(remaining);
        }
    }

    fn ui_search_box(&mut self, ui: &mut Ui, host: &mut dyn TabHost) {
        let mut text = self.search_text.clone();
        let response = ui.add(
            egui::TextEdit::singleline(&mut text)
                .hint_text("Search tabs")
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.set_search_text(host, &text);
        }
    }

    fn ui_tree(
        &mut self,
        ui: &mut Ui,
        host: &mut dyn TabHost,
        style: &RowStyle,
        actions: &mut Vec<RowAction>,
    ) {
        let scroll_to = self.session.scroll_to.take();
        let mut zones: Vec<(Rect, DropTarget)> = Vec::new();

        // Draw from a snapshot: gestures mutate the tree only after the rows are laid out.
        let nodes = self.tree.nodes().to_vec();
        for node in &nodes {
            match node {
                Node::Tab(tab) => {
                    let rect = tab_row(ui, tab, 0.0, style, scroll_to, actions);
                    zones.push((rect, DropTarget::Tab(tab.id)));
                }
                Node::Group(group) => {
                    let rect = group_header(ui, group, style, actions);
                    zones.push((rect, DropTarget::Group(group.id)));
                    if !group.collapsed {
                        for tab in &group.tabs {
                            let rect = tab_row(ui, tab, style.indent, style, scroll_to, actions);
                            zones.push((rect, DropTarget::Tab(tab.id)));
                        }
                    }
                }
            }
        }
        if let Some(end) = self.tree.end_zone() {
            let rect = end_zone(ui, end, style);
            zones.push((rect, DropTarget::End));
        }

        self.track_drag(ui, host, &zones);
    }

    /// Feed pointer movement and release into the drag engine.
    fn track_drag(&mut self, ui: &Ui, host: &mut dyn TabHost, zones: &[(Rect, DropTarget)]) {
        if !self.session.is_dragging() {
            return;
        }
        let ctx = ui.ctx();
        ctx.set_cursor_icon(egui::CursorIcon::Grabbing);

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.cancel_drag(host);
            return;
        }

        let hovered = ctx.pointer_interact_pos().and_then(|pos| {
            zones
                .iter()
                .find(|(rect, _)| rect.contains(pos))
                .map(|&(_, target)| target)
        });
        self.hover_drag(hovered);

        if ctx.input(|i| i.pointer.any_released()) {
            match hovered {
                Some(target) => {
                    self.drop_drag(host, target);
                }
                None => self.cancel_drag(host),
            }
        }
        ctx.request_repaint();
    }

    fn ui_search_results(&self, ui: &mut Ui, style: &RowStyle, actions: &mut Vec<RowAction>) {
        if self.search_hits.is_empty() {
            ui.weak("No matching tabs");
            return;
        }
        for hit in &self.search_hits {
            let Some(tab) = self.tree.tab(hit.tab) else {
                continue;
            };
            search_row(ui, tab, hit, style, actions);
        }
    }

    fn apply_row_action(&mut self, host: &mut dyn TabHost, action: RowAction) {
        match action {
            RowAction::Activate(tab) => {
                self.activate_tab(host, tab);
            }
            RowAction::Close(tab) => {
                self.close_tab(host, tab);
            }
            RowAction::CloseScope(tab, scope) => match self.close_tabs(host, tab, scope) {
                Ok(CloseOutcome::Closed(_) | CloseOutcome::NeedsConfirmation(_)) => {}
                Err(err) => {
                    log::warn!("close {scope:?} failed: {err}");
                    self.session.schedule_rebuild();
                }
            },
            RowAction::TogglePinned(tab) => {
                self.toggle_pinned(host, tab);
            }
            RowAction::ToggleMuted(tab) => {
                self.toggle_muted(host, tab);
            }
            RowAction::MoveToNewWindow(tab) => {
                self.move_tab_to_new_window(host, tab);
            }
            RowAction::NewTab(group) => {
                self.new_tab(host, group);
            }
            RowAction::ToggleCollapsed(group) => {
                self.toggle_group_collapsed(host, group);
            }
            RowAction::CloseGroup(group) => {
                self.close_group(host, group);
            }
            RowAction::Ungroup(group) => {
                self.ungroup(host, group);
            }
            RowAction::MoveGroupToNewWindow(tab, group) => {
                self.request_move_group_to_new_window(tab, group);
            }
            RowAction::BeginDrag(kind) => {
                self.begin_drag(kind);
            }
            RowAction::OpenContext(key) => {
                self.open_context_menu(key);
            }
        }
    }

    fn ui_close_confirmation(&mut self, ctx: &egui::Context, host: &mut dyn TabHost) {
        let Some(pending) = &self.pending_close else {
            return;
        };
        let count = pending.tabs.len();
        let mut confirm = false;
        let mut cancel = false;

        egui::Window::new("Close tabs")
            .id(egui::Id::new("egui_tab_sidebar_close_confirmation"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(format!("Close {count} tabs?"));
                ui.horizontal(|ui| {
                    confirm = ui.button("Close").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            cancel = true;
        }

        if confirm {
            if let Err(err) = self.confirm_close(host) {
                log::warn!("bulk close failed: {err}");
                self.session.schedule_rebuild();
            }
        } else if cancel {
            self.cancel_close();
        }
    }
}

fn row_fill(ui: &Ui, rect: Rect, active: bool, hovered: bool) {
    let visuals = ui.visuals();
    if active {
        ui.painter().rect_filled(rect, 2.0, visuals.selection.bg_fill);
    } else if hovered {
        ui.painter()
            .rect_filled(rect, 2.0, visuals.widgets.hovered.weak_bg_fill);
    }
}

/// The insertion line shown above the zone the pointer is over.
fn paint_markers(ui: &Ui, rect: Rect, markers: DragMarkers) {
    if markers.drag_over {
        let stroke = Stroke::new(2.0, ui.visuals().selection.stroke.color);
        ui.painter().hline(rect.x_range(), rect.top(), stroke);
    }
}

/// Stand-in glyph for the favicon: the title's initial, or the site's for lookup-only icons.
fn icon_glyph(tab: &TabNode) -> String {
    let source = match &tab.icon {
        TabIcon::Url(_) => tab.title.as_str(),
        TabIcon::PageFavicon(url) => url.split_once("://").map_or(url.as_str(), |(_, rest)| rest),
    };
    source
        .chars()
        .find(|c| c.is_alphanumeric())
        .map_or_else(|| "·".to_owned(), |c| c.to_uppercase().to_string())
}

fn tab_row(
    ui: &mut Ui,
    tab: &TabNode,
    indent: f32,
    style: &RowStyle,
    scroll_to: Option<TabId>,
    actions: &mut Vec<RowAction>,
) -> Rect {
    let (rect, response) = ui.allocate_exact_size(style.row(ui), Sense::click_and_drag());
    if scroll_to == Some(tab.id) {
        response.scroll_to_me(Some(Align::Center));
    }

    if ui.is_rect_visible(rect) {
        row_fill(ui, rect, tab.active, response.hovered());
        paint_markers(ui, rect, tab.markers);

        let painter = ui.painter();
        let text_color = ui.visuals().text_color();
        let weak = ui.visuals().weak_text_color();
        let mut x = rect.left() + indent + 6.0;

        let icon_rect = Rect::from_center_size(
            egui::pos2(x + 7.0, rect.center().y),
            Vec2::splat(style.font.size + 2.0),
        );
        painter.rect_stroke(icon_rect, 3.0, Stroke::new(1.0, weak), egui::StrokeKind::Inside);
        painter.text(
            icon_rect.center(),
            Align2::CENTER_CENTER,
            icon_glyph(tab),
            FontId::proportional(style.font.size * 0.8),
            weak,
        );
        x += 20.0;

        let mut suffix = String::new();
        match tab.audio {
            AudioIndicator::Playing => suffix.push_str(" 🔊"),
            AudioIndicator::Muted => suffix.push_str(" 🔇"),
            AudioIndicator::None => {}
        }
        if tab.pinned {
            suffix.push_str(" 📌");
        }

        let title = if tab.title.is_empty() { &tab.url } else { &tab.title };
        let title_rect = painter.text(
            egui::pos2(x, rect.center().y),
            Align2::LEFT_CENTER,
            title,
            style.font.clone(),
            text_color,
        );
        if !suffix.is_empty() {
            painter.text(
                egui::pos2(title_rect.right(), rect.center().y),
                Align2::LEFT_CENTER,
                suffix,
                style.font.clone(),
                weak,
            );
        }
    }

    if response.drag_started() {
        actions.push(RowAction::BeginDrag(DragKind::Tab(tab.id)));
    } else if response.middle_clicked()
        || (style.close_by_double_click && response.double_clicked())
    {
        actions.push(RowAction::Close(tab.id));
    } else if response.clicked() {
        actions.push(RowAction::Activate(tab.id));
    }
    if response.secondary_clicked() {
        actions.push(RowAction::OpenContext(NodeKey::Tab(tab.id)));
    }

    let response = response.on_hover_text(tab.tooltip());
    response.context_menu(|ui| tab_menu(ui, tab, actions));
    rect
}

fn tab_menu(ui: &mut Ui, tab: &TabNode, actions: &mut Vec<RowAction>) {
    let mut item = |ui: &mut Ui, label: &str, action: RowAction| {
        if ui.button(label).clicked() {
            actions.push(action);
            ui.close();
        }
    };

    item(ui, "Close", RowAction::CloseScope(tab.id, CloseScope::This));
    item(ui, "Close other tabs", RowAction::CloseScope(tab.id, CloseScope::Others));
    item(ui, "Close tabs above", RowAction::CloseScope(tab.id, CloseScope::Left));
    item(ui, "Close tabs below", RowAction::CloseScope(tab.id, CloseScope::Right));
    if let Some(group) = tab.group_id {
        ui.separator();
        item(
            ui,
            "Close group tabs above",
            RowAction::CloseScope(tab.id, CloseScope::GroupAbove),
        );
        item(
            ui,
            "Close group tabs below",
            RowAction::CloseScope(tab.id, CloseScope::GroupBelow),
        );
        item(
            ui,
            "Move group to new window",
            RowAction::MoveGroupToNewWindow(tab.id, group),
        );
    }
    ui.separator();
    let pin = if tab.pinned { "Unpin" } else { "Pin" };
    item(ui, pin, RowAction::TogglePinned(tab.id));
    let mute = if tab.audio == AudioIndicator::Muted {
        "Unmute"
    } else {
        "Mute"
    };
    item(ui, mute, RowAction::ToggleMuted(tab.id));
    item(ui, "Move to new window", RowAction::MoveToNewWindow(tab.id));
}

fn group_header(
    ui: &mut Ui,
    group: &GroupNode,
    style: &RowStyle,
    actions: &mut Vec<RowAction>,
) -> Rect {
    let (rect, response) = ui.allocate_exact_size(style.row(ui), Sense::click_and_drag());

    if ui.is_rect_visible(rect) {
        row_fill(ui, rect, false, response.hovered());
        paint_markers(ui, rect, group.markers);

        let painter = ui.painter();
        let color = group.color.to_color32();
        let bar = Rect::from_min_size(rect.left_top(), Vec2::new(3.0, rect.height()));
        painter.rect_filled(bar, 0.0, color);

        let arrow = if group.collapsed { "▸" } else { "▾" };
        painter.text(
            egui::pos2(rect.left() + 8.0, rect.center().y),
            Align2::LEFT_CENTER,
            arrow,
            style.font.clone(),
            color,
        );
        let title = if group.title.is_empty() {
            format!("{} tabs", group.tabs.len())
        } else {
            group.title.clone()
        };
        painter.text(
            egui::pos2(rect.left() + 24.0, rect.center().y),
            Align2::LEFT_CENTER,
            title,
            style.font.clone(),
            color,
        );
    }

    if response.drag_started() {
        actions.push(RowAction::BeginDrag(DragKind::Group(group.id)));
    } else if response.clicked() {
        actions.push(RowAction::ToggleCollapsed(group.id));
    }
    if response.secondary_clicked() {
        actions.push(RowAction::OpenContext(NodeKey::Group(group.id)));
    }

    let first_tab = group.tabs.first().map(|t| t.id);
    response.context_menu(|ui| {
        let mut item = |ui: &mut Ui, label: &str, action: RowAction| {
            if ui.button(label).clicked() {
                actions.push(action);
                ui.close();
            }
        };
        let collapse = if group.collapsed { "Expand" } else { "Collapse" };
        item(ui, collapse, RowAction::ToggleCollapsed(group.id));
        item(ui, "New tab in group", RowAction::NewTab(Some(group.id)));
        item(ui, "Ungroup", RowAction::Ungroup(group.id));
        if let Some(tab) = first_tab {
            item(
                ui,
                "Move group to new window",
                RowAction::MoveGroupToNewWindow(tab, group.id),
            );
        }
        ui.separator();
        item(ui, "Close group", RowAction::CloseGroup(group.id));
    });
    rect
}

fn end_zone(ui: &mut Ui, markers: DragMarkers, style: &RowStyle) -> Rect {
    let (rect, _) = ui.allocate_exact_size(style.row(ui), Sense::hover());
    paint_markers(ui, rect, markers);
    if markers.drag_over {
        ui.painter().rect_filled(
            rect,
            2.0,
            ui.visuals().selection.bg_fill.gamma_multiply(0.3),
        );
    }
    rect
}

fn search_row(
    ui: &mut Ui,
    tab: &TabNode,
    hit: &SearchHit,
    style: &RowStyle,
    actions: &mut Vec<RowAction>,
) {
    let (rect, response) = ui.allocate_exact_size(
        Vec2::new(ui.available_width(), style.height * 1.6),
        Sense::click(),
    );
    if ui.is_rect_visible(rect) {
        row_fill(ui, rect, tab.active, response.hovered());
        let visuals = ui.visuals();
        let strong = visuals.strong_text_color();
        let weak = visuals.weak_text_color();
        let highlight = visuals.selection.stroke.color;

        let title = highlighted(&tab.title, &hit.title_spans, style.font.clone(), strong, highlight);
        let url = highlighted(
            &tab.url,
            &hit.url_spans,
            FontId::proportional(style.font.size * 0.85),
            weak,
            highlight,
        );
        let title = ui.fonts(|f| f.layout_job(title));
        let url = ui.fonts(|f| f.layout_job(url));
        let painter = ui.painter();
        painter.galley(rect.left_top() + Vec2::new(6.0, 2.0), title, strong);
        painter.galley(
            egui::pos2(rect.left() + 6.0, rect.center().y + 1.0),
            url,
            weak,
        );
    }
    if response.clicked() {
        actions.push(RowAction::Activate(tab.id));
    }
}

/// Lay out `text` with the character ranges in `spans` drawn in `highlight`.
fn highlighted(
    text: &str,
    spans: &[Range<usize>],
    font: FontId,
    color: Color32,
    highlight: Color32,
) -> LayoutJob {
    let plain = TextFormat::simple(font.clone(), color);
    let marked = TextFormat {
        underline: Stroke::new(1.0, highlight),
        ..TextFormat::simple(font, highlight)
    };

    let mut job = LayoutJob::default();
    let mut cursor = 0;
    for span in spans {
        let (start, end) = (char_to_byte(text, span.start), char_to_byte(text, span.end));
        if start < cursor || start >= end {
            continue;
        }
        if cursor < start {
            job.append(&text[cursor..start], 0.0, plain.clone());
        }
        job.append(&text[start..end], 0.0, marked.clone());
        cursor = end;
    }
    if cursor < text.len() {
        job.append(&text[cursor..], 0.0, plain);
    }
    job
}

fn char_to_byte(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map_or(text.len(), |(byte, _)| byte)
}
