#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use eframe::egui;
use egui_tab_sidebar::sidebar::{PinMode, SearchPosition};
use egui_tab_sidebar::{
    CreateTab, GroupColor, MemoryHost, MemoryPreferences, TabHost as _, TabPosition, TabSidebar,
    TabSidebarOptions, handle_background_request,
};

struct App {
    host: MemoryHost,
    preferences: MemoryPreferences,
    sidebar: TabSidebar,
    next_page: usize,
}

impl Default for App {
    fn default() -> Self {
        let mut host = MemoryHost::new();
        let inbox = host.add_tab("Inbox", "https://mail.example.com/");
        let docs = host.add_tab("egui docs", "https://docs.rs/egui/");
        let tiles = host.add_tab("egui_tiles", "https://docs.rs/egui_tiles/");
        let issues = host.add_tab("Open issues", "https://github.com/emilk/egui/issues");
        host.add_tab("Calendar", "https://calendar.example.com/");
        host.add_group(&[docs, tiles, issues], "Research", GroupColor::Purple);
        host.set_pinned(inbox, true);
        host.set_active(docs);

        let preferences = MemoryPreferences::default();

        let mut sidebar = TabSidebar::new_with_options(TabSidebarOptions {
            debug_event_log: true,
            debug_integrity: true,
            ..Default::default()
        });
        if let Err(err) = sidebar.initialize(&mut host, &preferences) {
            log::error!("sidebar initialization failed: {err}");
        }

        Self {
            host,
            preferences,
            sidebar,
            next_page: 1,
        }
    }
}

impl App {
    /// Buttons that change the host behind the sidebar's back, the way a user acting in the
    /// browser itself would.
    fn host_controls(&mut self, ui: &mut egui::Ui) {
        let window = self.host.window();
        let tabs = self.host.tab_ids(window);

        ui.heading("Host");
        ui.label(format!("{} tabs in window {}", tabs.len(), window.0));
        ui.separator();

        if ui.button("Open a page at the end").clicked() {
            let page = self.next_page;
            self.next_page += 1;
            let create = CreateTab {
                window: Some(window),
                url: Some(format!("https://example.com/{page}")),
                ..Default::default()
            };
            if let Err(err) = self.host.create_tab(create) {
                log::warn!("open failed: {err}");
            }
        }
        if ui.button("Close the last tab").clicked() {
            if let Some(&last) = tabs.last() {
                self.host.close_tab_externally(last);
            }
        }
        if ui.button("Move the first tab to the end").clicked() {
            if let Some(&first) = tabs.first() {
                if let Err(err) = self.host.move_tab(first, TabPosition::End) {
                    log::warn!("move failed: {err}");
                }
            }
        }
        if ui.button("Rename the second tab").clicked() {
            if let Some(&second) = tabs.get(1) {
                self.host
                    .set_title_externally(second, &format!("Renamed {}", self.next_page));
                self.next_page += 1;
            }
        }
        if ui.button("Dissolve the first group").clicked() {
            let first = self.host.groups().next().map(|g| g.id);
            if let Some(group) = first {
                self.host.remove_group_externally(group);
            }
        }

        ui.separator();
        ui.heading("Preferences");
        let hide_pins = self.sidebar.preferences().pin_mode == PinMode::Hide;
        if ui
            .button(if hide_pins { "Show pinned tabs" } else { "Hide pinned tabs" })
            .clicked()
        {
            self.preferences
                .set("pinMode", if hide_pins { "show" } else { "hide" });
        }
        let bottom = self.sidebar.preferences().search_position
            == SearchPosition::Bottom;
        if ui
            .button(if bottom { "Search box on top" } else { "Search box at the bottom" })
            .clicked()
        {
            self.preferences
                .set("searchPosition", if bottom { "top" } else { "bottom" });
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("tab_sidebar")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                self.sidebar
                    .ui(ui, &mut self.host, &mut self.preferences);
            });

        for request in self.sidebar.take_outbound() {
            if let Err(err) = handle_background_request(&mut self.host, &request) {
                log::warn!("{request:?} failed: {err}");
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| self.host_controls(ui));
    }
}

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 640.0])
            .with_title("egui_tab_sidebar demo"),
        ..Default::default()
    };

    eframe::run_native(
        "egui_tab_sidebar demo",
        options,
        Box::new(|_cc| Ok(Box::new(App::default()))),
    )
}
