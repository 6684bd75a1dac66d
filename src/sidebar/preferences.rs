use std::collections::BTreeMap;

/// Flat key/value preference storage owned by the embedding application.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Report (and reset) whether anything changed since the last call.
    fn take_changed(&mut self) -> bool;
}

/// A [`PreferenceStore`] backed by a map; handy for tests and simple apps.
#[derive(Clone, Debug, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
    changed: bool,
}

impl MemoryPreferences {
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
        self.changed = true;
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SearchPosition {
    #[default]
    Top,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FontSize {
    #[default]
    Normal,
    Small,
}

/// Whether pinned tabs are listed in the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PinMode {
    #[default]
    Show,
    Hide,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// User preferences, read once at startup and reloaded wholesale when the store changes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Preferences {
    pub search_position: SearchPosition,
    pub font_size: FontSize,
    pub pin_mode: PinMode,
    pub close_by_double_click: bool,
    pub show_newtab_button: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            search_position: SearchPosition::Top,
            font_size: FontSize::Normal,
            pin_mode: PinMode::Show,
            close_by_double_click: false,
            show_newtab_button: true,
            theme: Theme::System,
        }
    }
}

impl Preferences {
    /// Read every recognized key; missing or unrecognized values keep their default.
    pub fn load(store: &dyn PreferenceStore) -> Self {
        let defaults = Self::default();
        let read = |key: &str| store.get(key);
        Self {
            search_position: read("searchPosition")
                .and_then(|v| match v.as_str() {
                    "top" => Some(SearchPosition::Top),
                    "bottom" => Some(SearchPosition::Bottom),
                    _ => None,
                })
                .unwrap_or(defaults.search_position),
            font_size: read("fontSize")
                .and_then(|v| match v.as_str() {
                    "normal" => Some(FontSize::Normal),
                    "small" => Some(FontSize::Small),
                    _ => None,
                })
                .unwrap_or(defaults.font_size),
            pin_mode: read("pinMode")
                .and_then(|v| match v.as_str() {
                    "show" => Some(PinMode::Show),
                    "hide" => Some(PinMode::Hide),
                    _ => None,
                })
                .unwrap_or(defaults.pin_mode),
            close_by_double_click: read("closeByDoubleClick")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.close_by_double_click),
            show_newtab_button: read("showNewtabButton")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.show_newtab_button),
            theme: read("theme")
                .and_then(|v| match v.as_str() {
                    "system" => Some(Theme::System),
                    "light" => Some(Theme::Light),
                    "dark" => Some(Theme::Dark),
                    _ => None,
                })
                .unwrap_or(defaults.theme),
        }
    }

    pub fn text_size(&self) -> f32 {
        match self.font_size {
            FontSize::Normal => 13.0,
            FontSize::Small => 11.0,
        }
    }

    /// `None` means "follow the system".
    pub fn visuals(&self) -> Option<egui::Visuals> {
        match self.theme {
            Theme::System => None,
            Theme::Light => Some(egui::Visuals::light()),
            Theme::Dark => Some(egui::Visuals::dark()),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_gives_defaults() {
        let prefs = Preferences::load(&MemoryPreferences::default());
        assert_eq!(prefs, Preferences::default());
        assert!(prefs.show_newtab_button);
    }

    #[test]
    fn recognized_values_override_defaults() {
        let mut store = MemoryPreferences::default();
        store.set("searchPosition", "bottom");
        store.set("fontSize", "small");
        store.set("closeByDoubleClick", "true");
        store.set("theme", "dark");
        let prefs = Preferences::load(&store);
        assert_eq!(prefs.search_position, SearchPosition::Bottom);
        assert_eq!(prefs.font_size, FontSize::Small);
        assert!(prefs.close_by_double_click);
        assert_eq!(prefs.theme, Theme::Dark);
    }

    #[test]
    fn garbage_values_fall_back() {
        let mut store = MemoryPreferences::default();
        store.set("theme", "neon");
        store.set("showNewtabButton", "yes");
        let prefs = Preferences::load(&store);
        assert_eq!(prefs.theme, Theme::System);
        assert!(prefs.show_newtab_button);
    }

    #[test]
    fn change_flag_is_consumed() {
        let mut store = MemoryPreferences::default();
        store.set("pinMode", "hide");
        assert!(store.take_changed());
        assert!(!store.take_changed());
    }
}
