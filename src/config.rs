use ratatui::style::Color;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub colors: ColorConfig,
    pub layout: LayoutConfig,
    pub keybindings: KeybindingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ColorConfig {
    pub active_border: Color,
    pub inactive_border: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub directory: Color,
    pub disabled_item: Color,
    pub match_path: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub tree_panel_width: u16,
    pub results_panel_height: u16,
    pub show_line_numbers: bool,
}

#[derive(Debug, Clone)]
pub struct KeybindingConfig {
    pub quit: char,
    pub context_menu: char,
    pub search: char,
    pub refresh: char,
    pub export: char,
    pub goto_top: char,
    pub goto_bottom: char,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            active_border: Color::Yellow,
            inactive_border: Color::White,
            selected_fg: Color::Black,
            selected_bg: Color::White,
            directory: Color::Blue,
            disabled_item: Color::DarkGray,
            match_path: Color::Yellow,
            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            tree_panel_width: 30,
            results_panel_height: 30,
            show_line_numbers: true,
        }
    }
}

impl Default for KeybindingConfig {
    fn default() -> Self {
        Self {
            quit: 'q',
            context_menu: 'm',
            search: '/',
            refresh: 'r',
            export: 'z',
            goto_top: 'g',
            goto_bottom: 'G',
        }
    }
}

impl Config {
    pub fn new(base_url: &str, request_timeout: Duration) -> Self {
        Self {
            server: ServerConfig {
                base_url: base_url.to_string(),
                request_timeout,
            },
            colors: ColorConfig::default(),
            layout: LayoutConfig::default(),
            keybindings: KeybindingConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://127.0.0.1:7070", Duration::from_secs(10))
    }
}
