use serde::Deserialize;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;
use anyhow::{Context, Result};
use std::fs;
use tiny_skia::Color;

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_clipboard_command")]
    pub clipboard_command: String,
    #[serde(default)]
    pub close_on_copy: bool,
}

fn default_clipboard_command() -> String { "wl-copy".to_string() }

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            clipboard_command: default_clipboard_command(),
            close_on_copy: false,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Catalog file; falls back to `catalog.toml` in the config dir, then to the built-in servers.
    pub path: Option<PathBuf>,
    /// Name patterns (regex) hidden from the registry.
    pub exclude: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ThemeConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default = "default_card_height")]
    pub card_height: f32,
    #[serde(default = "default_padding")]
    pub padding: f32,
    #[serde(default = "default_spacing")]
    pub spacing: f32,
    #[serde(default = "default_border_radius")]
    pub border_radius: f32,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_border_color")]
    pub border_color: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_muted")]
    pub muted: String,
    #[serde(default = "default_card_background")]
    pub card_background: String,
    #[serde(default = "default_command_background")]
    pub command_background: String,
    #[serde(default = "default_selection_border")]
    pub selection_border: String,
    #[serde(default)]
    pub icon_dirs: Vec<PathBuf>,
}

fn default_width() -> u32 { 1000 }
fn default_height() -> u32 { 640 }
fn default_columns() -> usize { 3 }
fn default_card_height() -> f32 { 136.0 }
fn default_padding() -> f32 { 24.0 }
fn default_spacing() -> f32 { 16.0 }
fn default_border_radius() -> f32 { 12.0 }
fn default_background() -> String { "0f172af2".to_string() }
fn default_border_color() -> String { "60a5fa1a".to_string() }
fn default_title() -> String { "ffc300ff".to_string() }
fn default_text() -> String { "e2e8f0ff".to_string() }
fn default_name() -> String { "60a5faff".to_string() }
fn default_muted() -> String { "94a3b8ff".to_string() }
fn default_card_background() -> String { "171717b3".to_string() }
fn default_command_background() -> String { "1e293b80".to_string() }
fn default_selection_border() -> String { "34d399ff".to_string() }

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            columns: default_columns(),
            card_height: default_card_height(),
            padding: default_padding(),
            spacing: default_spacing(),
            border_radius: default_border_radius(),
            background: default_background(),
            border_color: default_border_color(),
            title: default_title(),
            text: default_text(),
            name: default_name(),
            muted: default_muted(),
            card_background: default_card_background(),
            command_background: default_command_background(),
            selection_border: default_selection_border(),
            icon_dirs: Vec::new(),
        }
    }
}

impl ThemeConfig {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 8 || !hex.is_ascii() {
            return Color::BLACK;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
        let a = u8::from_str_radix(&hex[6..8], 16).unwrap_or(255);

        Color::from_rgba8(r, g, b, a)
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        let theme = &mut config.theme;
        theme.columns = theme.columns.max(1);
        // f32::max also maps NaN to the bound
        theme.card_height = theme.card_height.max(1.0);
        theme.spacing = theme.spacing.max(0.0);
        theme.padding = theme.padding.max(0.0);
        Ok(config)
    }
}

pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("org", "mcp-registry", "mcp-registry")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

/// Reads the config at `path` (or the default location). A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    Config::parse(&content).with_context(|| format!("parsing {}", config_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.general.clipboard_command, "wl-copy");
        assert!(!config.general.close_on_copy);
        assert!(config.catalog.path.is_none());
        assert_eq!(config.theme.columns, 3);
        assert_eq!(config.theme.width, 1000);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
[general]
clipboard_command = "xclip -selection clipboard"
close_on_copy = true

[catalog]
path = "/tmp/servers.toml"
exclude = ["^Debug"]

[theme]
columns = 2
card_height = 120.0
background = "#000000ff"
"##;
        let config = Config::parse(toml).unwrap();
        assert_eq!(config.general.clipboard_command, "xclip -selection clipboard");
        assert!(config.general.close_on_copy);
        assert_eq!(config.catalog.path, Some(PathBuf::from("/tmp/servers.toml")));
        assert_eq!(config.catalog.exclude, Some(vec!["^Debug".to_string()]));
        assert_eq!(config.theme.columns, 2);
        assert_eq!(config.theme.card_height, 120.0);
        assert_eq!(config.theme.padding, 24.0);
    }

    #[test]
    fn test_zero_columns_is_clamped() {
        let config = Config::parse("[theme]\ncolumns = 0\n").unwrap();
        assert_eq!(config.theme.columns, 1);
    }

    #[test]
    fn test_degenerate_grid_sizes_are_clamped() {
        let config = Config::parse("[theme]\ncard_height = -10.0\nspacing = -4.0\npadding = -1.0\n").unwrap();
        assert_eq!(config.theme.card_height, 1.0);
        assert_eq!(config.theme.spacing, 0.0);
        assert_eq!(config.theme.padding, 0.0);

        let config = Config::parse("[theme]\ncard_height = 0.0\n").unwrap();
        assert_eq!(config.theme.card_height, 1.0);
    }

    #[test]
    fn test_invalid_config_is_error() {
        assert!(Config::parse("[general]\nclose_on_copy = \"maybe\"\n").is_err());
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(&dir.path().join("config.toml"))).unwrap();
        assert_eq!(config.general.clipboard_command, "wl-copy");
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(ThemeConfig::parse_color("#ff000080"), Color::from_rgba8(255, 0, 0, 128));
        assert_eq!(ThemeConfig::parse_color("00ff00ff"), Color::from_rgba8(0, 255, 0, 255));
        assert_eq!(ThemeConfig::parse_color("fff"), Color::BLACK);
    }
}
