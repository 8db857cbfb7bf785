use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use serde::Deserialize;

use crate::glyphs::CharMode;
use crate::system::SamplerPaths;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub canvas: CanvasConfig,
    pub paths: PathsConfig,
    pub logging: LoggingConfig,
    pub keybinds: KeybindsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    pub char_mode: String,
    pub battery_history: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: 1000,
            char_mode: "utf8".to_string(),
            battery_history: 64,
        }
    }
}

impl GeneralConfig {
    pub fn char_mode(&self) -> CharMode {
        CharMode::from_config_str(&self.char_mode)
    }
}

/// Ceilings for the drawing surface, whatever the terminal size.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub max_width: u16,
    pub max_height: u16,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        CanvasConfig {
            max_width: 800,
            max_height: 400,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let defaults = SamplerPaths::default();
        PathsConfig {
            proc_root: defaults.proc_root,
            sys_root: defaults.sys_root,
        }
    }
}

impl PathsConfig {
    pub fn sampler_paths(&self) -> SamplerPaths {
        SamplerPaths {
            proc_root: self.proc_root.clone(),
            sys_root: self.sys_root.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Defaults to `<data-local-dir>/jill/jill.log`.
    pub file: Option<PathBuf>,
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: None,
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindsConfig {
    pub quit: String,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        KeybindsConfig {
            quit: "F10".to_string(),
        }
    }
}

/// The flat JSON format older installs keep in `conf.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyConfig {
    #[serde(alias = "max-width")]
    max_width: Option<u16>,
    #[serde(alias = "max-height")]
    max_height: Option<u16>,
    #[serde(alias = "char-mode")]
    char_mode: Option<String>,
}

impl From<LegacyConfig> for Config {
    fn from(legacy: LegacyConfig) -> Self {
        let mut config = Config::default();
        if let Some(w) = legacy.max_width {
            config.canvas.max_width = w;
        }
        if let Some(h) = legacy.max_height {
            config.canvas.max_height = h;
        }
        if let Some(mode) = legacy.char_mode {
            config.general.char_mode = mode;
        }
        config
    }
}

/// Key names as written in the config: a single character, `F1`..`F12`, or
/// one of the named keys.
pub fn parse_key(s: &str) -> Option<KeyCode> {
    let code = match s {
        "Enter" => KeyCode::Enter,
        "Esc" | "Escape" => KeyCode::Esc,
        "Tab" => KeyCode::Tab,
        "Backspace" => KeyCode::Backspace,
        "Delete" => KeyCode::Delete,
        "Space" => KeyCode::Char(' '),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                (Some('F'), Some(_)) => {
                    let n: u8 = s[1..].parse().ok()?;
                    if !(1..=12).contains(&n) {
                        return None;
                    }
                    KeyCode::F(n)
                }
                _ => return None,
            }
        }
    };
    Some(code)
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("jill").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str::<LegacyConfig>(&contents)
            .map(Config::from)
            .unwrap_or_default()
    } else {
        toml::from_str(&contents).unwrap_or_default()
    }
}
