use std::{collections::HashMap, env, fs, path::PathBuf, time::Duration};

use directories::BaseDirs;
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::table::popover::FilterPopoverConfig;
use crate::table::sticky::StickyHeaderConfig;
use crate::tui::action::Action;
use crate::tui::components::chrome::ChromeConfig;
use crate::tui::keybindings::KeyBindings;
use crate::tui::screen::ScreenBreakpoints;
use crate::tui::theme::ThemeName;

const CONFIG: &str = include_str!("../.config/config.json5");

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub config_dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default, flatten)]
    pub config: AppConfig,
    /// Backend base URL; empty means paths are used as given
    #[serde(default)]
    pub api_base_url: String,
    /// Where downloaded reports are written; empty means `<data_dir>/downloads`
    #[serde(default)]
    pub download_dir: PathBuf,
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_frame_rate_ms")]
    pub frame_rate_ms: u64,
    #[serde(default)]
    pub sticky_header: StickyHeaderConfig,
    #[serde(default)]
    pub filter_popover: FilterPopoverConfig,
    #[serde(default)]
    pub chrome: ChromeConfig,
    #[serde(default)]
    pub screen: ScreenBreakpoints,
    #[serde(default)]
    pub theme: ThemeName,
    /// Key string to action, layered over the built-in bindings
    #[serde(default)]
    pub keybindings: HashMap<String, Action>,
}

fn default_tick_rate_ms() -> u64 {
    250
}

fn default_frame_rate_ms() -> u64 {
    50
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            api_base_url: String::new(),
            download_dir: PathBuf::new(),
            tick_rate_ms: default_tick_rate_ms(),
            frame_rate_ms: default_frame_rate_ms(),
            sticky_header: StickyHeaderConfig::default(),
            filter_popover: FilterPopoverConfig::default(),
            chrome: ChromeConfig::default(),
            screen: ScreenBreakpoints::default(),
            theme: ThemeName::default(),
            keybindings: HashMap::new(),
        }
    }
}

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref DATA_FOLDER: Option<PathBuf> =
        env::var(format!("{}_DATA", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
    pub static ref CONFIG_FOLDER: Option<PathBuf> =
        env::var(format!("{}_CONFIG", PROJECT_NAME.clone()))
            .ok()
            .map(PathBuf::from);
}

impl Config {
    /// Load the embedded defaults layered with the user's file.
    ///
    /// Without an explicit path the file at `~/.riskboard-config.json5` is
    /// used, and written from the defaults if it does not exist yet.
    pub fn from_path(config_path: Option<&PathBuf>) -> Result<Self, config::ConfigError> {
        let data_dir = get_data_dir();
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().into_owned())?
            .set_default("config_dir", config_dir.to_string_lossy().into_owned())?
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        let selected_path = if let Some(p) = config_path {
            expand_tilde(p)
        } else {
            let home_cfg = default_home_config_path();
            if !home_cfg.exists() {
                if let Some(parent) = home_cfg.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(&home_cfg, CONFIG);
            }
            home_cfg
        };

        builder = builder.add_source(
            config::File::from(selected_path)
                .format(config::FileFormat::Json5)
                .required(config_path.is_some()),
        );

        let mut cfg: Self = builder.build()?.try_deserialize()?;
        cfg.api_base_url = cfg.api_base_url.trim().trim_end_matches('/').to_string();
        if cfg.download_dir.as_os_str().is_empty() {
            cfg.download_dir = cfg.config.data_dir.join("downloads");
        } else {
            cfg.download_dir = expand_tilde(&cfg.download_dir);
        }
        Ok(cfg)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn frame_rate(&self) -> Duration {
        Duration::from_millis(self.frame_rate_ms.max(1))
    }

    /// Built-in key bindings with the configured overrides applied
    pub fn key_bindings(&self) -> KeyBindings {
        KeyBindings::default().with_overrides(&self.keybindings)
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Some(s) = path.to_str() {
        if s.starts_with('~') {
            if let Some(base) = BaseDirs::new() {
                return PathBuf::from(s.replacen('~', &base.home_dir().to_string_lossy(), 1));
            }
        }
    }
    path.clone()
}

fn default_home_config_path() -> PathBuf {
    if let Some(base) = BaseDirs::new() {
        return base.home_dir().join(".riskboard-config.json5");
    }
    PathBuf::from(".riskboard-config.json5")
}

pub fn get_data_dir() -> PathBuf {
    if let Some(s) = DATA_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn get_config_dir() -> PathBuf {
    if let Some(s) = CONFIG_FOLDER.clone() {
        s
    } else {
        PathBuf::from(".").join(".config")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_embedded_defaults_parse() {
        let cfg: Config = json5::from_str(CONFIG).unwrap();
        assert_eq!(cfg.tick_rate_ms, 250);
        assert_eq!(cfg.filter_popover.settle_delay_ms, 240);
        assert_eq!(cfg.sticky_header.tolerance, 0.5);
        assert_eq!(cfg.theme, ThemeName::Dark);
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riskboard.json5");
        fs::write(
            &path,
            r#"{
                api_base_url: "http://localhost:8000//",
                theme: "light",
                download_dir: "/tmp/reports",
                keybindings: { "x": "OpenFilter" },
            }"#,
        )
        .unwrap();

        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(cfg.api_base_url, "http://localhost:8000");
        assert_eq!(cfg.theme, ThemeName::Light);
        assert_eq!(cfg.download_dir, PathBuf::from("/tmp/reports"));
        // untouched values come from the embedded file
        assert_eq!(cfg.tick_rate_ms, 250);

        let bindings = cfg.key_bindings();
        let x = crossterm::event::KeyEvent::new(
            crossterm::event::KeyCode::Char('x'),
            crossterm::event::KeyModifiers::NONE,
        );
        assert_eq!(bindings.get_action(&x), Some(Action::OpenFilter));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json5");
        assert!(Config::from_path(Some(&path)).is_err());
    }

    #[test]
    fn test_download_dir_defaults_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json5");
        fs::write(&path, "{}").unwrap();
        let cfg = Config::from_path(Some(&path)).unwrap();
        assert_eq!(cfg.download_dir, cfg.config.data_dir.join("downloads"));
    }
}
