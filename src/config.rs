//! Settings from an optional `config.toml`.
//!
//! Looked up next to the executable, then in the working directory. Missing
//! keys, a missing file or a broken file all fall back to built-in defaults.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::game::layout::Bounds;

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub rules: Rules,
    pub files: FileConfig,
}

#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub width: i32,
    pub height: i32,
    pub fps: u32,
}

/// Everything the session needs to judge and time the game.
#[derive(Clone, Debug)]
pub struct Rules {
    pub max_mistakes: u32,
    pub flash: Duration,
    pub toast: Duration,
    pub mistake_toast: Duration,
    pub debug_toast: Duration,
    pub door: Bounds,
}

impl Default for Rules {
    fn default() -> Self {
        let door = TomlDoor::default();
        Rules {
            max_mistakes: default_max_mistakes(),
            flash: Duration::from_millis(default_flash_ms()),
            toast: Duration::from_millis(default_toast_ms()),
            mistake_toast: Duration::from_millis(default_mistake_toast_ms()),
            debug_toast: Duration::from_millis(default_debug_toast_ms()),
            door: Bounds::new(door.x, door.y, door.w, door.h),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FileConfig {
    pub catalog: PathBuf,
    pub save: PathBuf,
    pub pictures: PathBuf,
    pub background: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    window: TomlWindow,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    door: TomlDoor,
    #[serde(default)]
    files: TomlFiles,
}

#[derive(Deserialize, Debug)]
struct TomlWindow {
    #[serde(default = "default_width")]
    width: i32,
    #[serde(default = "default_height")]
    height: i32,
    #[serde(default = "default_fps")]
    fps: u32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_max_mistakes")]
    max_mistakes: u32,
    #[serde(default = "default_flash_ms")]
    flash_ms: u64,
    #[serde(default = "default_toast_ms")]
    toast_ms: u64,
    #[serde(default = "default_mistake_toast_ms")]
    mistake_toast_ms: u64,
    #[serde(default = "default_debug_toast_ms")]
    debug_toast_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlDoor {
    #[serde(default = "default_door_x")]
    x: i32,
    #[serde(default = "default_door_y")]
    y: i32,
    #[serde(default = "default_door_w")]
    w: i32,
    #[serde(default = "default_door_h")]
    h: i32,
}

#[derive(Deserialize, Debug)]
struct TomlFiles {
    #[serde(default = "default_catalog")]
    catalog: String,
    #[serde(default = "default_save")]
    save: String,
    #[serde(default = "default_pictures")]
    pictures: String,
    #[serde(default = "default_background")]
    background: String,
}

// ── Defaults ──

fn default_width() -> i32 { 800 }
fn default_height() -> i32 { 600 }
fn default_fps() -> u32 { 60 }
fn default_max_mistakes() -> u32 { 3 }
fn default_flash_ms() -> u64 { 650 }
fn default_toast_ms() -> u64 { 1500 }
fn default_mistake_toast_ms() -> u64 { 1300 }
fn default_debug_toast_ms() -> u64 { 900 }
fn default_door_x() -> i32 { 690 }
fn default_door_y() -> i32 { 145 }
fn default_door_w() -> i32 { 90 }
fn default_door_h() -> i32 { 330 }
fn default_catalog() -> String { "kusimused.json".into() }
fn default_save() -> String { "salvestus.json".into() }
fn default_pictures() -> String { "pildid".into() }
fn default_background() -> String { "pildid/background.png".into() }

impl Default for TomlWindow {
    fn default() -> Self {
        TomlWindow {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            max_mistakes: default_max_mistakes(),
            flash_ms: default_flash_ms(),
            toast_ms: default_toast_ms(),
            mistake_toast_ms: default_mistake_toast_ms(),
            debug_toast_ms: default_debug_toast_ms(),
        }
    }
}

impl Default for TomlDoor {
    fn default() -> Self {
        TomlDoor {
            x: default_door_x(),
            y: default_door_y(),
            w: default_door_w(),
            h: default_door_h(),
        }
    }
}

impl Default for TomlFiles {
    fn default() -> Self {
        TomlFiles {
            catalog: default_catalog(),
            save: default_save(),
            pictures: default_pictures(),
            background: default_background(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        load_from(&candidate_dirs())
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Self::from_toml)
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            window: WindowConfig {
                width: cfg.window.width.max(1),
                height: cfg.window.height.max(1),
                fps: cfg.window.fps.max(1),
            },
            rules: Rules {
                max_mistakes: cfg.rules.max_mistakes.max(1),
                flash: Duration::from_millis(cfg.rules.flash_ms),
                toast: Duration::from_millis(cfg.rules.toast_ms),
                mistake_toast: Duration::from_millis(cfg.rules.mistake_toast_ms),
                debug_toast: Duration::from_millis(cfg.rules.debug_toast_ms),
                door: Bounds::new(cfg.door.x, cfg.door.y, cfg.door.w, cfg.door.h),
            },
            files: FileConfig {
                catalog: PathBuf::from(cfg.files.catalog),
                save: PathBuf::from(cfg.files.save),
                pictures: PathBuf::from(cfg.files.pictures),
                background: PathBuf::from(cfg.files.background),
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

const CONFIG_FILE: &str = "config.toml";

/// Where to look for `config.toml`: the directory of the real binary, then
/// the working directory when that is somewhere else.
fn candidate_dirs() -> Vec<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .map(|exe| exe.canonicalize().unwrap_or(exe))
        .and_then(|exe| exe.parent().map(Path::to_path_buf));

    let mut dirs: Vec<PathBuf> = exe_dir.into_iter().chain(std::env::current_dir().ok()).collect();
    dirs.dedup();
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

fn load_from(search_dirs: &[PathBuf]) -> GameConfig {
    let Some(dir) = search_dirs.iter().find(|d| d.join(CONFIG_FILE).is_file()) else {
        log::info!("no {CONFIG_FILE} found, using built-in settings");
        return GameConfig::default();
    };
    let path = dir.join(CONFIG_FILE);

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("could not read {}, using built-in settings: {e}", path.display());
            return GameConfig::default();
        }
    };
    match GameConfig::parse(&text) {
        Ok(mut cfg) => {
            log::info!("loaded {}", path.display());
            cfg.files.prefer_dir(dir);
            cfg
        }
        Err(e) => {
            log::warn!("{} has errors, using built-in settings: {e}", path.display());
            GameConfig::default()
        }
    }
}

impl FileConfig {
    /// Game data shipped next to the config wins over the working directory.
    /// The save file is left alone so progress stays where the player runs
    /// the game.
    fn prefer_dir(&mut self, dir: &Path) {
        for path in [&mut self.catalog, &mut self.pictures, &mut self.background] {
            if path.is_relative() {
                let candidate = dir.join(&*path);
                if candidate.exists() {
                    *path = candidate;
                }
            }
        }
    }
}
