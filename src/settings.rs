//! Menu settings and their persistence
//!
//! Saved as a small JSON record in a key-value store (LocalStorage on the web, a
//! directory of files natively). A record that fails validation is discarded and
//! treated as "no saved settings".

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_PLAYERS, MIN_HUMANS};
use crate::sim::GameMode;
use crate::tuning::SPHERE_SIZE_PRESETS;

/// Storage key for the menu record
pub const STORAGE_KEY: &str = "achtung-die-kugel.menu-settings.v1";

/// Errors from loading or saving settings
#[derive(Debug)]
pub enum SettingsError {
    Malformed(serde_json::Error),
    HumansOutOfRange(i64),
    BotsOutOfRange { bots: i64, max: i64 },
    SphereSizeOutOfRange(i64),
    Storage(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Malformed(e) => write!(f, "Malformed settings record: {e}"),
            SettingsError::HumansOutOfRange(n) => {
                write!(f, "Human count {n} outside {MIN_HUMANS}..={MAX_PLAYERS}")
            }
            SettingsError::BotsOutOfRange { bots, max } => {
                write!(f, "Bot count {bots} outside 0..={max}")
            }
            SettingsError::SphereSizeOutOfRange(n) => {
                write!(f, "Sphere size class {n} outside 0..={}", SPHERE_SIZE_PRESETS.len())
            }
            SettingsError::Storage(msg) => write!(f, "Settings storage failed: {msg}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Malformed(e)
    }
}

/// Options picked in the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSettings {
    /// 1..=4
    pub humans: u8,
    /// 0..=4-humans
    pub bots: u8,
    /// 0 = auto-scaled by player count, 1..=9 = fixed preset
    pub sphere_size: u8,
    /// Respawn instead of elimination rounds
    pub continuous: bool,
    /// Dash ability enabled
    pub jump_mode: bool,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            humans: 2,
            bots: 0,
            sphere_size: 0,
            continuous: false,
            jump_mode: false,
        }
    }
}

/// Record as it may appear in storage, before range checks
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMenuSettings {
    humans: i64,
    bots: i64,
    #[serde(default)]
    sphere_size: i64,
    #[serde(default)]
    continuous: bool,
    #[serde(default)]
    jump_mode: bool,
}

impl MenuSettings {
    pub fn player_count(&self) -> usize {
        self.humans as usize + self.bots as usize
    }

    pub fn mode(&self) -> GameMode {
        if self.continuous {
            GameMode::Continuous
        } else {
            GameMode::Elimination
        }
    }

    /// Most bots allowed alongside the current humans
    pub fn max_bots(&self) -> u8 {
        (MAX_PLAYERS as u8).saturating_sub(self.humans)
    }

    /// Check ranges: humans 1..=4, bots 0..=4-humans, size class 0..=9
    pub fn validate(&self) -> Result<(), SettingsError> {
        Self::check(self.humans as i64, self.bots as i64, self.sphere_size as i64)
    }

    fn check(humans: i64, bots: i64, sphere_size: i64) -> Result<(), SettingsError> {
        if !(MIN_HUMANS as i64..=MAX_PLAYERS as i64).contains(&humans) {
            return Err(SettingsError::HumansOutOfRange(humans));
        }
        let max = MAX_PLAYERS as i64 - humans;
        if !(0..=max).contains(&bots) {
            return Err(SettingsError::BotsOutOfRange { bots, max });
        }
        if !(0..=SPHERE_SIZE_PRESETS.len() as i64).contains(&sphere_size) {
            return Err(SettingsError::SphereSizeOutOfRange(sphere_size));
        }
        Ok(())
    }

    /// Parse and validate a stored record
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let raw: RawMenuSettings = serde_json::from_str(json)?;
        Self::check(raw.humans, raw.bots, raw.sphere_size)?;
        Ok(Self {
            humans: raw.humans as u8,
            bots: raw.bots as u8,
            sphere_size: raw.sphere_size as u8,
            continuous: raw.continuous,
            jump_mode: raw.jump_mode,
        })
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Load saved settings. Missing or invalid records yield `None`.
    pub fn load(store: &dyn SettingsStore) -> Option<Self> {
        let json = store.get_item(STORAGE_KEY)?;
        match Self::from_json(&json) {
            Ok(settings) => {
                log::info!("Loaded menu settings");
                Some(settings)
            }
            Err(e) => {
                log::warn!("Discarding saved menu settings: {e}");
                None
            }
        }
    }

    /// Persist valid settings; storage failures are logged and ignored
    pub fn save(&self, store: &mut dyn SettingsStore) {
        let result = self
            .to_json()
            .and_then(|json| store.set_item(STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Menu settings saved"),
            Err(e) => log::warn!("Menu settings not saved: {e}"),
        }
    }
}

/// Key-value storage for small JSON records
pub trait SettingsStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// In-memory store (tests, embedding)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        std::fs::create_dir_all(&self.dir)
            .and_then(|_| std::fs::write(self.path_for(key), value))
            .map_err(|e| SettingsError::Storage(e.to_string()))
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// `None` when storage is unavailable (private mode, sandboxed frames)
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()?;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl SettingsStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| SettingsError::Storage(format!("{e:?}")))
    }
}
