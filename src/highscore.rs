//! High score persistence
//!
//! A single numeric best score, read once at session construction and
//! written through a key-value store on every new best. The store itself
//! (LocalStorage, a file, a test map) belongs to the host.

use std::collections::HashMap;

/// Key-value persistence seen from the sim side.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-process store for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// Best score across sessions
#[derive(Debug, Clone)]
pub struct HighScore {
    best: u64,
}

impl HighScore {
    /// Store key for the persisted value
    const STORAGE_KEY: &'static str = "fruit_rush_highscore";

    /// Read the persisted best, or start from zero.
    pub fn load(store: &dyn ScoreStore) -> Self {
        if let Some(raw) = store.get(Self::STORAGE_KEY) {
            if let Ok(best) = serde_json::from_str::<u64>(&raw) {
                log::info!("Loaded high score {best}");
                return Self { best };
            }
            log::warn!("Stored high score {raw:?} unreadable, starting fresh");
        }
        Self { best: 0 }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Record a finished score. Persists and returns true on a new best.
    pub fn submit(&mut self, score: u64, store: &mut dyn ScoreStore) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Ok(json) = serde_json::to_string(&score) {
            store.set(Self::STORAGE_KEY, &json);
            log::info!("High score saved ({score})");
        }
        true
    }
}
