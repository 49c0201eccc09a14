//! Agency branding and pricing, written through to a key/value store on
//! every change.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde_json::Value;

use crate::errors::{QuotationError, Result};
use crate::models::pricing::{AgencySettings, AgencySettingsPatch, PricingConfiguration, PricingPatch};

pub trait SettingsStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// One JSON file per key inside a directory.
pub struct FileSettingsStorage {
    dir: PathBuf,
}

impl FileSettingsStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            QuotationError::Storage(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Lowercase ASCII letters, digits and `-` are kept; every other byte is
/// written as `_` plus two hex digits, so distinct keys never share a file.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => stem.push(char::from(byte)),
            _ => stem.push_str(&format!("_{:02x}", byte)),
        }
    }
    stem
}

impl SettingsStorage for FileSettingsStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QuotationError::Storage(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| QuotationError::Storage(format!("cannot write {}: {}", path.display(), e)))
    }
}

#[derive(Default)]
pub struct MemorySettingsStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySettingsStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStorage for MemorySettingsStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| QuotationError::Storage("settings lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| QuotationError::Storage("settings lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub fn settings_key(agency_id: &str) -> String {
    format!("agency_settings:{}", agency_id)
}

pub struct AgencySettingsStore {
    storage: Arc<dyn SettingsStorage>,
    key: String,
    settings: AgencySettings,
}

impl AgencySettingsStore {
    /// Never fails: missing or unreadable data falls back to defaults, and
    /// fields absent from older stored objects are filled from defaults.
    pub fn load(storage: Arc<dyn SettingsStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let settings = match storage.read(&key) {
            Ok(Some(raw)) => parse_with_defaults(&key, &raw),
            Ok(None) => AgencySettings::default(),
            Err(e) => {
                warn!("Falling back to default settings for {}: {}", key, e);
                AgencySettings::default()
            }
        };
        Self {
            storage,
            key,
            settings,
        }
    }

    pub fn settings(&self) -> &AgencySettings {
        &self.settings
    }

    pub fn pricing(&self) -> &PricingConfiguration {
        &self.settings.pricing
    }

    pub fn update_agency_settings(&mut self, patch: AgencySettingsPatch) -> Result<&AgencySettings> {
        let mut next = self.settings.clone();
        next.apply(patch)?;
        self.commit(next)
    }

    pub fn update_pricing(&mut self, patch: PricingPatch) -> Result<&PricingConfiguration> {
        let mut next = self.settings.clone();
        next.pricing.apply(patch);
        next.pricing.validate()?;
        self.commit(next)?;
        Ok(&self.settings.pricing)
    }

    // Persist first; in-memory state only changes once the write succeeded.
    fn commit(&mut self, next: AgencySettings) -> Result<&AgencySettings> {
        let raw = serde_json::to_string(&next)
            .map_err(|e| QuotationError::Storage(format!("cannot encode settings: {}", e)))?;
        self.storage.write(&self.key, &raw)?;
        info!("Saved agency settings under {}", self.key);
        self.settings = next;
        Ok(&self.settings)
    }
}

fn parse_with_defaults(key: &str, raw: &str) -> AgencySettings {
    let stored: Value = match serde_json::from_str(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => {
            warn!("Stored settings for {} are malformed, using defaults", key);
            return AgencySettings::default();
        }
    };

    let mut merged = match serde_json::to_value(AgencySettings::default()) {
        Ok(value) => value,
        Err(_) => return AgencySettings::default(),
    };
    merge_over(&mut merged, stored);

    serde_json::from_value(merged).unwrap_or_else(|e| {
        warn!("Stored settings for {} do not fit the schema ({}), using defaults", key, e);
        AgencySettings::default()
    })
}

/// Overlays `stored` onto `base`, recursing into objects. Nulls in `stored`
/// keep the base value.
fn merge_over(base: &mut Value, stored: Value) {
    match (base, stored) {
        (Value::Object(base_map), Value::Object(stored_map)) => {
            for (field, value) in stored_map {
                match base_map.get_mut(&field) {
                    Some(existing) => merge_over(existing, value),
                    None => {
                        base_map.insert(field, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}
