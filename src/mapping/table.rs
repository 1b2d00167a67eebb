//! Declarative mapping tables
//!
//! Each emulator ships one TOML resource. Every top-level table in it is a
//! named entry mapping logical actions to the emulator-side input they
//! drive, plus the list of actions whose axis sign is reverted:
//!
//! ```toml
//! [default_arcade]
//! revert = ["rightanalogup"]
//!
//! [default_arcade.targets]
//! a = "P{n}_BUTTON1"
//! up = "P{n}_JOYSTICK_UP"
//! ```
//!
//! Entry lookup follows a fallback chain, first match wins:
//!
//! ```text
//! <rom> ──► default_<system> ──► default_<emulator> ──► default
//! ```
//!
//! Device classes other than gamepads may have their own `class_<class>`
//! entry which replaces the chain entirely.
//!
//! Tables are collected with [`MappingRegistryBuilder`] and frozen into a
//! [`MappingRegistry`]; nothing mutates a registry after `build()`.

use super::error::MappingError;
use crate::controller::{DeviceClass, LogicalAction};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, error, info, warn};

const BUILTIN_TABLES: &[(&str, &str)] = &[
    (
        "retroarch",
        include_str!("../../resources/mappings/retroarch.toml"),
    ),
    ("mame", include_str!("../../resources/mappings/mame.toml")),
    (
        "dolphin",
        include_str!("../../resources/mappings/dolphin.toml"),
    ),
    ("epsxe", include_str!("../../resources/mappings/epsxe.toml")),
];

/// One named entry of a table: logical action → target token
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Mapping {
    #[serde(default)]
    targets: BTreeMap<LogicalAction, String>,
    #[serde(default)]
    revert: BTreeSet<LogicalAction>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, action: LogicalAction, target: impl Into<String>) -> Self {
        self.targets.insert(action, target.into());
        self
    }

    pub fn with_revert(mut self, action: LogicalAction) -> Self {
        self.revert.insert(action);
        self
    }

    pub fn target(&self, action: LogicalAction) -> Option<&str> {
        self.targets.get(&action).map(String::as_str)
    }

    /// Whether the axis sign of this action is inverted in this table
    pub fn is_reverted(&self, action: LogicalAction) -> bool {
        self.revert.contains(&action)
    }

    /// Actions in a stable order
    pub fn iter(&self) -> impl Iterator<Item = (LogicalAction, &str)> {
        self.targets.iter().map(|(action, target)| (*action, target.as_str()))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// All entries of one emulator resource
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, Mapping>,
}

impl MappingTable {
    pub fn parse(emulator: &str, content: &str) -> Result<Self, MappingError> {
        let entries: HashMap<String, Mapping> =
            toml::from_str(content).map_err(|e| MappingError::MappingResourceParse {
                emulator: emulator.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    pub fn entry(&self, name: &str) -> Option<&Mapping> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn merge(&mut self, other: MappingTable) {
        self.entries.extend(other.entries);
    }
}

/// Collects table resources before freezing them
#[derive(Debug, Default)]
pub struct MappingRegistryBuilder {
    tables: HashMap<String, MappingTable>,
}

impl MappingRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the tables embedded in the binary
    pub fn with_builtin(mut self) -> Result<Self, MappingError> {
        for (emulator, content) in BUILTIN_TABLES {
            self = self.with_source(emulator, content)?;
        }
        Ok(self)
    }

    /// Adds or merges one resource; entries with the same name replace earlier ones
    pub fn with_source(mut self, emulator: &str, content: &str) -> Result<Self, MappingError> {
        let table = MappingTable::parse(emulator, content)?;
        self.insert(emulator, table);
        Ok(self)
    }

    fn insert(&mut self, emulator: &str, table: MappingTable) {
        debug!("Loaded {} mapping entries for {}", table.len(), emulator);
        self.tables
            .entry(emulator.to_lowercase())
            .or_default()
            .merge(table);
    }

    /// Merges every `<emulator>.toml` of a user override directory.
    ///
    /// A missing directory is not an error. An unreadable or broken file is
    /// logged and skipped, so that emulator keeps its embedded table.
    pub fn with_override_dir(mut self, dir: &Path) -> Self {
        let read_dir = match std::fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                warn!("Mapping override directory {} unavailable: {}", dir.display(), e);
                return self;
            }
        };

        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
                continue;
            }
            let Some(emulator) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    error!("Skipping unreadable mapping override {}: {}", path.display(), e);
                    continue;
                }
            };
            match MappingTable::parse(emulator, &content) {
                Ok(table) => {
                    info!("Applying mapping overrides from {}", path.display());
                    self.insert(emulator, table);
                }
                Err(e) => error!("Skipping mapping override {}: {}", path.display(), e),
            }
        }
        self
    }

    pub fn build(self) -> MappingRegistry {
        MappingRegistry {
            tables: self.tables,
        }
    }
}

/// Frozen set of mapping tables, shared by reference during a run
#[derive(Debug, Default)]
pub struct MappingRegistry {
    tables: HashMap<String, MappingTable>,
}

impl MappingRegistry {
    pub fn builder() -> MappingRegistryBuilder {
        MappingRegistryBuilder::new()
    }

    pub fn builtin() -> Result<Self, MappingError> {
        Ok(MappingRegistryBuilder::new().with_builtin()?.build())
    }

    pub fn table(&self, emulator: &str) -> Option<&MappingTable> {
        self.tables.get(&emulator.to_lowercase())
    }

    /// Selects the entry for a game through the fallback chain.
    pub fn load(&self, emulator: &str, system: &str, rom: &str) -> Result<&Mapping, MappingError> {
        let table = self
            .table(emulator)
            .ok_or_else(|| MappingError::MappingResourceMissing {
                emulator: emulator.to_string(),
                reason: "no mapping table".to_string(),
            })?;

        let chain = fallback_chain(emulator, system, rom);
        for name in &chain {
            if let Some(mapping) = table.entry(name) {
                debug!("Using mapping entry '{}' for {}", name, emulator);
                return Ok(mapping);
            }
        }

        Err(MappingError::MappingResourceMissing {
            emulator: emulator.to_string(),
            reason: format!("no entry among {:?}", chain),
        })
    }

    /// Entry replacing the chain for non-gamepad devices, if the table has one
    pub fn load_for_class(&self, emulator: &str, class: DeviceClass) -> Option<&Mapping> {
        if class == DeviceClass::Gamepad {
            return None;
        }
        self.table(emulator)?.entry(&format!("class_{}", class))
    }
}

fn fallback_chain(emulator: &str, system: &str, rom: &str) -> Vec<String> {
    let mut chain = Vec::with_capacity(4);
    let rom = rom.trim().to_lowercase();
    if !rom.is_empty() {
        chain.push(rom);
    }
    let system = system.trim().to_lowercase();
    if !system.is_empty() {
        chain.push(format!("default_{}", system));
    }
    chain.push(format!("default_{}", emulator.to_lowercase()));
    chain.push("default".to_string());
    chain.dedup();
    chain
}
