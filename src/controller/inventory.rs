//! Controller inventory
//!
//! Two ways of getting the controllers for a launch:
//!
//! 1. [`load_inventory`] - the frontend writes a TOML inventory with device
//!    identity, indices and the per-action bindings it recorded.
//! 2. [`probe_gamepads`] - ask gilrs for connected pads and assume the
//!    standard SDL gamepad layout for their bindings.

use super::device::{
    Controller, DeviceClass, InputConfig, LogicalAction, PhysicalInput, Vendor,
};
use gilrs::Gilrs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Failed to read inventory {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse inventory: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to probe gamepads: {0}")]
    Probe(String),
}

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default, rename = "controller")]
    controllers: Vec<InventoryEntry>,
}

#[derive(Debug, Deserialize)]
struct InventoryEntry {
    device_path: String,
    name: String,
    #[serde(default)]
    vendor_id: u16,
    product_id: Option<u16>,
    player: u8,
    directinput_index: Option<u32>,
    xinput_index: Option<u32>,
    sdl_index: Option<u32>,
    #[serde(default)]
    keyboard: bool,
    #[serde(default)]
    class: DeviceClass,
    #[serde(default)]
    bindings: BTreeMap<String, PhysicalInput>,
}

impl From<InventoryEntry> for Controller {
    fn from(entry: InventoryEntry) -> Self {
        let mut input = InputConfig::new();
        for (name, physical) in entry.bindings {
            match LogicalAction::from_str(&name) {
                Ok(action) => {
                    input.bind(action, physical);
                }
                Err(_) => warn!(
                    "Ignoring unknown action '{}' on controller {}",
                    name, entry.name
                ),
            }
        }
        input.complete_analog_opposites();

        Controller {
            device_path: entry.device_path,
            name: entry.name,
            vendor: Vendor::from_usb_id(entry.vendor_id),
            product_id: entry.product_id,
            player: entry.player,
            directinput_index: entry.directinput_index,
            xinput_index: entry.xinput_index,
            sdl_index: entry.sdl_index,
            is_keyboard: entry.keyboard,
            device_class: entry.class,
            input,
        }
    }
}

/// Parses an inventory document; controllers come back sorted by player.
pub fn parse_inventory(content: &str) -> Result<Vec<Controller>, InventoryError> {
    let file: InventoryFile = toml::from_str(content)?;
    let mut controllers: Vec<Controller> = file.controllers.into_iter().map(Controller::from).collect();
    controllers.sort_by_key(|c| c.player);
    debug!("Parsed {} controllers from inventory", controllers.len());
    Ok(controllers)
}

pub fn load_inventory(path: &Path) -> Result<Vec<Controller>, InventoryError> {
    let content = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let controllers = parse_inventory(&content)?;
    info!(
        "Loaded {} controllers from {}",
        controllers.len(),
        path.display()
    );
    Ok(controllers)
}

/// Bindings of the SDL game controller layout gilrs normalizes every pad to
pub fn standard_layout() -> InputConfig {
    use LogicalAction::*;
    let mut input: InputConfig = [
        (A, PhysicalInput::button(0)),
        (B, PhysicalInput::button(1)),
        (X, PhysicalInput::button(2)),
        (Y, PhysicalInput::button(3)),
        (Select, PhysicalInput::button(4)),
        (Hotkey, PhysicalInput::button(5)),
        (Start, PhysicalInput::button(6)),
        (L3, PhysicalInput::button(7)),
        (R3, PhysicalInput::button(8)),
        (PageUp, PhysicalInput::button(9)),
        (PageDown, PhysicalInput::button(10)),
        (Up, PhysicalInput::button(11)),
        (Down, PhysicalInput::button(12)),
        (Left, PhysicalInput::button(13)),
        (Right, PhysicalInput::button(14)),
        (LeftAnalogLeft, PhysicalInput::axis(0, -1)),
        (LeftAnalogUp, PhysicalInput::axis(1, -1)),
        (RightAnalogLeft, PhysicalInput::axis(2, -1)),
        (RightAnalogUp, PhysicalInput::axis(3, -1)),
        (L2, PhysicalInput::axis(4, 1)),
        (R2, PhysicalInput::axis(5, 1)),
    ]
    .into_iter()
    .collect();
    input.complete_analog_opposites();
    input
}

/// Enumerates connected gamepads through gilrs.
///
/// Players are assigned in enumeration order; the SDL index is the same
/// order. XInput/DirectInput numbering is unknown at this level.
pub fn probe_gamepads() -> Result<Vec<Controller>, InventoryError> {
    info!("Initializing gilrs controller interface");
    let gilrs = Gilrs::new().map_err(|e| InventoryError::Probe(e.to_string()))?;

    let mut controllers = Vec::new();
    for (slot, (id, gamepad)) in gilrs.gamepads().filter(|(_, g)| g.is_connected()).enumerate() {
        let uuid: String = gamepad.uuid().iter().map(|b| format!("{:02x}", b)).collect();
        let player = u8::try_from(slot + 1).unwrap_or(u8::MAX);
        info!(
            "  [{}] ID: {}, Name: {}, UUID: {}",
            slot,
            id,
            gamepad.name(),
            uuid
        );

        let mut controller = Controller::new(format!("gilrs:{}", uuid), gamepad.name(), player)
            .with_vendor(gamepad.vendor_id().map(Vendor::from_usb_id).unwrap_or_default())
            .with_indices(None, None, u32::try_from(slot).ok())
            .with_input(standard_layout());
        controller.product_id = gamepad.product_id();
        controllers.push(controller);
    }

    if controllers.is_empty() {
        warn!("No gamepad connected");
    }
    Ok(controllers)
}
