//! Controller device model
//!
//! Describes a physical controller as the frontend enumerated it: identity,
//! vendor, the per-technology device indices and the binding of every
//! logical action to a physical button, axis or hat.
//!
//! # Lifecycle
//!
//! ```text
//! Inventory / gilrs probe ──► Controller (read-only) ──► Classifier ──► Resolver
//! ```
//!
//! Controllers are built once per launcher run and never mutated while a
//! mapping pass reads them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Abstract input concept independent of controller and emulator naming
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogicalAction {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    X,
    Y,
    PageUp,
    PageDown,
    L2,
    R2,
    L3,
    R3,
    Start,
    Select,
    Hotkey,
    LeftAnalogUp,
    LeftAnalogDown,
    LeftAnalogLeft,
    LeftAnalogRight,
    RightAnalogUp,
    RightAnalogDown,
    RightAnalogLeft,
    RightAnalogRight,
}

impl LogicalAction {
    /// Opposite direction on the same analog stick.
    ///
    /// Frontends usually only record the up/left deflection of each stick;
    /// the down/right binding is the same axis with the other sign.
    pub fn analog_opposite(&self) -> Option<LogicalAction> {
        use LogicalAction::*;
        match self {
            LeftAnalogUp => Some(LeftAnalogDown),
            LeftAnalogDown => Some(LeftAnalogUp),
            LeftAnalogLeft => Some(LeftAnalogRight),
            LeftAnalogRight => Some(LeftAnalogLeft),
            RightAnalogUp => Some(RightAnalogDown),
            RightAnalogDown => Some(RightAnalogUp),
            RightAnalogLeft => Some(RightAnalogRight),
            RightAnalogRight => Some(RightAnalogLeft),
            _ => None,
        }
    }
}

/// Kind of physical input a logical action is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Button,
    Axis,
    Hat,
    /// Keyboard key, only meaningful for keyboard players
    Key,
    /// Anything the enumeration layer reported that we do not understand
    #[serde(other)]
    Unknown,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Button => write!(f, "button"),
            InputKind::Axis => write!(f, "axis"),
            InputKind::Hat => write!(f, "hat"),
            InputKind::Key => write!(f, "key"),
            InputKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Physical input descriptor: `{type, id, value}`
///
/// `value` carries the axis deflection sign observed at bind time, or the
/// hat direction bitmask. It is ignored for buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalInput {
    #[serde(rename = "type")]
    pub kind: InputKind,
    pub id: u32,
    #[serde(default)]
    pub value: i32,
}

impl PhysicalInput {
    pub const fn button(id: u32) -> Self {
        Self {
            kind: InputKind::Button,
            id,
            value: 1,
        }
    }

    pub const fn axis(id: u32, value: i32) -> Self {
        Self {
            kind: InputKind::Axis,
            id,
            value,
        }
    }

    pub const fn hat(id: u32, mask: i32) -> Self {
        Self {
            kind: InputKind::Hat,
            id,
            value: mask,
        }
    }
}

/// Binding table of one controller
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputConfig {
    bindings: BTreeMap<LogicalAction, PhysicalInput>,
}

impl InputConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, action: LogicalAction, input: PhysicalInput) -> &mut Self {
        self.bindings.insert(action, input);
        self
    }

    pub fn get(&self, action: LogicalAction) -> Option<&PhysicalInput> {
        self.bindings.get(&action)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LogicalAction, &PhysicalInput)> {
        self.bindings.iter()
    }

    /// Fills in missing analog directions from their bound opposite.
    ///
    /// Only axis descriptors are mirrored; an existing binding always wins.
    pub fn complete_analog_opposites(&mut self) {
        let mirrored: Vec<(LogicalAction, PhysicalInput)> = self
            .bindings
            .iter()
            .filter(|(_, input)| input.kind == InputKind::Axis)
            .filter_map(|(action, input)| {
                let opposite = action.analog_opposite()?;
                if self.bindings.contains_key(&opposite) {
                    return None;
                }
                Some((opposite, PhysicalInput::axis(input.id, -input.value)))
            })
            .collect();

        for (action, input) in mirrored {
            self.bindings.insert(action, input);
        }
    }
}

impl FromIterator<(LogicalAction, PhysicalInput)> for InputConfig {
    fn from_iter<T: IntoIterator<Item = (LogicalAction, PhysicalInput)>>(iter: T) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// Controller manufacturer as far as the launcher cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Vendor {
    Microsoft,
    Sony,
    Nintendo,
    Logitech,
    Thrustmaster,
    Other(u16),
    #[default]
    Unknown,
}

impl Vendor {
    pub const MICROSOFT_ID: u16 = 0x045E;
    pub const SONY_ID: u16 = 0x054C;
    pub const NINTENDO_ID: u16 = 0x057E;
    pub const LOGITECH_ID: u16 = 0x046D;
    pub const THRUSTMASTER_ID: u16 = 0x044F;

    pub fn from_usb_id(id: u16) -> Self {
        match id {
            Self::MICROSOFT_ID => Vendor::Microsoft,
            Self::SONY_ID => Vendor::Sony,
            Self::NINTENDO_ID => Vendor::Nintendo,
            Self::LOGITECH_ID => Vendor::Logitech,
            Self::THRUSTMASTER_ID => Vendor::Thrustmaster,
            0 => Vendor::Unknown,
            other => Vendor::Other(other),
        }
    }

    pub fn usb_id(&self) -> Option<u16> {
        match self {
            Vendor::Microsoft => Some(Self::MICROSOFT_ID),
            Vendor::Sony => Some(Self::SONY_ID),
            Vendor::Nintendo => Some(Self::NINTENDO_ID),
            Vendor::Logitech => Some(Self::LOGITECH_ID),
            Vendor::Thrustmaster => Some(Self::THRUSTMASTER_ID),
            Vendor::Other(id) => Some(*id),
            Vendor::Unknown => None,
        }
    }
}

/// Coarse device category; non-gamepads get their own mapping tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceClass {
    #[default]
    Gamepad,
    Wheel,
    ArcadeStick,
}

/// A connected input device
#[derive(Debug, Clone, PartialEq)]
pub struct Controller {
    pub device_path: String,
    pub name: String,
    pub vendor: Vendor,
    pub product_id: Option<u16>,
    /// 1-based slot assigned by the frontend
    pub player: u8,
    pub directinput_index: Option<u32>,
    pub xinput_index: Option<u32>,
    pub sdl_index: Option<u32>,
    pub is_keyboard: bool,
    pub device_class: DeviceClass,
    pub input: InputConfig,
}

impl Controller {
    pub fn new(device_path: impl Into<String>, name: impl Into<String>, player: u8) -> Self {
        Self {
            device_path: device_path.into(),
            name: name.into(),
            vendor: Vendor::Unknown,
            product_id: None,
            player,
            directinput_index: None,
            xinput_index: None,
            sdl_index: None,
            is_keyboard: false,
            device_class: DeviceClass::Gamepad,
            input: InputConfig::new(),
        }
    }

    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = vendor;
        self
    }

    pub fn with_input(mut self, input: InputConfig) -> Self {
        self.input = input;
        self
    }

    pub fn with_indices(
        mut self,
        directinput: Option<u32>,
        xinput: Option<u32>,
        sdl: Option<u32>,
    ) -> Self {
        self.directinput_index = directinput;
        self.xinput_index = xinput;
        self.sdl_index = sdl;
        self
    }
}
