//! Per-format token encoders
//!
//! The resolver decides *what* a binding is (button 3, axis 1 negative,
//! hat 0 up). An encoder decides how the target emulator spells it. Each
//! emulator adapter picks one encoder; the resolver never branches on the
//! emulator.

use std::fmt;
use tracing::warn;

/// Final value written into an emulator configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputToken {
    Text(String),
    Bytes(Vec<u8>),
}

impl OutputToken {
    pub fn text(value: impl Into<String>) -> Self {
        OutputToken::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutputToken::Text(text) => Some(text),
            OutputToken::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            OutputToken::Text(text) => text.as_bytes(),
            OutputToken::Bytes(bytes) => bytes,
        }
    }
}

impl fmt::Display for OutputToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputToken::Text(text) => write!(f, "{}", text),
            OutputToken::Bytes(bytes) => {
                for byte in bytes {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisDirection {
    Positive,
    Negative,
}

impl AxisDirection {
    pub fn from_value(value: i32) -> Self {
        if value < 0 {
            AxisDirection::Negative
        } else {
            AxisDirection::Positive
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            AxisDirection::Positive => AxisDirection::Negative,
            AxisDirection::Negative => AxisDirection::Positive,
        }
    }

    pub fn sign(self) -> char {
        match self {
            AxisDirection::Positive => '+',
            AxisDirection::Negative => '-',
        }
    }
}

/// Cardinal hat direction, decoded from the standard bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatDirection {
    Up,
    Right,
    Down,
    Left,
}

impl HatDirection {
    /// Only exact cardinal bits decode; diagonals and 0 do not.
    pub fn from_mask(mask: i32) -> Option<Self> {
        match mask {
            1 => Some(HatDirection::Up),
            2 => Some(HatDirection::Right),
            4 => Some(HatDirection::Down),
            8 => Some(HatDirection::Left),
            _ => None,
        }
    }

    /// Position in Up, Right, Down, Left order
    pub fn ordinal(self) -> u32 {
        match self {
            HatDirection::Up => 0,
            HatDirection::Right => 1,
            HatDirection::Down => 2,
            HatDirection::Left => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HatDirection::Up => "up",
            HatDirection::Right => "right",
            HatDirection::Down => "down",
            HatDirection::Left => "left",
        }
    }
}

/// A binding after sign, hat and vendor decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedInput {
    /// Button id with the encoder's base already applied
    Button { id: u32 },
    Axis { id: u32, direction: AxisDirection },
    Hat { id: u32, direction: HatDirection },
}

/// Strategy turning resolved inputs into one emulator's syntax
pub trait TokenEncoder: Send + Sync {
    fn encode(&self, device_index: u32, input: &ResolvedInput) -> OutputToken;

    /// Sentinel written for unbound actions
    fn unbound(&self) -> OutputToken;

    /// 0 for formats counting buttons from zero, 1 for one-based formats
    fn button_base(&self) -> u32 {
        0
    }
}

/// SDL-style joystick tokens: `b0`, `+a1`, `h0up`
#[derive(Debug, Clone, Copy, Default)]
pub struct SdlJoyEncoder;

impl TokenEncoder for SdlJoyEncoder {
    fn encode(&self, _device_index: u32, input: &ResolvedInput) -> OutputToken {
        match input {
            ResolvedInput::Button { id } => OutputToken::Text(format!("b{}", id)),
            ResolvedInput::Axis { id, direction } => {
                OutputToken::Text(format!("{}a{}", direction.sign(), id))
            }
            ResolvedInput::Hat { id, direction } => {
                OutputToken::Text(format!("h{}{}", id, direction.name()))
            }
        }
    }

    fn unbound(&self) -> OutputToken {
        OutputToken::text("")
    }
}

/// RetroArch joypad values: `0`, `+1`, `h0up`; unbound is `nul`
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroArchEncoder;

impl TokenEncoder for RetroArchEncoder {
    fn encode(&self, _device_index: u32, input: &ResolvedInput) -> OutputToken {
        match input {
            ResolvedInput::Button { id } => OutputToken::Text(id.to_string()),
            ResolvedInput::Axis { id, direction } => {
                OutputToken::Text(format!("{}{}", direction.sign(), id))
            }
            ResolvedInput::Hat { id, direction } => {
                OutputToken::Text(format!("h{}{}", id, direction.name()))
            }
        }
    }

    fn unbound(&self) -> OutputToken {
        OutputToken::text("nul")
    }
}

/// MAME input codes, device and buttons numbered from one
#[derive(Debug, Clone, Copy, Default)]
pub struct MameEncoder;

impl MameEncoder {
    fn axis_name(id: u32, direction: AxisDirection) -> String {
        let negative = direction == AxisDirection::Negative;
        match id {
            0 => format!("XAXIS_{}", if negative { "LEFT" } else { "RIGHT" }),
            1 => format!("YAXIS_{}", if negative { "UP" } else { "DOWN" }),
            2 => format!("ZAXIS_{}", if negative { "NEG" } else { "POS" }),
            3 => format!("RXAXIS_{}", if negative { "LEFT" } else { "RIGHT" }),
            4 => format!("RYAXIS_{}", if negative { "UP" } else { "DOWN" }),
            5 => format!("RZAXIS_{}", if negative { "NEG" } else { "POS" }),
            other => format!("SLIDER{}_{}", other - 5, if negative { "NEG" } else { "POS" }),
        }
    }
}

impl TokenEncoder for MameEncoder {
    fn encode(&self, device_index: u32, input: &ResolvedInput) -> OutputToken {
        let joy = device_index + 1;
        match input {
            ResolvedInput::Button { id } => OutputToken::Text(format!("JOYCODE_{}_BUTTON{}", joy, id)),
            ResolvedInput::Axis { id, direction } => OutputToken::Text(format!(
                "JOYCODE_{}_{}_SWITCH",
                joy,
                Self::axis_name(*id, *direction)
            )),
            ResolvedInput::Hat { id, direction } => OutputToken::Text(format!(
                "JOYCODE_{}_HAT{}{}",
                joy,
                id + 1,
                direction.name().to_uppercase()
            )),
        }
    }

    fn unbound(&self) -> OutputToken {
        OutputToken::text("NONE")
    }

    fn button_base(&self) -> u32 {
        1
    }
}

/// Dolphin SDL expressions, backtick quoted
#[derive(Debug, Clone, Copy, Default)]
pub struct DolphinEncoder;

impl TokenEncoder for DolphinEncoder {
    fn encode(&self, _device_index: u32, input: &ResolvedInput) -> OutputToken {
        match input {
            ResolvedInput::Button { id } => OutputToken::Text(format!("`Button {}`", id)),
            ResolvedInput::Axis { id, direction } => {
                OutputToken::Text(format!("`Axis {}{}`", id, direction.sign()))
            }
            ResolvedInput::Hat { id, direction } => {
                let compass = match direction {
                    HatDirection::Up => 'N',
                    HatDirection::Right => 'E',
                    HatDirection::Down => 'S',
                    HatDirection::Left => 'W',
                };
                OutputToken::Text(format!("`Hat {} {}`", id, compass))
            }
        }
    }

    fn unbound(&self) -> OutputToken {
        OutputToken::text("")
    }
}

/// Numeric DirectInput codes stored as little-endian `u32`.
///
/// ```text
/// code = (device + 1) << 12 | kind | detail
///   button: kind 0x000, detail = id              (0..0x1FF)
///   axis:   kind 0x200, detail = id * 2 + neg    (sign in bit 0)
///   hat:    kind 0x400, detail = hat * 4 + dir   (up, right, down, left)
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectInputCodeEncoder;

impl DirectInputCodeEncoder {
    pub const DEVICE_SHIFT: u32 = 12;
    pub const AXIS_BASE: u32 = 0x200;
    pub const HAT_BASE: u32 = 0x400;

    pub const BUTTON_LIMIT: u32 = 0x200;
    pub const AXIS_LIMIT: u32 = 0x100;
    pub const HAT_LIMIT: u32 = 0x40;
    /// Device numbers above this no longer fit above bit 12
    pub const DEVICE_LIMIT: u32 = u32::MAX >> Self::DEVICE_SHIFT;

    /// `None` when any field falls outside its slot in the code
    pub fn code(device_index: u32, input: &ResolvedInput) -> Option<u32> {
        if device_index >= Self::DEVICE_LIMIT {
            return None;
        }
        let device = (device_index + 1) << Self::DEVICE_SHIFT;
        let detail = match *input {
            ResolvedInput::Button { id } if id < Self::BUTTON_LIMIT => id,
            ResolvedInput::Axis { id, direction } if id < Self::AXIS_LIMIT => {
                Self::AXIS_BASE + id * 2 + u32::from(direction == AxisDirection::Negative)
            }
            ResolvedInput::Hat { id, direction } if id < Self::HAT_LIMIT => {
                Self::HAT_BASE + id * 4 + direction.ordinal()
            }
            _ => return None,
        };
        Some(device | detail)
    }
}

impl TokenEncoder for DirectInputCodeEncoder {
    fn encode(&self, device_index: u32, input: &ResolvedInput) -> OutputToken {
        match Self::code(device_index, input) {
            Some(code) => OutputToken::Bytes(code.to_le_bytes().to_vec()),
            None => {
                warn!(
                    "{:?} on device {} has no DirectInput code, leaving it unbound",
                    input, device_index
                );
                self.unbound()
            }
        }
    }

    fn unbound(&self) -> OutputToken {
        OutputToken::Bytes(vec![0; 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AXIS_UP: ResolvedInput = ResolvedInput::Axis {
        id: 1,
        direction: AxisDirection::Negative,
    };

    #[test]
    fn hat_mask_decodes_only_cardinals() {
        let decoded: Vec<_> = [1, 2, 4, 8].into_iter().filter_map(HatDirection::from_mask).collect();
        assert_eq!(
            decoded,
            vec![
                HatDirection::Up,
                HatDirection::Right,
                HatDirection::Down,
                HatDirection::Left
            ]
        );
        for mask in [0, 3, 6, 9, 12, 16, -1] {
            assert_eq!(HatDirection::from_mask(mask), None);
        }
    }

    #[test]
    fn text_encoders_spell_axes() {
        assert_eq!(SdlJoyEncoder.encode(0, &AXIS_UP), OutputToken::text("-a1"));
        assert_eq!(RetroArchEncoder.encode(0, &AXIS_UP), OutputToken::text("-1"));
        assert_eq!(DolphinEncoder.encode(0, &AXIS_UP), OutputToken::text("`Axis 1-`"));
        assert_eq!(
            MameEncoder.encode(1, &AXIS_UP),
            OutputToken::text("JOYCODE_2_YAXIS_UP_SWITCH")
        );
    }

    #[test]
    fn mame_hats_are_one_based() {
        let hat = ResolvedInput::Hat {
            id: 0,
            direction: HatDirection::Left,
        };
        assert_eq!(MameEncoder.encode(0, &hat), OutputToken::text("JOYCODE_1_HAT1LEFT"));
        assert_eq!(MameEncoder.button_base(), 1);
    }

    #[test]
    fn directinput_codes_carry_device_and_sign() {
        assert_eq!(
            DirectInputCodeEncoder::code(0, &ResolvedInput::Button { id: 5 }),
            Some(0x1005)
        );
        assert_eq!(DirectInputCodeEncoder::code(1, &AXIS_UP), Some(0x2203));
        let down = ResolvedInput::Axis {
            id: 1,
            direction: AxisDirection::Positive,
        };
        assert_eq!(DirectInputCodeEncoder::code(1, &down), Some(0x2202));
        let hat = ResolvedInput::Hat {
            id: 0,
            direction: HatDirection::Down,
        };
        assert_eq!(
            DirectInputCodeEncoder.encode(0, &hat),
            OutputToken::Bytes(vec![0x02, 0x14, 0, 0])
        );
    }

    #[test]
    fn directinput_codes_stay_inside_their_slots() {
        let code = |device, input| DirectInputCodeEncoder::code(device, &input);
        let axis = |id| ResolvedInput::Axis {
            id,
            direction: AxisDirection::Negative,
        };
        let hat = |id| ResolvedInput::Hat {
            id,
            direction: HatDirection::Left,
        };

        assert_eq!(code(0, ResolvedInput::Button { id: 0x1FF }), Some(0x11FF));
        assert_eq!(code(0, ResolvedInput::Button { id: 0x200 }), None);
        assert_eq!(code(0, axis(0xFF)), Some(0x13FF));
        assert_eq!(code(0, axis(0x100)), None);
        assert_eq!(code(0, axis(0x8000_0000)), None);
        assert_eq!(code(0, hat(0x3F)), Some(0x14FF));
        assert_eq!(code(0, hat(0x40)), None);
        assert_eq!(code(u32::MAX, ResolvedInput::Button { id: 0 }), None);
        assert_eq!(
            code(DirectInputCodeEncoder::DEVICE_LIMIT - 1, ResolvedInput::Button { id: 0 }),
            Some(0xFFFF_F000)
        );
        assert_eq!(code(DirectInputCodeEncoder::DEVICE_LIMIT, ResolvedInput::Button { id: 0 }), None);

        // out of range never aliases another input
        assert_ne!(code(0, axis(0x100)), code(0, hat(0)));
        assert_eq!(
            DirectInputCodeEncoder.encode(0, &ResolvedInput::Button { id: 512 }),
            DirectInputCodeEncoder.unbound()
        );
    }

    #[test]
    fn bytes_display_as_hex() {
        assert_eq!(OutputToken::Bytes(vec![0x0A, 0xFF]).to_string(), "0AFF");
    }
}
