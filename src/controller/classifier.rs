//! Vendor and access-technology classification
//!
//! Emulators number controllers differently: XInput slots, DirectInput
//! enumeration order or SDL joystick indices. Brands also disagree on where
//! the "confirm" button physically sits. [`classify`] condenses both
//! concerns into a [`Classification`] the resolver works with.

use super::device::{Controller, Vendor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Brand category used for face button reordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorClass {
    Generic,
    Sony,
    Nintendo,
}

/// Controller access API an emulator addresses devices by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputTechnology {
    XInput,
    DirectInput,
    Sdl,
}

impl fmt::Display for InputTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputTechnology::XInput => write!(f, "XInput"),
            InputTechnology::DirectInput => write!(f, "DirectInput"),
            InputTechnology::Sdl => write!(f, "SDL"),
        }
    }
}

/// How one emulator wants its controllers addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechnologyPolicy {
    /// Emulator can talk XInput directly
    pub accepts_xinput: bool,
    /// Numbering used when XInput is unavailable or refused
    pub fallback: InputTechnology,
    /// User override: never use XInput even if available
    pub force_fallback: bool,
}

impl TechnologyPolicy {
    pub const fn xinput_first(fallback: InputTechnology) -> Self {
        Self {
            accepts_xinput: true,
            fallback,
            force_fallback: false,
        }
    }

    pub const fn only(technology: InputTechnology) -> Self {
        Self {
            accepts_xinput: matches!(technology, InputTechnology::XInput),
            fallback: technology,
            force_fallback: false,
        }
    }

    pub fn forcing_fallback(mut self, force: bool) -> Self {
        self.force_fallback = force;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub vendor_class: VendorClass,
    pub is_xinput: bool,
    pub technology: InputTechnology,
    pub effective_index: u32,
}

/// Classifies a controller for one emulator's addressing policy.
///
/// Pure: the same controller and policy always give the same answer.
pub fn classify(controller: &Controller, policy: &TechnologyPolicy) -> Classification {
    let vendor_class = vendor_class(controller);

    let is_xinput =
        policy.accepts_xinput && !policy.force_fallback && controller.xinput_index.is_some();

    let (technology, index) = if is_xinput {
        (InputTechnology::XInput, controller.xinput_index)
    } else {
        let index = match policy.fallback {
            InputTechnology::XInput => controller.xinput_index,
            InputTechnology::DirectInput => controller.directinput_index,
            InputTechnology::Sdl => controller.sdl_index,
        };
        (policy.fallback, index)
    };

    let effective_index = index.unwrap_or_else(|| u32::from(controller.player.saturating_sub(1)));

    Classification {
        vendor_class,
        is_xinput,
        technology,
        effective_index,
    }
}

fn vendor_class(controller: &Controller) -> VendorClass {
    match controller.vendor {
        Vendor::Sony => return VendorClass::Sony,
        Vendor::Nintendo => return VendorClass::Nintendo,
        Vendor::Unknown | Vendor::Other(_) => {}
        _ => return VendorClass::Generic,
    }

    // Bluetooth pads and third-party drivers often report no usable vendor id
    let name = controller.name.to_lowercase();
    if name.contains("xbox") {
        VendorClass::Generic
    } else if ["dualshock", "dualsense", "ps3", "ps4", "ps5", "wireless controller"]
        .iter()
        .any(|needle| name.contains(needle))
    {
        VendorClass::Sony
    } else if ["pro controller", "joy-con", "nintendo", "switch"]
        .iter()
        .any(|needle| name.contains(needle))
    {
        VendorClass::Nintendo
    } else {
        VendorClass::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(vendor: Vendor, name: &str) -> Controller {
        Controller::new("hid#1", name, 2).with_vendor(vendor)
    }

    #[test]
    fn xinput_wins_when_accepted() {
        let controller =
            pad(Vendor::Microsoft, "Xbox Controller").with_indices(Some(3), Some(1), Some(0));
        let class = classify(
            &controller,
            &TechnologyPolicy::xinput_first(InputTechnology::Sdl),
        );
        assert!(class.is_xinput);
        assert_eq!(class.technology, InputTechnology::XInput);
        assert_eq!(class.effective_index, 1);
        assert_eq!(class.vendor_class, VendorClass::Generic);
    }

    #[test]
    fn forced_fallback_uses_other_numbering() {
        let controller =
            pad(Vendor::Microsoft, "Xbox Controller").with_indices(Some(3), Some(1), Some(0));
        let policy = TechnologyPolicy::xinput_first(InputTechnology::DirectInput).forcing_fallback(true);
        let class = classify(&controller, &policy);
        assert!(!class.is_xinput);
        assert_eq!(class.technology, InputTechnology::DirectInput);
        assert_eq!(class.effective_index, 3);
    }

    #[test]
    fn missing_index_falls_back_to_player_slot() {
        let controller = pad(Vendor::Sony, "DualSense");
        let class = classify(&controller, &TechnologyPolicy::only(InputTechnology::Sdl));
        assert_eq!(class.effective_index, 1);
        assert_eq!(class.vendor_class, VendorClass::Sony);
    }

    #[test]
    fn name_heuristics_for_unknown_vendor() {
        let policy = TechnologyPolicy::only(InputTechnology::Sdl);
        assert_eq!(
            classify(&pad(Vendor::Unknown, "Pro Controller"), &policy).vendor_class,
            VendorClass::Nintendo
        );
        assert_eq!(
            classify(&pad(Vendor::Other(0x2dc8), "8BitDo SN30"), &policy).vendor_class,
            VendorClass::Generic
        );
        assert_eq!(
            classify(&pad(Vendor::Unknown, "Wireless Controller"), &policy).vendor_class,
            VendorClass::Sony
        );
        assert_eq!(
            classify(&pad(Vendor::Unknown, "Xbox Wireless Controller"), &policy).vendor_class,
            VendorClass::Generic
        );
        // a known vendor id is never second-guessed
        assert_eq!(
            classify(&pad(Vendor::Logitech, "Switch style pad"), &policy).vendor_class,
            VendorClass::Generic
        );
    }

    #[test]
    fn classification_is_stable() {
        let controller = pad(Vendor::Nintendo, "Pro Controller").with_indices(None, None, Some(4));
        let policy = TechnologyPolicy::xinput_first(InputTechnology::Sdl);
        assert_eq!(classify(&controller, &policy), classify(&controller, &policy));
    }
}
