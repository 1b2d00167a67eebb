//! Controller subsystem: who is plugged in and how it is wired
//!
//! Implements the input side of a launch:
//!
//! 1. [`inventory`] - controllers from the frontend inventory or a gilrs probe
//! 2. [`device`] - the read-only device model and per-action bindings
//! 3. [`classifier`] - vendor class and per-emulator device numbering
//!
//! # Architecture
//!
//! ```text
//! Inventory / gilrs ──► Controller ──► classify() ──► Classification
//!                        (bindings)     (policy)
//! ```

pub mod classifier;
pub mod device;
pub mod inventory;

pub use classifier::{classify, Classification, InputTechnology, TechnologyPolicy, VendorClass};
pub use device::{
    Controller, DeviceClass, InputConfig, InputKind, LogicalAction, PhysicalInput, Vendor,
};
