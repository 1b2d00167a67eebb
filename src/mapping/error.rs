//! Error definitions for the mapping module

use crate::controller::{InputKind, LogicalAction};
use thiserror::Error;

/// Errors raised while loading tables or resolving bindings
#[derive(Debug, Error)]
pub enum MappingError {
    /// No usable table for this emulator; aborts configuring that emulator
    #[error("Mapping configuration missing for {emulator}: {reason}")]
    MappingResourceMissing { emulator: String, reason: String },

    /// A table resource exists but cannot be parsed
    #[error("Mapping table for {emulator} could not be parsed: {reason}")]
    MappingResourceParse { emulator: String, reason: String },

    /// Descriptor kind that cannot be turned into a joystick token
    #[error("Unsupported input type '{kind}' bound to {action}")]
    UnsupportedInputType {
        action: LogicalAction,
        kind: InputKind,
    },

    /// No non-keyboard controller is connected
    #[error("No usable controller for {0}")]
    NoUsableController(String),

    #[error("Unknown emulator: {0}")]
    UnknownEmulator(String),
}
