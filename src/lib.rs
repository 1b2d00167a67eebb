//! padlauncher
//!
//! Configures emulator controller mappings from the connected pads and a
//! declarative layout table, then starts and supervises the emulator.
//!
//! ```text
//! controller ──► mapping ──► emission ──► launcher
//!  (inventory,    (tables,     (ini, xml,    (state machine)
//!   classify)      resolver)    blobs)
//!               └──── emulators (per-emulator adapters) ────┘
//! ```

pub mod controller;
pub mod emission;
pub mod emulators;
pub mod launcher;
pub mod mapping;
pub mod persistence;
