//! Controller mapping translation
//!
//! Turns controllers into emulator tokens. A declarative [`table`] says
//! which logical actions an emulator cares about and what they are called
//! there; the [`resolver`] decodes each physical binding and hands it to a
//! per-format [`encoder`]; the [`pass`] runs the whole thing for every
//! player.
//!
//! ```text
//! MappingRegistry ──► Mapping ─┐
//!                              ├──► MappingPass ──► ResolvedBindings
//! Controllers ──► classify() ──┘     (BindingResolver + TokenEncoder)
//! ```

pub mod encoder;
pub mod error;
pub mod pass;
pub mod resolver;
pub mod table;

pub use encoder::{
    AxisDirection, DirectInputCodeEncoder, DolphinEncoder, HatDirection, MameEncoder, OutputToken,
    ResolvedInput, RetroArchEncoder, SdlJoyEncoder, TokenEncoder,
};
pub use error::MappingError;
pub use pass::{MappingPass, PlayerBindings, ResolvedBindings};
pub use resolver::{BindingResolver, ButtonSwapRule, ButtonSwapTable, ResolvedBinding};
pub use table::{Mapping, MappingRegistry, MappingRegistryBuilder};
