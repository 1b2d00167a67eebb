//! Configuration emission
//!
//! Writers for the file formats emulators keep their controller settings
//! in. Every writer renders into memory first; [`atomic::persist_atomically`]
//! is the only place touching the destination file.
//!
//! - [`text`] - `key = value` files with optional `[section]` headers
//! - [`xml`] - MAME `<mameconfig>` documents
//! - [`binary`] - fixed-layout blobs described by a field table

pub mod atomic;
pub mod binary;
pub mod text;
pub mod xml;

pub use atomic::{persist_atomically, read_existing};
pub use binary::{BlobLayout, FieldSpec};
pub use text::{KeyValueDocument, KeyValueStyle};
pub use xml::{render_mame_config, InputPort};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmissionError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to replace {path}: {reason}")]
    Persist { path: String, reason: String },

    #[error("Blob layout error: {0}")]
    Layout(String),

    #[error("XML error: {0}")]
    Xml(String),
}
