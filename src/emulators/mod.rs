//! Emulator adapters
//!
//! Each adapter bundles what differs between emulators: how it numbers
//! controllers, how it spells an input ([`TokenEncoder`]), which brand
//! quirks apply, where its controller configuration lives and in which
//! format, and how it is started.
//!
//! ```text
//! GameRequest ──► MappingPass ──► ResolvedBindings ──► adapter.render() ──► persist_atomically()
//!                  (adapter's encoder, policy, swaps)
//! ```

pub mod dolphin;
pub mod epsxe;
pub mod mame;
pub mod retroarch;

use crate::controller::{Controller, TechnologyPolicy};
use crate::emission::{persist_atomically, read_existing, EmissionError};
use crate::launcher::LaunchCommand;
use crate::mapping::{
    BindingResolver, ButtonSwapTable, MappingError, MappingPass, MappingRegistry, ResolvedBindings,
    TokenEncoder,
};
use crate::persistence::{EmulatorInstall, InputSettings};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub use dolphin::Dolphin;
pub use epsxe::Epsxe;
pub use mame::Mame;
pub use retroarch::RetroArch;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Emission(#[from] EmissionError),

    #[error("No executable for {emulator} in {directory}")]
    ExecutableNotFound { emulator: String, directory: String },
}

/// The game the frontend asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRequest {
    pub emulator: String,
    pub system: String,
    pub rom: PathBuf,
}

impl GameRequest {
    pub fn new(emulator: impl Into<String>, system: impl Into<String>, rom: impl Into<PathBuf>) -> Self {
        Self {
            emulator: emulator.into(),
            system: system.into(),
            rom: rom.into(),
        }
    }

    /// Lowercase file stem, used for per-game mapping entries
    pub fn rom_id(&self) -> String {
        self.rom
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

pub trait EmulatorAdapter: Send + Sync {
    fn id(&self) -> &'static str;

    /// Candidate executable file names, tried in order
    fn executable_names(&self) -> &'static [&'static str];

    fn max_players(&self) -> usize;

    fn technology_policy(&self) -> TechnologyPolicy;

    fn encoder(&self) -> &dyn TokenEncoder;

    /// Brand-specific button renumbering this emulator needs
    fn swap_table(&self) -> ButtonSwapTable {
        ButtonSwapTable::none()
    }

    fn config_path(&self, install_dir: &Path) -> PathBuf;

    /// Renders the controller configuration, merging into `existing` when the
    /// format keeps unrelated settings in the same file.
    fn render(&self, bindings: &ResolvedBindings, existing: Option<&[u8]>) -> Result<Vec<u8>, EmissionError>;

    fn arguments(&self, request: &GameRequest, config_path: &Path) -> Vec<String>;
}

pub fn builtin_adapters() -> Vec<Box<dyn EmulatorAdapter>> {
    vec![
        Box::new(RetroArch),
        Box::new(Mame),
        Box::new(Dolphin),
        Box::new(Epsxe),
    ]
}

pub fn find_adapter(id: &str) -> Result<Box<dyn EmulatorAdapter>, MappingError> {
    builtin_adapters()
        .into_iter()
        .find(|adapter| adapter.id().eq_ignore_ascii_case(id))
        .ok_or_else(|| MappingError::UnknownEmulator(id.to_string()))
}

pub fn locate_executable(
    adapter: &dyn EmulatorAdapter,
    install: &EmulatorInstall,
) -> Result<PathBuf, AdapterError> {
    let explicit = install.executable.as_deref().into_iter();
    let candidates = explicit.chain(adapter.executable_names().iter().copied());

    for name in candidates {
        let path = install.directory.join(name);
        if path.is_file() {
            info!("Found {} executable: {}", adapter.id(), path.display());
            return Ok(path);
        }
    }

    Err(AdapterError::ExecutableNotFound {
        emulator: adapter.id().to_string(),
        directory: install.directory.display().to_string(),
    })
}

/// Command line for a game: configured extra arguments, then the adapter's own
pub fn build_command(
    adapter: &dyn EmulatorAdapter,
    install: &EmulatorInstall,
    request: &GameRequest,
) -> Result<LaunchCommand, AdapterError> {
    let program = locate_executable(adapter, install)?;
    let config_path = adapter.config_path(&install.directory);
    Ok(LaunchCommand::new(program)
        .with_args(install.extra_args.iter().cloned())
        .with_args(adapter.arguments(request, &config_path))
        .in_dir(&install.directory))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigureOutcome {
    Written { path: PathBuf, players: usize },
    /// Nothing to map; the emulator keeps its own configuration
    KeptDefaults,
}

/// Runs the mapping pass with the adapter's encoder, policy and quirks.
///
/// `Ok(None)` means there was no usable controller and the emulator should
/// keep its own configuration.
pub fn resolve_controllers(
    adapter: &dyn EmulatorAdapter,
    registry: &MappingRegistry,
    request: &GameRequest,
    controllers: &[Controller],
    settings: &InputSettings,
) -> Result<Option<ResolvedBindings>, MappingError> {
    let swaps = if settings.swap_nintendo_buttons {
        adapter.swap_table()
    } else {
        ButtonSwapTable::none()
    };
    let policy = adapter
        .technology_policy()
        .forcing_fallback(settings.disable_xinput);

    let pass = MappingPass::new(
        registry,
        BindingResolver::new(adapter.encoder(), &swaps),
        policy,
        adapter.max_players(),
    );

    match pass.run(adapter.id(), &request.system, &request.rom_id(), controllers) {
        Ok(bindings) => Ok(Some(bindings)),
        Err(MappingError::NoUsableController(emulator)) => {
            warn!("No usable controller for {}, keeping its configuration", emulator);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Resolves the controllers for a game and writes the emulator configuration
pub fn configure_controllers(
    adapter: &dyn EmulatorAdapter,
    registry: &MappingRegistry,
    install_dir: &Path,
    request: &GameRequest,
    controllers: &[Controller],
    settings: &InputSettings,
) -> Result<ConfigureOutcome, AdapterError> {
    let Some(bindings) = resolve_controllers(adapter, registry, request, controllers, settings)? else {
        return Ok(ConfigureOutcome::KeptDefaults);
    };

    let path = adapter.config_path(install_dir);
    let existing = read_existing(&path)?;
    let content = adapter.render(&bindings, existing.as_deref())?;
    persist_atomically(&path, &content)?;

    Ok(ConfigureOutcome::Written {
        path,
        players: bindings.players.len(),
    })
}
