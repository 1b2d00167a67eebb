//! Window discovery seam
//!
//! Finding and restyling the emulator's top-level window is platform
//! specific. The supervisor only talks to [`WindowProbe`]; the default
//! [`PassiveWindowProbe`] treats the process itself as its window and leaves
//! it alone.

use super::LaunchError;
use tracing::debug;

/// Opaque platform window id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub u64);

pub trait WindowProbe: Send + Sync {
    /// Returns the main window of `pid` once it exists
    fn find_window(&self, pid: u32) -> Option<WindowHandle>;

    fn apply_style(&self, window: WindowHandle, borderless: bool) -> Result<(), LaunchError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassiveWindowProbe;

impl WindowProbe for PassiveWindowProbe {
    fn find_window(&self, pid: u32) -> Option<WindowHandle> {
        Some(WindowHandle(u64::from(pid)))
    }

    fn apply_style(&self, window: WindowHandle, borderless: bool) -> Result<(), LaunchError> {
        debug!("Leaving window {:?} as is (borderless requested: {})", window, borderless);
        Ok(())
    }
}
