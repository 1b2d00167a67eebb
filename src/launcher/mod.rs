//! Emulator process supervision
//!
//! Starts the emulator and babysits it until it exits. The lifecycle is a
//! statum state machine so each step can only be taken from the right state:
//!
//! ```text
//! Launching ──► WaitingForWindow ──► Styled ──► Running ──► Exited
//!   (spawn)      (probe, timeout)    (style)    (wait/kill)
//! ```
//!
//! Progress is published as [`LaunchStatus`] through a `watch` channel;
//! a `CancellationToken` terminates the child from outside.

pub mod process;
pub mod window;

pub use process::{EmulatorProcess, Exited, LaunchState, Launching, Running, Styled, WaitingForWindow};
pub use window::{PassiveWindowProbe, WindowHandle, WindowProbe};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Failed to wait for emulator process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Window error: {0}")]
    Window(String),
}

/// Supervisor timing and window handling
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorSettings {
    pub poll_interval_ms: u64,
    pub window_timeout_ms: u64,
    pub borderless: bool,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            window_timeout_ms: 30_000,
            borderless: false,
        }
    }
}

impl SupervisorSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn window_timeout(&self) -> Duration {
        Duration::from_millis(self.window_timeout_ms)
    }
}

/// Everything needed to start one emulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl LaunchCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Published on every state change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchStatus {
    Launching,
    WaitingForWindow { pid: u32 },
    Styled { pid: u32, window: Option<WindowHandle> },
    Running { pid: u32 },
    Exited { code: Option<i32>, cancelled: bool },
}

/// Summary of a finished launch
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchReport {
    pub program: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub exit_code: Option<i32>,
    pub cancelled: bool,
}

impl LaunchReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn success(&self) -> bool {
        !self.cancelled && self.exit_code == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_display_quotes_spaced_args() {
        let command = LaunchCommand::new("/emu/retroarch")
            .with_args(["--config", "/my games/retroarch.cfg"]);
        assert_eq!(
            command.to_string(),
            "/emu/retroarch --config \"/my games/retroarch.cfg\""
        );
    }

    #[test]
    fn settings_fill_missing_fields() {
        let settings: SupervisorSettings = toml::from_str("borderless = true").expect("parses");
        assert!(settings.borderless);
        assert_eq!(settings.poll_interval_ms, 250);
        assert_eq!(settings.window_timeout(), Duration::from_secs(30));
    }
}
