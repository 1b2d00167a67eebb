//! MAME
//!
//! The launcher owns a dedicated controller file (`ctrlr/padlauncher.cfg`)
//! and selects it with `-ctrlr`, so the user's own `default.cfg` is never
//! touched. Unbound actions are left out and keep MAME's keyboard defaults.

use super::{EmulatorAdapter, GameRequest};
use crate::controller::{InputTechnology, TechnologyPolicy};
use crate::emission::{render_mame_config, EmissionError, InputPort};
use crate::mapping::{MameEncoder, ResolvedBindings, TokenEncoder};
use std::path::{Path, PathBuf};

pub const CTRLR_NAME: &str = "padlauncher";

#[derive(Debug, Clone, Copy, Default)]
pub struct Mame;

impl Mame {
    /// Port name for one emulator port; `{n}` stands for the port number
    pub fn port_type(target: &str, port: u8) -> String {
        target.replace("{n}", &port.to_string())
    }
}

impl EmulatorAdapter for Mame {
    fn id(&self) -> &'static str {
        "mame"
    }

    fn executable_names(&self) -> &'static [&'static str] {
        &["mame.exe", "mame64.exe", "mame"]
    }

    fn max_players(&self) -> usize {
        8
    }

    fn technology_policy(&self) -> TechnologyPolicy {
        TechnologyPolicy::only(InputTechnology::DirectInput)
    }

    fn encoder(&self) -> &dyn TokenEncoder {
        &MameEncoder
    }

    fn config_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join("ctrlr").join(format!("{}.cfg", CTRLR_NAME))
    }

    fn render(&self, bindings: &ResolvedBindings, _existing: Option<&[u8]>) -> Result<Vec<u8>, EmissionError> {
        let mut ports: Vec<InputPort> = Vec::new();

        for player in &bindings.players {
            for binding in player.bindings.iter().filter(|b| b.is_bound()) {
                let port_type = Self::port_type(&binding.target, player.port);
                let token = binding.token.to_string();

                // several actions may drive one port (d-pad and stick)
                match ports.iter_mut().find(|p| p.port_type == port_type) {
                    Some(port) => {
                        port.sequence.push_str(" OR ");
                        port.sequence.push_str(&token);
                    }
                    None => ports.push(InputPort::new(port_type, token)),
                }
            }
        }

        render_mame_config(&ports)
    }

    fn arguments(&self, request: &GameRequest, _config_path: &Path) -> Vec<String> {
        let mut args = vec![request.rom_id()];
        if let Some(dir) = request.rom.parent().filter(|d| !d.as_os_str().is_empty()) {
            args.push("-rompath".to_string());
            args.push(dir.display().to_string());
        }
        args.extend(
            ["-joystick", "-joystickprovider", "dinput", "-ctrlr", CTRLR_NAME]
                .iter()
                .map(|s| s.to_string()),
        );
        args
    }
}
