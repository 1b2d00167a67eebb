//! Dolphin (GameCube)
//!
//! Pads live in `User/Config/GCPadNew.ini`, one `[GCPad<N>]` section per
//! port. Dolphin addresses devices through SDL, and Nintendo pads report
//! their face buttons mirrored, so this adapter carries the face button swap.

use super::{EmulatorAdapter, GameRequest};
use crate::controller::{InputTechnology, TechnologyPolicy};
use crate::emission::{EmissionError, KeyValueDocument, KeyValueStyle};
use crate::mapping::{ButtonSwapTable, DolphinEncoder, ResolvedBindings, TokenEncoder};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct Dolphin;

impl Dolphin {
    pub fn section(port: u8) -> String {
        format!("GCPad{}", port)
    }
}

impl EmulatorAdapter for Dolphin {
    fn id(&self) -> &'static str {
        "dolphin"
    }

    fn executable_names(&self) -> &'static [&'static str] {
        &["Dolphin.exe", "dolphin-emu"]
    }

    fn max_players(&self) -> usize {
        4
    }

    fn technology_policy(&self) -> TechnologyPolicy {
        TechnologyPolicy::only(InputTechnology::Sdl)
    }

    fn encoder(&self) -> &dyn TokenEncoder {
        &DolphinEncoder
    }

    fn swap_table(&self) -> ButtonSwapTable {
        ButtonSwapTable::nintendo_face_buttons()
    }

    fn config_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join("User").join("Config").join("GCPadNew.ini")
    }

    fn render(&self, bindings: &ResolvedBindings, existing: Option<&[u8]>) -> Result<Vec<u8>, EmissionError> {
        let content = existing.map(String::from_utf8_lossy).unwrap_or_default();
        let mut doc = KeyValueDocument::parse(&content, KeyValueStyle::INI);

        for player in &bindings.players {
            let section = Self::section(player.port);
            doc.set(
                Some(&section),
                "Device",
                &format!(
                    "SDL/{}/{}",
                    player.classification.effective_index, player.controller_name
                ),
            );
            for binding in &player.bindings {
                doc.set(Some(&section), &binding.target, &binding.token.to_string());
            }
        }

        // ports above the configured count keep no device from an earlier run
        for port in (1..=self.max_players()).filter_map(|port| u8::try_from(port).ok()) {
            if bindings.port(port).is_some() {
                continue;
            }
            let section = Self::section(port);
            let stale: Vec<String> = doc.keys(Some(&section)).into_iter().map(str::to_string).collect();
            for key in stale {
                doc.set(Some(&section), &key, "");
            }
        }

        Ok(doc.render().into_bytes())
    }

    fn arguments(&self, request: &GameRequest, _config_path: &Path) -> Vec<String> {
        vec![
            "-b".to_string(),
            "-e".to_string(),
            request.rom.display().to_string(),
        ]
    }
}
