//! RetroArch
//!
//! Bindings go into `retroarch.cfg` as `input_player<N>_<name>_btn` and
//! `input_player<N>_<name>_axis` pairs. Only one of the two is live for a
//! given input; the other is written as `nul` so a stale binding from an
//! earlier session cannot linger.

use super::{EmulatorAdapter, GameRequest};
use crate::controller::{InputTechnology, TechnologyPolicy};
use crate::emission::{EmissionError, KeyValueDocument, KeyValueStyle};
use crate::mapping::{ResolvedBindings, ResolvedInput, RetroArchEncoder, TokenEncoder};
use std::path::{Path, PathBuf};

const UNBOUND: &str = "nul";
const HOTKEY_TARGET: &str = "enable_hotkey";

#[derive(Debug, Clone, Copy, Default)]
pub struct RetroArch;

impl RetroArch {
    /// Libretro core used for a system, if the launcher knows one
    pub fn core_for(system: &str) -> Option<&'static str> {
        let core = match system.to_lowercase().as_str() {
            "nes" | "famicom" => "nestopia",
            "snes" | "sfc" => "snes9x",
            "n64" => "mupen64plus_next",
            "gb" | "gbc" | "gba" => "mgba",
            "megadrive" | "genesis" | "mastersystem" | "segacd" => "genesis_plus_gx",
            "psx" => "swanstation",
            "pcengine" => "mednafen_pce_fast",
            _ => return None,
        };
        Some(core)
    }

    fn key_prefix(port: u8, target: &str) -> Option<String> {
        if target == HOTKEY_TARGET {
            // the hotkey enable button is global and read from player 1
            return (port == 1).then(|| "input".to_string());
        }
        Some(format!("input_player{}", port))
    }

    /// Ports left over from an earlier session with more players
    fn unbind_stale_ports(doc: &mut KeyValueDocument, bindings: &ResolvedBindings, max_players: usize) {
        for port in (1..=max_players).filter_map(|port| u8::try_from(port).ok()) {
            if bindings.port(port).is_some() {
                continue;
            }
            let prefix = format!("input_player{}_", port);
            let stale: Vec<String> = doc
                .keys(None)
                .into_iter()
                .filter(|key| key.starts_with(&prefix) && (key.ends_with("_btn") || key.ends_with("_axis")))
                .map(str::to_string)
                .collect();
            for key in stale {
                doc.set(None, &key, UNBOUND);
            }
        }
    }
}

impl EmulatorAdapter for RetroArch {
    fn id(&self) -> &'static str {
        "retroarch"
    }

    fn executable_names(&self) -> &'static [&'static str] {
        &["retroarch.exe", "retroarch"]
    }

    fn max_players(&self) -> usize {
        8
    }

    fn technology_policy(&self) -> TechnologyPolicy {
        TechnologyPolicy::xinput_first(InputTechnology::Sdl)
    }

    fn encoder(&self) -> &dyn TokenEncoder {
        &RetroArchEncoder
    }

    fn config_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join("retroarch.cfg")
    }

    fn render(&self, bindings: &ResolvedBindings, existing: Option<&[u8]>) -> Result<Vec<u8>, EmissionError> {
        let content = existing.map(String::from_utf8_lossy).unwrap_or_default();
        let mut doc = KeyValueDocument::parse(&content, KeyValueStyle::QUOTED);

        if let Some(first) = bindings.players.first() {
            let driver = if first.classification.is_xinput {
                "xinput"
            } else {
                "sdl2"
            };
            doc.set(None, "input_joypad_driver", driver);
        }

        for player in &bindings.players {
            doc.set(
                None,
                &format!("input_player{}_joypad_index", player.port),
                &player.classification.effective_index.to_string(),
            );

            for binding in &player.bindings {
                let Some(prefix) = Self::key_prefix(player.port, &binding.target) else {
                    continue;
                };
                let btn_key = format!("{}_{}_btn", prefix, binding.target);
                let axis_key = format!("{}_{}_axis", prefix, binding.target);
                let token = binding.token.to_string();

                match binding.source {
                    Some(ResolvedInput::Axis { .. }) => {
                        doc.set(None, &axis_key, &token);
                        doc.set(None, &btn_key, UNBOUND);
                    }
                    Some(ResolvedInput::Button { .. } | ResolvedInput::Hat { .. }) => {
                        doc.set(None, &btn_key, &token);
                        doc.set(None, &axis_key, UNBOUND);
                    }
                    None => {
                        doc.set(None, &btn_key, UNBOUND);
                        doc.set(None, &axis_key, UNBOUND);
                    }
                }
            }
        }

        Self::unbind_stale_ports(&mut doc, bindings, self.max_players());
        Ok(doc.render().into_bytes())
    }

    fn arguments(&self, request: &GameRequest, config_path: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(core) = Self::core_for(&request.system) {
            args.push("-L".to_string());
            args.push(format!("cores/{}_libretro.dll", core));
        }
        args.push("--config".to_string());
        args.push(config_path.display().to_string());
        args.push(request.rom.display().to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{
        inventory::standard_layout, Controller, LogicalAction, PhysicalInput, Vendor,
    };
    use crate::mapping::{BindingResolver, ButtonSwapTable, MappingPass, MappingRegistry};

    fn resolve(controllers: &[Controller], system: &str) -> ResolvedBindings {
        let registry = MappingRegistry::builtin().expect("builtin tables");
        let swaps = ButtonSwapTable::none();
        let pass = MappingPass::new(
            &registry,
            BindingResolver::new(RetroArch.encoder(), &swaps),
            RetroArch.technology_policy(),
            RetroArch.max_players(),
        );
        pass.run("retroarch", system, "game", controllers)
            .expect("pass runs")
    }

    fn render(bindings: &ResolvedBindings, existing: &str) -> String {
        let bytes = RetroArch
            .render(bindings, Some(existing.as_bytes()))
            .expect("renders");
        String::from_utf8(bytes).expect("utf-8")
    }

    fn xbox(player: u8) -> Controller {
        let index = u32::from(player) - 1;
        Controller::new(format!("hid#{}", player), "Xbox Controller", player)
            .with_vendor(Vendor::Microsoft)
            .with_indices(Some(index), Some(index), Some(index))
            .with_input(standard_layout())
    }

    #[test]
    fn buttons_and_axes_use_their_own_keys() {
        let bindings = resolve(&[xbox(1)], "snes");
        let doc = KeyValueDocument::parse(&render(&bindings, ""), KeyValueStyle::QUOTED);

        // a -> RetroPad b
        assert_eq!(doc.get(None, "input_player1_b_btn"), Some("0"));
        assert_eq!(doc.get(None, "input_player1_b_axis"), Some("nul"));
        assert_eq!(doc.get(None, "input_player1_l_y_minus_axis"), Some("-1"));
        assert_eq!(doc.get(None, "input_player1_l_y_minus_btn"), Some("nul"));
        assert_eq!(doc.get(None, "input_player1_joypad_index"), Some("0"));
        assert_eq!(doc.get(None, "input_joypad_driver"), Some("xinput"));
    }

    #[test]
    fn hotkey_is_global_and_only_from_player_one() {
        let bindings = resolve(&[xbox(1), xbox(2)], "snes");
        let text = render(&bindings, "");
        let doc = KeyValueDocument::parse(&text, KeyValueStyle::QUOTED);
        assert_eq!(doc.get(None, "input_enable_hotkey_btn"), Some("5"));
        assert!(!text.contains("input_player2_enable_hotkey"));
        assert!(!text.contains("input_player1_enable_hotkey"));
        assert_eq!(doc.get(None, "input_player2_joypad_index"), Some("1"));
    }

    #[test]
    fn n64_right_stick_is_inverted() {
        let bindings = resolve(&[xbox(1)], "n64");
        let doc = KeyValueDocument::parse(&render(&bindings, ""), KeyValueStyle::QUOTED);
        assert_eq!(doc.get(None, "input_player1_r_y_minus_axis"), Some("+3"));
        assert_eq!(doc.get(None, "input_player1_r_y_plus_axis"), Some("-3"));
        assert_eq!(doc.get(None, "input_player1_r_x_minus_axis"), Some("-2"));
    }

    #[test]
    fn unrelated_settings_survive() {
        let existing = "video_fullscreen = \"true\"\ninput_player1_b_btn = \"9\"\n";
        let bindings = resolve(&[xbox(1)], "snes");
        let text = render(&bindings, existing);
        assert!(text.starts_with("video_fullscreen = \"true\"\ninput_player1_b_btn = \"0\"\n"));
    }

    #[test]
    fn missing_binding_writes_nul_pair() {
        let mut pad = xbox(1);
        pad.input = [(LogicalAction::Start, PhysicalInput::button(7))]
            .into_iter()
            .collect();
        let bindings = resolve(&[pad], "snes");
        let doc = KeyValueDocument::parse(&render(&bindings, ""), KeyValueStyle::QUOTED);
        assert_eq!(doc.get(None, "input_player1_start_btn"), Some("7"));
        assert_eq!(doc.get(None, "input_player1_select_btn"), Some("nul"));
        assert_eq!(doc.get(None, "input_player1_select_axis"), Some("nul"));
    }

    #[test]
    fn fewer_players_unbind_the_extra_ports() {
        let two = render(&resolve(&[xbox(1), xbox(2)], "snes"), "");
        let one = render(&resolve(&[xbox(1)], "snes"), &two);
        let doc = KeyValueDocument::parse(&one, KeyValueStyle::QUOTED);

        assert_eq!(doc.get(None, "input_player1_b_btn"), Some("0"));
        assert_eq!(doc.get(None, "input_player2_b_btn"), Some("nul"));
        assert_eq!(doc.get(None, "input_player2_l_y_minus_axis"), Some("nul"));
        assert!(doc
            .keys(None)
            .into_iter()
            .filter(|key| key.starts_with("input_player2_") && key.ends_with("_btn"))
            .all(|key| doc.get(None, key) == Some("nul")));
        // stable once unbound
        assert_eq!(render(&resolve(&[xbox(1)], "snes"), &one), one);
    }

    #[test]
    fn core_is_passed_when_known() {
        let request = GameRequest::new("retroarch", "snes", "/roms/smw.sfc");
        let args = RetroArch.arguments(&request, Path::new("/ra/retroarch.cfg"));
        assert_eq!(
            args,
            vec![
                "-L",
                "cores/snes9x_libretro.dll",
                "--config",
                "/ra/retroarch.cfg",
                "/roms/smw.sfc"
            ]
        );
        let unknown = GameRequest::new("retroarch", "vectrex", "/roms/mine.vec");
        assert_eq!(RetroArch.arguments(&unknown, Path::new("ra.cfg")).len(), 3);
    }
}
