//! ePSXe
//!
//! Pad settings are a binary blob of DirectInput codes, one fixed-size
//! record per pad. The layout is described by [`PAD_LAYOUT`]; the field
//! names are the targets of the `epsxe` mapping table.

use super::{EmulatorAdapter, GameRequest};
use crate::controller::{InputTechnology, TechnologyPolicy};
use crate::emission::{BlobLayout, EmissionError, FieldSpec};
use crate::mapping::{DirectInputCodeEncoder, ResolvedBindings, TokenEncoder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PAD_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("up", 0x00, 4),
    FieldSpec::new("down", 0x04, 4),
    FieldSpec::new("left", 0x08, 4),
    FieldSpec::new("right", 0x0C, 4),
    FieldSpec::new("cross", 0x10, 4),
    FieldSpec::new("circle", 0x14, 4),
    FieldSpec::new("square", 0x18, 4),
    FieldSpec::new("triangle", 0x1C, 4),
    FieldSpec::new("l1", 0x20, 4),
    FieldSpec::new("r1", 0x24, 4),
    FieldSpec::new("l2", 0x28, 4),
    FieldSpec::new("r2", 0x2C, 4),
    FieldSpec::new("l3", 0x30, 4),
    FieldSpec::new("r3", 0x34, 4),
    FieldSpec::new("start", 0x38, 4),
    FieldSpec::new("select", 0x3C, 4),
    FieldSpec::new("lstick_up", 0x40, 4),
    FieldSpec::new("lstick_down", 0x44, 4),
    FieldSpec::new("lstick_left", 0x48, 4),
    FieldSpec::new("lstick_right", 0x4C, 4),
    FieldSpec::new("rstick_up", 0x50, 4),
    FieldSpec::new("rstick_down", 0x54, 4),
    FieldSpec::new("rstick_left", 0x58, 4),
    FieldSpec::new("rstick_right", 0x5C, 4),
];

pub const PAD_LAYOUT: BlobLayout = BlobLayout {
    magic: b"PADCFG01",
    header_len: 16,
    stride: 0x60,
    fields: PAD_FIELDS,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Epsxe;

impl EmulatorAdapter for Epsxe {
    fn id(&self) -> &'static str {
        "epsxe"
    }

    fn executable_names(&self) -> &'static [&'static str] {
        &["ePSXe.exe", "epsxe"]
    }

    fn max_players(&self) -> usize {
        2
    }

    fn technology_policy(&self) -> TechnologyPolicy {
        TechnologyPolicy::only(InputTechnology::DirectInput)
    }

    fn encoder(&self) -> &dyn TokenEncoder {
        &DirectInputCodeEncoder
    }

    fn config_path(&self, install_dir: &Path) -> PathBuf {
        install_dir.join("config").join("pads.bin")
    }

    fn render(&self, bindings: &ResolvedBindings, existing: Option<&[u8]>) -> Result<Vec<u8>, EmissionError> {
        let mut buffer = existing.map(<[u8]>::to_vec).unwrap_or_default();
        PAD_LAYOUT.prepare(&mut buffer, bindings.players.len())?;

        for (record, player) in bindings.players.iter().enumerate() {
            for binding in &player.bindings {
                if let Err(e) =
                    PAD_LAYOUT.write_field(&mut buffer, record, &binding.target, binding.token.as_bytes())
                {
                    warn!("Skipping {} for pad {}: {}", binding.action, player.port, e);
                }
            }
            debug!("Pad {} record written for {}", player.port, player.controller_name);
        }

        Ok(buffer)
    }

    fn arguments(&self, request: &GameRequest, _config_path: &Path) -> Vec<String> {
        vec![
            "-nogui".to_string(),
            "-loadbin".to_string(),
            request.rom.display().to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{inventory::standard_layout, Controller, Vendor};
    use crate::mapping::{BindingResolver, ButtonSwapTable, MappingPass, MappingRegistry};

    fn resolve(controllers: &[Controller]) -> ResolvedBindings {
        resolve_with(&MappingRegistry::builtin().expect("builtin tables"), controllers)
    }

    fn resolve_with(registry: &MappingRegistry, controllers: &[Controller]) -> ResolvedBindings {
        let swaps = ButtonSwapTable::none();
        let pass = MappingPass::new(
            registry,
            BindingResolver::new(Epsxe.encoder(), &swaps),
            Epsxe.technology_policy(),
            Epsxe.max_players(),
        );
        pass.run("epsxe", "psx", "crash", controllers)
            .expect("pass runs")
    }

    fn pad(player: u8) -> Controller {
        Controller::new(format!("hid#{}", player), "DualShock 4", player)
            .with_vendor(Vendor::Sony)
            .with_indices(Some(u32::from(player) - 1), None, None)
            .with_input(standard_layout())
    }

    fn code(buffer: &[u8], record: usize, field: &str) -> u32 {
        let bytes = PAD_LAYOUT.read_field(buffer, record, field).expect("field in range");
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    #[test]
    fn layout_is_valid_and_matches_the_table() {
        PAD_LAYOUT.validate().expect("layout valid");
        let registry = MappingRegistry::builtin().expect("builtin tables");
        let table = registry.table("epsxe").expect("epsxe table");
        let mapping = table.entry("default").expect("default entry");
        for (_, target) in mapping.iter() {
            assert!(PAD_LAYOUT.field(target).is_some(), "{}", target);
        }
    }

    #[test]
    fn records_hold_directinput_codes() {
        let bindings = resolve(&[pad(1), pad(2)]);
        let buffer = Epsxe.render(&bindings, None).expect("renders");

        assert_eq!(buffer.len(), PAD_LAYOUT.required_len(2));
        assert_eq!(&buffer[..8], b"PADCFG01");
        assert_eq!(code(&buffer, 0, "cross"), 0x1000);
        assert_eq!(code(&buffer, 1, "start"), 0x2006);
        // left stick up: axis 1 negative
        assert_eq!(code(&buffer, 0, "lstick_up"), 0x1203);
    }

    #[test]
    fn blob_shrinks_to_the_configured_players() {
        let two = Epsxe
            .render(&resolve(&[pad(1), pad(2)]), None)
            .expect("renders");
        let one = Epsxe
            .render(&resolve(&[pad(1)]), Some(&two))
            .expect("renders");
        assert_eq!(one.len(), PAD_LAYOUT.required_len(1));
        assert_eq!(&one[8..12], &1u32.to_le_bytes());
        assert_eq!(code(&one, 0, "cross"), 0x1000);
    }

    #[test]
    fn third_player_is_not_written() {
        let bindings = resolve(&[pad(1), pad(2), pad(3)]);
        assert_eq!(bindings.players.len(), 2);
        let buffer = Epsxe.render(&bindings, None).expect("renders");
        assert_eq!(buffer.len(), PAD_LAYOUT.required_len(2));
    }

    #[test]
    fn unknown_field_only_drops_that_binding() {
        let registry = MappingRegistry::builder()
            .with_source(
                "epsxe",
                "[default.targets]\na = \"cross\"\nstart = \"start\"\nhotkey = \"analog\"\n",
            )
            .expect("table parses")
            .build();
        let bindings = resolve_with(&registry, &[pad(1), pad(2)]);
        let buffer = Epsxe.render(&bindings, None).expect("renders");

        assert_eq!(buffer.len(), PAD_LAYOUT.required_len(2));
        assert_eq!(code(&buffer, 0, "cross"), 0x1000);
        assert_eq!(code(&buffer, 1, "start"), 0x2006);
    }
}
