//! Mapping pass over all connected controllers
//!
//! Runs the resolver for every player and every action of the selected
//! table, sequentially and in player order. Errors are isolated: a broken
//! descriptor only unbinds its own action, a broken controller never stops
//! the others. Only a missing table aborts the pass.

use super::error::MappingError;
use super::resolver::{BindingResolver, ResolvedBinding};
use super::table::{Mapping, MappingRegistry};
use crate::controller::{classify, Classification, Controller, TechnologyPolicy};
use tracing::{debug, info, warn};

/// Everything resolved for one emulator port
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBindings {
    /// 1-based emulator port the controller landed on
    pub port: u8,
    /// Player index the frontend assigned
    pub player: u8,
    pub controller_name: String,
    pub device_path: String,
    pub classification: Classification,
    pub bindings: Vec<ResolvedBinding>,
}

impl PlayerBindings {
    pub fn binding(&self, target: &str) -> Option<&ResolvedBinding> {
        self.bindings.iter().find(|binding| binding.target == target)
    }
}

/// Output of a pass, ready for an emission adapter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolvedBindings {
    pub emulator: String,
    pub players: Vec<PlayerBindings>,
}

impl ResolvedBindings {
    pub fn port(&self, port: u8) -> Option<&PlayerBindings> {
        self.players.iter().find(|player| player.port == port)
    }
}

pub struct MappingPass<'a> {
    registry: &'a MappingRegistry,
    resolver: BindingResolver<'a>,
    policy: TechnologyPolicy,
    max_players: usize,
}

impl<'a> MappingPass<'a> {
    pub fn new(
        registry: &'a MappingRegistry,
        resolver: BindingResolver<'a>,
        policy: TechnologyPolicy,
        max_players: usize,
    ) -> Self {
        Self {
            registry,
            resolver,
            policy,
            max_players,
        }
    }

    /// Resolves all players for one game.
    ///
    /// Keyboards are skipped; controllers beyond the emulator's port count
    /// are ignored. Returns [`MappingError::NoUsableController`] when no
    /// gamepad is left, so the caller can keep the emulator's own defaults.
    pub fn run(
        &self,
        emulator: &str,
        system: &str,
        rom: &str,
        controllers: &[Controller],
    ) -> Result<ResolvedBindings, MappingError> {
        let mapping = self.registry.load(emulator, system, rom)?;

        let mut pads: Vec<&Controller> = controllers.iter().filter(|c| !c.is_keyboard).collect();
        if pads.is_empty() {
            return Err(MappingError::NoUsableController(emulator.to_string()));
        }
        pads.sort_by_key(|c| c.player);

        if pads.len() > self.max_players {
            info!(
                "{} supports {} players, ignoring {} extra controllers",
                emulator,
                self.max_players,
                pads.len() - self.max_players
            );
            pads.truncate(self.max_players);
        }

        let mut players = Vec::with_capacity(pads.len());
        for (slot, controller) in pads.into_iter().enumerate() {
            let port = u8::try_from(slot + 1).unwrap_or(u8::MAX);
            let mapping = match self.registry.load_for_class(emulator, controller.device_class) {
                Some(class_mapping) => {
                    info!(
                        "Using {} mapping for {} on port {}",
                        controller.device_class, controller.name, port
                    );
                    class_mapping
                }
                None => mapping,
            };
            players.push(self.map_controller(port, controller, mapping));
        }

        info!("Resolved bindings for {} players of {}", players.len(), emulator);
        Ok(ResolvedBindings {
            emulator: emulator.to_string(),
            players,
        })
    }

    fn map_controller(&self, port: u8, controller: &Controller, mapping: &Mapping) -> PlayerBindings {
        let classification = classify(controller, &self.policy);
        debug!(
            "Port {}: {} classified as {:?}",
            port, controller.name, classification
        );

        let bindings = mapping
            .iter()
            .map(|(action, target)| {
                self.resolver
                    .resolve_binding(controller, action, target, &classification, mapping)
                    .unwrap_or_else(|e| {
                        warn!("{} on {}: {}, leaving unbound", action, controller.name, e);
                        ResolvedBinding {
                            action,
                            target: target.to_string(),
                            token: self.resolver.unbound(),
                            source: None,
                        }
                    })
            })
            .collect();

        PlayerBindings {
            port,
            player: controller.player,
            controller_name: controller.name.clone(),
            device_path: controller.device_path.clone(),
            classification,
            bindings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{
        DeviceClass, InputConfig, InputKind, InputTechnology, LogicalAction, PhysicalInput, Vendor,
    };
    use crate::mapping::encoder::{OutputToken, RetroArchEncoder};
    use crate::mapping::resolver::ButtonSwapTable;

    const TABLE: &str = r#"
[default.targets]
a = "a"
start = "start"
up = "up"

[class_wheel.targets]
l2 = "brake"
"#;

    fn registry() -> MappingRegistry {
        MappingRegistry::builder()
            .with_source("retroarch", TABLE)
            .expect("table parses")
            .build()
    }

    fn pad(player: u8, bindings: &[(LogicalAction, PhysicalInput)]) -> Controller {
        let input: InputConfig = bindings.iter().copied().collect();
        Controller::new(format!("hid#{}", player), format!("pad {}", player), player)
            .with_vendor(Vendor::Microsoft)
            .with_indices(None, None, Some(u32::from(player) - 1))
            .with_input(input)
    }

    fn run(controllers: &[Controller], max_players: usize) -> Result<ResolvedBindings, MappingError> {
        let registry = registry();
        let swaps = ButtonSwapTable::none();
        let pass = MappingPass::new(
            &registry,
            BindingResolver::new(&RetroArchEncoder, &swaps),
            TechnologyPolicy::only(InputTechnology::Sdl),
            max_players,
        );
        pass.run("retroarch", "snes", "smw", controllers)
    }

    #[test]
    fn players_are_ordered_and_truncated() {
        let controllers = vec![pad(3, &[]), pad(1, &[]), pad(2, &[])];
        let resolved = run(&controllers, 2).expect("pass runs");
        let players: Vec<u8> = resolved.players.iter().map(|p| p.player).collect();
        assert_eq!(players, vec![1, 2]);
        assert_eq!(resolved.players[1].port, 2);
    }

    #[test]
    fn every_table_action_gets_a_token() {
        let controllers = vec![pad(1, &[(LogicalAction::A, PhysicalInput::button(0))])];
        let resolved = run(&controllers, 4).expect("pass runs");
        let player = resolved.port(1).expect("port 1");
        assert_eq!(player.bindings.len(), 3);
        assert_eq!(player.binding("a").map(|b| &b.token), Some(&OutputToken::text("0")));
        assert_eq!(player.binding("up").map(|b| &b.token), Some(&OutputToken::text("nul")));
    }

    #[test]
    fn bad_descriptor_only_unbinds_its_action() {
        let broken = PhysicalInput {
            kind: InputKind::Unknown,
            id: 0,
            value: 0,
        };
        let controllers = vec![
            pad(
                1,
                &[
                    (LogicalAction::Start, broken),
                    (LogicalAction::A, PhysicalInput::button(2)),
                ],
            ),
            pad(2, &[(LogicalAction::Start, PhysicalInput::button(7))]),
        ];
        let resolved = run(&controllers, 4).expect("pass runs");
        let first = resolved.port(1).expect("port 1");
        assert_eq!(first.binding("start").map(|b| b.is_bound()), Some(false));
        assert_eq!(first.binding("a").map(|b| &b.token), Some(&OutputToken::text("2")));
        let second = resolved.port(2).expect("port 2");
        assert_eq!(second.binding("start").map(|b| &b.token), Some(&OutputToken::text("7")));
    }

    #[test]
    fn keyboards_only_means_no_usable_controller() {
        let mut keyboard = pad(1, &[]);
        keyboard.is_keyboard = true;
        assert!(matches!(
            run(&[keyboard], 4),
            Err(MappingError::NoUsableController(_))
        ));
    }

    #[test]
    fn wheels_use_their_class_table() {
        let mut wheel = pad(1, &[(LogicalAction::L2, PhysicalInput::axis(2, 1))]);
        wheel.device_class = DeviceClass::Wheel;
        let resolved = run(&[wheel], 4).expect("pass runs");
        let player = resolved.port(1).expect("port 1");
        assert_eq!(player.bindings.len(), 1);
        assert_eq!(player.binding("brake").map(|b| &b.token), Some(&OutputToken::text("+2")));
    }
}
