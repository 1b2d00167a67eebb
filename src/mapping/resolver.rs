//! Binding resolver
//!
//! Turns one `(controller, logical action)` pair into an output token:
//!
//! ```text
//! descriptor ──► button: vendor swap, base offset ─┐
//!            ──► axis:   sign XOR revert flag ─────┼──► encoder ──► OutputToken
//!            ──► hat:    cardinal bitmask decode ──┘
//! absent     ──────────────────────────────────────────► encoder.unbound()
//! ```
//!
//! The decoding is shared by every emulator; only the encoder differs.

use super::encoder::{AxisDirection, HatDirection, OutputToken, ResolvedInput, TokenEncoder};
use super::error::MappingError;
use super::table::Mapping;
use crate::controller::{Classification, Controller, InputKind, LogicalAction, PhysicalInput, VendorClass};
use tracing::debug;

/// Physical button renumbering for one vendor class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSwapRule {
    pub vendor: VendorClass,
    /// Actions the rule applies to
    pub actions: Vec<LogicalAction>,
    /// Button id pairs exchanged in both directions
    pub pairs: Vec<(u32, u32)>,
}

impl ButtonSwapRule {
    fn apply(&self, id: u32) -> u32 {
        for (left, right) in &self.pairs {
            if id == *left {
                return *right;
            }
            if id == *right {
                return *left;
            }
        }
        id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonSwapTable {
    rules: Vec<ButtonSwapRule>,
}

impl ButtonSwapTable {
    pub fn none() -> Self {
        Self::default()
    }

    /// Nintendo pads put A/B and X/Y in mirrored positions relative to an Xbox pad
    pub fn nintendo_face_buttons() -> Self {
        Self {
            rules: vec![
                ButtonSwapRule {
                    vendor: VendorClass::Nintendo,
                    actions: vec![LogicalAction::A, LogicalAction::B],
                    pairs: vec![(0, 1)],
                },
                ButtonSwapRule {
                    vendor: VendorClass::Nintendo,
                    actions: vec![LogicalAction::X, LogicalAction::Y],
                    pairs: vec![(2, 3)],
                },
            ],
        }
    }

    pub fn with_rule(mut self, rule: ButtonSwapRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Button id after every rule matching vendor and action
    pub fn remap(&self, vendor: VendorClass, action: LogicalAction, id: u32) -> u32 {
        self.rules
            .iter()
            .filter(|rule| rule.vendor == vendor && rule.actions.contains(&action))
            .fold(id, |id, rule| rule.apply(id))
    }
}

/// Resolved value for one action of one player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinding {
    pub action: LogicalAction,
    /// Emulator-side input name from the mapping table
    pub target: String,
    pub token: OutputToken,
    /// Decoded physical input, `None` when unbound
    pub source: Option<ResolvedInput>,
}

impl ResolvedBinding {
    pub fn is_bound(&self) -> bool {
        self.source.is_some()
    }
}

/// Shared decoding logic parameterized by a per-format encoder
pub struct BindingResolver<'a> {
    encoder: &'a dyn TokenEncoder,
    swaps: &'a ButtonSwapTable,
}

impl<'a> BindingResolver<'a> {
    pub fn new(encoder: &'a dyn TokenEncoder, swaps: &'a ButtonSwapTable) -> Self {
        Self { encoder, swaps }
    }

    pub fn unbound(&self) -> OutputToken {
        self.encoder.unbound()
    }

    /// Decodes one descriptor.
    ///
    /// `Ok(None)` means the descriptor exists but maps to nothing
    /// (diagonal or empty hat mask).
    pub fn decode(
        &self,
        input: &PhysicalInput,
        action: LogicalAction,
        vendor: VendorClass,
        reverted: bool,
    ) -> Result<Option<ResolvedInput>, MappingError> {
        match input.kind {
            InputKind::Button => {
                let id = self.swaps.remap(vendor, action, input.id) + self.encoder.button_base();
                Ok(Some(ResolvedInput::Button { id }))
            }
            InputKind::Axis => {
                let mut direction = AxisDirection::from_value(input.value);
                if reverted {
                    direction = direction.flipped();
                }
                Ok(Some(ResolvedInput::Axis {
                    id: input.id,
                    direction,
                }))
            }
            InputKind::Hat => match HatDirection::from_mask(input.value) {
                Some(direction) => Ok(Some(ResolvedInput::Hat {
                    id: input.id,
                    direction,
                })),
                None => {
                    debug!(
                        "Hat mask {} on {} is not a cardinal direction",
                        input.value, action
                    );
                    Ok(None)
                }
            },
            kind @ (InputKind::Key | InputKind::Unknown) => {
                Err(MappingError::UnsupportedInputType { action, kind })
            }
        }
    }

    /// Token for one action of one controller
    pub fn resolve(
        &self,
        controller: &Controller,
        action: LogicalAction,
        classification: &Classification,
        mapping: &Mapping,
    ) -> Result<OutputToken, MappingError> {
        Ok(self
            .resolve_input(controller, action, classification, mapping)?
            .map(|input| self.encoder.encode(classification.effective_index, &input))
            .unwrap_or_else(|| self.encoder.unbound()))
    }

    /// Full binding record for one action, target taken from the mapping
    pub fn resolve_binding(
        &self,
        controller: &Controller,
        action: LogicalAction,
        target: &str,
        classification: &Classification,
        mapping: &Mapping,
    ) -> Result<ResolvedBinding, MappingError> {
        let source = self.resolve_input(controller, action, classification, mapping)?;
        let token = match &source {
            Some(input) => self.encoder.encode(classification.effective_index, input),
            None => self.encoder.unbound(),
        };
        debug!(
            "Player {} {} -> {} = {}",
            controller.player, action, target, token
        );
        Ok(ResolvedBinding {
            action,
            target: target.to_string(),
            token,
            source,
        })
    }

    fn resolve_input(
        &self,
        controller: &Controller,
        action: LogicalAction,
        classification: &Classification,
        mapping: &Mapping,
    ) -> Result<Option<ResolvedInput>, MappingError> {
        match controller.input.get(action) {
            Some(input) => self.decode(
                input,
                action,
                classification.vendor_class,
                mapping.is_reverted(action),
            ),
            None => Ok(None),
        }
    }
}
