//! MAME controller configuration documents
//!
//! Writes a `ctrlr` file: a `<mameconfig>` with one `<port>` per bound
//! input. The launcher owns the whole file, so it is regenerated rather than
//! patched; output depends only on the ports passed in.

use super::EmissionError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

pub const MAME_CONFIG_VERSION: &str = "10";

/// One `<port type=…><newseq>…</newseq></port>` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPort {
    pub port_type: String,
    pub sequence: String,
}

impl InputPort {
    pub fn new(port_type: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            port_type: port_type.into(),
            sequence: sequence.into(),
        }
    }
}

fn xml_error(e: impl std::fmt::Display) -> EmissionError {
    EmissionError::Xml(e.to_string())
}

/// Renders a MAME controller document for the `default` system
pub fn render_mame_config(ports: &[InputPort]) -> Result<Vec<u8>, EmissionError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("mameconfig").with_attributes([("version", MAME_CONFIG_VERSION)]),
        ))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("system").with_attributes([("name", "default")]),
        ))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Start(BytesStart::new("input")))
        .map_err(xml_error)?;

    for port in ports {
        writer
            .write_event(Event::Start(
                BytesStart::new("port").with_attributes([("type", port.port_type.as_str())]),
            ))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Start(
                BytesStart::new("newseq").with_attributes([("type", "standard")]),
            ))
            .map_err(xml_error)?;
        writer
            .write_event(Event::Text(BytesText::new(&port.sequence)))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("newseq")))
            .map_err(xml_error)?;
        writer
            .write_event(Event::End(BytesEnd::new("port")))
            .map_err(xml_error)?;
    }

    for name in ["input", "system", "mameconfig"] {
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)?;
    }

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_contains_ports_in_order() {
        let ports = vec![
            InputPort::new("P1_BUTTON1", "JOYCODE_1_BUTTON1"),
            InputPort::new("P1_JOYSTICK_UP", "JOYCODE_1_HAT1UP OR JOYCODE_1_YAXIS_UP_SWITCH"),
        ];
        let bytes = render_mame_config(&ports).expect("renders");
        let text = String::from_utf8(bytes).expect("utf-8");
        assert!(text.starts_with("<?xml version=\"1.0\"?>"));
        assert!(text.contains("<mameconfig version=\"10\">"));
        let first = text.find("P1_BUTTON1").expect("first port");
        let second = text.find("P1_JOYSTICK_UP").expect("second port");
        assert!(first < second);
        assert!(text.contains(">JOYCODE_1_HAT1UP OR JOYCODE_1_YAXIS_UP_SWITCH</newseq>"));
        assert!(text.trim_end().ends_with("</mameconfig>"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let ports = vec![InputPort::new("START1", "JOYCODE_1_BUTTON8")];
        assert_eq!(
            render_mame_config(&ports).expect("renders"),
            render_mame_config(&ports).expect("renders")
        );
    }
}
