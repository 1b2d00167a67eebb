//! Line-oriented `key = value` documents
//!
//! Covers both flat files (retroarch.cfg) and INI files with `[section]`
//! headers (Dolphin). Lines the launcher does not touch are kept verbatim,
//! so comments and unrelated settings survive a rewrite. Rendering is
//! deterministic: setting the same values twice gives the same bytes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValueStyle {
    pub separator: &'static str,
    /// Wrap values in double quotes (RetroArch)
    pub quote_values: bool,
}

impl KeyValueStyle {
    pub const QUOTED: KeyValueStyle = KeyValueStyle {
        separator: " = ",
        quote_values: true,
    };

    pub const INI: KeyValueStyle = KeyValueStyle {
        separator: " = ",
        quote_values: false,
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Section(String),
    Entry { key: String, value: String },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueDocument {
    lines: Vec<Line>,
    style: KeyValueStyle,
}

impl KeyValueDocument {
    pub fn new(style: KeyValueStyle) -> Self {
        Self {
            lines: Vec::new(),
            style,
        }
    }

    pub fn parse(content: &str, style: KeyValueStyle) -> Self {
        let lines = content
            .lines()
            .map(|raw| {
                let trimmed = raw.trim();
                if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() > 1 {
                    return Line::Section(trimmed[1..trimmed.len() - 1].trim().to_string());
                }
                if trimmed.starts_with('#') || trimmed.starts_with(';') {
                    return Line::Other(raw.to_string());
                }
                match trimmed.split_once('=') {
                    Some((key, value)) if !key.trim().is_empty() => Line::Entry {
                        key: key.trim().to_string(),
                        value: unquote(value.trim(), style.quote_values).to_string(),
                    },
                    _ => Line::Other(raw.to_string()),
                }
            })
            .collect();
        Self { lines, style }
    }

    pub fn get(&self, section: Option<&str>, key: &str) -> Option<&str> {
        let (start, end) = self.section_range(section)?;
        self.lines[start..end].iter().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Keys of a section in file order; empty when the section is absent
    pub fn keys(&self, section: Option<&str>) -> Vec<&str> {
        let Some((start, end)) = self.section_range(section) else {
            return Vec::new();
        };
        self.lines[start..end]
            .iter()
            .filter_map(|line| match line {
                Line::Entry { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Updates a key in place or appends it to its section.
    pub fn set(&mut self, section: Option<&str>, key: &str, value: &str) {
        let entry = Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
        };

        let Some((start, end)) = self.section_range(section) else {
            // section does not exist yet
            if !self.lines.is_empty() && !matches!(self.lines.last(), Some(Line::Other(l)) if l.trim().is_empty())
            {
                self.lines.push(Line::Other(String::new()));
            }
            if let Some(name) = section {
                self.lines.push(Line::Section(name.to_string()));
            }
            self.lines.push(entry);
            return;
        };

        if let Some(existing) = self.lines[start..end]
            .iter_mut()
            .find(|line| matches!(line, Line::Entry { key: k, .. } if k == key))
        {
            *existing = entry;
            return;
        }

        // after the last entry of the section, before trailing blank lines
        let insert_at = self.lines[start..end]
            .iter()
            .rposition(|line| !matches!(line, Line::Other(l) if l.trim().is_empty()))
            .map(|offset| start + offset + 1)
            .unwrap_or(start);
        self.lines.insert(insert_at, entry);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Section(name) => {
                    out.push('[');
                    out.push_str(name);
                    out.push(']');
                }
                Line::Entry { key, value } => {
                    out.push_str(key);
                    out.push_str(self.style.separator);
                    if self.style.quote_values {
                        out.push('"');
                        out.push_str(value);
                        out.push('"');
                    } else {
                        out.push_str(value);
                    }
                }
                Line::Other(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    /// Line range holding the section's entries, header excluded.
    ///
    /// `None` addresses the lines before the first header, possibly empty.
    fn section_range(&self, section: Option<&str>) -> Option<(usize, usize)> {
        let next_header = |from: usize| {
            self.lines[from..]
                .iter()
                .position(|line| matches!(line, Line::Section(_)))
                .map(|offset| from + offset)
                .unwrap_or(self.lines.len())
        };

        match section {
            None => Some((0, next_header(0))),
            Some(name) => {
                let header = self
                    .lines
                    .iter()
                    .position(|line| matches!(line, Line::Section(s) if s == name))?;
                Some((header + 1, next_header(header + 1)))
            }
        }
    }
}

fn unquote(value: &str, quoted: bool) -> &str {
    if quoted && value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETROARCH: &str = "# generated\nvideo_fullscreen = \"true\"\ninput_player1_a_btn = \"3\"\n";

    #[test]
    fn updates_in_place_and_appends() {
        let mut doc = KeyValueDocument::parse(RETROARCH, KeyValueStyle::QUOTED);
        assert_eq!(doc.get(None, "input_player1_a_btn"), Some("3"));
        doc.set(None, "input_player1_a_btn", "0");
        doc.set(None, "input_player1_b_btn", "1");
        assert_eq!(
            doc.render(),
            "# generated\nvideo_fullscreen = \"true\"\ninput_player1_a_btn = \"0\"\ninput_player1_b_btn = \"1\"\n"
        );
    }

    #[test]
    fn sections_are_created_and_reused() {
        let mut doc = KeyValueDocument::parse("[GCPad1]\nDevice = XInput/0/Gamepad\n", KeyValueStyle::INI);
        doc.set(Some("GCPad1"), "Buttons/A", "`Button 0`");
        doc.set(Some("GCPad2"), "Buttons/A", "`Button 1`");
        doc.set(Some("GCPad1"), "Device", "SDL/0/Pad");
        assert_eq!(
            doc.render(),
            "[GCPad1]\nDevice = SDL/0/Pad\nButtons/A = `Button 0`\n\n[GCPad2]\nButtons/A = `Button 1`\n"
        );
    }

    #[test]
    fn insert_lands_before_trailing_blank_lines() {
        let mut doc = KeyValueDocument::parse("[A]\nx = 1\n\n[B]\ny = 2\n", KeyValueStyle::INI);
        doc.set(Some("A"), "z", "3");
        assert_eq!(doc.render(), "[A]\nx = 1\nz = 3\n\n[B]\ny = 2\n");
    }

    #[test]
    fn rendering_is_idempotent() {
        let mut first = KeyValueDocument::parse(RETROARCH, KeyValueStyle::QUOTED);
        first.set(None, "input_player2_start_btn", "7");
        let once = first.render();

        let mut second = KeyValueDocument::parse(&once, KeyValueStyle::QUOTED);
        second.set(None, "input_player2_start_btn", "7");
        assert_eq!(second.render(), once);
    }

    #[test]
    fn keys_follow_file_order() {
        let doc = KeyValueDocument::parse("a = 1
# note
b = 2
[S]
c = 3
", KeyValueStyle::INI);
        assert_eq!(doc.keys(None), vec!["a", "b"]);
        assert_eq!(doc.keys(Some("S")), vec!["c"]);
        assert!(doc.keys(Some("Missing")).is_empty());
    }

    #[test]
    fn global_key_in_document_starting_with_section() {
        let mut doc = KeyValueDocument::parse("[Core]\nx = 1\n", KeyValueStyle::INI);
        assert_eq!(doc.get(None, "x"), None);
        doc.set(None, "version", "2");
        assert_eq!(doc.render(), "version = 2\n[Core]\nx = 1\n");
    }
}
