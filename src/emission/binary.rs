//! Fixed-layout binary configuration blobs
//!
//! Some emulators keep controller settings in opaque binary records. Rather
//! than poking magic offsets, a blob is described by a [`BlobLayout`]:
//!
//! ```text
//! ┌────────────── header ──────────────┐┌─ player 0 ─┐┌─ player 1 ─┐
//! │ magic │ player count (u32 LE) │ 0… ││ fields…    ││ fields…    │
//! └────────────────────────────────────┘└── stride ──┘└── stride ──┘
//! ```
//!
//! [`BlobLayout::prepare`] sizes the buffer for the configured player count
//! before any field is written, so writes can never run past the buffer.

use super::EmissionError;

/// One named field inside a player record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Offset from the start of the player record
    pub offset: usize,
    pub width: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, offset: usize, width: usize) -> Self {
        Self {
            name,
            offset,
            width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobLayout {
    pub magic: &'static [u8],
    pub header_len: usize,
    pub stride: usize,
    pub fields: &'static [FieldSpec],
}

impl BlobLayout {
    /// Checks that the header fits and every field stays inside its stride
    pub fn validate(&self) -> Result<(), EmissionError> {
        if self.header_len < self.magic.len() + 4 {
            return Err(EmissionError::Layout(format!(
                "header of {} bytes cannot hold magic and player count",
                self.header_len
            )));
        }
        for field in self.fields {
            if field.width == 0 || field.offset + field.width > self.stride {
                return Err(EmissionError::Layout(format!(
                    "field '{}' ({}+{}) exceeds stride {}",
                    field.name, field.offset, field.width, self.stride
                )));
            }
        }
        Ok(())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn required_len(&self, players: usize) -> usize {
        self.header_len + self.stride * players
    }

    /// Resizes `buffer` to exactly `players` records and refreshes the header.
    ///
    /// A buffer with a foreign or missing magic is replaced by a blank one.
    pub fn prepare(&self, buffer: &mut Vec<u8>, players: usize) -> Result<(), EmissionError> {
        self.validate()?;
        if !buffer.starts_with(self.magic) || buffer.len() < self.header_len {
            buffer.clear();
            buffer.extend_from_slice(self.magic);
        }
        buffer.resize(self.required_len(players), 0);

        let count = u32::try_from(players)
            .map_err(|_| EmissionError::Layout(format!("{} players do not fit a u32", players)))?;
        let at = self.magic.len();
        buffer[at..at + 4].copy_from_slice(&count.to_le_bytes());
        Ok(())
    }

    /// Byte range of one field of one player inside a prepared buffer
    fn range(&self, buffer_len: usize, player: usize, name: &str) -> Result<std::ops::Range<usize>, EmissionError> {
        let field = self
            .field(name)
            .ok_or_else(|| EmissionError::Layout(format!("unknown field '{}'", name)))?;
        let start = self.header_len + player * self.stride + field.offset;
        let end = start + field.width;
        if end > buffer_len {
            return Err(EmissionError::Layout(format!(
                "player {} field '{}' ends at {} past buffer of {} bytes",
                player, name, end, buffer_len
            )));
        }
        Ok(start..end)
    }

    pub fn write_field(
        &self,
        buffer: &mut [u8],
        player: usize,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), EmissionError> {
        let range = self.range(buffer.len(), player, name)?;
        if bytes.len() != range.len() {
            return Err(EmissionError::Layout(format!(
                "field '{}' is {} bytes wide, got {}",
                name,
                range.len(),
                bytes.len()
            )));
        }
        buffer[range].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read_field<'b>(&self, buffer: &'b [u8], player: usize, name: &str) -> Result<&'b [u8], EmissionError> {
        let range = self.range(buffer.len(), player, name)?;
        Ok(&buffer[range])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[FieldSpec] = &[FieldSpec::new("cross", 0, 4), FieldSpec::new("start", 4, 2)];
    const LAYOUT: BlobLayout = BlobLayout {
        magic: b"TEST",
        header_len: 12,
        stride: 8,
        fields: FIELDS,
    };

    #[test]
    fn prepare_allocates_for_players() {
        let mut buffer = Vec::new();
        LAYOUT.prepare(&mut buffer, 2).expect("layout valid");
        assert_eq!(buffer.len(), 28);
        assert_eq!(&buffer[..4], b"TEST");
        assert_eq!(&buffer[4..8], &2u32.to_le_bytes());
    }

    #[test]
    fn prepare_keeps_existing_records_and_trims_extra_players() {
        let mut buffer = Vec::new();
        LAYOUT.prepare(&mut buffer, 3).expect("layout valid");
        LAYOUT
            .write_field(&mut buffer, 0, "cross", &[1, 2, 3, 4])
            .expect("in range");
        LAYOUT.prepare(&mut buffer, 1).expect("layout valid");
        assert_eq!(buffer.len(), 20);
        assert_eq!(LAYOUT.read_field(&buffer, 0, "cross").ok(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn foreign_buffer_is_replaced() {
        let mut buffer = b"garbage that is long enough".to_vec();
        LAYOUT.prepare(&mut buffer, 1).expect("layout valid");
        assert_eq!(&buffer[..4], b"TEST");
        assert!(buffer[12..].iter().all(|b| *b == 0));
    }

    #[test]
    fn writes_past_prepared_players_fail() {
        let mut buffer = Vec::new();
        LAYOUT.prepare(&mut buffer, 1).expect("layout valid");
        let result = LAYOUT.write_field(&mut buffer, 1, "cross", &[0; 4]);
        assert!(matches!(result, Err(EmissionError::Layout(_))));
        assert_eq!(buffer.len(), 20);
    }

    #[test]
    fn width_and_name_are_checked() {
        let mut buffer = Vec::new();
        LAYOUT.prepare(&mut buffer, 1).expect("layout valid");
        assert!(LAYOUT.write_field(&mut buffer, 0, "start", &[0; 4]).is_err());
        assert!(LAYOUT.write_field(&mut buffer, 0, "circle", &[0; 4]).is_err());
        assert!(LAYOUT.write_field(&mut buffer, 0, "start", &[7, 0]).is_ok());
    }

    #[test]
    fn overlong_field_is_rejected() {
        const BAD: &[FieldSpec] = &[FieldSpec::new("wide", 6, 4)];
        let layout = BlobLayout {
            fields: BAD,
            ..LAYOUT
        };
        assert!(layout.validate().is_err());
    }
}
