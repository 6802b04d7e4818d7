use std::io::Write;

/// Splits a header at its first run of ASCII whitespace.
pub(crate) fn split_header(header: &[u8]) -> (&[u8], &[u8]) {
    match header.iter().position(u8::is_ascii_whitespace) {
        Some(i) => (&header[..i], header[i..].trim_ascii_start()),
        None => (header, &header[header.len()..]),
    }
}

pub trait Record {
    /// Returns the identifier of the record (header up to the first whitespace).
    fn id(&self) -> &[u8];

    /// Returns the sequence of the record.
    fn seq(&self) -> &[u8];

    /// Returns the quality scores of the record (if available).
    fn qual(&self) -> Option<&[u8]>;

    /// Writes the record in its native textual form to a Write.
    fn write_record<W: Write>(&self, writer: &mut W) -> std::io::Result<()>;

    /// Number of residues in the sequence
    fn len(&self) -> usize {
        self.seq().len()
    }

    fn is_empty(&self) -> bool {
        self.seq().is_empty()
    }

    /// Convert ID to string (UTF-8), replacing invalid bytes.
    fn id_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(self.id())
    }

    /// Convert sequence to string reference (UTF-8)
    ///
    /// # Safety
    /// Will panic if sequence is not valid UTF-8
    fn seq_str(&self) -> &str {
        std::str::from_utf8(self.seq()).unwrap()
    }

    /// Convert quality to string reference (UTF-8)
    ///
    /// # Safety
    /// Will panic if quality is not valid UTF-8
    fn qual_str(&self) -> &str {
        if let Some(qual) = self.qual() {
            std::str::from_utf8(qual).unwrap()
        } else {
            ""
        }
    }

    /// Renders the record's textual form into a new buffer.
    fn to_text(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.len() * 2 + 64);
        // Writing into a Vec cannot fail
        let _ = self.write_record(&mut buffer);
        buffer
    }
}
