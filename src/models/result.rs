use super::Quad;

/// One decoded symbol: payload plus its corners in original-image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRecord {
    /// Payload bytes exactly as stored in the symbol
    pub data: Vec<u8>,
    /// Payload as text (see [`payload_text`])
    pub text: String,
    /// Symbol corners in the frame of the image passed to the detector
    pub quad: Quad,
}

impl DecodeRecord {
    /// Create a record from a text payload
    pub fn new(text: impl Into<String>, quad: Quad) -> Self {
        let text = text.into();
        Self {
            data: text.as_bytes().to_vec(),
            text,
            quad,
        }
    }

    /// Create a record from raw payload bytes
    pub fn from_payload(data: Vec<u8>, quad: Quad) -> Self {
        Self {
            text: payload_text(&data),
            data,
            quad,
        }
    }
}

/// Text view of a payload: UTF-8 when the bytes are valid UTF-8, otherwise
/// ISO-8859-1, the default byte-mode character set.
pub fn payload_text(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => data.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Ordered decode results of one `detect_and_decode` call.
///
/// Insertion order is discovery order (candidate, then symbol); nothing is
/// sorted by position or confidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<DecodeRecord>,
}

impl ResultSet {
    /// Empty result set
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: DecodeRecord) {
        self.records.push(record);
    }

    /// Number of decoded symbols
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing was decoded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Option<&DecodeRecord> {
        self.records.get(index)
    }

    /// Iterate records in discovery order
    pub fn iter(&self) -> std::slice::Iter<'_, DecodeRecord> {
        self.records.iter()
    }

    /// Decoded payloads in discovery order
    pub fn texts(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.text.as_str()).collect()
    }
}

impl IntoIterator for ResultSet {
    type Item = DecodeRecord;
    type IntoIter = std::vec::IntoIter<DecodeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a DecodeRecord;
    type IntoIter = std::slice::Iter<'a, DecodeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
