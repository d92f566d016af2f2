//! Newline-delimited record decoder for chat response streams.
//!
//! Wire format: one record per line, each line either blank or
//! `data: {json}`. Network reads may split a line (and a UTF-8 sequence)
//! anywhere, so raw bytes are buffered until a full line is available.
//! Lines that are not data records, fail to parse, or carry an unknown
//! `type` are skipped without aborting the stream.

use crate::StreamRecord;

/// Prefix of a data record line.
const DATA_PREFIX: &str = "data:";

/// Sentinel some backends send after the last record.
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder from response bytes to [`StreamRecord`]s.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    buffer: Vec<u8>,
    skipped: usize,
}

impl RecordDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of response bytes, returning every record completed by it
    /// in arrival order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamRecord> {
        self.buffer.extend_from_slice(bytes);

        let mut records = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(record) = self.decode_line(&line) {
                records.push(record);
            }
        }
        records
    }

    /// Decode whatever is left in the buffer once the stream has ended.
    ///
    /// A final record is not required to be newline-terminated.
    pub fn finish(&mut self) -> Option<StreamRecord> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        self.decode_line(&line)
    }

    /// Number of non-blank lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes buffered while waiting for the end of a line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<StreamRecord> {
        let text = match std::str::from_utf8(line) {
            Ok(text) => text.trim_end_matches(['\r', '\n']),
            Err(e) => {
                tracing::warn!("skipping non utf-8 record: {e}");
                self.skipped += 1;
                return None;
            }
        };
        if text.trim().is_empty() {
            return None;
        }

        let Some(payload) = text.strip_prefix(DATA_PREFIX) else {
            tracing::debug!("skipping non-data line: {text}");
            self.skipped += 1;
            return None;
        };
        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return None;
        }

        match serde_json::from_str::<StreamRecord>(payload) {
            Ok(StreamRecord::Unknown) => {
                tracing::debug!("skipping record of unknown type: {payload}");
                self.skipped += 1;
                None
            }
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("skipping malformed record: {e}, data: {payload}");
                self.skipped += 1;
                None
            }
        }
    }
}
