// StoreLens - core/reader.rs
//
// Tolerant delimited-log reading.
// Core layer: accepts raw bytes, never touches storage directly.
//
// Invariants:
//   - Decoding never fails: Latin-1 maps every byte, UTF-8 replaces invalid
//     sequences with U+FFFD.
//   - An empty or whitespace-only source yields an empty `Log`, not an error.
//   - Ragged rows are tolerated: the reader is flexible over decoded text,
//     so a row's length never fails the log.

use crate::core::model::{Log, LogRow};

/// UTF-8 byte-order mark some exporters prepend.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Text encoding of the source logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// ISO-8859-1. The legacy exporters write this.
    #[default]
    Latin1,
    /// UTF-8 with lossy replacement of invalid sequences.
    Utf8,
}

impl TextEncoding {
    /// Parse a config value such as `"latin1"` or `"utf-8"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "latin1" | "latin-1" | "iso-8859-1" => Some(Self::Latin1),
            "utf8" | "utf-8" => Some(Self::Utf8),
            _ => None,
        }
    }

    /// Decode `bytes`, dropping a leading UTF-8 byte-order mark.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        match self {
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Configuration for log reading.
#[derive(Debug, Clone, Default)]
pub struct ReadConfig {
    pub encoding: TextEncoding,
    /// Stop after this many data rows. `None` reads everything.
    pub max_rows: Option<usize>,
}

/// Parse a delimited log, using the first line as the header.
///
/// Short rows omit the columns they lack; surplus fields beyond the header
/// are dropped. When `config.max_rows` is set, only that many data rows are
/// consumed and `Log::truncated` records whether anything was left unread.
pub fn read_log(bytes: &[u8], config: &ReadConfig) -> Log {
    let text = config.encoding.decode(bytes);
    if text.trim().is_empty() {
        return Log::default();
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(record) => record.iter().map(str::to_string).collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Unreadable log header; treating log as absent");
            return Log::default();
        }
    };

    let mut log = Log {
        headers,
        ..Log::default()
    };
    let mut consumed: usize = 0;

    for result in reader.records() {
        if config.max_rows.is_some_and(|max| consumed >= max) {
            log.truncated = true;
            break;
        }
        consumed += 1;

        match result {
            Ok(record) => {
                let row: LogRow = log
                    .headers
                    .iter()
                    .zip(record.iter())
                    .map(|(h, v)| (h.clone(), v.to_string()))
                    .collect();
                log.rows.push(row);
            }
            Err(e) => {
                tracing::debug!(error = %e, row = consumed, "Skipping unreadable log row");
            }
        }
    }

    if log.truncated {
        tracing::debug!(
            rows = log.rows.len(),
            "Log truncated at configured row cap"
        );
    }

    log
}
