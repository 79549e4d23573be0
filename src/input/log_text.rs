//! Turning raw log bytes into analyzable lines
//!
//! Preparation decodes the bytes (BOM-aware, lossy UTF-8 otherwise), splits on
//! any line terminator, strips control characters, trims, and drops blank
//! lines. Collapsing runs of identical lines is optional.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Options for [`prepare`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogTextOptions {
    /// Keep only the first line of each run of identical lines
    pub collapse_repeated_lines: bool,
}

/// Text encoding detected from a byte-order mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl Encoding {
    /// Detect the encoding from a leading BOM, defaulting to UTF-8
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(UTF16_LE_BOM) {
            Encoding::Utf16Le
        } else if bytes.starts_with(UTF16_BE_BOM) {
            Encoding::Utf16Be
        } else {
            Encoding::Utf8
        }
    }
}

/// Decode log bytes into text
///
/// Invalid sequences are replaced with U+FFFD rather than rejected.
pub fn decode(bytes: &[u8]) -> String {
    match Encoding::detect(bytes) {
        Encoding::Utf8 => {
            let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            String::from_utf8_lossy(body).into_owned()
        }
        Encoding::Utf16Le => decode_utf16(&bytes[UTF16_LE_BOM.len()..], u16::from_le_bytes),
        Encoding::Utf16Be => decode_utf16(&bytes[UTF16_BE_BOM.len()..], u16::from_be_bytes),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Remove C0 control characters other than tab, plus DEL
fn strip_control_chars(line: &str) -> String {
    line.chars()
        .filter(|&c| c == '\t' || !(c.is_ascii_control()))
        .collect()
}

/// Split text into trimmed, non-empty lines
///
/// `\r\n`, `\r` and `\n` all terminate a line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split(['\r', '\n'])
        .map(strip_control_chars)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Drop lines identical to the line before them
pub fn collapse_repeated(mut lines: Vec<String>) -> Vec<String> {
    lines.dedup();
    lines
}

/// Decode and split raw log bytes
pub fn prepare(bytes: &[u8], options: LogTextOptions) -> Vec<String> {
    let text = decode(bytes);
    let lines = split_lines(&text);
    tracing::debug!(bytes = bytes.len(), lines = lines.len(), "split log text");

    if options.collapse_repeated_lines {
        let before = lines.len();
        let lines = collapse_repeated(lines);
        tracing::debug!(removed = before - lines.len(), "collapsed repeated lines");
        lines
    } else {
        lines
    }
}

/// Read and prepare a log file
pub fn read_log_file(path: &Path, options: LogTextOptions) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(prepare(&bytes, options))
}

/// Read and prepare everything on a reader, e.g. stdin
pub fn read_log<R: Read>(mut reader: R, options: LogTextOptions) -> io::Result<Vec<String>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(prepare(&bytes, options))
}
