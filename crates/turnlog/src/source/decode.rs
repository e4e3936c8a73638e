//! Text decoding for log files of uncertain encoding.
//!
//! Engine logs are usually UTF-8, but logs copied off Windows machines are
//! often UTF-16 LE, with or without a byte-order mark. Detection order:
//!
//! 1. UTF-8 BOM, UTF-16 LE BOM, UTF-16 BE BOM.
//! 2. BOM-less UTF-16 LE: most odd bytes are NUL while even bytes are not.
//! 3. UTF-8, lossily replacing invalid sequences.

use serde::Serialize;
use std::fmt;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Bytes inspected by the BOM-less UTF-16 heuristic.
const SNIFF_LEN: usize = 4096;

/// Encoding a source was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// UTF-8 with invalid sequences replaced by U+FFFD.
    Utf8Lossy,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Bom => "utf-8-bom",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Utf8Lossy => "utf-8-lossy",
        })
    }
}

/// Decode raw file bytes into text, reporting the encoding used.
pub fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return (
            String::from_utf8_lossy(rest).into_owned(),
            TextEncoding::Utf8Bom,
        );
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return (decode_utf16(rest, u16::from_le_bytes), TextEncoding::Utf16Le);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return (decode_utf16(rest, u16::from_be_bytes), TextEncoding::Utf16Be);
    }
    if looks_like_utf16_le(bytes) {
        return (decode_utf16(bytes, u16::from_le_bytes), TextEncoding::Utf16Le);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), TextEncoding::Utf8),
        Err(_) => (
            String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf8Lossy,
        ),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// ASCII-heavy UTF-16 LE text has a NUL in nearly every odd byte.
fn looks_like_utf16_le(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    let pairs = sample.len() / 2;
    if pairs < 2 {
        return false;
    }
    let (mut odd_nul, mut even_nul) = (0usize, 0usize);
    for pair in sample.chunks_exact(2) {
        if pair[0] == 0 {
            even_nul += 1;
        }
        if pair[1] == 0 {
            odd_nul += 1;
        }
    }
    odd_nul * 10 >= pairs * 7 && even_nul * 10 <= pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16_le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn plain_utf8() {
        let (text, enc) = decode("LogTemp: ターン開始\n".as_bytes());
        assert_eq!(text, "LogTemp: ターン開始\n");
        assert_eq!(enc, TextEncoding::Utf8);
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"Turn,Event\n");
        let (text, enc) = decode(&bytes);
        assert_eq!(text, "Turn,Event\n");
        assert_eq!(enc, TextEncoding::Utf8Bom);
    }

    #[test]
    fn utf16_le_with_bom() {
        let mut bytes = UTF16_LE_BOM.to_vec();
        bytes.extend(utf16_le("Error: boom\n"));
        let (text, enc) = decode(&bytes);
        assert_eq!(text, "Error: boom\n");
        assert_eq!(enc, TextEncoding::Utf16Le);
    }

    #[test]
    fn utf16_be_with_bom() {
        let mut bytes = UTF16_BE_BOM.to_vec();
        bytes.extend("ok".encode_utf16().flat_map(|u| u.to_be_bytes()));
        let (text, enc) = decode(&bytes);
        assert_eq!(text, "ok");
        assert_eq!(enc, TextEncoding::Utf16Be);
    }

    #[test]
    fn utf16_le_without_bom_is_sniffed() {
        let (text, enc) = decode(&utf16_le("LogTurnManager: Display: turn 3\n"));
        assert_eq!(text, "LogTurnManager: Display: turn 3\n");
        assert_eq!(enc, TextEncoding::Utf16Le);
    }

    #[test]
    fn invalid_utf8_is_lossy() {
        let (text, enc) = decode(b"bad \xff byte");
        assert_eq!(text, "bad \u{FFFD} byte");
        assert_eq!(enc, TextEncoding::Utf8Lossy);
    }

    #[test]
    fn empty_input_is_utf8() {
        assert_eq!(decode(b""), (String::new(), TextEncoding::Utf8));
    }
}
