//! CSV record handling for session logs.
//!
//! A record is the unit of a structured source: a quoted field may span
//! physical lines, so `"Error: stuck\nat (3,4)"` stays inside one record.
//! Records keep their raw text so output shows them exactly as written.
//! Blank lines between records are not records.

use csv::{ByteRecord, Reader, ReaderBuilder, StringRecord};
use tracing::warn;

fn reader(text: &str) -> Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
}

/// Split `text` into the raw text of each CSV record, terminators removed.
pub fn split_records(text: &str) -> Vec<&str> {
    let mut rdr = reader(text);
    let mut record = ByteRecord::new();
    let mut starts = Vec::new();
    loop {
        match rdr.read_byte_record(&mut record) {
            Ok(true) => starts.push(record.position().map_or(0, |p| p.byte() as usize)),
            Ok(false) => break,
            Err(e) => {
                warn!("CSV parse stopped at byte {}: {e}", rdr.position().byte());
                starts.push(rdr.position().byte() as usize);
                break;
            }
        }
    }

    // Each record spans from its start to the next record's start. Line
    // terminators and skipped blank lines sit at either edge of that span.
    let ends = starts.iter().skip(1).copied().chain([text.len()]);
    starts
        .iter()
        .zip(ends)
        .filter_map(|(&start, end)| text.get(start..end))
        .map(|raw| raw.trim_matches(['\r', '\n']))
        .filter(|raw| !raw.is_empty())
        .collect()
}

/// Parse one record's raw text into fields. Text that holds no record yields
/// an empty record.
pub fn parse_record(raw: &str) -> StringRecord {
    let mut record = StringRecord::new();
    if !matches!(reader(raw).read_record(&mut record), Ok(true)) {
        record.clear();
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(raw: &str) -> Vec<String> {
        parse_record(raw).iter().map(str::to_string).collect()
    }

    #[test]
    fn one_record_per_line() {
        assert_eq!(
            split_records("Turn,Event\n5,Intent\r\n6,Move"),
            vec!["Turn,Event", "5,Intent", "6,Move"]
        );
    }

    #[test]
    fn quoted_newline_stays_in_record() {
        let text = "Turn,Msg\n5,\"Error: stuck\nat (3,4)\"\n6,ok\n";
        assert_eq!(
            split_records(text),
            vec!["Turn,Msg", "5,\"Error: stuck\nat (3,4)\"", "6,ok"]
        );
    }

    #[test]
    fn blank_lines_are_not_records() {
        assert_eq!(split_records("a\n\n\nb\n"), vec!["a", "b"]);
        assert!(split_records("").is_empty());
    }

    #[test]
    fn parse_handles_quotes() {
        assert_eq!(
            fields(r#"7,Intent,"(3,4)",done"#),
            vec!["7", "Intent", "(3,4)", "done"]
        );
        assert_eq!(fields(r#"1,"say ""hi""""#), vec!["1", r#"say "hi""#]);
        assert_eq!(fields("5,\"a\nb\""), vec!["5", "a\nb"]);
    }

    #[test]
    fn empty_text_has_no_fields() {
        assert!(parse_record("").is_empty());
        assert_eq!(fields("a,"), vec!["a", ""]);
    }
}
