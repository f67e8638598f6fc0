//! Event table reader.
//!
//! Reads a delimited text file with a header row into [`Event`]s. The
//! `Position` and `Duration` columns are required under any casing; every
//! other column becomes an event field keyed by its original header text.
//! Any problem fails the whole table so a run never starts from a partial file.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, info};

use playclip_models::{Event, EventFields, DURATION_COLUMN, POSITION_COLUMN};

use crate::error::{WorkerError, WorkerResult};

const UTF8_BOM: &str = "\u{feff}";

/// Read every event from the table at `path`.
pub fn read_events(path: impl AsRef<Path>) -> WorkerResult<Vec<Event>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(WorkerError::SourceNotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path)?;
    let events = parse_events(&text)?;
    info!(
        path = %path.display(),
        events = events.len(),
        "Loaded event table"
    );
    Ok(events)
}

/// Parse events from table text.
pub fn parse_events(text: &str) -> WorkerResult<Vec<Event>> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let delimiter = detect_delimiter(text);
    debug!("Event table delimiter: {:?}", delimiter as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    check_schema(&headers)?;

    let mut events = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let row = i + 1;

        let fields: EventFields = headers
            .iter()
            .enumerate()
            .map(|(col, header)| (header.as_str(), record.get(col).unwrap_or("")))
            .collect();

        let event = Event::from_record(fields).map_err(|e| WorkerError::from_field(e, row))?;
        events.push(event);
    }

    Ok(events)
}

/// Fail with a schema error unless both timing columns are present.
fn check_schema(headers: &[String]) -> WorkerResult<()> {
    let header_fields: EventFields = headers.iter().map(|h| (h.as_str(), "")).collect();
    for column in [POSITION_COLUMN, DURATION_COLUMN] {
        header_fields
            .require(column)
            .map_err(|e| WorkerError::from_field(e, 0))?;
    }
    Ok(())
}

/// Pick the delimiter that occurs most often in the header line.
/// Delimiter occurring most often in the header. Ties go to the earlier of `,` `;` tab.
fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let count = |d: u8| header.bytes().filter(|&b| b == d).count();

    let mut best = (b',', count(b','));
    for d in [b';', b'\t'] {
        let n = count(d);
        if n > best.1 {
            best = (d, n);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delimiter_detection() {
        assert_eq!(detect_delimiter("Position,Duration,Down"), b',');
        assert_eq!(detect_delimiter("Position;Duration;Down"), b';');
        assert_eq!(detect_delimiter("Position\tDuration"), b'\t');
        assert_eq!(detect_delimiter("Position"), b',');
        // One of each: comma wins the tie
        assert_eq!(detect_delimiter("Position,Duration;Notes"), b',');
        assert_eq!(detect_delimiter("Position;Duration,Notes\tDown"), b',');
    }

    #[test]
    fn test_parse_basic_table() {
        let events = parse_events("Position,Duration,Down,ODK\n1000,2000,3rd,O\n5000,4000,1st,D\n").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].position_ms, 1000);
        assert_eq!(events[0].duration_ms, 2000);
        assert_eq!(events[0].fields.get("Down"), Some("3rd"));
        assert_eq!(events[1].fields.get("odk"), Some("D"));
        // Timing columns are consumed
        assert!(events[0].fields.get("Position").is_none());
    }

    #[test]
    fn test_case_varied_headers_ingest_identically() {
        let exact = parse_events("Position,Duration,Down\n1000,2000,3rd\n").unwrap();
        let varied = parse_events("position,DURATION,Down\n1000,2000,3rd\n").unwrap();
        assert_eq!(exact, varied);
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let err = parse_events("Position,Length\n1000,2000\n").unwrap_err();
        assert!(matches!(err, WorkerError::Schema { ref missing } if missing == "Duration"));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_bad_value_fails_whole_table() {
        let err = parse_events("Position,Duration\n1000,2000\nabc,2000\n").unwrap_err();
        assert!(matches!(err, WorkerError::InvalidValue { row: 2, .. }));
    }

    #[test]
    fn test_semicolon_and_bom() {
        let events = parse_events("\u{feff}Name;Position;Duration\nPlay 1; 1000 ;2000\n").unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), Some("Play 1"));
        assert_eq!(events[0].position_ms, 1000);
    }

    #[test]
    fn test_blank_rows_skipped_and_short_rows_padded() {
        let events = parse_events("Position,Duration,Down\n1000,2000\n,,\n3000,1000,2nd\n").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].fields.get("Down"), Some(""));
    }

    #[test]
    fn test_read_events_source_not_found() {
        let temp = TempDir::new().unwrap();
        let err = read_events(temp.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, WorkerError::SourceNotFound(_)));
    }

    #[test]
    fn test_read_events_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("events.csv");
        std::fs::write(&path, "Position,Duration\n0,1500\n").unwrap();
        let events = read_events(&path).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].duration_ms, 1500);
    }
}
