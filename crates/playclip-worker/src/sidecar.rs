//! Metadata sidecar documents.
//!
//! One XML document per clip, read by the annotation tool. The marker is
//! expressed in the tool's reference time unit: `duration_ms * 10`.

use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event as XmlEvent};
use quick_xml::Writer;
use tracing::debug;

use playclip_models::{ClipPlan, EventFields, DURATION_COLUMN, NAME_COLUMN, POSITION_COLUMN};

use crate::error::{WorkerError, WorkerResult};

/// Reference-time units per millisecond.
pub const REF_TIME_PER_MS: u64 = 10;

const DOCUMENT_ID: &str = "0";
const VERSION: &str = "2.0";
const SUBVERSION: &str = "1";
const MARKER_COLOR: &str = "Color2";

/// Categories the annotation tool lists first, when present.
const LEADING_CATEGORIES: [&str; 5] = ["Down", "ODK", "Play Type", "DIST", "RESULT"];

/// Columns consumed as timing or identity and never written as categories.
const RESERVED_COLUMNS: [&str; 3] = [POSITION_COLUMN, DURATION_COLUMN, NAME_COLUMN];

/// Name under which a clip is known to the annotation tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipIdentity {
    /// Clip file name, e.g. `Play_001.mp4`
    pub file_name: String,
    /// File name without extension, e.g. `Play_001`
    pub display_name: String,
}

impl ClipIdentity {
    pub fn from_file_name(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let display_name = Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());
        Self {
            file_name,
            display_name,
        }
    }

    pub fn from_plan(plan: &ClipPlan) -> Self {
        Self {
            file_name: plan.file_name(),
            display_name: plan.display_name(),
        }
    }
}

/// Marker spanning `[in_units, out_units)` in reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub in_units: u64,
    pub out_units: u64,
}

/// A built sidecar, ready to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarDocument {
    pub name: String,
    pub id: String,
    pub version: String,
    pub marker: Marker,
    pub title: String,
    pub categories: Vec<(String, String)>,
}

/// Build the sidecar for one clip.
///
/// Every field except `Position`, `Duration` and `Name` (matched
/// case-insensitively) becomes a category, keeping its original key.
pub fn build_sidecar(identity: &ClipIdentity, fields: &EventFields, duration_ms: u64) -> SidecarDocument {
    SidecarDocument {
        name: identity.file_name.clone(),
        id: DOCUMENT_ID.to_string(),
        version: VERSION.to_string(),
        marker: Marker {
            in_units: 0,
            out_units: duration_ms.saturating_mul(REF_TIME_PER_MS),
        },
        title: identity.display_name.clone(),
        categories: categories(fields),
    }
}

fn categories(fields: &EventFields) -> Vec<(String, String)> {
    let is_reserved = |key: &str| RESERVED_COLUMNS.iter().any(|r| r.eq_ignore_ascii_case(key));

    let mut leading: Vec<(String, String)> = Vec::new();
    for wanted in LEADING_CATEGORIES {
        if let Some(key) = fields.resolve_key(wanted) {
            if let Some(value) = fields.get(key) {
                leading.push((key.to_string(), value.to_string()));
            }
        }
    }

    let rest = fields
        .iter()
        .filter(|(key, _)| !is_reserved(key))
        .filter(|(key, _)| !leading.iter().any(|(k, _)| k == key))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<Vec<_>>();

    leading.into_iter().chain(rest).collect()
}

impl SidecarDocument {
    pub fn category(&self, name: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize to the annotation tool's XML layout.
    pub fn to_xml(&self) -> Result<Vec<u8>, String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        let out_units = self.marker.out_units.to_string();
        let in_units = self.marker.in_units.to_string();

        start(&mut writer, BytesStart::new("LIBRARY_ITEM"))?;
        text_element(&mut writer, BytesStart::new("NAME"), &self.name)?;
        text_element(&mut writer, BytesStart::new("ID"), &self.id)?;
        text_element(
            &mut writer,
            BytesStart::new("VERSION").with_attributes([("subversion", SUBVERSION)]),
            &self.version,
        )?;

        start(
            &mut writer,
            BytesStart::new("LIBRARY_ITEM").with_attributes([
                ("Color", MARKER_COLOR),
                ("IN", in_units.as_str()),
                ("ItemType", "Marker.Event"),
                ("OUT", out_units.as_str()),
                ("UNIT", "RefTime"),
            ]),
        )?;
        start(&mut writer, BytesStart::new("CATEGORIES"))?;
        for (name, value) in &self.categories {
            text_element(
                &mut writer,
                BytesStart::new("CATEGORY").with_attributes([("name", name.as_str())]),
                value,
            )?;
        }
        end(&mut writer, "CATEGORIES")?;
        end(&mut writer, "LIBRARY_ITEM")?;

        start(&mut writer, BytesStart::new("Library.MDProperties"))?;
        text_element(
            &mut writer,
            BytesStart::new("Property").with_attributes([("Name", "Title")]),
            &self.title,
        )?;
        end(&mut writer, "Library.MDProperties")?;

        start(
            &mut writer,
            BytesStart::new("LIBRARY_ITEM").with_attributes([("ItemType", "GameTime")]),
        )?;
        text_element(&mut writer, BytesStart::new("ID"), DOCUMENT_ID)?;
        end(&mut writer, "LIBRARY_ITEM")?;

        text_element(&mut writer, BytesStart::new("TYPE"), "1")?;
        end(&mut writer, "LIBRARY_ITEM")?;

        Ok(writer.into_inner().into_inner())
    }
}

fn start(writer: &mut Writer<Cursor<Vec<u8>>>, element: BytesStart<'_>) -> Result<(), String> {
    writer
        .write_event(XmlEvent::Start(element))
        .map_err(|e| e.to_string())
}

fn end(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str) -> Result<(), String> {
    writer
        .write_event(XmlEvent::End(BytesEnd::new(name)))
        .map_err(|e| e.to_string())
}

fn text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    element: BytesStart<'_>,
    text: &str,
) -> Result<(), String> {
    let name = String::from_utf8_lossy(element.name().as_ref()).to_string();
    start(writer, element)?;
    writer
        .write_event(XmlEvent::Text(BytesText::new(text)))
        .map_err(|e| e.to_string())?;
    end(writer, &name)
}

/// Serialize and write a sidecar to `path`.
pub async fn write_sidecar(path: &Path, document: &SidecarDocument) -> WorkerResult<()> {
    let bytes = document
        .to_xml()
        .map_err(|e| WorkerError::sidecar_write(path, e))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| WorkerError::sidecar_write(path, e.to_string()))?;
    debug!(path = %path.display(), "Wrote sidecar");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fields(pairs: &[(&str, &str)]) -> EventFields {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_marker_and_categories() {
        let identity = ClipIdentity::from_file_name("Play_001");
        let doc = build_sidecar(&identity, &fields(&[("Down", "3rd")]), 2000);

        assert_eq!(doc.marker, Marker { in_units: 0, out_units: 20000 });
        assert_eq!(doc.category("Down"), Some("3rd"));
        assert!(doc.category("Position").is_none());
        assert!(doc.category("Duration").is_none());
        assert_eq!(doc.title, "Play_001");
    }

    #[test]
    fn test_reserved_columns_excluded_any_case() {
        let identity = ClipIdentity::from_file_name("Play_004.mp4");
        let doc = build_sidecar(
            &identity,
            &fields(&[("name", "Play 4"), ("POSITION", "1"), ("Hash", "L")]),
            1000,
        );
        assert_eq!(doc.categories, vec![("Hash".to_string(), "L".to_string())]);
        assert_eq!(doc.name, "Play_004.mp4");
        assert_eq!(doc.title, "Play_004");
    }

    #[test]
    fn test_leading_categories_first_with_original_keys() {
        let doc = build_sidecar(
            &ClipIdentity::from_file_name("Play_002.mp4"),
            &fields(&[("Hash", "M"), ("odk", "O"), ("Down", "1")]),
            500,
        );
        let keys: Vec<&str> = doc.categories.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Down", "odk", "Hash"]);
    }

    #[test]
    fn test_xml_layout() {
        let doc = build_sidecar(
            &ClipIdentity::from_file_name("Play_001.mp4"),
            &fields(&[("Play Type", "Pass & Run")]),
            2000,
        );
        let xml = String::from_utf8(doc.to_xml().unwrap()).unwrap();

        assert!(xml.starts_with("<LIBRARY_ITEM>"));
        assert!(xml.contains("<NAME>Play_001.mp4</NAME>"));
        assert!(xml.contains(r#"<VERSION subversion="1">2.0</VERSION>"#));
        assert!(xml.contains(
            r#"<LIBRARY_ITEM Color="Color2" IN="0" ItemType="Marker.Event" OUT="20000" UNIT="RefTime">"#
        ));
        assert!(xml.contains(r#"<CATEGORY name="Play Type">Pass &amp; Run</CATEGORY>"#));
        assert!(xml.contains(r#"<Property Name="Title">Play_001</Property>"#));
        assert!(xml.contains(r#"<LIBRARY_ITEM ItemType="GameTime">"#));
        assert!(xml.contains("<TYPE>1</TYPE>"));
    }

    #[tokio::test]
    async fn test_write_sidecar() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Play_001.dartclip");
        let doc = build_sidecar(&ClipIdentity::from_file_name("Play_001.mp4"), &EventFields::new(), 100);
        write_sidecar(&path, &doc).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("OUT=\"1000\""));
    }

    #[tokio::test]
    async fn test_write_sidecar_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("no such dir").join("Play_001.dartclip");
        let doc = build_sidecar(&ClipIdentity::from_file_name("Play_001.mp4"), &EventFields::new(), 100);
        let err = write_sidecar(&path, &doc).await.unwrap_err();
        assert!(matches!(err, WorkerError::SidecarWrite { .. }));
    }
}
