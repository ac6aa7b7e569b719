// Serialized form of the entry sequence

use crate::record::Entry;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Encode the full entry sequence as a JSON array
///
/// Each entry becomes one object with the fields `id`, `createdAt`,
/// `temperature`, `bloodPressure` and `heartRate`. Order is preserved.
pub fn encode(entries: &[Entry]) -> Result<Vec<u8>> {
    serde_json::to_vec(entries).context("Failed to encode entries")
}

/// Decode a sequence previously produced by [`encode`]
pub fn decode(bytes: &[u8]) -> Result<Vec<Entry>> {
    serde_json::from_slice(bytes).context("Failed to decode entries")
}

/// Write entries to a JSONL file, one object per line, in sequence order
///
/// The file is truncated first.
pub fn write_jsonl(path: &Path, entries: &[Entry]) -> Result<()> {
    let file = File::create(path).context("Failed to create JSONL file")?;
    let mut writer = BufWriter::new(file);

    for entry in entries {
        let json = serde_json::to_string(entry)?;
        writeln!(writer, "{}", json)?;
    }

    let file = writer.into_inner().context("Failed to flush JSONL file")?;
    file.sync_all()?; // Ensure data is flushed to disk

    info!(file = ?path, count = entries.len(), "Exported entries to JSONL");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Vec<Entry> {
        vec![
            Entry::new("37.1", "130/85", "88"),
            Entry::new("36.5", "120/80", "75"),
            Entry::new("", "  ", "ñ ♥ \"quoted\"\n"),
        ]
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let entries = sample();

        let decoded = decode(&encode(&entries).unwrap()).unwrap();
        assert_eq!(decoded, entries);
        for (original, restored) in entries.iter().zip(&decoded) {
            assert_eq!(original.id(), restored.id());
            assert_eq!(original.created_at(), restored.created_at());
        }
    }

    #[test]
    fn test_round_trip_empty() {
        let bytes = encode(&[]).unwrap();
        assert_eq!(bytes, b"[]");
        assert!(decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_decode_known_document() {
        let json = r#"[
            {"id":"01890a5d-ac96-774b-bcce-b302099a8057","createdAt":"2024-03-01T08:15:30.123456Z",
             "temperature":"36.5","bloodPressure":"120/80","heartRate":"75","note":"ignored"}
        ]"#;

        let entries = decode(json.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id().to_string(), "01890a5d-ac96-774b-bcce-b302099a8057");
        assert_eq!(entries[0].created_at().to_rfc3339(), "2024-03-01T08:15:30.123456+00:00");
        assert_eq!(entries[0].blood_pressure(), "120/80");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode(b"{malformed json}").is_err());
        assert!(decode(b"").is_err());
        // Missing fields
        assert!(decode(br#"[{"id":"01890a5d-ac96-774b-bcce-b302099a8057"}]"#).is_err());
        // Bad id
        assert!(
            decode(br#"[{"id":"nope","createdAt":"2024-03-01T08:15:30Z","temperature":"","bloodPressure":"","heartRate":""}]"#)
                .is_err()
        );
    }

    #[test]
    fn test_write_jsonl() {
        let temp = TempDir::new().unwrap();
        let jsonl_path = temp.path().join("export.jsonl");
        let entries = sample();

        write_jsonl(&jsonl_path, &entries).unwrap();

        let content = fs::read_to_string(&jsonl_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(&format!("\"id\":\"{}\"", entries[0].id())));
        assert!(lines[1].contains("\"bloodPressure\":\"120/80\""));

        let restored: Entry = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(restored, entries[2]);
    }
}
