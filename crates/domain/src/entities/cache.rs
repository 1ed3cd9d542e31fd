use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of the torrent being polled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TorrentHash(String);

impl TorrentHash {
    /// Returns `None` for empty or whitespace-only input, which means "nothing to poll".
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TorrentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-piece download state as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceRecord {
    #[serde(rename = "Completed", default)]
    pub completed: bool,
    #[serde(rename = "Size", default)]
    pub downloaded_size: u64,
    #[serde(rename = "Length", default)]
    pub target_length: u64,
}

impl PieceRecord {
    pub fn new(completed: bool, downloaded_size: u64, target_length: u64) -> Self {
        Self {
            completed,
            downloaded_size,
            target_length,
        }
    }

    /// Completion flag alone is not enough, the full target must be on disk.
    pub fn is_complete(&self) -> bool {
        self.completed && self.downloaded_size >= self.target_length
    }

    /// Not clamped: the backend may report more than the target while resizing.
    pub fn percentage(&self) -> f64 {
        if self.target_length == 0 {
            return 0.0;
        }
        self.downloaded_size as f64 / self.target_length as f64 * 100.0
    }
}

/// Read-ahead window of one active reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderRange {
    #[serde(rename = "Reader", default)]
    pub reader_piece_index: i64,
    #[serde(rename = "Start", default)]
    pub start_index: i64,
    #[serde(rename = "End", default)]
    pub end_index: i64,
}

impl ReaderRange {
    pub fn new(reader_piece_index: i64, start_index: i64, end_index: i64) -> Self {
        Self {
            reader_piece_index,
            start_index,
            end_index,
        }
    }

    pub fn is_reader_at(&self, index: usize) -> bool {
        self.reader_piece_index == index as i64
    }

    pub fn covers(&self, index: usize) -> bool {
        let index = index as i64;
        self.start_index <= index && index <= self.end_index
    }
}

/// One point-in-time view of a torrent's cache. Replaced wholesale on every poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    #[serde(rename = "Hash", default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(rename = "Capacity", default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u64>,
    #[serde(rename = "Filled", default, skip_serializing_if = "Option::is_none")]
    pub filled: Option<u64>,
    #[serde(rename = "PiecesLength", default, skip_serializing_if = "Option::is_none")]
    pub piece_length: Option<u64>,
    #[serde(rename = "PiecesCount", default, deserialize_with = "lenient_count")]
    pub piece_count: usize,
    #[serde(rename = "Pieces", default, deserialize_with = "lenient_pieces")]
    pub pieces: HashMap<usize, PieceRecord>,
    #[serde(rename = "Readers", default, deserialize_with = "lenient_readers")]
    pub readers: Vec<ReaderRange>,
}

impl CacheSnapshot {
    /// The fallback published when a fetch fails.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.piece_count == 0 && self.pieces.is_empty() && self.readers.is_empty()
    }

    pub fn piece(&self, index: usize) -> Option<&PieceRecord> {
        self.pieces.get(&index)
    }
}

// The backend is loose about its own schema. A field of the wrong shape decodes
// as empty instead of failing the whole snapshot.
fn lenient_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw
        .as_u64()
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or_default())
}

// Keys arrive as decimal strings; anything that is not a piece index is dropped,
// as is any record that does not decode.
fn lenient_pieces<'de, D>(deserializer: D) -> Result<HashMap<usize, PieceRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(raw) = Value::deserialize(deserializer)? else {
        return Ok(HashMap::new());
    };
    Ok(raw
        .into_iter()
        .filter_map(|(key, record)| {
            let index = key.trim().parse::<usize>().ok()?;
            let record = serde_json::from_value::<PieceRecord>(record).ok()?;
            Some((index, record))
        })
        .collect())
}

fn lenient_readers<'de, D>(deserializer: D) -> Result<Vec<ReaderRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(raw) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(raw
        .into_iter()
        .filter_map(|reader| serde_json::from_value::<ReaderRange>(reader).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_payload() {
        let json = r#"{
            "Hash": "abcdef",
            "Capacity": 209715200,
            "Filled": 4194304,
            "PiecesLength": 2097152,
            "PiecesCount": 10,
            "Pieces": {
                "0": {"Id": 0, "Length": 100, "Size": 100, "Completed": true, "Priority": 1},
                "3": {"Id": 3, "Length": 100, "Size": 40, "Completed": false}
            },
            "Readers": [{"Start": 0, "End": 4, "Reader": 2}]
        }"#;

        let snapshot: CacheSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.piece_count, 10);
        assert_eq!(snapshot.hash.as_deref(), Some("abcdef"));
        assert_eq!(snapshot.piece_length, Some(2097152));
        assert_eq!(snapshot.pieces.len(), 2);
        assert_eq!(snapshot.piece(3), Some(&PieceRecord::new(false, 40, 100)));
        assert_eq!(snapshot.readers, vec![ReaderRange::new(2, 0, 4)]);
    }

    #[test]
    fn empty_object_is_empty_snapshot() {
        let snapshot: CacheSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snapshot, CacheSnapshot::empty());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let snapshot: CacheSnapshot =
            serde_json::from_str(r#"{"PiecesCount": 3, "Pieces": null, "Readers": null}"#).unwrap();
        assert_eq!(snapshot.piece_count, 3);
        assert!(snapshot.pieces.is_empty());
        assert!(snapshot.readers.is_empty());
    }

    #[test]
    fn wrong_shaped_collections_decode_as_empty() {
        let snapshot: CacheSnapshot =
            serde_json::from_str(r#"{"PiecesCount": 3, "Pieces": [], "Readers": "oops"}"#).unwrap();
        assert_eq!(snapshot.piece_count, 3);
        assert!(snapshot.pieces.is_empty());
        assert!(snapshot.readers.is_empty());

        let snapshot: CacheSnapshot =
            serde_json::from_str(r#"{"PiecesCount": "many", "Pieces": 7, "Readers": {"0": 1}}"#).unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn undecodable_entries_are_dropped_individually() {
        let snapshot: CacheSnapshot = serde_json::from_str(
            r#"{
                "PiecesCount": 4,
                "Pieces": {"0": "broken", "1": {"Size": 5, "Length": 10}},
                "Readers": [{"Start": 0, "End": 2, "Reader": 1}, "bad", {"Reader": "x"}]
            }"#,
        )
        .unwrap();
        assert_eq!(snapshot.pieces.len(), 1);
        assert_eq!(snapshot.piece(1), Some(&PieceRecord::new(false, 5, 10)));
        assert_eq!(snapshot.readers, vec![ReaderRange::new(1, 0, 2)]);
    }

    #[test]
    fn non_numeric_piece_keys_are_skipped() {
        let snapshot: CacheSnapshot = serde_json::from_str(
            r#"{"PiecesCount": 2, "Pieces": {"x": {"Size": 1, "Length": 2}, "1": {"Size": 1, "Length": 2}}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.pieces.len(), 1);
        assert!(snapshot.piece(1).is_some());
    }

    #[test]
    fn blank_hash_means_nothing_to_poll() {
        assert_eq!(TorrentHash::parse(""), None);
        assert_eq!(TorrentHash::parse("   "), None);
        assert_eq!(TorrentHash::parse(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn completed_but_short_piece_is_not_complete() {
        let record = PieceRecord::new(true, 99, 100);
        assert!(!record.is_complete());
        assert!(PieceRecord::new(true, 150, 100).is_complete());
        assert_eq!(PieceRecord::new(true, 150, 100).percentage(), 150.0);
    }
}
