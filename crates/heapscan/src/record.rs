//! Dump Record - Reading the newline-delimited output back
//!
//! One line of a dump is one [`DumpRecord`]:
//!
//! ```text
//! {"address": 1048576, "type": "list", "size": 88, "len": 2, "refs": [1048640, 1048704]}
//! ```
//!
//! Field order on the wire is fixed by the writer; reading does not depend
//! on it.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Preview value of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    Int(i64),
    Text(String),
}

impl RecordValue {
    /// Text preview, if this is one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordValue::Text(text) => Some(text),
            RecordValue::Int(_) => None,
        }
    }

    /// Integer value, if this is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            RecordValue::Int(value) => Some(*value),
            RecordValue::Text(_) => None,
        }
    }
}

/// One dumped object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpRecord {
    pub address: u64,
    #[serde(rename = "type")]
    pub type_name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub len: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RecordValue>,
    pub refs: Vec<u64>,
}

impl DumpRecord {
    /// Parse one line
    pub fn from_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line.trim_end())?)
    }
}

/// Parse a whole dump stream, skipping blank lines
pub fn parse_dump<R: BufRead>(reader: R) -> Result<Vec<DumpRecord>> {
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(DumpRecord::from_line(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;

    #[test]
    fn test_parse_text_record() {
        let line = r#"{"address": 4096, "type": "str", "size": 54, "len": 5, "value": "hello", "refs": []}"#;
        let record = DumpRecord::from_line(line).unwrap();
        assert_eq!(record.address, 4096);
        assert_eq!(record.type_name, "str");
        assert_eq!(record.len, Some(5));
        assert_eq!(record.value.as_ref().and_then(RecordValue::as_text), Some("hello"));
        assert!(record.refs.is_empty());
    }

    #[test]
    fn test_parse_int_value() {
        let line = r#"{"address": 1, "type": "int", "size": 28, "value": -42, "refs": []}"#;
        let record = DumpRecord::from_line(line).unwrap();
        assert_eq!(record.value, Some(RecordValue::Int(-42)));
        assert_eq!(record.value.as_ref().and_then(RecordValue::as_int), Some(-42));
        assert_eq!(record.name, None);
    }

    #[test]
    fn test_refs_are_required() {
        let err = DumpRecord::from_line(r#"{"address": 1, "type": "x", "size": 0}"#).unwrap_err();
        assert!(matches!(err, ScanError::MalformedRecord(_)));
    }

    #[test]
    fn test_parse_dump_stream() {
        let stream = concat!(
            "{\"address\": 1, \"type\": \"list\", \"size\": 72, \"len\": 1, \"refs\": [2]}\n",
            "\n",
            "{\"address\": 2, \"type\": \"bool\", \"size\": 28, \"value\": \"True\", \"refs\": []}\n",
        );
        let records = parse_dump(stream.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].refs, vec![2]);
        assert_eq!(records[1].value.as_ref().and_then(RecordValue::as_text), Some("True"));
    }
}
