//! Dump command implementation.

use super::render_bytes;
use batchlog_core::{BatchView, CoreError, Record};
use serde::Serialize;
use std::path::Path;

/// Decoded batch representation for output.
#[derive(Debug, Serialize)]
pub struct DumpResult {
    /// Sequence number from the header.
    pub sequence: u64,
    /// Record count from the header.
    pub count: u32,
    /// Batch size in bytes.
    pub size: usize,
    /// Decoded records.
    pub records: Vec<RecordInfo>,
    /// Decode error that stopped the dump, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One decoded record.
#[derive(Debug, Serialize)]
pub struct RecordInfo {
    /// Position in the batch, log data included.
    pub index: usize,
    /// Record kind (put, merge, delete, log).
    pub op: String,
    /// Column family id (mutations only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_family: Option<u32>,
    /// Key (mutations only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Value, operand or blob.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl RecordInfo {
    fn from_record(index: usize, record: &Record<'_>) -> Self {
        let (value, op) = match record {
            Record::Put { value, .. } | Record::Merge { value, .. } => {
                (Some(render_bytes(value)), record.value_type().map(|t| t.name()))
            }
            Record::Delete { .. } => (None, record.value_type().map(|t| t.name())),
            Record::LogData { blob } => (Some(render_bytes(blob)), None),
        };
        Self {
            index,
            op: op.unwrap_or("log").to_string(),
            column_family: record.column_family().map(|cf| cf.as_u32()),
            key: record.key().map(render_bytes),
            value,
        }
    }
}

/// Runs the dump command.
pub fn run(path: &Path, limit: Option<usize>, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    let result = dump(&data, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    match result.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Decodes up to `limit` records of `data`.
///
/// A corrupt record ends the dump and is reported in
/// [`DumpResult::error`]; the records before it are kept.
///
/// # Errors
///
/// Returns an error if `data` is too short to hold a header.
pub fn dump(data: &[u8], limit: Option<usize>) -> Result<DumpResult, CoreError> {
    let view = BatchView::new(data)?;
    let max_records = limit.unwrap_or(usize::MAX);

    let mut records = Vec::new();
    let mut error = None;
    for item in view.iter().take(max_records) {
        match item {
            Ok(record) => records.push(RecordInfo::from_record(records.len(), &record)),
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        }
    }

    Ok(DumpResult {
        sequence: view.sequence().as_u64(),
        count: view.count(),
        size: data.len(),
        records,
        error,
    })
}

fn print_text_output(result: &DumpResult) {
    println!(
        "Write batch: sequence={} count={} size={} bytes",
        result.sequence, result.count, result.size
    );
    println!("================");
    println!();

    for record in &result.records {
        print!("[{:06}] {:6}", record.index, record.op);

        if let Some(cf) = record.column_family {
            print!(" cf={}", cf);
        }
        if let Some(ref key) = record.key {
            print!(" key={}", key);
        }
        if let Some(ref value) = record.value {
            print!(" value={}", value);
        }

        println!();
    }

    if let Some(ref error) = result.error {
        println!();
        println!("ERROR: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use batchlog_core::{ColumnFamilyId, SequenceNumber, WriteBatch};

    fn sample() -> WriteBatch {
        let mut batch = WriteBatch::new();
        batch.set_sequence(SequenceNumber::new(42));
        batch.put(b"a", b"1").unwrap();
        batch.put_log_data(b"blob").unwrap();
        batch.delete_cf(ColumnFamilyId::new(3), b"b").unwrap();
        batch
    }

    #[test]
    fn dumps_header_and_records() {
        let batch = sample();
        let result = dump(batch.data(), None).unwrap();
        assert_eq!(result.sequence, 42);
        assert_eq!(result.count, 2);
        assert_eq!(result.records.len(), 3);
        assert!(result.error.is_none());

        assert_eq!(result.records[0].op, "put");
        assert_eq!(result.records[0].column_family, Some(0));
        assert_eq!(result.records[1].op, "log");
        assert_eq!(result.records[1].value.as_deref(), Some("blob"));
        assert_eq!(result.records[2].op, "delete");
        assert_eq!(result.records[2].column_family, Some(3));
        assert!(result.records[2].value.is_none());
    }

    #[test]
    fn limit_stops_early() {
        let batch = sample();
        let result = dump(batch.data(), Some(1)).unwrap();
        assert_eq!(result.records.len(), 1);
        assert!(result.error.is_none());
    }

    #[test]
    fn corruption_keeps_earlier_records() {
        let mut data = sample().into_data();
        data.push(0x09);
        let result = dump(&data, None).unwrap();
        assert_eq!(result.records.len(), 3);
        assert!(result.error.unwrap().contains("unknown tag"));
    }

    #[test]
    fn short_input_is_an_error() {
        assert!(dump(&[0; 4], None).unwrap_err().is_corruption());
    }

    #[test]
    fn json_omits_absent_fields() {
        let batch = sample();
        let result = dump(batch.data(), None).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
        assert!(json["records"][1].get("key").is_none());
        assert_eq!(json["records"][0]["key"], "a");
    }

    #[test]
    fn run_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.bin");
        std::fs::write(&path, sample().data()).unwrap();
        run(&path, None, "json").unwrap();

        std::fs::write(&path, [0u8; 3]).unwrap();
        assert!(run(&path, None, "text").is_err());
    }
}
