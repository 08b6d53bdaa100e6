//! Golden wire vectors for the write batch format.
//!
//! Every encoder and decoder of the format must agree on these bytes.

use batchlog_core::Record;
use serde::{Deserialize, Serialize};

/// A test vector that can be shared with other implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Batch bytes (hex-encoded).
    pub input_hex: String,
    /// Decoded records, one per line in script form.
    pub expected_records: Vec<String>,
    /// Substring of the expected error message (if this should fail).
    pub expected_error: Option<String>,
}

fn ok(id: &str, description: &str, hex: &str, records: &[&str]) -> TestVector {
    TestVector {
        id: id.into(),
        description: description.into(),
        input_hex: hex.into(),
        expected_records: records.iter().map(|r| (*r).to_string()).collect(),
        expected_error: None,
    }
}

fn err(id: &str, description: &str, hex: &str, error: &str) -> TestVector {
    TestVector {
        id: id.into(),
        description: description.into(),
        input_hex: hex.into(),
        expected_records: Vec::new(),
        expected_error: Some(error.into()),
    }
}

/// Well-formed batch encodings.
///
/// Records are rendered by [`render_record`].
pub fn batch_encoding_vectors() -> Vec<TestVector> {
    vec![
        ok("empty", "Empty batch at sequence 0", "000000000000000000000000", &[]),
        ok(
            "put_default",
            "Put a=1 in the default column family at sequence 100",
            "6400000000000000010000000101610131",
            &["put 0 61 31"],
        ),
        ok(
            "delete_default",
            "Delete b at sequence 1",
            "010000000000000001000000000162",
            &["delete 0 62"],
        ),
        ok(
            "merge_default",
            "Merge a += \"+1\"",
            "000000000000000001000000020161022b31",
            &["merge 0 61 2b31"],
        ),
        ok(
            "log_data",
            "Log data is not counted",
            "000000000000000000000000030178",
            &["log 78"],
        ),
        ok(
            "put_cf",
            "Put k=v in column family 3",
            "0000000000000000010000000503016b0176",
            &["put 3 6b 76"],
        ),
        ok(
            "delete_cf_multibyte",
            "Delete k in column family 300 (two-byte varint)",
            "00000000000000000100000004ac02016b",
            &["delete 300 6b"],
        ),
        ok(
            "merge_cf",
            "Merge k += v in column family 1",
            "0000000000000000010000000601016b0176",
            &["merge 1 6b 76"],
        ),
        ok(
            "mixed",
            "Put a=1, merge a+=+1, delete b at sequence 100",
            "6400000000000000030000000101610131020161022b31000162",
            &["put 0 61 31", "merge 0 61 2b31", "delete 0 62"],
        ),
        ok(
            "empty_fields",
            "Put with empty key and value",
            "000000000000000001000000010000",
            &["put 0 - -"],
        ),
        ok(
            "max_sequence",
            "Sequence number u64::MAX",
            "ffffffffffffffff00000000",
            &[],
        ),
    ]
}

/// Renders a record as `op cf key [value]` with hex fields, `-` for empty
/// ones. Log data renders as `log blob`.
pub fn render_record(record: &Record<'_>) -> String {
    let field = |bytes: &[u8]| {
        if bytes.is_empty() {
            "-".to_string()
        } else {
            hex_encode(bytes)
        }
    };
    match *record {
        Record::Put { cf, key, value } => {
            format!("put {} {} {}", cf.as_u32(), field(key), field(value))
        }
        Record::Merge { cf, key, value } => {
            format!("merge {} {} {}", cf.as_u32(), field(key), field(value))
        }
        Record::Delete { cf, key } => format!("delete {} {}", cf.as_u32(), field(key)),
        Record::LogData { blob } => format!("log {}", field(blob)),
    }
}

/// Malformed batch encodings and the corruption they must report.
pub fn batch_error_vectors() -> Vec<TestVector> {
    vec![
        err("too_small", "Shorter than the header", "0000000000", "too small"),
        err(
            "unknown_tag",
            "Tag 0x07 is not defined",
            "00000000000000000100000007",
            "unknown tag 0x07",
        ),
        err(
            "wrong_count",
            "Header claims two records, body holds one",
            "0000000000000000020000000101610131",
            "wrong count: header says 2, found 1",
        ),
        err(
            "truncated_put",
            "Put key length runs past the end",
            "000000000000000001000000010561",
            "bad write batch Put",
        ),
        err(
            "truncated_delete",
            "Delete without a key",
            "00000000000000000100000000",
            "bad write batch Delete",
        ),
        err(
            "truncated_merge",
            "Merge operand length runs past the end",
            "0000000000000000010000000201610361",
            "bad write batch Merge",
        ),
        err(
            "truncated_blob",
            "Log data length runs past the end",
            "0000000000000000000000000302",
            "bad write batch Blob",
        ),
        err(
            "missing_column_family",
            "Column family tag without an id",
            "00000000000000000100000005",
            "bad write batch Put",
        ),
    ]
}

/// Generate all test vectors as JSON for other implementations.
pub fn all_vectors_json() -> String {
    let vectors = AllTestVectors {
        batch: batch_encoding_vectors(),
        batch_errors: batch_error_vectors(),
    };

    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

#[derive(Debug, Serialize, Deserialize)]
struct AllTestVectors {
    batch: Vec<TestVector>,
    batch_errors: Vec<TestVector>,
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decodes hex, panicking on malformed input.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    assert!(hex.len() % 2 == 0, "Odd-length hex string: {hex}");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex digit"))
        .collect()
}
